use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Process-wide run counters, safe to share between concurrently evaluated scenarios.
pub struct MetricsRecorder {
    inner: Mutex<RunCounters>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    pub scenarios_evaluated: usize,
    pub configuration_failures: usize,
    pub masks_computed: usize,
    pub mask_cache_hits: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RunCounters::default()),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut RunCounters)) {
        if let Ok(mut counters) = self.inner.lock() {
            apply(&mut counters);
        }
    }

    pub fn record_evaluated(&self) {
        self.update(|c| c.scenarios_evaluated += 1);
    }

    pub fn record_configuration_failure(&self) {
        self.update(|c| c.configuration_failures += 1);
    }

    pub fn record_mask_computed(&self) {
        self.update(|c| c.masks_computed += 1);
    }

    pub fn record_mask_cache_hit(&self) {
        self.update(|c| c.mask_cache_hits += 1);
    }

    pub fn snapshot(&self) -> RunCounters {
        if let Ok(counters) = self.inner.lock() {
            *counters
        } else {
            RunCounters::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
