pub mod detection;
pub mod fusion;
pub mod identification;
pub mod pipeline;
pub mod tracking;

pub use detection::{detect, effective_pd, synthesize_false_alarms, SensorDetection};
pub use fusion::fuse;
pub use identification::{identify, IdentificationAttempt, IdentificationRecord};
pub use pipeline::DtiPipeline;
pub use tracking::{TrackConfig, TrackEngine, TrackState};
