use crate::workflow::runner::{Runner, SuiteReport};
use dticore::model::SuiteEntry;
use dticore::Scenario;
use log::{error, info, warn};
use serde_json::{json, Value};
use std::{
    net::SocketAddr,
    sync::{Arc, RwLock},
    thread,
};
use tokio::runtime::Builder;
use tokio::task;
use warp::{http::StatusCode, Filter};

pub fn default_bind_address(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

type SharedReport = Arc<RwLock<SuiteReport>>;

/// `GET /results` serves the latest report; `POST /evaluate` runs a posted scenario
/// and folds it into that report.
pub fn routes(
    state: SharedReport,
    runner: Arc<Runner>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let state_filter = warp::any().map(move || state.clone());
    let runner_filter = warp::any().map(move || runner.clone());

    let get_route = warp::path("results")
        .and(warp::path::end())
        .and(warp::get())
        .and(state_filter.clone())
        .map(|state: SharedReport| match state.read() {
            Ok(report) => warp::reply::with_status(warp::reply::json(&*report), StatusCode::OK),
            Err(_) => warp::reply::with_status(
                warp::reply::json(&json!({"status": "error", "error": "report unavailable"})),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        });

    let post_route = warp::path("evaluate")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(state_filter)
        .and(runner_filter)
        .and_then(|scenario: Scenario, state: SharedReport, runner: Arc<Runner>| async move {
            let outcome =
                task::spawn_blocking(move || evaluate_and_record(scenario, &state, &runner)).await;
            let reply = match outcome {
                Ok((body, status)) => warp::reply::with_status(warp::reply::json(&body), status),
                Err(err) => {
                    error!("[bridge] evaluation task failed: {}", err);
                    let body = json!({"status": "error", "error": "evaluation task failed"});
                    warp::reply::with_status(
                        warp::reply::json(&body),
                        StatusCode::INTERNAL_SERVER_ERROR,
                    )
                }
            };
            Ok::<_, warp::Rejection>(reply)
        });

    get_route.or(post_route)
}

/// Runs one posted scenario on the blocking pool and folds it into the report.
fn evaluate_and_record(
    scenario: Scenario,
    state: &SharedReport,
    runner: &Runner,
) -> (Value, StatusCode) {
    let (entry, body, status) = match runner.evaluate(&scenario) {
        Ok(result) => {
            info!(
                "[bridge] scenario {} -> {:?} (score {:.1})",
                result.scenario_code, result.verdict, result.overall_score
            );
            let body = json!({"status": "evaluated", "result": &result});
            (SuiteEntry::Evaluated(Box::new(result)), body, StatusCode::OK)
        }
        Err(err) => {
            let message = format!("{:#}", err);
            warn!("[bridge] {}", message);
            let body = json!({"status": "failed", "error": &message});
            let entry = SuiteEntry::Failed {
                scenario_code: scenario.code.clone(),
                error: message,
            };
            (entry, body, StatusCode::UNPROCESSABLE_ENTITY)
        }
    };
    if let Ok(mut report) = state.write() {
        report.upsert(entry);
        report.counters = runner.counters();
    }
    (body, status)
}

/// Hosts the results endpoint on a background thread.
pub struct HttpBridge {
    state: SharedReport,
}

impl HttpBridge {
    pub fn new(runner: Arc<Runner>, address: SocketAddr) -> Self {
        let state: SharedReport = Arc::new(RwLock::new(SuiteReport::default()));
        let filter = routes(state.clone(), runner);

        thread::spawn(move || {
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!("[bridge] failed to build runtime: {}", err);
                    return;
                }
            };
            runtime.block_on(async move {
                warp::serve(filter).run(address).await;
            });
        });

        Self { state }
    }

    pub fn publish(&self, report: &SuiteReport) {
        if let Ok(mut guard) = self.state.write() {
            *guard = report.clone();
            info!(
                "[bridge] published {} entries ({} passed, {} failed, {} errored)",
                guard.entries.len(),
                guard.passed,
                guard.failed,
                guard.errored
            );
        }
    }

    pub fn publish_status(&self, message: &str) {
        println!("[bridge] {}", message);
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> SuiteReport {
        self.state.read().map(|report| report.clone()).unwrap_or_default()
    }
}
