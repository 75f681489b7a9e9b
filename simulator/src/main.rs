use anyhow::Context;
use clap::Parser;
use dticore::model::SuiteEntry;
use http_bridge::bridge::{default_bind_address, HttpBridge};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod http_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Counter-UAS DTI certification driver")]
struct Args {
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Scenario file to evaluate (repeatable); added to the workflow's list
    #[arg(long = "scenario")]
    scenarios: Vec<PathBuf>,
    /// Requirement catalog (YAML or JSON)
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Write the suite report as JSON
    #[arg(long)]
    output: Option<PathBuf>,
    /// Minimum overall score for a passing verdict
    #[arg(long)]
    pass_score: Option<f64>,
    /// Keep the HTTP bridge alive for incoming scenarios
    #[arg(long, default_value_t = false)]
    serve: bool,
    #[arg(long, default_value_t = 9000)]
    port: u16,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut workflow_config = if let Some(path) = args.workflow.as_ref() {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(Vec::new(), None, None)
    };
    workflow_config.scenarios.extend(args.scenarios);
    if args.catalog.is_some() {
        workflow_config.catalog = args.catalog;
    }
    if args.output.is_some() {
        workflow_config.output = args.output;
    }
    if args.pass_score.is_some() {
        workflow_config.pass_score = args.pass_score;
    }

    let runner = Arc::new(Runner::new(workflow_config.clone()).context("configuring evaluator")?);
    let bridge = args
        .serve
        .then(|| HttpBridge::new(runner.clone(), default_bind_address(args.port)));

    if !workflow_config.scenarios.is_empty() {
        let report = runner.execute()?;
        for entry in &report.entries {
            match entry {
                SuiteEntry::Evaluated(result) => println!(
                    "{} -> {:?} score {:.1} compliance {:.0}% ({} passed, {} failed)",
                    result.scenario_code,
                    result.verdict,
                    result.overall_score,
                    result.compliance_percentage,
                    result.passed_requirements.len(),
                    result.failed_requirements.len()
                ),
                SuiteEntry::Failed {
                    scenario_code,
                    error,
                } => println!("{} -> configuration error: {}", scenario_code, error),
            }
        }
        println!(
            "Suite -> {} passed, {} failed, {} errored; masks computed {}, cache hits {}",
            report.passed,
            report.failed,
            report.errored,
            report.counters.masks_computed,
            report.counters.mask_cache_hits
        );

        if let Some(path) = workflow_config.output.as_ref() {
            report.write_json(path)?;
            println!("Report written to {}", path.display());
        }
        if let Some(bridge) = bridge.as_ref() {
            bridge.publish(&report);
        }
    }

    if let Some(bridge) = bridge.as_ref() {
        bridge.publish_status(&format!(
            "HTTP bridge on port {} (GET /results, POST /evaluate; Ctrl+C to stop)...",
            args.port
        ));
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for signal handling")?;
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}
