// Run the decision pipeline over a context file and print the report

use crate::inputs;
use anyhow::Context;
use riskgate_core::{system_clock, Deadline};
use riskgate_decision::RiskGate;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Arguments of `riskgate evaluate`
#[derive(Debug, Clone)]
pub struct EvaluateArgs {
    pub context: PathBuf,
    pub config: Option<PathBuf>,
    pub policies: Option<PathBuf>,
    pub enrichment: Option<PathBuf>,
    pub deadline_ms: Option<u64>,
}

pub async fn run(args: EvaluateArgs) -> anyhow::Result<()> {
    let clock = system_clock();
    let config = inputs::load_config(args.config.as_deref())?;
    let resolver = inputs::load_policies(args.policies.as_deref(), clock.clone())?;
    let context = inputs::load_context(&args.context)?;

    let mut gate = RiskGate::with_builtins(config.clone(), resolver, clock.clone());
    if let Some(path) = &args.enrichment {
        let (service, lookups) = inputs::load_enrichment(path, config, clock)?;
        gate = gate.with_enrichment(service, lookups);
    }

    let report = match args.deadline_ms {
        Some(ms) => {
            gate.decide_with_deadline(&context, Deadline::after(Duration::from_millis(ms)))
                .await
        }
        None => gate.decide(&context).await,
    };
    info!(
        subject_id = %report.subject_id,
        risk_level = %report.risk_level,
        complete = report.is_complete(),
        "decision made"
    );

    let rendered = serde_json::to_string_pretty(&report).context("rendering decision report")?;
    println!("{rendered}");
    Ok(())
}
