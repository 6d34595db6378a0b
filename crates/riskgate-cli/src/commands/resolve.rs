// Show which policy a region, framework and industry resolve to

use crate::inputs;
use anyhow::{Context, Result};
use riskgate_core::{system_clock, Framework, Industry, Region};
use riskgate_policy::Resolution;
use serde_json::json;
use std::path::Path;

pub fn run(region: &str, framework: &str, industry: Option<&str>, policies: &Path) -> Result<()> {
    let region: Region = region.parse().context("invalid region")?;
    let framework: Framework = framework.parse().context("invalid framework")?;
    let industry: Option<Industry> = industry
        .map(str::parse)
        .transpose()
        .context("invalid industry")?;

    let resolver = inputs::load_policies(Some(policies), system_clock())?;
    let rendered = match resolver.resolve(region, framework, industry) {
        Resolution::Found { policy, tier } => json!({
            "found": true,
            "tier": format!("{tier:?}"),
            "policy": policy,
        }),
        Resolution::NotFound => json!({ "found": false }),
    };
    println!("{}", serde_json::to_string_pretty(&rendered)?);
    Ok(())
}
