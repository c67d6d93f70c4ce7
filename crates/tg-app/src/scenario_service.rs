//! Scenario file services shared by the frontends.

use std::path::Path;

use crate::error::AppResult;
use tg_scenario::ScenarioFile;

/// Summary of one scenario entry for listings.
#[derive(Debug, Clone)]
pub struct ScenarioSummary {
    pub name: String,
    pub tag: String,
    pub end_time: f64,
    pub ignored: bool,
}

/// Load and validate a scenario file (JSON or YAML by extension).
pub fn load_scenarios(path: &Path) -> AppResult<ScenarioFile> {
    Ok(tg_scenario::load(path)?)
}

pub fn list_scenarios(scenarios: &ScenarioFile) -> Vec<ScenarioSummary> {
    scenarios
        .iter()
        .map(|(name, def)| ScenarioSummary {
            name: name.clone(),
            tag: def.tag.clone(),
            end_time: def.end_time_simulation,
            ignored: def.ignore,
        })
        .collect()
}
