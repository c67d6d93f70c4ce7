//! On-disk results store.

use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{ScenarioManifest, SweepPoint};
use crate::{ResultsError, ResultsResult};

/// Stores each scenario's outputs under `<root>/<tag>/`: a
/// `manifest.json` plus one CSV file per numeric series.
#[derive(Clone)]
pub struct ResultsStore {
    root_dir: PathBuf,
}

impl ResultsStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    fn scenario_dir(&self, tag: &str) -> PathBuf {
        self.root_dir.join(tag)
    }

    pub fn has_scenario(&self, tag: &str) -> bool {
        self.scenario_dir(tag).join("manifest.json").exists()
    }

    pub fn save_manifest(&self, manifest: &ScenarioManifest) -> ResultsResult<()> {
        let dir = self.scenario_dir(&manifest.tag);
        fs::create_dir_all(&dir)?;
        let manifest_json = serde_json::to_string_pretty(manifest)?;
        fs::write(dir.join("manifest.json"), manifest_json)?;
        Ok(())
    }

    pub fn load_manifest(&self, tag: &str) -> ResultsResult<ScenarioManifest> {
        let path = self.scenario_dir(tag).join("manifest.json");
        if !path.exists() {
            return Err(ResultsError::NotFound {
                tag: tag.to_string(),
            });
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write one CSV series file with the given header and columns.
    ///
    /// All columns must share one length; values are written in full
    /// precision.
    pub fn write_series(
        &self,
        tag: &str,
        name: &str,
        header: &[&str],
        columns: &[&[f64]],
    ) -> ResultsResult<()> {
        if header.len() != columns.len() {
            return Err(ResultsError::ColumnMismatch {
                what: format!(
                    "{} header fields vs {} columns in '{name}'",
                    header.len(),
                    columns.len()
                ),
            });
        }
        let rows = columns.first().map_or(0, |c| c.len());
        for (field, column) in header.iter().zip(columns) {
            if column.len() != rows {
                return Err(ResultsError::ColumnMismatch {
                    what: format!("column '{field}' in '{name}'"),
                });
            }
        }

        let mut csv = String::new();
        csv.push_str(&header.join(","));
        csv.push('\n');
        for row in 0..rows {
            let cells: Vec<String> = columns.iter().map(|c| format!("{}", c[row])).collect();
            csv.push_str(&cells.join(","));
            csv.push('\n');
        }

        let dir = self.scenario_dir(tag);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(format!("{name}.csv")), csv)?;
        Ok(())
    }

    /// Read back one series file as (header, columns).
    pub fn read_series(&self, tag: &str, name: &str) -> ResultsResult<(Vec<String>, Vec<Vec<f64>>)> {
        let path = self.scenario_dir(tag).join(format!("{name}.csv"));
        if !path.exists() {
            return Err(ResultsError::NotFound {
                tag: format!("{tag}/{name}"),
            });
        }
        let content = fs::read_to_string(path)?;
        let mut lines = content.lines();
        let header: Vec<String> = lines
            .next()
            .unwrap_or_default()
            .split(',')
            .map(str::to_string)
            .collect();
        let mut columns = vec![Vec::new(); header.len()];
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            for (i, cell) in line.split(',').enumerate() {
                if let Some(column) = columns.get_mut(i) {
                    column.push(cell.parse::<f64>().unwrap_or(f64::NAN));
                }
            }
        }
        Ok((header, columns))
    }

    /// Write the ρ-sweep trade-off table; missing metrics become empty
    /// cells.
    pub fn write_sweep(&self, tag: &str, points: &[SweepPoint]) -> ResultsResult<()> {
        let mut csv = String::from("rho,settling_time_s,mean_inter_event_time_s\n");
        for point in points {
            let settle = point
                .settling_time
                .map(|v| v.to_string())
                .unwrap_or_default();
            let mean = point
                .mean_inter_event_time
                .map(|v| v.to_string())
                .unwrap_or_default();
            csv.push_str(&format!("{},{},{}\n", point.rho, settle, mean));
        }
        let dir = self.scenario_dir(tag);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("sweep.csv"), csv)?;
        Ok(())
    }

    pub fn list_scenarios(&self) -> ResultsResult<Vec<ScenarioManifest>> {
        let mut manifests = Vec::new();
        if !self.root_dir.exists() {
            return Ok(manifests);
        }
        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let tag = entry.file_name().to_string_lossy().to_string();
                if let Ok(manifest) = self.load_manifest(&tag) {
                    manifests.push(manifest);
                }
            }
        }
        Ok(manifests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(label: &str) -> ResultsStore {
        let dir = std::env::temp_dir().join(format!("tg-results-test-{label}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        ResultsStore::new(dir).unwrap()
    }

    fn manifest(tag: &str) -> ScenarioManifest {
        ScenarioManifest {
            run_id: "abc123".to_string(),
            scenario: "scenario_1".to_string(),
            tag: tag.to_string(),
            timestamp: "2025-01-01T00:00:00Z".to_string(),
            solver_version: "0.1.0".to_string(),
            series: vec!["closed_loop_static_linearized".to_string()],
        }
    }

    #[test]
    fn manifest_round_trip() {
        let store = temp_store("manifest");
        store.save_manifest(&manifest("nominal")).unwrap();
        assert!(store.has_scenario("nominal"));
        let loaded = store.load_manifest("nominal").unwrap();
        assert_eq!(loaded.run_id, "abc123");
        assert_eq!(loaded.series.len(), 1);
    }

    #[test]
    fn series_round_trip() {
        let store = temp_store("series");
        let time = [0.0, 1e-5, 2e-5];
        let voltage = [-20.0, -19.5, -19.1];
        store
            .write_series("nominal", "states", &["time_s", "v_c"], &[&time, &voltage])
            .unwrap();

        let (header, columns) = store.read_series("nominal", "states").unwrap();
        assert_eq!(header, vec!["time_s", "v_c"]);
        assert_eq!(columns[0], time.to_vec());
        assert_eq!(columns[1], voltage.to_vec());
    }

    #[test]
    fn mismatched_columns_are_rejected() {
        let store = temp_store("mismatch");
        let time = [0.0, 1e-5];
        let short = [1.0];
        assert!(
            store
                .write_series("nominal", "bad", &["t", "v"], &[&time, &short])
                .is_err()
        );
    }

    #[test]
    fn sweep_table_handles_missing_metrics() {
        let store = temp_store("sweep");
        let points = vec![
            SweepPoint {
                rho: 0.1,
                settling_time: Some(0.012),
                mean_inter_event_time: Some(3.2e-5),
            },
            SweepPoint {
                rho: 0.2,
                settling_time: None,
                mean_inter_event_time: None,
            },
        ];
        store.write_sweep("nominal", &points).unwrap();
        let content =
            fs::read_to_string(store.root().join("nominal").join("sweep.csv")).unwrap();
        assert!(content.contains("0.1,0.012,0.000032"));
        assert!(content.contains("0.2,,"));
    }

    #[test]
    fn missing_scenario_reports_not_found() {
        let store = temp_store("missing");
        assert!(matches!(
            store.load_manifest("ghost"),
            Err(ResultsError::NotFound { .. })
        ));
    }
}
