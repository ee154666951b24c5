//! Team cost configuration
//!
//! A fixed, small set of teams known at configuration time, each carrying a
//! cost-per-story-point rate (CHF) and a display color. The embedded default
//! set matches the current planning increment; a TOML file can override it.

use crate::error::CoreError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Rate and display settings for one team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRate {
    /// Cost of one story point, in whole currency units
    pub cost_per_point: f64,
    /// Display color (hex), used by table/export renderers
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    "#64748b".to_string()
}

/// Embedded default team rates
static DEFAULT_TEAMS: Lazy<BTreeMap<String, TeamRate>> = Lazy::new(|| {
    let mut teams = BTreeMap::new();
    teams.insert(
        "Tungsten".to_string(),
        TeamRate {
            cost_per_point: 900.0,
            color: "#8b5cf6".to_string(),
        },
    );
    teams.insert(
        "Neon".to_string(),
        TeamRate {
            cost_per_point: 1460.0,
            color: "#ec4899".to_string(),
        },
    );
    teams.insert(
        "H1".to_string(),
        TeamRate {
            cost_per_point: 1270.0,
            color: "#10b981".to_string(),
        },
    );
    teams.insert(
        "Zn2C".to_string(),
        TeamRate {
            cost_per_point: 1280.0,
            color: "#f59e0b".to_string(),
        },
    );
    teams
});

/// Mapping from team name to rate configuration
///
/// Teams absent from this mapping are excluded from every aggregation pass,
/// regardless of any active filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamConfig {
    pub teams: BTreeMap<String, TeamRate>,
}

impl Default for TeamConfig {
    fn default() -> Self {
        Self {
            teams: DEFAULT_TEAMS.clone(),
        }
    }
}

impl TeamConfig {
    /// Load team rates from a TOML file
    ///
    /// Expected shape:
    /// ```toml
    /// [teams.Tungsten]
    /// cost_per_point = 900
    /// color = "#8b5cf6"
    /// ```
    pub fn from_toml_file(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CoreError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                CoreError::FileRead {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        let config: TeamConfig = toml::from_str(&content).map_err(|e| CoreError::TomlParse {
            path: path.to_path_buf(),
            message: e.to_string(),
            source: e,
        })?;

        if config.teams.is_empty() {
            return Err(CoreError::InvalidConfig {
                message: format!("No teams defined in {}", path.display()),
            });
        }

        Ok(config)
    }

    /// Whether a team participates in aggregation
    pub fn contains(&self, team: &str) -> bool {
        self.teams.contains_key(team)
    }

    /// Cost-per-point for a team; unknown teams valuate at 0
    pub fn cost_per_point(&self, team: &str) -> f64 {
        self.teams.get(team).map(|t| t.cost_per_point).unwrap_or(0.0)
    }

    /// Team names in stable (alphabetical) order
    pub fn team_names(&self) -> impl Iterator<Item = &str> {
        self.teams.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_teams() {
        let config = TeamConfig::default();
        assert_eq!(config.len(), 4);
        assert_eq!(config.cost_per_point("Tungsten"), 900.0);
        assert_eq!(config.cost_per_point("Neon"), 1460.0);
        assert!(config.contains("Zn2C"));
    }

    #[test]
    fn test_unknown_team_valuates_at_zero() {
        let config = TeamConfig::default();
        assert!(!config.contains("Krypton"));
        assert_eq!(config.cost_per_point("Krypton"), 0.0);
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r##"[teams.Alpha]
cost_per_point = 500
color = "#123456"

[teams.Beta]
cost_per_point = 750
"##
        )
        .unwrap();

        let config = TeamConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.len(), 2);
        assert_eq!(config.cost_per_point("Alpha"), 500.0);
        // Missing color falls back to the neutral default
        assert_eq!(config.teams["Beta"].color, "#64748b");
    }

    #[test]
    fn test_from_toml_missing_file() {
        let result = TeamConfig::from_toml_file(Path::new("/nonexistent/teams.toml"));
        assert!(matches!(result, Err(CoreError::FileNotFound { .. })));
    }

    #[test]
    fn test_from_toml_empty_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[teams]").unwrap();

        let result = TeamConfig::from_toml_file(file.path());
        assert!(matches!(result, Err(CoreError::InvalidConfig { .. })));
    }
}
