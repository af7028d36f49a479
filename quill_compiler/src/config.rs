//! Compiler configuration.
//!
//! Act-script compilation relies on two lookup tables: display map names to
//! map ids, and act numbers to level ranges. Both ship with built-in
//! defaults; a `quill.toml` file may add map aliases under `[maps]` and
//! override level ranges under `[levels]`:
//!
//! ```toml
//! [maps]
//! "old mill" = "millbrook-mill"
//!
//! [levels]
//! 4 = { min = 15, max = 20 }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use quill_data::{Id, LevelRange};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config from '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config from '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// On-disk shape of `quill.toml`. Every table is optional.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    maps: BTreeMap<String, Id>,
    #[serde(default)]
    levels: BTreeMap<String, LevelRange>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompilerConfig {
    /// Lowercased display name -> map id.
    pub maps: BTreeMap<String, Id>,
    /// Act number -> level range.
    pub levels: BTreeMap<u32, LevelRange>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            maps: default_map_ids(),
            levels: default_level_ranges(),
        }
    }
}

impl CompilerConfig {
    /// Map id registered for an already lowercased display name.
    pub fn map_id(&self, key: &str) -> Option<&str> {
        self.maps.get(key).map(String::as_str)
    }

    /// Level range for `act`. Acts past the table continue in steps of five.
    pub fn level_range(&self, act: u32) -> LevelRange {
        self.levels.get(&act).copied().unwrap_or_else(|| {
            let max = act.saturating_mul(5);
            LevelRange {
                min: max.saturating_sub(5).max(1),
                max,
            }
        })
    }

    fn merge(&mut self, file: ConfigFile) {
        for (name, id) in file.maps {
            self.maps.insert(name.trim().to_lowercase(), id);
        }
        for (act, range) in file.levels {
            match act.trim().parse::<u32>() {
                Ok(act) => {
                    self.levels.insert(act, range);
                },
                Err(_) => warn!("ignoring level range for non-numeric act key '{act}'"),
            }
        }
    }
}

/// Built-in map name table. Keys are lowercase.
fn default_map_ids() -> BTreeMap<String, Id> {
    [
        ("heartfield", "heartfield"),
        ("heartfield village", "heartfield"),
        ("sunridge", "sunridge"),
        ("sunridge pass", "sunridge"),
        ("hollow ridge", "hollow-ridge"),
        ("hollow", "hollow-ridge"),
        ("millbrook", "millbrook"),
        ("stillwater", "stillwater-marsh"),
        ("stillwater marsh", "stillwater-marsh"),
        ("lumen", "lumen-spire"),
        ("lumen spire", "lumen-spire"),
        ("workshop", "heartfield-workshop"),
    ]
    .into_iter()
    .map(|(name, id)| (name.to_string(), id.to_string()))
    .collect()
}

fn default_level_ranges() -> BTreeMap<u32, LevelRange> {
    BTreeMap::from([
        (1, LevelRange { min: 1, max: 5 }),
        (2, LevelRange { min: 5, max: 10 }),
        (3, LevelRange { min: 10, max: 15 }),
    ])
}

/// Load configuration, falling back to the defaults when the file cannot be
/// read or parsed.
pub fn load_config(path: &Path) -> CompilerConfig {
    match try_load_config(path) {
        Ok(config) => {
            info!(
                "{} map names and {} level ranges loaded from '{}'",
                config.maps.len(),
                config.levels.len(),
                path.display()
            );
            config
        },
        Err(e) => {
            warn!("Could not load compiler config: {e}. Using built-in defaults.");
            CompilerConfig::default()
        },
    }
}

/// Load configuration from `path`, layered over the built-in defaults.
///
/// # Errors
/// Returns an error if the file cannot be read or is not valid TOML.
pub fn try_load_config(path: &Path) -> Result<CompilerConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: ConfigFile = toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config = CompilerConfig::default();
    config.merge(file);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_cover_known_maps() {
        let config = CompilerConfig::default();
        assert_eq!(config.map_id("heartfield"), Some("heartfield"));
        assert_eq!(config.map_id("hollow ridge"), Some("hollow-ridge"));
        assert_eq!(config.map_id("nowhere"), None);
    }

    #[test]
    fn level_ranges_extend_past_table() {
        let config = CompilerConfig::default();
        assert_eq!(config.level_range(1), LevelRange { min: 1, max: 5 });
        assert_eq!(config.level_range(5), LevelRange { min: 20, max: 25 });
    }

    #[test]
    fn file_layers_over_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[maps]\n\"Old Mill\" = \"millbrook-mill\"\n\n[levels]\n2 = {{ min = 6, max = 9 }}\n"
        )
        .unwrap();
        let config = try_load_config(file.path()).unwrap();
        assert_eq!(config.map_id("old mill"), Some("millbrook-mill"));
        assert_eq!(config.map_id("sunridge"), Some("sunridge"));
        assert_eq!(config.level_range(2), LevelRange { min: 6, max: 9 });
    }

    #[test]
    fn missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(try_load_config(&path), Err(ConfigError::Io { .. })));
        assert_eq!(load_config(&path), CompilerConfig::default());
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[maps\n").unwrap();
        assert!(matches!(try_load_config(file.path()), Err(ConfigError::Parse { .. })));
    }
}
