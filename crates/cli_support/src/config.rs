use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::common::VisualizeMode;

pub const DEFAULT_CONFIG_NAME: &str = "mcdropout-eval.toml";
pub const CONFIG_ENV: &str = "MCDROPOUT_EVAL_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Optional on-disk evaluation settings. Every field falls back to CLI/defaults when absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvalConfigFile {
    pub model_id: Option<String>,
    pub samples: Option<usize>,
    pub batch_size: Option<usize>,
    pub num_classes: Option<usize>,
    pub seed: Option<u64>,
    pub max_batches: Option<usize>,
    pub visualize: Option<VisualizeMode>,
    #[serde(default)]
    pub paths: PathSection,
    #[serde(default)]
    pub model: ModelSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathSection {
    pub data_dir: Option<String>,
    pub data_list: Option<String>,
    pub checkpoint: Option<String>,
    pub output: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSection {
    pub base_channels: Option<usize>,
    pub aspp_channels: Option<usize>,
    pub dropout_prob: Option<f64>,
}

impl EvalConfigFile {
    /// Load from `$MCDROPOUT_EVAL_CONFIG`, else `./mcdropout-eval.toml`, else defaults.
    ///
    /// An explicitly named file that is missing is an error; the implicit default may be absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::from_path(Path::new(&path));
        }
        let default = Path::new(DEFAULT_CONFIG_NAME);
        if default.exists() {
            return Self::from_path(default);
        }
        Ok(Self::default())
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn data_dir(&self) -> Option<PathBuf> {
        self.paths.data_dir.as_deref().map(expand_path)
    }

    pub fn data_list(&self) -> Option<PathBuf> {
        self.paths.data_list.as_deref().map(expand_path)
    }

    pub fn checkpoint(&self) -> Option<PathBuf> {
        self.paths.checkpoint.as_deref().map(expand_path)
    }

    pub fn output(&self) -> Option<PathBuf> {
        self.paths.output.as_deref().map(expand_path)
    }
}

/// Expand a leading `~` and any `${VAR}` references. Unknown variables are left as-is.
pub fn expand_path(raw: &str) -> PathBuf {
    let mut out = raw.to_string();
    if let Some(stripped) = out.strip_prefix('~') {
        if let Ok(home) = std::env::var("HOME") {
            out = format!("{home}{stripped}");
        }
    }
    PathBuf::from(expand_env(&out))
}

fn expand_env(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                match std::env::var(key) {
                    Ok(val) => out.push_str(&val),
                    Err(_) => out.push_str(&format!("${{{key}}}")),
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_known_vars_and_keeps_unknown() {
        std::env::set_var("MCDROPOUT_TEST_ROOT", "/data");
        assert_eq!(
            expand_path("${MCDROPOUT_TEST_ROOT}/cityscapes"),
            PathBuf::from("/data/cityscapes")
        );
        assert_eq!(
            expand_path("${MCDROPOUT_DEFINITELY_UNSET}/x"),
            PathBuf::from("${MCDROPOUT_DEFINITELY_UNSET}/x")
        );
        assert_eq!(expand_path("plain/${unterminated"), PathBuf::from("plain/${unterminated"));
    }
}
