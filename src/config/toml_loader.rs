//! TOML settings file loading.
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Deserialize `T` from the TOML file at `path`.
///
/// A missing file yields `T`'s defaults, as if the file were empty.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "settings file not found, using defaults");
        return toml::from_str("").context("Failed to create default settings");
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML settings: {}", path.display()))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::fs;

    #[derive(Debug, Default, Deserialize, PartialEq, Eq)]
    #[serde(default)]
    struct Sample {
        name: String,
        level: i32,
    }

    #[test]
    fn missing_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let sample: Sample = load_config(&tmp.path().join("none.toml")).unwrap();
        assert_eq!(sample, Sample::default());
    }

    #[test]
    fn reads_fields() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("s.toml");
        fs::write(&path, "name = \"x\"\nlevel = 4\n").unwrap();
        let sample: Sample = load_config(&path).unwrap();
        assert_eq!(
            sample,
            Sample {
                name: "x".to_string(),
                level: 4
            }
        );
    }

    #[test]
    fn parse_error_names_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.toml");
        fs::write(&path, "level = [").unwrap();
        let err = load_config::<Sample>(&path).unwrap_err();
        assert!(format!("{err}").contains("bad.toml"), "got {err}");
    }
}
