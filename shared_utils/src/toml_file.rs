//! Reading TOML documents from disk into typed structs.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors raised while loading a TOML file.
#[derive(Debug, Error)]
pub enum TomlFileError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file was read but is not valid for the target type.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Reads `path` and deserializes it as TOML into `T`.
pub fn read_toml<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, TomlFileError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| TomlFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| TomlFileError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Sample {
        name: String,
        ttl_secs: u64,
    }

    #[test]
    fn reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name = \"pulse\"\nttl_secs = 60").unwrap();

        let sample: Sample = read_toml(file.path()).unwrap();
        assert_eq!(sample.name, "pulse");
        assert_eq!(sample.ttl_secs, 60);
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_toml::<Sample>(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, TomlFileError::Read { .. }));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name = 3").unwrap();

        let err = read_toml::<Sample>(file.path()).unwrap_err();
        assert!(matches!(err, TomlFileError::Parse { .. }));
        assert!(err.to_string().contains("failed to parse"));
    }
}
