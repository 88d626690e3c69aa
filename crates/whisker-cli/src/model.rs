//! Model data loading for the CLI
//!
//! The model a template renders against is read from a JSON or TOML file,
//! chosen by the file extension.

use std::{fs, io, path::Path};

use log::debug;
use thiserror::Error;

use whisker::{Value, WhiskerError};

/// Model data errors for CLI
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to parse JSON data: {0}")]
    Json(String),

    #[error("Failed to parse TOML data: {0}")]
    Toml(String),

    #[error("Unsupported data format: {0} (expected .json or .toml)")]
    UnsupportedFormat(String),
}

impl From<ModelError> for WhiskerError {
    fn from(err: ModelError) -> Self {
        WhiskerError::Io(io::Error::new(io::ErrorKind::InvalidData, err.to_string()))
    }
}

/// Load the model from `path`, or return [`Value::Null`] when no path is given.
///
/// # Errors
///
/// Returns error if the file cannot be read, has an unknown extension, or
/// does not parse.
pub fn load_model(path: Option<impl AsRef<Path>>) -> Result<Value, WhiskerError> {
    let Some(path) = path else {
        debug!("No data file given, rendering against an empty model");
        return Ok(Value::Null);
    };
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    debug!(path = path.display().to_string(), format = extension; "Loading model data");

    let model = match extension.as_str() {
        "json" => {
            let json: serde_json::Value =
                serde_json::from_str(&content).map_err(|e| ModelError::Json(e.to_string()))?;
            Value::from(json)
        }
        "toml" => {
            let table: toml::Table =
                toml::from_str(&content).map_err(|e| ModelError::Toml(e.to_string()))?;
            Value::from_serialize(&table).map_err(|e| ModelError::Toml(e.to_string()))?
        }
        _ => return Err(ModelError::UnsupportedFormat(path.display().to_string()).into()),
    };

    Ok(model)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_no_path_is_null() {
        assert_eq!(load_model(None::<&Path>).unwrap(), Value::Null);
    }

    #[test]
    fn test_load_json_model() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, r#"{"name": "Whisker", "tags": ["a", "b"]}"#).unwrap();

        let model = load_model(Some(&path)).unwrap();
        assert_eq!(model.get_member("name"), Some(Value::from("Whisker")));
        assert_eq!(model.lookup_path("tags.1"), Some(Value::from("b")));
    }

    #[test]
    fn test_load_toml_model() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.toml");
        fs::write(&path, "title = \"Hi\"\n\n[owner]\nage = 3\n").unwrap();

        let model = load_model(Some(&path)).unwrap();
        assert_eq!(model.get_member("title"), Some(Value::from("Hi")));
        assert_eq!(model.lookup_path("owner.age"), Some(Value::from(3)));
    }

    #[test]
    fn test_invalid_data_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "{not json").unwrap();

        let err = load_model(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Failed to parse JSON data"));
    }

    #[test]
    fn test_unsupported_extension_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.yaml");
        fs::write(&path, "a: 1").unwrap();

        assert!(matches!(
            load_model(Some(&path)),
            Err(WhiskerError::Io(err)) if err.kind() == io::ErrorKind::InvalidData
        ));
    }
}
