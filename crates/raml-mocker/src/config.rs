//! Generation options.
//!
//! Options are normally built in code, but can also be read from a YAML or JSON
//! file:
//!
//! ```yaml
//! path: ./specs
//! files:
//!   - ./extra/orders.raml
//! duplicatePolicy: keep-first
//! parserOptions:
//!   dereferenceSchemas: true
//! formats:
//!   sku: "SKU-0001"
//! ```

use crate::endpoint::DuplicatePolicy;
use crate::loader::ParserOptions;
use crate::mocker::Formats;
use crate::types::GenerateError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GenerateOptions {
    /// Directory scanned (non-recursively) for `.raml` files.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Additional specification files.
    #[serde(default)]
    pub files: Vec<PathBuf>,
    /// Custom string-format generators handed to the mocker.
    #[serde(default)]
    pub formats: Formats,
    #[serde(default)]
    pub parser_options: ParserOptions,
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from a YAML (or JSON) file. Relative paths in the file are
    /// resolved against the file's directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, GenerateError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            GenerateError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        let mut options: GenerateOptions = serde_yaml::from_str(&contents).map_err(|e| {
            GenerateError::Configuration(format!("invalid options in {}: {e}", path.display()))
        })?;

        if let Some(base) = path.parent() {
            options.path = options.path.map(|p| base.join(p));
            options.files = options.files.into_iter().map(|f| base.join(f)).collect();
        }

        options.validate()?;
        Ok(options)
    }

    /// At least one input (directory or file) must be named.
    pub fn validate(&self) -> Result<(), GenerateError> {
        let has_path = self
            .path
            .as_ref()
            .is_some_and(|p| !p.as_os_str().is_empty());
        if !has_path && self.files.is_empty() {
            return Err(GenerateError::Configuration(
                "either 'path' or 'files' must be provided".to_string(),
            ));
        }
        if self.files.iter().any(|f| f.as_os_str().is_empty()) {
            return Err(GenerateError::Configuration(
                "'files' must not contain empty paths".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.files.extend(files.into_iter().map(Into::into));
        self
    }

    pub fn with_formats(mut self, formats: Formats) -> Self {
        self.formats = formats;
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn with_dereference_schemas(mut self, dereference: bool) -> Self {
        self.parser_options.dereference_schemas = dereference;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    #[test]
    fn test_from_file_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("mocker.yaml");
        fs::write(
            &config,
            r#"
path: specs
files:
  - extra/orders.raml
duplicatePolicy: merge-responses
parserOptions:
  dereferenceSchemas: false
formats:
  sku: SKU-0001
"#,
        )
        .unwrap();

        let options = GenerateOptions::from_file(&config).unwrap();
        assert_eq!(options.path, Some(dir.path().join("specs")));
        assert_eq!(options.files, vec![dir.path().join("extra/orders.raml")]);
        assert_eq!(options.duplicate_policy, DuplicatePolicy::MergeResponses);
        assert!(!options.parser_options.dereference_schemas);

        let sku = options.formats.get("sku").unwrap();
        assert_eq!(sku(&json!({})), json!("SKU-0001"));
    }

    #[test]
    fn test_defaults() {
        let options: GenerateOptions = serde_yaml::from_str("path: /specs").unwrap();
        assert_eq!(options.duplicate_policy, DuplicatePolicy::LastWins);
        assert!(options.parser_options.dereference_schemas);
        assert!(options.files.is_empty());
        assert!(options.formats.is_empty());
    }

    #[test]
    fn test_validate_requires_an_input() {
        let err = GenerateOptions::new().validate().unwrap_err();
        assert!(matches!(err, GenerateError::Configuration(_)));

        assert!(GenerateOptions::new().with_path("/specs").validate().is_ok());
        assert!(GenerateOptions::new()
            .with_files(["a.raml"])
            .validate()
            .is_ok());
        assert!(GenerateOptions::new().with_path("").validate().is_err());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("mocker.yaml");
        fs::write(&config, "path: specs\ncallback: nope\n").unwrap();

        let err = GenerateOptions::from_file(&config).unwrap_err();
        assert!(err.to_string().contains("callback"));
    }

    #[test]
    fn test_missing_config_file() {
        let err = GenerateOptions::from_file("/no/such/options.yaml").unwrap_err();
        assert!(matches!(err, GenerateError::Configuration(_)));
    }

    #[test]
    fn test_builder() {
        let options = GenerateOptions::new()
            .with_path("specs")
            .with_files(vec![PathBuf::from("one.raml")])
            .with_duplicate_policy(DuplicatePolicy::KeepFirst)
            .with_dereference_schemas(false)
            .with_formats(Formats::new().with_constant("id", json!(7)));

        assert_eq!(options.path, Some(PathBuf::from("specs")));
        assert_eq!(options.files.len(), 1);
        assert_eq!(options.duplicate_policy, DuplicatePolicy::KeepFirst);
        assert!(!options.parser_options.dereference_schemas);
        assert_eq!(options.formats.names().collect::<Vec<_>>(), vec!["id"]);
    }
}
