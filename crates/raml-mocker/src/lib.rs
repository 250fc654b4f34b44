//! Mock response catalog generation from RAML API specifications.
//!
//! Loads every `.raml` file of a directory (or an explicit file list), walks the
//! resource tree of each, and flattens it into a [`Catalog`] of endpoints. Each
//! endpoint carries, per status code and media type, the declared example and a
//! value mocked from the declared JSON Schema. The catalog is what a stub HTTP
//! server needs to answer requests; [`imposter::to_imposter`] renders it as a
//! Mountebank imposter.
//!
//! # Example
//!
//! ```no_run
//! use raml_mocker::{generate, generate_catalog, GenerateOptions};
//!
//! # async fn run() -> Result<(), raml_mocker::GenerateError> {
//! let options = GenerateOptions::new().with_path("test/raml");
//!
//! // Callback style
//! generate(Some(&options), Some(|catalog: raml_mocker::Catalog| {
//!     for endpoint in &catalog {
//!         println!("{} {}", endpoint.method, endpoint.uri);
//!     }
//! }))
//! .await;
//!
//! // Report style, with diagnostics
//! let report = generate_catalog(&options).await?;
//! for diagnostic in report.reportable() {
//!     eprintln!("{diagnostic}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod base_uri;
pub mod config;
pub mod endpoint;
pub mod extractor;
pub mod generator;
pub mod imposter;
pub mod loader;
pub mod mocker;
pub mod spec;
pub mod types;
pub mod walker;

pub use config::GenerateOptions;
pub use endpoint::{
    Catalog, DuplicatePolicy, Endpoint, EndpointKey, HttpMethod, ResponseSet, ResponseVariant,
};
pub use generator::{generate, generate_catalog, show_usage, usage, Generator};
pub use loader::{ParserOptions, RamlLoader, SpecLoader};
pub use mocker::{FormatGenerator, Formats, JsonSchemaMocker, SchemaMocker};
pub use spec::SpecNode;
pub use types::{Diagnostic, GenerateError, GenerateReport, LoadError, Severity};
