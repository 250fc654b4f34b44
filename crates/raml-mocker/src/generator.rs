//! Orchestration: options in, endpoint catalog out.
//!
//! Every file is loaded concurrently on the calling task, walked from `/`, and
//! merged into one [`Catalog`] at the join point. Per-file failures are
//! reported as diagnostics and never abort the run; directory listing
//! failures and panics do.

use crate::config::GenerateOptions;
use crate::endpoint::Catalog;
use crate::loader::{RamlLoader, SpecLoader, SPEC_EXTENSION};
use crate::mocker::{JsonSchemaMocker, SchemaMocker};
use crate::types::{Diagnostic, GenerateError, GenerateReport};
use crate::walker::TreeWalker;
use futures::future::join_all;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const USAGE: &str = "\
--------------------------------------------------------------------
---------------------- HOW TO USE RAML MOCKER ----------------------
--  let options = GenerateOptions::new().with_path(\"test/raml\");   --
--  raml_mocker::generate(Some(&options), Some(|catalog| {         --
--      println!(\"{:?}\", catalog);                                --
--  })).await;                                                     --
--------------------------------------------------------------------";

/// Usage banner printed when generation cannot start or aborts.
pub fn usage() -> &'static str {
    USAGE
}

/// Print the usage banner to stderr.
pub fn show_usage() {
    eprintln!("{USAGE}");
}

/// Catalog generator with pluggable loader and schema mocker.
#[derive(Clone)]
pub struct Generator {
    loader: Arc<dyn SpecLoader>,
    mocker: Arc<dyn SchemaMocker>,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator {
    /// RAML loader and JSON Schema mocker.
    pub fn new() -> Self {
        Self {
            loader: Arc::new(RamlLoader::new()),
            mocker: Arc::new(JsonSchemaMocker::new()),
        }
    }

    pub fn with_loader(mut self, loader: Arc<dyn SpecLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_mocker(mut self, mocker: Arc<dyn SchemaMocker>) -> Self {
        self.mocker = mocker;
        self
    }

    /// Callback-style entry point.
    ///
    /// With options and a callback present, the callback is invoked exactly once
    /// with the merged catalog, even if some files failed to load. It is never
    /// invoked on a fatal error; the error is logged and usage printed instead.
    pub async fn generate<F>(&self, options: Option<&GenerateOptions>, callback: Option<F>)
    where
        F: FnOnce(Catalog),
    {
        let Some(options) = options else {
            error!("You must define an options object");
            show_usage();
            return;
        };
        let Some(callback) = callback else {
            error!("You must define a callback function");
            show_usage();
            return;
        };

        match self.generate_catalog(options).await {
            Ok(report) => {
                info!(
                    "Generated {} endpoint(s) from {} file(s) ({} error(s), {} warning(s))",
                    report.catalog.len(),
                    report.files_checked,
                    report.errors,
                    report.warnings
                );
                callback(report.catalog);
            }
            Err(e) => {
                error!("{}", e);
                show_usage();
            }
        }
    }

    /// Build the catalog and the diagnostics collected along the way.
    pub async fn generate_catalog(
        &self,
        options: &GenerateOptions,
    ) -> Result<GenerateReport, GenerateError> {
        options.validate()?;

        AssertUnwindSafe(self.run(options))
            .catch_unwind()
            .await
            .map_err(|panic| GenerateError::Unexpected(panic_message(panic.as_ref())))?
    }

    async fn run(&self, options: &GenerateOptions) -> Result<GenerateReport, GenerateError> {
        let files = collect_files(options).await?;
        debug!("Generating from {} specification file(s)", files.len());

        let loads = files.iter().map(|file| async move {
            let loaded = self.loader.load(file, &options.parser_options).await;
            (file, loaded)
        });
        let results = join_all(loads).await;

        let mut report = GenerateReport {
            catalog: Catalog::new(options.duplicate_policy),
            files_checked: files.len(),
            ..Default::default()
        };
        let walker = TreeWalker::new(self.mocker.as_ref(), &options.formats);

        for (file, loaded) in results {
            let root = match loaded {
                Ok(root) => root,
                Err(e) => {
                    warn!("Error parsing {}: {}", file.display(), e);
                    report.add_diagnostic(Diagnostic::error("E001", e.to_string()).with_file(file));
                    continue;
                }
            };

            let mut diagnostics = Vec::new();
            let endpoints = walker.walk(&root, "/", &mut diagnostics);
            debug!("{} yielded {} endpoint(s)", file.display(), endpoints.len());
            report.extend_diagnostics(diagnostics.into_iter().map(|d| d.with_file(file)));

            for key in report.catalog.extend(endpoints) {
                warn!(
                    "Duplicate endpoint {} in {} ({:?})",
                    key,
                    file.display(),
                    options.duplicate_policy
                );
                report.add_diagnostic(
                    Diagnostic::warning("W002", format!("Duplicate endpoint {key}"))
                        .with_file(file)
                        .with_location(key.to_string()),
                );
            }
        }

        Ok(report)
    }
}

/// `.raml` files in `options.path` plus `options.files`, sorted and deduplicated.
async fn collect_files(options: &GenerateOptions) -> Result<Vec<PathBuf>, GenerateError> {
    let mut files = match options.path.as_deref() {
        Some(dir) => list_spec_files(dir).await?,
        None => Vec::new(),
    };
    files.extend(options.files.iter().cloned());
    files.sort();
    files.dedup();
    Ok(files)
}

async fn list_spec_files(dir: &Path) -> Result<Vec<PathBuf>, GenerateError> {
    let list_error = |source| GenerateError::DirectoryList {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(list_error)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(list_error)? {
        let path = entry.path();
        let is_spec = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(SPEC_EXTENSION));
        if !is_spec {
            continue;
        }
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => files.push(path),
            Ok(_) => debug!("Skipping {}: not a regular file", path.display()),
            Err(e) => debug!("Skipping {}: {}", path.display(), e),
        }
    }
    Ok(files)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}

/// [`Generator::generate`] with the default loader and mocker.
pub async fn generate<F>(options: Option<&GenerateOptions>, callback: Option<F>)
where
    F: FnOnce(Catalog),
{
    Generator::new().generate(options, callback).await
}

/// [`Generator::generate_catalog`] with the default loader and mocker.
pub async fn generate_catalog(options: &GenerateOptions) -> Result<GenerateReport, GenerateError> {
    Generator::new().generate_catalog(options).await
}
