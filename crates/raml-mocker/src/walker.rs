//! Resource tree traversal.
//!
//! The walk is iterative: an explicit stack of `(node, accumulated uri)` pairs
//! replaces recursion so deeply nested specifications cannot exhaust the call
//! stack. Sibling order is not part of the contract.

use crate::base_uri::resolve_base_path;
use crate::endpoint::Endpoint;
use crate::extractor::ResponseExtractor;
use crate::mocker::{Formats, SchemaMocker};
use crate::spec::SpecNode;
use crate::types::Diagnostic;
use regex::Regex;
use std::sync::OnceLock;
use tracing::trace;

static SEPARATOR_RUN: OnceLock<Regex> = OnceLock::new();

fn separator_run() -> &'static Regex {
    SEPARATOR_RUN.get_or_init(|| Regex::new(r"/{2,}").unwrap())
}

pub struct TreeWalker<'a> {
    extractor: ResponseExtractor<'a>,
}

impl<'a> TreeWalker<'a> {
    pub fn new(mocker: &'a dyn SchemaMocker, formats: &'a Formats) -> Self {
        Self {
            extractor: ResponseExtractor::new(mocker, formats),
        }
    }

    /// Every endpoint reachable from `root`, with URIs composed from `initial_uri`.
    pub fn walk(
        &self,
        root: &SpecNode,
        initial_uri: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<Endpoint> {
        let mut endpoints = Vec::new();
        let mut stack: Vec<(&SpecNode, String)> = vec![(root, initial_uri.to_string())];

        while let Some((node, accumulated)) = stack.pop() {
            let uri = compose_uri(&accumulated, node);
            trace!("Visiting {}", uri);

            if let Some(methods) = node.methods.as_deref() {
                endpoints.extend(self.extractor.extract(methods, &uri, diagnostics));
            }

            if let Some(children) = node.resources.as_deref() {
                let prefix = resolve_base_path(node, diagnostics);
                let child_uri = format!("{prefix}{uri}");
                stack.extend(children.iter().rev().map(|child| (child, child_uri.clone())));
            }
        }

        endpoints
    }
}

/// Append the node's relative URI (with `{param}` rewritten to `:param`) to
/// `accumulated`, collapsing repeated separators.
pub fn compose_uri(accumulated: &str, node: &SpecNode) -> String {
    let Some(relative) = node.relative_uri.as_deref() else {
        return accumulated.to_string();
    };

    let mut relative = relative.to_string();
    if let Some(params) = &node.uri_parameters {
        for name in params.keys() {
            relative = relative.replacen(&format!("{{{name}}}"), &format!(":{name}"), 1);
        }
    }

    normalize_separators(&format!("{accumulated}/{relative}"))
}

pub fn normalize_separators(uri: &str) -> String {
    separator_run().replace_all(uri, "/").into_owned()
}
