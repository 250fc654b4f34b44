//! Base URI resolution: templated `baseUri` to a concrete path prefix.

use crate::spec::SpecNode;
use crate::types::Diagnostic;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, warn};
use url::Url;

/// Matches template tokens such as `{host}` or `{version}`.
static TOKEN_REGEX: OnceLock<Regex> = OnceLock::new();

fn token_regex() -> &'static Regex {
    TOKEN_REGEX.get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_-]*)\}").unwrap())
}

/// Placeholder base for base URIs written without scheme and host.
const RELATIVE_BASE: &str = "http://localhost/";

/// Resolve the node's base URI to the path prefix applied to its resources.
///
/// Tokens are looked up in the parameter's `default`, then its `name`, then a
/// same-named attribute of the node. Unresolvable tokens are left in place and
/// reported as warnings. Returns `""` when the node declares no base URI.
pub fn resolve_base_path(node: &SpecNode, diagnostics: &mut Vec<Diagnostic>) -> String {
    let Some(base_uri) = node.base_uri.as_deref() else {
        return String::new();
    };

    let Some(parameters) = node.base_uri_parameters.as_ref() else {
        return uri_path(base_uri);
    };

    let mut resolved = base_uri.to_string();
    for captures in token_regex().captures_iter(base_uri) {
        let token = &captures[0];
        let name = &captures[1];

        let value = parameters
            .get(name)
            .and_then(|param| param.default_text().or_else(|| param.name_text()))
            .or_else(|| node.attribute(name));

        match value {
            Some(value) => {
                debug!("Base URI parameter {} resolved to {}", token, value);
                resolved = resolved.replace(token, &value);
            }
            None => {
                warn!("No value found for {} in base URI {}", token, base_uri);
                diagnostics.push(
                    Diagnostic::warning("W001", format!("No value found for {token}"))
                        .with_location(format!("baseUri {base_uri}")),
                );
            }
        }
    }

    uri_path(&resolved)
}

/// Path component of a URI, discarding scheme, authority, query and fragment.
pub fn uri_path(uri: &str) -> String {
    let parsed = match Url::parse(uri) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(RELATIVE_BASE).and_then(|base| base.join(uri))
        }
        Err(e) => Err(e),
    };

    match parsed {
        Ok(url) if url.cannot_be_a_base() => String::new(),
        Ok(url) => url.path().to_string(),
        Err(e) => {
            debug!("Base URI {} is not a valid URI ({}), ignoring it", uri, e);
            String::new()
        }
    }
}
