//! The lenient tag-value grammar shared by route and parameter extraction.
//!
//! Nothing in here fails: a value that does not parse is reported as absent
//! (or passed through raw, for examples and defaults).

use serde_json::Value;

use crate::meta::FieldKind;

/// Placeholder style used when rewriting `{name}` path segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSyntax {
    /// `:name`, the gin / axum 0.7 style.
    Colon,
    /// `{name}`, the axum 0.8 and OpenAPI style.
    Brace,
}

/// Splits a comma separated list, trimming entries and dropping empty ones.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Parses a boolean with the `strconv.ParseBool` vocabulary.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

pub fn parse_usize(raw: &str) -> Option<usize> {
    raw.trim().parse().ok()
}

pub fn parse_f64(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Returns the placeholder name when `segment` is exactly `{name}`.
pub fn placeholder(segment: &str) -> Option<&str> {
    segment
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .filter(|name| !name.is_empty() && !name.contains(['{', '}']))
}

/// All placeholder names of a templated path, in order.
pub fn placeholders(path: &str) -> Vec<&str> {
    path.split('/').filter_map(placeholder).collect()
}

/// Rewrites fully wrapped `{name}` segments into the router's syntax.
///
/// Segments that merely contain braces (`foo{id}`) never become parameters.
/// Colon style leaves them alone, which keeps it idempotent; brace style
/// escapes them as `foo{{id}}` so the router matches them literally.
pub fn to_router_path(path: &str, syntax: PathSyntax) -> String {
    path.split('/')
        .map(|segment| match (placeholder(segment), syntax) {
            (Some(name), PathSyntax::Colon) => format!(":{name}"),
            (None, PathSyntax::Brace) if segment.contains(['{', '}']) => {
                segment.replace('{', "{{").replace('}', "}}")
            }
            _ => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// The colon-style path, e.g. `/user/:id`.
pub fn gin_path(path: &str) -> String {
    to_router_path(path, PathSyntax::Colon)
}

/// Ensures a single leading `/` and removes empty segments.
pub fn normalize_path(path: &str) -> String {
    join_path("", path)
}

/// Joins a prefix and a route path the way `path.Join("/", prefix, path)` does
/// for plain segments.
pub fn join_path(prefix: &str, path: &str) -> String {
    let segments: Vec<&str> = prefix
        .split('/')
        .chain(path.split('/'))
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    format!("/{}", segments.join("/"))
}

/// The first comma separated element of a `json` tag, `None` for `-`.
pub fn json_name(raw: &str) -> Option<&str> {
    let name = raw.split(',').next().unwrap_or_default().trim();
    (!name.is_empty() && name != "-").then_some(name)
}

/// Parses an `example` or `default` value according to the field kind.
///
/// Template values (`{{...}}`) and values that do not parse for their kind
/// are kept as raw strings.
pub fn parse_example(raw: &str, kind: FieldKind) -> Value {
    if raw.starts_with("{{") && raw.ends_with("}}") {
        return Value::String(raw.to_string());
    }
    let parsed = match kind {
        FieldKind::Int => raw.trim().parse::<i64>().ok().map(Value::from),
        FieldKind::Uint => raw.trim().parse::<u64>().ok().map(Value::from),
        FieldKind::Float => parse_f64(raw).map(Value::from),
        FieldKind::Bool => parse_bool(raw.trim()).map(Value::Bool),
        _ => None,
    };
    parsed.unwrap_or_else(|| Value::String(raw.to_string()))
}
