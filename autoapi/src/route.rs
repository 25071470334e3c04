//! Route metadata read from the `#[api(...)]` marker of a request type.

use std::fmt;

use axum::routing::MethodFilter;

use crate::error::{Error, Result};
use crate::meta::{TagSet, TypeMeta};
use crate::tag;

pub const DEFAULT_MIME: &str = "application/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpVerb {
    /// Case-insensitive; anything beyond the four supported verbs is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    pub fn method_filter(&self) -> MethodFilter {
        match self {
            Self::Get => MethodFilter::GET,
            Self::Post => MethodFilter::POST,
            Self::Put => MethodFilter::PUT,
            Self::Delete => MethodFilter::DELETE,
        }
    }

    /// GET and DELETE requests never have their body read.
    pub fn reads_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteInfo {
    pub method: HttpVerb,
    /// Templated path with `{name}` placeholders and a leading `/`.
    pub path: String,
    pub summary: String,
    pub description: String,
    pub tags: Vec<String>,
    pub operation_id: Option<String>,
    pub produces: Vec<String>,
    pub consumes: Vec<String>,
    pub security: Vec<String>,
    pub headers: Vec<String>,
    pub deprecated: bool,
    pub version: Option<String>,
}

impl RouteInfo {
    /// The path in colon style, e.g. `/user/:id`.
    pub fn gin_path(&self) -> String {
        tag::gin_path(&self.path)
    }
}

/// Reads the route marker of `meta`.
///
/// A type without marker yields [`Error::MissingMarker`]; a marker without a
/// supported method or a path yields [`Error::InvalidMarker`].
pub fn extract_route(meta: &TypeMeta) -> Result<RouteInfo> {
    let marker = meta.marker.as_ref().ok_or_else(|| Error::MissingMarker {
        type_name: meta.type_name.to_string(),
    })?;
    let invalid = |reason: String| Error::InvalidMarker {
        type_name: meta.type_name.to_string(),
        reason,
    };

    let raw_method = marker
        .get("method")
        .ok_or_else(|| invalid("missing `method`".into()))?;
    let method = HttpVerb::parse(raw_method)
        .ok_or_else(|| invalid(format!("unsupported HTTP method `{raw_method}`")))?;
    let path = marker
        .get("path")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| invalid("missing `path`".into()))?;

    let mut headers = list(marker, "headers");
    for header in list(marker, "header") {
        if !headers.contains(&header) {
            headers.push(header);
        }
    }

    Ok(RouteInfo {
        method,
        path: tag::normalize_path(path),
        summary: marker.get("sm").unwrap_or_default().to_string(),
        description: marker.get("dc").unwrap_or_default().to_string(),
        tags: list(marker, "tags"),
        operation_id: marker.get("operationId").map(String::from),
        produces: mime_list(marker, "produces"),
        consumes: mime_list(marker, "consumes"),
        security: list(marker, "security"),
        headers,
        deprecated: marker
            .get("deprecated")
            .and_then(tag::parse_bool)
            .unwrap_or(false),
        version: marker.get("version").map(String::from),
    })
}

fn list(marker: &TagSet, key: &str) -> Vec<String> {
    marker.get(key).map(tag::split_list).unwrap_or_default()
}

fn mime_list(marker: &TagSet, key: &str) -> Vec<String> {
    let values = list(marker, key);
    if values.is_empty() {
        vec![DEFAULT_MIME.to_string()]
    } else {
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(marker: Option<TagSet>) -> TypeMeta {
        TypeMeta {
            type_name: "UserReq",
            module_path: "tests",
            marker,
            fields: &[],
        }
    }

    #[test]
    fn reads_full_marker() {
        let m = meta(Some(TagSet::new(&[
            ("method", "post"),
            ("path", "user/{id}"),
            ("sm", "Create"),
            ("tags", "user, admin"),
            ("security", "bearer"),
            ("header", "X-Trace"),
            ("deprecated", "true"),
            ("version", "v2"),
        ])));
        let route = extract_route(&m).unwrap();
        assert_eq!(route.method, HttpVerb::Post);
        assert_eq!(route.path, "/user/{id}");
        assert_eq!(route.gin_path(), "/user/:id");
        assert_eq!(route.tags, vec!["user", "admin"]);
        assert_eq!(route.produces, vec![DEFAULT_MIME]);
        assert_eq!(route.headers, vec!["X-Trace"]);
        assert!(route.deprecated);
        assert_eq!(route.version.as_deref(), Some("v2"));
        assert_eq!(extract_route(&m).unwrap(), route);
    }

    #[test]
    fn missing_marker_is_distinct() {
        assert!(matches!(
            extract_route(&meta(None)),
            Err(Error::MissingMarker { .. })
        ));
    }

    #[test]
    fn rejects_unknown_verbs_and_empty_paths() {
        let patch = meta(Some(TagSet::new(&[("method", "PATCH"), ("path", "/x")])));
        assert!(matches!(
            extract_route(&patch),
            Err(Error::InvalidMarker { .. })
        ));
        let no_path = meta(Some(TagSet::new(&[("method", "get"), ("path", " ")])));
        assert!(matches!(
            extract_route(&no_path),
            Err(Error::InvalidMarker { .. })
        ));
    }

    #[test]
    fn unparsable_deprecated_is_false() {
        let m = meta(Some(TagSet::new(&[
            ("method", "GET"),
            ("path", "/x"),
            ("deprecated", "maybe"),
        ])));
        assert!(!extract_route(&m).unwrap().deprecated);
    }
}
