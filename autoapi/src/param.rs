//! Per-field parameter metadata: where a field is bound from and the
//! constraints it documents and enforces.

use std::str::FromStr;

use serde_json::Value;

use crate::meta::{FieldKind, FieldMeta, TypeMeta};
use crate::tag;
use crate::validate::{self, Rule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Path,
    Query,
    Header,
    Body,
}

impl FromStr for Location {
    type Err = ();

    /// The `in = "..."` vocabulary. `form` is a body location.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "path" | "uri" => Ok(Self::Path),
            "query" => Ok(Self::Query),
            "header" => Ok(Self::Header),
            "body" | "json" | "form" => Ok(Self::Body),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamInfo {
    /// Position of the field in [`TypeMeta::fields`].
    pub field_index: usize,
    pub field: &'static str,
    /// The wire name: placeholder, query key, header name or body key.
    pub name: String,
    pub location: Location,
    pub kind: FieldKind,
    pub optional: bool,
    pub required: bool,
    pub description: String,
    pub example: Option<Value>,
    pub format: Option<String>,
    pub enum_values: Vec<String>,
    pub default: Option<Value>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub pattern: Option<String>,
    /// Field name inside form and multipart bodies.
    pub form_name: String,
    pub rules: Vec<Rule>,
}

/// Extracts the parameters of every field of `meta`, in declaration order.
pub fn extract_params(meta: &TypeMeta) -> Vec<ParamInfo> {
    meta.fields
        .iter()
        .enumerate()
        .map(|(index, field)| param_info(index, field))
        .collect()
}

fn param_info(field_index: usize, field: &FieldMeta) -> ParamInfo {
    let tags = &field.tags;
    let lowered = field.ident.to_lowercase();
    let body_name = tags
        .get("json")
        .and_then(tag::json_name)
        .or(field.serde_name)
        .map(String::from)
        .unwrap_or_else(|| lowered.clone());

    let (location, name) = if let Some(uri) = tags.get("uri") {
        (Location::Path, uri.to_string())
    } else if let Some(query) = tags.get("query") {
        (Location::Query, query.to_string())
    } else if let Some(header) = tags.get("header") {
        (Location::Header, header.to_string())
    } else if let Some(location) = tags.get("in").and_then(|v| v.parse().ok()) {
        let name = match location {
            Location::Header => field.ident.to_string(),
            Location::Body => body_name.clone(),
            Location::Path | Location::Query => lowered.clone(),
        };
        (location, name)
    } else {
        (Location::Body, body_name.clone())
    };

    let rule_source = ["binding", "validate", "v"]
        .iter()
        .filter_map(|key| tags.get(key))
        .collect::<Vec<_>>()
        .join(",");
    let rules = validate::parse_rules(&rule_source);
    let required = location == Location::Path || rules.contains(&Rule::Required);

    ParamInfo {
        field_index,
        field: field.ident,
        location,
        kind: field.kind,
        optional: field.optional,
        required,
        description: tags
            .get("dc")
            .map(String::from)
            .unwrap_or_else(|| format!("{} field", field.ident)),
        example: tags.get("example").map(|v| tag::parse_example(v, field.kind)),
        format: tags.get("format").map(String::from),
        enum_values: tags.get("enum").map(tag::split_list).unwrap_or_default(),
        default: tags.get("default").map(|v| tag::parse_example(v, field.kind)),
        min_length: tags.get("minLength").and_then(tag::parse_usize),
        max_length: tags.get("maxLength").and_then(tag::parse_usize),
        minimum: tags.get("min").and_then(tag::parse_f64),
        maximum: tags.get("max").and_then(tag::parse_f64),
        pattern: tags.get("pattern").map(String::from),
        form_name: tags.get("form").map(String::from).unwrap_or_else(|| {
            if location == Location::Body {
                body_name
            } else {
                name.clone()
            }
        }),
        name,
        rules,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::TagSet;
    use serde_json::json;

    static FIELDS: [FieldMeta; 5] = [
        FieldMeta {
            ident: "id",
            rust_type: "u64",
            kind: FieldKind::Uint,
            optional: false,
            serde_name: None,
            tags: TagSet::new(&[("uri", "id"), ("json", "id")]),
        },
        FieldMeta {
            ident: "q",
            rust_type: "String",
            kind: FieldKind::String,
            optional: false,
            serde_name: None,
            tags: TagSet::new(&[("query", "q"), ("header", "X-Q")]),
        },
        FieldMeta {
            ident: "token",
            rust_type: "String",
            kind: FieldKind::String,
            optional: false,
            serde_name: None,
            tags: TagSet::new(&[("header", "X-Token")]),
        },
        FieldMeta {
            ident: "userName",
            rust_type: "String",
            kind: FieldKind::String,
            optional: false,
            serde_name: None,
            tags: TagSet::new(&[
                ("json", "name,omitempty"),
                ("binding", "required,min=2"),
                ("minLength", "2"),
                ("maxLength", "oops"),
                ("example", "alice"),
            ]),
        },
        FieldMeta {
            ident: "Age",
            rust_type: "i32",
            kind: FieldKind::Int,
            optional: false,
            serde_name: None,
            tags: TagSet::new(&[("min", "0"), ("max", "150"), ("default", "18")]),
        },
    ];

    static META: TypeMeta = TypeMeta {
        type_name: "Sample",
        module_path: "tests",
        marker: None,
        fields: &FIELDS,
    };

    #[test]
    fn locations_in_declaration_order() {
        let params = extract_params(&META);
        let locations: Vec<_> = params.iter().map(|p| p.location).collect();
        assert_eq!(
            locations,
            vec![
                Location::Path,
                Location::Query,
                Location::Header,
                Location::Body,
                Location::Body
            ]
        );
        assert_eq!(params[1].name, "q");
        assert_eq!(params[2].name, "X-Token");
        assert_eq!(params[3].name, "name");
        assert_eq!(params[4].name, "age");
    }

    #[test]
    fn path_params_are_required() {
        let params = extract_params(&META);
        assert!(params[0].required);
        assert!(!params[1].required);
        assert!(params[3].required);
    }

    #[test]
    fn constraints_are_lenient() {
        let params = extract_params(&META);
        let name = &params[3];
        assert_eq!(name.min_length, Some(2));
        assert_eq!(name.max_length, None);
        assert_eq!(name.example, Some(json!("alice")));
        assert_eq!(name.description, "userName field");
        let age = &params[4];
        assert_eq!(age.minimum, Some(0.0));
        assert_eq!(age.maximum, Some(150.0));
        assert_eq!(age.default, Some(json!(18)));
    }

    #[test]
    fn in_tag_picks_location() {
        static IN_FIELDS: [FieldMeta; 2] = [
            FieldMeta {
                ident: "Authorization",
                rust_type: "String",
                kind: FieldKind::String,
                optional: false,
                serde_name: None,
                tags: TagSet::new(&[("in", "header")]),
            },
            FieldMeta {
                ident: "Page",
                rust_type: "u32",
                kind: FieldKind::Uint,
                optional: true,
                serde_name: None,
                tags: TagSet::new(&[("in", "query")]),
            },
        ];
        static IN_META: TypeMeta = TypeMeta {
            type_name: "In",
            module_path: "tests",
            marker: None,
            fields: &IN_FIELDS,
        };
        let params = extract_params(&IN_META);
        assert_eq!(params[0].location, Location::Header);
        assert_eq!(params[0].name, "Authorization");
        assert_eq!(params[1].location, Location::Query);
        assert_eq!(params[1].name, "page");
    }
}
