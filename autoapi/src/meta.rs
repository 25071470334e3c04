//! Static type metadata.
//!
//! `#[derive(ApiRequest)]` and `#[derive(ApiSchema)]` emit one [`TypeMeta`] per
//! type. The tables hold the raw tag values exactly as written in the
//! attributes; they are interpreted once, at registration, by
//! [`crate::route`] and [`crate::param`].

use crate::bind::{BindError, BoundFields};

/// An ordered list of `key = "value"` pairs taken from an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagSet {
    entries: &'static [(&'static str, &'static str)],
}

impl TagSet {
    pub const EMPTY: TagSet = TagSet { entries: &[] };

    pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { entries }
    }

    /// Returns the value for `key`. An empty value counts as absent.
    pub fn get(&self, key: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
            .filter(|v| !v.is_empty())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| *k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.entries.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The coercion class of a field, derived from its Rust type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Int,
    Uint,
    Float,
    Bool,
    /// A multipart upload, see [`crate::bind::UploadFile`].
    File,
    Array(&'static FieldKind),
    Object,
}

impl FieldKind {
    /// The JSON-Schema `type` keyword for this kind.
    pub fn schema_type(&self) -> &'static str {
        match self {
            FieldKind::String | FieldKind::File => "string",
            FieldKind::Int | FieldKind::Uint => "integer",
            FieldKind::Float => "number",
            FieldKind::Bool => "boolean",
            FieldKind::Array(_) => "array",
            FieldKind::Object => "object",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldKind::Int | FieldKind::Uint | FieldKind::Float)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldMeta {
    /// The Rust field name, without any `r#` prefix.
    pub ident: &'static str,
    pub rust_type: &'static str,
    pub kind: FieldKind,
    /// `true` when the declared type is `Option<_>`.
    pub optional: bool,
    /// Name resolved from `#[serde(rename)]` or the container `rename_all`.
    pub serde_name: Option<&'static str>,
    pub tags: TagSet,
}

#[derive(Debug)]
pub struct TypeMeta {
    pub type_name: &'static str,
    pub module_path: &'static str,
    /// Route-level tags from `#[api(...)]`. `None` means the type is not an
    /// API request type.
    pub marker: Option<TagSet>,
    pub fields: &'static [FieldMeta],
}

impl TypeMeta {
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.module_path, self.type_name)
    }
}

/// Types that carry static metadata. Implemented by `#[derive(ApiSchema)]`
/// for response and DTO types.
pub trait ApiSchema {
    fn type_meta() -> &'static TypeMeta;
}

/// A request type that can be rebuilt from bound request values.
///
/// Implemented by `#[derive(ApiRequest)]`; the `#[api(...)]` container
/// attribute supplies the route marker.
pub trait ApiRequest: ApiSchema + Sized + Send + 'static {
    fn from_bound(fields: &mut BoundFields) -> Result<Self, BindError>;
}
