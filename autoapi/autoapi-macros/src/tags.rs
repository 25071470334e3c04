//! Parsing of `#[api(...)]`, `#[param(...)]` and the serde rename attributes.

use heck::{
    ToKebabCase, ToLowerCamelCase, ToShoutyKebabCase, ToShoutySnakeCase, ToSnakeCase,
    ToUpperCamelCase,
};
use syn::meta::ParseNestedMeta;
use syn::{Attribute, Expr, Lit, LitStr, Token};

/// Canonical key plus accepted spellings.
type KeySpec = (&'static str, &'static [&'static str]);

pub(crate) const MARKER_KEYS: &[KeySpec] = &[
    ("method", &[]),
    ("path", &[]),
    ("sm", &["summary"]),
    ("dc", &["description"]),
    ("tags", &[]),
    ("operationId", &["operation_id"]),
    ("produces", &[]),
    ("consumes", &[]),
    ("security", &[]),
    ("deprecated", &[]),
    ("version", &[]),
    ("headers", &[]),
    ("header", &[]),
];

pub(crate) const FIELD_KEYS: &[KeySpec] = &[
    ("uri", &[]),
    ("query", &[]),
    ("header", &[]),
    ("json", &[]),
    ("form", &[]),
    ("in", &["location"]),
    ("binding", &[]),
    ("validate", &[]),
    ("v", &[]),
    ("dc", &["description"]),
    ("example", &[]),
    ("format", &[]),
    ("enum", &[]),
    ("default", &[]),
    ("minLength", &["min_length"]),
    ("maxLength", &["max_length"]),
    ("min", &[]),
    ("max", &[]),
    ("pattern", &[]),
];

/// Keys that may be written as bare flags, meaning `"true"`.
const FLAG_KEYS: &[&str] = &["deprecated"];

/// Reads every `#[name(...)]` attribute into `(key, value)` pairs.
///
/// Unknown and repeated keys are compile errors. Returns `None` when no
/// attribute called `name` is present.
pub(crate) fn parse(
    attrs: &[Attribute],
    name: &str,
    keys: &[KeySpec],
) -> syn::Result<Option<Vec<(String, String)>>> {
    let mut found = false;
    let mut out: Vec<(String, String)> = Vec::new();
    for attr in attrs.iter().filter(|a| a.path().is_ident(name)) {
        found = true;
        attr.parse_nested_meta(|meta| {
            let written = meta
                .path
                .get_ident()
                .map(|i| i.to_string())
                .ok_or_else(|| meta.error("expected a plain key"))?;
            let key = canonical(&written, keys).ok_or_else(|| {
                let known: Vec<&str> = keys.iter().map(|(k, _)| *k).collect();
                meta.error(format!(
                    "unknown key `{written}` in #[{name}], expected one of: {}",
                    known.join(", ")
                ))
            })?;
            if out.iter().any(|(k, _)| k == key) {
                return Err(meta.error(format!("duplicate key `{key}`")));
            }
            let value = if meta.input.peek(Token![=]) {
                literal_value(&meta.value()?.parse::<Expr>()?)?
            } else if FLAG_KEYS.contains(&key) {
                "true".to_string()
            } else {
                return Err(meta.error(format!("expected `{key} = \"...\"`")));
            };
            out.push((key.to_string(), value));
            Ok(())
        })?;
    }
    Ok(found.then_some(out))
}

fn canonical(written: &str, keys: &[KeySpec]) -> Option<&'static str> {
    keys.iter()
        .find(|(key, aliases)| *key == written || aliases.iter().any(|a| *a == written))
        .map(|(key, _)| *key)
}

/// Accepts string, integer, float and boolean literals, plus negative numbers.
fn literal_value(expr: &Expr) -> syn::Result<String> {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            Lit::Str(s) => Ok(s.value()),
            Lit::Int(i) => Ok(i.base10_digits().to_string()),
            Lit::Float(f) => Ok(f.base10_digits().to_string()),
            Lit::Bool(b) => Ok(b.value.to_string()),
            other => Err(syn::Error::new_spanned(other, "expected a string, number or bool")),
        },
        Expr::Unary(unary) if matches!(unary.op, syn::UnOp::Neg(_)) => {
            Ok(format!("-{}", literal_value(&unary.expr)?))
        }
        other => Err(syn::Error::new_spanned(other, "expected a literal value")),
    }
}

/// A serde `rename_all` rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum RenameRule {
    Lower,
    Upper,
    Pascal,
    Camel,
    Snake,
    ScreamingSnake,
    Kebab,
    ScreamingKebab,
}

impl RenameRule {
    fn parse(raw: &str) -> Option<Self> {
        Some(match raw {
            "lowercase" => Self::Lower,
            "UPPERCASE" => Self::Upper,
            "PascalCase" => Self::Pascal,
            "camelCase" => Self::Camel,
            "snake_case" => Self::Snake,
            "SCREAMING_SNAKE_CASE" => Self::ScreamingSnake,
            "kebab-case" => Self::Kebab,
            "SCREAMING-KEBAB-CASE" => Self::ScreamingKebab,
            _ => return None,
        })
    }

    pub(crate) fn apply(&self, field: &str) -> String {
        match self {
            Self::Lower => field.to_ascii_lowercase(),
            Self::Upper => field.to_ascii_uppercase(),
            Self::Pascal => field.to_upper_camel_case(),
            Self::Camel => field.to_lower_camel_case(),
            Self::Snake => field.to_snake_case(),
            Self::ScreamingSnake => field.to_shouty_snake_case(),
            Self::Kebab => field.to_kebab_case(),
            Self::ScreamingKebab => field.to_shouty_kebab_case(),
        }
    }
}

/// Reads `rename_all` from the container's `#[serde(...)]` attributes.
pub(crate) fn serde_rename_all(attrs: &[Attribute]) -> syn::Result<Option<RenameRule>> {
    let mut rule = None;
    for_each_serde(attrs, |meta| {
        if meta.path.is_ident("rename_all") {
            if let Some(raw) = serialize_name(&meta)? {
                rule = RenameRule::parse(&raw);
                if rule.is_none() {
                    return Err(meta.error(format!("unknown rename rule `{raw}`")));
                }
            }
            return Ok(());
        }
        skip(&meta)
    })?;
    Ok(rule)
}

/// Reads `rename` from a field's `#[serde(...)]` attributes.
pub(crate) fn serde_rename(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut name = None;
    for_each_serde(attrs, |meta| {
        if meta.path.is_ident("rename") {
            name = serialize_name(&meta)?;
            return Ok(());
        }
        skip(&meta)
    })?;
    Ok(name)
}

fn for_each_serde(
    attrs: &[Attribute],
    mut f: impl FnMut(ParseNestedMeta) -> syn::Result<()>,
) -> syn::Result<()> {
    for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
        attr.parse_nested_meta(&mut f)?;
    }
    Ok(())
}

/// `key = "x"` or `key(serialize = "x", deserialize = "y")`; the serialize
/// side wins.
fn serialize_name(meta: &ParseNestedMeta) -> syn::Result<Option<String>> {
    if meta.input.peek(Token![=]) {
        let lit: LitStr = meta.value()?.parse()?;
        return Ok(Some(lit.value()));
    }
    let mut value = None;
    meta.parse_nested_meta(|inner| {
        let lit: LitStr = inner.value()?.parse()?;
        if inner.path.is_ident("serialize") || value.is_none() {
            value = Some(lit.value());
        }
        Ok(())
    })?;
    Ok(value)
}

/// Consumes a serde entry we do not interpret.
fn skip(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|inner| skip(&inner))?;
    }
    Ok(())
}
