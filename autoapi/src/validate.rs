//! Declarative field validation over bound request values.
//!
//! Rules use the `binding` vocabulary (`required,min=3,email`, ...). A field
//! reports only its first failing rule; messages come from [`crate::i18n`].

use std::borrow::Cow;
use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::bind::{BoundFields, Slot};
use crate::i18n::{translator, Lang};
use crate::meta::FieldKind;
use crate::param::ParamInfo;
use crate::tag;

/// Field-keyed localized messages.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Required,
    OmitEmpty,
    Email,
    Url,
    Alpha,
    AlphaNum,
    Numeric,
    MobileCn,
    Len(String),
    Min(String),
    Max(String),
    Eq(String),
    Ne(String),
    Lt(String),
    Lte(String),
    Gt(String),
    Gte(String),
    OneOf(Vec<String>),
    /// Not understood; never fails.
    Unknown(String),
}

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("valid email regex")
});
static URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://[^\s/?#]+[^\s]*$").expect("valid url regex")
});
static ALPHA: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]+$").expect("valid alpha regex"));
static ALPHANUM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+$").expect("valid alphanum regex"));
static NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+]?[0-9]+(?:\.[0-9]+)?$").expect("valid numeric regex"));
static MOBILE_CN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^1[3-9][0-9]{9}$").expect("valid mobile regex"));

/// Parses a rule tag such as `required,min=3,oneof=a b`.
pub fn parse_rules(raw: &str) -> Vec<Rule> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "-")
        .map(parse_rule)
        .collect()
}

fn parse_rule(token: &str) -> Rule {
    let (name, param) = match token.split_once('=') {
        Some((n, p)) => (n.trim(), p.trim().to_string()),
        None => (token, String::new()),
    };
    let rule = match (name, param.is_empty()) {
        ("required", true) => Rule::Required,
        ("omitempty", true) => Rule::OmitEmpty,
        ("email", true) => Rule::Email,
        ("url", true) => Rule::Url,
        ("alpha", true) => Rule::Alpha,
        ("alphanum", true) => Rule::AlphaNum,
        ("numeric", true) => Rule::Numeric,
        ("mobile_cn", true) => Rule::MobileCn,
        ("len", false) => Rule::Len(param),
        ("min", false) => Rule::Min(param),
        ("max", false) => Rule::Max(param),
        ("eq", false) => Rule::Eq(param),
        ("ne", false) => Rule::Ne(param),
        ("lt", false) => Rule::Lt(param),
        ("lte", false) => Rule::Lte(param),
        ("gt", false) => Rule::Gt(param),
        ("gte", false) => Rule::Gte(param),
        ("oneof", false) => Rule::OneOf(param.split_whitespace().map(String::from).collect()),
        _ => Rule::Unknown(token.to_string()),
    };
    if let Rule::Unknown(token) = &rule {
        warn!(rule = %token, "ignoring unsupported validation rule");
    }
    rule
}

/// The shape of a bound value as the rules see it.
#[derive(Debug, Clone, PartialEq)]
enum Subject<'a> {
    Null,
    Str(&'a str),
    Num(f64),
    Bool(bool),
    Items(usize),
    File,
}

impl<'a> Subject<'a> {
    fn from_value(value: &'a Value) -> Self {
        match value {
            Value::Null => Subject::Null,
            Value::String(s) => Subject::Str(s),
            Value::Number(n) => Subject::Num(n.as_f64().unwrap_or_default()),
            Value::Bool(b) => Subject::Bool(*b),
            Value::Array(a) => Subject::Items(a.len()),
            Value::Object(o) => Subject::Items(o.len()),
        }
    }

    /// The zero value of a field that was never bound.
    fn zero(kind: FieldKind) -> Self {
        match kind {
            FieldKind::String => Subject::Str(""),
            FieldKind::Int | FieldKind::Uint | FieldKind::Float => Subject::Num(0.0),
            FieldKind::Bool => Subject::Bool(false),
            FieldKind::Array(_) | FieldKind::Object | FieldKind::File => Subject::Null,
        }
    }

    fn is_zero(&self) -> bool {
        match self {
            Subject::Null => true,
            Subject::Str(s) => s.is_empty(),
            Subject::Num(n) => *n == 0.0,
            Subject::Bool(b) => !b,
            Subject::Items(_) | Subject::File => false,
        }
    }

    fn text(&self) -> Option<Cow<'a, str>> {
        match self {
            Subject::Str(s) => Some(Cow::Borrowed(*s)),
            Subject::Num(n) => Some(Cow::Owned(n.to_string())),
            Subject::Bool(b) => Some(Cow::Owned(b.to_string())),
            _ => None,
        }
    }

    /// Measured size plus the message family used for size rules.
    fn size(&self) -> Option<(f64, &'static str)> {
        match self {
            Subject::Str(s) => Some((s.chars().count() as f64, "string")),
            Subject::Num(n) => Some((*n, "number")),
            Subject::Items(n) => Some((*n as f64, "items")),
            _ => None,
        }
    }
}

/// Validates every bound field of a request. Returns the localized messages
/// of the failing fields.
pub fn validate(params: &[ParamInfo], fields: &BoundFields, lang: Lang) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    for param in params {
        if let Some(key) = first_failure(param, fields.get(param.field_index)) {
            let message = translator().translate(lang, &key.0, param.field, &key.1);
            errors.insert(param.field.to_string(), message);
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Returns the message key and parameter of the first failing rule.
fn first_failure(param: &ParamInfo, slot: Option<&Slot>) -> Option<(String, String)> {
    if param.rules.is_empty() {
        return None;
    }
    let subject = match slot {
        Some(Slot::Text(v)) | Some(Slot::Json(v)) => Subject::from_value(v),
        Some(Slot::File(_)) => Subject::File,
        None if param.optional => Subject::Null,
        None => Subject::zero(param.kind),
    };
    let absent = param.optional && subject == Subject::Null;

    for rule in &param.rules {
        match rule {
            Rule::Required if subject.is_zero() => return Some(("required".into(), String::new())),
            Rule::Required | Rule::Unknown(_) => {}
            Rule::OmitEmpty if subject.is_zero() => return None,
            Rule::OmitEmpty => {}
            _ if absent => return None,
            _ => {
                if let Some(failure) = check(rule, &subject) {
                    return Some(failure);
                }
            }
        }
    }
    None
}

fn check(rule: &Rule, subject: &Subject<'_>) -> Option<(String, String)> {
    let fail = |key: &str, param: &str| Some((key.to_string(), param.to_string()));
    let is_match = |re: &Regex| subject.text().is_some_and(|t| re.is_match(&t));
    match rule {
        Rule::Email if !is_match(&EMAIL) => fail("email", ""),
        Rule::Url if !is_match(&URL) => fail("url", ""),
        Rule::Alpha if !is_match(&ALPHA) => fail("alpha", ""),
        Rule::AlphaNum if !is_match(&ALPHANUM) => fail("alphanum", ""),
        Rule::Numeric if !matches!(subject, Subject::Num(_)) && !is_match(&NUMERIC) => {
            fail("numeric", "")
        }
        Rule::MobileCn if !is_match(&MOBILE_CN) => fail("mobile_cn", ""),
        Rule::OneOf(options) => {
            let ok = subject.text().is_some_and(|t| {
                options.iter().any(|o| {
                    o == t.as_ref()
                        || matches!((subject, tag::parse_f64(o)), (Subject::Num(n), Some(v)) if *n == v)
                })
            });
            (!ok).then(|| ("oneof".to_string(), options.join(" ")))
        }
        Rule::Eq(param) if !equals(subject, param) => fail("eq", param),
        Rule::Ne(param) if equals(subject, param) => fail("ne", param),
        Rule::Len(p) => compare(subject, p, "len", |size, limit| size == limit),
        Rule::Min(p) => compare(subject, p, "min", |size, limit| size >= limit),
        Rule::Max(p) => compare(subject, p, "max", |size, limit| size <= limit),
        Rule::Lt(p) => compare(subject, p, "lt", |size, limit| size < limit),
        Rule::Lte(p) => compare(subject, p, "lte", |size, limit| size <= limit),
        Rule::Gt(p) => compare(subject, p, "gt", |size, limit| size > limit),
        Rule::Gte(p) => compare(subject, p, "gte", |size, limit| size >= limit),
        _ => None,
    }
}

fn equals(subject: &Subject<'_>, param: &str) -> bool {
    match subject {
        Subject::Str(s) => *s == param,
        Subject::Num(n) => tag::parse_f64(param).is_some_and(|p| p == *n),
        Subject::Bool(b) => tag::parse_bool(param) == Some(*b),
        Subject::Items(n) => tag::parse_usize(param) == Some(*n),
        Subject::Null | Subject::File => false,
    }
}

fn compare(
    subject: &Subject<'_>,
    param: &str,
    rule: &str,
    holds: impl Fn(f64, f64) -> bool,
) -> Option<(String, String)> {
    let (size, family) = subject.size()?;
    let limit = tag::parse_f64(param)?;
    (!holds(size, limit)).then(|| (format!("{rule}-{family}"), param.to_string()))
}
