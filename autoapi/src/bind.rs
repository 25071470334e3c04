//! Request binding: path, headers, query and body into per-field slots.
//!
//! Each field is read from its single declared location, so a query-bound
//! field can never be overwritten by a same-named body key.

use std::collections::HashMap;

use axum::body::{to_bytes, Body, Bytes};
use axum::extract::{FromRequest, FromRequestParts, Multipart, Path};
use axum::http::{header::CONTENT_TYPE, request::Parts, Request};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::handler::{ApiDescriptor, RequestContext};
use crate::i18n::Lang;
use crate::meta::{FieldKind, FieldMeta, TypeMeta};
use crate::param::{Location, ParamInfo};
use crate::tag;

/// Upper bound for every request body kind, multipart included.
pub const MAX_BODY_BYTES: usize = 32 << 20;

#[derive(Error, Debug)]
pub enum BindError {
    #[error("request body is empty")]
    EmptyBody,
    #[error("malformed JSON body: {0}")]
    Json(String),
    #[error("field `{field}` has an incorrect type, expected {expected}")]
    JsonType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("invalid form body: {0}")]
    Form(String),
    #[error("invalid path parameters: {0}")]
    Path(String),
    #[error("failed to read request body: {0}")]
    Read(String),
}

/// A file part of a multipart body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadFile {
    pub field_name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadFile {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// A value coerced from a string source (path, header, query, form).
    Text(Value),
    /// A value taken verbatim from a JSON body.
    Json(Value),
    File(UploadFile),
}

/// Per-request staging area, one slot per request field.
#[derive(Debug, Default)]
pub struct BoundFields {
    fields: &'static [FieldMeta],
    slots: Vec<Option<Slot>>,
}

impl BoundFields {
    pub fn for_type(meta: &'static TypeMeta) -> Self {
        Self {
            fields: meta.fields,
            slots: vec![None; meta.fields.len()],
        }
    }

    pub fn with_len(len: usize) -> Self {
        Self {
            fields: &[],
            slots: vec![None; len],
        }
    }

    pub fn set(&mut self, index: usize, slot: Slot) {
        if let Some(entry) = self.slots.get_mut(index) {
            *entry = Some(slot);
        }
    }

    pub fn get(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn is_bound(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Moves a bound value out as `T`.
    ///
    /// Unbound fields and string-sourced values that do not fit `T` yield
    /// `T::default()`. A JSON value of the wrong type is an error.
    pub fn take<T: DeserializeOwned + Default>(&mut self, index: usize) -> Result<T, BindError> {
        match self.slots.get_mut(index).and_then(Option::take) {
            None | Some(Slot::File(_)) | Some(Slot::Json(Value::Null)) => Ok(T::default()),
            Some(Slot::Text(value)) => Ok(serde_json::from_value(value).unwrap_or_default()),
            Some(Slot::Json(value)) => {
                serde_json::from_value(value).map_err(|_| match self.fields.get(index) {
                    Some(field) => BindError::JsonType {
                        field: field.ident,
                        expected: field.kind.schema_type(),
                    },
                    None => BindError::Json(format!("field #{index} has an incorrect type")),
                })
            }
        }
    }

    pub fn take_file(&mut self, index: usize) -> Option<UploadFile> {
        match self.slots.get_mut(index).and_then(Option::take) {
            Some(Slot::File(file)) => Some(file),
            _ => None,
        }
    }
}

/// Coerces a string-sourced value to the field kind. Empty and unparsable
/// values yield `None`, leaving the slot unbound.
pub fn coerce(raw: &str, kind: FieldKind) -> Option<Value> {
    if raw.is_empty() {
        return None;
    }
    match kind {
        FieldKind::String | FieldKind::Object => Some(Value::String(raw.to_string())),
        FieldKind::Int => raw.trim().parse::<i64>().ok().map(Value::from),
        FieldKind::Uint => raw.trim().parse::<u64>().ok().map(Value::from),
        FieldKind::Float => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        FieldKind::Bool => tag::parse_bool(raw.trim()).map(Value::Bool),
        FieldKind::Array(inner) => coerce(raw, *inner).map(|v| Value::Array(vec![v])),
        FieldKind::File => None,
    }
}

/// Coerces every value of a repeated key. Non-array fields keep the first.
fn coerce_all<'a>(values: impl IntoIterator<Item = &'a str>, kind: FieldKind) -> Option<Value> {
    match kind {
        FieldKind::Array(inner) => {
            let items: Vec<Value> = values.into_iter().filter_map(|v| coerce(v, *inner)).collect();
            (!items.is_empty()).then_some(Value::Array(items))
        }
        _ => values.into_iter().next().and_then(|v| coerce(v, kind)),
    }
}

/// Binds `req` against the parameters of `descriptor`.
pub async fn bind(
    descriptor: &ApiDescriptor,
    req: Request<Body>,
    lang: Lang,
) -> Result<(RequestContext, BoundFields), BindError> {
    let (mut parts, body) = req.into_parts();
    let ctx = RequestContext::from_parts(&parts, lang);
    let params = &descriptor.params;
    let mut bound = BoundFields::for_type(descriptor.request);

    bind_path(&mut parts, params, &mut bound).await?;
    bind_headers(&parts, params, &mut bound);
    bind_query(&parts, params, &mut bound);

    let has_body_params = params.iter().any(|p| p.location == Location::Body);
    if descriptor.route.method.reads_body() && has_body_params {
        let essence = content_type_essence(&parts);
        match essence.as_str() {
            "application/json" => bind_json(body, params, &mut bound).await?,
            "application/x-www-form-urlencoded" => bind_urlencoded(body, params, &mut bound).await?,
            "multipart/form-data" => {
                let req = Request::from_parts(parts, body);
                bind_multipart(req, params, &mut bound).await?
            }
            _ => {}
        }
    }

    Ok((ctx, bound))
}

fn content_type_essence(parts: &Parts) -> String {
    parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .unwrap_or_default()
}

fn located(params: &[ParamInfo], location: Location) -> impl Iterator<Item = &ParamInfo> {
    params.iter().filter(move |p| p.location == location)
}

async fn bind_path(
    parts: &mut Parts,
    params: &[ParamInfo],
    bound: &mut BoundFields,
) -> Result<(), BindError> {
    if located(params, Location::Path).next().is_none() {
        return Ok(());
    }
    let Path(values) = Path::<HashMap<String, String>>::from_request_parts(parts, &())
        .await
        .map_err(|e| BindError::Path(e.body_text()))?;
    for param in located(params, Location::Path) {
        if let Some(value) = values.get(&param.name).and_then(|raw| coerce(raw, param.kind)) {
            bound.set(param.field_index, Slot::Text(value));
        }
    }
    Ok(())
}

fn bind_headers(parts: &Parts, params: &[ParamInfo], bound: &mut BoundFields) {
    for param in located(params, Location::Header) {
        let values = parts
            .headers
            .get_all(param.name.as_str())
            .iter()
            .filter_map(|v| v.to_str().ok());
        if let Some(value) = coerce_all(values, param.kind) {
            bound.set(param.field_index, Slot::Text(value));
        }
    }
}

fn bind_query(parts: &Parts, params: &[ParamInfo], bound: &mut BoundFields) {
    let Some(query) = parts.uri.query() else {
        return;
    };
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).unwrap_or_default();
    bind_pairs(&pairs, located(params, Location::Query), |p| &p.name, bound);
}

fn bind_pairs<'p>(
    pairs: &[(String, String)],
    params: impl Iterator<Item = &'p ParamInfo>,
    key: impl Fn(&ParamInfo) -> &String,
    bound: &mut BoundFields,
) {
    for param in params {
        let name = key(param);
        let values = pairs
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str());
        if let Some(value) = coerce_all(values, param.kind) {
            bound.set(param.field_index, Slot::Text(value));
        }
    }
}

async fn read_body(body: Body) -> Result<Bytes, BindError> {
    to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| BindError::Read(e.to_string()))
}

async fn bind_json(
    body: Body,
    params: &[ParamInfo],
    bound: &mut BoundFields,
) -> Result<(), BindError> {
    let bytes = read_body(body).await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(BindError::EmptyBody);
    }
    let mut object = match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(object)) => object,
        Ok(_) => return Err(BindError::Json("expected a JSON object".into())),
        Err(e) => return Err(BindError::Json(e.to_string())),
    };
    for param in located(params, Location::Body) {
        if param.kind == FieldKind::File {
            continue;
        }
        if let Some(value) = take_key(&mut object, &param.name) {
            bound.set(param.field_index, Slot::Json(value));
        }
    }
    Ok(())
}

/// Exact key first, then a case-insensitive match.
fn take_key(object: &mut Map<String, Value>, name: &str) -> Option<Value> {
    if let Some(value) = object.remove(name) {
        return Some(value);
    }
    let key = object.keys().find(|k| k.eq_ignore_ascii_case(name))?.clone();
    object.remove(&key)
}

async fn bind_urlencoded(
    body: Body,
    params: &[ParamInfo],
    bound: &mut BoundFields,
) -> Result<(), BindError> {
    let bytes = read_body(body).await?;
    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_bytes(&bytes).map_err(|e| BindError::Form(e.to_string()))?;
    bind_pairs(&pairs, located(params, Location::Body), |p| &p.form_name, bound);
    Ok(())
}

async fn bind_multipart(
    req: Request<Body>,
    params: &[ParamInfo],
    bound: &mut BoundFields,
) -> Result<(), BindError> {
    let mut multipart = Multipart::from_request(req, &())
        .await
        .map_err(|e| BindError::Form(e.body_text()))?;

    let mut texts: Vec<(String, String)> = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| BindError::Form(e.body_text()))?
    {
        let Some(name) = field.name().map(String::from) else {
            continue;
        };
        let file_name = field.file_name().map(String::from);
        let content_type = field.content_type().map(String::from);

        if file_name.is_some() {
            let target = located(params, Location::Body)
                .find(|p| p.kind == FieldKind::File && p.form_name == name);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| BindError::Form(e.body_text()))?;
            if let Some(param) = target {
                bound.set(
                    param.field_index,
                    Slot::File(UploadFile {
                        field_name: name,
                        file_name,
                        content_type,
                        bytes,
                    }),
                );
            }
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| BindError::Form(e.body_text()))?;
            texts.push((name, text));
        }
    }

    let text_params = located(params, Location::Body).filter(|p| p.kind != FieldKind::File);
    bind_pairs(&texts, text_params, |p| &p.form_name, bound);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coercion_skips_unparsable() {
        assert_eq!(coerce("42", FieldKind::Int), Some(json!(42)));
        assert_eq!(coerce("-1", FieldKind::Uint), None);
        assert_eq!(coerce("1.5", FieldKind::Float), Some(json!(1.5)));
        assert_eq!(coerce("T", FieldKind::Bool), Some(json!(true)));
        assert_eq!(coerce("yes", FieldKind::Bool), None);
        assert_eq!(coerce("", FieldKind::String), None);
    }

    #[test]
    fn array_fields_collect_repeats() {
        let kind = FieldKind::Array(&FieldKind::Int);
        assert_eq!(coerce_all(["1", "x", "3"], kind), Some(json!([1, 3])));
        assert_eq!(coerce_all(["a", "b"], FieldKind::String), Some(json!("a")));
    }

    #[test]
    fn take_is_lenient_for_text_and_strict_for_json() {
        let mut fields = BoundFields::with_len(3);
        fields.set(0, Slot::Text(json!("abc")));
        fields.set(1, Slot::Json(json!("abc")));
        fields.set(2, Slot::Json(Value::Null));
        assert_eq!(fields.take::<i32>(0).unwrap(), 0);
        assert!(fields.take::<i32>(1).is_err());
        assert_eq!(fields.take::<String>(2).unwrap(), "");
        assert_eq!(fields.take::<Option<u8>>(0).unwrap(), None);
    }

    #[test]
    fn take_file_only_yields_files() {
        let mut fields = BoundFields::with_len(2);
        fields.set(0, Slot::Text(json!("a.txt")));
        fields.set(
            1,
            Slot::File(UploadFile {
                field_name: "avatar".into(),
                file_name: Some("a.png".into()),
                content_type: None,
                bytes: Bytes::from_static(b"png"),
            }),
        );
        assert!(fields.take_file(0).is_none());
        assert_eq!(fields.take_file(1).map(|f| f.len()), Some(3));
        assert!(fields.take_file(1).is_none());
    }

    #[test]
    fn json_keys_match_case_insensitively() {
        let mut object = json!({"Name": "bob"}).as_object().cloned().unwrap();
        assert_eq!(take_key(&mut object, "name"), Some(json!("bob")));
        assert!(object.is_empty());
    }
}
