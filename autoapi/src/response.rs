//! The `{code, message, data}` response envelope.

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::bind::BindError;
use crate::i18n::{translator, Lang};
use crate::validate::FieldErrors;

/// Business result codes carried in the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    Success = 1000,
    Created = 1001,
    Accepted = 1002,
    ValidationError = 4000,
    JsonError = 4001,
    EmptyBodyError = 4002,
    Unauthorized = 4003,
    Forbidden = 4004,
    NotFound = 4005,
    ServerError = 5000,
    DbError = 5001,
    CacheError = 5002,
}

impl Code {
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn http_status(self) -> StatusCode {
        match self {
            Code::Success => StatusCode::OK,
            Code::Created => StatusCode::CREATED,
            Code::Accepted => StatusCode::ACCEPTED,
            Code::ValidationError | Code::JsonError | Code::EmptyBodyError => {
                StatusCode::BAD_REQUEST
            }
            Code::Unauthorized => StatusCode::UNAUTHORIZED,
            Code::Forbidden => StatusCode::FORBIDDEN,
            Code::NotFound => StatusCode::NOT_FOUND,
            Code::ServerError | Code::DbError | Code::CacheError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn message(self, lang: Lang) -> &'static str {
        let (en, zh) = match self {
            Code::Success => ("success", "操作成功"),
            Code::Created => ("created", "创建成功"),
            Code::Accepted => ("accepted", "请求已接受"),
            Code::ValidationError => ("Validation failed", "参数验证失败"),
            Code::JsonError => ("JSON Format Error", "JSON 格式错误"),
            Code::EmptyBodyError => ("Empty request body", "请求体为空"),
            Code::Unauthorized => ("Unauthorized", "未授权"),
            Code::Forbidden => ("Forbidden", "禁止访问"),
            Code::NotFound => ("Resource not found", "资源不存在"),
            Code::ServerError => ("Internal server error", "服务器内部错误"),
            Code::DbError => ("Database error", "数据库错误"),
            Code::CacheError => ("Cache error", "缓存错误"),
        };
        match lang {
            Lang::En => en,
            Lang::Zh => zh,
        }
    }
}

impl Serialize for Code {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.as_u32())
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: Code,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, lang: Lang) -> Self {
        Self {
            code: Code::Success,
            message: Code::Success.message(lang).to_string(),
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.code.http_status(), Json(self)).into_response()
    }
}

/// An error on its way to the client.
///
/// Any `std::error::Error` converts into a `5000` server error, so business
/// methods can use `?` freely. `ApiError` deliberately does not implement
/// `std::error::Error` itself, which keeps that blanket conversion coherent.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    code: Code,
    message: String,
    data: Value,
}

impl ApiError {
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: Value::Null,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(Code::ServerError, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Code::NotFound, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(Code::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(Code::Forbidden, message)
    }

    pub fn validation(errors: FieldErrors, lang: Lang) -> Self {
        let data = serde_json::to_value(errors).unwrap_or(Value::Null);
        Self::new(Code::ValidationError, Code::ValidationError.message(lang)).with_data(data)
    }

    pub fn from_bind(err: &BindError, lang: Lang) -> Self {
        let t = translator();
        let (code, detail) = match err {
            BindError::EmptyBody => (Code::EmptyBodyError, t.translate(lang, "empty_body", "", "")),
            BindError::Json(_) => (Code::JsonError, t.translate(lang, "json_syntax", "", "")),
            BindError::JsonType { field, expected } => {
                let expected = t.translate(lang, &format!("type-{expected}"), "", "");
                (Code::JsonError, t.translate(lang, "json_type", field, &expected))
            }
            BindError::Form(detail) | BindError::Path(detail) | BindError::Read(detail) => {
                (Code::ValidationError, detail.clone())
            }
        };
        Self::new(code, format!("{}: {}", code.message(lang), detail))
    }

    pub fn code(&self) -> Code {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn data(&self) -> &Value {
        &self.data
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_u32(), self.message)
    }
}

impl<E> From<E> for ApiError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        Self::server(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        ApiResponse {
            code: self.code,
            message: self.message,
            data: self.data,
        }
        .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::json;

    #[derive(Debug, thiserror::Error)]
    #[error("user store offline")]
    struct StoreDown;

    #[test]
    fn statuses_follow_code_family() {
        assert_eq!(Code::ValidationError.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(Code::NotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(Code::DbError.http_status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn std_errors_become_server_errors() {
        let err: ApiError = StoreDown.into();
        assert_eq!(err.code(), Code::ServerError);
        assert_eq!(err.message(), "user store offline");
    }

    #[test]
    fn json_type_errors_are_localized() {
        let err = BindError::JsonType {
            field: "age",
            expected: "integer",
        };
        let en = ApiError::from_bind(&err, Lang::En);
        assert_eq!(en.code(), Code::JsonError);
        assert_eq!(
            en.message(),
            "JSON Format Error: field 'age' has an incorrect type, expected integer"
        );
        let zh = ApiError::from_bind(&err, Lang::Zh);
        assert_eq!(zh.message(), "JSON 格式错误: 字段'age'类型错误，应为整数");
    }

    #[tokio::test]
    async fn envelope_shape() {
        let resp = ApiResponse::success(json!({"id": 1}), Lang::En).into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({"code": 1000, "message": "success", "data": {"id": 1}}));
    }
}
