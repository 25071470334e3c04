//! Message catalogue for validation and binding errors.

use std::collections::HashMap;

use axum::http::{header::ACCEPT_LANGUAGE, HeaderMap};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    En,
    #[default]
    Zh,
}

impl Lang {
    /// `Accept-Language` values starting with `en` select English; anything
    /// else, including a missing header, selects `fallback`.
    pub fn from_accept_language(value: Option<&str>, fallback: Lang) -> Lang {
        match value {
            Some(v) if v.trim_start().to_ascii_lowercase().starts_with("en") => Lang::En,
            _ => fallback,
        }
    }

    pub fn from_headers(headers: &HeaderMap, fallback: Lang) -> Lang {
        let value = headers.get(ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok());
        Self::from_accept_language(value, fallback)
    }

    pub fn code(&self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Zh => "zh",
        }
    }
}

pub struct Translator {
    messages: HashMap<(Lang, &'static str), &'static str>,
}

static TRANSLATOR: Lazy<Translator> = Lazy::new(Translator::builtin);

pub fn translator() -> &'static Translator {
    &TRANSLATOR
}

impl Translator {
    /// Renders `key`, substituting `{0}` with the field and `{1}` with the
    /// rule parameter. Unknown keys fall back to a generic message.
    pub fn translate(&self, lang: Lang, key: &str, field: &str, param: &str) -> String {
        let template = self
            .messages
            .get(&(lang, key))
            .copied()
            .unwrap_or(match lang {
                Lang::En => "{0} is invalid",
                Lang::Zh => "{0}格式不正确",
            });
        template.replace("{0}", field).replace("{1}", param)
    }

    fn builtin() -> Self {
        let mut messages = HashMap::new();
        for (key, en, zh) in CATALOGUE {
            messages.insert((Lang::En, *key), *en);
            messages.insert((Lang::Zh, *key), *zh);
        }
        Self { messages }
    }
}

const CATALOGUE: &[(&str, &str, &str)] = &[
    ("required", "{0} is a required field", "{0}为必填字段"),
    ("email", "{0} must be a valid email address", "{0}必须是一个有效的邮箱"),
    ("url", "{0} must be a valid URL", "{0}必须是一个有效的URL"),
    ("alpha", "{0} can only contain alphabetic characters", "{0}只能包含字母"),
    ("alphanum", "{0} can only contain alphanumeric characters", "{0}只能包含字母和数字"),
    ("numeric", "{0} must be a valid numeric value", "{0}必须是一个有效的数值"),
    ("mobile_cn", "{0} must be a valid Chinese mainland mobile number", "{0}必须是有效的中国大陆手机号"),
    ("oneof", "{0} must be one of [{1}]", "{0}必须是[{1}]中的一个"),
    ("eq", "{0} is not equal to {1}", "{0}不等于{1}"),
    ("ne", "{0} should not be equal to {1}", "{0}不能等于{1}"),
    ("len-string", "{0} must be {1} characters in length", "{0}长度必须是{1}个字符"),
    ("len-number", "{0} must be equal to {1}", "{0}必须等于{1}"),
    ("len-items", "{0} must contain {1} items", "{0}必须包含{1}项"),
    ("min-string", "{0} must be at least {1} characters in length", "{0}长度必须至少为{1}个字符"),
    ("min-number", "{0} must be {1} or greater", "{0}最小只能为{1}"),
    ("min-items", "{0} must contain at least {1} items", "{0}必须至少包含{1}项"),
    ("max-string", "{0} must be a maximum of {1} characters in length", "{0}长度不能超过{1}个字符"),
    ("max-number", "{0} must be {1} or less", "{0}必须小于或等于{1}"),
    ("max-items", "{0} must contain at maximum {1} items", "{0}最多只能包含{1}项"),
    ("lt-string", "{0} must be less than {1} characters in length", "{0}长度必须小于{1}个字符"),
    ("lt-number", "{0} must be less than {1}", "{0}必须小于{1}"),
    ("lt-items", "{0} must contain less than {1} items", "{0}必须包含少于{1}项"),
    ("lte-string", "{0} must be at maximum {1} characters in length", "{0}长度不能超过{1}个字符"),
    ("lte-number", "{0} must be {1} or less", "{0}必须小于或等于{1}"),
    ("lte-items", "{0} must contain at maximum {1} items", "{0}最多只能包含{1}项"),
    ("gt-string", "{0} must be greater than {1} characters in length", "{0}长度必须大于{1}个字符"),
    ("gt-number", "{0} must be greater than {1}", "{0}必须大于{1}"),
    ("gt-items", "{0} must contain more than {1} items", "{0}必须大于{1}项"),
    ("gte-string", "{0} must be at least {1} characters in length", "{0}长度必须至少为{1}个字符"),
    ("gte-number", "{0} must be {1} or greater", "{0}必须大于或等于{1}"),
    ("gte-items", "{0} must contain at least {1} items", "{0}必须至少包含{1}项"),
    // binding errors
    ("json_syntax", "JSON syntax error, please check brackets, quotes and commas", "JSON语法错误，请检查括号、引号、逗号等格式"),
    ("json_type", "field '{0}' has an incorrect type, expected {1}", "字段'{0}'类型错误，应为{1}"),
    ("empty_body", "request body is empty", "请求体为空"),
    ("type-string", "string", "字符串"),
    ("type-integer", "integer", "整数"),
    ("type-number", "number", "浮点数"),
    ("type-boolean", "boolean", "布尔值"),
    ("type-array", "array", "数组"),
    ("type-object", "object", "对象"),
];
