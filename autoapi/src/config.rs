//! TOML configuration for the document generator and the registrar.
//!
//! ```toml
//! path_prefix = "/api/v1"
//! default_language = "zh"
//!
//! [swagger]
//! json_path = "docs/swagger.json"
//!
//! [swagger.info]
//! title = "User Service"
//! version = "1.0.0"
//!
//! [swagger.security_definitions.bearer]
//! type = "http"
//! scheme = "bearer"
//! bearer_format = "JWT"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::i18n::Lang;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub path_prefix: String,
    pub default_language: Lang,
    pub swagger: SwaggerConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            path_prefix: String::new(),
            default_language: Lang::Zh,
            swagger: SwaggerConfig::default(),
        }
    }
}

impl ServiceConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwaggerConfig {
    pub enabled: bool,
    /// Where the generated document is written.
    pub json_path: PathBuf,
    /// Mount point of the Swagger UI, used by the host service.
    pub ui_path: String,
    pub info: InfoConfig,
    pub servers: Vec<ServerConfig>,
    pub security_definitions: BTreeMap<String, SecurityDefinition>,
    /// Scheme names required by every operation.
    pub security: Vec<String>,
}

impl Default for SwaggerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            json_path: PathBuf::from("./docs/swagger.json"),
            ui_path: "/swagger-ui".to_string(),
            info: InfoConfig::default(),
            servers: Vec::new(),
            security_definitions: BTreeMap::new(),
            security: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfoConfig {
    pub title: String,
    pub description: String,
    pub version: String,
    pub terms_of_service: Option<String>,
    pub contact: Option<ContactConfig>,
    pub license: Option<LicenseConfig>,
}

impl Default for InfoConfig {
    fn default() -> Self {
        Self {
            title: "API Documentation".to_string(),
            description: String::new(),
            version: "1.0.0".to_string(),
            terms_of_service: None,
            contact: None,
            license: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactConfig {
    pub name: Option<String>,
    pub email: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseConfig {
    pub name: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub url: String,
    pub description: Option<String>,
}

/// A security scheme. `type` is `apiKey` (with `name` and `in`) or `http`
/// (with `scheme` and an optional `bearer_format`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityDefinition {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: Option<String>,
    #[serde(rename = "in")]
    pub location: Option<String>,
    pub scheme: Option<String>,
    pub bearer_format: Option<String>,
    pub description: Option<String>,
}
