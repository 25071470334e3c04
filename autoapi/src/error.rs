use thiserror::Error;

/// Startup errors: declaration problems found while registering endpoints and
/// failures while producing the OpenAPI document.
#[derive(Error, Debug)]
pub enum Error {
    /// The request type has no `#[api(...)]` marker. Callers skip it.
    #[error("{type_name} carries no #[api] marker")]
    MissingMarker { type_name: String },
    #[error("invalid #[api] marker on {type_name}: {reason}")]
    InvalidMarker { type_name: String, reason: String },
    #[error("path parameters of {type_name} do not match `{path}`: {reason}")]
    PathParamMismatch {
        type_name: String,
        path: String,
        reason: String,
    },
    #[error("duplicate route {method} {path} (registered by {first}, again by {second})")]
    DuplicateRoute {
        method: String,
        path: String,
        first: String,
        second: String,
    },
    #[error("schema name `{name}` is used by both {first} and {second}")]
    SchemaNameCollision {
        name: String,
        first: String,
        second: String,
    },
    #[error("Config Error: {0}")]
    Config(#[from] toml::de::Error),
    #[error("SerdeJson Error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
