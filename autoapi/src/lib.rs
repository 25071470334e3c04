//! # autoapi - declarative API metadata for axum services
//!
//! Request types describe their own route and parameters through attributes;
//! `autoapi` turns them into routes, request binding with validation, and an
//! OpenAPI document.
//!
//! ## Core pieces:
//!
//! - **`#[derive(ApiRequest)]`**: the `#[api(method = "post", path = "/user/{id}")]`
//!   container attribute marks a request type; `#[param(...)]` field attributes
//!   declare where each field is bound from and how it is validated.
//!
//! - **`#[api_controller]`**: placed on an `impl` block, it exposes every
//!   `pub async fn name(&self, ctx: RequestContext, req: Req) -> Result<Res, E>`
//!   as an endpoint. Methods of any other shape are left alone.
//!
//! - **`RestRouterBuilder`**: registers controllers into an axum `Router`.
//!
//! - **`DocGenerator`**: builds and saves the OpenAPI document of the
//!   registered routes.

extern crate self as autoapi;

pub mod bind;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod handler;
pub mod i18n;
pub mod meta;
pub mod openapi_utils;
pub mod param;
pub mod response;
pub mod rest_router_builder;
pub mod route;
pub mod tag;
pub mod validate;

pub use bind::{BindError, BoundFields, UploadFile};
pub use config::{ServiceConfig, SwaggerConfig};
pub use error::{Error, Result};
pub use handler::{ApiDescriptor, Controller, Endpoint, RequestContext};
pub use i18n::Lang;
pub use meta::{ApiRequest, ApiSchema, FieldKind, FieldMeta, TagSet, TypeMeta};
pub use openapi_utils::DocGenerator;
pub use response::{ApiError, ApiResponse, Code};
pub use rest_router_builder::RestRouterBuilder;

#[cfg(feature = "macros")]
pub use autoapi_macros::{api_controller, ApiRequest, ApiSchema};
