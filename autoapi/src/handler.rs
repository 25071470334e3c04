use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{request::Parts, Extensions, HeaderMap, Method, Request, Uri};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::bind::{self, BoundFields};
use crate::i18n::Lang;
use crate::meta::{ApiRequest, ApiSchema, TypeMeta};
use crate::param::ParamInfo;
use crate::response::{ApiError, ApiResponse};
use crate::route::RouteInfo;
use crate::validate;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a business method sees of the HTTP request besides its bound
/// request value.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    /// Extensions inserted by outer middleware, e.g. an authenticated user.
    pub extensions: Extensions,
    pub lang: Lang,
}

impl RequestContext {
    pub fn from_parts(parts: &Parts, lang: Lang) -> Self {
        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            headers: parts.headers.clone(),
            extensions: parts.extensions.clone(),
            lang,
        }
    }
}

/// A type whose methods are exposed as API endpoints.
///
/// Implemented by `#[api_controller]` on an inherent `impl` block.
pub trait Controller: Send + Sync + Sized + 'static {
    fn endpoints() -> Vec<Endpoint<Self>>;
}

type Invoke<C> =
    Arc<dyn Fn(Arc<C>, RequestContext, BoundFields) -> BoxFuture<'static, Result<Value, ApiError>> + Send + Sync>;

/// A type-erased method bound to its controller instance.
pub type BoundMethod =
    Arc<dyn Fn(RequestContext, BoundFields) -> BoxFuture<'static, Result<Value, ApiError>> + Send + Sync>;

/// One business method of a controller `C`.
pub struct Endpoint<C> {
    pub operation: &'static str,
    pub request: fn() -> &'static TypeMeta,
    pub response: fn() -> &'static TypeMeta,
    invoke: Invoke<C>,
}

impl<C: Send + Sync + 'static> Endpoint<C> {
    pub fn new<Req, Res, F, Fut>(operation: &'static str, method: F) -> Self
    where
        Req: ApiRequest,
        Res: ApiSchema + Serialize + 'static,
        F: Fn(Arc<C>, RequestContext, Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, ApiError>> + Send + 'static,
    {
        let invoke: Invoke<C> = Arc::new(
            move |this: Arc<C>,
                  ctx: RequestContext,
                  mut fields: BoundFields|
                  -> BoxFuture<'static, Result<Value, ApiError>> {
                let req = match Req::from_bound(&mut fields) {
                    Ok(req) => req,
                    Err(e) => {
                        let err = ApiError::from_bind(&e, ctx.lang);
                        return Box::pin(async move { Err(err) });
                    }
                };
                let fut = method(this, ctx, req);
                Box::pin(async move {
                    let res = fut.await?;
                    Ok(serde_json::to_value(res)?)
                })
            },
        );
        Self {
            operation,
            request: Req::type_meta,
            response: Res::type_meta,
            invoke,
        }
    }

    pub(crate) fn bind_to(&self, controller: Arc<C>) -> BoundMethod {
        let invoke = self.invoke.clone();
        Arc::new(move |ctx: RequestContext, fields: BoundFields| {
            invoke(controller.clone(), ctx, fields)
        })
    }
}

impl<C> std::fmt::Debug for Endpoint<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("operation", &self.operation)
            .field("request", &(self.request)().type_name)
            .finish()
    }
}

/// Everything the router and the document generator know about one route.
/// Built once at registration and never mutated.
pub struct ApiDescriptor {
    pub operation: &'static str,
    pub route: RouteInfo,
    /// The routed path, prefix included, in `{name}` syntax.
    pub path: String,
    pub params: Vec<ParamInfo>,
    pub request: &'static TypeMeta,
    pub response: &'static TypeMeta,
    pub(crate) method: BoundMethod,
}

impl std::fmt::Debug for ApiDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiDescriptor")
            .field("operation", &self.operation)
            .field("method", &self.route.method)
            .field("path", &self.path)
            .field("request", &self.request.type_name)
            .field("response", &self.response.type_name)
            .finish()
    }
}

impl ApiDescriptor {
    pub fn operation_id(&self) -> &str {
        self.route.operation_id.as_deref().unwrap_or(self.operation)
    }

    /// Runs one request through bind, validate and the business method,
    /// always answering with the response envelope.
    pub async fn dispatch(&self, req: Request<Body>, default_lang: Lang) -> Response {
        let lang = Lang::from_headers(req.headers(), default_lang);
        let (ctx, fields) = match bind::bind(self, req, lang).await {
            Ok(bound) => bound,
            Err(e) => {
                debug!(operation = self.operation, error = %e, "request binding failed");
                return ApiError::from_bind(&e, lang).into_response();
            }
        };
        if let Err(errors) = validate::validate(&self.params, &fields, lang) {
            debug!(operation = self.operation, fields = errors.len(), "request validation failed");
            return ApiError::validation(errors, lang).into_response();
        }
        match (self.method)(ctx, fields).await {
            Ok(data) => ApiResponse::success(data, lang).into_response(),
            Err(e) => {
                if e.code().http_status().is_server_error() {
                    warn!(operation = self.operation, error = %e, "business method failed");
                }
                e.into_response()
            }
        }
    }
}
