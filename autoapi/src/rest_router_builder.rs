use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::Request;
use axum::routing::on;
use axum::Router;
use tracing::{debug, info};

use crate::bind::MAX_BODY_BYTES;
use crate::error::{Error, Result};
use crate::handler::{ApiDescriptor, Controller};
use crate::i18n::Lang;
use crate::param::{self, Location, ParamInfo};
use crate::route::{self, HttpVerb, RouteInfo};
use crate::tag::{self, PathSyntax};

/// Collects controller endpoints into an axum [`Router`] plus the immutable
/// descriptors used for documentation.
#[derive(Default)]
pub struct RestRouterBuilder {
    prefix: String,
    default_lang: Lang,
    router: Router,
    descriptors: Vec<Arc<ApiDescriptor>>,
    seen: HashMap<(HttpVerb, String), &'static str>,
    shapes: HashMap<String, String>,
}

impl RestRouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix joined in front of every registered path, e.g. `/api/v1`.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Language used when a request carries no English `Accept-Language`.
    pub fn default_lang(mut self, lang: Lang) -> Self {
        self.default_lang = lang;
        self
    }

    /// Registers every endpoint of `controller`.
    ///
    /// Endpoints whose request type has no `#[api]` marker are skipped. A
    /// malformed marker, a path that disagrees with the path parameters or a
    /// duplicate method and path aborts registration.
    pub fn register<C: Controller>(mut self, controller: C) -> Result<Self> {
        let controller = Arc::new(controller);
        for endpoint in C::endpoints() {
            let request = (endpoint.request)();
            let route = match route::extract_route(request) {
                Ok(route) => route,
                Err(Error::MissingMarker { type_name }) => {
                    debug!(operation = endpoint.operation, %type_name, "skipping endpoint without #[api] marker");
                    continue;
                }
                Err(e) => return Err(e),
            };
            let params = param::extract_params(request);
            check_path_params(request.type_name, &route, &params)?;

            let path = tag::join_path(&self.prefix, &route.path);
            let shape = path_shape(&path);
            if let Some(existing) = self.shapes.get(&shape).filter(|p| **p != path) {
                return Err(Error::PathParamMismatch {
                    type_name: request.type_name.to_string(),
                    path: path.clone(),
                    reason: format!("conflicts with the placeholders of `{existing}`"),
                });
            }
            self.shapes.insert(shape.clone(), path.clone());
            let key = (route.method, shape);
            if let Some(first) = self.seen.get(&key) {
                return Err(Error::DuplicateRoute {
                    method: route.method.to_string(),
                    path,
                    first: first.to_string(),
                    second: endpoint.operation.to_string(),
                });
            }
            self.seen.insert(key, endpoint.operation);

            let descriptor = Arc::new(ApiDescriptor {
                operation: endpoint.operation,
                method: endpoint.bind_to(controller.clone()),
                path: path.clone(),
                params,
                request,
                response: (endpoint.response)(),
                route,
            });

            let default_lang = self.default_lang;
            let route_descriptor = descriptor.clone();
            let route_handler = move |req: Request<Body>| {
                let descriptor = route_descriptor.clone();
                async move { descriptor.dispatch(req, default_lang).await }
            };
            let axum_path = tag::to_router_path(&path, PathSyntax::Brace);
            // one limit for JSON, form and multipart bodies
            let method_router = on(descriptor.route.method.method_filter(), route_handler)
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));
            self.router = self.router.route(&axum_path, method_router);

            info!(
                method = %descriptor.route.method,
                path = %descriptor.path,
                operation = descriptor.operation,
                "registered API route"
            );
            self.descriptors.push(descriptor);
        }
        Ok(self)
    }

    pub fn descriptors(&self) -> &[Arc<ApiDescriptor>] {
        &self.descriptors
    }

    pub fn build(self) -> Router {
        self.router
    }

    pub fn into_parts(self) -> (Router, Vec<Arc<ApiDescriptor>>) {
        (self.router, self.descriptors)
    }
}

/// The path with every placeholder name erased, so `/u/{id}` and `/u/{uid}`
/// compare equal.
fn path_shape(path: &str) -> String {
    path.split('/')
        .map(|segment| if tag::placeholder(segment).is_some() { "{}" } else { segment })
        .collect::<Vec<_>>()
        .join("/")
}

/// Placeholders and path-located fields must match one to one.
fn check_path_params(type_name: &str, route: &RouteInfo, params: &[ParamInfo]) -> Result<()> {
    let mismatch = |reason: String| Error::PathParamMismatch {
        type_name: type_name.to_string(),
        path: route.path.clone(),
        reason,
    };
    let mut placeholders = BTreeSet::new();
    for name in tag::placeholders(&route.path) {
        if !placeholders.insert(name) {
            return Err(mismatch(format!("placeholder `{name}` appears twice")));
        }
    }
    let bound: BTreeSet<&str> = params
        .iter()
        .filter(|p| p.location == Location::Path)
        .map(|p| p.name.as_str())
        .collect();
    if let Some(name) = placeholders.difference(&bound).next() {
        return Err(mismatch(format!("no field is bound to `{{{name}}}`")));
    }
    if let Some(name) = bound.difference(&placeholders).next() {
        return Err(mismatch(format!("field bound to `{name}` has no placeholder")));
    }
    Ok(())
}
