use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};
use utoipa::openapi::content::ContentBuilder;
use utoipa::openapi::extensions::ExtensionsBuilder;
use utoipa::openapi::info::{ContactBuilder, Info, InfoBuilder, LicenseBuilder};
use utoipa::openapi::path::{Operation, OperationBuilder, ParameterBuilder, ParameterIn};
use utoipa::openapi::request_body::RequestBodyBuilder;
use utoipa::openapi::response::{Response, ResponseBuilder, ResponsesBuilder};
use utoipa::openapi::schema::{ArrayBuilder, KnownFormat, ObjectBuilder, Ref, SchemaFormat, Type};
use utoipa::openapi::security::{
    ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityRequirement, SecurityScheme,
};
use utoipa::openapi::server::ServerBuilder;
use utoipa::openapi::{
    self, ComponentsBuilder, Deprecated, OpenApi, RefOr, Required, Schema,
};

use crate::config::{SecurityDefinition, SwaggerConfig};
use crate::error::{Error, Result};
use crate::handler::ApiDescriptor;
use crate::meta::{FieldKind, TypeMeta};
use crate::param::{self, Location, ParamInfo};
use crate::route::HttpVerb;

/// Builds the OpenAPI document of all registered routes.
#[derive(Debug, Clone, Default)]
pub struct DocGenerator {
    config: SwaggerConfig,
}

impl DocGenerator {
    pub fn new(config: SwaggerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SwaggerConfig {
        &self.config
    }

    pub fn generate(&self, descriptors: &[Arc<ApiDescriptor>]) -> Result<OpenApi> {
        let servers = self.config.servers.iter().map(|s| {
            ServerBuilder::new()
                .url(&s.url)
                .description(s.description.clone())
                .build()
        });
        let mut openapi = openapi::OpenApiBuilder::new()
            .info(self.info())
            .paths(openapi::Paths::new())
            .servers((!self.config.servers.is_empty()).then(|| servers.collect::<Vec<_>>()))
            .build();

        let mut schemas = SchemaRegistry::default();
        for descriptor in descriptors {
            let operation = operation(descriptor, &mut schemas)?;
            let path_item = openapi.paths.paths.entry(descriptor.path.clone()).or_default();
            match descriptor.route.method {
                HttpVerb::Get => path_item.get = Some(operation),
                HttpVerb::Post => path_item.post = Some(operation),
                HttpVerb::Put => path_item.put = Some(operation),
                HttpVerb::Delete => path_item.delete = Some(operation),
            }
        }

        let mut components = ComponentsBuilder::new().schemas_from_iter(schemas.schemas);
        for (name, definition) in &self.config.security_definitions {
            match security_scheme(definition) {
                Some(scheme) => components = components.security_scheme(name, scheme),
                None => warn!(scheme = %name, kind = %definition.kind, "unsupported security definition"),
            }
        }
        openapi.components = Some(components.build());

        if !self.config.security.is_empty() {
            openapi.security = Some(
                self.config
                    .security
                    .iter()
                    .map(|name| SecurityRequirement::new(name, Vec::<String>::new()))
                    .collect(),
            );
        }
        Ok(openapi)
    }

    /// 写入 `json_path`，必要时创建父目录
    pub fn save(&self, openapi: &OpenApi) -> Result<PathBuf> {
        let path = self.config.json_path.clone();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, openapi.to_pretty_json()?)?;
        info!(path = %path.display(), "OpenAPI document written");
        Ok(path)
    }

    fn info(&self) -> Info {
        let info = &self.config.info;
        InfoBuilder::new()
            .title(&info.title)
            .version(&info.version)
            .description((!info.description.is_empty()).then(|| info.description.clone()))
            .terms_of_service(info.terms_of_service.clone())
            .contact(info.contact.as_ref().map(|c| {
                ContactBuilder::new()
                    .name(c.name.clone())
                    .email(c.email.clone())
                    .url(c.url.clone())
                    .build()
            }))
            .license(info.license.as_ref().map(|l| {
                LicenseBuilder::new()
                    .name(&l.name)
                    .url(l.url.clone())
                    .build()
            }))
            .build()
    }
}

/// Component schemas keyed by short type name.
#[derive(Default)]
struct SchemaRegistry {
    schemas: BTreeMap<String, RefOr<Schema>>,
    owners: HashMap<String, String>,
}

impl SchemaRegistry {
    /// Registers the schema of `meta` once and returns a reference to it.
    fn reference(&mut self, meta: &TypeMeta, fields: &[ParamInfo]) -> Result<RefOr<Schema>> {
        let name = meta.type_name.to_string();
        let owner = meta.qualified_name();
        match self.owners.get(&name) {
            Some(existing) if *existing != owner => {
                return Err(Error::SchemaNameCollision {
                    name,
                    first: existing.clone(),
                    second: owner,
                })
            }
            Some(_) => {}
            None => {
                self.owners.insert(name.clone(), owner);
                self.schemas.insert(name.clone(), object_schema(fields));
            }
        }
        Ok(RefOr::Ref(Ref::from_schema_name(name)))
    }
}

fn operation(descriptor: &ApiDescriptor, schemas: &mut SchemaRegistry) -> Result<Operation> {
    let route = &descriptor.route;
    let mut builder = OperationBuilder::new()
        .operation_id(Some(descriptor.operation_id()))
        .summary((!route.summary.is_empty()).then(|| route.summary.clone()))
        .description((!route.description.is_empty()).then(|| route.description.clone()))
        .tags((!route.tags.is_empty()).then(|| route.tags.clone()))
        .deprecated(route.deprecated.then_some(Deprecated::True));

    for param in &descriptor.params {
        let parameter_in = match param.location {
            Location::Path => ParameterIn::Path,
            Location::Query => ParameterIn::Query,
            Location::Header => ParameterIn::Header,
            Location::Body => continue,
        };
        builder = builder.parameter(
            ParameterBuilder::new()
                .name(&param.name)
                .parameter_in(parameter_in)
                .required(required(param.required))
                .description(Some(&param.description))
                .schema(Some(property_schema(param)))
                .build(),
        );
    }

    // 元数据中声明的 header 只补充尚未由字段声明的部分
    for header in &route.headers {
        let declared = descriptor
            .params
            .iter()
            .any(|p| p.location == Location::Header && p.name.eq_ignore_ascii_case(header));
        if declared {
            continue;
        }
        builder = builder.parameter(
            ParameterBuilder::new()
                .name(header)
                .parameter_in(ParameterIn::Header)
                .required(Required::False)
                .schema(Some(typed(Type::String)))
                .build(),
        );
    }

    let body_params: Vec<ParamInfo> = descriptor
        .params
        .iter()
        .filter(|p| p.location == Location::Body)
        .cloned()
        .collect();
    if !body_params.is_empty() {
        let body_ref = schemas.reference(descriptor.request, &body_params)?;
        let mut request_body = RequestBodyBuilder::new()
            .description(Some("request parameters"))
            .required(Some(required(body_params.iter().any(|p| p.required))));
        for content_type in &route.consumes {
            request_body = request_body.content(
                content_type,
                ContentBuilder::new().schema(Some(body_ref.clone())).build(),
            );
        }
        builder = builder.request_body(Some(request_body.build()));
    }

    let response_fields = param::extract_params(descriptor.response);
    let response_ref = schemas.reference(descriptor.response, &response_fields)?;
    let mut ok = ResponseBuilder::new().description("success");
    for content_type in &route.produces {
        ok = ok.content(
            content_type,
            ContentBuilder::new()
                .schema(Some(envelope(1000, response_ref.clone())))
                .build(),
        );
    }
    let responses = ResponsesBuilder::new()
        .response("200", ok.build())
        .response(
            "400",
            error_response("bad request", 4000, "field errors keyed by field name"),
        )
        .response(
            "500",
            error_response("internal server error", 5000, "error detail"),
        )
        .build();
    builder = builder.responses(responses);

    for scheme in &route.security {
        builder = builder.security(SecurityRequirement::new(scheme, Vec::<String>::new()));
    }
    if let Some(version) = &route.version {
        builder = builder.extensions(Some(
            ExtensionsBuilder::new().add("x-version", version.clone()).build(),
        ));
    }
    Ok(builder.build())
}

fn required(flag: bool) -> Required {
    if flag {
        Required::True
    } else {
        Required::False
    }
}

fn object_schema(fields: &[ParamInfo]) -> RefOr<Schema> {
    let mut object = ObjectBuilder::new().schema_type(Type::Object);
    for field in fields {
        object = object.property(&field.name, property_schema(field));
        if field.required {
            object = object.required(&field.name);
        }
    }
    RefOr::T(Schema::Object(object.build()))
}

fn typed(ty: Type) -> RefOr<Schema> {
    RefOr::T(Schema::Object(ObjectBuilder::new().schema_type(ty).build()))
}

fn scalar_type(kind: FieldKind) -> Type {
    match kind {
        FieldKind::String | FieldKind::File => Type::String,
        FieldKind::Int | FieldKind::Uint => Type::Integer,
        FieldKind::Float => Type::Number,
        FieldKind::Bool => Type::Boolean,
        FieldKind::Array(_) => Type::Array,
        FieldKind::Object => Type::Object,
    }
}

fn property_schema(param: &ParamInfo) -> RefOr<Schema> {
    if let FieldKind::Array(inner) = param.kind {
        let array = ArrayBuilder::new()
            .items(typed(scalar_type(*inner)))
            .description(Some(&param.description))
            .min_items(param.min_length)
            .max_items(param.max_length)
            .build();
        return RefOr::T(Schema::Array(array));
    }

    let format = match (&param.format, param.kind) {
        (Some(format), _) => Some(SchemaFormat::Custom(format.clone())),
        (None, FieldKind::File) => Some(SchemaFormat::KnownFormat(KnownFormat::Binary)),
        (None, _) => None,
    };
    let enum_values = (!param.enum_values.is_empty()).then(|| param.enum_values.clone());
    let object = ObjectBuilder::new()
        .schema_type(scalar_type(param.kind))
        .description(Some(&param.description))
        .format(format)
        .examples(param.example.clone())
        .default(param.default.clone())
        .enum_values(enum_values)
        .min_length(param.min_length)
        .max_length(param.max_length)
        .minimum(param.minimum)
        .maximum(param.maximum)
        .pattern(param.pattern.clone())
        .build();
    RefOr::T(Schema::Object(object))
}

fn envelope(code: u32, data: RefOr<Schema>) -> RefOr<Schema> {
    let object = ObjectBuilder::new()
        .schema_type(Type::Object)
        .property(
            "code",
            RefOr::T(Schema::Object(
                ObjectBuilder::new()
                    .schema_type(Type::Integer)
                    .examples(Some(json!(code)))
                    .build(),
            )),
        )
        .property("message", typed(Type::String))
        .property("data", data)
        .required("code")
        .required("message")
        .build();
    RefOr::T(Schema::Object(object))
}

fn error_response(description: &str, code: u32, data: &str) -> Response {
    let data_schema = RefOr::T(Schema::Object(
        ObjectBuilder::new()
            .schema_type(Type::Object)
            .description(Some(data))
            .build(),
    ));
    ResponseBuilder::new()
        .description(description)
        .content(
            "application/json",
            ContentBuilder::new()
                .schema(Some(envelope(code, data_schema)))
                .build(),
        )
        .build()
}

fn security_scheme(definition: &SecurityDefinition) -> Option<SecurityScheme> {
    match definition.kind.to_ascii_lowercase().as_str() {
        "apikey" => {
            let name = definition.name.clone()?;
            let value = match &definition.description {
                Some(description) => ApiKeyValue::with_description(name, description.clone()),
                None => ApiKeyValue::new(name),
            };
            let key = match definition.location.as_deref().unwrap_or("header") {
                "query" => ApiKey::Query(value),
                "cookie" => ApiKey::Cookie(value),
                _ => ApiKey::Header(value),
            };
            Some(SecurityScheme::ApiKey(key))
        }
        "http" => {
            let scheme = match definition.scheme.as_deref().unwrap_or("bearer") {
                s if s.eq_ignore_ascii_case("basic") => HttpAuthScheme::Basic,
                _ => HttpAuthScheme::Bearer,
            };
            let mut http = HttpBuilder::new()
                .scheme(scheme)
                .description(definition.description.clone());
            if let Some(format) = &definition.bearer_format {
                http = http.bearer_format(format);
            }
            Some(SecurityScheme::Http(http.build()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;

    #[test]
    fn security_definitions_map_to_schemes() {
        let api_key = SecurityDefinition {
            kind: "apiKey".into(),
            name: Some("X-Token".into()),
            location: Some("header".into()),
            ..Default::default()
        };
        assert!(matches!(
            security_scheme(&api_key),
            Some(SecurityScheme::ApiKey(ApiKey::Header(_)))
        ));
        let bearer = SecurityDefinition {
            kind: "http".into(),
            scheme: Some("bearer".into()),
            bearer_format: Some("JWT".into()),
            ..Default::default()
        };
        assert!(matches!(security_scheme(&bearer), Some(SecurityScheme::Http(_))));
        let oauth = SecurityDefinition {
            kind: "oauth2".into(),
            ..Default::default()
        };
        assert!(security_scheme(&oauth).is_none());
    }

    #[test]
    fn empty_document_carries_config() {
        let mut config = SwaggerConfig::default();
        config.info.title = "Users".into();
        config.servers.push(ServerConfig {
            url: "http://localhost:8080".into(),
            description: None,
        });
        config.security = vec!["bearer".into()];
        let doc = DocGenerator::new(config).generate(&[]).unwrap();
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["info"]["title"], "Users");
        assert_eq!(value["servers"][0]["url"], "http://localhost:8080");
        assert!(value["security"][0].get("bearer").is_some());
    }
}
