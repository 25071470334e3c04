use std::sync::Arc;

use axum::Router;
use utoipa::openapi::OpenApi;

use crate::config::{ServiceConfig, SwaggerConfig};
use crate::error::Result;
use crate::handler::ApiDescriptor;
use crate::openapi_utils::DocGenerator;
use crate::rest_router_builder::RestRouterBuilder;

/// 按配置创建 RestRouterBuilder（前缀与默认语言）
pub fn router_builder(config: &ServiceConfig) -> RestRouterBuilder {
    RestRouterBuilder::new()
        .prefix(config.path_prefix.clone())
        .default_lang(config.default_language)
}

/// 从已注册的描述符生成 OpenAPI 文档
pub fn openapi_from_descriptors(
    config: &SwaggerConfig,
    descriptors: &[Arc<ApiDescriptor>],
) -> Result<OpenApi> {
    DocGenerator::new(config.clone()).generate(descriptors)
}

/// 完成注册：返回 Router，并在启用时生成并保存文档
pub fn finish(builder: RestRouterBuilder, config: &SwaggerConfig) -> Result<(Router, Option<OpenApi>)> {
    let (router, descriptors) = builder.into_parts();
    if !config.enabled {
        return Ok((router, None));
    }
    let generator = DocGenerator::new(config.clone());
    let openapi = generator.generate(&descriptors)?;
    generator.save(&openapi)?;
    Ok((router, Some(openapi)))
}
