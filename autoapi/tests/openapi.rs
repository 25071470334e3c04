use autoapi::config::SecurityDefinition;
use autoapi::{
    api_controller, bootstrap, ApiError, ApiRequest, ApiSchema, DocGenerator, Error,
    RequestContext, RestRouterBuilder, ServiceConfig, SwaggerConfig,
};
use serde::Serialize;
use serde_json::Value;

#[derive(ApiRequest)]
#[api(
    method = "post",
    path = "/orders/{shop}",
    sm = "Place order",
    dc = "Places an order in a shop",
    tags = "order,shop",
    security = "bearer",
    headers = "X-Request-Id,X-Tenant",
    version = "v2"
)]
pub struct PlaceOrder {
    #[param(uri = "shop", dc = "shop id")]
    pub shop: u32,
    #[param(header = "X-Tenant")]
    pub tenant: Option<String>,
    #[param(query = "dry_run", default = "false")]
    pub dry_run: bool,
    #[param(json = "sku", binding = "required", example = "A-100", minLength = 3)]
    pub sku: String,
    #[param(json = "qty", min = 1, max = 99)]
    pub qty: i32,
    pub notes: Vec<String>,
}

/// List orders.
///
/// Newest first.
#[derive(ApiRequest)]
#[api(method = "get", path = "/orders", operationId = "listOrders", deprecated)]
pub struct ListOrders {
    #[param(query = "page")]
    pub page: Option<u32>,
}

#[derive(Debug, Default, Serialize, ApiSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub order_id: u64,
    pub sku: String,
}

#[derive(Debug, Default, Serialize, ApiSchema)]
pub struct OrderPage {
    pub items: Vec<u64>,
}

pub struct OrderController;

#[api_controller]
impl OrderController {
    pub async fn place(&self, _ctx: RequestContext, req: PlaceOrder) -> Result<OrderView, ApiError> {
        Ok(OrderView {
            order_id: 1,
            sku: req.sku,
        })
    }

    pub async fn list(&self, _ctx: RequestContext, _req: ListOrders) -> Result<OrderPage, ApiError> {
        Ok(OrderPage::default())
    }
}

fn swagger() -> SwaggerConfig {
    let mut config = SwaggerConfig::default();
    config.info.title = "Orders".into();
    config.security_definitions.insert(
        "bearer".into(),
        SecurityDefinition {
            kind: "http".into(),
            scheme: Some("bearer".into()),
            ..Default::default()
        },
    );
    config
}

fn document() -> Value {
    let builder = RestRouterBuilder::new()
        .prefix("/api")
        .register(OrderController)
        .unwrap();
    let doc = DocGenerator::new(swagger())
        .generate(builder.descriptors())
        .unwrap();
    serde_json::to_value(&doc).unwrap()
}

#[test]
fn every_route_becomes_an_operation() {
    let doc = document();
    let paths = doc["paths"].as_object().unwrap();
    assert_eq!(paths.len(), 2);
    assert!(paths["/api/orders/{shop}"]["post"].is_object());
    assert!(paths["/api/orders"]["get"].is_object());
    assert_eq!(doc["info"]["title"], "Orders");
}

#[test]
fn operation_carries_marker_metadata() {
    let doc = document();
    let op = &doc["paths"]["/api/orders/{shop}"]["post"];
    assert_eq!(op["operationId"], "place");
    assert_eq!(op["summary"], "Place order");
    assert_eq!(op["description"], "Places an order in a shop");
    assert_eq!(op["tags"], serde_json::json!(["order", "shop"]));
    assert!(op["security"][0].get("bearer").is_some());
    assert_eq!(op["x-version"], "v2");

    let list = &doc["paths"]["/api/orders"]["get"];
    assert_eq!(list["operationId"], "listOrders");
    assert_eq!(list["deprecated"], true);
    assert_eq!(list["summary"], "List orders.");
}

#[test]
fn parameters_split_by_location() {
    let doc = document();
    let op = &doc["paths"]["/api/orders/{shop}"]["post"];
    let params = op["parameters"].as_array().unwrap();
    let find = |name: &str| {
        params
            .iter()
            .find(|p| p["name"] == name)
            .unwrap_or_else(|| panic!("missing parameter {name}"))
    };
    assert_eq!(find("shop")["in"], "path");
    assert_eq!(find("shop")["required"], true);
    assert_eq!(find("shop")["schema"]["type"], "integer");
    assert_eq!(find("dry_run")["in"], "query");
    assert_eq!(find("X-Tenant")["in"], "header");
    // marker headers only add what the fields do not declare
    assert_eq!(find("X-Request-Id")["in"], "header");
    assert_eq!(params.iter().filter(|p| p["name"] == "X-Tenant").count(), 1);
    assert!(params.iter().all(|p| p["name"] != "sku"));
}

#[test]
fn body_and_response_schemas_are_components() {
    let doc = document();
    let op = &doc["paths"]["/api/orders/{shop}"]["post"];
    assert_eq!(
        op["requestBody"]["content"]["application/json"]["schema"]["$ref"],
        "#/components/schemas/PlaceOrder"
    );
    let body = &doc["components"]["schemas"]["PlaceOrder"];
    let props = body["properties"].as_object().unwrap();
    assert_eq!(props.len(), 3);
    assert_eq!(props["sku"]["minLength"], 3);
    assert_eq!(props["qty"]["minimum"], 1.0);
    assert_eq!(props["notes"]["type"], "array");
    assert_eq!(body["required"], serde_json::json!(["sku"]));

    let ok = &op["responses"]["200"]["content"]["application/json"]["schema"];
    assert_eq!(
        ok["properties"]["data"]["$ref"],
        "#/components/schemas/OrderView"
    );
    let view = &doc["components"]["schemas"]["OrderView"]["properties"];
    assert!(view.get("orderId").is_some());
    assert!(op["responses"]["400"].is_object());
    assert!(op["responses"]["500"].is_object());

    // GET without body parameters has no request body
    assert!(doc["paths"]["/api/orders"]["get"].get("requestBody").is_none());
    assert!(doc["components"]["securitySchemes"]["bearer"].is_object());
}

mod other {
    use super::*;

    #[derive(Debug, Default, Serialize, ApiSchema)]
    pub struct OrderView {
        pub id: u64,
    }

    #[derive(ApiRequest)]
    #[api(method = "get", path = "/legacy/orders")]
    pub struct LegacyOrders {}

    pub struct LegacyController;

    #[api_controller]
    impl LegacyController {
        pub async fn legacy(&self, _ctx: RequestContext, _req: LegacyOrders) -> Result<OrderView, ApiError> {
            Ok(OrderView::default())
        }
    }
}

#[test]
fn same_short_name_from_two_modules_collides() {
    let builder = RestRouterBuilder::new()
        .register(OrderController)
        .unwrap()
        .register(other::LegacyController)
        .unwrap();
    let err = DocGenerator::new(swagger())
        .generate(builder.descriptors())
        .unwrap_err();
    assert!(matches!(err, Error::SchemaNameCollision { ref name, .. } if name == "OrderView"));
}

#[test]
fn finish_saves_the_document_when_enabled() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ServiceConfig::default();
    config.path_prefix = "/api".into();
    config.swagger = swagger();
    config.swagger.json_path = dir.path().join("docs/nested/swagger.json");

    let builder = bootstrap::router_builder(&config)
        .register(OrderController)
        .unwrap();
    let (_router, doc) = bootstrap::finish(builder, &config.swagger).unwrap();
    assert!(doc.is_some());
    let saved: Value =
        serde_json::from_str(&std::fs::read_to_string(&config.swagger.json_path).unwrap()).unwrap();
    assert!(saved["paths"]["/api/orders"].is_object());

    config.swagger.enabled = false;
    config.swagger.json_path = dir.path().join("off.json");
    let builder = bootstrap::router_builder(&config);
    let (_router, doc) = bootstrap::finish(builder, &config.swagger).unwrap();
    assert!(doc.is_none());
    assert!(!config.swagger.json_path.exists());
}

#[derive(ApiRequest)]
#[api(method = "put", path = "/orders/{id}/note")]
pub struct EditNote {
    #[param(uri = "id")]
    pub id: u64,
    #[param(json = "note")]
    pub note: Option<String>,
}

pub struct NoteController;

#[api_controller]
impl NoteController {
    pub async fn edit(&self, _ctx: RequestContext, req: EditNote) -> Result<OrderView, ApiError> {
        Ok(OrderView {
            order_id: req.id,
            sku: req.note.unwrap_or_default(),
        })
    }
}

#[test]
fn request_body_is_required_only_with_a_required_field() {
    let builder = RestRouterBuilder::new()
        .register(OrderController)
        .unwrap()
        .register(NoteController)
        .unwrap();
    let doc = DocGenerator::new(swagger())
        .generate(builder.descriptors())
        .unwrap();
    let doc = serde_json::to_value(&doc).unwrap();
    assert_eq!(doc["paths"]["/orders/{shop}"]["post"]["requestBody"]["required"], true);
    let edit = &doc["paths"]["/orders/{id}/note"]["put"]["requestBody"];
    assert!(edit.is_object());
    assert_ne!(edit["required"], true);
}
