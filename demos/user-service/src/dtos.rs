use autoapi::{ApiRequest, ApiSchema, UploadFile};
use serde::Serialize;

/// Create a user.
///
/// The name must be unique.
#[derive(ApiRequest)]
#[api(method = "post", path = "/user", tags = "user")]
pub struct CreateUserRequest {
    #[param(json = "name", binding = "required,min=2,max=32", dc = "display name", example = "alice")]
    pub name: String,
    #[param(json = "email", binding = "required,email", example = "alice@example.com")]
    pub email: String,
    #[param(json = "age", binding = "omitempty,gte=0,lte=150")]
    pub age: Option<u8>,
    #[param(json = "mobile", binding = "omitempty,mobile_cn")]
    pub mobile: Option<String>,
    #[param(json = "role", binding = "omitempty,oneof=admin member", enum = "admin,member", default = "member")]
    pub role: Option<String>,
}

#[derive(ApiRequest)]
#[api(method = "get", path = "/user/{id}", sm = "Get a user", tags = "user")]
pub struct GetUserRequest {
    #[param(uri = "id", dc = "user id")]
    pub id: u64,
}

#[derive(ApiRequest)]
#[api(method = "get", path = "/users", sm = "List users", tags = "user")]
pub struct ListUsersRequest {
    #[param(query = "page", binding = "omitempty,gte=1", default = "1")]
    pub page: Option<u32>,
    #[param(query = "size", binding = "omitempty,gte=1,lte=100", default = "20")]
    pub size: Option<u32>,
}

#[derive(ApiRequest)]
#[api(method = "put", path = "/user/{id}", sm = "Update a user", tags = "user")]
pub struct UpdateUserRequest {
    #[param(uri = "id")]
    pub id: u64,
    #[param(json = "email", binding = "omitempty,email")]
    pub email: Option<String>,
    #[param(json = "age", binding = "omitempty,lte=150")]
    pub age: Option<u8>,
}

#[derive(ApiRequest)]
#[api(
    method = "delete",
    path = "/user/{id}",
    sm = "Delete a user",
    tags = "user",
    security = "token"
)]
pub struct DeleteUserRequest {
    #[param(uri = "id")]
    pub id: u64,
    #[param(header = "X-Token", binding = "required", dc = "session token")]
    pub token: String,
}

#[derive(ApiRequest)]
#[api(
    method = "post",
    path = "/user/{id}/avatar",
    sm = "Upload an avatar",
    tags = "user",
    consumes = "multipart/form-data"
)]
pub struct UploadAvatarRequest {
    #[param(uri = "id")]
    pub id: u64,
    #[param(form = "avatar", binding = "required")]
    pub avatar: UploadFile,
    #[param(form = "caption")]
    pub caption: Option<String>,
}

/// Health check that echoes the negotiated language.
#[derive(ApiRequest)]
#[api(method = "get", path = "/test", tags = "system", version = "v1")]
pub struct TestRequest {}

#[derive(Debug, Clone, Serialize, ApiSchema)]
pub struct UserView {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub age: Option<u8>,
    pub mobile: Option<String>,
    pub role: String,
}

#[derive(Debug, Serialize, ApiSchema)]
pub struct UserPage {
    pub total: usize,
    pub page: u32,
    pub items: Vec<UserView>,
}

#[derive(Debug, Serialize, ApiSchema)]
pub struct Deleted {
    pub id: u64,
}

#[derive(Debug, Serialize, ApiSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvatarView {
    pub user_id: u64,
    pub file_name: Option<String>,
    pub size: usize,
    pub caption: Option<String>,
}

#[derive(Debug, Serialize, ApiSchema)]
pub struct TestView {
    pub lang: String,
    pub status: String,
}
