use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use autoapi::{api_controller, ApiError, Code, RequestContext};
use tokio::sync::RwLock;
use tracing::info;

use crate::dtos::*;

/// Failures of the user store that callers do not handle themselves.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("user store is read-only")]
    ReadOnly,
}

/// In-memory user store behind the REST endpoints.
pub struct UserController {
    users: RwLock<BTreeMap<u64, UserView>>,
    next_id: AtomicU64,
    read_only: bool,
}

impl Default for UserController {
    fn default() -> Self {
        Self::new(false)
    }
}

#[api_controller]
impl UserController {
    pub fn new(read_only: bool) -> Self {
        Self {
            users: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            read_only,
        }
    }

    pub async fn create(&self, _ctx: RequestContext, req: CreateUserRequest) -> Result<UserView, ApiError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.name == req.name) {
            return Err(ApiError::new(Code::ValidationError, format!("user `{}` already exists", req.name)));
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let user = UserView {
            id,
            name: req.name,
            email: req.email,
            age: req.age,
            mobile: req.mobile,
            role: req.role.unwrap_or_else(|| "member".to_string()),
        };
        users.insert(id, user.clone());
        info!(id, "user created");
        Ok(user)
    }

    pub async fn get(&self, _ctx: RequestContext, req: GetUserRequest) -> Result<UserView, ApiError> {
        self.users
            .read()
            .await
            .get(&req.id)
            .cloned()
            .ok_or_else(|| ApiError::not_found(format!("user {} not found", req.id)))
    }

    pub async fn list(&self, _ctx: RequestContext, req: ListUsersRequest) -> Result<UserPage, ApiError> {
        let page = req.page.unwrap_or(1).max(1);
        let size = req.size.unwrap_or(20) as usize;
        let users = self.users.read().await;
        let items = users
            .values()
            .skip((page as usize - 1) * size)
            .take(size)
            .cloned()
            .collect();
        Ok(UserPage {
            total: users.len(),
            page,
            items,
        })
    }

    pub async fn update(&self, _ctx: RequestContext, req: UpdateUserRequest) -> Result<UserView, ApiError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&req.id)
            .ok_or_else(|| ApiError::not_found(format!("user {} not found", req.id)))?;
        if let Some(email) = req.email {
            user.email = email;
        }
        if req.age.is_some() {
            user.age = req.age;
        }
        Ok(user.clone())
    }

    pub async fn delete(&self, _ctx: RequestContext, req: DeleteUserRequest) -> Result<Deleted, StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        self.users.write().await.remove(&req.id);
        info!(id = req.id, token_len = req.token.len(), "user deleted");
        Ok(Deleted { id: req.id })
    }

    pub async fn upload_avatar(&self, _ctx: RequestContext, req: UploadAvatarRequest) -> Result<AvatarView, ApiError> {
        if !self.users.read().await.contains_key(&req.id) {
            return Err(ApiError::not_found(format!("user {} not found", req.id)));
        }
        Ok(AvatarView {
            user_id: req.id,
            file_name: req.avatar.file_name.clone(),
            size: req.avatar.len(),
            caption: req.caption,
        })
    }

    pub async fn test(&self, ctx: RequestContext, _req: TestRequest) -> Result<TestView, ApiError> {
        Ok(TestView {
            lang: ctx.lang.code().to_string(),
            status: self.status_line().await,
        })
    }

    /// Not an endpoint: it takes no request value.
    pub async fn status_line(&self) -> String {
        format!("{} users", self.users.read().await.len())
    }
}
