//! Operator-only statistics and search.

use super::{ BackendError, HttpBackend };
use crate::identity::Identity;
use crate::models::admin::{ AdminMessage, AdminMessages, AdminStats, AdminUsers };
use log::info;
use thiserror::Error;

pub const DEFAULT_MESSAGE_LIMIT: usize = 200;
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("admin access denied for {0}")]
    NotAdmin(String),

    #[error("no admin email configured")]
    NotConfigured,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub struct AdminClient {
    backend: HttpBackend,
    admin_email: String,
}

impl AdminClient {
    /// Only the configured operator identity may use the admin endpoints.
    pub fn for_identity(
        backend: HttpBackend,
        identity: &Identity,
        admin_email: Option<&str>
    ) -> Result<Self, AdminError> {
        let admin_email = admin_email
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .ok_or(AdminError::NotConfigured)?;
        if !identity.is_signed_in() || !identity.id.eq_ignore_ascii_case(admin_email) {
            return Err(AdminError::NotAdmin(identity.id.clone()));
        }
        info!("Admin access granted to {}", identity.id);
        Ok(Self { backend, admin_email: identity.id.clone() })
    }

    fn auth(&self) -> (&'static str, String) {
        ("admin_email", self.admin_email.clone())
    }

    pub async fn all_messages(&self, limit: usize) -> Result<Vec<AdminMessage>, AdminError> {
        let query = [self.auth(), ("limit", limit.to_string())];
        let resp: AdminMessages = self.backend.get_json(&["admin", "all-messages"], &query).await?;
        Ok(resp.messages)
    }

    pub async fn users(&self) -> Result<Vec<String>, AdminError> {
        let resp: AdminUsers = self.backend.get_json(&["admin", "users"], &[self.auth()]).await?;
        Ok(resp.users)
    }

    pub async fn stats(&self) -> Result<AdminStats, AdminError> {
        Ok(self.backend.get_json(&["admin", "stats"], &[self.auth()]).await?)
    }

    pub async fn search(
        &self,
        query: &str,
        user_email: Option<&str>,
        limit: usize
    ) -> Result<Vec<AdminMessage>, AdminError> {
        let mut params = vec![self.auth(), ("query", query.to_string())];
        if let Some(user) = user_email {
            params.push(("user_email", user.to_string()));
        }
        params.push(("limit", limit.to_string()));
        let resp: AdminMessages = self.backend.get_json(&["admin", "search"], &params).await?;
        Ok(resp.messages)
    }
}
