//! Client for the admin auth and admin-management endpoints.

use reqwest::Method;

use super::error::ApiResult;
use super::types::{
    AdminAccount, AdminCreate, AdminToken, AdminUpdate, Credentials, TwoFactorAck,
    TwoFactorSettings,
};
use super::{ApiConfig, execute, execute_empty};

/// Client for `/api/admin` endpoints.
///
/// Every call except login takes an admin token; role checks happen
/// server-side and surface as forbidden errors.
#[derive(Debug, Clone)]
pub struct AdminApi {
    base_url: String,
    http: reqwest::Client,
}

impl AdminApi {
    /// Creates a client over the shared connection settings.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        Ok(Self {
            base_url: config.base_url.clone(),
            http: config.build_http()?,
        })
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> reqwest::RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        let mut builder = self.http.request(method, url);
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Attempts an admin password login. No two-factor branch here; the
    /// token comes back directly with a role echo.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub async fn login(&self, credentials: &Credentials) -> ApiResult<AdminToken> {
        execute(
            self.request(Method::POST, "/api/admin/auth/login", None)
                .json(credentials),
        )
        .await
    }

    /// Notifies the backend of an admin logout.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub async fn logout(&self, token: &str) -> ApiResult<()> {
        execute_empty(self.request(Method::POST, "/api/admin/auth/logout", Some(token))).await
    }

    /// Fetches the admin account behind a token.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub async fn current_admin(&self, token: &str) -> ApiResult<AdminAccount> {
        execute(self.request(Method::GET, "/api/admin/users/me", Some(token))).await
    }

    /// Lists all admin accounts.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub async fn list(&self, token: &str) -> ApiResult<Vec<AdminAccount>> {
        execute(self.request(Method::GET, "/api/admin/users", Some(token))).await
    }

    /// Fetches one admin account by id.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub async fn get(&self, token: &str, id: i64) -> ApiResult<AdminAccount> {
        execute(self.request(Method::GET, &format!("/api/admin/users/{id}"), Some(token))).await
    }

    /// Creates an admin account.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub async fn create(&self, token: &str, payload: &AdminCreate) -> ApiResult<AdminAccount> {
        execute(
            self.request(Method::POST, "/api/admin/users", Some(token))
                .json(payload),
        )
        .await
    }

    /// Applies a patch to an admin account and returns the updated form.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub async fn update(
        &self,
        token: &str,
        id: i64,
        patch: &AdminUpdate,
    ) -> ApiResult<AdminAccount> {
        execute(
            self.request(Method::PUT, &format!("/api/admin/users/{id}"), Some(token))
                .json(patch),
        )
        .await
    }

    /// Deletes an admin account.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub async fn delete(&self, token: &str, id: i64) -> ApiResult<()> {
        execute_empty(self.request(
            Method::DELETE,
            &format!("/api/admin/users/{id}"),
            Some(token),
        ))
        .await
    }

    /// Changes the two-factor settings of an arbitrary user account.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub async fn update_user_two_factor(
        &self,
        token: &str,
        user_id: i64,
        settings: &TwoFactorSettings,
    ) -> ApiResult<TwoFactorAck> {
        execute(
            self.request(
                Method::PUT,
                &format!("/api/admin/users/{user_id}/2fa"),
                Some(token),
            )
            .json(settings),
        )
        .await
    }
}
