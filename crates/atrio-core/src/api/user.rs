//! Client for the user-facing auth and profile endpoints.

use reqwest::Method;
use serde_json::json;

use super::error::ApiResult;
use super::types::{
    Credentials, LoginOutcome, LoginResponse, ProfileUpdate, RegisterRequest, Token, TwoFactorAck,
    TwoFactorSettings, UserAccount,
};
use super::{ApiConfig, execute, execute_empty};

/// Client for `/api/auth` and `/api/users` endpoints.
#[derive(Debug, Clone)]
pub struct UserApi {
    base_url: String,
    http: reqwest::Client,
}

impl UserApi {
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

    /// Creates an account. Returns the created user; no token is issued.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<UserAccount> {
        execute(
            self.request(Method::POST, "/api/auth/register", None)
                .json(request),
        )
        .await
    }

    /// Attempts a password login.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub async fn login(&self, credentials: &Credentials) -> ApiResult<LoginOutcome> {
        let response: LoginResponse = execute(
            self.request(Method::POST, "/api/auth/login", None)
                .json(credentials),
        )
        .await?;
        response.into_outcome()
    }

    /// Redeems a temp token with the second-factor password.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub async fn verify_two_factor(
        &self,
        temp_token: &str,
        external_password: &str,
    ) -> ApiResult<Token> {
        // The second factor travels under the `password` key.
        let body = json!({
            "temp_token": temp_token,
            "password": external_password,
        });
        execute(
            self.request(Method::POST, "/api/auth/verify-2fa", None)
                .json(&body),
        )
        .await
    }

    /// Notifies the backend of a logout. Works with or without a token.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub async fn logout(&self, token: Option<&str>) -> ApiResult<()> {
        execute_empty(self.request(Method::POST, "/api/auth/logout", token)).await
    }

    /// Fetches the account behind a token.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub async fn current_user(&self, token: &str) -> ApiResult<UserAccount> {
        execute(self.request(Method::GET, "/api/users/me", Some(token))).await
    }

    /// Applies a profile patch and returns the updated account.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub async fn update_profile(
        &self,
        token: &str,
        patch: &ProfileUpdate,
    ) -> ApiResult<UserAccount> {
        execute(
            self.request(Method::PUT, "/api/users/me", Some(token))
                .json(patch),
        )
        .await
    }

    /// Changes the caller's own two-factor settings.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub async fn update_two_factor(
        &self,
        token: &str,
        settings: &TwoFactorSettings,
    ) -> ApiResult<TwoFactorAck> {
        execute(
            self.request(Method::PUT, "/api/users/me/2fa", Some(token))
                .json(settings),
        )
        .await
    }
}
