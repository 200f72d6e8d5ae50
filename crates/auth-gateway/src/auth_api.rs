//! Calls against the backend's `/auth/` endpoints.
//!
//! These go through [`AuthGateway::send`] like everything else, but their
//! URLs contain the auth segment so they are never decorated or recovered.

use crate::{ApiRequest, AuthError, AuthGateway, AuthResult};
use crate::token::mask_token;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, info, warn};

const LOGIN_PATH: &str = "auth/login";
const REGISTER_PATH: &str = "auth/register";
const REFRESH_PATH: &str = "auth/refresh";

#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Display name. The backend field is `nome`.
    #[serde(rename = "nome")]
    pub name: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"***")
            .field("name", &self.name)
            .finish()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest {
    refresh_token: String,
}

/// Token pair issued by login, register and refresh.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: i64,
    pub username: String,
}

impl fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthResponse")
            .field("access_token", &mask_token(&self.access_token))
            .field("refresh_token", &mask_token(&self.refresh_token))
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("username", &self.username)
            .finish()
    }
}

impl AuthGateway {
    /// Exchange credentials for a token pair and commit it to the session.
    pub async fn login(&self, credentials: &LoginRequest) -> AuthResult<AuthResponse> {
        let request = ApiRequest::post(self.url(LOGIN_PATH)).json(credentials)?;
        self.authenticate(request).await.inspect_err(|e| {
            error!(username = %credentials.username, error = %e, "Login failed");
        })
    }

    /// Create an account. The backend signs the new user in immediately.
    pub async fn register(&self, account: &RegisterRequest) -> AuthResult<AuthResponse> {
        let request = ApiRequest::post(self.url(REGISTER_PATH)).json(account)?;
        self.authenticate(request).await.inspect_err(|e| {
            error!(username = %account.username, error = %e, "Registration failed");
        })
    }

    /// Exchange the stored refresh token for a new pair.
    ///
    /// Any failure, including a missing refresh token, clears the session.
    pub async fn refresh_session(&self) -> AuthResult<AuthResponse> {
        match self.exchange_refresh_token().await {
            Ok(response) => Ok(response),
            Err(e) => {
                warn!(error = %e, "Token refresh failed, signing out");
                self.session().clear_session();
                Err(e)
            }
        }
    }

    /// Drop the session locally. There is no server-side logout call.
    pub fn logout(&self) {
        info!("Logging out");
        self.session().clear_session();
    }

    /// Refresh without touching the session on failure.
    pub(crate) async fn exchange_refresh_token(&self) -> AuthResult<AuthResponse> {
        let refresh_token = self
            .session()
            .get_refresh_token()
            .ok_or_else(|| AuthError::TokenRefresh("No refresh token available".to_string()))?;

        let request =
            ApiRequest::post(self.url(REFRESH_PATH)).json(&RefreshRequest { refresh_token })?;
        self.authenticate(request).await
    }

    /// Auth endpoints are never decorated or recovered, so they skip `send`.
    async fn authenticate(&self, request: ApiRequest) -> AuthResult<AuthResponse> {
        let response = self.dispatch(request).await?;
        let auth: AuthResponse = response.json()?;
        self.session()
            .commit_session(&auth.access_token, &auth.refresh_token, &auth.username);
        Ok(auth)
    }
}
