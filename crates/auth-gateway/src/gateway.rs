//! Request interceptor chain.
//!
//! Every outbound call goes through [`AuthGateway::send`]:
//!
//! 1. Requests whose URL contains `/auth/` pass through untouched, and a
//!    failure on them is never recovered (no refresh loops on the refresh
//!    call itself).
//! 2. Otherwise the current access token, if any, is attached as a bearer
//!    credential.
//! 3. A `401` claims the refresh gate, exchanges the refresh token, and
//!    replays the original request once with the new token. Whatever the
//!    replay returns is final.
//! 4. If the refresh fails the session is cleared and the refresh failure is
//!    returned instead of the original `401`.
//! 5. A `401` that finds the gate already claimed is returned as-is.
//!
//! Any other failure is returned unchanged.

use crate::refresh_gate::RefreshGate;
use crate::{ApiRequest, ApiResponse, AuthError, AuthResult, HttpTransport, SessionManager, Transport};
use catalog_config_and_utils::Config;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Authenticated request gateway.
///
/// Construct one per process and share it by reference with every caller.
pub struct AuthGateway {
    base_url: String,
    session: Arc<SessionManager>,
    transport: Arc<dyn Transport>,
    gate: RefreshGate,
}

impl AuthGateway {
    pub fn new(
        base_url: impl Into<String>,
        session: Arc<SessionManager>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            session,
            transport,
            gate: RefreshGate::new(),
        }
    }

    /// Build a gateway over the real HTTP transport from configuration.
    pub fn from_config(config: &Config, session: Arc<SessionManager>) -> AuthResult<Self> {
        let base_url = config.api_url()?;
        let transport =
            HttpTransport::new(Duration::from_secs(config.request_timeout_secs))?;
        Ok(Self::new(base_url.as_str(), session, Arc::new(transport)))
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn refresh_gate(&self) -> &RefreshGate {
        &self.gate
    }

    /// Absolute URL for a path relative to the API base.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get(&self, path: &str) -> AuthResult<ApiResponse> {
        self.send(ApiRequest::get(self.url(path))).await
    }

    pub async fn post(&self, path: &str, body: &serde_json::Value) -> AuthResult<ApiResponse> {
        self.send(ApiRequest::post(self.url(path)).json(body)?).await
    }

    pub async fn put(&self, path: &str, body: &serde_json::Value) -> AuthResult<ApiResponse> {
        self.send(ApiRequest::put(self.url(path)).json(body)?).await
    }

    pub async fn delete(&self, path: &str) -> AuthResult<ApiResponse> {
        self.send(ApiRequest::delete(self.url(path))).await
    }

    /// Send a request through the interceptor chain.
    ///
    /// Returns the response for a 2xx status and `AuthError::Rejected` for
    /// any other status.
    pub async fn send(&self, request: ApiRequest) -> AuthResult<ApiResponse> {
        if request.is_auth_endpoint() {
            return self.dispatch(request).await;
        }

        let outgoing = self.authorize(&request)?;
        match self.dispatch(outgoing).await {
            Err(e) if e.is_unauthorized() => self.recover(request, e).await,
            other => other,
        }
    }

    /// Copy of `request` carrying the current access token, if there is one.
    fn authorize(&self, request: &ApiRequest) -> AuthResult<ApiRequest> {
        match self.session.get_access_token() {
            Some(token) => request.with_bearer(&token),
            None => Ok(request.clone()),
        }
    }

    pub(crate) async fn dispatch(&self, request: ApiRequest) -> AuthResult<ApiResponse> {
        let method = request.method.clone();
        let url = request.url.clone();

        let response = self.transport.dispatch(request).await?;
        if response.is_success() {
            return Ok(response);
        }

        debug!(method = %method, url = %url, status = %response.status, "Request rejected");
        Err(AuthError::rejected(response.status, &response.body))
    }

    async fn recover(&self, request: ApiRequest, unauthorized: AuthError) -> AuthResult<ApiResponse> {
        let Some(ticket) = self.gate.try_begin() else {
            warn!(url = %request.url, "Unauthorized while a refresh is in flight, not retrying");
            return Err(unauthorized);
        };

        info!(url = %request.url, "Access token rejected, refreshing session");

        match self.exchange_refresh_token().await {
            Ok(_) => {
                ticket.succeeded();
                let retry = self.authorize(&request)?;
                debug!(url = %retry.url, "Replaying request with refreshed token");
                self.dispatch(retry).await
            }
            Err(e) => {
                ticket.failed();
                warn!(error = %e, "Token refresh failed, signing out");
                self.session.clear_session();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{auth_body, ok, status, ScriptedTransport, Step};
    use crate::token::make_token;
    use crate::SessionEvent;
    use catalog_storage::{MemoryStorage, SessionStore};
    use chrono::Utc;
    use reqwest::header::AUTHORIZATION;
    use reqwest::StatusCode;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    const BASE: &str = "http://api.test/api/v1";

    fn token(label: &str) -> String {
        let exp = Utc::now().timestamp() + 3600;
        format!("{}-{}", make_token(serde_json::json!(exp)), label)
    }

    fn signed_in_gateway(steps: Vec<Step>) -> (AuthGateway, Arc<ScriptedTransport>, String) {
        let session = Arc::new(SessionManager::new(SessionStore::new(Box::new(
            MemoryStorage::new(),
        ))));
        let access = token("t1");
        session.commit_session(&access, "r1", "admin");

        let transport = ScriptedTransport::new(steps);
        let gateway = AuthGateway::new(BASE, session, transport.clone());
        (gateway, transport, access)
    }

    #[tokio::test]
    async fn test_injects_current_token() {
        let (gateway, transport, access) = signed_in_gateway(vec![ok("[]")]);

        let response = gateway.get("/albuns").await.unwrap();

        assert_eq!(response.status, StatusCode::OK);
        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].url, "http://api.test/api/v1/albuns");
        assert_eq!(sent[0].bearer_token(), Some(access.as_str()));
    }

    #[tokio::test]
    async fn test_sends_without_credential_when_signed_out() {
        let session = Arc::new(SessionManager::new(SessionStore::new(Box::new(
            MemoryStorage::new(),
        ))));
        let transport = ScriptedTransport::new(vec![ok("{}")]);
        let gateway = AuthGateway::new(BASE, session, transport.clone());

        gateway.get("regionais").await.unwrap();

        assert!(transport.requests()[0].headers.get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_auth_endpoint_is_not_decorated_or_recovered() {
        let (gateway, transport, _) = signed_in_gateway(vec![status(StatusCode::UNAUTHORIZED)]);

        let err = gateway
            .send(ApiRequest::post(gateway.url("auth/login")))
            .await
            .unwrap_err();

        assert!(err.is_unauthorized());
        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].headers.get(AUTHORIZATION).is_none());
        assert!(gateway.session().get_access_token().is_some());
    }

    #[tokio::test]
    async fn test_refreshes_and_replays_once_on_401() {
        let new_access = token("t2");
        let (gateway, transport, _) = signed_in_gateway(vec![
            status(StatusCode::UNAUTHORIZED),
            ok(&auth_body(&new_access, "r2", "admin")),
            ok(r#"{"content":[]}"#),
        ]);

        let response = gateway.get("albuns").await.unwrap();

        assert_eq!(response.text(), r#"{"content":[]}"#);
        let sent = transport.requests();
        assert_eq!(
            transport.urls(),
            vec![
                "http://api.test/api/v1/albuns",
                "http://api.test/api/v1/auth/refresh",
                "http://api.test/api/v1/albuns",
            ]
        );
        assert_eq!(sent[1].body, Some(serde_json::json!({ "refreshToken": "r1" })));
        assert!(sent[1].headers.get(AUTHORIZATION).is_none());
        assert_eq!(sent[2].bearer_token(), Some(new_access.as_str()));

        assert_eq!(gateway.session().get_access_token(), Some(new_access));
        assert_eq!(gateway.session().get_refresh_token(), Some("r2".to_string()));
        assert!(!gateway.refresh_gate().is_refreshing());
    }

    #[tokio::test]
    async fn test_replay_failure_is_final() {
        let (gateway, transport, _) = signed_in_gateway(vec![
            status(StatusCode::UNAUTHORIZED),
            ok(&auth_body(&token("t2"), "r2", "admin")),
            status(StatusCode::UNAUTHORIZED),
        ]);

        let err = gateway.get("albuns").await.unwrap_err();

        assert!(err.is_unauthorized());
        assert_eq!(transport.requests().len(), 3);
        assert!(gateway.session().get_access_token().is_some());
    }

    #[tokio::test]
    async fn test_refresh_failure_clears_session_and_surfaces_refresh_error() {
        let (gateway, transport, _) = signed_in_gateway(vec![
            status(StatusCode::UNAUTHORIZED),
            Step::Respond(
                StatusCode::INTERNAL_SERVER_ERROR,
                r#"{"message":"refresh store down"}"#.to_string(),
            ),
        ]);
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        gateway
            .session()
            .subscribe(Box::new(move |e| sink.lock().unwrap().push(e.clone())));

        let err = gateway.get("artistas").await.unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(err.user_message(), "refresh store down");
        assert_eq!(transport.requests().len(), 2);

        let session = gateway.session();
        assert!(session.get_access_token().is_none());
        assert!(session.get_refresh_token().is_none());
        assert!(session.current_user().is_none());
        assert!(!session.is_authenticated());
        assert_eq!(*events.lock().unwrap(), vec![SessionEvent::SignedOut]);
        assert!(!gateway.refresh_gate().is_refreshing());
    }

    #[tokio::test]
    async fn test_refresh_rejected_with_401_clears_session() {
        let (gateway, transport, _) = signed_in_gateway(vec![
            status(StatusCode::UNAUTHORIZED),
            status(StatusCode::UNAUTHORIZED),
        ]);

        let err = gateway.get("artistas").await.unwrap_err();

        assert!(err.is_unauthorized());
        assert_eq!(transport.requests().len(), 2);
        assert!(gateway.session().get_refresh_token().is_none());
    }

    #[tokio::test]
    async fn test_missing_refresh_token_signs_out() {
        let session = Arc::new(SessionManager::new(SessionStore::new(Box::new(
            MemoryStorage::new(),
        ))));
        let transport = ScriptedTransport::new(vec![status(StatusCode::UNAUTHORIZED)]);
        let gateway = AuthGateway::new(BASE, session, transport.clone());

        let err = gateway.get("albuns").await.unwrap_err();

        assert!(matches!(err, AuthError::TokenRefresh(_)));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_401_while_gate_is_claimed_is_not_retried() {
        let (gateway, transport, _) = signed_in_gateway(vec![status(StatusCode::UNAUTHORIZED)]);

        let ticket = gateway.refresh_gate().try_begin().unwrap();
        let err = gateway.get("albuns").await.unwrap_err();
        ticket.succeeded();

        assert!(err.is_unauthorized());
        assert_eq!(transport.urls(), vec!["http://api.test/api/v1/albuns"]);
        assert!(gateway.session().get_access_token().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_401_loses_race_without_second_refresh() {
        let release = Arc::new(Notify::new());
        let new_access = token("t2");
        let (gateway, transport, _) = signed_in_gateway(vec![
            status(StatusCode::UNAUTHORIZED),
            Step::RespondAfter(
                release.clone(),
                StatusCode::OK,
                auth_body(&new_access, "r2", "admin"),
            ),
            status(StatusCode::UNAUTHORIZED),
            ok("r1-replayed"),
        ]);

        let (r1, r2, _) = tokio::join!(gateway.get("albuns"), gateway.get("artistas"), async {
            tokio::task::yield_now().await;
            release.notify_one();
        });

        assert_eq!(r1.unwrap().text(), "r1-replayed");
        assert!(r2.unwrap_err().is_unauthorized());
        assert_eq!(
            transport.urls(),
            vec![
                "http://api.test/api/v1/albuns",
                "http://api.test/api/v1/auth/refresh",
                "http://api.test/api/v1/artistas",
                "http://api.test/api/v1/albuns",
            ]
        );
        assert_eq!(transport.requests()[3].bearer_token(), Some(new_access.as_str()));
    }

    #[tokio::test]
    async fn test_other_failures_pass_through() {
        let (gateway, transport, _) = signed_in_gateway(vec![
            status(StatusCode::NOT_FOUND),
            Step::Fail("connection reset".to_string()),
        ]);

        let not_found = gateway.get("albuns/99").await.unwrap_err();
        assert_eq!(not_found.status(), Some(StatusCode::NOT_FOUND));

        let transport_err = gateway.get("albuns").await.unwrap_err();
        assert!(transport_err.is_transport());

        assert_eq!(transport.requests().len(), 2);
        assert!(gateway.session().get_access_token().is_some());
    }

    #[test]
    fn test_url_joining() {
        let session = Arc::new(SessionManager::new(SessionStore::new(Box::new(
            MemoryStorage::new(),
        ))));
        let gateway = AuthGateway::new(
            "http://api.test/api/v1/",
            session,
            ScriptedTransport::new(Vec::new()),
        );

        assert_eq!(gateway.base_url(), "http://api.test/api/v1");
        assert_eq!(gateway.url("/albuns"), "http://api.test/api/v1/albuns");
        assert_eq!(gateway.url("albuns?page=0"), "http://api.test/api/v1/albuns?page=0");
    }

    #[test]
    fn test_from_config_rejects_bad_url() {
        let session = Arc::new(SessionManager::new(SessionStore::new(Box::new(
            MemoryStorage::new(),
        ))));
        let config = Config {
            api_url: "not a url".to_string(),
            ..Config::default()
        };

        assert!(matches!(
            AuthGateway::from_config(&config, session),
            Err(AuthError::Config(_))
        ));
    }
}
