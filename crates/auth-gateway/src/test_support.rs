//! Scripted transport double for gateway tests.

use crate::{ApiRequest, ApiResponse, AuthError, AuthResult, Transport};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub(crate) enum Step {
    Respond(StatusCode, String),
    /// Hold the response until the notify fires.
    RespondAfter(Arc<Notify>, StatusCode, String),
    Fail(String),
}

/// Replays queued steps in order and records every dispatched request.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn dispatch(&self, request: ApiRequest) -> AuthResult<ApiResponse> {
        self.requests.lock().unwrap().push(request);
        let step = self.steps.lock().unwrap().pop_front();

        match step {
            Some(Step::Respond(status, body)) => Ok(ApiResponse::new(status, body)),
            Some(Step::RespondAfter(notify, status, body)) => {
                notify.notified().await;
                Ok(ApiResponse::new(status, body))
            }
            Some(Step::Fail(message)) => Err(AuthError::Transport(message)),
            None => Err(AuthError::Transport("no scripted response".to_string())),
        }
    }
}

pub(crate) fn ok(body: &str) -> Step {
    Step::Respond(StatusCode::OK, body.to_string())
}

pub(crate) fn status(status: StatusCode) -> Step {
    Step::Respond(status, String::new())
}

pub(crate) fn auth_body(access_token: &str, refresh_token: &str, username: &str) -> String {
    serde_json::json!({
        "accessToken": access_token,
        "refreshToken": refresh_token,
        "tokenType": "Bearer",
        "expiresIn": 3600,
        "username": username,
    })
    .to_string()
}
