//! Authenticated request gateway for the catalog admin backend.
//!
//! This crate provides:
//! - A session holder that owns the access/refresh token pair and persists it
//! - Bearer credential injection for every non-auth request
//! - Single-flight token refresh on `401 Unauthorized`, with one retry of the
//!   request that triggered it
//! - Login, registration, refresh and logout against the `/auth/` endpoints

mod auth_api;
mod error;
mod gateway;
mod refresh_gate;
mod request;
mod session;
pub mod token;
mod transport;

#[cfg(test)]
mod test_support;

pub use auth_api::{AuthResponse, LoginRequest, RegisterRequest};
pub use error::{AuthError, AuthResult};
pub use gateway::AuthGateway;
pub use refresh_gate::{refresh_gate_machine, GateState, RefreshGate, RefreshTicket};
pub use request::{ApiRequest, ApiResponse, AUTH_PATH_SEGMENT};
pub use session::{SessionCallback, SessionEvent, SessionManager, SessionSnapshot};
pub use transport::{HttpTransport, Transport};

pub use reqwest::{Method, StatusCode};
