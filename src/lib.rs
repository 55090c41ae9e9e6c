//! Async Rust client for the Cint panel management REST API.
//!
//! Public API layers:
//! - [`CintClient`]: one method per API operation (panels, panelists,
//!   genders, quotas, events, survey invitations, candidate respondents).
//! - [`ApiRequest`]: validated request descriptors, one constructor per operation.
//! - [`ApiClient`]: the dispatcher shared by every operation (content
//!   negotiation, Basic authorization, JSON/XML response handling).
//! - [`ClientError`]: unified error type used by all clients.

mod cint_client;
mod client;
mod config;
mod error;
pub mod policy;
mod request;
mod response;

/// Request dispatcher.
pub use client::ApiClient;
/// Operation-level async client.
pub use cint_client::CintClient;
/// Connection settings and authentication state.
pub use config::{Auth, ClientConfig, Credentials, DEFAULT_HOST, Scheme};
/// Error type returned by all client operations.
pub use error::ClientError;
pub use request::ApiRequest;
pub use response::{CandidateRespondent, Link, Payload};
