//! # mailwizard-oauth
//!
//! `OAuth2` authorization sub-flow for email account onboarding.
//!
//! ## Features
//!
//! - **Provider lookup**: maps an incoming IMAP hostname to Google,
//!   Microsoft or Yahoo endpoints and scopes
//! - **Authorization Code Flow** with PKCE (RFC 7636) and CSRF state
//! - **Sub-flow session**: [`OAuthSession`] owns one authorization from
//!   `init_state` to an [`OAuthResult`]
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailwizard_oauth::{ClientConfig, OAuthResult, OAuthSession};
//!
//! let mut session = OAuthSession::new(ClientConfig {
//!     google_client_id: Some("your_client_id".into()),
//!     ..ClientConfig::default()
//! })?;
//! session.init_state("imap.gmail.com", "user@gmail.com");
//!
//! if let Some(url) = session.authorization_url() {
//!     println!("Visit: {url}");
//! }
//!
//! // The full URL the browser was redirected to, with `code` and `state`
//! match session.complete_redirect("http://localhost:8080/?code=...&state=...").await {
//!     OAuthResult::Success(token) => println!("Token: {}", token.access_token),
//!     other => println!("Not authorized: {other:?}"),
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod authorization;
mod error;
pub mod pkce;
pub mod provider;
mod session;
pub mod token;

pub use authorization::{AuthorizationRequest, Redirect};
pub use error::{Error, Result};
pub use pkce::PkceChallenge;
pub use provider::{ClientConfig, Provider, ProviderKind};
pub use session::{EXCHANGE_TIMEOUT, OAuthResult, OAuthSession, SessionState};
pub use token::Token;
