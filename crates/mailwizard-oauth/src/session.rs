//! Nested authorization sub-flow used by the onboarding wizard.
//!
//! The wizard calls [`OAuthSession::init_state`] once discovery reports that
//! the incoming server wants `OAuth2`. The session then owns the exchange
//! until it produces an [`OAuthResult`], which the wizard consumes as an
//! event.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

use crate::authorization::{AuthorizationRequest, Redirect};
use crate::error::{Error, Result};
use crate::provider::{ClientConfig, Provider, ProviderKind};
use crate::token::Token;

/// Final outcome of the sub-flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OAuthResult {
    /// The user authorized access.
    Success(Token),
    /// The user backed out.
    Canceled,
    /// Authorization could not be completed.
    Failure(String),
}

/// Upper bound on one token request.
pub const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the sub-flow currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// `init_state` has not been called.
    Idle,
    /// Waiting for the user to visit the consent URL and return a code.
    AwaitingAuthorization {
        /// Provider being authorized against.
        provider: ProviderKind,
        /// Consent URL.
        url: Url,
    },
    /// A token was obtained.
    Authorized,
    /// The flow cannot continue; the wizard should offer going back.
    Failed(String),
}

/// Authorization sub-flow for one mailbox.
#[derive(Debug)]
pub struct OAuthSession {
    config: ClientConfig,
    http_client: Client,
    request: Option<AuthorizationRequest>,
    state: SessionState,
}

impl OAuthSession {
    /// Creates an idle session.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http_client = Client::builder().timeout(EXCHANGE_TIMEOUT).build()?;
        Ok(Self {
            config,
            http_client,
            request: None,
            state: SessionState::Idle,
        })
    }

    /// Resets the session for the given incoming server and address.
    ///
    /// Never fails; an unsupported host or missing client registration moves
    /// the session to [`SessionState::Failed`].
    pub fn init_state(&mut self, hostname: &str, email_address: &str) {
        self.request = None;
        match self.start(hostname, email_address) {
            Ok(request) => {
                info!(
                    "Starting {} authorization for {}",
                    request.provider_kind().display_name(),
                    email_address
                );
                self.state = SessionState::AwaitingAuthorization {
                    provider: request.provider_kind(),
                    url: request.authorization_url(),
                };
                self.request = Some(request);
            }
            Err(e) => {
                warn!("Cannot start authorization for {hostname}: {e}");
                self.state = SessionState::Failed(e.to_string());
            }
        }
    }

    fn start(&self, hostname: &str, email_address: &str) -> Result<AuthorizationRequest> {
        let provider = Provider::for_hostname(hostname)?;
        let client_id = self.config.client_id(provider.kind)?;
        Ok(AuthorizationRequest::new(
            provider,
            client_id,
            self.config.redirect_uri.as_str(),
            email_address,
        ))
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Consent URL, while awaiting authorization.
    #[must_use]
    pub const fn authorization_url(&self) -> Option<&Url> {
        match &self.state {
            SessionState::AwaitingAuthorization { url, .. } => Some(url),
            _ => None,
        }
    }

    /// Completes the flow from the URL the provider redirected to.
    ///
    /// A redirect carrying an `error` parameter, such as a denied consent,
    /// is a failure.
    pub async fn complete_redirect(&mut self, redirect_url: &str) -> OAuthResult {
        match Redirect::parse(redirect_url) {
            Ok(redirect) => self.complete(&redirect.code, &redirect.state).await,
            Err(e) => {
                warn!("Unusable redirect: {e}");
                OAuthResult::Failure(e.to_string())
            }
        }
    }

    /// Exchanges the code returned by the provider.
    ///
    /// `state` must be the value the provider echoed back; a mismatch fails
    /// without contacting the token endpoint.
    pub async fn complete(&mut self, code: &str, state: &str) -> OAuthResult {
        let code = code.trim();
        if code.is_empty() {
            return OAuthResult::Failure("Authorization code is empty".to_string());
        }

        let result = match &self.request {
            Some(request) => match request.verify_state(state.trim()) {
                Ok(()) => request.exchange_code(&self.http_client, code).await,
                Err(e) => Err(e),
            },
            None => Err(Error::NotStarted),
        };

        match result {
            Ok(token) => {
                debug!("Authorization code exchanged");
                self.state = SessionState::Authorized;
                self.request = None;
                OAuthResult::Success(token)
            }
            Err(e) => {
                warn!("Code exchange failed: {e}");
                OAuthResult::Failure(e.to_string())
            }
        }
    }

    /// Abandons the pending authorization.
    pub fn cancel(&mut self) -> OAuthResult {
        self.request = None;
        self.state = SessionState::Idle;
        OAuthResult::Canceled
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig {
            google_client_id: Some("g-client".to_string()),
            ..ClientConfig::default()
        }
    }

    fn session() -> OAuthSession {
        OAuthSession::new(config()).unwrap()
    }

    /// Session awaiting Google authorization, with its token endpoint on `server`.
    fn awaiting(server: &mockito::Server) -> OAuthSession {
        let mut session = session();
        session.init_state("imap.gmail.com", "user@gmail.com");
        let request = session.request.as_mut().unwrap();
        let mut provider = Provider::new(ProviderKind::Google).unwrap();
        provider.token_url = Url::parse(&format!("{}/token", server.url())).unwrap();
        *request = AuthorizationRequest::new(
            provider,
            "g-client",
            "http://localhost:8080",
            "user@gmail.com",
        );
        session
    }

    fn state_of(session: &OAuthSession) -> String {
        let url = session.request.as_ref().unwrap().authorization_url();
        url.query_pairs()
            .find(|(key, _)| key == "state")
            .map(|(_, value)| value.into_owned())
            .unwrap()
    }

    #[test]
    fn test_init_state_awaits_authorization() {
        let mut session = session();
        session.init_state("imap.gmail.com", "user@gmail.com");

        assert!(matches!(
            session.state(),
            SessionState::AwaitingAuthorization {
                provider: ProviderKind::Google,
                ..
            }
        ));
        let url = session.authorization_url().unwrap();
        assert!(url.as_str().contains("login_hint=user%40gmail.com"));
    }

    #[test]
    fn test_init_state_unknown_host_fails() {
        let mut session = session();
        session.init_state("imap.example.org", "user@example.org");
        assert!(matches!(session.state(), SessionState::Failed(_)));
        assert!(session.authorization_url().is_none());
    }

    #[test]
    fn test_init_state_without_client_id_fails() {
        let mut session = session();
        session.init_state("outlook.office365.com", "user@outlook.com");
        assert!(matches!(session.state(), SessionState::Failed(msg) if msg.contains("Microsoft")));
    }

    #[test]
    fn test_cancel_returns_to_idle() {
        let mut session = session();
        session.init_state("imap.gmail.com", "user@gmail.com");
        assert_eq!(session.cancel(), OAuthResult::Canceled);
        assert_eq!(session.state(), &SessionState::Idle);
    }

    #[tokio::test]
    async fn test_complete_without_request_fails() {
        let mut session = session();
        let result = session.complete("code", "state").await;
        assert!(matches!(result, OAuthResult::Failure(_)));
    }

    #[tokio::test]
    async fn test_complete_with_empty_code_fails() {
        let mut session = session();
        session.init_state("imap.gmail.com", "user@gmail.com");
        let state = state_of(&session);
        let result = session.complete("   ", &state).await;
        assert!(matches!(result, OAuthResult::Failure(_)));
    }

    #[tokio::test]
    async fn test_state_mismatch_skips_exchange() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .expect(0)
            .create_async()
            .await;
        let mut session = awaiting(&server);

        let result = session.complete("code", "forged").await;
        assert_eq!(
            result,
            OAuthResult::Failure(Error::StateMismatch.to_string())
        );
        assert!(matches!(
            session.state(),
            SessionState::AwaitingAuthorization { .. }
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_redirect_exchanges_code() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_body(mockito::Matcher::UrlEncoded(
                "code".into(),
                "auth-code".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"ya29.token","token_type":"Bearer","expires_in":3599}"#)
            .create_async()
            .await;
        let mut session = awaiting(&server);
        let state = state_of(&session);

        let redirect = format!("http://localhost:8080/?code=auth-code&state={state}");
        let result = session.complete_redirect(&redirect).await;
        mock.assert_async().await;
        assert!(matches!(result, OAuthResult::Success(token) if token.access_token == "ya29.token"));
        assert_eq!(session.state(), &SessionState::Authorized);
    }

    #[tokio::test]
    async fn test_complete_redirect_reports_denial() {
        let mut session = session();
        session.init_state("imap.gmail.com", "user@gmail.com");
        let state = state_of(&session);

        let redirect = format!("http://localhost:8080/?error=access_denied&state={state}");
        let result = session.complete_redirect(&redirect).await;
        assert!(matches!(result, OAuthResult::Failure(msg) if msg.contains("access_denied")));
    }

    #[tokio::test]
    async fn test_rejected_code_keeps_request() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;
        let mut session = awaiting(&server);
        let state = state_of(&session);

        let result = session.complete("stale", &state).await;
        assert!(matches!(result, OAuthResult::Failure(msg) if msg.contains("invalid_grant")));
        assert!(session.authorization_url().is_some());
    }
}
