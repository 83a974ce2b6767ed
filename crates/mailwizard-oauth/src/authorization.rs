//! Authorization Code Flow with PKCE for one mailbox.

use std::collections::HashMap;

use reqwest::Client;
use url::Url;

use crate::error::{Error, Result};
use crate::pkce::{CHALLENGE_METHOD, PkceChallenge, random_token};
use crate::provider::{Provider, ProviderKind};
use crate::token::{ErrorResponse, Token, TokenResponse};

/// A single pending authorization request.
///
/// Holds the PKCE verifier and CSRF state between building the consent URL
/// and exchanging the returned code.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    provider: Provider,
    client_id: String,
    redirect_uri: String,
    login_hint: String,
    pkce: PkceChallenge,
    csrf_state: String,
}

impl AuthorizationRequest {
    /// Starts a request for `login_hint` against `provider`.
    #[must_use]
    pub fn new(
        provider: Provider,
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
        login_hint: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            login_hint: login_hint.into(),
            pkce: PkceChallenge::generate(),
            csrf_state: random_token(16),
        }
    }

    /// Provider this request authorizes against.
    #[must_use]
    pub const fn provider_kind(&self) -> ProviderKind {
        self.provider.kind
    }

    /// Checks the `state` echoed back on redirect against this request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StateMismatch`] if it differs.
    pub fn verify_state(&self, state: &str) -> Result<()> {
        if state == self.csrf_state {
            Ok(())
        } else {
            Err(Error::StateMismatch)
        }
    }

    /// Builds the consent URL the user must visit.
    #[must_use]
    pub fn authorization_url(&self) -> Url {
        let mut url = self.provider.auth_url.clone();

        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("client_id", &self.client_id)
                .append_pair("response_type", "code")
                .append_pair("redirect_uri", &self.redirect_uri)
                .append_pair("scope", &self.provider.scopes.join(" "))
                .append_pair("state", &self.csrf_state)
                .append_pair("login_hint", &self.login_hint)
                .append_pair("code_challenge", self.pkce.challenge())
                .append_pair("code_challenge_method", CHALLENGE_METHOD);

            match self.provider.kind {
                ProviderKind::Google => {
                    pairs
                        .append_pair("access_type", "offline")
                        .append_pair("prompt", "consent");
                }
                ProviderKind::Microsoft => {
                    pairs.append_pair("prompt", "consent");
                }
                ProviderKind::Yahoo => {}
            }
        }

        url
    }

    /// Exchanges the authorization code for a token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects the code.
    pub async fn exchange_code(&self, http_client: &Client, code: &str) -> Result<Token> {
        let mut params = HashMap::new();
        params.insert("grant_type", "authorization_code");
        params.insert("code", code);
        params.insert("client_id", self.client_id.as_str());
        params.insert("redirect_uri", self.redirect_uri.as_str());
        params.insert("code_verifier", self.pkce.verifier());

        let response = http_client
            .post(self.provider.token_url.clone())
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(error) => error.into_error(),
                Err(_) => Error::oauth_error("http_error", status.to_string()),
            });
        }

        let token_response: TokenResponse = response.json().await?;
        Ok(Token::from_response(token_response))
    }
}

/// Code and state carried by a redirect URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    /// Authorization code.
    pub code: String,
    /// CSRF state echoed back by the provider.
    pub state: String,
}

impl Redirect {
    /// Parses the URL the provider redirected the browser to.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed, carries an `error`
    /// parameter, or lacks `code` or `state`.
    pub fn parse(redirect_url: &str) -> Result<Self> {
        let url = Url::parse(redirect_url.trim())?;
        let params: HashMap<_, _> = url.query_pairs().into_owned().collect();

        if let Some(error) = params.get("error") {
            let description = params
                .get("error_description")
                .cloned()
                .unwrap_or_default();
            return Err(Error::oauth_error(error, description));
        }

        let code = params.get("code").ok_or(Error::MissingParameter("code"))?;
        let state = params.get("state").ok_or(Error::MissingParameter("state"))?;
        Ok(Self {
            code: code.clone(),
            state: state.clone(),
        })
    }
}
