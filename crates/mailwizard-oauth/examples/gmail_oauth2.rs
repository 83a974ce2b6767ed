//! Example: authorize a Gmail mailbox with the onboarding sub-flow
//!
//! ## Prerequisites
//!
//! Register a desktop OAuth client in the Google Cloud console with the
//! redirect URI `http://localhost:8080`, then:
//!
//! ```bash
//! export OAUTH_CLIENT_ID="your-client-id-here"
//! export OAUTH_EMAIL="you@gmail.com"
//! cargo run --example gmail_oauth2
//! ```

use std::env;
use std::io::{self, BufRead, Write};

use mailwizard_oauth::{ClientConfig, OAuthResult, OAuthSession, SessionState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client_id = env::var("OAUTH_CLIENT_ID")?;
    let email = env::var("OAUTH_EMAIL")?;

    let mut session = OAuthSession::new(ClientConfig {
        google_client_id: Some(client_id),
        ..ClientConfig::default()
    })?;
    session.init_state("imap.gmail.com", &email);

    if let SessionState::Failed(reason) = session.state() {
        return Err(reason.clone().into());
    }
    if let Some(url) = session.authorization_url() {
        println!("Visit this URL to authorize access:\n\n{url}\n");
    }

    print!("Paste the URL your browser was redirected to: ");
    io::stdout().flush()?;
    let mut redirect = String::new();
    io::stdin().lock().read_line(&mut redirect)?;

    match session.complete_redirect(&redirect).await {
        OAuthResult::Success(token) => {
            println!("Authorized, token expires at {:?}", token.expires_at);
        }
        other => println!("Not authorized: {other:?}"),
    }

    Ok(())
}
