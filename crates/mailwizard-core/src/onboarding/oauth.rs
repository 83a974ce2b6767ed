//! Hook for the nested `OAuth2` sub-flow.

use mailwizard_oauth::OAuthSession;

/// The nested authorization sub-flow, as seen by the wizard.
///
/// The wizard only starts it; the sub-flow reports back through
/// [`Event::OAuthResult`](super::Event::OAuthResult).
pub trait OAuthSubflow: Send {
    /// Prepare authorization for `email_address` on `hostname`.
    fn init_state(&mut self, hostname: &str, email_address: &str);
}

impl OAuthSubflow for OAuthSession {
    fn init_state(&mut self, hostname: &str, email_address: &str) {
        Self::init_state(self, hostname, email_address);
    }
}
