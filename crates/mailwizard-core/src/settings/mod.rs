//! Server settings model and classification.

mod classifier;
mod model;

pub use classifier::{Classification, classify};
pub use model::{
    AuthenticationType, ConnectionSecurity, DiscoveredSettings, IncomingProtocolType,
    IncomingServerSettings, OutgoingServerSettings, ServerSettings,
};
