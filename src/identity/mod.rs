pub mod base;
pub mod http_provider;

// Re-export from base.rs so we can do "use crate::identity::*;"
pub use base::*;
pub use http_provider::HttpIdentityProvider;
