//! Deckhand cloud provider configuration
//!
//! Persists the provider map (`~/.deckhand/providers.yaml`) used to
//! reach hosted Deckhand providers. The reserved default provider's
//! host is fixed by the system: it is re-derived on every load and
//! stripped on every save, so the file never pins it.

pub mod error;
pub mod provider;

pub use error::{ProviderError, Result};
pub use provider::{
    DEFAULT_PROVIDER_HOST, DEFAULT_PROVIDER_NAME, Provider, ProviderConfig, ProviderStore,
    default_provider,
};
