//! Local embedding runtime shared by the claim and topic stages.

mod provider;

pub use provider::EmbeddingProvider;
