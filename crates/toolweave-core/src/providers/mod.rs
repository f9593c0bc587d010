//! Chat completion providers
//!
//! Every real backend goes through the `genai` crate, which handles
//! streaming, provider-specific protocols and tool calling. Providers not
//! native to genai (Azure, OpenRouter, Mistral, Red Hat AI) are routed via
//! genai's `ServiceTargetResolver` using OpenAI-compatible protocols.
//!
//! `MockProvider` is kept for tests.

mod traits;
mod error;
mod genai_adapter;
mod genai_provider;
mod mock;

pub use traits::{ChatResponse, Provider, ProviderModelConfig, StreamChatOptions, StreamResponse};
pub use error::{ProviderError, ProviderResult};
pub use genai_provider::GenaiProvider;
pub use genai_adapter::{is_genai_native, is_genai_supported, ProviderConfig};
pub use mock::{MockConfig, MockMode, MockProvider, MockRequest};

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::logging::Logger;

/// Create a provider for the given provider ID
///
/// Unknown ids get a `GenaiProvider` with the OpenAI adapter so custom
/// OpenAI-compatible endpoints work.
pub fn create_provider(provider_id: &str, logger: Arc<dyn Logger>) -> Arc<dyn Provider> {
    match provider_id.to_lowercase().as_str() {
        "mock" => Arc::new(MockProvider::echo(logger)),
        _ => Arc::new(GenaiProvider::new(provider_id, logger)),
    }
}

/// All built-in provider IDs
pub fn supported_providers() -> Vec<&'static str> {
    vec![
        "openai",
        "anthropic",
        "gemini",
        "ollama",
        "groq",
        "xai",
        "deepseek",
        "cohere",
        "fireworks",
        "together",
        "azure",
        "openrouter",
        "mistral",
        "redhat",
        "mock",
    ]
}

/// Factory creating a provider with the caller's logger
pub type ProviderFactory = Arc<dyn Fn(Arc<dyn Logger>) -> Arc<dyn Provider> + Send + Sync>;

/// String-keyed provider lookup, populated at startup
pub struct ProviderRegistry {
    factories: RwLock<HashMap<String, ProviderFactory>>,
}

impl ProviderRegistry {
    pub fn empty() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
        }
    }

    /// Registry with every entry of [`supported_providers`]
    pub fn with_builtins() -> Self {
        let registry = Self::empty();
        for id in supported_providers() {
            registry.register(id, move |logger| create_provider(id, logger));
        }
        registry
    }

    /// Register or replace a provider factory
    pub fn register<F>(&self, id: &str, factory: F)
    where
        F: Fn(Arc<dyn Logger>) -> Arc<dyn Provider> + Send + Sync + 'static,
    {
        self.factories.write().insert(id.to_lowercase(), Arc::new(factory));
    }

    /// Register an existing instance, shared by every lookup
    pub fn register_instance(&self, id: &str, provider: Arc<dyn Provider>) {
        self.register(id, move |_| Arc::clone(&provider));
    }

    pub fn create(&self, id: &str, logger: Arc<dyn Logger>) -> ProviderResult<Arc<dyn Provider>> {
        let factory = self
            .factories
            .read()
            .get(&id.to_lowercase())
            .cloned()
            .ok_or_else(|| ProviderError::UnknownProvider(id.to_string()))?;
        Ok(factory(logger))
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.factories.read().keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;

    #[test]
    fn test_builtins() {
        let registry = ProviderRegistry::with_builtins();
        let logger: Arc<dyn Logger> = Arc::new(NoOpLogger);

        assert_eq!(registry.create("mock", Arc::clone(&logger)).unwrap().name(), "mock");
        assert_eq!(registry.create("Anthropic", Arc::clone(&logger)).unwrap().name(), "anthropic");
        assert!(matches!(
            registry.create("carrier-pigeon", logger).err(),
            Some(ProviderError::UnknownProvider(_))
        ));
    }

    #[test]
    fn test_register_instance() {
        let registry = ProviderRegistry::empty();
        let mock: Arc<dyn Provider> = Arc::new(MockProvider::fixed("hi", Arc::new(NoOpLogger)));
        registry.register_instance("scripted", Arc::clone(&mock));

        let created = registry.create("scripted", Arc::new(NoOpLogger)).unwrap();
        assert!(Arc::ptr_eq(&created, &mock));
        assert_eq!(registry.ids(), vec!["scripted"]);
    }
}
