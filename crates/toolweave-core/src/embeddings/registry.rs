//! String-keyed lookup of embedding generators

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::traits::{EmbeddingGenerator, EmbeddingResolver};

/// Factory creating a generator on demand
pub type EmbeddingFactory = Arc<dyn Fn() -> Arc<dyn EmbeddingGenerator> + Send + Sync>;

/// Registry of embedding generators keyed by chat provider and connection
///
/// Keys are `"<provider>/<connection>"` or just `"<provider>"`. Lookups try
/// the connection-specific key first and fall back to the provider key.
#[derive(Default)]
pub struct EmbeddingRegistry {
    factories: RwLock<HashMap<String, EmbeddingFactory>>,
}

fn key(provider_name: &str, connection_name: Option<&str>) -> String {
    match connection_name {
        Some(connection) => format!("{}/{}", provider_name.to_lowercase(), connection),
        None => provider_name.to_lowercase(),
    }
}

impl EmbeddingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for every connection of a provider
    pub fn register<F>(&self, provider_name: &str, factory: F)
    where
        F: Fn() -> Arc<dyn EmbeddingGenerator> + Send + Sync + 'static,
    {
        self.factories.write().insert(key(provider_name, None), Arc::new(factory));
    }

    /// Register a factory for one provider connection
    pub fn register_connection<F>(&self, provider_name: &str, connection_name: &str, factory: F)
    where
        F: Fn() -> Arc<dyn EmbeddingGenerator> + Send + Sync + 'static,
    {
        self.factories
            .write()
            .insert(key(provider_name, Some(connection_name)), Arc::new(factory));
    }

    /// Register an existing generator instance
    pub fn register_instance(&self, provider_name: &str, generator: Arc<dyn EmbeddingGenerator>) {
        self.register(provider_name, move || Arc::clone(&generator));
    }

    pub fn unregister(&self, provider_name: &str) -> bool {
        self.factories.write().remove(&key(provider_name, None)).is_some()
    }
}

impl EmbeddingResolver for EmbeddingRegistry {
    fn resolve(&self, provider_name: &str, connection_name: Option<&str>) -> Option<Arc<dyn EmbeddingGenerator>> {
        let factories = self.factories.read();
        let factory = connection_name
            .and_then(|c| factories.get(&key(provider_name, Some(c))))
            .or_else(|| factories.get(&key(provider_name, None)))?;
        Some(factory())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::{EmbeddingResult, EmbeddingGenerator};
    use crate::types::CancellationToken;
    use async_trait::async_trait;

    struct Named(&'static str);

    #[async_trait]
    impl EmbeddingGenerator for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn embed(&self, texts: &[String], _cancel: &CancellationToken) -> EmbeddingResult<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0]).collect())
        }
    }

    #[test]
    fn test_connection_key_wins() {
        let registry = EmbeddingRegistry::new();
        registry.register("OpenAI", || Arc::new(Named("shared")));
        registry.register_connection("openai", "eu", || Arc::new(Named("eu")));

        assert_eq!(registry.resolve("openai", Some("eu")).unwrap().name(), "eu");
        assert_eq!(registry.resolve("openai", Some("us")).unwrap().name(), "shared");
        assert_eq!(registry.resolve("openai", None).unwrap().name(), "shared");
    }

    #[test]
    fn test_absent_provider() {
        let registry = EmbeddingRegistry::new();
        assert!(registry.resolve("anthropic", None).is_none());

        registry.register_instance("ollama", Arc::new(Named("nomic")));
        assert!(registry.unregister("ollama"));
        assert!(registry.resolve("ollama", None).is_none());
    }
}
