//! Depth tier resolution
//!
//! Maps a [`DepthLevel`] to concrete run settings: context character
//! budget, model id, and prompt style. Runtime overrides come from the
//! config provider under `depth_<level>_context` / `depth_<level>_model`
//! keys; anything missing or malformed falls back to the builtin tier
//! defaults. Resolution never fails a run.

use std::sync::Arc;

use tracing::warn;

use crate::domain::value_objects::{DepthLevel, PromptStyle};
use crate::infrastructure::config_provider::ConfigProvider;

/// Concrete settings one depth tier resolves to.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthSettings {
    /// Cap applied to the assembled repository context, in characters
    pub max_context_chars: usize,
    /// Model id passed to the gateway
    pub model: String,
    pub prompt_style: PromptStyle,
}

/// Resolves depth tiers against runtime config with builtin fallbacks.
pub struct DepthResolver {
    config_provider: Arc<dyn ConfigProvider>,
    economical_model: String,
    standard_model: String,
}

impl DepthResolver {
    pub fn new(
        config_provider: Arc<dyn ConfigProvider>,
        economical_model: impl Into<String>,
        standard_model: impl Into<String>,
    ) -> Self {
        Self {
            config_provider,
            economical_model: economical_model.into(),
            standard_model: standard_model.into(),
        }
    }

    fn default_settings(&self, depth: DepthLevel) -> DepthSettings {
        match depth {
            DepthLevel::Critical => DepthSettings {
                max_context_chars: 8_000,
                model: self.economical_model.clone(),
                prompt_style: PromptStyle::Concise,
            },
            DepthLevel::Balanced => DepthSettings {
                max_context_chars: 20_000,
                model: self.economical_model.clone(),
                prompt_style: PromptStyle::Moderate,
            },
            DepthLevel::Complete => DepthSettings {
                max_context_chars: 40_000,
                model: self.standard_model.clone(),
                prompt_style: PromptStyle::Detailed,
            },
        }
    }

    /// Resolve one depth tier. Infallible; override lookups degrade to the
    /// builtin defaults with a warning.
    pub async fn resolve(&self, depth: DepthLevel) -> DepthSettings {
        let mut settings = self.default_settings(depth);

        let context_key = format!("depth_{}_context", depth);
        match self.config_provider.value(&context_key).await {
            Ok(Some(raw)) => match raw.parse::<usize>() {
                Ok(chars) if chars > 0 => settings.max_context_chars = chars,
                _ => {
                    warn!(key = %context_key, value = %raw, "Ignoring malformed context override");
                }
            },
            Ok(None) => {}
            Err(e) => {
                warn!(key = %context_key, error = %e, "Config provider unavailable, using tier defaults");
            }
        }

        let model_key = format!("depth_{}_model", depth);
        match self.config_provider.value(&model_key).await {
            Ok(Some(model)) if !model.trim().is_empty() => settings.model = model,
            Ok(_) => {}
            Err(e) => {
                warn!(key = %model_key, error = %e, "Config provider unavailable, using tier defaults");
            }
        }

        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config_provider::InMemoryConfigProvider;

    fn resolver(provider: Arc<InMemoryConfigProvider>) -> DepthResolver {
        DepthResolver::new(provider, "gpt-4o-mini", "gpt-4o")
    }

    #[tokio::test]
    async fn test_builtin_tiers() {
        let resolver = resolver(Arc::new(InMemoryConfigProvider::new()));

        let critical = resolver.resolve(DepthLevel::Critical).await;
        assert_eq!(critical.max_context_chars, 8_000);
        assert_eq!(critical.model, "gpt-4o-mini");
        assert_eq!(critical.prompt_style, PromptStyle::Concise);

        let balanced = resolver.resolve(DepthLevel::Balanced).await;
        assert_eq!(balanced.max_context_chars, 20_000);
        assert_eq!(balanced.model, "gpt-4o-mini");

        let complete = resolver.resolve(DepthLevel::Complete).await;
        assert_eq!(complete.max_context_chars, 40_000);
        assert_eq!(complete.model, "gpt-4o");
        assert_eq!(complete.prompt_style, PromptStyle::Detailed);
    }

    #[tokio::test]
    async fn test_overrides_apply() {
        let provider = Arc::new(InMemoryConfigProvider::new());
        provider.set_value("depth_balanced_context", "25000");
        provider.set_value("depth_balanced_model", "gpt-4.1-mini");
        let resolver = resolver(provider);

        let balanced = resolver.resolve(DepthLevel::Balanced).await;
        assert_eq!(balanced.max_context_chars, 25_000);
        assert_eq!(balanced.model, "gpt-4.1-mini");
        // Style is not overridable
        assert_eq!(balanced.prompt_style, PromptStyle::Moderate);
    }

    #[tokio::test]
    async fn test_malformed_override_falls_back() {
        let provider = Arc::new(InMemoryConfigProvider::new());
        provider.set_value("depth_critical_context", "lots");
        provider.set_value("depth_critical_model", "  ");
        let resolver = resolver(provider);

        let critical = resolver.resolve(DepthLevel::Critical).await;
        assert_eq!(critical.max_context_chars, 8_000);
        assert_eq!(critical.model, "gpt-4o-mini");
    }
}
