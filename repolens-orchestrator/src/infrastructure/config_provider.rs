//! Runtime configuration provider
//!
//! Depth settings and prompt templates are operator-editable at runtime,
//! so they come from this trait rather than the static file config. Both
//! resolvers treat provider failures as "no override" and fall back to
//! builtin defaults; the provider can never fail an analysis run.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::AnalysisType;

/// An operator-managed prompt template for one analysis type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub system_prompt: String,
    /// User prompt with `{{variable}}` placeholders
    pub user_prompt_template: String,
    pub is_active: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigProviderError {
    #[error("Configuration source unavailable: {0}")]
    Unavailable(String),
}

/// Read access to runtime configuration values and prompt templates.
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// Look up a scalar setting by key (e.g. `depth_balanced_context`).
    async fn value(&self, key: &str) -> Result<Option<String>, ConfigProviderError>;

    /// The active template for an analysis type, if one is configured.
    async fn active_template(
        &self,
        analysis_type: AnalysisType,
    ) -> Result<Option<PromptTemplate>, ConfigProviderError>;
}

/// In-process provider; the default when no external config source is wired.
#[derive(Default)]
pub struct InMemoryConfigProvider {
    values: RwLock<HashMap<String, String>>,
    templates: RwLock<HashMap<AnalysisType, PromptTemplate>>,
}

impl InMemoryConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_value(&self, key: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut values) = self.values.write() {
            values.insert(key.into(), value.into());
        }
    }

    pub fn set_template(&self, analysis_type: AnalysisType, template: PromptTemplate) {
        if let Ok(mut templates) = self.templates.write() {
            templates.insert(analysis_type, template);
        }
    }
}

#[async_trait]
impl ConfigProvider for InMemoryConfigProvider {
    async fn value(&self, key: &str) -> Result<Option<String>, ConfigProviderError> {
        let values = self
            .values
            .read()
            .map_err(|_| ConfigProviderError::Unavailable("values lock poisoned".into()))?;
        Ok(values.get(key).cloned())
    }

    async fn active_template(
        &self,
        analysis_type: AnalysisType,
    ) -> Result<Option<PromptTemplate>, ConfigProviderError> {
        let templates = self
            .templates
            .read()
            .map_err(|_| ConfigProviderError::Unavailable("templates lock poisoned".into()))?;
        Ok(templates
            .get(&analysis_type)
            .filter(|t| t.is_active)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_inactive_template_is_invisible() {
        let provider = InMemoryConfigProvider::new();
        provider.set_template(
            AnalysisType::Prd,
            PromptTemplate {
                system_prompt: "sys".into(),
                user_prompt_template: "user".into(),
                is_active: false,
            },
        );

        assert!(provider
            .active_template(AnalysisType::Prd)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_value_roundtrip() {
        let provider = InMemoryConfigProvider::new();
        provider.set_value("depth_critical_context", "9000");
        assert_eq!(
            provider.value("depth_critical_context").await.unwrap(),
            Some("9000".into())
        );
        assert!(provider.value("missing").await.unwrap().is_none());
    }
}
