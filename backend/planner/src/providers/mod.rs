pub mod anthropic;
pub mod mock;

use std::sync::Arc;

use docforge_config::LlmConfig;
use docforge_core::{DocForgeError, LlmProvider};

use self::anthropic::AnthropicProvider;
use self::mock::MockProvider;

/// Build the provider named by `llm.provider`.
pub fn provider_from_config(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, DocForgeError> {
    match config.provider() {
        "anthropic" => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                DocForgeError::ConfigError(
                    "llm.apiKey (or ANTHROPIC_API_KEY) is required for the anthropic provider".into(),
                )
            })?;
            Ok(Arc::new(
                AnthropicProvider::new(api_key)
                    .with_base_url(config.base_url())
                    .with_timeout(config.timeout()),
            ))
        }
        "mock" => Ok(Arc::new(MockProvider::new())),
        other => Err(DocForgeError::UnknownProvider(other.to_string())),
    }
}
