pub mod providers;

pub use providers::anthropic::AnthropicProvider;
pub use providers::mock::MockProvider;
pub use providers::provider_from_config;
