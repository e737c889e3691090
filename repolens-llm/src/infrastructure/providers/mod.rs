//! Gateway provider implementations

pub mod openai;

pub use openai::OpenAiGatewayProvider;
