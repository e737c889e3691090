//! LLM infrastructure: gateway provider and retrying invoker

pub mod invoker;
pub mod providers;
