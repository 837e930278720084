//! Hosted chat providers

pub mod openai;

pub use openai::OpenAiClient;
