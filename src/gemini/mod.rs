// src/gemini/mod.rs
pub mod client;
pub mod models;
pub mod prompt;

// Re-export the client types most callers need
#[allow(unused_imports)]
pub use client::{GeminiClient, GenerateContent};
