//! Providers - the boundary to the remote generative model
//!
//! `ResponseService` is the single remote call; `GeminiClient` implements it
//! over HTTP and `ResponseAdapter` turns every outcome into renderable text.

pub mod adapter;
pub mod gemini;
pub mod service;

pub use adapter::ResponseAdapter;
pub use gemini::GeminiClient;
pub use service::{ContentPart, GenerateRequest, GenerationConfig, ResponseService, UnconfiguredService};
