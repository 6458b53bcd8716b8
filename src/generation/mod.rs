/// Image generation through the external model service
///
/// - `wire.rs` - request/response JSON shapes
/// - `client.rs` - the HTTP client, prompt composition and response parsing

pub mod client;
pub mod wire;

pub use client::GenerationClient;
