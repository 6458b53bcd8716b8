/// State management module
///
/// This module handles all application state, including:
/// - Shared data structures for captured and generated images (data.rs)
/// - The booth flow as a pure state machine (machine.rs)

pub mod data;
pub mod machine;

pub use data::{CapturedImage, EncodedImage, GeneratedResult, ImageOrigin};
pub use machine::{Booth, Effect, Event, Step, Ticket};
