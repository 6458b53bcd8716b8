/// Presentation layer
///
/// - `views.rs` - one view per booth step
/// - `scene_card.rs` - selectable era cards
/// - `loader.rs` - animated canvas spinner

pub mod loader;
pub mod scene_card;
pub mod views;
