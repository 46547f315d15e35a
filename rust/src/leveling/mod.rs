//! Single-person resource leveling.
//!
//! Serializes foreground work one task at a time, most urgent (least CPM slack)
//! first, while background and flexible tasks run alongside without consuming the
//! person's clock.

mod core;
mod state;

pub use core::resource_level;
pub use state::LevelingState;
