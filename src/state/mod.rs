//! State module for tracking walk progress
//!
//! - `WalkState`: the state machine one listing walk moves through

mod walk_state;

pub use walk_state::WalkState;
