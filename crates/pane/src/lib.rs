//! Mediated terminal pane for PanePilot.
//!
//! The pane is the single externally-visible execution surface: commands
//! proposed by the model are typed into a secondary tmux pane so the user
//! can watch them run live. All access is serialized behind one lock, so
//! no two operations on the pane are ever in flight concurrently.

pub mod controller;
pub mod multiplexer;

pub use controller::{PaneController, PaneOptions, PaneSession};
pub use multiplexer::{Multiplexer, Tmux};
