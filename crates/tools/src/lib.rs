//! The tool set PanePilot exposes to the model.
//!
//! The set is closed: three tools, modeled as a tagged union so adding one
//! is a compile-time-checked change rather than a string match with a
//! default fallthrough. Names are part of the wire protocol with the model.

pub mod dispatcher;
pub mod kind;
pub mod path_scan;

pub use dispatcher::ToolDispatcher;
pub use kind::{definitions, ToolKind};
