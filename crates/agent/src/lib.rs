//! The streaming turn orchestration for PanePilot.
//!
//! One user input drives one *chain* of model turns:
//!
//! 1. **Append** the user message to the conversation
//! 2. **Stream** a model response keyed on the full message log
//! 3. **Accumulate** deltas into completed content / tool-call / refusal
//!    segments, forwarding visible text to the display sink as it arrives
//! 4. **If a tool call completes**: dispatch it, append the result, and
//!    open a continuation turn so the model can react
//! 5. **Stop** when a turn finishes with no pending tool call
//!
//! The chain is driven iteratively (not recursively) and is bounded by a
//! configurable maximum depth. A single cancellation token covers the
//! whole chain.

pub mod accumulator;
pub mod prompt;
pub mod stream_event;
pub mod turn_runner;

pub use accumulator::{Completion, StreamAccumulator};
pub use prompt::SYSTEM_PROMPT;
pub use stream_event::{AgentStreamEvent, ChannelSink, DisplaySink};
pub use turn_runner::TurnRunner;
