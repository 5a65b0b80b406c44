//! Folding raw stream chunks into completed segments.
//!
//! Providers emit deltas: partial text, partial tool-call fragments keyed
//! by index, partial refusals. Nothing acts on a segment until it is
//! complete, which the model signals with a finish reason (or the stream
//! simply ending).

use std::collections::BTreeMap;
use std::mem;

use panepilot_core::{StreamChunk, ToolCall};

/// A segment that finished accumulating and is ready to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Assistant text, in full.
    Content(String),
    /// A tool call with its id, name, and fully assembled arguments.
    ToolCall(ToolCall),
    /// A refusal, in full.
    Refusal(String),
}

#[derive(Debug, Default)]
struct PartialCall {
    id: String,
    name: String,
    arguments: String,
}

/// Accumulates one assistant turn's worth of deltas.
///
/// Feed every chunk in arrival order; completions come back only on the
/// chunk that carries a finish reason or the terminal `done` marker.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    content: String,
    refusal: String,
    calls: BTreeMap<u32, PartialCall>,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb one chunk. Returns the segments completed by this chunk,
    /// content first, then tool calls in index order.
    pub fn feed(&mut self, chunk: &StreamChunk) -> Vec<Completion> {
        if let Some(delta) = &chunk.content {
            self.content.push_str(delta);
        }
        if let Some(delta) = &chunk.refusal {
            self.refusal.push_str(delta);
        }
        for fragment in &chunk.tool_calls {
            let partial = self.calls.entry(fragment.index).or_default();
            if let Some(id) = &fragment.id {
                partial.id = id.clone();
            }
            if let Some(name) = &fragment.name {
                partial.name = name.clone();
            }
            if let Some(arguments) = &fragment.arguments {
                partial.arguments.push_str(arguments);
            }
        }

        if chunk.finish_reason.is_some() || chunk.done {
            self.flush()
        } else {
            Vec::new()
        }
    }

    fn flush(&mut self) -> Vec<Completion> {
        let mut completed = Vec::new();

        if !self.content.is_empty() {
            completed.push(Completion::Content(mem::take(&mut self.content)));
        }
        if !self.refusal.is_empty() {
            completed.push(Completion::Refusal(mem::take(&mut self.refusal)));
        }
        for (_, partial) in mem::take(&mut self.calls) {
            completed.push(Completion::ToolCall(ToolCall {
                id: partial.id,
                name: partial.name,
                arguments: partial.arguments,
            }));
        }

        completed
    }
}
