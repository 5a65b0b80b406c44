//! The closed set of callable tools.

use panepilot_core::provider::ToolDefinition;

/// Every tool the model may invoke. The names are wire protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    /// Resolve whether a command exists on the user's machine.
    CheckCommand,
    /// Run a command in the visible pane and capture its output.
    ExecuteCommand,
    /// Search executables on the search path by substring.
    GetAvailableCommands,
}

impl ToolKind {
    pub const ALL: [ToolKind; 3] = [
        ToolKind::CheckCommand,
        ToolKind::ExecuteCommand,
        ToolKind::GetAvailableCommands,
    ];

    /// The wire name the model uses to invoke this tool.
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::CheckCommand => "checkCommand",
            ToolKind::ExecuteCommand => "executeCommand",
            ToolKind::GetAvailableCommands => "getAvailableCommands",
        }
    }

    /// Resolve a wire name back to a tool, if it is one of ours.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    fn description(&self) -> &'static str {
        match self {
            ToolKind::CheckCommand => {
                "Check if a command exists on the user's machine. Returns \"true\" or \"false\"."
            }
            ToolKind::ExecuteCommand => {
                "Execute the command on the user's machine, in the visible terminal pane. Returns the captured output or an error."
            }
            ToolKind::GetAvailableCommands => {
                "Search commands available on the user's machine by substring. Returns matching command names or an error."
            }
        }
    }

    /// The definition sent to the LLM. Every tool takes a single required
    /// string field `cmd`.
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "cmd": { "type": "string" }
                },
                "required": ["cmd"]
            }),
        }
    }
}

/// All tool definitions, for sending with every provider request.
pub fn definitions() -> Vec<ToolDefinition> {
    ToolKind::ALL.iter().map(|k| k.definition()).collect()
}
