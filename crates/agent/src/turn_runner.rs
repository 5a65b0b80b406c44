//! The turn runner: drives one user input through a bounded chain of
//! model turns and tool dispatches.

use std::sync::Arc;

use panepilot_core::{
    Conversation, Error, Message, Provider, ProviderError, ProviderRequest, Result, ToolDefinition,
};
use panepilot_tools::ToolDispatcher;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::accumulator::{Completion, StreamAccumulator};
use crate::stream_event::{AgentStreamEvent, DisplaySink};

/// Drives conversations against a provider, dispatching tool calls as
/// they complete.
///
/// One runner serves the whole session; each `run` call handles one user
/// input and appends everything it produces to the conversation.
pub struct TurnRunner {
    provider: Arc<dyn Provider>,
    dispatcher: ToolDispatcher,
    sink: Arc<dyn DisplaySink>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    max_chain_depth: u32,
}

impl TurnRunner {
    pub fn new(
        provider: Arc<dyn Provider>,
        dispatcher: ToolDispatcher,
        sink: Arc<dyn DisplaySink>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            dispatcher,
            sink,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            max_chain_depth: 16,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Bound on continuation turns per user input. Exceeding it fails the
    /// chain rather than looping forever.
    pub fn with_max_chain_depth(mut self, max_chain_depth: u32) -> Self {
        self.max_chain_depth = max_chain_depth;
        self
    }

    /// Run one full chain for a user input.
    ///
    /// Appends the user message, then streams model turns until a turn
    /// completes without dispatching a tool. Everything appended before a
    /// failure stays in the conversation.
    pub async fn run(
        &self,
        conversation: &mut Conversation,
        input: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        conversation.push(Message::user(input));

        let result = self.run_chain(conversation, cancel).await;
        match &result {
            Ok((turns, tool_calls)) => {
                info!(turns, tool_calls, "Chain finished");
                self.sink.push(AgentStreamEvent::Done {
                    turns: *turns,
                    tool_calls: *tool_calls,
                });
            }
            Err(e) => {
                warn!(error = %e, "Chain failed");
                self.sink.push(AgentStreamEvent::Error {
                    message: e.to_string(),
                });
            }
        }
        result.map(|_| ())
    }

    async fn run_chain(
        &self,
        conversation: &mut Conversation,
        cancel: &CancellationToken,
    ) -> Result<(u32, u32)> {
        let tools = panepilot_tools::definitions();
        let mut turns = 0u32;
        let mut tool_calls = 0u32;

        loop {
            if turns == self.max_chain_depth {
                return Err(Error::ChainDepthExceeded {
                    max_depth: self.max_chain_depth,
                });
            }
            turns += 1;

            let dispatched = self
                .run_turn(conversation, &tools, cancel, &mut tool_calls)
                .await?;
            if !dispatched {
                return Ok((turns, tool_calls));
            }
            // A tool ran this turn; open a continuation turn so the model
            // can react to the result.
            debug!(turn = turns, "Continuing chain after tool dispatch");
        }
    }

    /// Stream one model turn. Returns whether a tool was dispatched, which
    /// means the chain needs a continuation turn.
    async fn run_turn(
        &self,
        conversation: &mut Conversation,
        tools: &[ToolDefinition],
        cancel: &CancellationToken,
        tool_calls: &mut u32,
    ) -> Result<bool> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: conversation.messages.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: tools.to_vec(),
        };

        let mut rx = self.provider.stream(request).await?;
        let mut accumulator = StreamAccumulator::new();
        let mut dispatched = false;

        loop {
            let item = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Turn cancelled mid-stream");
                    return Err(ProviderError::Cancelled.into());
                }
                item = rx.recv() => item,
            };
            let Some(chunk) = item.transpose()? else {
                break;
            };

            if let Some(delta) = &chunk.content {
                self.sink.push(AgentStreamEvent::Delta {
                    content: delta.clone(),
                });
            }
            let done = chunk.done;

            for completion in accumulator.feed(&chunk) {
                match completion {
                    Completion::Content(text) => {
                        conversation.push(Message::assistant(text));
                    }
                    Completion::Refusal(text) => {
                        warn!(refusal = %text, "Model refused the request");
                        self.sink
                            .push(AgentStreamEvent::Refusal { content: text });
                    }
                    Completion::ToolCall(call) => {
                        // The declaring assistant message must precede the
                        // tool result in the log.
                        conversation
                            .push(Message::assistant_with_tools("", vec![call.clone()]));
                        self.sink.push(AgentStreamEvent::ToolCall {
                            id: call.id.clone(),
                            name: call.name.clone(),
                            arguments: call.arguments.clone(),
                        });

                        if cancel.is_cancelled() {
                            return Err(ProviderError::Cancelled.into());
                        }
                        let result = self.dispatcher.dispatch(&call).await;
                        self.sink.push(AgentStreamEvent::ToolResult {
                            id: call.id.clone(),
                            output: result.content.clone(),
                        });
                        conversation.push(result);

                        *tool_calls += 1;
                        dispatched = true;
                    }
                }
            }

            if done {
                break;
            }
        }

        Ok(dispatched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use panepilot_core::{PaneError, Role, StreamChunk, ToolCallDelta};
    use panepilot_pane::{Multiplexer, PaneController, PaneOptions};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::mpsc;

    /// A provider that replays one scripted chunk sequence per turn.
    struct ScriptedProvider {
        turns: Mutex<VecDeque<Vec<StreamChunk>>>,
    }

    impl ScriptedProvider {
        fn new(turns: Vec<Vec<StreamChunk>>) -> Arc<Self> {
            Arc::new(Self {
                turns: Mutex::new(turns.into()),
            })
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn stream(
            &self,
            _request: ProviderRequest,
        ) -> std::result::Result<
            mpsc::Receiver<std::result::Result<StreamChunk, ProviderError>>,
            ProviderError,
        > {
            let chunks = self
                .turns
                .lock()
                .unwrap()
                .pop_front()
                .expect("provider asked for more turns than scripted");
            let (tx, rx) = mpsc::channel(16);
            tokio::spawn(async move {
                for chunk in chunks {
                    if tx.send(Ok(chunk)).await.is_err() {
                        return;
                    }
                }
            });
            Ok(rx)
        }
    }

    struct RecordingSink(Mutex<Vec<AgentStreamEvent>>);

    impl RecordingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self(Mutex::new(Vec::new())))
        }

        fn events(&self) -> Vec<AgentStreamEvent> {
            self.0.lock().unwrap().clone()
        }
    }

    impl DisplaySink for RecordingSink {
        fn push(&self, event: AgentStreamEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    struct NullMultiplexer;

    #[async_trait]
    impl Multiplexer for NullMultiplexer {
        async fn current_session(&self) -> std::result::Result<String, PaneError> {
            Ok("main".into())
        }
        async fn split_window(&self) -> std::result::Result<String, PaneError> {
            Ok("%1".into())
        }
        async fn send_line(&self, _pane: &str, _line: &str) -> std::result::Result<(), PaneError> {
            Ok(())
        }
        async fn capture_pane(&self, _pane: &str) -> std::result::Result<String, PaneError> {
            Ok("captured output".into())
        }
        async fn kill_pane(&self, _pane: &str) -> std::result::Result<(), PaneError> {
            Ok(())
        }
    }

    async fn dispatcher() -> ToolDispatcher {
        let pane = PaneController::create(
            Arc::new(NullMultiplexer),
            PaneOptions {
                settle: Duration::from_millis(1),
                clear_before_execute: false,
            },
        )
        .await
        .unwrap();
        ToolDispatcher::new(Arc::new(pane))
    }

    fn text_turn(text: &str) -> Vec<StreamChunk> {
        vec![
            StreamChunk {
                content: Some(text.into()),
                ..Default::default()
            },
            StreamChunk {
                finish_reason: Some("stop".into()),
                ..Default::default()
            },
            StreamChunk {
                done: true,
                ..Default::default()
            },
        ]
    }

    fn tool_turn(id: &str, name: &str, arguments: &str) -> Vec<StreamChunk> {
        vec![
            StreamChunk {
                tool_calls: vec![ToolCallDelta {
                    index: 0,
                    id: Some(id.into()),
                    name: Some(name.into()),
                    arguments: Some(arguments.into()),
                }],
                ..Default::default()
            },
            StreamChunk {
                finish_reason: Some("tool_calls".into()),
                ..Default::default()
            },
            StreamChunk {
                done: true,
                ..Default::default()
            },
        ]
    }

    fn runner(
        provider: Arc<ScriptedProvider>,
        dispatcher: ToolDispatcher,
        sink: Arc<RecordingSink>,
    ) -> TurnRunner {
        TurnRunner::new(provider, dispatcher, sink, "test-model")
    }

    #[tokio::test]
    async fn plain_text_turn_appends_assistant_message() {
        let provider = ScriptedProvider::new(vec![text_turn("Hello there")]);
        let sink = RecordingSink::new();
        let runner = runner(provider, dispatcher().await, sink.clone());

        let mut conversation = Conversation::new("sys");
        runner
            .run(&mut conversation, "hi", &CancellationToken::new())
            .await
            .unwrap();

        let roles: Vec<_> = conversation.messages.iter().map(|m| &m.role).collect();
        assert_eq!(roles, vec![&Role::System, &Role::User, &Role::Assistant]);
        assert_eq!(conversation.messages[2].content, "Hello there");

        let events = sink.events();
        assert!(matches!(events[0], AgentStreamEvent::Delta { .. }));
        assert!(matches!(events.last(), Some(AgentStreamEvent::Done { turns: 1, tool_calls: 0 })));
    }

    #[tokio::test]
    async fn tool_call_dispatches_and_chains_a_continuation_turn() {
        let provider = ScriptedProvider::new(vec![
            tool_turn("call_1", "executeCommand", r#"{"cmd":"ls"}"#),
            text_turn("Here are your files."),
        ]);
        let sink = RecordingSink::new();
        let runner = runner(provider, dispatcher().await, sink.clone());

        let mut conversation = Conversation::new("sys");
        runner
            .run(&mut conversation, "list files", &CancellationToken::new())
            .await
            .unwrap();

        // system, user, assistant(declares call), tool(result), assistant(text)
        let roles: Vec<_> = conversation.messages.iter().map(|m| &m.role).collect();
        assert_eq!(
            roles,
            vec![
                &Role::System,
                &Role::User,
                &Role::Assistant,
                &Role::Tool,
                &Role::Assistant
            ]
        );
        assert_eq!(conversation.messages[2].tool_calls.len(), 1);
        assert_eq!(
            conversation.messages[3].tool_call_id.as_deref(),
            Some("call_1")
        );
        assert_eq!(conversation.messages[3].content, "captured output");
        assert_eq!(conversation.messages[4].content, "Here are your files.");
    }

    #[tokio::test]
    async fn every_tool_message_is_preceded_by_its_declaring_assistant_message() {
        let provider = ScriptedProvider::new(vec![
            tool_turn("call_1", "checkCommand", r#"{"cmd":"htop"}"#),
            tool_turn("call_2", "executeCommand", r#"{"cmd":"htop"}"#),
            text_turn("Done."),
        ]);
        let sink = RecordingSink::new();
        let runner = runner(provider, dispatcher().await, sink.clone());

        let mut conversation = Conversation::new("sys");
        runner
            .run(&mut conversation, "run htop", &CancellationToken::new())
            .await
            .unwrap();

        for (i, message) in conversation.messages.iter().enumerate() {
            if message.role == Role::Tool {
                let prev = &conversation.messages[i - 1];
                assert_eq!(prev.role, Role::Assistant);
                assert_eq!(
                    prev.tool_calls[0].id,
                    message.tool_call_id.clone().unwrap()
                );
            }
        }
        assert!(matches!(
            sink.events().last(),
            Some(AgentStreamEvent::Done { turns: 3, tool_calls: 2 })
        ));
    }

    #[tokio::test]
    async fn unknown_tool_yields_placeholder_and_chain_continues() {
        let provider = ScriptedProvider::new(vec![
            tool_turn("call_1", "rebootMachine", r#"{"cmd":"x"}"#),
            text_turn("I do not have that tool."),
        ]);
        let sink = RecordingSink::new();
        let runner = runner(provider, dispatcher().await, sink.clone());

        let mut conversation = Conversation::new("sys");
        runner
            .run(&mut conversation, "reboot", &CancellationToken::new())
            .await
            .unwrap();

        let tool_msg = conversation
            .messages
            .iter()
            .find(|m| m.role == Role::Tool)
            .unwrap();
        assert_eq!(tool_msg.content, "no tool named rebootMachine");
    }

    #[tokio::test]
    async fn system_prompt_is_never_mutated_across_a_chain() {
        let provider = ScriptedProvider::new(vec![
            tool_turn("call_1", "checkCommand", r#"{"cmd":"ls"}"#),
            text_turn("ok"),
        ]);
        let sink = RecordingSink::new();
        let runner = runner(provider, dispatcher().await, sink.clone());

        let mut conversation = Conversation::new("the one prompt");
        runner
            .run(&mut conversation, "go", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(conversation.messages[0].role, Role::System);
        assert_eq!(conversation.system_prompt(), "the one prompt");
        assert_eq!(
            conversation
                .messages
                .iter()
                .filter(|m| m.role == Role::System)
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn chain_depth_bound_fails_closed() {
        // Every turn requests another tool call; the chain must stop.
        let turns: Vec<_> = (0..8)
            .map(|i| tool_turn(&format!("call_{i}"), "checkCommand", r#"{"cmd":"ls"}"#))
            .collect();
        let provider = ScriptedProvider::new(turns);
        let sink = RecordingSink::new();
        let runner =
            runner(provider, dispatcher().await, sink.clone()).with_max_chain_depth(3);

        let mut conversation = Conversation::new("sys");
        let err = runner
            .run(&mut conversation, "loop", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ChainDepthExceeded { max_depth: 3 }));
        assert!(matches!(
            sink.events().last(),
            Some(AgentStreamEvent::Error { .. })
        ));
        // Three turns' worth of appends survive the failure.
        assert_eq!(
            conversation
                .messages
                .iter()
                .filter(|m| m.role == Role::Tool)
                .count(),
            3
        );
    }

    #[tokio::test]
    async fn cancellation_stops_the_chain_before_dispatch() {
        let provider = ScriptedProvider::new(vec![tool_turn(
            "call_1",
            "executeCommand",
            r#"{"cmd":"ls"}"#,
        )]);
        let sink = RecordingSink::new();
        let runner = runner(provider, dispatcher().await, sink.clone());

        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut conversation = Conversation::new("sys");
        let err = runner
            .run(&mut conversation, "list", &cancel)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Provider(ProviderError::Cancelled)
        ));
        // Nothing was dispatched and no tool message was appended.
        assert!(conversation.messages.iter().all(|m| m.role != Role::Tool));
    }

    #[tokio::test]
    async fn provider_stream_error_fails_the_chain() {
        struct FailingProvider;

        #[async_trait]
        impl Provider for FailingProvider {
            fn name(&self) -> &str {
                "failing"
            }
            async fn stream(
                &self,
                _request: ProviderRequest,
            ) -> std::result::Result<
                mpsc::Receiver<std::result::Result<StreamChunk, ProviderError>>,
                ProviderError,
            > {
                let (tx, rx) = mpsc::channel(1);
                tokio::spawn(async move {
                    let _ = tx
                        .send(Err(ProviderError::StreamInterrupted(
                            "connection reset".into(),
                        )))
                        .await;
                });
                Ok(rx)
            }
        }

        let sink = RecordingSink::new();
        let runner = TurnRunner::new(
            Arc::new(FailingProvider),
            dispatcher().await,
            sink.clone(),
            "test-model",
        );

        let mut conversation = Conversation::new("sys");
        let err = runner
            .run(&mut conversation, "hi", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Provider(ProviderError::StreamInterrupted(_))
        ));
        assert!(matches!(
            sink.events().last(),
            Some(AgentStreamEvent::Error { .. })
        ));
    }
}
