//! Turns a submitted question into one finalized assistant message.

use futures::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::client::{SupportBackend, TransportError};
use crate::conversation::{Conversation, Message, MessageUpdate};
use crate::events::{ChatEvent, ResponseMode};
use crate::prompts;
use crate::streaming::Utf8ChunkDecoder;

/// Capacity of the change notification channel
const EVENT_BUFFER: usize = 1024;

/// Why a submission was dropped without touching the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Another question is still being answered
    Busy,
    /// Nothing left after trimming
    EmptyQuestion,
    /// Quick action index out of range
    UnknownQuickAction,
}

/// Result of one call to [`SupportDriver::submit`]
#[derive(Debug)]
pub enum SubmitOutcome {
    Answered,
    /// The apology string replaced the answer
    Failed(TransportError),
    Ignored(IgnoreReason),
}

enum PlaceholderUpdate<'a> {
    Replace(MessageUpdate),
    Extend(&'a str),
}

struct Shared {
    conversation: Mutex<Conversation>,
    busy: AtomicBool,
    events: broadcast::Sender<ChatEvent>,
}

impl Shared {
    fn conversation(&self) -> MutexGuard<'_, Conversation> {
        self.conversation.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, event: ChatEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn update_placeholder(&self, update: PlaceholderUpdate<'_>) {
        let mut conversation = self.conversation();
        let result = match update {
            PlaceholderUpdate::Replace(update) => conversation.replace_last(update),
            PlaceholderUpdate::Extend(text) => conversation.extend_last(text),
        };

        match result {
            Ok(message) => {
                let message = message.clone();
                let index = conversation.len() - 1;
                self.notify(ChatEvent::MessageUpdated { index, message });
            }
            // The conversation was cleared while the answer was in flight.
            Err(error) => {
                debug!(%error, "dropping update for discarded placeholder");
            }
        }
    }
}

/// Holds the busy flag for the lifetime of one exchange
struct BusyGuard<'a> {
    shared: &'a Shared,
    fallback: &'static str,
}

impl<'a> BusyGuard<'a> {
    fn acquire(shared: &'a Shared, fallback: &'static str) -> Option<Self> {
        shared
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        shared.notify(ChatEvent::BusyChanged(true));
        Some(Self { shared, fallback })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        // Only an abandoned exchange leaves its placeholder pending here.
        if self.shared.conversation().pending().is_some() {
            self.shared
                .update_placeholder(PlaceholderUpdate::Replace(MessageUpdate::finalized_with(self.fallback)));
        }
        self.shared.busy.store(false, Ordering::Release);
        self.shared.notify(ChatEvent::BusyChanged(false));
    }
}

/// Conversation controller shared by every front end
pub struct SupportDriver<B> {
    backend: Arc<B>,
    shared: Arc<Shared>,
    mode: ResponseMode,
    quick_actions: Arc<Vec<String>>,
}

impl<B> Clone for SupportDriver<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            shared: Arc::clone(&self.shared),
            mode: self.mode,
            quick_actions: Arc::clone(&self.quick_actions),
        }
    }
}

impl<B: SupportBackend> SupportDriver<B> {
    pub fn new(backend: B, mode: ResponseMode) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            backend: Arc::new(backend),
            shared: Arc::new(Shared {
                conversation: Mutex::new(Conversation::new()),
                busy: AtomicBool::new(false),
                events,
            }),
            mode,
            quick_actions: Arc::new(prompts::default_quick_actions()),
        }
    }

    pub fn with_quick_actions(mut self, quick_actions: Vec<String>) -> Self {
        self.quick_actions = Arc::new(quick_actions);
        self
    }

    pub fn mode(&self) -> ResponseMode {
        self.mode
    }

    pub fn quick_actions(&self) -> &[String] {
        &self.quick_actions
    }

    pub fn is_busy(&self) -> bool {
        self.shared.busy.load(Ordering::Acquire)
    }

    /// Snapshot of the conversation in display order
    pub fn messages(&self) -> Vec<Message> {
        self.shared.conversation().messages().to_vec()
    }

    /// Receive every change to the conversation from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.shared.events.subscribe()
    }

    /// Empty the conversation. An answer still in flight is discarded.
    pub fn clear(&self) {
        let mut conversation = self.shared.conversation();
        conversation.clear();
        self.shared.notify(ChatEvent::Cleared);
        info!("conversation cleared");
    }

    /// Ask one of the configured quick questions
    pub async fn submit_quick_action(&self, index: usize) -> SubmitOutcome {
        let Some(question) = self.quick_actions.get(index).cloned() else {
            debug!(index, "no quick action at index");
            return SubmitOutcome::Ignored(IgnoreReason::UnknownQuickAction);
        };
        self.submit(&question).await
    }

    /// Ask `text` and wait until its answer is finalized
    #[tracing::instrument(skip(self, text), fields(mode = %self.mode))]
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        if self.is_busy() {
            debug!("ignoring submission while busy");
            return SubmitOutcome::Ignored(IgnoreReason::Busy);
        }

        let question = text.trim();
        if question.is_empty() {
            return SubmitOutcome::Ignored(IgnoreReason::EmptyQuestion);
        }

        let fallback = prompts::fallback_message(self.mode);
        let Some(_busy) = BusyGuard::acquire(&self.shared, fallback) else {
            return SubmitOutcome::Ignored(IgnoreReason::Busy);
        };

        self.open_exchange(question);
        info!(question, "question submitted");

        match self.exchange(question).await {
            Ok(()) => {
                info!("answer finalized");
                SubmitOutcome::Answered
            }
            Err(error) => {
                warn!(%error, "support request failed");
                self.shared
                    .update_placeholder(PlaceholderUpdate::Replace(MessageUpdate::finalized_with(fallback)));
                SubmitOutcome::Failed(error)
            }
        }
    }

    /// Append the question and its placeholder under one lock so a clear
    /// never leaves half an exchange behind.
    fn open_exchange(&self, question: &str) {
        let question = Message::user(question);
        let placeholder = Message::placeholder();

        let mut conversation = self.shared.conversation();
        let question_index = conversation.append(question.clone());
        let placeholder_index = conversation.append(placeholder.clone());
        self.shared.notify(ChatEvent::MessageAppended {
            index: question_index,
            message: question,
        });
        self.shared.notify(ChatEvent::MessageAppended {
            index: placeholder_index,
            message: placeholder,
        });
    }

    async fn exchange(&self, question: &str) -> Result<(), TransportError> {
        match self.mode {
            ResponseMode::Single => {
                let answer = self.backend.ask(question).await?;
                self.shared
                    .update_placeholder(PlaceholderUpdate::Replace(MessageUpdate::finalized_with(answer)));
            }
            ResponseMode::Stream => {
                let mut chunks = self.backend.open_stream(question).await?;
                let mut decoder = Utf8ChunkDecoder::new();
                let mut received = 0usize;

                while let Some(chunk) = chunks.next().await {
                    let chunk = chunk?;
                    received += chunk.len();
                    let text = decoder.decode(&chunk);
                    debug!(bytes = chunk.len(), chars = text.chars().count(), "chunk received");
                    if !text.is_empty() {
                        self.shared.update_placeholder(PlaceholderUpdate::Extend(&text));
                    }
                }

                if decoder.has_partial() {
                    warn!("stream ended inside a multi-byte character");
                    let tail = decoder.finish();
                    self.shared.update_placeholder(PlaceholderUpdate::Extend(&tail));
                }
                debug!(received, "stream complete");
                self.shared
                    .update_placeholder(PlaceholderUpdate::Replace(MessageUpdate::finalize()));
            }
        }
        Ok(())
    }
}
