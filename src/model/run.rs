//! Model loop: THE serialization point.
//!
//! One thread owns the `Model` and processes messages sequentially, so graph
//! mutation, layout, and highlight transitions never interleave. Snapshot
//! fetching is the caller's job (it is the only slow step and runs off this
//! thread); a complete snapshot crosses the channel as one message, so
//! partial change-sets are impossible. The shared `CancelToken` lets the
//! caller abort an in-flight layout when a newer snapshot supersedes it.

use std::thread::JoinHandle;

use crossbeam::channel::{Receiver, Sender, bounded, unbounded};

use super::runtime::{CycleOutcome, Model};
use crate::config::ModelConfig;
use crate::core::layout::CancelToken;
use crate::core::{CommitId, GraphEvent, RepoSnapshot};
use crate::error::Error;

/// Messages accepted by the model loop.
#[derive(Clone, Debug)]
pub enum ModelMessage {
    /// Apply a fresh repository snapshot as one atomic update cycle.
    Update(RepoSnapshot),
    Select(CommitId),
    Hover { id: CommitId, entering: bool },
    Emphasize(CommitId),
    /// The emphasis animation for this cell finished.
    EmphasisDone(CommitId),
    ClearSelection,
    ResetHighlights,
    Shutdown,
}

/// Run the model loop until shutdown or channel disconnect.
pub fn run_model_loop(
    mut model: Model,
    messages: Receiver<ModelMessage>,
    events: Sender<GraphEvent>,
    cancel: CancelToken,
) {
    loop {
        let message = match messages.recv() {
            Ok(message) => message,
            Err(_) => return,
        };
        let batch = match message {
            ModelMessage::Update(snapshot) => {
                // A cancel aimed at a previous cycle must not kill this one.
                cancel.reset();
                match model.update_cycle(&snapshot, &cancel) {
                    CycleOutcome::Unchanged => {
                        tracing::trace!("snapshot unchanged, skipping cycle");
                        Vec::new()
                    }
                    CycleOutcome::Cancelled => {
                        tracing::debug!("update cycle cancelled");
                        Vec::new()
                    }
                    CycleOutcome::Completed { events, .. } => events,
                }
            }
            ModelMessage::Select(id) => model.select(&id),
            ModelMessage::Hover { id, entering } => model.hover(&id, entering),
            ModelMessage::Emphasize(id) => model.emphasize(&id),
            ModelMessage::EmphasisDone(id) => model.emphasis_done(&id),
            ModelMessage::ClearSelection => model.clear_selection(),
            ModelMessage::ResetHighlights => model.reset_highlights(),
            ModelMessage::Shutdown => return,
        };
        for event in batch {
            if events.send(event).is_err() {
                // Renderer went away; nothing left to serve.
                return;
            }
        }
    }
}

/// A spawned model loop plus its channel endpoints.
pub struct ModelLoop {
    pub messages: Sender<ModelMessage>,
    pub events: Receiver<GraphEvent>,
    pub cancel: CancelToken,
    handle: JoinHandle<()>,
}

impl ModelLoop {
    pub fn spawn(config: &ModelConfig) -> Self {
        let (messages_tx, messages_rx) = bounded(config.channel_capacity);
        let (events_tx, events_rx) = unbounded();
        let cancel = CancelToken::new();
        let loop_cancel = cancel.clone();
        let handle = std::thread::spawn(move || {
            run_model_loop(Model::new(), messages_rx, events_tx, loop_cancel);
        });
        Self {
            messages: messages_tx,
            events: events_rx,
            cancel,
            handle,
        }
    }

    /// Request shutdown and wait for the loop to exit.
    pub fn shutdown(self) -> crate::Result<()> {
        self.messages
            .send(ModelMessage::Shutdown)
            .map_err(|_| Error::ModelStopped)?;
        self.handle.join().map_err(|_| Error::ModelStopped)?;
        Ok(())
    }
}
