//! Event types for the Blimari event system
//!
//! Provides the `TrailEvent` definitions and the `EventBus` used to broadcast
//! pipeline progress to connected SSE clients.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Pipeline step identifiers, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrailStep {
    /// Fan out to the configured content sources
    Search,
    /// AI relevance filter over the discovered list
    Filter,
    /// AI grouping/ordering into trail sections
    Organize,
    /// Persist the finished learning path
    Finalize,
}

impl TrailStep {
    /// All steps in execution order
    pub const ALL: [TrailStep; 4] = [
        TrailStep::Search,
        TrailStep::Filter,
        TrailStep::Organize,
        TrailStep::Finalize,
    ];
}

/// Events broadcast while a trail-generation session runs
///
/// Serialized with a `type` tag for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TrailEvent {
    /// A trail-generation session left the idle state
    SessionStarted {
        session_id: Uuid,
        topic: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A pipeline step began processing
    StepStarted {
        session_id: Uuid,
        step: TrailStep,
    },

    /// A pipeline step finished (including degraded completions)
    StepCompleted {
        session_id: Uuid,
        step: TrailStep,
        /// Number of content items flowing out of the step
        item_count: usize,
    },

    /// Discovery produced the normalized content list
    ContentDiscovered {
        session_id: Uuid,
        count: usize,
    },

    /// The whole pipeline reached its terminal state
    SessionCompleted {
        session_id: Uuid,
        /// Persisted path id, None when finalize skipped (no content)
        learning_path_id: Option<Uuid>,
    },

    /// Persistence failed; the session ended in the failed state
    SessionFailed {
        session_id: Uuid,
        error: String,
    },
}

/// Broadcast bus for trail events
///
/// Cloning is cheap; all clones share the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<TrailEvent>,
}

impl EventBus {
    /// Create a new bus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<TrailEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Having no subscribers is not an error: progress events are advisory
    /// and the pipeline must not care whether anyone is listening.
    pub fn emit(&self, event: TrailEvent) {
        let _ = self.tx.send(event);
    }
}
