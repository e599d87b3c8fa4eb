use super::AssetId;

/// Asset lifecycle notifications emitted by the host before it commits a change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The listed assets are about to be written
    PreSave(Vec<AssetId>),
    /// An asset is about to be created
    WillCreate(AssetId),
    /// An asset is about to be deleted
    WillDelete(AssetId),
    /// An asset is about to be moved or renamed
    WillMove { from: AssetId, to: AssetId },
}

impl LifecycleEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            LifecycleEvent::PreSave(_) => "pre-save",
            LifecycleEvent::WillCreate(_) => "will-create",
            LifecycleEvent::WillDelete(_) => "will-delete",
            LifecycleEvent::WillMove { .. } => "will-move",
        }
    }
}

/// What the index answers to the host for a lifecycle hook.
///
/// The index never performs a delete or a move itself; it always lets the
/// host carry on with its own operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostResponse {
    /// Save or create: the host proceeds as normal
    Proceed,
    DidNotDelete,
    DidNotMove,
}

impl HostResponse {
    pub fn for_event(event: &LifecycleEvent) -> Self {
        match event {
            LifecycleEvent::PreSave(_) | LifecycleEvent::WillCreate(_) => HostResponse::Proceed,
            LifecycleEvent::WillDelete(_) => HostResponse::DidNotDelete,
            LifecycleEvent::WillMove { .. } => HostResponse::DidNotMove,
        }
    }
}

/// Result of handing an event to the mutation tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerAck {
    /// false when the index was stale and the event was dropped
    pub queued: bool,
    pub response: HostResponse,
}
