//! Typed event channels for world observers
//!
//! Collaborators (nameplates, camera follow, the network encoder) bind
//! listeners per event kind and receive an unsubscribe handle at bind
//! time. Events are plain data; no string-namespace matching.

use std::collections::HashMap;
use glam::Vec3;
use uuid::Uuid;

use super::direction::{Action, Direction, Speed};

/// Events fired by the world as entities change.
#[derive(Debug, Clone)]
pub enum WorldEvent {
    /// An actor advanced one movement sub-step or was position-corrected
    Moved { id: Uuid, position: Vec3 },
    DirectionChanged { id: Uuid, direction: Direction },
    SpeedChanged { id: Uuid, speed: Speed },
    ActionChanged { id: Uuid, action: Action },
    /// An actor was given a new look
    AvatarChanged { id: Uuid },
    NickChanged { id: Uuid, nick: String },
    /// A look assignment failed and the default look was substituted
    LookFailed { id: Uuid, reason: String },
    /// Chat line from a peer
    Chat { id: Uuid, nick: String, text: String },
    /// Entity left the world; listeners must drop references to it
    Removed { id: Uuid },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Moved,
    DirectionChanged,
    SpeedChanged,
    ActionChanged,
    AvatarChanged,
    NickChanged,
    LookFailed,
    Chat,
    Removed,
}

impl WorldEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            WorldEvent::Moved { .. } => EventKind::Moved,
            WorldEvent::DirectionChanged { .. } => EventKind::DirectionChanged,
            WorldEvent::SpeedChanged { .. } => EventKind::SpeedChanged,
            WorldEvent::ActionChanged { .. } => EventKind::ActionChanged,
            WorldEvent::AvatarChanged { .. } => EventKind::AvatarChanged,
            WorldEvent::NickChanged { .. } => EventKind::NickChanged,
            WorldEvent::LookFailed { .. } => EventKind::LookFailed,
            WorldEvent::Chat { .. } => EventKind::Chat,
            WorldEvent::Removed { .. } => EventKind::Removed,
        }
    }
}

/// Handle returned by `subscribe`; pass back to `unsubscribe` to unbind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    kind: EventKind,
    id: u64,
}

type Listener = Box<dyn FnMut(&WorldEvent) + Send>;

/// Listener lists keyed by event kind.
#[derive(Default)]
pub struct EventBus {
    listeners: HashMap<EventKind, Vec<(u64, Listener)>>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, kind: EventKind, listener: F) -> Subscription
    where
        F: FnMut(&WorldEvent) + Send + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners
            .entry(kind)
            .or_default()
            .push((id, Box::new(listener)));
        Subscription { kind, id }
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) {
        if let Some(list) = self.listeners.get_mut(&subscription.kind) {
            list.retain(|(id, _)| *id != subscription.id);
        }
    }

    pub fn emit(&mut self, event: &WorldEvent) {
        if let Some(list) = self.listeners.get_mut(&event.kind()) {
            for (_, listener) in list.iter_mut() {
                listener(event);
            }
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<_, _> = self
            .listeners
            .iter()
            .map(|(kind, list)| (kind, list.len()))
            .collect();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}
