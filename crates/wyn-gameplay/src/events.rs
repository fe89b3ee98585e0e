//! Gameplay event bus.
//!
//! Controllers and managers publish what happened during a frame; scenes,
//! audio and HUD code drain the queue afterwards. Publishing never blocks.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use tracing::debug;
use wyn_common::{EntityId, Vec2};

/// Something that happened during a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// The player left the ground or air-jumped.
    PlayerJumped {
        /// Player entity
        entity_id: EntityId,
        /// Whether this was an air jump
        air_jump: bool,
        /// Vertical velocity applied
        velocity_y: f32,
    },
    /// The player took damage.
    PlayerHurt {
        /// Player entity
        entity_id: EntityId,
        /// Damage dealt
        amount: i32,
        /// Health afterwards
        health: i32,
    },
    /// The player's health reached zero.
    PlayerDied {
        /// Player entity
        entity_id: EntityId,
    },
    /// The player was respawned.
    PlayerRespawned {
        /// Player entity
        entity_id: EntityId,
        /// Position at respawn
        position: Vec2,
    },
    /// A collectible was picked up.
    CollectiblePickedUp {
        /// Collectible index within its manager
        index: usize,
        /// Coins awarded
        coins: u32,
    },
    /// An enemy was killed.
    EnemyDefeated {
        /// Enemy index within its manager
        index: usize,
    },
    /// The level exit was reached.
    LevelCompleted {
        /// Final score
        score: u32,
        /// Star rating, 0-3
        stars: u8,
        /// Completion time (ms)
        time_ms: f64,
    },
}

/// Bounded multi-producer event queue.
#[derive(Debug)]
pub struct EventBus {
    sender: Sender<GameEvent>,
    receiver: Receiver<GameEvent>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventBus {
    /// Create a bus holding at most `capacity` undrained events.
    ///
    /// A capacity of zero is raised to one; a rendezvous queue would drop
    /// every event, since publishing never waits for a reader.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Queue an event. Dropped if the queue is full.
    pub fn publish(&self, event: GameEvent) {
        publish_on(&self.sender, event);
    }

    /// Take every queued event, oldest first.
    pub fn drain(&self) -> Vec<GameEvent> {
        self.receiver.try_iter().collect()
    }

    /// Number of queued events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Queue capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// A sender handle for a producer.
    #[must_use]
    pub fn sender(&self) -> Sender<GameEvent> {
        self.sender.clone()
    }

    /// Drain the queue into every handler, in order.
    pub fn dispatch(&self, handlers: &[&dyn EventHandler]) -> usize {
        let events = self.drain();
        for event in &events {
            for handler in handlers {
                handler.handle(event);
            }
        }
        events.len()
    }
}

/// Consumer of drained events.
pub trait EventHandler {
    /// Handle one event.
    fn handle(&self, event: &GameEvent);
}

/// Non-blocking send shared by every producer.
pub(crate) fn publish_on(sender: &Sender<GameEvent>, event: GameEvent) {
    match sender.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(event)) => debug!("Event queue full, dropping {:?}", event),
        Err(TrySendError::Disconnected(_)) => {}
    }
}
