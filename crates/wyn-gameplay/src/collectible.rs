//! Collectible pickup tracking for a level.

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use tracing::debug;
use wyn_common::Vec2;

use crate::events::{publish_on, GameEvent};

/// Coins awarded per pickup.
pub const DEFAULT_COIN_COUNT: u32 = 1;

/// Outcome of [`CollectibleManager::collect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectResult {
    /// Whether this call picked the item up
    pub collected: bool,
    /// Coins awarded
    pub coin_count: u32,
}

impl CollectResult {
    const MISSED: Self = Self {
        collected: false,
        coin_count: 0,
    };
}

/// Which of the level's collectibles have been picked up.
#[derive(Debug, Default)]
pub struct CollectibleManager {
    collected: Vec<bool>,
    count: usize,
    events: Option<Sender<GameEvent>>,
}

impl CollectibleManager {
    /// Create an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish [`GameEvent::CollectiblePickedUp`] on `sender`.
    #[must_use]
    pub fn with_events(mut self, sender: Sender<GameEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Track one uncollected item per position.
    pub fn init(&mut self, positions: &[Vec2]) {
        self.collected = vec![false; positions.len()];
        self.count = 0;
        debug!("Tracking {} collectibles", positions.len());
    }

    /// Pick up an item. Out-of-range or already collected items award nothing.
    pub fn collect(&mut self, index: usize) -> CollectResult {
        match self.collected.get_mut(index) {
            Some(slot) if !*slot => {
                *slot = true;
                self.count += 1;
                if let Some(sender) = &self.events {
                    publish_on(
                        sender,
                        GameEvent::CollectiblePickedUp {
                            index,
                            coins: DEFAULT_COIN_COUNT,
                        },
                    );
                }
                CollectResult {
                    collected: true,
                    coin_count: DEFAULT_COIN_COUNT,
                }
            }
            _ => CollectResult::MISSED,
        }
    }

    /// Whether an item was picked up. Out-of-range reads as `false`.
    #[must_use]
    pub fn is_collected(&self, index: usize) -> bool {
        self.collected.get(index).copied().unwrap_or(false)
    }

    /// Number of items tracked.
    #[must_use]
    pub fn total(&self) -> usize {
        self.collected.len()
    }

    /// Number of items picked up.
    #[must_use]
    pub fn collected_count(&self) -> usize {
        self.count
    }

    /// Whether every item was picked up. `false` for an empty level.
    #[must_use]
    pub fn all_collected(&self) -> bool {
        !self.collected.is_empty() && self.count == self.collected.len()
    }

    /// Forget all items.
    pub fn reset(&mut self) {
        self.collected.clear();
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;

    fn positions(n: usize) -> Vec<Vec2> {
        (0..n).map(|i| Vec2::new(i as f32 * 32.0, 64.0)).collect()
    }

    #[test]
    fn test_init() {
        let mut manager = CollectibleManager::new();
        manager.init(&positions(3));
        assert_eq!(manager.total(), 3);
        assert_eq!(manager.collected_count(), 0);
        assert!(!manager.all_collected());
    }

    #[test]
    fn test_collect() {
        let mut manager = CollectibleManager::new();
        manager.init(&positions(3));

        let result = manager.collect(1);
        assert_eq!(
            result,
            CollectResult {
                collected: true,
                coin_count: 1
            }
        );
        assert!(manager.is_collected(1));
        assert!(!manager.is_collected(0));
        assert_eq!(manager.collected_count(), 1);
    }

    #[test]
    fn test_collect_twice() {
        let mut manager = CollectibleManager::new();
        manager.init(&positions(2));
        manager.collect(0);
        let result = manager.collect(0);
        assert!(!result.collected);
        assert_eq!(result.coin_count, 0);
        assert_eq!(manager.collected_count(), 1);
    }

    #[test]
    fn test_out_of_range() {
        let mut manager = CollectibleManager::new();
        manager.init(&positions(2));
        assert_eq!(manager.collect(2), CollectResult::MISSED);
        assert!(!manager.is_collected(99));
    }

    #[test]
    fn test_all_collected() {
        let mut manager = CollectibleManager::new();
        assert!(!manager.all_collected());

        manager.init(&positions(2));
        manager.collect(0);
        assert!(!manager.all_collected());
        manager.collect(1);
        assert!(manager.all_collected());
    }

    #[test]
    fn test_reset() {
        let mut manager = CollectibleManager::new();
        manager.init(&positions(2));
        manager.collect(0);
        manager.reset();
        assert_eq!(manager.total(), 0);
        assert_eq!(manager.collected_count(), 0);
        assert!(!manager.all_collected());
    }

    #[test]
    fn test_reinit_clears_progress() {
        let mut manager = CollectibleManager::new();
        manager.init(&positions(2));
        manager.collect(0);
        manager.init(&positions(4));
        assert_eq!(manager.total(), 4);
        assert!(!manager.is_collected(0));
    }

    #[test]
    fn test_publishes_pickups() {
        let bus = EventBus::new(4);
        let mut manager = CollectibleManager::new().with_events(bus.sender());
        manager.init(&positions(2));
        manager.collect(1);
        manager.collect(1);
        assert_eq!(
            bus.drain(),
            vec![GameEvent::CollectiblePickedUp { index: 1, coins: 1 }]
        );
    }
}
