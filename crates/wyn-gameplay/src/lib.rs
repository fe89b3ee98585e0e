//! # Wyn Gameplay
//!
//! Deterministic gameplay core for the Wyn platformer.
//!
//! This crate knows nothing about rendering or a physics engine. It provides:
//! - Body, clock and input contracts plus deterministic reference versions
//! - Platformer tuning and character stats
//! - Player controller (coyote time, jump buffer, air jumps, fast fall)
//! - Enemy patrol behavior and enemy list
//! - Collectible tracking and scoring
//! - Animation key tables
//! - Structured diagnostics and an event bus

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod animation;
pub mod clock;
pub mod collectible;
pub mod config;
pub mod diagnostics;
pub mod enemy;
pub mod events;
pub mod input;
pub mod physics;
pub mod player;
pub mod scoring;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::animation::*;
    pub use crate::clock::*;
    pub use crate::collectible::*;
    pub use crate::config::*;
    pub use crate::diagnostics::*;
    pub use crate::enemy::*;
    pub use crate::events::*;
    pub use crate::input::*;
    pub use crate::physics::*;
    pub use crate::player::*;
    pub use crate::scoring::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use wyn_common::Vec2;

    #[test]
    fn test_level_flow() {
        let bus = EventBus::new(64);

        let mut collectibles = CollectibleManager::new().with_events(bus.sender());
        collectibles.init(&[Vec2::new(10.0, 0.0), Vec2::new(20.0, 0.0)]);

        let mut enemies = EnemyManager::new().with_events(bus.sender());
        enemies.init(&[EnemyConfig {
            damage: 10,
            health: 20,
            speed: 40.0,
            patrol_left_bound: 0.0,
            patrol_right_bound: 100.0,
        }]);

        let mut score = ScoreTracker::new();
        for index in 0..collectibles.total() {
            let result = collectibles.collect(index);
            score.add_coins(result.coin_count);
        }
        assert!(enemies.damage(0, 20));
        assert!(collectibles.all_collected());

        let final_score = score.final_score(30_000.0);
        assert_eq!(final_score, 20 + 350);

        let events = bus.drain();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[2], GameEvent::EnemyDefeated { index: 0 }));
    }

    #[test]
    fn test_player_with_tracing_sink() {
        let sink = std::sync::Arc::new(TracingDiagnostics::new(DiagnosticsConfig::enabled()));
        let mut player = PlayerController::new(
            ScriptedInput::new(),
            SimBody::at(Vec2::ZERO, true),
            FrameClock::with_delta(16.0),
            PlatformerConfig::default(),
            CharacterStats::default(),
        )
        .with_diagnostics(sink.clone());

        player.input_mut().hold(Action::Right, true);
        player.update();
        player.update();

        // Debug frame events are off by default; only the transition is kept
        let events = sink.query(&DiagnosticFilter::all().channel(DiagnosticChannel::Player));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].label, "state-change");
    }
}
