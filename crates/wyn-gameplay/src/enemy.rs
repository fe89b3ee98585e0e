//! Enemies: patrol behavior, per-enemy state and the level's enemy list.
//!
//! Enemies compute an intent (desired horizontal velocity and facing) from
//! their current position. The caller applies the intent to the body.

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::diagnostics::{
    noop_shared, DiagnosticChannel, DiagnosticLevel, Diagnostics, SharedDiagnostics,
};
use crate::events::{publish_on, GameEvent};
use crate::player::Facing;

/// Horizontal patrol range and speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatrolConfig {
    /// Turn right at or left of this x
    pub left_bound: f32,
    /// Turn left at or right of this x
    pub right_bound: f32,
    /// Patrol speed (units/s)
    pub speed: f32,
}

/// Mutable patrol direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatrolState {
    /// -1 for left, 1 for right
    pub direction: i8,
}

impl Default for PatrolState {
    fn default() -> Self {
        Self { direction: -1 }
    }
}

/// Velocity and facing an enemy wants this frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyIntent {
    /// Horizontal velocity
    pub velocity_x: f32,
    /// Facing
    pub facing: Facing,
}

/// Walk back and forth between the patrol bounds.
///
/// The direction flips when `current_x` reaches either bound; a bound is
/// inclusive.
pub fn update_patrol(
    current_x: f32,
    state: &mut PatrolState,
    config: &PatrolConfig,
) -> EnemyIntent {
    if current_x <= config.left_bound {
        state.direction = 1;
    } else if current_x >= config.right_bound {
        state.direction = -1;
    }

    EnemyIntent {
        velocity_x: config.speed * f32::from(state.direction),
        facing: if state.direction < 0 {
            Facing::Left
        } else {
            Facing::Right
        },
    }
}

/// Placement and stats for one enemy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyConfig {
    /// Contact damage dealt to the player
    pub damage: i32,
    /// Starting health
    pub health: i32,
    /// Patrol speed
    pub speed: f32,
    /// Left patrol bound
    pub patrol_left_bound: f32,
    /// Right patrol bound
    pub patrol_right_bound: f32,
}

/// Read-only view of an enemy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemySnapshot {
    /// Facing
    pub facing: Facing,
    /// Health
    pub health: i32,
    /// Whether the enemy is alive
    pub is_alive: bool,
    /// Contact damage
    pub damage: i32,
}

/// A single patrolling enemy.
pub struct EnemyEntity {
    health: i32,
    is_alive: bool,
    facing: Facing,
    damage: i32,
    patrol: PatrolConfig,
    patrol_state: PatrolState,
    diagnostics: SharedDiagnostics,
}

impl std::fmt::Debug for EnemyEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnemyEntity")
            .field("health", &self.health)
            .field("is_alive", &self.is_alive)
            .field("facing", &self.facing)
            .field("patrol_state", &self.patrol_state)
            .finish_non_exhaustive()
    }
}

impl EnemyEntity {
    /// Create an enemy facing left with full health.
    #[must_use]
    pub fn new(config: &EnemyConfig) -> Self {
        Self::with_diagnostics(config, noop_shared())
    }

    /// Create an enemy that reports damage and death to `diagnostics`.
    #[must_use]
    pub fn with_diagnostics(config: &EnemyConfig, diagnostics: SharedDiagnostics) -> Self {
        Self {
            health: config.health,
            is_alive: true,
            facing: Facing::Left,
            damage: config.damage,
            patrol: PatrolConfig {
                left_bound: config.patrol_left_bound,
                right_bound: config.patrol_right_bound,
                speed: config.speed,
            },
            patrol_state: PatrolState::default(),
            diagnostics,
        }
    }

    /// Compute this frame's intent. Dead enemies stand still.
    pub fn update(&mut self, current_x: f32) -> EnemyIntent {
        if !self.is_alive {
            return EnemyIntent {
                velocity_x: 0.0,
                facing: self.facing,
            };
        }

        let intent = update_patrol(current_x, &mut self.patrol_state, &self.patrol);
        self.facing = intent.facing;
        intent
    }

    /// Apply damage. Ignored when dead or when `amount <= 0`.
    pub fn take_damage(&mut self, amount: i32) {
        if !self.is_alive || amount <= 0 {
            return;
        }

        self.health = self.health.saturating_sub(amount).max(0);
        if self.health <= 0 {
            self.is_alive = false;
            debug!("Enemy killed by {} damage", amount);
            self.diagnostics.emit(
                DiagnosticChannel::Enemy,
                DiagnosticLevel::State,
                "death",
                json!({ "damage": amount }),
            );
        } else {
            self.diagnostics.emit(
                DiagnosticChannel::Enemy,
                DiagnosticLevel::State,
                "damage",
                json!({ "amount": amount, "remainingHealth": self.health }),
            );
        }
    }

    /// Whether the enemy is alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.is_alive
    }

    /// Read-only view.
    #[must_use]
    pub fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            facing: self.facing,
            health: self.health,
            is_alive: self.is_alive,
            damage: self.damage,
        }
    }
}

/// All enemies in the current level, addressed by spawn index.
pub struct EnemyManager {
    entities: Vec<EnemyEntity>,
    diagnostics: SharedDiagnostics,
    events: Option<Sender<GameEvent>>,
}

impl Default for EnemyManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EnemyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnemyManager")
            .field("entities", &self.entities)
            .finish_non_exhaustive()
    }
}

impl EnemyManager {
    /// Create an empty manager with no diagnostics.
    #[must_use]
    pub fn new() -> Self {
        Self::with_diagnostics(noop_shared())
    }

    /// Create an empty manager whose enemies report to `diagnostics`.
    #[must_use]
    pub fn with_diagnostics(diagnostics: SharedDiagnostics) -> Self {
        Self {
            entities: Vec::new(),
            diagnostics,
            events: None,
        }
    }

    /// Publish [`GameEvent::EnemyDefeated`] on `sender`.
    #[must_use]
    pub fn with_events(mut self, sender: Sender<GameEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Replace all enemies.
    pub fn init(&mut self, configs: &[EnemyConfig]) {
        self.entities = configs
            .iter()
            .map(|config| EnemyEntity::with_diagnostics(config, self.diagnostics.clone()))
            .collect();
        info!("Spawned {} enemies", self.entities.len());
    }

    /// Update every enemy. A missing position is treated as x = 0.
    pub fn update_all(&mut self, positions: &[f32]) -> Vec<EnemyIntent> {
        self.entities
            .iter_mut()
            .enumerate()
            .map(|(i, entity)| entity.update(positions.get(i).copied().unwrap_or(0.0)))
            .collect()
    }

    /// Damage one enemy. Returns `true` if this hit killed it.
    pub fn damage(&mut self, index: usize, amount: i32) -> bool {
        let Some(entity) = self.entities.get_mut(index) else {
            return false;
        };
        let was_alive = entity.is_alive();
        entity.take_damage(amount);
        let killed = was_alive && !entity.is_alive();
        if killed {
            if let Some(sender) = &self.events {
                publish_on(sender, GameEvent::EnemyDefeated { index });
            }
        }
        killed
    }

    /// Enemy by spawn index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&EnemyEntity> {
        self.entities.get(index)
    }

    /// Mutable enemy by spawn index.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut EnemyEntity> {
        self.entities.get_mut(index)
    }

    /// Number of enemies, alive or dead.
    #[must_use]
    pub fn count(&self) -> usize {
        self.entities.len()
    }

    /// Number of living enemies.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.entities.iter().filter(|e| e.is_alive()).count()
    }

    /// Remove all enemies.
    pub fn reset(&mut self) {
        self.entities.clear();
        debug!("Enemy manager reset");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::diagnostics::RecordingDiagnostics;
    use crate::events::EventBus;

    fn patrol() -> PatrolConfig {
        PatrolConfig {
            left_bound: 100.0,
            right_bound: 300.0,
            speed: 60.0,
        }
    }

    fn skeleton() -> EnemyConfig {
        EnemyConfig {
            damage: 10,
            health: 30,
            speed: 60.0,
            patrol_left_bound: 100.0,
            patrol_right_bound: 300.0,
        }
    }

    #[test]
    fn test_patrol_starts_left() {
        let mut state = PatrolState::default();
        let intent = update_patrol(200.0, &mut state, &patrol());
        assert_eq!(intent.velocity_x, -60.0);
        assert_eq!(intent.facing, Facing::Left);
    }

    #[test]
    fn test_patrol_turns_at_bounds() {
        let mut state = PatrolState::default();

        let intent = update_patrol(100.0, &mut state, &patrol());
        assert_eq!(intent.velocity_x, 60.0);
        assert_eq!(intent.facing, Facing::Right);

        let intent = update_patrol(200.0, &mut state, &patrol());
        assert_eq!(intent.velocity_x, 60.0);

        let intent = update_patrol(300.0, &mut state, &patrol());
        assert_eq!(intent.velocity_x, -60.0);
        assert_eq!(intent.facing, Facing::Left);
    }

    #[test]
    fn test_patrol_past_bounds() {
        let mut state = PatrolState::default();
        assert_eq!(update_patrol(50.0, &mut state, &patrol()).velocity_x, 60.0);
        assert_eq!(update_patrol(350.0, &mut state, &patrol()).velocity_x, -60.0);
    }

    #[test]
    fn test_entity_initial_snapshot() {
        let enemy = EnemyEntity::new(&skeleton());
        assert_eq!(
            enemy.snapshot(),
            EnemySnapshot {
                facing: Facing::Left,
                health: 30,
                is_alive: true,
                damage: 10,
            }
        );
    }

    #[test]
    fn test_entity_updates_facing() {
        let mut enemy = EnemyEntity::new(&skeleton());
        enemy.update(100.0);
        assert_eq!(enemy.snapshot().facing, Facing::Right);
    }

    #[test]
    fn test_entity_damage_and_death() {
        let sink = Arc::new(RecordingDiagnostics::new());
        let mut enemy = EnemyEntity::with_diagnostics(&skeleton(), sink.clone());

        enemy.take_damage(10);
        assert_eq!(enemy.snapshot().health, 20);
        let damage = sink.with_label("damage");
        assert_eq!(damage.len(), 1);
        assert_eq!(damage[0].channel, DiagnosticChannel::Enemy);
        assert_eq!(damage[0].data["remainingHealth"], 20);

        enemy.take_damage(100);
        assert_eq!(enemy.snapshot().health, 0);
        assert!(!enemy.is_alive());
        assert_eq!(sink.with_label("death").len(), 1);

        enemy.take_damage(5);
        assert_eq!(sink.events().len(), 2);
    }

    #[test]
    fn test_entity_ignores_non_positive_damage() {
        let mut enemy = EnemyEntity::new(&skeleton());
        enemy.take_damage(0);
        enemy.take_damage(-4);
        assert_eq!(enemy.snapshot().health, 30);
    }

    #[test]
    fn test_dead_entity_stands_still() {
        let mut enemy = EnemyEntity::new(&skeleton());
        enemy.update(100.0);
        enemy.take_damage(30);
        let intent = enemy.update(300.0);
        assert_eq!(intent.velocity_x, 0.0);
        assert_eq!(intent.facing, Facing::Right);
    }

    #[test]
    fn test_manager_init_and_update() {
        let mut manager = EnemyManager::new();
        manager.init(&[skeleton(), skeleton()]);
        assert_eq!(manager.count(), 2);

        let intents = manager.update_all(&[100.0]);
        assert_eq!(intents.len(), 2);
        assert_eq!(intents[0].velocity_x, 60.0);
        // Missing position reads as x = 0, left of the bound
        assert_eq!(intents[1].velocity_x, 60.0);
    }

    #[test]
    fn test_manager_get() {
        let mut manager = EnemyManager::new();
        manager.init(&[skeleton()]);
        assert!(manager.get(0).is_some());
        assert!(manager.get(5).is_none());

        if let Some(enemy) = manager.get_mut(0) {
            enemy.take_damage(5);
        }
        assert_eq!(manager.get(0).map(|e| e.snapshot().health), Some(25));
    }

    #[test]
    fn test_manager_damage_publishes_defeat() {
        let bus = EventBus::new(8);
        let mut manager = EnemyManager::new().with_events(bus.sender());
        manager.init(&[skeleton(), skeleton()]);

        assert!(!manager.damage(1, 10));
        assert!(manager.damage(1, 20));
        assert!(!manager.damage(1, 20));
        assert!(!manager.damage(9, 20));

        assert_eq!(manager.alive_count(), 1);
        assert_eq!(bus.drain(), vec![GameEvent::EnemyDefeated { index: 1 }]);
    }

    #[test]
    fn test_manager_shares_diagnostics() {
        let sink = Arc::new(RecordingDiagnostics::new());
        let mut manager = EnemyManager::with_diagnostics(sink.clone());
        manager.init(&[skeleton(), skeleton()]);
        manager.damage(0, 1);
        manager.damage(1, 1);
        assert_eq!(sink.with_label("damage").len(), 2);
    }

    #[test]
    fn test_manager_reset() {
        let mut manager = EnemyManager::new();
        manager.init(&[skeleton()]);
        manager.reset();
        assert_eq!(manager.count(), 0);
        assert!(manager.update_all(&[]).is_empty());
    }
}
