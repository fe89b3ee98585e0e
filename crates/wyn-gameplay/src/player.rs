//! Player controller for platformer movement and state.
//!
//! One controller owns all player movement: ground tracking, coyote time,
//! jump buffering, air jumps, jump cut, fast fall, damage and the state
//! machine. It talks to the outside world only through the [`Body`],
//! [`InputProvider`], [`GameClock`] and [`Diagnostics`] traits.
//!
//! Call [`PlayerController::update`] once per frame, after the input
//! provider has refreshed its edge flags. Presentation code reads
//! [`PlayerController::snapshot`] afterwards.

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};
use wyn_common::{EntityId, Vec2};

use crate::animation::player_anim_key;
use crate::clock::GameClock;
use crate::config::{CharacterStats, PlatformerConfig};
use crate::diagnostics::{DiagnosticChannel, DiagnosticLevel, Diagnostics, NoopDiagnostics};
use crate::events::{publish_on, GameEvent};
use crate::input::{Action, Axis, InputProvider};
use crate::physics::Body;

/// Invincibility granted after taking damage (ms).
pub const INVINCIBILITY_DURATION_MS: f64 = 1500.0;
/// Duration of the hurt state (ms).
pub const HURT_DURATION_MS: f64 = 300.0;
/// Invincibility granted on respawn (ms).
pub const RESPAWN_INVINCIBILITY_MS: f64 = 2000.0;

/// State of the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    /// Standing on the ground
    #[default]
    Idle,
    /// Moving on the ground
    Running,
    /// Airborne, moving up
    Jumping,
    /// Airborne, moving down
    Falling,
    /// Attacking. Nothing produces this yet.
    Attacking,
    /// Recoiling from damage
    Hurt,
    /// Health reached zero. Only `respawn` leaves this state.
    Dead,
}

impl PlayerState {
    /// Lowercase name, as used in diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Jumping => "jumping",
            Self::Falling => "falling",
            Self::Attacking => "attacking",
            Self::Hurt => "hurt",
            Self::Dead => "dead",
        }
    }

    /// Animation key to play in this state.
    #[must_use]
    pub const fn animation_key(self) -> &'static str {
        player_anim_key(self)
    }

    /// Check if the player is in the air.
    #[must_use]
    pub fn is_airborne(self) -> bool {
        matches!(self, Self::Jumping | Self::Falling)
    }
}

/// Horizontal facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    /// Facing left
    Left,
    /// Facing right (default)
    #[default]
    Right,
}

/// Read-only view of the player for presentation code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Current state
    pub state: PlayerState,
    /// Current facing
    pub facing: Facing,
    /// Body position
    pub position: Vec2,
    /// Body velocity
    pub velocity: Vec2,
    /// Current health
    pub health: i32,
    /// Maximum health
    pub max_health: i32,
    /// Whether the body is on the ground
    pub is_on_ground: bool,
    /// Jumps left before landing
    pub jumps_remaining: u32,
    /// Whether damage is currently blocked
    pub is_invincible: bool,
}

impl PlayerSnapshot {
    /// Animation key for the snapshot's state.
    #[must_use]
    pub const fn animation_key(&self) -> &'static str {
        self.state.animation_key()
    }
}

/// Outcome of [`PlayerController::take_damage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageResult {
    /// Whether health was reduced
    pub damaged: bool,
    /// Health after the call
    pub new_health: i32,
    /// Whether the player is dead after the call
    pub is_dead: bool,
}

/// Platformer player controller.
///
/// Owns its collaborators; pass `&mut T` for the body or input when the
/// host needs to keep them.
pub struct PlayerController<I, B, C, D = NoopDiagnostics> {
    entity_id: EntityId,
    input: I,
    body: B,
    clock: C,
    diagnostics: D,
    config: PlatformerConfig,
    stats: CharacterStats,
    events: Option<Sender<GameEvent>>,

    state: PlayerState,
    facing: Facing,
    health: i32,
    max_health: i32,

    invincible_until: f64,
    hurt_time_remaining: f64,

    // Seconds
    coyote_time_remaining: f64,
    jump_buffer_remaining: f64,
    jumps_remaining: u32,
    was_on_ground: bool,
    did_jump_from_ground: bool,
}

impl<I, B, C> PlayerController<I, B, C>
where
    I: InputProvider,
    B: Body,
    C: GameClock,
{
    /// Create a controller with full health, standing idle and facing right.
    #[must_use]
    pub fn new(
        input: I,
        body: B,
        clock: C,
        config: PlatformerConfig,
        stats: CharacterStats,
    ) -> Self {
        let entity_id = EntityId::new();
        debug!("Created player controller {}", entity_id);
        Self {
            entity_id,
            input,
            body,
            clock,
            diagnostics: NoopDiagnostics,
            jumps_remaining: config.jump.max_jumps,
            health: stats.max_health,
            max_health: stats.max_health,
            config,
            stats,
            events: None,
            state: PlayerState::Idle,
            facing: Facing::Right,
            invincible_until: 0.0,
            hurt_time_remaining: 0.0,
            coyote_time_remaining: 0.0,
            jump_buffer_remaining: 0.0,
            was_on_ground: false,
            did_jump_from_ground: false,
        }
    }
}

impl<I, B, C, D> PlayerController<I, B, C, D>
where
    I: InputProvider,
    B: Body,
    C: GameClock,
    D: Diagnostics,
{
    /// Replace the diagnostics sink.
    #[must_use]
    pub fn with_diagnostics<D2>(self, diagnostics: D2) -> PlayerController<I, B, C, D2>
    where
        D2: Diagnostics,
    {
        PlayerController {
            entity_id: self.entity_id,
            input: self.input,
            body: self.body,
            clock: self.clock,
            diagnostics,
            config: self.config,
            stats: self.stats,
            events: self.events,
            state: self.state,
            facing: self.facing,
            health: self.health,
            max_health: self.max_health,
            invincible_until: self.invincible_until,
            hurt_time_remaining: self.hurt_time_remaining,
            coyote_time_remaining: self.coyote_time_remaining,
            jump_buffer_remaining: self.jump_buffer_remaining,
            jumps_remaining: self.jumps_remaining,
            was_on_ground: self.was_on_ground,
            did_jump_from_ground: self.did_jump_from_ground,
        }
    }

    /// Publish jump, hurt, death and respawn events on `sender`.
    #[must_use]
    pub fn with_events(mut self, sender: Sender<GameEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Entity ID carried on published events.
    #[must_use]
    pub fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// Current facing.
    #[must_use]
    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Current health.
    #[must_use]
    pub fn health(&self) -> i32 {
        self.health
    }

    /// Tuning in effect.
    #[must_use]
    pub fn config(&self) -> &PlatformerConfig {
        &self.config
    }

    /// Stats in effect.
    #[must_use]
    pub fn stats(&self) -> &CharacterStats {
        &self.stats
    }

    /// The body.
    #[must_use]
    pub fn body(&self) -> &B {
        &self.body
    }

    /// Mutable access to the body, for the host's physics step.
    pub fn body_mut(&mut self) -> &mut B {
        &mut self.body
    }

    /// The input provider.
    #[must_use]
    pub fn input(&self) -> &I {
        &self.input
    }

    /// Mutable access to the input provider.
    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    /// The clock.
    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Mutable access to the clock.
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// The diagnostics sink.
    #[must_use]
    pub fn diagnostics(&self) -> &D {
        &self.diagnostics
    }

    /// Whether damage is currently blocked.
    #[must_use]
    pub fn is_invincible(&self) -> bool {
        self.clock.elapsed() < self.invincible_until
    }

    /// Read-only view for presentation code.
    #[must_use]
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            state: self.state,
            facing: self.facing,
            position: self.body.position(),
            velocity: self.body.velocity(),
            health: self.health,
            max_health: self.max_health,
            is_on_ground: self.body.is_on_ground(),
            jumps_remaining: self.jumps_remaining,
            is_invincible: self.is_invincible(),
        }
    }

    /// Advance one frame.
    ///
    /// Frames with a zero, negative or non-finite delta are ignored entirely.
    pub fn update(&mut self) {
        let dt = self.clock.delta() / 1000.0;
        if dt <= 0.0 || !dt.is_finite() {
            return;
        }

        self.update_ground_tracking();
        self.update_timers(dt);
        self.handle_jump_input();
        self.handle_jump_cut();
        self.handle_horizontal_movement();
        self.handle_fast_fall();
        self.update_state_machine();
        self.emit_frame();
    }

    fn update_ground_tracking(&mut self) {
        let on_ground = self.body.is_on_ground();

        if self.was_on_ground && !on_ground {
            // Walked off an edge
            if !self.did_jump_from_ground {
                self.coyote_time_remaining = self.config.jump.coyote_time_ms / 1000.0;
            }
            self.did_jump_from_ground = false;
        }

        if !self.was_on_ground && on_ground {
            self.jumps_remaining = self.config.jump.max_jumps;
            self.coyote_time_remaining = 0.0;

            if self.jump_buffer_remaining > 0.0 {
                self.execute_jump();
            }
        }

        if on_ground {
            self.jumps_remaining = self.config.jump.max_jumps;
        }

        self.was_on_ground = on_ground;
    }

    // Timers may dip below zero; every check is `> 0`.
    fn update_timers(&mut self, dt: f64) {
        if self.coyote_time_remaining > 0.0 {
            self.coyote_time_remaining -= dt;
        }
        if self.jump_buffer_remaining > 0.0 {
            self.jump_buffer_remaining -= dt;
        }
        if self.hurt_time_remaining > 0.0 {
            self.hurt_time_remaining -= dt;
        }
    }

    fn handle_jump_input(&mut self) {
        if !self.input.just_pressed(Action::Jump) {
            return;
        }

        self.jump_buffer_remaining = self.config.jump.jump_buffer_ms / 1000.0;

        if self.can_jump() {
            self.execute_jump();
        }
    }

    fn can_jump(&self) -> bool {
        self.body.is_on_ground() || self.coyote_time_remaining > 0.0 || self.jumps_remaining > 0
    }

    fn execute_jump(&mut self) {
        let on_ground = self.body.is_on_ground();
        let first_jump = on_ground || self.coyote_time_remaining > 0.0;
        let velocity = if first_jump {
            self.config.jump.jump_velocity
        } else {
            self.config.jump.double_jump_velocity
        };

        if on_ground {
            self.did_jump_from_ground = true;
        }

        self.body.set_velocity_y(velocity);
        self.jumps_remaining = self.jumps_remaining.saturating_sub(1);
        self.coyote_time_remaining = 0.0;
        self.jump_buffer_remaining = 0.0;

        self.publish(GameEvent::PlayerJumped {
            entity_id: self.entity_id,
            air_jump: !first_jump,
            velocity_y: velocity,
        });
    }

    fn handle_jump_cut(&mut self) {
        if !self.input.just_released(Action::Jump) {
            return;
        }

        let vy = self.body.velocity().y;
        if vy < 0.0 {
            self.body.set_velocity_y(vy * self.config.jump.jump_cut_multiplier);
        }
    }

    fn handle_horizontal_movement(&mut self) {
        let axis = self.input.axis(Axis::Horizontal);
        let factor = if self.body.is_on_ground() {
            1.0
        } else {
            self.config.movement.air_control_factor
        };
        let speed = self.stats.speed * factor;
        self.body.set_velocity_x(axis * speed);

        if axis < 0.0 {
            self.facing = Facing::Left;
        } else if axis > 0.0 {
            self.facing = Facing::Right;
        }
    }

    fn handle_fast_fall(&mut self) {
        let fast_fall = &self.config.fast_fall;
        let holding_down = self.input.is_down(Action::Down);
        let falling = self.body.velocity().y > fast_fall.threshold;

        if holding_down && !self.body.is_on_ground() && falling {
            let extra = self.config.gravity.y * (fast_fall.multiplier - 1.0);
            self.body.set_gravity_y(extra);
        } else {
            self.body.set_gravity_y(0.0);
        }
    }

    // Recomputed from current signals every frame. Falls through unchanged
    // when airborne with zero vertical velocity.
    fn update_state_machine(&mut self) {
        if self.health <= 0 {
            self.set_state(PlayerState::Dead);
            return;
        }

        if self.hurt_time_remaining > 0.0 {
            self.set_state(PlayerState::Hurt);
            return;
        }

        let velocity = self.body.velocity();
        let on_ground = self.body.is_on_ground();

        if velocity.y < 0.0 && !on_ground {
            self.set_state(PlayerState::Jumping);
        } else if velocity.y > 0.0 && !on_ground {
            self.set_state(PlayerState::Falling);
        } else if velocity.x.abs() > 1.0 && on_ground {
            self.set_state(PlayerState::Running);
        } else if on_ground {
            self.set_state(PlayerState::Idle);
        }
    }

    fn set_state(&mut self, next: PlayerState) {
        if next == self.state {
            return;
        }
        let previous = self.state;
        self.state = next;
        self.diagnostics.emit(
            DiagnosticChannel::Player,
            DiagnosticLevel::State,
            "state-change",
            json!({ "from": previous.as_str(), "to": next.as_str() }),
        );
    }

    fn emit_frame(&self) {
        if !self
            .diagnostics
            .is_enabled(DiagnosticChannel::Player, DiagnosticLevel::Debug)
        {
            return;
        }
        let velocity = self.body.velocity();
        self.diagnostics.emit(
            DiagnosticChannel::Player,
            DiagnosticLevel::Debug,
            "frame",
            json!({
                "state": self.state.as_str(),
                "velocity": { "x": velocity.x, "y": velocity.y },
                "onGround": self.body.is_on_ground(),
                "jumpsRemaining": self.jumps_remaining,
                "coyote": self.coyote_time_remaining,
                "jumpBuffer": self.jump_buffer_remaining,
            }),
        );
    }

    fn publish(&self, event: GameEvent) {
        if let Some(sender) = &self.events {
            publish_on(sender, event);
        }
    }

    /// Apply damage unless the player is dead or invincible.
    ///
    /// A hit starts an invincibility window and a short hurt state. Hits
    /// during the window are ignored entirely.
    pub fn take_damage(&mut self, amount: i32) -> DamageResult {
        if amount <= 0 {
            return DamageResult {
                damaged: false,
                new_health: self.health,
                is_dead: false,
            };
        }

        if self.health <= 0 {
            return DamageResult {
                damaged: false,
                new_health: 0,
                is_dead: true,
            };
        }

        let elapsed = self.clock.elapsed();
        if elapsed < self.invincible_until {
            return DamageResult {
                damaged: false,
                new_health: self.health,
                is_dead: false,
            };
        }

        self.health = self.health.saturating_sub(amount).max(0);
        self.invincible_until = elapsed + INVINCIBILITY_DURATION_MS;
        self.hurt_time_remaining = HURT_DURATION_MS / 1000.0;
        let is_dead = self.health <= 0;

        self.diagnostics.emit(
            DiagnosticChannel::Player,
            DiagnosticLevel::State,
            "damage",
            json!({ "amount": amount, "remainingHealth": self.health }),
        );
        self.publish(GameEvent::PlayerHurt {
            entity_id: self.entity_id,
            amount,
            health: self.health,
        });
        if is_dead {
            self.die();
        }

        DamageResult {
            damaged: true,
            new_health: self.health,
            is_dead,
        }
    }

    /// Restore health, capped at max. Negative amounts reduce health but
    /// never below zero; draining the last point kills the player the same
    /// way lethal damage does. Has no effect while dead.
    pub fn heal(&mut self, amount: i32) {
        if self.health <= 0 {
            return;
        }
        self.health = self.health.saturating_add(amount).clamp(0, self.max_health);
        if self.health == 0 {
            self.die();
        }
    }

    fn die(&mut self) {
        info!("Player {} died", self.entity_id);
        self.publish(GameEvent::PlayerDied {
            entity_id: self.entity_id,
        });
    }

    /// Reset to full health and idle, with a respawn invincibility window.
    ///
    /// Ground contact is re-detected on the next update.
    pub fn respawn(&mut self) {
        self.health = self.max_health;
        self.set_state(PlayerState::Idle);
        self.invincible_until = self.clock.elapsed() + RESPAWN_INVINCIBILITY_MS;
        self.hurt_time_remaining = 0.0;
        self.body.set_velocity(0.0, 0.0);
        self.jumps_remaining = self.config.jump.max_jumps;
        self.coyote_time_remaining = 0.0;
        self.jump_buffer_remaining = 0.0;
        self.was_on_ground = false;
        self.did_jump_from_ground = false;

        info!("Player {} respawned", self.entity_id);
        self.publish(GameEvent::PlayerRespawned {
            entity_id: self.entity_id,
            position: self.body.position(),
        });
    }
}
