//! Physics body contract and a deterministic reference body.
//!
//! The controller never owns a physics engine. It talks to whatever the host
//! uses through the [`Body`] trait: read position, velocity and contact
//! flags, write velocity and the additional gravity component.
//!
//! [`SimBody`] is a small axis-aligned implementation used for headless
//! simulation and tests.

use serde::{Deserialize, Serialize};
use wyn_common::{BodyId, Vec2};

/// Which sides of a body were blocked during the last physics step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockedState {
    /// Blocked above (ceiling)
    pub up: bool,
    /// Blocked below (ground)
    pub down: bool,
    /// Blocked on the left
    pub left: bool,
    /// Blocked on the right
    pub right: bool,
}

/// Parameters for creating a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    /// Initial X position
    pub x: f32,
    /// Initial Y position
    pub y: f32,
    /// Collision width
    pub width: f32,
    /// Collision height
    pub height: f32,
    /// Static bodies never move
    pub is_static: bool,
    /// Collision box X offset from the sprite origin
    pub offset_x: f32,
    /// Collision box Y offset from the sprite origin
    pub offset_y: f32,
    /// Horizontal speed cap
    pub max_velocity_x: f32,
    /// Vertical speed cap
    pub max_velocity_y: f32,
    /// Additional per-body gravity
    pub gravity_y: f32,
    /// Restitution on floor contact (0-1)
    pub bounce: f32,
    /// Horizontal drag (units/s²) applied when no acceleration is set
    pub drag: f32,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 24.0,
            height: 40.0,
            is_static: false,
            offset_x: 0.0,
            offset_y: 0.0,
            max_velocity_x: 10_000.0,
            max_velocity_y: 10_000.0,
            gravity_y: 0.0,
            bounce: 0.0,
            drag: 0.0,
        }
    }
}

/// A physics body as seen by gameplay code.
///
/// Contact flags reflect the last physics step. `set_gravity_y` is an
/// *additional* gravity component added on top of world gravity, not a
/// replacement for it.
pub trait Body {
    /// Body identifier.
    fn id(&self) -> BodyId;

    /// Current position.
    fn position(&self) -> Vec2;

    /// Current velocity.
    fn velocity(&self) -> Vec2;

    /// Standing on something.
    fn is_on_ground(&self) -> bool;

    /// Touching a wall on either side.
    fn is_touching_wall(&self) -> bool;

    /// Touching a ceiling.
    fn is_touching_ceiling(&self) -> bool;

    /// Full blocked state.
    fn blocked(&self) -> BlockedState;

    /// Whether the body takes part in simulation.
    fn enabled(&self) -> bool;

    /// Collision width.
    fn width(&self) -> f32;

    /// Collision height.
    fn height(&self) -> f32;

    /// Set both velocity components.
    fn set_velocity(&mut self, x: f32, y: f32);

    /// Set horizontal velocity.
    fn set_velocity_x(&mut self, x: f32);

    /// Set vertical velocity.
    fn set_velocity_y(&mut self, y: f32);

    /// Set acceleration.
    fn set_acceleration(&mut self, x: f32, y: f32);

    /// Set horizontal acceleration.
    fn set_acceleration_x(&mut self, x: f32);

    /// Set the additional vertical gravity.
    fn set_gravity_y(&mut self, y: f32);

    /// Set drag.
    fn set_drag(&mut self, x: f32, y: f32);

    /// Set speed caps.
    fn set_max_velocity(&mut self, x: f32, y: f32);

    /// Set restitution.
    fn set_bounce(&mut self, x: f32, y: f32);

    /// Set collision size.
    fn set_size(&mut self, width: f32, height: f32);

    /// Set collision offset.
    fn set_offset(&mut self, x: f32, y: f32);

    /// Enable or disable the body.
    fn set_enable(&mut self, enabled: bool);
}

impl<T: Body + ?Sized> Body for &mut T {
    fn id(&self) -> BodyId {
        (**self).id()
    }
    fn position(&self) -> Vec2 {
        (**self).position()
    }
    fn velocity(&self) -> Vec2 {
        (**self).velocity()
    }
    fn is_on_ground(&self) -> bool {
        (**self).is_on_ground()
    }
    fn is_touching_wall(&self) -> bool {
        (**self).is_touching_wall()
    }
    fn is_touching_ceiling(&self) -> bool {
        (**self).is_touching_ceiling()
    }
    fn blocked(&self) -> BlockedState {
        (**self).blocked()
    }
    fn enabled(&self) -> bool {
        (**self).enabled()
    }
    fn width(&self) -> f32 {
        (**self).width()
    }
    fn height(&self) -> f32 {
        (**self).height()
    }
    fn set_velocity(&mut self, x: f32, y: f32) {
        (**self).set_velocity(x, y);
    }
    fn set_velocity_x(&mut self, x: f32) {
        (**self).set_velocity_x(x);
    }
    fn set_velocity_y(&mut self, y: f32) {
        (**self).set_velocity_y(y);
    }
    fn set_acceleration(&mut self, x: f32, y: f32) {
        (**self).set_acceleration(x, y);
    }
    fn set_acceleration_x(&mut self, x: f32) {
        (**self).set_acceleration_x(x);
    }
    fn set_gravity_y(&mut self, y: f32) {
        (**self).set_gravity_y(y);
    }
    fn set_drag(&mut self, x: f32, y: f32) {
        (**self).set_drag(x, y);
    }
    fn set_max_velocity(&mut self, x: f32, y: f32) {
        (**self).set_max_velocity(x, y);
    }
    fn set_bounce(&mut self, x: f32, y: f32) {
        (**self).set_bounce(x, y);
    }
    fn set_size(&mut self, width: f32, height: f32) {
        (**self).set_size(width, height);
    }
    fn set_offset(&mut self, x: f32, y: f32) {
        (**self).set_offset(x, y);
    }
    fn set_enable(&mut self, enabled: bool) {
        (**self).set_enable(enabled);
    }
}

/// Deterministic axis-aligned body.
///
/// Contact flags can be driven directly (`set_on_ground`, `blocked_mut`) or
/// produced by [`SimBody::step`] against a flat floor.
#[derive(Debug, Clone, PartialEq)]
pub struct SimBody {
    id: BodyId,
    position: Vec2,
    velocity: Vec2,
    acceleration: Vec2,
    gravity_y: f32,
    drag: Vec2,
    max_velocity: Vec2,
    bounce: Vec2,
    size: Vec2,
    offset: Vec2,
    blocked: BlockedState,
    enabled: bool,
    is_static: bool,
}

impl SimBody {
    /// Create a body from a [`BodyConfig`].
    #[must_use]
    pub fn new(config: &BodyConfig) -> Self {
        Self {
            id: BodyId::next(),
            position: Vec2::new(config.x, config.y),
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            gravity_y: config.gravity_y,
            drag: Vec2::new(config.drag, 0.0),
            max_velocity: Vec2::new(config.max_velocity_x, config.max_velocity_y),
            bounce: Vec2::new(0.0, config.bounce),
            size: Vec2::new(config.width, config.height),
            offset: Vec2::new(config.offset_x, config.offset_y),
            blocked: BlockedState::default(),
            enabled: true,
            is_static: config.is_static,
        }
    }

    /// Create a body at `position`, standing on the ground or not.
    #[must_use]
    pub fn at(position: Vec2, grounded: bool) -> Self {
        let mut body = Self::new(&BodyConfig {
            x: position.x,
            y: position.y,
            ..BodyConfig::default()
        });
        body.blocked.down = grounded;
        body
    }

    /// Force the ground contact flag.
    pub fn set_on_ground(&mut self, grounded: bool) {
        self.blocked.down = grounded;
    }

    /// Mutable access to all contact flags.
    pub fn blocked_mut(&mut self) -> &mut BlockedState {
        &mut self.blocked
    }

    /// Teleport without touching velocity.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// The additional gravity last written by gameplay code.
    #[must_use]
    pub fn gravity_y(&self) -> f32 {
        self.gravity_y
    }

    /// Current acceleration.
    #[must_use]
    pub fn acceleration(&self) -> Vec2 {
        self.acceleration
    }

    /// Collision offset.
    #[must_use]
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Integrate one step of `dt` seconds.
    ///
    /// Vertical acceleration is `world_gravity.y + gravity_y + acceleration.y`.
    /// The bottom edge of the body is clamped to `floor_y`; landing sets
    /// `blocked.down` and zeroes (or bounces) vertical velocity.
    pub fn step(&mut self, dt: f32, world_gravity: Vec2, floor_y: f32) {
        if !self.enabled || self.is_static || dt <= 0.0 || !dt.is_finite() {
            return;
        }

        self.velocity.x += (world_gravity.x + self.acceleration.x) * dt;
        self.velocity.y += (world_gravity.y + self.gravity_y + self.acceleration.y) * dt;

        if self.acceleration.x == 0.0 && self.drag.x > 0.0 {
            let reduce = self.drag.x * dt;
            if self.velocity.x.abs() <= reduce {
                self.velocity.x = 0.0;
            } else {
                self.velocity.x -= reduce * self.velocity.x.signum();
            }
        }

        self.velocity.x = self.velocity.x.clamp(-self.max_velocity.x, self.max_velocity.x);
        self.velocity.y = self.velocity.y.clamp(-self.max_velocity.y, self.max_velocity.y);

        self.position += self.velocity * dt;

        let bottom = self.position.y + self.size.y;
        if bottom >= floor_y && self.velocity.y >= 0.0 {
            self.position.y = floor_y - self.size.y;
            self.velocity.y = -self.velocity.y * self.bounce.y;
            self.blocked.down = true;
        } else {
            self.blocked.down = false;
        }
    }
}

impl Default for SimBody {
    fn default() -> Self {
        Self::new(&BodyConfig::default())
    }
}

impl Body for SimBody {
    fn id(&self) -> BodyId {
        self.id
    }
    fn position(&self) -> Vec2 {
        self.position
    }
    fn velocity(&self) -> Vec2 {
        self.velocity
    }
    fn is_on_ground(&self) -> bool {
        self.blocked.down
    }
    fn is_touching_wall(&self) -> bool {
        self.blocked.left || self.blocked.right
    }
    fn is_touching_ceiling(&self) -> bool {
        self.blocked.up
    }
    fn blocked(&self) -> BlockedState {
        self.blocked
    }
    fn enabled(&self) -> bool {
        self.enabled
    }
    fn width(&self) -> f32 {
        self.size.x
    }
    fn height(&self) -> f32 {
        self.size.y
    }
    fn set_velocity(&mut self, x: f32, y: f32) {
        self.velocity = Vec2::new(x, y);
    }
    fn set_velocity_x(&mut self, x: f32) {
        self.velocity.x = x;
    }
    fn set_velocity_y(&mut self, y: f32) {
        self.velocity.y = y;
    }
    fn set_acceleration(&mut self, x: f32, y: f32) {
        self.acceleration = Vec2::new(x, y);
    }
    fn set_acceleration_x(&mut self, x: f32) {
        self.acceleration.x = x;
    }
    fn set_gravity_y(&mut self, y: f32) {
        self.gravity_y = y;
    }
    fn set_drag(&mut self, x: f32, y: f32) {
        self.drag = Vec2::new(x, y);
    }
    fn set_max_velocity(&mut self, x: f32, y: f32) {
        self.max_velocity = Vec2::new(x, y);
    }
    fn set_bounce(&mut self, x: f32, y: f32) {
        self.bounce = Vec2::new(x, y);
    }
    fn set_size(&mut self, width: f32, height: f32) {
        self.size = Vec2::new(width, height);
    }
    fn set_offset(&mut self, x: f32, y: f32) {
        self.offset = Vec2::new(x, y);
    }
    fn set_enable(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}
