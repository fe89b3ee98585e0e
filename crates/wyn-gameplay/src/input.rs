//! Input handling for player controls.
//!
//! Gameplay reads input only through [`InputProvider`]: per-action held /
//! just-pressed / just-released state plus continuous axes. The host must
//! call [`InputProvider::update`] once per frame *before* any gameplay
//! update so that the edge flags are valid for exactly one frame.
//!
//! Two providers ship here: [`InputManager`] for rebindable keyboard input
//! and [`ScriptedInput`] for deterministic replays and tests.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur in the input system.
#[derive(Debug, Clone, Error)]
pub enum InputError {
    /// Key already bound to another action
    #[error("key {key:?} already bound to action: {action:?}")]
    KeyAlreadyBound {
        /// The key that's already bound
        key: KeyCode,
        /// The action it's bound to
        action: Action,
    },
}

/// Logical game actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// Jump
    Jump,
    /// Move left
    Left,
    /// Move right
    Right,
    /// Crouch / fast fall
    Down,
    /// Attack
    Attack,
    /// Interact with the world
    Interact,
    /// Pause the game
    Pause,
    /// Character ability
    Ability,
    /// Menu navigation up
    MenuUp,
    /// Menu navigation down
    MenuDown,
    /// Menu navigation left
    MenuLeft,
    /// Menu navigation right
    MenuRight,
    /// Menu confirm
    MenuConfirm,
    /// Menu back
    MenuBack,
}

impl Action {
    /// Every action, in declaration order.
    pub const ALL: [Self; 14] = [
        Self::Jump,
        Self::Left,
        Self::Right,
        Self::Down,
        Self::Attack,
        Self::Interact,
        Self::Pause,
        Self::Ability,
        Self::MenuUp,
        Self::MenuDown,
        Self::MenuLeft,
        Self::MenuRight,
        Self::MenuConfirm,
        Self::MenuBack,
    ];
}

/// Continuous input axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Axis {
    /// Left (-1) to right (+1)
    Horizontal,
    /// Up (-1) to down (+1)
    Vertical,
}

/// Source of per-frame input state.
pub trait InputProvider {
    /// Capture edge transitions for this frame. Called once per frame,
    /// before gameplay logic runs.
    fn update(&mut self);

    /// True while the action is held.
    fn is_down(&self, action: Action) -> bool;

    /// True only on the frame the action went from up to down.
    fn just_pressed(&self, action: Action) -> bool;

    /// True only on the frame the action went from down to up.
    fn just_released(&self, action: Action) -> bool;

    /// Axis value; -1, 0 or +1 for digital input, continuous for analog.
    fn axis(&self, axis: Axis) -> f32;
}

impl<T: InputProvider + ?Sized> InputProvider for &mut T {
    fn update(&mut self) {
        (**self).update();
    }

    fn is_down(&self, action: Action) -> bool {
        (**self).is_down(action)
    }

    fn just_pressed(&self, action: Action) -> bool {
        (**self).just_pressed(action)
    }

    fn just_released(&self, action: Action) -> bool {
        (**self).just_released(action)
    }

    fn axis(&self, axis: Axis) -> f32 {
        (**self).axis(axis)
    }
}

/// Digital axis value from a negative and a positive action.
fn digital_axis<P>(provider: &P, negative: Action, positive: Action) -> f32
where
    P: InputProvider + ?Sized,
{
    let neg = if provider.is_down(negative) { -1.0 } else { 0.0 };
    let pos = if provider.is_down(positive) { 1.0 } else { 0.0 };
    neg + pos
}

/// Key codes for keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    /// A key
    A,
    /// D key
    D,
    /// E key
    E,
    /// J key
    J,
    /// K key
    K,
    /// P key
    P,
    /// Q key
    Q,
    /// S key
    S,
    /// W key
    W,
    /// X key
    X,
    /// Z key
    Z,
    /// Space bar
    Space,
    /// Enter/Return
    Enter,
    /// Escape
    Escape,
    /// Backspace
    Backspace,
    /// Left Shift
    LShift,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
}

/// State of a button (pressed, just pressed, released).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonState {
    /// Whether the button is currently held down
    pub pressed: bool,
    /// Whether the button was just pressed this frame
    pub just_pressed: bool,
    /// Whether the button was just released this frame
    pub just_released: bool,
}

impl ButtonState {
    /// Create a new button state (not pressed).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pressed: false,
            just_pressed: false,
            just_released: false,
        }
    }

    /// Update the button state based on whether it's currently pressed.
    pub fn update(&mut self, is_pressed: bool) {
        self.just_pressed = is_pressed && !self.pressed;
        self.just_released = !is_pressed && self.pressed;
        self.pressed = is_pressed;
    }
}

/// Key binding configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBinding {
    /// Primary key for this action
    pub primary: KeyCode,
    /// Optional secondary key
    pub secondary: Option<KeyCode>,
}

impl KeyBinding {
    /// Create a new key binding with only a primary key.
    #[must_use]
    pub const fn new(primary: KeyCode) -> Self {
        Self {
            primary,
            secondary: None,
        }
    }

    /// Create a new key binding with primary and secondary keys.
    #[must_use]
    pub const fn with_secondary(primary: KeyCode, secondary: KeyCode) -> Self {
        Self {
            primary,
            secondary: Some(secondary),
        }
    }

    /// Check if a key matches this binding.
    #[must_use]
    pub fn matches(&self, key: KeyCode) -> bool {
        self.primary == key || self.secondary == Some(key)
    }
}

/// Keyboard input manager with rebindable actions.
///
/// Raw key events are collected with [`InputManager::key_down`] /
/// [`InputManager::key_up`] as they arrive; [`InputProvider::update`] then
/// folds the held key set into per-action [`ButtonState`]s.
#[derive(Debug, Clone)]
pub struct InputManager {
    /// Keys currently held according to raw events
    held_keys: AHashSet<KeyCode>,
    /// Per-action edge state, refreshed by `update`
    action_states: AHashMap<Action, ButtonState>,
    /// Action to key bindings
    bindings: AHashMap<Action, KeyBinding>,
    /// Analog axis values (gamepad/touch); zero means "use keys"
    analog: [f32; 2],
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Keyboard layout used by [`InputManager::new`] and [`InputManager::reset_bindings`].
const DEFAULT_BINDINGS: [(Action, KeyBinding); 14] = [
    (Action::Jump, KeyBinding::with_secondary(KeyCode::Space, KeyCode::W)),
    (Action::Left, KeyBinding::with_secondary(KeyCode::Left, KeyCode::A)),
    (Action::Right, KeyBinding::with_secondary(KeyCode::Right, KeyCode::D)),
    (Action::Down, KeyBinding::with_secondary(KeyCode::Down, KeyCode::S)),
    (Action::Attack, KeyBinding::with_secondary(KeyCode::J, KeyCode::Z)),
    (Action::Interact, KeyBinding::new(KeyCode::E)),
    (Action::Pause, KeyBinding::with_secondary(KeyCode::Escape, KeyCode::P)),
    (Action::Ability, KeyBinding::with_secondary(KeyCode::K, KeyCode::X)),
    (Action::MenuUp, KeyBinding::new(KeyCode::Up)),
    (Action::MenuDown, KeyBinding::new(KeyCode::Down)),
    (Action::MenuLeft, KeyBinding::new(KeyCode::Left)),
    (Action::MenuRight, KeyBinding::new(KeyCode::Right)),
    (Action::MenuConfirm, KeyBinding::new(KeyCode::Enter)),
    (Action::MenuBack, KeyBinding::with_secondary(KeyCode::Escape, KeyCode::Backspace)),
];

impl InputManager {
    /// Create a new input manager with default bindings.
    #[must_use]
    pub fn new() -> Self {
        let mut manager = Self {
            held_keys: AHashSet::new(),
            action_states: AHashMap::new(),
            bindings: AHashMap::new(),
            analog: [0.0; 2],
        };
        manager.reset_bindings();
        manager
    }

    /// Restore the default key bindings.
    pub fn reset_bindings(&mut self) {
        self.bindings.clear();
        self.bindings.extend(DEFAULT_BINDINGS);
    }

    /// Rebind an action's primary key.
    ///
    /// Fails if the key is already the primary key of another gameplay
    /// action. Menu actions intentionally share keys with gameplay actions.
    pub fn rebind(&mut self, action: Action, key: KeyCode) -> Result<(), InputError> {
        let conflict = self.bindings.iter().find(|(other, binding)| {
            **other != action && binding.primary == key && !is_menu(**other) && !is_menu(action)
        });
        if let Some((other, _)) = conflict {
            return Err(InputError::KeyAlreadyBound {
                key,
                action: *other,
            });
        }
        let secondary = self.bindings.get(&action).and_then(|b| b.secondary);
        self.bindings.insert(
            action,
            KeyBinding {
                primary: key,
                secondary,
            },
        );
        Ok(())
    }

    /// Get the current binding for an action.
    #[must_use]
    pub fn binding(&self, action: Action) -> Option<&KeyBinding> {
        self.bindings.get(&action)
    }

    /// Record a raw key press.
    pub fn key_down(&mut self, key: KeyCode) {
        self.held_keys.insert(key);
    }

    /// Record a raw key release.
    pub fn key_up(&mut self, key: KeyCode) {
        self.held_keys.remove(&key);
    }

    /// Set an analog axis value (gamepad stick or touch).
    pub fn set_analog_axis(&mut self, axis: Axis, value: f32) {
        self.analog[axis_index(axis)] = value;
    }

    fn action_held_raw(&self, action: Action) -> bool {
        self.bindings.get(&action).is_some_and(|binding| {
            self.held_keys.contains(&binding.primary)
                || binding
                    .secondary
                    .is_some_and(|key| self.held_keys.contains(&key))
        })
    }

    fn state(&self, action: Action) -> ButtonState {
        self.action_states.get(&action).copied().unwrap_or_default()
    }
}

fn is_menu(action: Action) -> bool {
    matches!(
        action,
        Action::MenuUp
            | Action::MenuDown
            | Action::MenuLeft
            | Action::MenuRight
            | Action::MenuConfirm
            | Action::MenuBack
    )
}

const fn axis_index(axis: Axis) -> usize {
    match axis {
        Axis::Horizontal => 0,
        Axis::Vertical => 1,
    }
}

impl InputProvider for InputManager {
    fn update(&mut self) {
        for action in Action::ALL {
            let held = self.action_held_raw(action);
            self.action_states.entry(action).or_default().update(held);
        }
    }

    fn is_down(&self, action: Action) -> bool {
        self.state(action).pressed
    }

    fn just_pressed(&self, action: Action) -> bool {
        self.state(action).just_pressed
    }

    fn just_released(&self, action: Action) -> bool {
        self.state(action).just_released
    }

    fn axis(&self, axis: Axis) -> f32 {
        let analog = self.analog[axis_index(axis)];
        if analog != 0.0 {
            return analog;
        }
        match axis {
            Axis::Horizontal => digital_axis(self, Action::Left, Action::Right),
            Axis::Vertical => digital_axis(self, Action::MenuUp, Action::Down),
        }
    }
}

/// Deterministic input provider.
///
/// Held actions are set directly; edge flags are queued and become visible
/// on the next [`InputProvider::update`], then are cleared on the one after.
/// Tests can also poke edge flags for the current frame with
/// [`ScriptedInput::set_just_pressed`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    held: AHashSet<Action>,
    just_pressed: AHashSet<Action>,
    just_released: AHashSet<Action>,
    pending_pressed: AHashSet<Action>,
    pending_released: AHashSet<Action>,
    horizontal_override: Option<f32>,
    vertical_override: Option<f32>,
}

impl ScriptedInput {
    /// Create an input with nothing held.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Press an action: held from now, just-pressed on the next update.
    pub fn press(&mut self, action: Action) {
        if self.held.insert(action) {
            self.pending_pressed.insert(action);
        }
    }

    /// Release an action: not held from now, just-released on the next update.
    pub fn release(&mut self, action: Action) {
        if self.held.remove(&action) {
            self.pending_released.insert(action);
        }
    }

    /// Set the held flag without generating an edge.
    pub fn hold(&mut self, action: Action, held: bool) {
        if held {
            self.held.insert(action);
        } else {
            self.held.remove(&action);
        }
    }

    /// Force the just-pressed flag for the current frame.
    pub fn set_just_pressed(&mut self, action: Action, value: bool) {
        if value {
            self.just_pressed.insert(action);
        } else {
            self.just_pressed.remove(&action);
        }
    }

    /// Force the just-released flag for the current frame.
    pub fn set_just_released(&mut self, action: Action, value: bool) {
        if value {
            self.just_released.insert(action);
        } else {
            self.just_released.remove(&action);
        }
    }

    /// Clear all edge flags for the current frame.
    pub fn clear_edges(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }

    /// Override the horizontal axis with an analog value.
    pub fn set_horizontal(&mut self, value: Option<f32>) {
        self.horizontal_override = value;
    }

    /// Override the vertical axis with an analog value.
    pub fn set_vertical(&mut self, value: Option<f32>) {
        self.vertical_override = value;
    }
}

impl InputProvider for ScriptedInput {
    fn update(&mut self) {
        self.just_pressed = std::mem::take(&mut self.pending_pressed);
        self.just_released = std::mem::take(&mut self.pending_released);
    }

    fn is_down(&self, action: Action) -> bool {
        self.held.contains(&action)
    }

    fn just_pressed(&self, action: Action) -> bool {
        self.just_pressed.contains(&action)
    }

    fn just_released(&self, action: Action) -> bool {
        self.just_released.contains(&action)
    }

    fn axis(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Horizontal => self
                .horizontal_override
                .unwrap_or_else(|| digital_axis(self, Action::Left, Action::Right)),
            Axis::Vertical => self
                .vertical_override
                .unwrap_or_else(|| digital_axis(self, Action::MenuUp, Action::Down)),
        }
    }
}
