//! Sprite animation tables.
//!
//! Pure data. The presentation layer turns these into engine animations and
//! picks one per frame from the gameplay snapshot.

use serde::{Deserialize, Serialize};

use crate::player::PlayerState;

/// How many times an animation repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Repeat {
    /// Play once and hold the last frame
    Once,
    /// Loop forever
    Loop,
}

/// One animation over a contiguous frame range of a spritesheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnimationDef {
    /// Animation key
    pub key: &'static str,
    /// Spritesheet texture key
    pub texture_key: String,
    /// First frame (inclusive)
    pub start_frame: u32,
    /// Last frame (inclusive)
    pub end_frame: u32,
    /// Frames per second
    pub frame_rate: u32,
    /// Repeat mode
    pub repeat: Repeat,
}

impl AnimationDef {
    fn new(
        key: &'static str,
        texture_key: &str,
        frames: (u32, u32),
        frame_rate: u32,
        repeat: Repeat,
    ) -> Self {
        Self {
            key,
            texture_key: texture_key.to_string(),
            start_frame: frames.0,
            end_frame: frames.1,
            frame_rate,
            repeat,
        }
    }

    /// Number of frames in the range.
    #[must_use]
    pub fn frame_count(&self) -> u32 {
        self.end_frame.saturating_sub(self.start_frame) + 1
    }
}

/// Player idle.
pub const PLAYER_IDLE: &str = "player-idle";
/// Player run.
pub const PLAYER_RUN: &str = "player-run";
/// Player jump.
pub const PLAYER_JUMP: &str = "player-jump";
/// Player fall.
pub const PLAYER_FALL: &str = "player-fall";
/// Skeleton idle.
pub const SKELETON_IDLE: &str = "skeleton-idle";
/// Skeleton walk.
pub const SKELETON_WALK: &str = "skeleton-walk";
/// Coin spin.
pub const COIN_SPIN: &str = "coin-spin";

/// Animation key for a player state. States without their own art reuse idle.
#[must_use]
pub const fn player_anim_key(state: PlayerState) -> &'static str {
    match state {
        PlayerState::Idle | PlayerState::Attacking | PlayerState::Hurt | PlayerState::Dead => {
            PLAYER_IDLE
        }
        PlayerState::Running => PLAYER_RUN,
        PlayerState::Jumping => PLAYER_JUMP,
        PlayerState::Falling => PLAYER_FALL,
    }
}

/// Player animations on a single sheet.
///
/// Frames 0-3 idle, 4-7 run, 8 jump (reused for fall).
#[must_use]
pub fn player_animation_defs(texture_key: &str) -> Vec<AnimationDef> {
    vec![
        AnimationDef::new(PLAYER_IDLE, texture_key, (0, 3), 8, Repeat::Loop),
        AnimationDef::new(PLAYER_RUN, texture_key, (4, 7), 10, Repeat::Loop),
        AnimationDef::new(PLAYER_JUMP, texture_key, (8, 8), 10, Repeat::Once),
        AnimationDef::new(PLAYER_FALL, texture_key, (8, 8), 10, Repeat::Once),
    ]
}

/// Skeleton animations, one sheet each.
#[must_use]
pub fn skeleton_animation_defs() -> Vec<AnimationDef> {
    vec![
        AnimationDef::new(SKELETON_IDLE, "enemy-skeleton-idle", (0, 5), 8, Repeat::Loop),
        AnimationDef::new(SKELETON_WALK, "enemy-skeleton-walk", (0, 9), 10, Repeat::Loop),
    ]
}

/// Skeleton animation when standing still.
#[must_use]
pub const fn skeleton_default_anim() -> &'static str {
    SKELETON_IDLE
}

/// Skeleton animation for a horizontal velocity.
#[must_use]
pub fn skeleton_anim_for_velocity(velocity_x: f32) -> &'static str {
    if velocity_x == 0.0 {
        SKELETON_IDLE
    } else {
        SKELETON_WALK
    }
}

/// Coin animations.
#[must_use]
pub fn coin_animation_defs() -> Vec<AnimationDef> {
    vec![AnimationDef::new(COIN_SPIN, "collectible-coin", (0, 3), 8, Repeat::Loop)]
}

/// Coin animation key.
#[must_use]
pub const fn coin_default_anim() -> &'static str {
    COIN_SPIN
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::AHashSet;

    fn find<'a>(defs: &'a [AnimationDef], key: &str) -> &'a AnimationDef {
        defs.iter()
            .find(|d| d.key == key)
            .unwrap_or_else(|| panic!("missing animation {key}"))
    }

    #[test]
    fn test_state_mapping() {
        assert_eq!(player_anim_key(PlayerState::Idle), "player-idle");
        assert_eq!(player_anim_key(PlayerState::Running), "player-run");
        assert_eq!(player_anim_key(PlayerState::Jumping), "player-jump");
        assert_eq!(player_anim_key(PlayerState::Falling), "player-fall");
        assert_eq!(player_anim_key(PlayerState::Attacking), "player-idle");
        assert_eq!(player_anim_key(PlayerState::Hurt), "player-idle");
        assert_eq!(player_anim_key(PlayerState::Dead), "player-idle");
    }

    #[test]
    fn test_player_defs() {
        let defs = player_animation_defs("custom-texture");
        assert_eq!(defs.len(), 4);
        assert!(defs.iter().all(|d| d.texture_key == "custom-texture"));

        let keys: AHashSet<_> = defs.iter().map(|d| d.key).collect();
        assert_eq!(keys.len(), defs.len());

        let idle = find(&defs, PLAYER_IDLE);
        assert_eq!((idle.start_frame, idle.end_frame), (0, 3));
        assert_eq!(idle.repeat, Repeat::Loop);

        let run = find(&defs, PLAYER_RUN);
        assert_eq!((run.start_frame, run.end_frame), (4, 7));
        assert_eq!(run.frame_count(), 4);

        for key in [PLAYER_JUMP, PLAYER_FALL] {
            let def = find(&defs, key);
            assert_eq!(def.start_frame, def.end_frame);
            assert_eq!(def.repeat, Repeat::Once);
        }
    }

    #[test]
    fn test_skeleton_defs() {
        let defs = skeleton_animation_defs();
        assert_eq!(defs.len(), 2);

        let idle = find(&defs, SKELETON_IDLE);
        assert_eq!(idle.texture_key, "enemy-skeleton-idle");
        assert_eq!(idle.frame_count(), 6);

        let walk = find(&defs, SKELETON_WALK);
        assert_eq!(walk.texture_key, "enemy-skeleton-walk");
        assert_eq!(walk.end_frame, 9);
        assert_eq!(walk.frame_rate, 10);

        assert_eq!(skeleton_default_anim(), "skeleton-idle");
        assert_eq!(skeleton_anim_for_velocity(-60.0), SKELETON_WALK);
        assert_eq!(skeleton_anim_for_velocity(0.0), SKELETON_IDLE);
    }

    #[test]
    fn test_coin_defs() {
        let defs = coin_animation_defs();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].key, coin_default_anim());
        assert_eq!(defs[0].texture_key, "collectible-coin");
        assert_eq!(defs[0].frame_count(), 4);
    }
}
