//! Scripted input for a replay.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;
use wyn_common::{ConfigError, Vec2};
use wyn_gameplay::{Action, StarThresholds};

/// What happens at the start of one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptStep {
    /// Frame number (1-based, matching the clock's frame counter)
    pub frame: u64,
    /// Actions pressed this frame
    pub press: Vec<Action>,
    /// Actions released this frame
    pub release: Vec<Action>,
    /// Damage dealt to the player
    pub damage: Option<i32>,
    /// Respawn the player
    pub respawn: bool,
}

/// Coins and exit for a replay level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelGoal {
    /// The level completes once the player's x reaches this
    pub exit_x: f32,
    /// Coin positions, picked up when inside the player's body box
    #[serde(default)]
    pub coins: Vec<Vec2>,
    /// Scores needed for each star
    pub stars: StarThresholds,
}

/// An ordered list of steps, plus an optional level goal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Script {
    /// Steps, in any order
    pub steps: Vec<ScriptStep>,
    /// Exit and coins; without one the replay never completes
    pub goal: Option<LevelGoal>,
}

impl Script {
    /// Parse from RON text. Steps are sorted by frame.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let mut script: Self = ron::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        script.steps.sort_by_key(|step| step.frame);
        Ok(script)
    }

    /// Load from a RON file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let script = Self::from_ron_str(&text)?;
        info!("Loaded {} script steps from {}", script.steps.len(), path.display());
        Ok(script)
    }

    /// Steps scheduled for `frame`.
    pub fn steps_at(&self, frame: u64) -> impl Iterator<Item = &ScriptStep> {
        self.steps.iter().filter(move |step| step.frame == frame)
    }

    /// Last frame any step touches.
    #[must_use]
    pub fn last_frame(&self) -> u64 {
        self.steps.iter().map(|step| step.frame).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JUMP: &str = r"(
        steps: [
            (frame: 10, release: [jump]),
            (frame: 2, press: [right, jump]),
            (frame: 40, damage: Some(30)),
        ],
    )";

    #[test]
    fn test_parse_sorts_steps() {
        let script = Script::from_ron_str(JUMP).expect("script parses");
        let frames: Vec<u64> = script.steps.iter().map(|s| s.frame).collect();
        assert_eq!(frames, vec![2, 10, 40]);
        assert_eq!(script.steps[0].press, vec![Action::Right, Action::Jump]);
        assert_eq!(script.steps[2].damage, Some(30));
        assert!(!script.steps[2].respawn);
    }

    #[test]
    fn test_steps_at() {
        let script = Script::from_ron_str(JUMP).expect("script parses");
        assert_eq!(script.steps_at(10).count(), 1);
        assert_eq!(script.steps_at(11).count(), 0);
        assert_eq!(script.last_frame(), 40);
    }

    #[test]
    fn test_parse_goal() {
        let text = r"(
            steps: [(frame: 1, press: [right])],
            goal: Some((
                exit_x: 300.0,
                coins: [(x: 40.0, y: 190.0)],
                stars: (one_star: 100, two_star: 300, three_star: 500),
            )),
        )";
        let script = Script::from_ron_str(text).expect("script with goal parses");
        let goal = script.goal.expect("goal present");
        assert_eq!(goal.exit_x, 300.0);
        assert_eq!(goal.coins, vec![Vec2::new(40.0, 190.0)]);
        assert_eq!(goal.stars.two_star, 300);
    }

    #[test]
    fn test_empty_script() {
        let script = Script::from_ron_str("()").expect("empty script parses");
        assert!(script.steps.is_empty());
        assert_eq!(script.last_frame(), 0);
    }

    #[test]
    fn test_bad_action() {
        let err = Script::from_ron_str("(steps: [(frame: 1, press: [fly])])");
        assert!(matches!(err, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_bundled_script() {
        let source = include_str!("../scripts/jump.ron");
        let script = Script::from_ron_str(source).expect("bundled script parses");
        assert_eq!(script.last_frame(), 110);
        assert_eq!(script.steps_at(100).next().map(|s| s.release.len()), Some(2));
    }

    #[test]
    fn test_bundled_level() {
        let source = include_str!("../scripts/level.ron");
        let script = Script::from_ron_str(source).expect("bundled level parses");
        let goal = script.goal.expect("level has a goal");
        assert_eq!(goal.coins.len(), 2);
        assert!(goal.stars.one_star < goal.stars.three_star);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("jump.ron");
        std::fs::write(&path, JUMP).expect("write script");
        let script = Script::load_from(&path).expect("script loads");
        assert_eq!(script.steps.len(), 3);

        let missing = Script::load_from(dir.path().join("nope.ron"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
