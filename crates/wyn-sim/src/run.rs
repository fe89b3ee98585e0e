//! Fixed-step replay of a script against the player controller.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, info_span, warn};
use wyn_common::Vec2;
use wyn_gameplay::{
    Action, Body, BodyConfig, CharacterStats, CollectibleManager, DiagnosticsConfig, EventBus,
    EventHandler, FrameClock, GameClock, GameEvent, InputManager, InputProvider, PlatformerConfig,
    PlayerController, PlayerSnapshot, ScoreTracker, SimBody, TracingDiagnostics,
};

use crate::args::SimArgs;
use crate::script::{LevelGoal, Script};

/// Everything a replay needs.
#[derive(Debug, Clone, Default)]
pub struct SimSetup {
    /// Platformer tuning
    pub config: PlatformerConfig,
    /// Character stats
    pub stats: CharacterStats,
    /// Diagnostics settings
    pub diagnostics: DiagnosticsConfig,
    /// Input script
    pub script: Script,
    /// Frames to simulate
    pub frames: u64,
    /// Frame time (ms)
    pub delta_ms: f64,
    /// Floor height
    pub floor_y: f32,
}

impl SimSetup {
    /// Load every file named on the command line.
    ///
    /// Tuning files fall back to defaults; a script that fails to load is an error.
    pub fn from_args(args: &SimArgs) -> Result<Self> {
        let config = args
            .config
            .as_deref()
            .map(PlatformerConfig::load_or_default)
            .unwrap_or_default();
        let stats = args
            .stats
            .as_deref()
            .map(CharacterStats::load_or_default)
            .unwrap_or_default();
        let diagnostics = args
            .diagnostics
            .as_deref()
            .map(DiagnosticsConfig::load_or_default)
            .unwrap_or_default();
        let script = match &args.script {
            Some(path) => Script::load_from(path)?,
            None => Script::default(),
        };
        if script.last_frame() > args.frames {
            warn!(
                "Script runs to frame {} but only {} frames will be simulated",
                script.last_frame(),
                args.frames
            );
        }

        Ok(Self {
            config,
            stats,
            diagnostics,
            script,
            frames: args.frames,
            delta_ms: args.delta_ms,
            floor_y: args.floor_y,
        })
    }
}

/// One line of replay output.
#[derive(Debug, Clone, Serialize)]
pub struct FrameRecord {
    /// Clock frame number
    pub frame: u64,
    /// Elapsed time (ms)
    pub elapsed_ms: f64,
    /// Animation key for the state
    pub animation: &'static str,
    /// Player view after the physics step
    #[serde(flatten)]
    pub snapshot: PlayerSnapshot,
}

/// Result of a replay.
#[derive(Debug, Default)]
pub struct SimOutcome {
    /// One record per frame
    pub records: Vec<FrameRecord>,
    /// Events published during the run, in order
    pub events: Vec<GameEvent>,
}

/// Logs drained events and keeps them in order.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<GameEvent>>,
}

impl EventLog {
    /// Events seen so far.
    #[must_use]
    pub fn into_events(self) -> Vec<GameEvent> {
        self.events.into_inner()
    }
}

impl EventHandler for EventLog {
    fn handle(&self, event: &GameEvent) {
        info!(?event, "Game event");
        self.events.lock().push(event.clone());
    }
}

/// Coin pickups and the exit check for a level goal.
struct LevelProgress<'a> {
    goal: &'a LevelGoal,
    collectibles: CollectibleManager,
    score: ScoreTracker,
}

impl<'a> LevelProgress<'a> {
    fn new(goal: &'a LevelGoal, bus: &EventBus) -> Self {
        let mut collectibles = CollectibleManager::new().with_events(bus.sender());
        collectibles.init(&goal.coins);
        Self {
            goal,
            collectibles,
            score: ScoreTracker::new(),
        }
    }

    /// Pick up overlapped coins, then publish completion once the exit is
    /// reached. Returns whether the level is complete.
    fn advance(&mut self, position: Vec2, size: Vec2, elapsed_ms: f64, bus: &EventBus) -> bool {
        for (index, coin) in self.goal.coins.iter().enumerate() {
            let inside = coin.x >= position.x
                && coin.x <= position.x + size.x
                && coin.y >= position.y
                && coin.y <= position.y + size.y;
            if inside {
                let result = self.collectibles.collect(index);
                self.score.add_coins(result.coin_count);
            }
        }

        if position.x < self.goal.exit_x {
            return false;
        }
        let score = self.score.final_score(elapsed_ms);
        let stars = self.score.star_rating(score, &self.goal.stars);
        info!(
            "Level complete: {} of {} coins, score {score}, {stars} stars",
            self.collectibles.collected_count(),
            self.collectibles.total()
        );
        bus.publish(GameEvent::LevelCompleted {
            score,
            stars,
            time_ms: elapsed_ms,
        });
        true
    }
}

/// Feed a scripted action to the keyboard as its primary key.
fn set_key(input: &mut InputManager, action: Action, down: bool) {
    let Some(key) = input.binding(action).map(|binding| binding.primary) else {
        warn!(?action, "No key bound, ignoring");
        return;
    };
    if down {
        input.key_down(key);
    } else {
        input.key_up(key);
    }
}

/// Run the replay.
///
/// Per frame: advance the clock, apply the step's script entries as key
/// events, latch input edges, update the controller, then integrate the body
/// against the floor. With a level goal the replay stops on the frame the
/// exit is reached.
pub fn simulate(setup: &SimSetup) -> SimOutcome {
    let body_dims = &setup.config.body;
    let spawn = spawn_position(setup);
    let mut body = SimBody::new(&BodyConfig {
        x: spawn.x,
        y: spawn.y,
        width: body_dims.width,
        height: body_dims.height,
        offset_x: body_dims.offset_x,
        offset_y: body_dims.offset_y,
        max_velocity_y: setup.config.movement.max_fall_speed,
        ..BodyConfig::default()
    });
    body.set_on_ground(true);

    let sink = Arc::new(TracingDiagnostics::new(setup.diagnostics.clone()));
    let bus = EventBus::default();
    let mut player = PlayerController::new(
        InputManager::new(),
        body,
        FrameClock::new(),
        setup.config.clone(),
        setup.stats.clone(),
    )
    .with_events(bus.sender())
    .with_diagnostics(Arc::clone(&sink));

    let gravity = setup.config.gravity;
    let dt = (setup.delta_ms / 1000.0) as f32;
    let size = Vec2::new(body_dims.width, body_dims.height);
    let mut level = setup
        .script
        .goal
        .as_ref()
        .map(|goal| LevelProgress::new(goal, &bus));
    let log = EventLog::default();
    let mut outcome = SimOutcome::default();

    for _ in 0..setup.frames {
        player.clock_mut().tick(setup.delta_ms);
        let frame = player.clock().frame();
        let _span = info_span!("frame", frame).entered();
        sink.sync_clock(player.clock());

        for step in setup.script.steps_at(frame) {
            debug!(?step, "Applying script step");
            for &action in &step.press {
                set_key(player.input_mut(), action, true);
            }
            for &action in &step.release {
                set_key(player.input_mut(), action, false);
            }
            if let Some(amount) = step.damage {
                let result = player.take_damage(amount);
                debug!(amount, ?result, "Scripted damage");
            }
            if step.respawn {
                player.respawn();
            }
        }

        player.input_mut().update();
        player.update();
        player.body_mut().step(dt, gravity, setup.floor_y);

        let elapsed_ms = player.clock().elapsed();
        let completed = level.as_mut().is_some_and(|level| {
            level.advance(player.body().position(), size, elapsed_ms, &bus)
        });
        bus.dispatch(&[&log]);

        let snapshot = player.snapshot();
        outcome.records.push(FrameRecord {
            frame,
            elapsed_ms,
            animation: snapshot.animation_key(),
            snapshot,
        });
        if completed {
            break;
        }
    }
    outcome.events = log.into_events();

    info!(
        "Simulated {} frames, {} events, final state {}",
        outcome.records.len(),
        outcome.events.len(),
        player.state().as_str()
    );
    outcome
}

/// Write records as JSON lines.
pub fn write_records<W: Write>(mut out: W, records: &[FrameRecord]) -> Result<()> {
    for record in records {
        serde_json::to_writer(&mut out, record)?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

/// Floor-standing start position used by [`simulate`].
#[must_use]
pub fn spawn_position(setup: &SimSetup) -> Vec2 {
    Vec2::new(0.0, setup.floor_y - setup.config.body.height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wyn_gameplay::{PlayerState, StarThresholds};

    use crate::script::ScriptStep;

    fn setup(steps: Vec<ScriptStep>, frames: u64) -> SimSetup {
        SimSetup {
            script: Script { steps, goal: None },
            frames,
            delta_ms: 16.0,
            floor_y: 200.0,
            ..SimSetup::default()
        }
    }

    #[test]
    fn test_idle_run() {
        let outcome = simulate(&setup(Vec::new(), 10));
        assert_eq!(outcome.records.len(), 10);
        assert!(outcome.events.is_empty());

        let last = &outcome.records[9];
        assert_eq!(last.frame, 10);
        assert_eq!(last.elapsed_ms, 160.0);
        assert_eq!(last.snapshot.state, PlayerState::Idle);
        assert_eq!(last.animation, "player-idle");
        assert!(last.snapshot.is_on_ground);
    }

    #[test]
    fn test_jump_arc_lands() {
        let steps = vec![ScriptStep {
            frame: 2,
            press: vec![Action::Jump],
            ..ScriptStep::default()
        }];
        let outcome = simulate(&setup(steps, 150));

        let states: Vec<PlayerState> = outcome.records.iter().map(|r| r.snapshot.state).collect();
        assert!(states.contains(&PlayerState::Jumping));
        assert!(states.contains(&PlayerState::Falling));
        assert_eq!(states.last(), Some(&PlayerState::Idle));

        assert!(matches!(
            outcome.events.first(),
            Some(GameEvent::PlayerJumped { air_jump: false, .. })
        ));
        assert_eq!(outcome.events.len(), 1);

        let apex = outcome
            .records
            .iter()
            .map(|r| r.snapshot.position.y)
            .fold(f32::INFINITY, f32::min);
        assert!(apex < 200.0 - 40.0 - 50.0);
    }

    #[test]
    fn test_damage_and_respawn() {
        let steps = vec![
            ScriptStep {
                frame: 3,
                damage: Some(30),
                ..ScriptStep::default()
            },
            ScriptStep {
                frame: 60,
                respawn: true,
                ..ScriptStep::default()
            },
        ];
        let outcome = simulate(&setup(steps, 61));

        assert_eq!(outcome.records[2].snapshot.state, PlayerState::Hurt);
        assert_eq!(outcome.records[2].snapshot.health, 70);
        assert_eq!(outcome.records[60].snapshot.health, 100);
        assert!(matches!(outcome.events[0], GameEvent::PlayerHurt { amount: 30, .. }));
        assert!(matches!(
            outcome.events.last(),
            Some(GameEvent::PlayerRespawned { .. })
        ));
    }

    #[test]
    fn test_script_drives_keyboard() {
        let steps = vec![
            ScriptStep {
                frame: 1,
                press: vec![Action::Right],
                ..ScriptStep::default()
            },
            ScriptStep {
                frame: 5,
                release: vec![Action::Right],
                ..ScriptStep::default()
            },
        ];
        let outcome = simulate(&setup(steps, 8));

        assert_eq!(outcome.records[0].snapshot.state, PlayerState::Running);
        assert!(outcome.records[3].snapshot.position.x > 0.0);
        assert_eq!(outcome.records[7].snapshot.state, PlayerState::Idle);
    }

    #[test]
    fn test_level_completes_at_exit() {
        let thresholds = StarThresholds {
            one_star: 100,
            two_star: 300,
            three_star: 9_999,
        };
        let mut level = setup(
            vec![ScriptStep {
                frame: 1,
                press: vec![Action::Right],
                ..ScriptStep::default()
            }],
            60,
        );
        level.script.goal = Some(LevelGoal {
            exit_x: 100.0,
            coins: vec![Vec2::new(40.0, 190.0), Vec2::new(40.0, 20.0)],
            stars: thresholds,
        });
        let outcome = simulate(&level);

        assert!(outcome.records.len() < 60);
        let last = outcome.records.last().expect("at least one frame");
        assert!(last.snapshot.position.x >= 100.0);

        assert_eq!(outcome.events.len(), 2);
        assert_eq!(
            outcome.events[0],
            GameEvent::CollectiblePickedUp { index: 0, coins: 1 }
        );
        let GameEvent::LevelCompleted {
            score,
            stars,
            time_ms,
        } = outcome.events[1]
        else {
            panic!("expected level completion, got {:?}", outcome.events[1]);
        };
        assert_eq!(time_ms, last.elapsed_ms);

        let mut expected = ScoreTracker::new();
        expected.add_coins(1);
        assert_eq!(score, expected.final_score(time_ms));
        assert_eq!(stars, 2);
    }

    #[test]
    fn test_without_goal_runs_every_frame() {
        let steps = vec![ScriptStep {
            frame: 1,
            press: vec![Action::Right],
            ..ScriptStep::default()
        }];
        let outcome = simulate(&setup(steps, 40));
        assert_eq!(outcome.records.len(), 40);
        assert!(outcome.events.is_empty());
    }

    #[test]
    fn test_write_records() {
        let outcome = simulate(&setup(Vec::new(), 3));
        let mut out = Vec::new();
        write_records(&mut out, &outcome.records).expect("write to vec");

        let text = String::from_utf8(out).expect("utf8 output");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);

        let first: serde_json::Value = serde_json::from_str(lines[0]).expect("json line");
        assert_eq!(first["frame"], 1);
        assert_eq!(first["state"], "idle");
        assert_eq!(first["animation"], "player-idle");
    }

    #[test]
    fn test_setup_from_args() {
        let dir = tempfile::tempdir().expect("tempdir");
        let script = dir.path().join("script.ron");
        std::fs::write(&script, "(steps: [(frame: 1, press: [left])])").expect("write script");

        let args = SimArgs {
            script: Some(script),
            config: Some(dir.path().join("missing.ron")),
            frames: 5,
            ..SimArgs::default()
        };
        let setup = SimSetup::from_args(&args).expect("setup loads");
        assert_eq!(setup.frames, 5);
        assert_eq!(setup.script.steps.len(), 1);
        assert_eq!(setup.config, PlatformerConfig::default());
        assert_eq!(spawn_position(&setup), Vec2::new(0.0, 160.0));
    }

    #[test]
    fn test_missing_script_is_an_error() {
        let args = SimArgs {
            script: Some("/nonexistent/script.ron".into()),
            ..SimArgs::default()
        };
        assert!(SimSetup::from_args(&args).is_err());
    }
}
