//! Authoritative Simulation Tick
//!
//! `MatchController` owns the `SimulationState` of a locally simulated match
//! and runs one tick per rendered frame:
//!
//! 1. every paddle control computes its delta from the same snapshot
//! 2. deltas are applied with clamping
//! 3. the physics step runs
//! 4. a ball that left the field is judged, scored and re-served
//! 5. a slot at the win score ends the match and the result is reported

use tracing::{debug, info};
use uuid::Uuid;

use crate::core::rng::MatchRng;
use crate::game::config::{ConfigError, MatchConfig};
use crate::game::events::{self, GameEvent};
use crate::game::input::{InputContext, InputTable, KeyState, PaddleControl};
use crate::game::map::generate_obstacles;
use crate::game::physics;
use crate::game::report::{LogReporter, MatchReport, ResultReporter};
use crate::game::scoring::{apply_outcome, exited_edge, judge, serve};
use crate::game::state::{MatchPhase, SimulationState, Slot};

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick
    pub events: Vec<GameEvent>,
    /// Whether the match has ended
    pub match_ended: bool,
    /// Winner, once the match has ended
    pub winner: Option<Slot>,
}

/// Owner of a locally simulated match.
pub struct MatchController {
    match_id: Uuid,
    config: MatchConfig,
    state: SimulationState,
    controls: Vec<PaddleControl>,
    reporter: Box<dyn ResultReporter>,
    winner: Option<Slot>,
}

impl MatchController {
    /// Set up a match: paddles at home, obstacles generated, ball at rest.
    pub fn new(config: MatchConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let match_id = Uuid::new_v4();
        let rng = match config.seed {
            Some(seed) => MatchRng::new(seed),
            None => MatchRng::from_match_id(&match_id),
        };

        let mut state = SimulationState::new(&config, rng);
        state.obstacles = generate_obstacles(
            &mut state.rng,
            &config.field,
            &config.params,
            config.obstacle_count,
        );

        let difficulty = config.difficulty();
        let controls = state
            .paddles
            .iter()
            .map(|p| PaddleControl::from_role(p.role, difficulty, &config.params))
            .collect();

        debug!(
            %match_id,
            participants = ?config.participants,
            connection = ?config.connection,
            obstacles = state.obstacles.len(),
            "Match set up"
        );

        Ok(Self {
            match_id,
            config,
            state,
            controls,
            reporter: Box::new(LogReporter),
            winner: None,
        })
    }

    /// Replace the result reporter.
    pub fn with_reporter(mut self, reporter: Box<dyn ResultReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Match identifier.
    pub fn match_id(&self) -> Uuid {
        self.match_id
    }

    /// Match configuration.
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Current state.
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Mutable state, for tooling and tests.
    pub fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.state
    }

    /// Lifecycle phase.
    pub fn phase(&self) -> MatchPhase {
        self.state.phase
    }

    /// Winner, once ended.
    pub fn winner(&self) -> Option<Slot> {
        self.winner
    }

    /// Serve the first ball. No-op unless waiting.
    pub fn start(&mut self) -> Vec<GameEvent> {
        if self.state.phase != MatchPhase::Waiting {
            return Vec::new();
        }
        self.state.phase = MatchPhase::Running;

        let slots = self.config.participants.slots();
        let toward = self.state.rng.choose(slots).copied().unwrap_or(Slot::Right);
        self.serve_toward(toward);

        info!(match_id = %self.match_id, first_serve = ?toward, "Match started");
        self.state.take_events()
    }

    /// Run one tick.
    ///
    /// `remote` is the host's input table; local matches pass `None`.
    pub fn tick(&mut self, keys: &KeyState, remote: Option<&InputTable>) -> TickResult {
        let mut result = TickResult::default();

        match self.state.phase {
            MatchPhase::Waiting => return result,
            MatchPhase::Ended => {
                result.match_ended = true;
                result.winner = self.winner;
                return result;
            }
            MatchPhase::Running => {}
        }

        self.state.tick += 1;

        // 1-2. Paddle movement
        self.apply_moves(keys, remote);

        // 3. Ball
        physics::step(&mut self.state, &self.config.params);

        // 4-5. Goals and end of match
        self.process_goal();

        result.events = self.state.take_events();
        result.match_ended = self.state.is_ended();
        result.winner = self.winner;
        result
    }

    fn apply_moves(&mut self, keys: &KeyState, remote: Option<&InputTable>) {
        let ctx = InputContext { keys, remote };
        let params = &self.config.params;

        let deltas: Vec<(Slot, f32)> = self
            .controls
            .iter_mut()
            .zip(self.state.paddles.iter())
            .map(|(control, paddle)| {
                (paddle.slot, control.compute_move(paddle.slot, &self.state, &ctx, params))
            })
            .collect();

        for (slot, delta) in deltas {
            self.state.move_paddle(slot, delta, params);
        }
    }

    fn process_goal(&mut self) {
        let conceded = match exited_edge(&self.state.ball, &self.state) {
            Some(slot) => slot,
            None => return,
        };

        let outcome = judge(self.config.participants, &self.state.rally, conceded);
        apply_outcome(&mut self.state, &outcome);
        debug!(tick = self.state.tick, ?outcome, scores = ?self.state.scores.as_slice(), "Ball out");

        match self.state.scores.reached(self.config.win_score) {
            Some(winner) => self.finish(winner),
            None => self.serve_toward(conceded),
        }
    }

    fn serve_toward(&mut self, toward: Slot) {
        serve(&mut self.state, toward, &self.config.params);
        for control in self.controls.iter_mut() {
            if let Some(ai) = control.as_ai_mut() {
                ai.reroll(&mut self.state.rng);
            }
        }
    }

    fn finish(&mut self, winner: Slot) {
        self.state.phase = MatchPhase::Ended;
        self.winner = Some(winner);

        let tick = self.state.tick;
        self.state.push_event(events::match_ended(tick, winner));

        let report = MatchReport {
            match_id: self.match_id,
            participants: self.config.participants,
            final_scores: self.state.scores.as_slice().to_vec(),
            winner,
            winner_name: self.config.display_name(winner),
            duration_ticks: tick,
            finished_at: chrono::Utc::now(),
        };
        info!(
            match_id = %self.match_id,
            winner = %report.winner_name,
            scores = ?report.final_scores,
            "Match ended"
        );
        self.reporter.report(&report);
    }
}

// =============================================================================
// TESTS
// =============================================================================
