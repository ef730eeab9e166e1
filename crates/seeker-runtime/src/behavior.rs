//! Behavior engine: the autonomous seek-heat machine plus the manual
//! override.
//!
//! The engine is ticked once per behavior cycle with the active
//! [`CommandTicket`] and the freshly fused [`SensorSnapshot`].  It returns a
//! [`BehaviorOutput`] naming the motion and indicator color for the cycle.
//!
//! # Command dispatch
//!
//! | Command | Output | Autonomous state |
//! |---|---|---|
//! | `Stop` | Idle, White | untouched |
//! | `Forward` / `Backward` | that motion for `manual_translate_cycles`, then revert | untouched |
//! | `SpinLeft` / `SpinRight` | that motion for `manual_spin_cycles`, then revert | untouched |
//! | `Attach` | [`AutonomousState::step`] | advanced |
//!
//! # Autonomous machine
//!
//! ```text
//!            heat && range < proximity
//!  Searching ─────────────────────────▶ Attached
//!     │  ▲                                  │
//!     │  └──────── receding > give_up ──────┘
//!     │ count == search_timeout
//!     ▼
//!   Panic ──── count > panic_cycles ───▶ Searching
//! ```
//!
//! Every transition resets the destination's `move_count` to 0.  Entering
//! `Attach` from any other command restarts at `Searching { move_count: 0 }`.
//!
//! # Example
//!
//! ```rust
//! use seeker_runtime::arbiter::CommandTicket;
//! use seeker_runtime::behavior::{BehaviorConfig, BehaviorEngine};
//! use seeker_types::{Command, IndicatorColor, MotionDecision, SensorSnapshot};
//!
//! let mut engine = BehaviorEngine::new(BehaviorConfig::default());
//! let ticket = CommandTicket { command: Command::Attach, generation: 1 };
//! let out = engine.step(ticket, &SensorSnapshot::default());
//! assert_eq!(out.motion, MotionDecision::SpinLeft);
//! assert_eq!(out.indicator, IndicatorColor::Blue);
//! ```

use seeker_types::{BehaviorPhase, Command, IndicatorColor, MotionDecision, SeekerError, SensorSnapshot};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::arbiter::CommandTicket;

// ─────────────────────────────────────────────────────────────────────────────
// BehaviorConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Thresholds of the behavior machine, in behavior cycles unless noted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Range (sensor units) under which a target counts as close.
    pub proximity_threshold: f64,
    /// Cycles spent spinning one way before reversing while searching.
    pub sweep_half_period: u32,
    /// Search cycles without a target before panicking.
    pub search_timeout: u32,
    /// Receding cycles after which an attached robot starts pursuing.
    pub pursue_after: u32,
    /// Receding cycles after which an attached robot gives up.
    pub give_up_after: u32,
    /// Length of a panic spin.
    pub panic_cycles: u32,
    /// Duration of a manual Forward / Backward.
    pub manual_translate_cycles: u32,
    /// Duration of a manual spin.
    pub manual_spin_cycles: u32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            proximity_threshold: 40.0,
            sweep_half_period: 6,
            search_timeout: 24,
            pursue_after: 6,
            give_up_after: 20,
            panic_cycles: 20,
            manual_translate_cycles: 6,
            manual_spin_cycles: 1,
        }
    }
}

impl BehaviorConfig {
    /// Reject thresholds the machine cannot count with.
    ///
    /// The counters advance by one per cycle, so the give-up and panic
    /// limits must leave room for one more increment, and a full sweep
    /// (`2 * sweep_half_period`) must fit in a `u32`.
    pub fn validate(&self) -> Result<(), SeekerError> {
        if self.proximity_threshold.is_nan() {
            return Err(SeekerError::Config(
                "proximity_threshold must be a number".to_string(),
            ));
        }
        if self.sweep_half_period > u32::MAX / 2 {
            return Err(SeekerError::Config(format!(
                "sweep_half_period must be at most {}",
                u32::MAX / 2
            )));
        }
        for (name, limit) in [
            ("give_up_after", self.give_up_after),
            ("panic_cycles", self.panic_cycles),
        ] {
            if limit == u32::MAX {
                return Err(SeekerError::Config(format!(
                    "{name} must be below {}",
                    u32::MAX
                )));
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// AutonomousState
// ─────────────────────────────────────────────────────────────────────────────

/// The seek-heat machine.  Each phase carries its own cycle counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutonomousState {
    /// Sweeping in place looking for a heat source.
    Searching { move_count: u32 },
    /// Locked on; holds still while the target stays close.
    Attached { move_count: u32 },
    /// Search timed out; spinning right before searching again.
    Panic { move_count: u32 },
}

impl Default for AutonomousState {
    fn default() -> Self {
        AutonomousState::Searching { move_count: 0 }
    }
}

impl AutonomousState {
    pub fn phase(&self) -> BehaviorPhase {
        match self {
            AutonomousState::Searching { .. } => BehaviorPhase::Searching,
            AutonomousState::Attached { .. } => BehaviorPhase::Attached,
            AutonomousState::Panic { .. } => BehaviorPhase::Panic,
        }
    }

    pub fn move_count(&self) -> u32 {
        match *self {
            AutonomousState::Searching { move_count }
            | AutonomousState::Attached { move_count }
            | AutonomousState::Panic { move_count } => move_count,
        }
    }

    /// Indicator color of the branch this state executes.
    pub fn indicator(&self) -> IndicatorColor {
        match self {
            AutonomousState::Searching { .. } => IndicatorColor::Blue,
            AutonomousState::Attached { .. } => IndicatorColor::Green,
            AutonomousState::Panic { .. } => IndicatorColor::Red,
        }
    }

    /// Advance one cycle.  Total: every input yields a state and a motion.
    pub fn step(
        self,
        snapshot: &SensorSnapshot,
        config: &BehaviorConfig,
    ) -> (AutonomousState, MotionDecision) {
        let in_range = snapshot.range < config.proximity_threshold;
        let acquired = snapshot.heat_detected && in_range;

        match self {
            AutonomousState::Searching { move_count } => {
                let sweep = if move_count % (2 * config.sweep_half_period.max(1))
                    < config.sweep_half_period
                {
                    MotionDecision::SpinLeft
                } else {
                    MotionDecision::SpinRight
                };

                if acquired {
                    (AutonomousState::Attached { move_count: 0 }, sweep)
                } else if move_count >= config.search_timeout {
                    (AutonomousState::Panic { move_count: 0 }, sweep)
                } else {
                    (
                        AutonomousState::Searching {
                            move_count: move_count + 1,
                        },
                        sweep,
                    )
                }
            }

            AutonomousState::Attached { move_count } => {
                if acquired {
                    (AutonomousState::Attached { move_count: 0 }, MotionDecision::Idle)
                } else if in_range {
                    // Close but cold: turn toward it without counting.
                    (AutonomousState::Attached { move_count }, MotionDecision::SpinLeft)
                } else {
                    let move_count = move_count + 1;
                    if move_count > config.give_up_after {
                        (
                            AutonomousState::Searching { move_count: 0 },
                            MotionDecision::Forward,
                        )
                    } else if move_count > config.pursue_after {
                        (AutonomousState::Attached { move_count }, MotionDecision::Forward)
                    } else {
                        (AutonomousState::Attached { move_count }, MotionDecision::Idle)
                    }
                }
            }

            AutonomousState::Panic { move_count } => {
                let move_count = move_count + 1;
                let next = if move_count > config.panic_cycles {
                    AutonomousState::Searching { move_count: 0 }
                } else {
                    AutonomousState::Panic { move_count }
                };
                (next, MotionDecision::SpinRight)
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ManualOverride
// ─────────────────────────────────────────────────────────────────────────────

/// A one-shot manual motion counting down its remaining cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManualOverride {
    pub motion: MotionDecision,
    pub remaining: u32,
}

impl ManualOverride {
    /// `None` for commands that are not manual motions.
    pub fn for_command(command: Command, config: &BehaviorConfig) -> Option<Self> {
        let (motion, cycles) = match command {
            Command::Forward => (MotionDecision::Forward, config.manual_translate_cycles),
            Command::Backward => (MotionDecision::Backward, config.manual_translate_cycles),
            Command::SpinLeft => (MotionDecision::SpinLeft, config.manual_spin_cycles),
            Command::SpinRight => (MotionDecision::SpinRight, config.manual_spin_cycles),
            Command::Stop | Command::Attach => return None,
        };
        Some(Self {
            motion,
            remaining: cycles.max(1),
        })
    }

    pub fn indicator(&self) -> IndicatorColor {
        match self.motion {
            MotionDecision::Forward => IndicatorColor::Green,
            MotionDecision::Backward => IndicatorColor::Red,
            MotionDecision::SpinLeft | MotionDecision::SpinRight => IndicatorColor::Blue,
            MotionDecision::Idle => IndicatorColor::White,
        }
    }

    /// Spend one cycle.  Returns the motion and whether the override is now
    /// exhausted.
    pub fn tick(&mut self) -> (MotionDecision, bool) {
        self.remaining = self.remaining.saturating_sub(1);
        (self.motion, self.remaining == 0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BehaviorEngine
// ─────────────────────────────────────────────────────────────────────────────

/// Result of one behavior cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BehaviorOutput {
    pub motion: MotionDecision,
    pub indicator: IndicatorColor,
    /// Set on the last cycle of a manual motion: the caller should revert
    /// the arbiter to Stop for the ticket's generation.
    pub revert: bool,
}

/// Stateful behavior machine driven once per cycle.
#[derive(Debug, Clone)]
pub struct BehaviorEngine {
    config: BehaviorConfig,
    autonomous: AutonomousState,
    manual: Option<ManualOverride>,
    last_ticket: Option<CommandTicket>,
}

impl BehaviorEngine {
    pub fn new(config: BehaviorConfig) -> Self {
        Self {
            config,
            autonomous: AutonomousState::default(),
            manual: None,
            last_ticket: None,
        }
    }

    pub fn autonomous(&self) -> AutonomousState {
        self.autonomous
    }

    pub fn manual(&self) -> Option<ManualOverride> {
        self.manual
    }

    /// Run one cycle for `ticket` against `snapshot`.
    pub fn step(&mut self, ticket: CommandTicket, snapshot: &SensorSnapshot) -> BehaviorOutput {
        let previous = self.last_ticket.replace(ticket);
        if previous.map(|t| t.generation) != Some(ticket.generation) {
            self.begin(ticket.command, previous.map(|t| t.command).unwrap_or_default());
        }

        let output = match ticket.command {
            Command::Stop => idle(),
            Command::Attach => self.step_autonomous(snapshot),
            Command::Forward | Command::Backward | Command::SpinLeft | Command::SpinRight => {
                self.step_manual()
            }
        };

        debug!(
            command = ?ticket.command,
            phase = ?self.autonomous.phase(),
            move_count = self.autonomous.move_count(),
            motion = ?output.motion,
            "behavior cycle"
        );
        output
    }

    fn begin(&mut self, command: Command, previous: Command) {
        self.manual = ManualOverride::for_command(command, &self.config);
        if command == Command::Attach && previous != Command::Attach {
            self.autonomous = AutonomousState::default();
            info!("attach engaged; searching for heat");
        }
    }

    fn step_autonomous(&mut self, snapshot: &SensorSnapshot) -> BehaviorOutput {
        let indicator = self.autonomous.indicator();
        let (next, motion) = self.autonomous.step(snapshot, &self.config);
        if next.phase() != self.autonomous.phase() {
            info!(
                from = ?self.autonomous.phase(),
                to = ?next.phase(),
                ambient = snapshot.ambient,
                range = snapshot.range,
                "behavior phase transition"
            );
        }
        self.autonomous = next;
        BehaviorOutput {
            motion,
            indicator,
            revert: false,
        }
    }

    fn step_manual(&mut self) -> BehaviorOutput {
        let Some(mut manual) = self.manual else {
            // Exhausted but the arbiter has not reverted yet.
            return idle();
        };
        let indicator = manual.indicator();
        let (motion, done) = manual.tick();
        self.manual = if done { None } else { Some(manual) };
        BehaviorOutput {
            motion,
            indicator,
            revert: done,
        }
    }
}

fn idle() -> BehaviorOutput {
    BehaviorOutput {
        motion: MotionDecision::Idle,
        indicator: IndicatorColor::White,
        revert: false,
    }
}
