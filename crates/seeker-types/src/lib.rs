use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of thermal zones reported per sweep: one ambient reference plus
/// eight directional pixels.
pub const ZONE_COUNT: usize = 9;

/// Index of the ambient reference zone within a sweep.
pub const AMBIENT_ZONE: usize = 0;

/// Operator command held by the command arbiter.
///
/// Exactly one command is active at any instant; [`Command::Stop`] is the
/// idle default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Command {
    #[default]
    Stop,
    /// Autonomous heat-seeking mode.
    Attach,
    Forward,
    Backward,
    SpinLeft,
    SpinRight,
}

impl Command {
    /// Parse a single-character remote command code.
    ///
    /// Returns `None` for anything outside `S A F B L R`; callers drop such
    /// codes without changing state.
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'S' => Some(Command::Stop),
            'A' => Some(Command::Attach),
            'F' => Some(Command::Forward),
            'B' => Some(Command::Backward),
            'L' => Some(Command::SpinLeft),
            'R' => Some(Command::SpinRight),
            _ => None,
        }
    }
}

/// Motion chosen by the behavior engine for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MotionDecision {
    #[default]
    Idle,
    Forward,
    Backward,
    SpinLeft,
    SpinRight,
}

impl MotionDecision {
    /// `true` while the robot translates (the sensor pan only sweeps then).
    pub fn is_translating(self) -> bool {
        matches!(self, MotionDecision::Forward | MotionDecision::Backward)
    }

    pub fn is_moving(self) -> bool {
        self != MotionDecision::Idle
    }
}

/// Status indicator colors.
///
/// `Off` is reserved for the emergency halt; every behavior branch lights one
/// of the other four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IndicatorColor {
    #[default]
    Off,
    /// Neutral / stopped.
    White,
    /// Scanning (searching sweep and manual spins).
    Blue,
    /// Locked on target, or manual forward.
    Green,
    /// Panic, or manual backward.
    Red,
}

/// Phase of the autonomous seek-heat machine, without its counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BehaviorPhase {
    #[default]
    Searching,
    Attached,
    Panic,
}

/// One fused thermal + range sample.
///
/// Rebuilt from scratch every behavior cycle; nothing from the previous
/// sample survives.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorSnapshot {
    /// Raw readings, ambient first.
    pub zones: [u8; ZONE_COUNT],
    pub ambient: u8,
    /// Mean of zones 1–4.
    pub left_average: u8,
    /// Mean of zones 5–8.
    pub right_average: u8,
    /// Mean of the two boundary zones (4 and 5).
    pub center_average: u8,
    /// Mean of all nine zones; compared against `ambient` for the heat test.
    pub overall_average: u8,
    pub heat_detected: bool,
    /// Range-sensor distance in sensor units (centimetres for the sonar).
    pub range: f64,
}

/// Read-only view of the odometry accumulators, published to observers.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OdometryReading {
    /// Cumulative left-wheel travel in centimetres.
    pub left_distance_cm: f64,
    /// Cumulative right-wheel travel in centimetres.
    pub right_distance_cm: f64,
    /// Duration of the last registered left-wheel pulse in seconds (0 = none yet).
    pub left_interval_s: f64,
    /// Duration of the last registered right-wheel pulse in seconds (0 = none yet).
    pub right_interval_s: f64,
    /// Average speed in m/s.
    pub average_speed: f64,
    /// Average of both wheel distances in metres.
    pub total_distance_m: f64,
}

/// What the behavior activity did during its latest cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StatusReport {
    pub cycle: u64,
    pub command: Command,
    pub phase: BehaviorPhase,
    pub move_count: u32,
    pub motion: MotionDecision,
    pub indicator: IndicatorColor,
}

/// Error type shared by drivers and the runtime.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SeekerError {
    #[error("Hardware Fault on {component}: {details}")]
    HardwareFault { component: String, details: String },

    #[error("Activity '{activity}' failed: {reason}")]
    ActivityFailed { activity: String, reason: String },

    #[error("Configuration Error: {0}")]
    Config(String),
}
