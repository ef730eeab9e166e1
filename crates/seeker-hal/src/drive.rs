//! [`DriveTrain`] – motion-decision to servo mapping.
//!
//! Owns the two continuous-rotation wheel servos and the thermal-sensor pan
//! servo, and translates each [`MotionDecision`] into concrete pulse widths.
//!
//! # Differential-drive mapping
//!
//! The wheels are mounted mirrored, so "both wheels the same rotational
//! sense" spins the chassis in place and "opposite senses" translates it.
//!
//! | Decision    | Left wheel | Right wheel |
//! |-------------|-----------:|------------:|
//! | `Forward`   | 4660       | 1100        |
//! | `Backward`  | 1100       | 4660        |
//! | `SpinLeft`  | 4660       | 4660        |
//! | `SpinRight` | 1100       | 1100        |
//!
//! # Sensor pan
//!
//! While translating, [`DriveTrain::sweep_pan`] walks the pan servo back and
//! forth in 300-tick steps, reversing at either travel limit.
//!
//! # Edge-triggered stop
//!
//! [`MotionDecision::Idle`] only touches the hardware on the moving → idle
//! edge; repeated idle cycles issue no driver calls.

use seeker_types::{MotionDecision, SeekerError};
use tracing::debug;

use crate::actuator::{
    INITIAL_PULSE_WIDTH_TICKS, MAX_DRIVE_PULSE_TICKS, MIN_PULSE_WIDTH_TICKS, ServoActuator,
};

/// Pan step per behavior cycle, in ticks.
pub const PAN_STEP_TICKS: u16 = 300;

/// Upward sweep reverses once the pan reaches this pulse width.
pub const PAN_UPPER_LIMIT_TICKS: u16 = 4140;

/// Downward sweep reverses once the pan reaches this pulse width.
pub const PAN_LOWER_LIMIT_TICKS: u16 = 1140;

/// Left/right wheel pulse widths for a moving decision; `None` for idle.
pub const fn wheel_pulses(decision: MotionDecision) -> Option<(u16, u16)> {
    match decision {
        MotionDecision::Idle => None,
        MotionDecision::Forward => Some((MAX_DRIVE_PULSE_TICKS, MIN_PULSE_WIDTH_TICKS)),
        MotionDecision::Backward => Some((MIN_PULSE_WIDTH_TICKS, MAX_DRIVE_PULSE_TICKS)),
        MotionDecision::SpinLeft => Some((MAX_DRIVE_PULSE_TICKS, MAX_DRIVE_PULSE_TICKS)),
        MotionDecision::SpinRight => Some((MIN_PULSE_WIDTH_TICKS, MIN_PULSE_WIDTH_TICKS)),
    }
}

/// Differential-drive base plus sensor pan.
pub struct DriveTrain {
    left: Box<dyn ServoActuator>,
    right: Box<dyn ServoActuator>,
    pan: Box<dyn ServoActuator>,
    /// Decision currently in force on the wheels.
    moving: MotionDecision,
    /// Next pan pulse width to apply.
    pan_position: u16,
    /// `true` while the sweep is walking back toward the lower limit.
    pan_returning: bool,
}

impl DriveTrain {
    pub fn new(
        left: Box<dyn ServoActuator>,
        right: Box<dyn ServoActuator>,
        pan: Box<dyn ServoActuator>,
    ) -> Self {
        Self {
            left,
            right,
            pan,
            moving: MotionDecision::Idle,
            pan_position: INITIAL_PULSE_WIDTH_TICKS,
            pan_returning: false,
        }
    }

    /// Advance the sensor-pan sweep by one step.
    ///
    /// Uses the decision in force from the previous cycle: the pan only moves
    /// while the robot translates.
    pub fn sweep_pan(&mut self) -> Result<(), SeekerError> {
        self.pan.start()?;
        if !self.moving.is_translating() {
            return Ok(());
        }

        self.pan.set_pulse_width(self.pan_position)?;
        if self.pan_returning {
            self.pan_position = self.pan_position.saturating_sub(PAN_STEP_TICKS);
            if self.pan_position <= PAN_LOWER_LIMIT_TICKS {
                self.pan_returning = false;
            }
        } else {
            self.pan_position = self.pan_position.saturating_add(PAN_STEP_TICKS);
            if self.pan_position >= PAN_UPPER_LIMIT_TICKS {
                self.pan_returning = true;
            }
        }
        Ok(())
    }

    /// Drive the wheels according to `decision`.
    pub fn apply(&mut self, decision: MotionDecision) -> Result<(), SeekerError> {
        let Some((left_ticks, right_ticks)) = wheel_pulses(decision) else {
            return self.stop();
        };

        if decision != self.moving {
            debug!(from = ?self.moving, to = ?decision, "drive decision changed");
        }
        self.moving = decision;

        self.left.start()?;
        self.right.start()?;
        self.left.set_pulse_width(left_ticks)?;
        self.right.set_pulse_width(right_ticks)?;
        Ok(())
    }

    /// Stop the wheels and re-centre the pan, but only on the moving → idle
    /// edge.
    pub fn stop(&mut self) -> Result<(), SeekerError> {
        if self.moving.is_moving() {
            debug!(from = ?self.moving, "stopping drive");
            self.pan.start()?;
            self.pan.set_pulse_width(INITIAL_PULSE_WIDTH_TICKS)?;
            self.pan.stop()?;
            self.right.stop()?;
            self.left.stop()?;
        }
        self.moving = MotionDecision::Idle;
        Ok(())
    }

    /// Unconditionally disable every servo channel.
    ///
    /// Used by the emergency halt; attempts all three channels even if one
    /// fails and reports the first failure.
    pub fn halt(&mut self) -> Result<(), SeekerError> {
        self.moving = MotionDecision::Idle;
        let results = [self.left.stop(), self.right.stop(), self.pan.stop()];
        results.into_iter().collect()
    }
}
