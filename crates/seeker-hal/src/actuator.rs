//! Servo actuator and wheel-encoder traits.
//!
//! Both drive wheels and the thermal-sensor pan are hobby servos driven by a
//! PWM pulse width expressed in timer ticks (500 ns each).  The wheel servos
//! are continuous-rotation: the pulse width selects direction and rate rather
//! than an angle.  Each wheel also carries a rotation encoder that the
//! odometry integrator samples.

use seeker_types::SeekerError;

/// Duration of one PWM / encoder timer tick in seconds (2 MHz timer).
pub const TICK_SECONDS: f64 = 0.000_000_5;

/// Shortest pulse the servos accept (0.55 ms): full rate clockwise.
pub const MIN_PULSE_WIDTH_TICKS: u16 = 1100;

/// Full rate counter-clockwise (2.33 ms).
pub const MAX_DRIVE_PULSE_TICKS: u16 = 4660;

/// Centre position of the sensor pan, also the neutral wheel pulse.
pub const INITIAL_PULSE_WIDTH_TICKS: u16 = 2640;

/// A PWM-driven servo channel.
pub trait ServoActuator: Send {
    /// Stable identifier, e.g. `"left_wheel"` or `"sensor_pan"`.
    fn id(&self) -> &str;

    /// Enable PWM output on this channel.
    ///
    /// # Errors
    ///
    /// Returns [`SeekerError::HardwareFault`] if the channel cannot be enabled.
    fn start(&mut self) -> Result<(), SeekerError>;

    /// Set the output pulse width in timer ticks.
    ///
    /// # Errors
    ///
    /// Returns [`SeekerError::HardwareFault`] if the value cannot be applied.
    fn set_pulse_width(&mut self, ticks: u16) -> Result<(), SeekerError>;

    /// Disable PWM output; the servo goes limp.
    fn stop(&mut self) -> Result<(), SeekerError>;
}

/// A wheel rotation encoder.
pub trait WheelEncoder: Send {
    fn id(&self) -> &str;

    /// Return the timer-tick length of the most recent pulse if the wheel has
    /// advanced by at least one pulse since the previous call, `None` otherwise.
    fn read_pulse(&mut self) -> Result<Option<u32>, SeekerError>;
}
