//! Thermal-array and range-sensor traits.

use seeker_types::SeekerError;

/// An 8-pixel thermopile array with an ambient reference zone.
///
/// Reading is a two-step protocol: [`trigger_read`][Self::trigger_read]
/// performs one sweep over all zones and latches the results, after which
/// [`zone`][Self::zone] returns the latched raw value for each zone.
pub trait ThermalArray: Send {
    /// Sweep every zone and latch the raw values.
    ///
    /// # Errors
    ///
    /// Returns [`SeekerError::HardwareFault`] if the sensor bus transaction
    /// fails.
    fn trigger_read(&mut self) -> Result<(), SeekerError>;

    /// Latched raw value of `zone` (0 = ambient, 1..=8 = pixels).
    ///
    /// Out-of-range zones read as 0.
    fn zone(&self, zone: usize) -> u8;
}

/// A distance sensor (ultrasonic ping).
pub trait RangeSensor: Send {
    /// Current distance reading in sensor-native units.
    fn distance(&mut self) -> Result<f64, SeekerError>;
}
