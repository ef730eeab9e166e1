//! Wheel odometry integrator.
//!
//! Each sample, a wheel that registered at least one encoder pulse adds
//! [`DISTANCE_PER_PULSE_CM`] to its cumulative distance and records the
//! pulse's duration.  A wheel with no new pulse keeps both its distance and
//! its last interval untouched.
//!
//! # Stale speed
//!
//! Because idle samples never touch the recorded intervals,
//! [`OdometryIntegrator::average_speed`] keeps reporting the last measured
//! speed after the robot stops.  This mirrors the firmware behaviour the
//! display was calibrated against and is very likely a latent gap: a decaying
//! estimate would need an idle timeout, which nothing specifies yet.

use seeker_hal::WheelEncoder;
use seeker_hal::actuator::TICK_SECONDS;
use seeker_types::{OdometryReading, SeekerError};

/// Wheel travel per encoder pulse, in centimetres.
pub const DISTANCE_PER_PULSE_CM: f64 = 0.54;

/// Wheel travel per encoder pulse, in metres (numerator of the speed ratio).
pub const DISTANCE_PER_PULSE_M: f64 = 0.0054;

/// Divisor turning the summed centimetre distances into a mean in metres.
const CM_SUM_TO_MEAN_M: f64 = 200.0;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct WheelTrack {
    distance_cm: f64,
    interval_s: f64,
}

impl WheelTrack {
    fn register(&mut self, pulse_ticks: Option<u32>) {
        if let Some(ticks) = pulse_ticks {
            self.interval_s = f64::from(ticks) * TICK_SECONDS;
            self.distance_cm += DISTANCE_PER_PULSE_CM;
        }
    }
}

/// Cumulative per-wheel distance and last-pulse interval.
///
/// Never reset during normal operation; distances only grow.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct OdometryIntegrator {
    left: WheelTrack,
    right: WheelTrack,
}

impl OdometryIntegrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample both encoders once and integrate any new pulses.
    pub fn update(
        &mut self,
        left: &mut dyn WheelEncoder,
        right: &mut dyn WheelEncoder,
    ) -> Result<(), SeekerError> {
        let left_pulse = left.read_pulse()?;
        let right_pulse = right.read_pulse()?;
        self.record(left_pulse, right_pulse);
        Ok(())
    }

    /// Integrate one sample given each wheel's pulse length in ticks, if any.
    pub fn record(&mut self, left_pulse: Option<u32>, right_pulse: Option<u32>) {
        self.left.register(left_pulse);
        self.right.register(right_pulse);
    }

    pub fn left_distance_cm(&self) -> f64 {
        self.left.distance_cm
    }

    pub fn right_distance_cm(&self) -> f64 {
        self.right.distance_cm
    }

    /// Average speed in m/s: distance per pulse over the mean of the two
    /// last pulse intervals.  Exactly 0 until either wheel has pulsed.
    pub fn average_speed(&self) -> f64 {
        if self.left.interval_s != 0.0 || self.right.interval_s != 0.0 {
            DISTANCE_PER_PULSE_M / ((self.left.interval_s + self.right.interval_s) / 2.0)
        } else {
            0.0
        }
    }

    /// Mean distance travelled by the two wheels, in metres.
    pub fn total_distance(&self) -> f64 {
        (self.left.distance_cm + self.right.distance_cm) / CM_SUM_TO_MEAN_M
    }

    /// Snapshot for publishing to other activities.
    pub fn reading(&self) -> OdometryReading {
        OdometryReading {
            left_distance_cm: self.left.distance_cm,
            right_distance_cm: self.right.distance_cm,
            left_interval_s: self.left.interval_s,
            right_interval_s: self.right.interval_s,
            average_speed: self.average_speed(),
            total_distance_m: self.total_distance(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seeker_hal::actuator::INITIAL_PULSE_WIDTH_TICKS;
    use seeker_hal::sim::{SimEncoder, SimServo};
    use seeker_hal::ServoActuator;

    const EPS: f64 = 1e-9;

    #[test]
    fn speed_is_zero_before_any_pulse() {
        let mut odo = OdometryIntegrator::new();
        assert_eq!(odo.average_speed(), 0.0);
        odo.record(None, None);
        odo.record(None, None);
        assert_eq!(odo.average_speed(), 0.0);
        assert_eq!(odo.total_distance(), 0.0);
    }

    #[test]
    fn speed_is_distance_over_mean_interval() {
        let mut odo = OdometryIntegrator::new();
        // 200_000 ticks * 500 ns = 0.1 s on both wheels.
        odo.record(Some(200_000), Some(200_000));
        assert!((odo.average_speed() - 0.054).abs() < EPS);
    }

    #[test]
    fn single_wheel_pulse_halves_the_mean_interval() {
        let mut odo = OdometryIntegrator::new();
        odo.record(Some(200_000), None);
        // mean interval = (0.1 + 0) / 2 = 0.05 s
        assert!((odo.average_speed() - 0.108).abs() < EPS);
    }

    #[test]
    fn speed_stays_stale_after_the_robot_stops() {
        let mut odo = OdometryIntegrator::new();
        odo.record(Some(100_000), Some(300_000));
        let moving = odo.average_speed();
        assert!(moving > 0.0);

        for _ in 0..1000 {
            odo.record(None, None);
        }
        assert_eq!(odo.average_speed(), moving);
    }

    #[test]
    fn distance_is_half_the_summed_centimetres_in_metres() {
        let mut odo = OdometryIntegrator::new();
        assert_eq!(odo.total_distance(), 0.0);

        odo.record(Some(1), Some(1));
        let expected = (odo.left_distance_cm() + odo.right_distance_cm()) / 200.0;
        assert!((odo.total_distance() - expected).abs() < EPS);
        assert!((odo.total_distance() - 0.0054).abs() < EPS);

        // Asymmetric: left gets 3 more pulses.
        for _ in 0..3 {
            odo.record(Some(1), None);
        }
        assert!((odo.left_distance_cm() - 4.0 * 0.54).abs() < EPS);
        assert!((odo.right_distance_cm() - 0.54).abs() < EPS);
        let expected = (odo.left_distance_cm() + odo.right_distance_cm()) / 200.0;
        assert!((odo.total_distance() - expected).abs() < EPS);
        assert!((odo.total_distance() - 0.0135).abs() < EPS);
    }

    #[test]
    fn distances_never_decrease() {
        let mut odo = OdometryIntegrator::new();
        let mut last = (0.0, 0.0);
        let samples = [Some(10), None, Some(5), None, None, Some(7)];
        for (i, s) in samples.iter().enumerate() {
            odo.record(*s, samples[samples.len() - 1 - i]);
            assert!(odo.left_distance_cm() >= last.0);
            assert!(odo.right_distance_cm() >= last.1);
            last = (odo.left_distance_cm(), odo.right_distance_cm());
        }
    }

    #[test]
    fn update_samples_encoders() {
        let (mut left_servo, left_h) = SimServo::new("left_wheel");
        let (_right_servo, right_h) = SimServo::new("right_wheel");
        let mut left = SimEncoder::new("left_encoder", left_h, 200_000);
        let mut right = SimEncoder::new("right_encoder", right_h, 200_000);
        let mut odo = OdometryIntegrator::new();

        odo.update(left.as_mut(), right.as_mut()).unwrap();
        assert_eq!(odo.reading(), OdometryReading::default());

        left_servo.start().unwrap();
        left_servo.set_pulse_width(4660).unwrap();
        odo.update(left.as_mut(), right.as_mut()).unwrap();
        let reading = odo.reading();
        assert!((reading.left_distance_cm - 0.54).abs() < EPS);
        assert_eq!(reading.right_distance_cm, 0.0);
        assert!((reading.left_interval_s - 0.1).abs() < EPS);
        assert!(reading.average_speed > 0.0);

        left_servo.set_pulse_width(INITIAL_PULSE_WIDTH_TICKS).unwrap();
        odo.update(left.as_mut(), right.as_mut()).unwrap();
        assert_eq!(odo.reading().left_distance_cm, reading.left_distance_cm);
    }
}
