//! Thermal + range sensor fusion.
//!
//! Turns one sweep of the thermal array and one range measurement into a
//! [`SensorSnapshot`]: directional zone averages plus a boolean
//! heat-proximity signal.
//!
//! Zone layout (index into the sweep):
//!
//! ```text
//!  0        1  2  3  4 | 5  6  7  8
//! ambient   ─── left ──┼── right ──
//!                   └center┘
//! ```
//!
//! All averages use truncating integer division over the raw 8-bit readings.
//! Heat is detected when the mean over all nine zones exceeds the ambient
//! zone by more than [`HEAT_MARGIN`].
//!
//! # Example
//!
//! ```rust
//! use seeker_perception::fusion::ThermalFusion;
//!
//! let snapshot = ThermalFusion::fuse([20, 30, 30, 30, 30, 40, 40, 40, 40], 25.0);
//! assert_eq!(snapshot.left_average, 30);
//! assert_eq!(snapshot.right_average, 40);
//! assert!(snapshot.heat_detected);
//! ```

use seeker_hal::{RangeSensor, ThermalArray};
use seeker_types::{AMBIENT_ZONE, SeekerError, SensorSnapshot, ZONE_COUNT};
use tracing::trace;

/// Fixed margin (in raw sensor units) the overall average must exceed the
/// ambient reading by.
pub const HEAT_MARGIN: u8 = 1;

const LEFT_ZONES: std::ops::RangeInclusive<usize> = 1..=4;
const RIGHT_ZONES: std::ops::RangeInclusive<usize> = 5..=8;
const CENTER_ZONES: [usize; 2] = [4, 5];

fn mean(values: impl Iterator<Item = u8>) -> u8 {
    let (sum, count) = values.fold((0u32, 0u32), |(s, c), v| (s + u32::from(v), c + 1));
    if count == 0 {
        return 0;
    }
    // The mean of u8 values always fits in a u8.
    (sum / count) as u8
}

/// Stateless sensor-fusion stage.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThermalFusion;

impl ThermalFusion {
    pub fn new() -> Self {
        Self
    }

    /// Acquire one sweep + range reading and fuse them.
    ///
    /// # Errors
    ///
    /// Propagates driver failures unchanged; there is no retry.
    pub fn sample(
        &self,
        thermal: &mut dyn ThermalArray,
        range: &mut dyn RangeSensor,
    ) -> Result<SensorSnapshot, SeekerError> {
        thermal.trigger_read()?;
        let mut zones = [0u8; ZONE_COUNT];
        for (i, zone) in zones.iter_mut().enumerate() {
            *zone = thermal.zone(i);
        }
        let distance = range.distance()?;

        let snapshot = Self::fuse(zones, distance);
        trace!(?snapshot, "fused sensor snapshot");
        Ok(snapshot)
    }

    /// Pure fusion of raw zone readings and a range distance.
    pub fn fuse(zones: [u8; ZONE_COUNT], range: f64) -> SensorSnapshot {
        let ambient = zones[AMBIENT_ZONE];
        let overall_average = mean(zones.iter().copied());

        SensorSnapshot {
            zones,
            ambient,
            left_average: mean(zones[LEFT_ZONES].iter().copied()),
            right_average: mean(zones[RIGHT_ZONES].iter().copied()),
            center_average: mean(CENTER_ZONES.iter().map(|&i| zones[i])),
            overall_average,
            heat_detected: u16::from(overall_average) > u16::from(ambient) + u16::from(HEAT_MARGIN),
            range,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seeker_hal::sim::{SimRange, SimThermal};

    #[test]
    fn directional_averages_split_left_and_right() {
        let s = ThermalFusion::fuse([20, 30, 30, 30, 30, 40, 40, 40, 40], 100.0);
        assert_eq!(s.ambient, 20);
        assert_eq!(s.left_average, 30);
        assert_eq!(s.right_average, 40);
        assert_eq!(s.center_average, 35);
        assert_eq!(s.overall_average, 33); // 300 / 9
        assert_eq!(s.range, 100.0);
    }

    #[test]
    fn averages_truncate() {
        let s = ThermalFusion::fuse([0, 1, 1, 1, 2, 3, 3, 3, 4], 0.0);
        assert_eq!(s.left_average, 1); // 5 / 4
        assert_eq!(s.right_average, 3); // 13 / 4
        assert_eq!(s.center_average, 2); // 5 / 2
    }

    #[test]
    fn uniform_scene_has_no_heat() {
        let s = ThermalFusion::fuse([22; ZONE_COUNT], 10.0);
        assert!(!s.heat_detected);
    }

    #[test]
    fn heat_requires_more_than_the_margin() {
        // 20 + 8*22 = 196 → 21, not > 21.
        let mut zones = [22u8; ZONE_COUNT];
        zones[0] = 20;
        assert!(!ThermalFusion::fuse(zones, 10.0).heat_detected);

        // 20 + 8*23 = 204 → 22 > 21.
        let mut zones = [23u8; ZONE_COUNT];
        zones[0] = 20;
        assert!(ThermalFusion::fuse(zones, 10.0).heat_detected);
    }

    #[test]
    fn saturated_readings_do_not_overflow() {
        let s = ThermalFusion::fuse([255; ZONE_COUNT], 1.0);
        assert_eq!(s.overall_average, 255);
        assert!(!s.heat_detected);
    }

    #[test]
    fn sample_reads_a_fresh_sweep_each_call() {
        let (mut thermal, thermal_h) = SimThermal::new(20);
        let (mut range, range_h) = SimRange::new(90.0);
        let fusion = ThermalFusion::new();

        let first = fusion.sample(thermal.as_mut(), range.as_mut()).unwrap();
        assert!(!first.heat_detected);
        assert_eq!(first.range, 90.0);

        thermal_h.set_pixels(40);
        range_h.set(15.0);
        let second = fusion.sample(thermal.as_mut(), range.as_mut()).unwrap();
        assert!(second.heat_detected);
        assert_eq!(second.left_average, 40);
        assert_eq!(second.range, 15.0);
        assert_eq!(thermal_h.sweeps(), 2);
    }
}
