//! Two-line status display formatting.
//!
//! ```text
//! S:0.05, D:1.23      speed (m/s), distance (m)
//! A:22, L:30, R:41    ambient, left average, right average
//! ```
//!
//! Both lines are clipped to [`DISPLAY_WIDTH`] characters.

use seeker_hal::indicator::DISPLAY_WIDTH;
use seeker_types::{OdometryReading, SensorSnapshot};

/// Odometry line.
pub fn motion_line(odometry: &OdometryReading) -> String {
    clip(format!(
        "S:{:.2}, D:{:.2}",
        odometry.average_speed, odometry.total_distance_m
    ))
}

/// Thermal line.
pub fn thermal_line(snapshot: &SensorSnapshot) -> String {
    clip(format!(
        "A:{}, L:{}, R:{}",
        snapshot.ambient, snapshot.left_average, snapshot.right_average
    ))
}

fn clip(mut line: String) -> String {
    if let Some((idx, _)) = line.char_indices().nth(DISPLAY_WIDTH) {
        line.truncate(idx);
    }
    line
}
