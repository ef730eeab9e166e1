//! [`HardwareRegistry`] – the full set of drivers the control core needs.
//!
//! The registry is a plain bundle: the scheduler destructures it and moves
//! each driver into the one periodic activity that drives it.  The drive
//! train and indicator are additionally reachable by the supervisor for the
//! emergency halt.
//!
//! | Field | Owning activity |
//! |---|---|
//! | `thermal`, `range`, `drive`, `indicator` | behavior cycle |
//! | `left_encoder`, `right_encoder` | odometry integration |
//! | `display` | status-display refresh |

use crate::actuator::WheelEncoder;
use crate::drive::DriveTrain;
use crate::indicator::{Indicator, StatusDisplay};
use crate::sensor::{RangeSensor, ThermalArray};

/// Every driver the control core talks to.
pub struct HardwareRegistry {
    pub thermal: Box<dyn ThermalArray>,
    pub range: Box<dyn RangeSensor>,
    pub left_encoder: Box<dyn WheelEncoder>,
    pub right_encoder: Box<dyn WheelEncoder>,
    pub drive: DriveTrain,
    pub indicator: Box<dyn Indicator>,
    pub display: Box<dyn StatusDisplay>,
}
