//! `seeker-hal` – Hardware Abstraction Layer
//!
//! Driver traits for everything the control core touches, plus the
//! motion-actuation mapping and simulated drivers.
//!
//! # Modules
//!
//! - [`actuator`] – [`ServoActuator`][actuator::ServoActuator] and
//!   [`WheelEncoder`][actuator::WheelEncoder], with the PWM pulse-width
//!   constants.
//! - [`sensor`] – [`ThermalArray`][sensor::ThermalArray] and
//!   [`RangeSensor`][sensor::RangeSensor].
//! - [`indicator`] – [`Indicator`][indicator::Indicator] LED and
//!   [`StatusDisplay`][indicator::StatusDisplay] sinks.
//! - [`drive`] – [`DriveTrain`][drive::DriveTrain]: maps a
//!   [`MotionDecision`][seeker_types::MotionDecision] onto wheel and
//!   sensor-pan pulse widths, with an edge-triggered stop.
//! - [`registry`] – [`HardwareRegistry`][registry::HardwareRegistry]: the
//!   bundle of drivers handed to the scheduler.
//! - [`sim`] – simulated drivers and the [`SimRegistry`][sim::SimRegistry]
//!   builder for headless runs.

pub mod actuator;
pub mod drive;
pub mod indicator;
pub mod registry;
pub mod sensor;
pub mod sim;

pub use actuator::{ServoActuator, WheelEncoder};
pub use drive::DriveTrain;
pub use indicator::{Indicator, StatusDisplay};
pub use registry::HardwareRegistry;
pub use sensor::{RangeSensor, ThermalArray};
