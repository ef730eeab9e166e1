//! `seeker-perception` – sensor fusion and dead reckoning.
//!
//! # Modules
//!
//! - [`fusion`] – [`ThermalFusion`][fusion::ThermalFusion]: turns a thermal
//!   sweep plus a range reading into a
//!   [`SensorSnapshot`][seeker_types::SensorSnapshot] with zone averages and
//!   the heat-proximity signal.
//! - [`odometry`] – [`OdometryIntegrator`][odometry::OdometryIntegrator]:
//!   accumulates wheel-encoder pulses into distance and speed estimates.

pub mod fusion;
pub mod odometry;

pub use fusion::ThermalFusion;
pub use odometry::OdometryIntegrator;
