//! `seeker-runtime` – the control core of the heat-seeking robot.
//!
//! # Modules
//!
//! - [`arbiter`] – [`CommandArbiter`][arbiter::CommandArbiter]: latest-wins
//!   operator command slot with a generation counter, so an expiring manual
//!   motion can revert to Stop without clobbering a newer command.
//! - [`behavior`] – [`BehaviorEngine`][behavior::BehaviorEngine]: the
//!   Searching / Attached / Panic machine plus the counted manual override,
//!   tuned by [`BehaviorConfig`][behavior::BehaviorConfig].
//! - [`remote`] – [`CommandSource`][remote::CommandSource]: the remote
//!   command transport, with an in-process channel implementation.
//! - [`scheduler`] – [`Scheduler`][scheduler::Scheduler]: spawns the
//!   behavior, odometry, display and remote-polling activities, supervises
//!   them, and performs the emergency halt.
//! - [`status`] – the two status-display lines.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: `tracing`
//!   subscriber with optional OTLP export.
//! - [`watchdog`] – [`Watchdog`][watchdog::Watchdog]: per-activity heartbeat
//!   deadlines.

pub mod arbiter;
pub mod behavior;
pub mod remote;
pub mod scheduler;
pub mod status;
pub mod telemetry;
pub mod watchdog;

pub use arbiter::{CommandArbiter, CommandTicket};
pub use behavior::{AutonomousState, BehaviorConfig, BehaviorEngine, BehaviorOutput, ManualOverride};
pub use remote::{ChannelSource, CommandSource, RemoteSender};
pub use scheduler::{Observers, Scheduler, SchedulerConfig};
pub use telemetry::{TracerProviderGuard, init_tracing};
pub use watchdog::Watchdog;
