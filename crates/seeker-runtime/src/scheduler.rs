//! Periodic scheduler and supervisor.
//!
//! [`Scheduler::run`] splits a [`HardwareRegistry`] across four periodic
//! activities, each a Tokio task woken by its own [`interval`]:
//!
//! | Activity | Default period | Owns | Publishes |
//! |---|---|---|---|
//! | `behavior` | 250 ms | thermal, range, drive train, indicator | [`SensorSnapshot`], [`StatusReport`] |
//! | `odometry` | 100 ms | both wheel encoders | [`OdometryReading`] |
//! | `display` | 500 ms | status display | – |
//! | `remote` | 5500 ms | [`CommandSource`] | writes the [`CommandArbiter`] |
//!
//! Cross-activity data flows through `tokio::sync::watch` channels; readers
//! always see the latest complete value.
//!
//! The drive train and indicator are shared with the supervisor.  The
//! behavior activity only locks them around the actuator writes, never while
//! it waits on a sensor, and checks a halted flag first.
//!
//! # Emergency halt
//!
//! The supervisor waits on every activity, on a [`Watchdog`] poll and on the
//! caller's shutdown future.  If an activity returns an error, panics, or
//! misses `watchdog_periods` consecutive periods, the supervisor sets the
//! halted flag, darkens the indicator, stops every servo, and returns
//! [`SeekerError::ActivityFailed`].  A shutdown performs the same halt and
//! returns `Ok(())`.  Nothing is restarted.
//!
//! The halt never blocks: if an actuator write is in flight it is retried on
//! the following supervision ticks, up to `watchdog_periods` times.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::time::Duration;

use seeker_hal::{
    DriveTrain, HardwareRegistry, Indicator, RangeSensor, StatusDisplay, ThermalArray,
    WheelEncoder,
};
use seeker_perception::{OdometryIntegrator, ThermalFusion};
use seeker_types::{IndicatorColor, OdometryReading, SeekerError, SensorSnapshot, StatusReport};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{Instrument, debug, debug_span, error, info, warn};

use crate::arbiter::CommandArbiter;
use crate::behavior::{BehaviorConfig, BehaviorEngine};
use crate::remote::CommandSource;
use crate::status::{motion_line, thermal_line};
use crate::telemetry::activity_span;
use crate::watchdog::Watchdog;

pub const BEHAVIOR: &str = "behavior";
pub const ODOMETRY: &str = "odometry";
pub const DISPLAY: &str = "display";
pub const REMOTE: &str = "remote";

// ─────────────────────────────────────────────────────────────────────────────
// SchedulerConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Activity periods in milliseconds, plus the watchdog tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub behavior_period_ms: u64,
    pub odometry_period_ms: u64,
    pub display_period_ms: u64,
    pub remote_period_ms: u64,
    /// Whole periods an activity may stay silent before it counts as stalled.
    pub watchdog_periods: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            behavior_period_ms: 250,
            odometry_period_ms: 100,
            display_period_ms: 500,
            remote_period_ms: 5500,
            watchdog_periods: 4,
        }
    }
}

impl SchedulerConfig {
    /// `(activity, period)` for every activity.
    pub fn periods(&self) -> [(&'static str, Duration); 4] {
        [
            (BEHAVIOR, Duration::from_millis(self.behavior_period_ms)),
            (ODOMETRY, Duration::from_millis(self.odometry_period_ms)),
            (DISPLAY, Duration::from_millis(self.display_period_ms)),
            (REMOTE, Duration::from_millis(self.remote_period_ms)),
        ]
    }

    /// Reject zero periods and a zero watchdog tolerance.
    pub fn validate(&self) -> Result<(), SeekerError> {
        if let Some((name, _)) = self.periods().iter().find(|(_, p)| p.is_zero()) {
            return Err(SeekerError::Config(format!(
                "{name} period must be greater than zero"
            )));
        }
        if self.watchdog_periods == 0 {
            return Err(SeekerError::Config(
                "watchdog_periods must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Observers
// ─────────────────────────────────────────────────────────────────────────────

/// Read-only views of the values the activities publish.
#[derive(Debug, Clone)]
pub struct Observers {
    pub snapshot: watch::Receiver<SensorSnapshot>,
    pub odometry: watch::Receiver<OdometryReading>,
    pub status: watch::Receiver<StatusReport>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Scheduler
// ─────────────────────────────────────────────────────────────────────────────

/// Owns the shared state and spawns the periodic activities.
pub struct Scheduler {
    config: SchedulerConfig,
    behavior: BehaviorConfig,
    arbiter: Arc<CommandArbiter>,
    snapshot_tx: watch::Sender<SensorSnapshot>,
    odometry_tx: watch::Sender<OdometryReading>,
    status_tx: watch::Sender<StatusReport>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig, behavior: BehaviorConfig) -> Self {
        let (snapshot_tx, _) = watch::channel(SensorSnapshot::default());
        let (odometry_tx, _) = watch::channel(OdometryReading::default());
        let (status_tx, _) = watch::channel(StatusReport::default());
        Self {
            config,
            behavior,
            arbiter: Arc::new(CommandArbiter::new()),
            snapshot_tx,
            odometry_tx,
            status_tx,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// The command slot; submit operator commands here.
    pub fn arbiter(&self) -> Arc<CommandArbiter> {
        Arc::clone(&self.arbiter)
    }

    /// Subscribe to the published snapshot, odometry and status values.
    pub fn observe(&self) -> Observers {
        Observers {
            snapshot: self.snapshot_tx.subscribe(),
            odometry: self.odometry_tx.subscribe(),
            status: self.status_tx.subscribe(),
        }
    }

    /// Run every activity until `shutdown` resolves or one of them fails.
    ///
    /// Always leaves the hardware halted (indicator off, servos stopped).
    ///
    /// # Errors
    ///
    /// [`SeekerError::Config`] for an invalid [`SchedulerConfig`] or
    /// [`BehaviorConfig`];
    /// [`SeekerError::ActivityFailed`] when an activity errors, panics, or
    /// stalls.
    pub async fn run<F>(
        self,
        hardware: HardwareRegistry,
        remote: Box<dyn CommandSource>,
        shutdown: F,
    ) -> Result<(), SeekerError>
    where
        F: Future<Output = ()>,
    {
        self.config.validate()?;
        self.behavior.validate()?;

        let Scheduler {
            config,
            behavior: behavior_config,
            arbiter,
            snapshot_tx,
            odometry_tx,
            status_tx,
        } = self;
        let snapshot_rx = snapshot_tx.subscribe();
        let odometry_rx = odometry_tx.subscribe();

        let HardwareRegistry {
            thermal,
            range,
            left_encoder,
            right_encoder,
            drive,
            indicator,
            display,
        } = hardware;

        let actuation = Arc::new(Actuation::new(drive, indicator));

        let mut watchdog = Watchdog::new(config.watchdog_periods);
        for (name, period) in config.periods() {
            watchdog.register(name, period);
        }
        let watchdog = Arc::new(Mutex::new(watchdog));

        let [
            (_, behavior_period),
            (_, odometry_period),
            (_, display_period),
            (_, remote_period),
        ] = config.periods();

        info!(
            behavior_ms = config.behavior_period_ms,
            odometry_ms = config.odometry_period_ms,
            display_ms = config.display_period_ms,
            remote_ms = config.remote_period_ms,
            "scheduler starting"
        );

        let mut behavior = spawn_activity(
            BehaviorActivity {
                thermal,
                range,
                actuation: Arc::clone(&actuation),
                fusion: ThermalFusion::new(),
                engine: BehaviorEngine::new(behavior_config),
                arbiter: Arc::clone(&arbiter),
                snapshot_tx,
                status_tx,
                cycle: 0,
            },
            behavior_period,
            Arc::clone(&watchdog),
        );
        let mut odometry = spawn_activity(
            OdometryActivity {
                left: left_encoder,
                right: right_encoder,
                integrator: OdometryIntegrator::new(),
                odometry_tx,
            },
            odometry_period,
            Arc::clone(&watchdog),
        );
        let mut display = spawn_activity(
            DisplayActivity {
                display,
                snapshot_rx,
                odometry_rx,
            },
            display_period,
            Arc::clone(&watchdog),
        );
        let mut remote = spawn_activity(
            RemoteActivity {
                source: remote,
                arbiter,
            },
            remote_period,
            Arc::clone(&watchdog),
        );

        let mut supervision = interval(behavior_period);
        supervision.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let outcome = loop {
            tokio::select! {
                () = &mut shutdown => break Ok(()),
                joined = &mut behavior => break Err(activity_failure(BEHAVIOR, joined)),
                joined = &mut odometry => break Err(activity_failure(ODOMETRY, joined)),
                joined = &mut display => break Err(activity_failure(DISPLAY, joined)),
                joined = &mut remote => break Err(activity_failure(REMOTE, joined)),
                _ = supervision.tick() => {
                    if let Some(activity) = lock(&watchdog).first_stalled() {
                        break Err(SeekerError::ActivityFailed {
                            activity: activity.to_string(),
                            reason: "missed its watchdog deadline".to_string(),
                        });
                    }
                }
            }
        };

        for handle in [&behavior, &odometry, &display, &remote] {
            handle.abort();
        }
        let mut retries = 0;
        while !actuation.try_halt() {
            if retries == config.watchdog_periods {
                error!("actuators still busy; the emergency halt could not be delivered");
                break;
            }
            retries += 1;
            debug!(retries, "actuator write in flight; retrying halt");
            supervision.tick().await;
        }

        match &outcome {
            Ok(()) => info!("scheduler stopped; hardware halted"),
            Err(e) => error!(error = %e, "emergency halt"),
        }
        outcome
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Activities
// ─────────────────────────────────────────────────────────────────────────────

/// One periodic unit of work.
trait Activity: Send + 'static {
    const NAME: &'static str;

    fn cycle(&mut self) -> Result<(), SeekerError>;
}

fn spawn_activity<A: Activity>(
    activity: A,
    period: Duration,
    watchdog: Arc<Mutex<Watchdog>>,
) -> JoinHandle<Result<(), SeekerError>> {
    tokio::spawn(run_periodic(activity, period, watchdog).instrument(activity_span(A::NAME)))
}

async fn run_periodic<A: Activity>(
    mut activity: A,
    period: Duration,
    watchdog: Arc<Mutex<Watchdog>>,
) -> Result<(), SeekerError> {
    let mut ticker = interval(period);
    // Absolute-time wake-ups: a late cycle is followed by catch-up cycles.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
    let mut n: u64 = 0;
    loop {
        ticker.tick().await;
        n += 1;
        debug_span!("cycle", n).in_scope(|| activity.cycle())?;
        lock(&watchdog).heartbeat(A::NAME);
    }
}

/// Outputs shared between the behavior activity and the supervisor.
struct Outputs {
    drive: DriveTrain,
    indicator: Box<dyn Indicator>,
}

struct Actuation {
    /// Once set, no further actuator commands are issued.
    halted: AtomicBool,
    outputs: Mutex<Outputs>,
}

impl Actuation {
    fn new(drive: DriveTrain, indicator: Box<dyn Indicator>) -> Self {
        Self {
            halted: AtomicBool::new(false),
            outputs: Mutex::new(Outputs { drive, indicator }),
        }
    }

    fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }

    /// Run `op` against the outputs unless the halt has begun.
    fn write<F>(&self, op: F) -> Result<(), SeekerError>
    where
        F: FnOnce(&mut Outputs) -> Result<(), SeekerError>,
    {
        if self.is_halted() {
            return Ok(());
        }
        let mut outputs = lock(&self.outputs);
        // The halt may have begun while this thread waited for the lock.
        if self.is_halted() {
            return Ok(());
        }
        op(&mut outputs)
    }

    /// Raise the halted flag, then darken the indicator and stop every servo
    /// if the outputs are free.
    ///
    /// Returns `false` without waiting when a write is in flight; the flag
    /// still keeps every later write out.
    fn try_halt(&self) -> bool {
        self.halted.store(true, Ordering::SeqCst);
        let mut outputs = match self.outputs.try_lock() {
            Ok(outputs) => outputs,
            Err(TryLockError::Poisoned(e)) => e.into_inner(),
            Err(TryLockError::WouldBlock) => return false,
        };
        if let Err(e) = outputs.indicator.show(IndicatorColor::Off) {
            warn!(error = %e, "could not switch the indicator off");
        }
        if let Err(e) = outputs.drive.halt() {
            warn!(error = %e, "could not stop every servo");
        }
        true
    }
}

struct BehaviorActivity {
    thermal: Box<dyn ThermalArray>,
    range: Box<dyn RangeSensor>,
    actuation: Arc<Actuation>,
    fusion: ThermalFusion,
    engine: BehaviorEngine,
    arbiter: Arc<CommandArbiter>,
    snapshot_tx: watch::Sender<SensorSnapshot>,
    status_tx: watch::Sender<StatusReport>,
    cycle: u64,
}

impl Activity for BehaviorActivity {
    const NAME: &'static str = BEHAVIOR;

    fn cycle(&mut self) -> Result<(), SeekerError> {
        if self.actuation.is_halted() {
            return Ok(());
        }

        self.actuation.write(|out| out.drive.sweep_pan())?;
        let snapshot = self
            .fusion
            .sample(self.thermal.as_mut(), self.range.as_mut())?;
        self.snapshot_tx.send_replace(snapshot);

        let ticket = self.arbiter.current();
        let output = self.engine.step(ticket, &snapshot);
        if output.revert {
            self.arbiter.revert_to_stop(ticket.generation);
        }

        self.actuation.write(|out| {
            out.drive.apply(output.motion)?;
            out.indicator.show(output.indicator)
        })?;

        self.cycle += 1;
        let autonomous = self.engine.autonomous();
        self.status_tx.send_replace(StatusReport {
            cycle: self.cycle,
            command: ticket.command,
            phase: autonomous.phase(),
            move_count: autonomous.move_count(),
            motion: output.motion,
            indicator: output.indicator,
        });
        Ok(())
    }
}

struct OdometryActivity {
    left: Box<dyn WheelEncoder>,
    right: Box<dyn WheelEncoder>,
    integrator: OdometryIntegrator,
    odometry_tx: watch::Sender<OdometryReading>,
}

impl Activity for OdometryActivity {
    const NAME: &'static str = ODOMETRY;

    fn cycle(&mut self) -> Result<(), SeekerError> {
        self.integrator
            .update(self.left.as_mut(), self.right.as_mut())?;
        self.odometry_tx.send_replace(self.integrator.reading());
        Ok(())
    }
}

struct DisplayActivity {
    display: Box<dyn StatusDisplay>,
    snapshot_rx: watch::Receiver<SensorSnapshot>,
    odometry_rx: watch::Receiver<OdometryReading>,
}

impl Activity for DisplayActivity {
    const NAME: &'static str = DISPLAY;

    fn cycle(&mut self) -> Result<(), SeekerError> {
        let odometry = *self.odometry_rx.borrow();
        let snapshot = *self.snapshot_rx.borrow();
        self.display
            .print(&motion_line(&odometry), &thermal_line(&snapshot))
    }
}

struct RemoteActivity {
    source: Box<dyn CommandSource>,
    arbiter: Arc<CommandArbiter>,
}

impl Activity for RemoteActivity {
    const NAME: &'static str = REMOTE;

    fn cycle(&mut self) -> Result<(), SeekerError> {
        let codes = self.source.drain_pending();
        if !codes.is_empty() {
            debug!(count = codes.len(), "remote codes received");
            self.arbiter.drain(codes);
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal helpers
// ─────────────────────────────────────────────────────────────────────────────

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

fn activity_failure(
    activity: &str,
    joined: Result<Result<(), SeekerError>, JoinError>,
) -> SeekerError {
    let reason = match joined {
        Ok(Ok(())) => "exited unexpectedly".to_string(),
        Ok(Err(e)) => e.to_string(),
        Err(e) if e.is_panic() => "panicked".to_string(),
        Err(e) => e.to_string(),
    };
    SeekerError::ActivityFailed {
        activity: activity.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote;
    use seeker_hal::sim::SimRegistry;
    use seeker_types::{BehaviorPhase, Command, MotionDecision};
    use tokio::time::sleep;

    struct FailingRange;

    impl RangeSensor for FailingRange {
        fn distance(&mut self) -> Result<f64, SeekerError> {
            Err(SeekerError::HardwareFault {
                component: "sonar".to_string(),
                details: "echo timeout".to_string(),
            })
        }
    }

    /// Answers the first sweep, then hangs on the bus for two seconds.
    struct StallingThermal {
        sweeps: u32,
    }

    impl ThermalArray for StallingThermal {
        fn trigger_read(&mut self) -> Result<(), SeekerError> {
            self.sweeps += 1;
            if self.sweeps > 1 {
                std::thread::sleep(Duration::from_secs(2));
            }
            Ok(())
        }

        fn zone(&self, _zone: usize) -> u8 {
            22
        }
    }

    struct PanickingEncoder;

    impl WheelEncoder for PanickingEncoder {
        fn id(&self) -> &str {
            "left_encoder"
        }

        fn read_pulse(&mut self) -> Result<Option<u32>, SeekerError> {
            panic!("encoder bus fault");
        }
    }

    fn scheduler() -> Scheduler {
        Scheduler::new(SchedulerConfig::default(), BehaviorConfig::default())
    }

    fn after_ms(ms: u64) -> tokio::time::Sleep {
        sleep(Duration::from_millis(ms))
    }

    #[tokio::test(start_paused = true)]
    async fn manual_forward_runs_then_reverts_to_stop() {
        let (hardware, handles) = SimRegistry::new().build();
        let scheduler = scheduler();
        let arbiter = scheduler.arbiter();
        let observers = scheduler.observe();
        let (_tx, source) = remote::channel();

        arbiter.submit(Command::Forward);
        scheduler
            .run(hardware, Box::new(source), after_ms(2_600))
            .await
            .unwrap();

        let history = handles.indicator.history();
        assert_eq!(&history[..6], &[IndicatorColor::Green; 6]);
        assert_eq!(history[6], IndicatorColor::White);
        assert_eq!(history.last(), Some(&IndicatorColor::Off));

        assert_eq!(arbiter.current().command, Command::Stop);
        let status = *observers.status.borrow();
        assert_eq!(status.command, Command::Stop);
        assert_eq!(status.motion, MotionDecision::Idle);
        assert!(status.cycle >= 7);

        assert!(!handles.left_wheel.running());
        assert!(!handles.right_wheel.running());
        assert!(observers.odometry.borrow().left_distance_cm > 0.0);
        assert!(!handles.display.frames().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn remote_window_applies_only_the_last_valid_code() {
        let (hardware, _handles) = SimRegistry::new().build();
        let scheduler = scheduler();
        let arbiter = scheduler.arbiter();
        let observers = scheduler.observe();
        let (tx, source) = remote::channel();
        for code in ['x', 'F', 'A', '?'] {
            tx.send(code).await.unwrap();
        }

        scheduler
            .run(hardware, Box::new(source), after_ms(1_100))
            .await
            .unwrap();

        let ticket = arbiter.current();
        assert_eq!(ticket.command, Command::Attach);
        assert_eq!(ticket.generation, 1);

        let status = *observers.status.borrow();
        assert_eq!(status.command, Command::Attach);
        assert_eq!(status.phase, BehaviorPhase::Searching);
        assert_eq!(status.motion, MotionDecision::SpinLeft);
        assert_eq!(status.indicator, IndicatorColor::Blue);
    }

    #[tokio::test(start_paused = true)]
    async fn attach_locks_on_to_a_close_heat_source() {
        let (hardware, handles) = SimRegistry::new().with_range(10.0).build();
        handles.thermal.set_pixels(40);
        let scheduler = scheduler();
        let observers = scheduler.observe();
        scheduler.arbiter().submit(Command::Attach);
        let (_tx, source) = remote::channel();

        scheduler
            .run(hardware, Box::new(source), after_ms(1_100))
            .await
            .unwrap();

        let snapshot = *observers.snapshot.borrow();
        assert!(snapshot.heat_detected);
        assert_eq!(snapshot.left_average, 40);

        let status = *observers.status.borrow();
        assert_eq!(status.phase, BehaviorPhase::Attached);
        assert_eq!(status.motion, MotionDecision::Idle);
        assert_eq!(status.indicator, IndicatorColor::Green);

        let (speed_line, thermal_line) = handles.display.last().unwrap();
        assert!(speed_line.starts_with("S:"));
        assert_eq!(thermal_line, "A:22, L:40, R:40");
    }

    #[tokio::test(start_paused = true)]
    async fn driver_error_triggers_emergency_halt() {
        let (mut hardware, handles) = SimRegistry::new().build();
        hardware.range = Box::new(FailingRange);
        let (_tx, source) = remote::channel();

        let err = scheduler()
            .run(hardware, Box::new(source), std::future::pending())
            .await
            .unwrap_err();

        match err {
            SeekerError::ActivityFailed { activity, reason } => {
                assert_eq!(activity, BEHAVIOR);
                assert!(reason.contains("echo timeout"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(handles.indicator.current(), IndicatorColor::Off);
        assert!(!handles.left_wheel.running());
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_activity_triggers_emergency_halt() {
        let (mut hardware, handles) = SimRegistry::new().build();
        hardware.left_encoder = Box::new(PanickingEncoder);
        let scheduler = scheduler();
        scheduler.arbiter().submit(Command::Forward);
        let (_tx, source) = remote::channel();

        let err = scheduler
            .run(hardware, Box::new(source), std::future::pending())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            SeekerError::ActivityFailed {
                activity: ODOMETRY.to_string(),
                reason: "panicked".to_string(),
            }
        );
        assert_eq!(handles.indicator.current(), IndicatorColor::Off);
        assert!(!handles.left_wheel.running());
        assert!(!handles.right_wheel.running());
    }

    #[tokio::test]
    async fn zero_period_is_rejected_before_anything_runs() {
        let (hardware, handles) = SimRegistry::new().build();
        let config = SchedulerConfig {
            odometry_period_ms: 0,
            ..SchedulerConfig::default()
        };
        let (_tx, source) = remote::channel();

        let err = Scheduler::new(config, BehaviorConfig::default())
            .run(hardware, Box::new(source), std::future::pending())
            .await
            .unwrap_err();

        assert!(matches!(err, SeekerError::Config(ref m) if m.contains("odometry")));
        assert!(handles.indicator.history().is_empty());
    }

    #[test]
    fn halted_actuation_ignores_further_cycles() {
        let (hardware, handles) = SimRegistry::new().build();
        let HardwareRegistry {
            thermal,
            range,
            drive,
            indicator,
            ..
        } = hardware;
        let actuation = Arc::new(Actuation::new(drive, indicator));
        let arbiter = Arc::new(CommandArbiter::new());
        arbiter.submit(Command::Forward);
        let mut activity = BehaviorActivity {
            thermal,
            range,
            actuation: Arc::clone(&actuation),
            fusion: ThermalFusion::new(),
            engine: BehaviorEngine::new(BehaviorConfig::default()),
            arbiter,
            snapshot_tx: watch::channel(SensorSnapshot::default()).0,
            status_tx: watch::channel(StatusReport::default()).0,
            cycle: 0,
        };

        activity.cycle().unwrap();
        assert!(handles.left_wheel.running());

        assert!(actuation.try_halt());
        handles.left_wheel.clear_calls();
        activity.cycle().unwrap();
        assert!(handles.left_wheel.calls().is_empty());
        assert_eq!(handles.indicator.current(), IndicatorColor::Off);
    }

    #[test]
    fn halt_never_waits_for_an_in_flight_write() {
        let (hardware, handles) = SimRegistry::new().build();
        let actuation = Actuation::new(hardware.drive, hardware.indicator);

        let busy = lock(&actuation.outputs);
        assert!(!actuation.try_halt());
        assert!(actuation.is_halted());
        drop(busy);

        // Writes that start after the flag is raised are dropped.
        actuation
            .write(|out| out.drive.apply(MotionDecision::Forward))
            .unwrap();
        assert!(!handles.left_wheel.running());

        assert!(actuation.try_halt());
        assert_eq!(handles.indicator.current(), IndicatorColor::Off);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn stalled_sensor_is_halted_at_the_watchdog_deadline() {
        let (mut hardware, handles) = SimRegistry::new().build();
        hardware.thermal = Box::new(StallingThermal { sweeps: 0 });
        let config = SchedulerConfig {
            behavior_period_ms: 50,
            ..SchedulerConfig::default()
        };
        let scheduler = Scheduler::new(config, BehaviorConfig::default());
        scheduler.arbiter().submit(Command::Forward);
        let (_tx, source) = remote::channel();

        let started = std::time::Instant::now();
        let err = scheduler
            .run(hardware, Box::new(source), std::future::pending())
            .await
            .unwrap_err();
        let elapsed = started.elapsed();

        assert!(elapsed < Duration::from_secs(1), "halt took {elapsed:?}");
        assert_eq!(
            err,
            SeekerError::ActivityFailed {
                activity: BEHAVIOR.to_string(),
                reason: "missed its watchdog deadline".to_string(),
            }
        );
        assert_eq!(handles.indicator.current(), IndicatorColor::Off);
        assert!(!handles.left_wheel.running());
        assert!(!handles.right_wheel.running());
    }

    #[tokio::test]
    async fn invalid_behavior_config_is_rejected_before_anything_runs() {
        let (hardware, handles) = SimRegistry::new().build();
        let behavior = BehaviorConfig {
            panic_cycles: u32::MAX,
            ..BehaviorConfig::default()
        };
        let (_tx, source) = remote::channel();

        let err = Scheduler::new(SchedulerConfig::default(), behavior)
            .run(hardware, Box::new(source), std::future::pending())
            .await
            .unwrap_err();

        assert!(matches!(err, SeekerError::Config(ref m) if m.contains("panic_cycles")));
        assert!(handles.indicator.history().is_empty());
    }

    #[test]
    fn scheduler_config_defaults_and_partial_toml() {
        let config = SchedulerConfig::default();
        assert_eq!(config.behavior_period_ms, 250);
        assert_eq!(config.remote_period_ms, 5500);
        assert!(config.validate().is_ok());

        let parsed: SchedulerConfig = toml::from_str("display_period_ms = 1000").unwrap();
        assert_eq!(parsed.display_period_ms, 1000);
        assert_eq!(parsed.odometry_period_ms, 100);

        let bad = SchedulerConfig {
            watchdog_periods: 0,
            ..SchedulerConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
