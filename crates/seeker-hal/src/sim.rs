//! In-process simulated drivers for CI/CD testing without physical hardware.
//!
//! Every simulated driver is created together with a cloneable *handle* that
//! shares its state, so tests (and the CLI) can script sensor values and
//! inspect the commands the core issued.
//!
//! [`SimRegistry`] assembles a complete [`HardwareRegistry`] from these
//! drivers and hands back the handles.
//!
//! # Example
//!
//! ```rust
//! use seeker_hal::sim::SimRegistry;
//!
//! let (registry, handles) = SimRegistry::new()
//!     .with_ambient(24)
//!     .with_range(120.0)
//!     .build();
//!
//! handles.thermal.set_pixels(30);
//! assert!(!handles.left_wheel.running());
//! # drop(registry);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use seeker_types::{IndicatorColor, SeekerError, ZONE_COUNT};
use tracing::info;

use crate::actuator::{INITIAL_PULSE_WIDTH_TICKS, ServoActuator, WheelEncoder};
use crate::drive::DriveTrain;
use crate::indicator::{Indicator, StatusDisplay};
use crate::registry::HardwareRegistry;
use crate::sensor::{RangeSensor, ThermalArray};

/// Entries kept by every recorded history; older ones are dropped first.
pub const HISTORY_CAPACITY: usize = 256;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn record<T>(history: &mut VecDeque<T>, entry: T) {
    if history.len() == HISTORY_CAPACITY {
        history.pop_front();
    }
    history.push_back(entry);
}

// ────────────────────────────────────────────────────────────────────────────
// Servo
// ────────────────────────────────────────────────────────────────────────────

/// One driver call recorded by a [`SimServo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServoCall {
    Start,
    SetPulse(u16),
    Stop,
}

#[derive(Debug, Default)]
struct ServoState {
    running: bool,
    pulse_width: u16,
    calls: VecDeque<ServoCall>,
}

/// Shared view of a [`SimServo`].
#[derive(Debug, Clone, Default)]
pub struct ServoHandle(Arc<Mutex<ServoState>>);

impl ServoHandle {
    pub fn running(&self) -> bool {
        lock(&self.0).running
    }

    /// Last pulse width written (0 if never set).
    pub fn pulse_width(&self) -> u16 {
        lock(&self.0).pulse_width
    }

    /// The most recent calls (at most [`HISTORY_CAPACITY`]) since creation
    /// or the last [`clear_calls`][Self::clear_calls].
    pub fn calls(&self) -> Vec<ServoCall> {
        lock(&self.0).calls.iter().copied().collect()
    }

    pub fn clear_calls(&self) {
        lock(&self.0).calls.clear();
    }

    /// `true` while the servo is enabled and driven off its neutral pulse.
    pub fn turning(&self) -> bool {
        let state = lock(&self.0);
        state.running && state.pulse_width != INITIAL_PULSE_WIDTH_TICKS
    }
}

/// A simulated servo channel that records every call.  Always succeeds.
pub struct SimServo {
    id: String,
    state: ServoHandle,
}

impl SimServo {
    pub fn new(id: impl Into<String>) -> (Box<Self>, ServoHandle) {
        let state = ServoHandle::default();
        let servo = Box::new(Self {
            id: id.into(),
            state: state.clone(),
        });
        (servo, state)
    }
}

impl ServoActuator for SimServo {
    fn id(&self) -> &str {
        &self.id
    }

    fn start(&mut self) -> Result<(), SeekerError> {
        let mut state = lock(&self.state.0);
        state.running = true;
        record(&mut state.calls, ServoCall::Start);
        Ok(())
    }

    fn set_pulse_width(&mut self, ticks: u16) -> Result<(), SeekerError> {
        let mut state = lock(&self.state.0);
        state.pulse_width = ticks;
        record(&mut state.calls, ServoCall::SetPulse(ticks));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), SeekerError> {
        let mut state = lock(&self.state.0);
        state.running = false;
        record(&mut state.calls, ServoCall::Stop);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Encoder
// ────────────────────────────────────────────────────────────────────────────

/// A simulated encoder that registers one pulse per sample while its wheel
/// servo is turning.
pub struct SimEncoder {
    id: String,
    wheel: ServoHandle,
    ticks_per_pulse: u32,
}

impl SimEncoder {
    /// `ticks_per_pulse` is the reported pulse length in 500 ns timer ticks.
    pub fn new(id: impl Into<String>, wheel: ServoHandle, ticks_per_pulse: u32) -> Box<Self> {
        Box::new(Self {
            id: id.into(),
            wheel,
            ticks_per_pulse,
        })
    }
}

impl WheelEncoder for SimEncoder {
    fn id(&self) -> &str {
        &self.id
    }

    fn read_pulse(&mut self) -> Result<Option<u32>, SeekerError> {
        Ok(self.wheel.turning().then_some(self.ticks_per_pulse))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Thermal array and range sensor
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct ThermalState {
    /// Values the next sweep will latch.
    live: [u8; ZONE_COUNT],
    sweeps: u64,
}

/// Shared view of a [`SimThermal`].
#[derive(Debug, Clone)]
pub struct ThermalHandle(Arc<Mutex<ThermalState>>);

impl ThermalHandle {
    pub fn set_zones(&self, zones: [u8; ZONE_COUNT]) {
        lock(&self.0).live = zones;
    }

    pub fn set_ambient(&self, value: u8) {
        lock(&self.0).live[0] = value;
    }

    /// Set all eight directional pixels to `value`.
    pub fn set_pixels(&self, value: u8) {
        lock(&self.0).live[1..].fill(value);
    }

    /// Number of sweeps triggered so far.
    pub fn sweeps(&self) -> u64 {
        lock(&self.0).sweeps
    }
}

/// A simulated thermal array.  Values only become visible after a sweep.
pub struct SimThermal {
    state: ThermalHandle,
    latched: [u8; ZONE_COUNT],
}

impl SimThermal {
    pub fn new(ambient: u8) -> (Box<Self>, ThermalHandle) {
        let state = ThermalHandle(Arc::new(Mutex::new(ThermalState {
            live: [ambient; ZONE_COUNT],
            sweeps: 0,
        })));
        let sensor = Box::new(Self {
            state: state.clone(),
            latched: [0; ZONE_COUNT],
        });
        (sensor, state)
    }
}

impl ThermalArray for SimThermal {
    fn trigger_read(&mut self) -> Result<(), SeekerError> {
        let mut state = lock(&self.state.0);
        state.sweeps += 1;
        self.latched = state.live;
        Ok(())
    }

    fn zone(&self, zone: usize) -> u8 {
        self.latched.get(zone).copied().unwrap_or(0)
    }
}

/// Shared view of a [`SimRange`].
#[derive(Debug, Clone)]
pub struct RangeHandle(Arc<Mutex<f64>>);

impl RangeHandle {
    pub fn set(&self, distance: f64) {
        *lock(&self.0) = distance;
    }
}

/// A simulated range sensor returning a scripted distance.
pub struct SimRange {
    distance: RangeHandle,
}

impl SimRange {
    pub fn new(distance: f64) -> (Box<Self>, RangeHandle) {
        let handle = RangeHandle(Arc::new(Mutex::new(distance)));
        (
            Box::new(Self {
                distance: handle.clone(),
            }),
            handle,
        )
    }
}

impl RangeSensor for SimRange {
    fn distance(&mut self) -> Result<f64, SeekerError> {
        Ok(*lock(&self.distance.0))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Indicator and display
// ────────────────────────────────────────────────────────────────────────────

/// Shared view of a [`SimIndicator`]: the most recent colors shown.
#[derive(Debug, Clone, Default)]
pub struct IndicatorHandle(Arc<Mutex<VecDeque<IndicatorColor>>>);

impl IndicatorHandle {
    /// Oldest first, at most [`HISTORY_CAPACITY`] entries.
    pub fn history(&self) -> Vec<IndicatorColor> {
        lock(&self.0).iter().copied().collect()
    }

    /// [`IndicatorColor::Off`] until the first color is shown.
    pub fn current(&self) -> IndicatorColor {
        lock(&self.0).back().copied().unwrap_or_default()
    }
}

/// A simulated tri-color LED.
pub struct SimIndicator {
    history: IndicatorHandle,
}

impl SimIndicator {
    pub fn new() -> (Box<Self>, IndicatorHandle) {
        let history = IndicatorHandle::default();
        (
            Box::new(Self {
                history: history.clone(),
            }),
            history,
        )
    }
}

impl Indicator for SimIndicator {
    fn show(&mut self, color: IndicatorColor) -> Result<(), SeekerError> {
        record(&mut *lock(&self.history.0), color);
        Ok(())
    }
}

/// Shared view of a [`SimDisplay`]: the most recent frames printed.
#[derive(Debug, Clone, Default)]
pub struct DisplayHandle(Arc<Mutex<VecDeque<(String, String)>>>);

impl DisplayHandle {
    /// Oldest first, at most [`HISTORY_CAPACITY`] frames.
    pub fn frames(&self) -> Vec<(String, String)> {
        lock(&self.0).iter().cloned().collect()
    }

    pub fn last(&self) -> Option<(String, String)> {
        lock(&self.0).back().cloned()
    }
}

/// A simulated two-line display that records frames and echoes them to the
/// log at `info` level.
pub struct SimDisplay {
    frames: DisplayHandle,
}

impl SimDisplay {
    pub fn new() -> (Box<Self>, DisplayHandle) {
        let frames = DisplayHandle::default();
        (
            Box::new(Self {
                frames: frames.clone(),
            }),
            frames,
        )
    }
}

impl StatusDisplay for SimDisplay {
    fn print(&mut self, first: &str, second: &str) -> Result<(), SeekerError> {
        info!(target: "seeker::display", "{first} | {second}");
        record(&mut *lock(&self.frames.0), (first.to_string(), second.to_string()));
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimRegistry builder
// ────────────────────────────────────────────────────────────────────────────

/// Handles to every driver inside a simulated [`HardwareRegistry`].
#[derive(Debug, Clone)]
pub struct SimHandles {
    pub thermal: ThermalHandle,
    pub range: RangeHandle,
    pub left_wheel: ServoHandle,
    pub right_wheel: ServoHandle,
    pub pan: ServoHandle,
    pub indicator: IndicatorHandle,
    pub display: DisplayHandle,
}

/// Builder that constructs a fully simulated [`HardwareRegistry`].
#[derive(Debug, Clone)]
pub struct SimRegistry {
    ambient: u8,
    range: f64,
    ticks_per_pulse: u32,
}

impl Default for SimRegistry {
    fn default() -> Self {
        Self {
            ambient: 22,
            range: 200.0,
            // One 0.1 s pulse per 100 ms odometry sample.
            ticks_per_pulse: 200_000,
        }
    }
}

impl SimRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial reading of every thermal zone.
    pub fn with_ambient(mut self, ambient: u8) -> Self {
        self.ambient = ambient;
        self
    }

    /// Initial range-sensor distance.
    pub fn with_range(mut self, range: f64) -> Self {
        self.range = range;
        self
    }

    /// Encoder pulse length reported while a wheel turns.
    pub fn with_ticks_per_pulse(mut self, ticks: u32) -> Self {
        self.ticks_per_pulse = ticks;
        self
    }

    /// Consume the builder and return the registry plus its handles.
    pub fn build(self) -> (HardwareRegistry, SimHandles) {
        let (thermal, thermal_h) = SimThermal::new(self.ambient);
        let (range, range_h) = SimRange::new(self.range);
        let (left, left_h) = SimServo::new("left_wheel");
        let (right, right_h) = SimServo::new("right_wheel");
        let (pan, pan_h) = SimServo::new("sensor_pan");
        let (indicator, indicator_h) = SimIndicator::new();
        let (display, display_h) = SimDisplay::new();

        let registry = HardwareRegistry {
            thermal,
            range,
            left_encoder: SimEncoder::new("left_encoder", left_h.clone(), self.ticks_per_pulse),
            right_encoder: SimEncoder::new(
                "right_encoder",
                right_h.clone(),
                self.ticks_per_pulse,
            ),
            drive: DriveTrain::new(left, right, pan),
            indicator,
            display,
        };
        let handles = SimHandles {
            thermal: thermal_h,
            range: range_h,
            left_wheel: left_h,
            right_wheel: right_h,
            pan: pan_h,
            indicator: indicator_h,
            display: display_h,
        };
        (registry, handles)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
