//! [`Watchdog`] – per-activity heartbeat deadlines.
//!
//! Each periodic activity is registered with its period; its deadline is that
//! period times the configured tolerance.  Activities call
//! [`Watchdog::heartbeat`] after every completed cycle and the supervisor
//! polls [`Watchdog::first_stalled`] on its own tick.
//!
//! Timestamps come from [`tokio::time::Instant`], so deadlines follow the
//! runtime clock (including a paused test clock).

use std::time::Duration;

use tokio::time::Instant;

struct Deadline {
    activity: &'static str,
    limit: Duration,
    last_beat: Instant,
}

/// Heartbeat deadlines for a fixed set of activities.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use seeker_runtime::watchdog::Watchdog;
///
/// let mut wd = Watchdog::new(4);
/// wd.register("behavior", Duration::from_millis(250));
/// wd.heartbeat("behavior");
///
/// assert_eq!(wd.first_stalled(), None);
/// ```
pub struct Watchdog {
    tolerance_periods: u32,
    deadlines: Vec<Deadline>,
}

impl Watchdog {
    /// An activity may miss `tolerance_periods` whole periods before it
    /// counts as stalled.
    pub fn new(tolerance_periods: u32) -> Self {
        Self {
            tolerance_periods,
            deadlines: Vec::new(),
        }
    }

    /// Start watching `activity`.  Its clock starts now.
    pub fn register(&mut self, activity: &'static str, period: Duration) {
        self.deadlines.push(Deadline {
            activity,
            limit: period * self.tolerance_periods,
            last_beat: Instant::now(),
        });
    }

    /// Unknown names are ignored.
    pub fn heartbeat(&mut self, activity: &str) {
        if let Some(d) = self.deadlines.iter_mut().find(|d| d.activity == activity) {
            d.last_beat = Instant::now();
        }
    }

    /// The first activity, in registration order, whose last heartbeat is
    /// older than its deadline.
    pub fn first_stalled(&self) -> Option<&'static str> {
        self.deadlines
            .iter()
            .find(|d| d.last_beat.elapsed() > d.limit)
            .map(|d| d.activity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_is_period_times_tolerance() {
        let mut wd = Watchdog::new(4);
        wd.register("behavior", ms(250));

        advance(ms(1_000)).await;
        assert_eq!(wd.first_stalled(), None);

        advance(ms(1)).await;
        assert_eq!(wd.first_stalled(), Some("behavior"));
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeat_restarts_the_clock() {
        let mut wd = Watchdog::new(2);
        wd.register("odometry", ms(10));
        advance(ms(15)).await;
        wd.heartbeat("odometry");
        advance(ms(15)).await;
        assert_eq!(wd.first_stalled(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn first_stalled_follows_registration_order() {
        let mut wd = Watchdog::new(1);
        wd.register("behavior", ms(10));
        wd.register("odometry", ms(20));
        wd.register("remote", ms(60_000));

        advance(ms(30)).await;
        assert_eq!(wd.first_stalled(), Some("behavior"));

        wd.heartbeat("behavior");
        assert_eq!(wd.first_stalled(), Some("odometry"));

        wd.heartbeat("odometry");
        assert_eq!(wd.first_stalled(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_heartbeat_is_ignored() {
        let mut wd = Watchdog::new(1);
        wd.register("display", ms(10));
        advance(ms(20)).await;
        wd.heartbeat("ghost");
        assert_eq!(wd.first_stalled(), Some("display"));
    }
}
