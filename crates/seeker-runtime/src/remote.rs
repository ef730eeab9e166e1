//! Remote command transport.
//!
//! A [`CommandSource`] yields raw single-character command codes.  The
//! scheduler's remote-polling activity drains every pending code once per
//! polling period and hands them to
//! [`CommandArbiter::drain`][crate::arbiter::CommandArbiter::drain].
//!
//! [`channel`] builds the in-process transport used by the CLI (stdin) and
//! by tests.

use tokio::sync::mpsc;

/// Codes buffered between two polling windows before senders wait.
pub const REMOTE_BUFFER: usize = 64;

/// Non-blocking source of remote command codes.
pub trait CommandSource: Send {
    /// Next pending code, or `None` when nothing is waiting.
    fn try_next(&mut self) -> Option<char>;

    /// Everything currently pending, oldest first.
    fn drain_pending(&mut self) -> Vec<char> {
        std::iter::from_fn(|| self.try_next()).collect()
    }
}

/// Sending half of [`channel`].
pub type RemoteSender = mpsc::Sender<char>;

/// Receiving half of [`channel`].
pub struct ChannelSource {
    rx: mpsc::Receiver<char>,
}

impl CommandSource for ChannelSource {
    fn try_next(&mut self) -> Option<char> {
        self.rx.try_recv().ok()
    }
}

/// An in-process remote link holding up to [`REMOTE_BUFFER`] codes.
pub fn channel() -> (RemoteSender, ChannelSource) {
    let (tx, rx) = mpsc::channel(REMOTE_BUFFER);
    (tx, ChannelSource { rx })
}
