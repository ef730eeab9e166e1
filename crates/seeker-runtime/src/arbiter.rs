//! [`CommandArbiter`] – the single slot holding the operator's current
//! command.
//!
//! Every write bumps a generation counter.  The behavior activity reads a
//! [`CommandTicket`] (command + generation) each cycle and, when a manual
//! motion finishes, asks for [`CommandArbiter::revert_to_stop`] with the
//! generation it was executing.  The revert only lands if nothing newer has
//! been submitted in between, so a fresh operator command is never clobbered
//! by an expiring one.
//!
//! ```rust
//! use seeker_runtime::arbiter::CommandArbiter;
//! use seeker_types::Command;
//!
//! let arbiter = CommandArbiter::new();
//! assert_eq!(arbiter.current().command, Command::Stop);
//!
//! let forward = arbiter.submit(Command::Forward);
//! let attach = arbiter.submit(Command::Attach);
//! assert!(!arbiter.revert_to_stop(forward.generation));
//! assert_eq!(arbiter.current(), attach);
//! ```

use std::sync::{Mutex, MutexGuard};

use seeker_types::Command;
use tracing::{debug, info};

/// A command together with the generation it was written at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandTicket {
    pub command: Command,
    pub generation: u64,
}

/// Latest-wins command slot shared between the remote-polling and behavior
/// activities.
#[derive(Debug, Default)]
pub struct CommandArbiter {
    slot: Mutex<CommandTicket>,
}

impl CommandArbiter {
    /// Starts at [`Command::Stop`], generation 0.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, CommandTicket> {
        // A ticket is two plain words; a poisoned slot still holds a valid one.
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn current(&self) -> CommandTicket {
        *self.slot()
    }

    /// Replace the active command unconditionally.
    pub fn submit(&self, command: Command) -> CommandTicket {
        let mut slot = self.slot();
        *slot = CommandTicket {
            command,
            generation: slot.generation + 1,
        };
        info!(command = ?command, generation = slot.generation, "command accepted");
        *slot
    }

    /// Apply everything received in one polling window: only the last
    /// well-formed code is written.
    pub fn drain<I>(&self, codes: I) -> Option<CommandTicket>
    where
        I: IntoIterator<Item = char>,
    {
        let mut latest = None;
        for code in codes {
            match Command::from_code(code) {
                Some(command) => latest = Some(command),
                None => debug!(code = ?code, "ignoring malformed command code"),
            }
        }
        latest.map(|command| self.submit(command))
    }

    /// Return to [`Command::Stop`] if the slot still holds `generation`.
    ///
    /// Returns whether the revert happened.
    pub fn revert_to_stop(&self, generation: u64) -> bool {
        let mut slot = self.slot();
        if slot.generation != generation {
            debug!(
                expected = generation,
                actual = slot.generation,
                "skipping revert; a newer command is active"
            );
            return false;
        }
        let finished = slot.command;
        *slot = CommandTicket {
            command: Command::Stop,
            generation: generation + 1,
        };
        info!(finished = ?finished, "manual command finished; reverting to stop");
        true
    }
}
