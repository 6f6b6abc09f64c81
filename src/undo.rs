use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{constants::UNDO_SETTINGS, domain::Entry};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingUndo {
    pub timestamp: i64,
    pub armed_at: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UndoState {
    Idle,
    PendingUndo(PendingUndo),
}

/// Token for one scheduled expiry. Arming again makes every older handle stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExpiryHandle {
    generation: u64,
    deadline_ms: i64,
}

impl ExpiryHandle {
    pub fn deadline_ms(&self) -> i64 {
        self.deadline_ms
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UndoOutcome {
    Undone(Entry),
    NothingToUndo,
}

pub type UndoListener = Box<dyn FnMut(bool)>;

pub struct UndoController {
    state: UndoState,
    generation: u64,
    window_ms: i64,
    listener: Option<UndoListener>,
}

impl fmt::Debug for UndoController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoController")
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("window_ms", &self.window_ms)
            .finish_non_exhaustive()
    }
}

impl Default for UndoController {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoController {
    pub fn new() -> Self {
        Self::with_window(UNDO_SETTINGS.window_ms)
    }

    pub fn with_window(window_ms: i64) -> Self {
        Self {
            state: UndoState::Idle,
            generation: 0,
            window_ms,
            listener: None,
        }
    }

    pub fn set_listener(&mut self, listener: impl FnMut(bool) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn state(&self) -> UndoState {
        self.state
    }

    pub fn window_ms(&self) -> i64 {
        self.window_ms
    }

    pub fn arm(&mut self, entry: &Entry, now_ms: i64) -> ExpiryHandle {
        if let UndoState::PendingUndo(previous) = self.state {
            debug!("Superseding pending undo for timestamp {}", previous.timestamp);
        }
        self.install(PendingUndo {
            timestamp: entry.timestamp,
            armed_at: now_ms,
        })
    }

    pub fn can_undo(&self, now_ms: i64) -> bool {
        match self.state {
            UndoState::PendingUndo(pending) => self.within_window(pending, now_ms),
            UndoState::Idle => false,
        }
    }

    /// The armed timestamp while the window is open. Does not release the slot.
    pub fn armed_timestamp(&self, now_ms: i64) -> Option<i64> {
        match self.state {
            UndoState::PendingUndo(pending) if self.within_window(pending, now_ms) => {
                Some(pending.timestamp)
            }
            _ => None,
        }
    }

    pub fn current_expiry(&self) -> Option<ExpiryHandle> {
        match self.state {
            UndoState::PendingUndo(pending) => Some(ExpiryHandle {
                generation: self.generation,
                deadline_ms: pending.armed_at + self.window_ms,
            }),
            UndoState::Idle => None,
        }
    }

    /// Stale or repeated handles do nothing.
    pub fn expire(&mut self, handle: ExpiryHandle) -> bool {
        if handle.generation != self.generation || self.state == UndoState::Idle {
            return false;
        }
        debug!("Undo window expired");
        self.release();
        true
    }

    pub fn poll(&mut self, now_ms: i64) -> bool {
        match self.state {
            UndoState::PendingUndo(pending) if !self.within_window(pending, now_ms) => {
                debug!("Undo window expired");
                self.release();
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        if self.state != UndoState::Idle {
            self.release();
        }
    }

    pub fn snapshot(&self) -> Option<PendingUndo> {
        match self.state {
            UndoState::PendingUndo(pending) => Some(pending),
            UndoState::Idle => None,
        }
    }

    pub fn restore(&mut self, pending: PendingUndo, now_ms: i64) -> Option<ExpiryHandle> {
        if pending.armed_at > now_ms || !self.within_window(pending, now_ms) {
            return None;
        }
        Some(self.install(pending))
    }

    fn within_window(&self, pending: PendingUndo, now_ms: i64) -> bool {
        now_ms - pending.armed_at < self.window_ms
    }

    fn install(&mut self, pending: PendingUndo) -> ExpiryHandle {
        self.generation += 1;
        self.state = UndoState::PendingUndo(pending);
        self.notify(true);
        ExpiryHandle {
            generation: self.generation,
            deadline_ms: pending.armed_at + self.window_ms,
        }
    }

    fn release(&mut self) {
        self.generation += 1;
        self.state = UndoState::Idle;
        self.notify(false);
    }

    fn notify(&mut self, armed: bool) {
        if let Some(listener) = self.listener.as_mut() {
            listener(armed);
        }
    }
}
