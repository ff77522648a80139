//! Process residency.
//!
//! Once the entry point is registered the service must stay resident for
//! later host calls. On native targets [`Keeper::hold`] parks the main
//! path on a channel that is only signalled by [`KeeperHandle::shutdown`].
//! On `wasm32` the JS event loop keeps the instance alive, so the keeper
//! only tracks readiness.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crossbeam::channel::{self, Receiver, Sender};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeeperState {
    /// Entry point not yet registered.
    Starting,
    /// Registered and accepting calls.
    Serving,
    Stopped,
}

impl KeeperState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => KeeperState::Starting,
            1 => KeeperState::Serving,
            _ => KeeperState::Stopped,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            KeeperState::Starting => 0,
            KeeperState::Serving => 1,
            KeeperState::Stopped => 2,
        }
    }
}

#[derive(Debug)]
struct Shared {
    state: AtomicU8,
}

impl Shared {
    fn load(&self) -> KeeperState {
        KeeperState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Move to `next` unless already stopped. Returns the previous state.
    fn advance(&self, next: KeeperState) -> KeeperState {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if KeeperState::from_u8(current) == KeeperState::Stopped {
                return KeeperState::Stopped;
            }
            match self.state.compare_exchange(
                current,
                next.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(previous) => return KeeperState::from_u8(previous),
                Err(actual) => current = actual,
            }
        }
    }
}

/// Owns the blocking primitive the main path waits on.
#[derive(Debug)]
pub struct Keeper {
    shared: Arc<Shared>,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
}

impl Default for Keeper {
    fn default() -> Self {
        Self::new()
    }
}

impl Keeper {
    pub fn new() -> Self {
        let (wake_tx, wake_rx) = channel::bounded(1);
        Self {
            shared: Arc::new(Shared {
                state: AtomicU8::new(KeeperState::Starting.as_u8()),
            }),
            wake_tx,
            wake_rx,
        }
    }

    /// A cloneable handle for health checks and shutdown.
    pub fn handle(&self) -> KeeperHandle {
        KeeperHandle {
            shared: Arc::clone(&self.shared),
            wake_tx: self.wake_tx.clone(),
        }
    }

    /// Flip the readiness flag. Called once the entry point is registered.
    pub fn mark_ready(&self) {
        if self.shared.advance(KeeperState::Serving) == KeeperState::Starting {
            info!("keeper serving");
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state() == KeeperState::Serving
    }

    pub fn state(&self) -> KeeperState {
        self.shared.load()
    }

    /// Block until [`KeeperHandle::shutdown`] is called.
    ///
    /// The keeper holds its own sender, so the wait cannot end because
    /// handles were dropped.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn hold(self) {
        if self.state() != KeeperState::Stopped {
            info!("keeper holding");
            let _ = self.wake_rx.recv();
        }
        self.shared.advance(KeeperState::Stopped);
        info!("keeper released");
    }
}

/// Shared view of a [`Keeper`].
#[derive(Debug, Clone)]
pub struct KeeperHandle {
    shared: Arc<Shared>,
    wake_tx: Sender<()>,
}

impl KeeperHandle {
    pub fn is_ready(&self) -> bool {
        self.state() == KeeperState::Serving
    }

    pub fn state(&self) -> KeeperState {
        self.shared.load()
    }

    /// Stop serving and release a holding keeper. Idempotent.
    pub fn shutdown(&self) {
        if self.shared.advance(KeeperState::Stopped) != KeeperState::Stopped {
            info!("keeper shutdown requested");
            // A full channel already carries a pending wake-up.
            let _ = self.wake_tx.try_send(());
        }
    }
}
