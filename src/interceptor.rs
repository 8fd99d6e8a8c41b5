//! Exactly-once interception of the host's command dispatch
//!
//! The host exposes a single programmatic dispatch entry point, modeled as
//! a [`DispatchSlot`]. [`install`] replaces the slot's function with a
//! wrapper that forwards every call to the original and then reports the
//! command id to a [`DispatchObserver`].
//!
//! Invariants:
//! - A slot carries at most one wrapper. Installing again returns a handle
//!   to the existing interception.
//! - One logical invocation is observed once. A dispatch that re-enters the
//!   slot with the same invocation key while the outer call is still in
//!   flight is forwarded without being observed.
//! - The wrapper returns the original's result unmodified. Observer errors
//!   and panics are logged and swallowed.
//! - [`InterceptionHandle::teardown`] restores the original function; a
//!   second teardown is a no-op.
//!
//! The in-flight bookkeeping assumes the host's single-threaded event
//! model: all dispatches arrive on one call stack.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::error::ResultExt;

/// Optional invocation context passed alongside the command id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationContext {
    /// Host-provided token distinguishing otherwise identical invocations
    pub token: Option<u64>,
}

impl InvocationContext {
    pub fn with_token(token: u64) -> Self {
        Self { token: Some(token) }
    }
}

/// The host's dispatch function: command id (+ context) -> success.
pub type DispatchFn = Arc<dyn Fn(&str, Option<&InvocationContext>) -> bool + Send + Sync>;

/// Receives every intercepted invocation once.
pub trait DispatchObserver: Send + Sync {
    fn observe(&self, command_id: &str) -> anyhow::Result<()>;
}

/// Key identifying one logical invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
struct InvocationKey {
    command_id: String,
    token: Option<u64>,
}

impl InvocationKey {
    fn new(command_id: &str, context: Option<&InvocationContext>) -> Self {
        Self {
            command_id: command_id.to_string(),
            token: context.and_then(|c| c.token),
        }
    }
}

/// The host's single programmatic dispatch entry point.
pub struct DispatchSlot {
    entry: Mutex<DispatchFn>,
    interception: Mutex<Option<Arc<Interception>>>,
}

impl DispatchSlot {
    pub fn new<F>(original: F) -> Arc<Self>
    where
        F: Fn(&str, Option<&InvocationContext>) -> bool + Send + Sync + 'static,
    {
        let entry: DispatchFn = Arc::new(original);
        Arc::new(Self {
            entry: Mutex::new(entry),
            interception: Mutex::new(None),
        })
    }

    /// Dispatch a command through whatever function currently occupies the slot.
    pub fn dispatch(&self, command_id: &str, context: Option<&InvocationContext>) -> bool {
        // Clone out so re-entrant dispatch does not contend on the lock.
        let entry = Arc::clone(&*self.entry.lock());
        entry(command_id, context)
    }

    pub fn is_intercepted(&self) -> bool {
        self.interception.lock().is_some()
    }
}

impl std::fmt::Debug for DispatchSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchSlot")
            .field("intercepted", &self.is_intercepted())
            .finish()
    }
}

struct Interception {
    original: DispatchFn,
    observer: Arc<dyn DispatchObserver>,
    active: AtomicBool,
    in_flight: Mutex<Vec<InvocationKey>>,
}

/// Removes an in-flight key when the outermost call returns or unwinds.
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<Vec<InvocationKey>>,
    key: InvocationKey,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock();
        if let Some(position) = in_flight.iter().rposition(|k| *k == self.key) {
            in_flight.remove(position);
        }
    }
}

impl Interception {
    fn call(&self, command_id: &str, context: Option<&InvocationContext>) -> bool {
        let key = InvocationKey::new(command_id, context);
        let outermost = {
            let mut in_flight = self.in_flight.lock();
            if in_flight.contains(&key) {
                false
            } else {
                in_flight.push(key.clone());
                true
            }
        };

        if !outermost {
            debug!(command_id, "Re-entrant dispatch, not observed again");
            return (self.original)(command_id, context);
        }

        let result = {
            let _guard = InFlightGuard {
                in_flight: &self.in_flight,
                key,
            };
            (self.original)(command_id, context)
        };

        if self.active.load(Ordering::Acquire) {
            self.notify_observer(command_id);
        }
        result
    }

    fn notify_observer(&self, command_id: &str) {
        let observer = &self.observer;
        match panic::catch_unwind(AssertUnwindSafe(|| observer.observe(command_id))) {
            Ok(outcome) => {
                outcome.log_err();
            }
            Err(_) => {
                error!(command_id, "Dispatch observer panicked");
            }
        }
    }
}

/// Handle to an installed interception.
#[derive(Clone)]
pub struct InterceptionHandle {
    slot: Weak<DispatchSlot>,
    interception: Arc<Interception>,
}

impl InterceptionHandle {
    /// Whether this interception still occupies its slot.
    pub fn is_active(&self) -> bool {
        self.interception.active.load(Ordering::Acquire)
    }

    /// Restore the original dispatch function.
    ///
    /// Returns `true` if this call removed the wrapper, `false` if it was
    /// already torn down (or the slot is gone).
    pub fn teardown(&self) -> bool {
        let Some(slot) = self.slot.upgrade() else {
            self.interception.active.store(false, Ordering::Release);
            return false;
        };

        let mut current = slot.interception.lock();
        match current.as_ref() {
            Some(installed) if Arc::ptr_eq(installed, &self.interception) => {
                *slot.entry.lock() = Arc::clone(&self.interception.original);
                *current = None;
                self.interception.active.store(false, Ordering::Release);
                info!(event_type = "interceptor", action = "teardown", "Restored original dispatch");
                true
            }
            _ => false,
        }
    }
}

impl std::fmt::Debug for InterceptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptionHandle")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Wrap the slot's dispatch function, at most once.
///
/// When the slot is already intercepted the existing handle is returned and
/// `observer` is dropped.
pub fn install(slot: &Arc<DispatchSlot>, observer: Arc<dyn DispatchObserver>) -> InterceptionHandle {
    let mut current = slot.interception.lock();
    if let Some(existing) = current.as_ref() {
        debug!("Dispatch already intercepted, reusing existing wrapper");
        return InterceptionHandle {
            slot: Arc::downgrade(slot),
            interception: Arc::clone(existing),
        };
    }

    let mut entry = slot.entry.lock();
    let interception = Arc::new(Interception {
        original: Arc::clone(&*entry),
        observer,
        active: AtomicBool::new(true),
        in_flight: Mutex::new(Vec::new()),
    });

    let wrapper_state = Arc::clone(&interception);
    *entry = Arc::new(move |command_id: &str, context: Option<&InvocationContext>| {
        wrapper_state.call(command_id, context)
    });
    *current = Some(Arc::clone(&interception));

    info!(event_type = "interceptor", action = "install", "Wrapped command dispatch");
    InterceptionHandle {
        slot: Arc::downgrade(slot),
        interception,
    }
}

#[cfg(test)]
#[path = "interceptor_tests.rs"]
mod tests;
