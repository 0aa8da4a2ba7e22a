//! The hierarchical progress/cancellation node.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use dnf_common::Error;
use dnf_lock::{LockManager, LockMode, LockType};

use crate::action::{Action, ProgressObserver};

struct Shared {
    lock_manager: Arc<LockManager>,
    observer: Option<Arc<dyn ProgressObserver>>,
    cancel_requested: AtomicBool,
    allow_cancel: AtomicBool,
}

struct Inner {
    weights: Vec<u8>,
    current: usize,
    child: Option<Arc<State>>,
}

/// A node in the progress/cancellation tree.
///
/// A long-running operation divides itself into a tree of `State` nodes:
/// the root is split into weighted steps via [`State::set_number_steps`] or
/// [`State::set_steps`], and each step may recurse into its own child via
/// [`State::get_child`]. Cancellation and lock bookkeeping are shared
/// across the whole tree; step weights are local to each node.
#[derive(Debug)]
pub struct State {
    shared: Arc<Shared>,
    weight_in_parent: u32,
    cancellable: AtomicBool,
    locks: Mutex<Vec<u32>>,
    current_action: Mutex<Option<Action>>,
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for Shared {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shared")
            .field("cancel_requested", &self.cancel_requested.load(Ordering::Relaxed))
            .field("allow_cancel", &self.allow_cancel.load(Ordering::Relaxed))
            .finish()
    }
}

impl std::fmt::Debug for Inner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inner")
            .field("weights", &self.weights)
            .field("current", &self.current)
            .field("has_child", &self.child.is_some())
            .finish()
    }
}

impl State {
    /// Creates the root node of a new progress tree.
    pub fn new_root(lock_manager: Arc<LockManager>, observer: Option<Arc<dyn ProgressObserver>>) -> Arc<Self> {
        Arc::new(State {
            shared: Arc::new(Shared {
                lock_manager,
                observer,
                cancel_requested: AtomicBool::new(false),
                allow_cancel: AtomicBool::new(true),
            }),
            weight_in_parent: 100,
            cancellable: AtomicBool::new(true),
            locks: Mutex::new(Vec::new()),
            current_action: Mutex::new(None),
            inner: Mutex::new(Inner {
                weights: Vec::new(),
                current: 0,
                child: None,
            }),
        })
    }

    /// Divides this node into `n` equal-weight steps, summing to 100.
    ///
    /// Any remainder from integer division is folded into the last step so
    /// the weights always sum to exactly 100.
    pub fn set_number_steps(&self, n: u32) {
        if n == 0 {
            return;
        }
        let base = (100 / n) as u8;
        let mut weights = vec![base; n as usize];
        let assigned: u32 = weights.iter().map(|&w| w as u32).sum();
        if let Some(last) = weights.last_mut() {
            *last += (100 - assigned) as u8;
        }
        let mut inner = self.inner.lock().expect("state mutex poisoned");
        inner.weights = weights;
        inner.current = 0;
        inner.child = None;
    }

    /// Divides this node into explicit weighted steps.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if `weights` does not sum to 100.
    pub fn set_steps(&self, weights: &[u8]) -> Result<(), Error> {
        let sum: u32 = weights.iter().map(|&w| w as u32).sum();
        if sum != 100 {
            return Err(Error::Internal {
                context: format!("state step weights must sum to 100, got {sum}"),
            });
        }
        let mut inner = self.inner.lock().expect("state mutex poisoned");
        inner.weights = weights.to_vec();
        inner.current = 0;
        inner.child = None;
        Ok(())
    }

    /// Returns a child node covering the current step's weight.
    ///
    /// Calling this again before [`State::done`] advances returns the same child.
    pub fn get_child(self: &Arc<Self>) -> Arc<State> {
        let mut inner = self.inner.lock().expect("state mutex poisoned");
        if let Some(child) = &inner.child {
            return Arc::clone(child);
        }
        let weight = inner
            .weights
            .get(inner.current)
            .copied()
            .map(u32::from)
            .unwrap_or(100);
        let child = Arc::new(State {
            shared: Arc::clone(&self.shared),
            weight_in_parent: weight,
            cancellable: AtomicBool::new(true),
            locks: Mutex::new(Vec::new()),
            current_action: Mutex::new(None),
            inner: Mutex::new(Inner {
                weights: Vec::new(),
                current: 0,
                child: None,
            }),
        });
        inner.child = Some(Arc::clone(&child));
        child
    }

    /// Advances to the next step.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if cancellation has been requested, is
    /// currently allowed tree-wide, and this node accepts cancellation.
    pub fn done(&self) -> Result<(), Error> {
        if self.is_cancellation_due() {
            return Err(Error::Cancelled);
        }
        let mut inner = self.inner.lock().expect("state mutex poisoned");
        if inner.current < inner.weights.len().max(1) {
            inner.current += 1;
        }
        inner.child = None;
        drop(inner);
        self.report_progress();
        Ok(())
    }

    /// Collapses any remaining steps immediately, as on an early-success return path.
    pub fn finished(&self) {
        let mut inner = self.inner.lock().expect("state mutex poisoned");
        inner.current = inner.weights.len().max(1);
        inner.child = None;
        drop(inner);
        self.report_progress();
    }

    /// Sets whether this specific node honors cancellation requests at its `done()` boundary.
    pub fn set_cancellable(&self, cancellable: bool) {
        self.cancellable.store(cancellable, Ordering::Relaxed);
    }

    /// Tree-wide toggle for whether cancellation is currently respected at all.
    ///
    /// The transaction commit phase calls `allow_cancel(false)` for its
    /// duration since cancelling mid-RPM-transaction is unsafe.
    pub fn allow_cancel(&self, allow: bool) {
        self.shared.allow_cancel.store(allow, Ordering::Relaxed);
    }

    /// Requests cancellation of the whole tree this node belongs to.
    ///
    /// Callable from outside the operation (e.g. a signal handler) via any
    /// `Arc<State>` clone in the tree.
    pub fn request_cancellation(&self) {
        self.shared.cancel_requested.store(true, Ordering::Relaxed);
    }

    /// Returns `true` if cancellation has been requested anywhere in this tree.
    pub fn is_cancellation_requested(&self) -> bool {
        self.shared.cancel_requested.load(Ordering::Relaxed)
    }

    fn is_cancellation_due(&self) -> bool {
        self.cancellable.load(Ordering::Relaxed)
            && self.shared.allow_cancel.load(Ordering::Relaxed)
            && self.shared.cancel_requested.load(Ordering::Relaxed)
    }

    /// Emits a semantic action-start transition to the tree's observer, if any.
    pub fn action_start(&self, action: Action, hint: &str) {
        *self.current_action.lock().expect("state mutex poisoned") = Some(action);
        if let Some(observer) = &self.shared.observer {
            observer.on_action_start(action, hint);
        }
    }

    /// Emits a semantic action-stop transition to the tree's observer, if any.
    pub fn action_stop(&self) {
        let action = self.current_action.lock().expect("state mutex poisoned").take();
        if let (Some(action), Some(observer)) = (action, &self.shared.observer) {
            observer.on_action_stop(action);
        }
    }

    /// Takes a lock through the tree's shared [`LockManager`], tracking it for release.
    pub fn take_lock(&self, lock_type: LockType, mode: LockMode) -> Result<(), Error> {
        let id = self.shared.lock_manager.take(lock_type, mode)?;
        self.locks.lock().expect("state mutex poisoned").push(id);
        Ok(())
    }

    /// Releases every lock this node has taken.
    pub fn release_locks(&self) {
        let mut locks = self.locks.lock().expect("state mutex poisoned");
        for id in locks.drain(..) {
            self.shared.lock_manager.release_noerror(id);
        }
    }

    /// This node's completion percentage, `0..=100`, within its own scope.
    pub fn local_percent(&self) -> u8 {
        let inner = self.inner.lock().expect("state mutex poisoned");
        if inner.weights.is_empty() {
            return if inner.current > 0 { 100 } else { 0 };
        }
        inner.weights[..inner.current.min(inner.weights.len())]
            .iter()
            .map(|&w| w as u32)
            .sum::<u32>()
            .min(100) as u8
    }

    fn report_progress(&self) {
        if let Some(observer) = &self.shared.observer {
            observer.on_progress(self.local_percent());
        }
    }
}

impl Drop for State {
    fn drop(&mut self) {
        self.release_locks();
    }
}

/// The weight this node was allotted within its parent (informational; the
/// root is always 100).
impl State {
    /// Returns the weight this node occupies within its parent, out of 100.
    pub fn weight_in_parent(&self) -> u32 {
        self.weight_in_parent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testresult::TestResult;

    fn manager() -> Arc<LockManager> {
        Arc::new(LockManager::new(std::env::temp_dir()))
    }

    #[test]
    fn equal_steps_sum_to_100() -> TestResult {
        let root = State::new_root(manager(), None);
        root.set_number_steps(3);
        let inner = root.inner.lock().unwrap();
        assert_eq!(inner.weights.iter().map(|&w| w as u32).sum::<u32>(), 100);
        Ok(())
    }

    #[test]
    fn explicit_steps_must_sum_to_100() {
        let root = State::new_root(manager(), None);
        assert!(root.set_steps(&[50, 40]).is_err());
        assert!(root.set_steps(&[50, 50]).is_ok());
    }

    #[test]
    fn get_child_is_stable_until_done() -> TestResult {
        let root = State::new_root(manager(), None);
        root.set_number_steps(2);
        let child1 = root.get_child();
        let child2 = root.get_child();
        assert!(Arc::ptr_eq(&child1, &child2));
        root.done()?;
        let child3 = root.get_child();
        assert!(!Arc::ptr_eq(&child1, &child3));
        Ok(())
    }

    #[test]
    fn done_fails_when_cancellation_is_requested_and_allowed() -> TestResult {
        let root = State::new_root(manager(), None);
        root.set_number_steps(2);
        root.request_cancellation();
        assert!(root.done().is_err());
        Ok(())
    }

    #[test]
    fn allow_cancel_false_suppresses_cancellation() -> TestResult {
        let root = State::new_root(manager(), None);
        root.set_number_steps(2);
        root.request_cancellation();
        root.allow_cancel(false);
        assert!(root.done().is_ok());
        Ok(())
    }

    #[test]
    fn finished_collapses_remaining_steps() -> TestResult {
        let root = State::new_root(manager(), None);
        root.set_number_steps(4);
        root.finished();
        assert_eq!(root.local_percent(), 100);
        Ok(())
    }
}
