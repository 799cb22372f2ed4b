//! Observable single-owner state container.
//!
//! Holds one state value and fans every transition out to listeners as
//! `(old, new)`, synchronously, in subscription order. The machine is not
//! `Send`: it lives on one execution context (the UI thread) and
//! collaborators on other contexts must hop there before calling
//! [`StateMachine::transition`].
//!
//! Listeners are kept alive by the [`Subscription`] handle returned from
//! [`StateMachine::subscribe`]; the machine itself only holds weak
//! references and prunes dead ones during notification.
//!
//! A transition requested from inside a listener is queued. The current
//! fan-out reaches every listener first, then the queued transition is
//! applied and fanned out in turn.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use log::debug;

/// A value a [`StateMachine`] can hold.
pub trait MachineState: Clone {
    /// Variant name for logging.
    fn name(&self) -> &'static str;
}

type Listener<S> = dyn Fn(&S, &S);

/// Keeps a listener registered. Dropping it unsubscribes.
#[must_use = "dropping the subscription unsubscribes the listener"]
pub struct Subscription<S> {
    _listener: Rc<Listener<S>>,
}

struct Inner<S> {
    state: RefCell<S>,
    listeners: RefCell<Vec<Weak<Listener<S>>>>,
    pending: RefCell<VecDeque<S>>,
    notifying: Cell<bool>,
}

/// Shared handle to a state container. Clones refer to the same machine.
pub struct StateMachine<S> {
    inner: Rc<Inner<S>>,
}

impl<S> Clone for StateMachine<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: MachineState + 'static> StateMachine<S> {
    pub fn new(initial: S) -> Self {
        Self {
            inner: Rc::new(Inner {
                state: RefCell::new(initial),
                listeners: RefCell::new(Vec::new()),
                pending: RefCell::new(VecDeque::new()),
                notifying: Cell::new(false),
            }),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> S {
        self.inner.state.borrow().clone()
    }

    /// Read the current state without cloning it.
    pub fn with_state<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.inner.state.borrow())
    }

    /// Register a listener called with `(old, new)` on every transition.
    pub fn subscribe(&self, listener: impl Fn(&S, &S) + 'static) -> Subscription<S> {
        let listener: Rc<Listener<S>> = Rc::new(listener);
        self.inner
            .listeners
            .borrow_mut()
            .push(Rc::downgrade(&listener));
        Subscription {
            _listener: listener,
        }
    }

    /// Explicitly release a subscription.
    pub fn unsubscribe(&self, subscription: Subscription<S>) {
        drop(subscription);
        self.live_listeners();
    }

    /// Replace the state and notify listeners.
    ///
    /// Callers are responsible for only constructing states their
    /// component legitimately owns; no transition table is enforced here.
    pub fn transition(&self, new_state: S) {
        self.inner.pending.borrow_mut().push_back(new_state);
        if self.inner.notifying.get() {
            return;
        }

        self.inner.notifying.set(true);
        let inner = &self.inner;
        let _reset = scopeguard::guard((), |_| inner.notifying.set(false));

        loop {
            let Some(next) = self.inner.pending.borrow_mut().pop_front() else {
                break;
            };
            let old = self.inner.state.replace(next.clone());
            debug!("state transition: {} -> {}", old.name(), next.name());

            for listener in self.live_listeners() {
                listener(&old, &next);
            }
        }
    }

    /// Prune dead listeners and return the live ones in subscription order.
    fn live_listeners(&self) -> Vec<Rc<Listener<S>>> {
        let mut listeners = self.inner.listeners.borrow_mut();
        listeners.retain(|listener| listener.strong_count() > 0);
        listeners.iter().filter_map(Weak::upgrade).collect()
    }
}
