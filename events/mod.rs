/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Single observable-state primitive shared by every model in the crate.
//!
//! A [`SignalHub`] owns a list of listeners; [`SignalHub::subscribe`] hands
//! back a [`Subscription`] that revokes the listener when dropped. Holding
//! subscriptions inside a view (and dropping them on disposal) replaces the
//! manual unbind bookkeeping that tends to leak listeners across view
//! changes.

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::rc::{Rc, Weak};

struct Listener<E> {
    id: u64,
    callback: Box<dyn FnMut(&E)>,
}

struct HubState<E> {
    listeners: Vec<Listener<E>>,
    next_id: u64,
    /// Ids revoked while an emit had the listener list checked out.
    revoked: HashSet<u64>,
    emitting: bool,
    pending: VecDeque<E>,
}

impl<E> HubState<E> {
    fn revoke(&mut self, id: u64) {
        self.listeners.retain(|listener| listener.id != id);
        self.revoked.insert(id);
    }
}

trait RevokeHandle {
    fn revoke(&self, id: u64);
}

impl<E> RevokeHandle for RefCell<HubState<E>> {
    fn revoke(&self, id: u64) {
        if let Ok(mut state) = self.try_borrow_mut() {
            state.revoke(id);
        }
    }
}

/// Handle to one registered listener. Dropping it revokes the listener.
pub struct Subscription {
    id: u64,
    hub: Weak<dyn RevokeHandle>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.revoke(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Ordered synchronous event dispatch with RAII listener handles.
///
/// Listeners run in subscription order and to completion before `emit`
/// returns. An emit triggered from inside a listener is queued and delivered
/// after the current one finishes, so subscribers never observe reentrant
/// delivery.
pub struct SignalHub<E> {
    inner: Rc<RefCell<HubState<E>>>,
}

impl<E: Clone + 'static> SignalHub<E> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(HubState {
                listeners: Vec::new(),
                next_id: 0,
                revoked: HashSet::new(),
                emitting: false,
                pending: VecDeque::new(),
            })),
        }
    }

    pub fn subscribe(&self, callback: impl FnMut(&E) + 'static) -> Subscription {
        let mut state = self.inner.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        state.listeners.push(Listener {
            id,
            callback: Box::new(callback),
        });
        Subscription {
            id,
            hub: Rc::downgrade(&self.inner) as Weak<dyn RevokeHandle>,
        }
    }

    pub fn emit(&self, event: E) {
        {
            let mut state = self.inner.borrow_mut();
            if state.emitting {
                state.pending.push_back(event);
                return;
            }
            state.emitting = true;
            state.pending.push_back(event);
        }

        loop {
            let next = { self.inner.borrow_mut().pending.pop_front() };
            match next {
                Some(event) => self.dispatch(&event),
                None => break,
            }
        }

        self.inner.borrow_mut().emitting = false;
    }

    fn dispatch(&self, event: &E) {
        // Check the list out so listeners may subscribe or drop their own
        // subscriptions while we walk it.
        let mut active = std::mem::take(&mut self.inner.borrow_mut().listeners);
        for listener in active.iter_mut() {
            let revoked = self.inner.borrow().revoked.contains(&listener.id);
            if !revoked {
                (listener.callback)(event);
            }
        }

        let mut state = self.inner.borrow_mut();
        let added = std::mem::take(&mut state.listeners);
        active.extend(added);
        let revoked = std::mem::take(&mut state.revoked);
        active.retain(|listener| !revoked.contains(&listener.id));
        state.listeners = active;
    }

    #[cfg(test)]
    fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }
}

impl<E: Clone + 'static> Default for SignalHub<E> {
    fn default() -> Self {
        Self::new()
    }
}
