//! Cooperative cancellation for handle transitions.

use slotmap::SlotMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

type Listener = Box<dyn FnOnce()>;

slotmap::new_key_type! {
    /// A listener registered with [`CancellationToken::on_cancel`].
    pub struct ListenerId;
}

#[derive(Default)]
struct TokenState {
    cancelled: bool,
    listeners: SlotMap<ListenerId, Listener>,
}

/// A shared, single-threaded cancellation flag.
///
/// Clones observe the same flag. Cancelling is synchronous: by the time
/// [`CancellationToken::cancel`] returns, every clone reports cancelled and
/// every registered listener has run exactly once.
#[derive(Clone, Default)]
pub struct CancellationToken {
    state: Rc<RefCell<TokenState>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that is cancelled from the start.
    pub fn cancelled() -> Self {
        let token = Self::new();
        token.cancel();
        token
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.borrow().cancelled
    }

    /// Cancels the token. Cancelling twice is a no-op.
    pub fn cancel(&self) {
        let listeners = {
            let mut state = self.state.borrow_mut();
            if state.cancelled {
                return;
            }
            state.cancelled = true;
            std::mem::take(&mut state.listeners)
        };
        // Listeners run after the borrow ends so they may query this token.
        for (_, listener) in listeners {
            listener();
        }
    }

    /// Registers a one-shot listener. Runs immediately if already cancelled,
    /// in which case the returned id is null.
    pub fn on_cancel(&self, listener: impl FnOnce() + 'static) -> ListenerId {
        let mut state = self.state.borrow_mut();
        if state.cancelled {
            drop(state);
            listener();
            ListenerId::default()
        } else {
            state.listeners.insert(Box::new(listener))
        }
    }

    /// Drops a listener that has not run yet. Returns false if it already ran
    /// or was removed.
    pub fn remove_listener(&self, listener: ListenerId) -> bool {
        self.state.borrow_mut().listeners.remove(listener).is_some()
    }

    /// Listeners still waiting for cancellation.
    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    /// True when both values refer to the same underlying flag.
    pub fn same_as(&self, other: &CancellationToken) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .field("listeners", &self.listener_count())
            .finish()
    }
}
