//! Frame-aligned callback bookkeeping for a layer.
//!
//! Animations never block: they ask for the next frame and return. The layer
//! drains due requests once per tick and dispatches them to their handles.

use slotmap::SlotMap;
use smallvec::SmallVec;
use std::cell::RefCell;
use std::rc::Rc;

use crate::cancel::{CancellationToken, ListenerId};
use crate::handle::HandleId;

slotmap::new_key_type! {
    /// A pending request for the next frame.
    pub struct FrameRequestId;
}

#[derive(Clone, Debug)]
struct PendingFrame {
    /// Frame number the request fires on
    frame: u64,
    target: HandleId,
    token: CancellationToken,
    /// Revokes this request on cancel; dropped once the request leaves the table
    listener: ListenerId,
}

impl PendingFrame {
    fn release(self) -> HandleId {
        self.token.remove_listener(self.listener);
        self.target
    }
}

#[derive(Debug, Default)]
struct SchedulerState {
    pending: SlotMap<FrameRequestId, PendingFrame>,
    frame: u64,
}

/// Owned table of pending frame requests.
///
/// Entries leave the table when they fire or when their token is cancelled,
/// whichever comes first, and take their cancel listener with them. Stale
/// keys are harmless: slot-map keys are versioned, so revoking a fired
/// request does nothing.
#[derive(Clone, Debug, Default)]
pub struct FrameScheduler {
    state: Rc<RefCell<SchedulerState>>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests one invocation of `target` on the next frame.
    ///
    /// A request made with an already-cancelled token is revoked before this
    /// returns. Otherwise the request is revoked as soon as the token fires.
    pub fn request_frame(&self, token: &CancellationToken, target: HandleId) -> FrameRequestId {
        let request = {
            let mut state = self.state.borrow_mut();
            let frame = state.frame + 1;
            state.pending.insert(PendingFrame {
                frame,
                target,
                token: token.clone(),
                listener: ListenerId::default(),
            })
        };

        if token.is_cancelled() {
            self.revoke(request);
            tracing::trace!(?target, "frame request dropped, token already cancelled");
            return request;
        }

        let state = Rc::downgrade(&self.state);
        let listener = token.on_cancel(move || {
            if let Some(state) = state.upgrade() {
                state.borrow_mut().pending.remove(request);
            }
        });
        if let Some(pending) = self.state.borrow_mut().pending.get_mut(request) {
            pending.listener = listener;
        }
        tracing::trace!(?target, ?request, "frame requested");
        request
    }

    /// Drops a pending request. Returns false if it already fired or was revoked.
    pub fn revoke(&self, request: FrameRequestId) -> bool {
        let removed = self.state.borrow_mut().pending.remove(request);
        removed.map(PendingFrame::release).is_some()
    }

    pub fn is_pending(&self, request: FrameRequestId) -> bool {
        self.state.borrow().pending.contains_key(request)
    }

    pub fn pending_len(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Number of frames dispatched so far.
    pub fn current_frame(&self) -> u64 {
        self.state.borrow().frame
    }

    /// Advances to the next frame and drains every request due on it.
    ///
    /// Requests made while the returned targets run land on the frame after.
    pub fn take_due(&self) -> SmallVec<[HandleId; 4]> {
        let mut state = self.state.borrow_mut();
        state.frame += 1;
        let frame = state.frame;

        let mut due: SmallVec<[(u64, FrameRequestId); 4]> = state
            .pending
            .iter()
            .filter(|(_, pending)| pending.frame <= frame)
            .map(|(request, pending)| (pending.frame, request))
            .collect();
        due.sort_by_key(|(frame, _)| *frame);

        due.into_iter()
            .filter_map(|(_, request)| state.pending.remove(request))
            .map(PendingFrame::release)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn handle_ids(count: usize) -> Vec<HandleId> {
        let mut keys: SlotMap<HandleId, ()> = SlotMap::with_key();
        (0..count).map(|_| keys.insert(())).collect()
    }

    #[test]
    fn test_request_fires_on_next_frame_only_once() {
        let scheduler = FrameScheduler::new();
        let token = CancellationToken::new();
        let ids = handle_ids(1);

        let request = scheduler.request_frame(&token, ids[0]);
        assert!(scheduler.is_pending(request));

        let due = scheduler.take_due();
        assert_eq!(due.as_slice(), &[ids[0]]);
        assert!(!scheduler.is_pending(request));
        assert!(scheduler.take_due().is_empty());
        assert_eq!(scheduler.current_frame(), 2);
    }

    #[test]
    fn test_cancelled_token_revokes_immediately() {
        let scheduler = FrameScheduler::new();
        let ids = handle_ids(1);

        let request = scheduler.request_frame(&CancellationToken::cancelled(), ids[0]);
        assert!(!scheduler.is_pending(request));
        assert_eq!(scheduler.pending_len(), 0);
        assert!(scheduler.take_due().is_empty());
    }

    #[test]
    fn test_cancel_later_removes_table_entry() {
        let scheduler = FrameScheduler::new();
        let token = CancellationToken::new();
        let ids = handle_ids(2);

        scheduler.request_frame(&token, ids[0]);
        let other = scheduler.request_frame(&CancellationToken::new(), ids[1]);
        assert_eq!(scheduler.pending_len(), 2);

        token.cancel();
        assert_eq!(scheduler.pending_len(), 1);
        assert!(scheduler.is_pending(other));
        assert_eq!(scheduler.take_due().as_slice(), &[ids[1]]);
    }

    #[test]
    fn test_cancel_after_fire_is_harmless() {
        let scheduler = FrameScheduler::new();
        let token = CancellationToken::new();
        let ids = handle_ids(1);

        let request = scheduler.request_frame(&token, ids[0]);
        scheduler.take_due();
        assert!(!scheduler.revoke(request));

        let next = scheduler.request_frame(&CancellationToken::new(), ids[0]);
        token.cancel();
        assert!(scheduler.is_pending(next));
    }

    #[test]
    fn test_fired_requests_release_their_listener() {
        let scheduler = FrameScheduler::new();
        let token = CancellationToken::new();
        let ids = handle_ids(1);

        for _ in 0..100 {
            scheduler.request_frame(&token, ids[0]);
            assert_eq!(token.listener_count(), 1);
            scheduler.take_due();
        }
        assert_eq!(token.listener_count(), 0);

        let request = scheduler.request_frame(&token, ids[0]);
        assert!(scheduler.revoke(request));
        assert_eq!(token.listener_count(), 0);
    }

    #[test]
    fn test_requests_during_dispatch_wait_a_frame() {
        let scheduler = FrameScheduler::new();
        let token = CancellationToken::new();
        let ids = handle_ids(1);

        scheduler.request_frame(&token, ids[0]);
        for target in scheduler.take_due() {
            scheduler.request_frame(&token, target);
        }
        assert_eq!(scheduler.pending_len(), 1);
        assert_eq!(scheduler.take_due().len(), 1);
    }
}
