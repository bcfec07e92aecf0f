//! Shared access to one controller from independent callers.

use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;

use futures::lock::Mutex;

use crate::controller::{AutoOutcome, AutoSubscribe, SubscriptionController, SubscriptionState};
use crate::platform::PushPlatform;
use crate::sync::ServerSync;

/// Queues operations on a `SubscriptionController`.
///
/// A call made while another is running waits its turn instead of failing.
/// `state` never waits: while an operation runs it reports the last settled
/// state, and `loading` is raised from the moment a manual subscribe or
/// unsubscribe is requested until it finishes.
pub struct ControllerHandle<P, S> {
    controller: Mutex<SubscriptionController<P, S>>,
    settled: Cell<SubscriptionState>,
    manual: Rc<Cell<usize>>,
}

/// Counts a manual operation from request to completion.
struct ManualOp(Rc<Cell<usize>>);

impl ManualOp {
    fn enter(count: &Rc<Cell<usize>>) -> Self {
        count.set(count.get() + 1);
        Self(count.clone())
    }
}

impl Drop for ManualOp {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

impl<P: PushPlatform, S: ServerSync> ControllerHandle<P, S> {
    /// Wrap a controller.
    pub fn new(controller: SubscriptionController<P, S>) -> Self {
        Self {
            settled: Cell::new(controller.state()),
            controller: Mutex::new(controller),
            manual: Rc::new(Cell::new(0)),
        }
    }

    /// Current state without waiting for running operations.
    pub fn state(&self) -> SubscriptionState {
        let mut state = match self.controller.try_lock() {
            Some(controller) => controller.state(),
            None => self.settled.get(),
        };
        if self.manual.get() > 0 {
            state.loading = true;
        }
        state
    }

    /// Queue `SubscriptionController::refresh`.
    pub async fn refresh(self: Rc<Self>) {
        let mut controller = self.controller.lock().await;
        controller.refresh().await;
        self.settled.set(controller.state());
    }

    /// Queue `SubscriptionController::auto_subscribe`.
    pub async fn auto_subscribe(self: Rc<Self>, gate: AutoSubscribe) -> AutoOutcome {
        let mut controller = self.controller.lock().await;
        let outcome = controller.auto_subscribe(gate).await;
        self.settled.set(controller.state());
        outcome
    }

    /// Queue `SubscriptionController::subscribe`. `loading` rises immediately.
    pub fn subscribe(self: Rc<Self>) -> impl Future<Output = bool> {
        let op = ManualOp::enter(&self.manual);
        async move {
            let mut controller = self.controller.lock().await;
            let subscribed = controller.subscribe().await;
            self.settled.set(controller.state());
            drop(controller);
            drop(op);
            subscribed
        }
    }

    /// Queue `SubscriptionController::unsubscribe`. `loading` rises immediately.
    pub fn unsubscribe(self: Rc<Self>) -> impl Future<Output = bool> {
        let op = ManualOp::enter(&self.manual);
        async move {
            let mut controller = self.controller.lock().await;
            let removed = controller.unsubscribe().await;
            self.settled.set(controller.state());
            drop(controller);
            drop(op);
            removed
        }
    }
}
