//! Live queries.
//!
//! A `LiveQuery` pairs a query closure with the tables it reads. Each
//! subscription is a stream that:
//!
//! 1. runs the query on the subscribing thread and emits the first result
//!    before `subscribe` returns,
//! 2. re-runs the query and emits again on every change notification that
//!    touches an observed table (identical results are emitted again),
//! 3. stops for good on unsubscribe or on the first failed execution, which
//!    is delivered through `on_error`.
//!
//! Emissions for one stream are serialized by a re-entrant lock that only
//! the emitting side takes. `unsubscribe` never waits on it: it flips the
//! stream to cancelled, and an emission in flight checks that flag after
//! running the query and again right before calling `on_next`.

use crate::notify::ChangeBus;
use crate::subscription::{CancellationToken, Subscription};
use log::{error, trace};
use parking_lot::{Mutex, ReentrantMutex};
use ripple_core::{Error, Result, TableSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

/// The query a live stream re-executes.
pub type QueryFn<R> = Arc<dyn Fn() -> Result<R> + Send + Sync>;

type NextFn<R> = Box<dyn Fn(R) + Send + Sync>;
type ErrorFn = Box<dyn Fn(Error) + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StreamState {
    Created,
    Active,
    Cancelled,
}

/// A query that re-emits its result whenever an observed table changes.
pub struct LiveQuery<R> {
    bus: ChangeBus,
    observed: TableSet,
    query: QueryFn<R>,
}

impl<R> Clone for LiveQuery<R> {
    fn clone(&self) -> Self {
        Self {
            bus: self.bus.clone(),
            observed: self.observed.clone(),
            query: Arc::clone(&self.query),
        }
    }
}

impl<R: Send + 'static> LiveQuery<R> {
    /// Creates a live query over `observed`, re-running `query` on changes.
    pub fn new<F>(bus: ChangeBus, observed: TableSet, query: F) -> Self
    where
        F: Fn() -> Result<R> + Send + Sync + 'static,
    {
        Self {
            bus,
            observed,
            query: Arc::new(query),
        }
    }

    /// Returns the tables this query observes.
    pub fn observed_tables(&self) -> &TableSet {
        &self.observed
    }

    /// Runs the query once without subscribing.
    pub fn execute(&self) -> Result<R> {
        (self.query)()
    }

    /// Starts a stream.
    ///
    /// `on_next` receives the initial result before this returns, then one
    /// result per relevant change. `on_error` receives at most one error,
    /// after which the stream is cancelled.
    pub fn subscribe<N, E>(&self, on_next: N, on_error: E) -> Subscription
    where
        N: Fn(R) + Send + Sync + 'static,
        E: Fn(Error) + Send + Sync + 'static,
    {
        let stream = Arc::new(Stream {
            query: Arc::clone(&self.query),
            on_next: Box::new(on_next),
            on_error: Box::new(on_error),
            token: CancellationToken::new(),
            emit: ReentrantMutex::new(()),
            state: Mutex::new(StreamState::Created),
            bus_subscription: Mutex::new(None),
        });

        let emit = stream.emit.lock();
        let on_change = Arc::clone(&stream);
        let on_panic = Arc::clone(&stream);
        let bus_subscription = self.bus.subscribe_with_error(
            self.observed.clone(),
            move |_| on_change.on_change(),
            move |err| on_panic.terminate(err),
        );
        let id = bus_subscription.id();
        *stream.bus_subscription.lock() = Some(bus_subscription);
        stream.activate();

        trace!("live query {} started", id);
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            (stream.query)().map(|result| stream.emit_next(result))
        }));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => stream.terminate(err),
            Err(payload) => stream.terminate(Error::callback_panicked(&*payload)),
        }
        drop(emit);

        let token = stream.token.clone();
        Subscription::new(id, token, move || stream.release())
    }

    /// Starts a stream that sends results and the terminal error to a
    /// channel.
    pub fn subscribe_channel(&self) -> (Subscription, Receiver<Result<R>>) {
        let (tx, rx) = mpsc::channel();
        let tx = Arc::new(Mutex::new(tx));
        let err_tx = Arc::clone(&tx);
        let subscription = self.subscribe(
            move |result| {
                let _ = tx.lock().send(Ok(result));
            },
            move |err| {
                let _ = err_tx.lock().send(Err(err));
            },
        );
        (subscription, rx)
    }
}

struct Stream<R> {
    query: QueryFn<R>,
    on_next: NextFn<R>,
    on_error: ErrorFn,
    token: CancellationToken,
    emit: ReentrantMutex<()>,
    state: Mutex<StreamState>,
    bus_subscription: Mutex<Option<Subscription>>,
}

impl<R> Stream<R> {
    fn activate(&self) {
        let mut state = self.state.lock();
        if *state == StreamState::Created {
            *state = StreamState::Active;
        }
    }

    fn is_active(&self) -> bool {
        !self.token.is_cancelled() && *self.state.lock() == StreamState::Active
    }

    fn emit_next(&self, result: R) {
        if self.is_active() {
            (self.on_next)(result);
        }
    }

    fn on_change(&self) {
        let _emit = self.emit.lock();
        if !self.is_active() {
            return;
        }

        let result = (self.query)();
        if !self.is_active() {
            trace!("live query cancelled during re-execution, result discarded");
            return;
        }
        match result {
            Ok(result) => self.emit_next(result),
            Err(err) => {
                error!("live query terminated: {}", err);
                self.terminate(err);
            }
        }
    }

    /// Cancels the stream and delivers `err` unless already cancelled.
    fn terminate(&self, err: Error) {
        if !self.cancel() {
            return;
        }
        (self.on_error)(err);
    }

    /// Does not wait for an emission in flight.
    fn release(&self) {
        self.cancel();
    }

    /// Returns false if the stream was already cancelled.
    fn cancel(&self) -> bool {
        {
            let mut state = self.state.lock();
            if *state == StreamState::Cancelled {
                return false;
            }
            *state = StreamState::Cancelled;
        }
        self.token.cancel();
        let subscription = self.bus_subscription.lock().take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
        }
        true
    }
}
