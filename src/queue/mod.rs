//! Request scheduling queue.
//!
//! All API requests made through a [`Client`](crate::Client) pass through a
//! [`RequestQueue`], which caps the number of concurrent in-flight requests
//! and transparently recovers from rate limiting: when a request reports a
//! 429, the queue pauses all admission for the server-specified cooldown,
//! then re-runs the rate-limited request ahead of anything still waiting in
//! line. Callers never see the 429; they just observe higher latency.
//!
//! The queue is instance-scoped. It owns its pending list, running count,
//! and deferral deadline; the owning client only supplies the concurrency
//! limit (re-read on every admission, so changes apply immediately) and
//! listens for [`QueueEvent`] notifications.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::BoxFuture;
use log::{debug, warn};
use tokio::sync::{broadcast, oneshot};
use tokio::time::Instant;

use crate::error::Error;

/// Default number of concurrent requests when none is configured.
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Deferral window applied when a throttle event carries no `Retry-After`
/// value, in seconds.
const DEFAULT_RETRY_AFTER_SECS: u64 = 65;

/// Capacity of the event channel. Deferral episodes are rare and slow, so a
/// small buffer is plenty.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// The outcome of one admission attempt for a queued job.
///
/// A job reports exactly one of these per attempt. `Resolve` and `Reject`
/// settle the future returned by [`RequestQueue::push`]; `Retry` leaves it
/// unsettled, defers the whole queue, and re-runs the same job once the
/// deferral window elapses.
pub enum Attempt<T> {
    /// The job succeeded with a value.
    Resolve(T),
    /// The job failed with an error.
    Reject(Error),
    /// The job was rate limited. Carries the server-specified `Retry-After`
    /// in seconds, or `None` to apply the 65-second default window.
    Retry(Option<u64>),
}

/// A notification emitted by the queue.
///
/// Each deferral episode produces exactly one `RateLimited` followed by
/// exactly one `Resumed`, in that order. Extending the window while it is
/// active does not produce additional events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueEvent {
    /// The queue began deferring requests for the given duration.
    RateLimited(Duration),
    /// The deferral window elapsed and requests are flowing again.
    Resumed,
}

/// What a type-erased job reported for one attempt. The resolve/reject
/// payloads are consumed inside the job wrapper, so the queue itself only
/// distinguishes "settled" from "retry later".
enum Verdict {
    Settled,
    RetryAfter(Option<u64>),
}

type Job = Box<dyn FnMut() -> BoxFuture<'static, Verdict> + Send>;

struct QueueState {
    /// Jobs waiting for admission, in submission order.
    pending: VecDeque<Job>,
    /// Number of jobs currently admitted and not yet settled. Retrying jobs
    /// stay counted; they hold their slot until they resolve or reject.
    running: usize,
    /// End of the active deferral window, if any.
    retry_until: Option<Instant>,
}

struct Inner {
    state: Mutex<QueueState>,
    /// Shared with the owning client so limit changes apply to the very
    /// next admission decision.
    concurrency: Arc<AtomicUsize>,
    events: broadcast::Sender<QueueEvent>,
}

/// A FIFO admission queue for asynchronous jobs with rate-limit deferral.
///
/// Cloning is cheap and clones share the same queue. Jobs are executed on
/// spawned Tokio tasks, so the queue must be used from within a Tokio
/// runtime.
#[derive(Clone)]
pub struct RequestQueue {
    inner: Arc<Inner>,
}

impl RequestQueue {
    /// Creates a queue with its own concurrency limit (0 = unlimited).
    pub fn new(limit: usize) -> Self {
        Self::with_shared_limit(Arc::new(AtomicUsize::new(limit)))
    }

    /// Creates a queue that reads its concurrency limit from a shared
    /// counter. The owner may change the counter at any time; the new value
    /// applies to subsequent admissions.
    pub fn with_shared_limit(limit: Arc<AtomicUsize>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        RequestQueue {
            inner: Arc::new(Inner {
                state: Mutex::new(QueueState {
                    pending: VecDeque::new(),
                    running: 0,
                    retry_until: None,
                }),
                concurrency: limit,
                events,
            }),
        }
    }

    /// Subscribes to [`QueueEvent`] notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.inner.events.subscribe()
    }

    /// The number of outstanding jobs: queued but not started, plus
    /// currently running (including jobs waiting out a deferral window).
    pub fn len(&self) -> usize {
        let state = self.state();
        state.pending.len() + state.running
    }

    /// Returns `true` if no jobs are queued or running.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Submits a job and returns a future that settles with its outcome.
    ///
    /// The job closure is invoked once per admission attempt and reports an
    /// [`Attempt`]. On [`Attempt::Retry`] the same closure is invoked again
    /// after the deferral window, without losing its place to jobs queued
    /// in the meantime. The returned future only settles on `Resolve` or
    /// `Reject`.
    ///
    /// If a free concurrency slot exists and no deferral is active, the job
    /// starts immediately. Otherwise it waits in FIFO order. A panicking
    /// job never settles; its caller observes [`Error::QueueClosed`] and
    /// its slot is released, so jobs should still report ordinary failures
    /// through [`Attempt::Reject`].
    pub fn push<T, F, Fut>(&self, mut job: F) -> impl Future<Output = Result<T, Error>>
    where
        T: Send + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Attempt<T>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel::<Result<T, Error>>();
        let outcome = Arc::new(Mutex::new(Some(tx)));

        let work: Job = Box::new(move || {
            let attempt = job();
            let outcome = Arc::clone(&outcome);

            Box::pin(async move {
                match attempt.await {
                    Attempt::Resolve(value) => {
                        settle(&outcome, Ok(value));
                        Verdict::Settled
                    }
                    Attempt::Reject(error) => {
                        settle(&outcome, Err(error));
                        Verdict::Settled
                    }
                    Attempt::Retry(after) => Verdict::RetryAfter(after),
                }
            })
        });

        self.state().pending.push_back(work);
        self.pump();

        async move { rx.await.unwrap_or(Err(Error::QueueClosed)) }
    }

    /// Records a rate-limit event, deferring all request admission until
    /// the window elapses.
    ///
    /// The window is `retry_after` seconds, or 65 seconds when `None`. If
    /// the queue was not already deferring, this emits
    /// [`QueueEvent::RateLimited`] and arranges for a single
    /// [`QueueEvent::Resumed`] once the deadline (including any extensions
    /// registered in the meantime) has truly passed.
    pub fn register_throttle_event(&self, retry_after: Option<u64>) {
        let duration = Duration::from_secs(retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS));
        let was_deferring = {
            let mut state = self.state();
            let was = deferring(state.retry_until);
            state.retry_until = Some(Instant::now() + duration);
            was
        };

        if !was_deferring {
            warn!("rate limited; deferring requests for {}s", duration.as_secs());
            let _ = self.inner.events.send(QueueEvent::RateLimited(duration));

            let queue = self.clone();
            tokio::spawn(async move {
                queue.defer().await;
                debug!("deferral window elapsed; resuming requests");
                let _ = queue.inner.events.send(QueueEvent::Resumed);
            });
        }
    }

    /// Returns `true` while the current time is before the deferral
    /// deadline.
    pub fn is_deferring(&self) -> bool {
        deferring(self.state().retry_until)
    }

    /// Waits until the queue is no longer deferring. Returns immediately if
    /// no deferral is active. Re-reads the deadline after every sleep, so a
    /// window extended while waiting is honored in full.
    pub async fn defer(&self) {
        loop {
            let deadline = self.state().retry_until;
            match deadline {
                Some(deadline) if deadline > Instant::now() => {
                    tokio::time::sleep_until(deadline).await;
                }
                _ => return,
            }
        }
    }

    /// Admits pending jobs while concurrency slots are available.
    fn pump(&self) {
        loop {
            let job = {
                let mut state = self.state();
                let limit = self.inner.concurrency.load(Ordering::Relaxed);

                if limit != 0 && state.running >= limit {
                    return;
                }

                match state.pending.pop_front() {
                    Some(job) => {
                        state.running += 1;
                        job
                    }
                    None => return,
                }
            };

            let queue = self.clone();
            tokio::spawn(async move {
                queue.run(job).await;
            });
        }
    }

    /// Drives one admitted job to settlement, re-running it across retry
    /// cycles. The job keeps its concurrency slot for its entire lifetime;
    /// the guard releases the slot exactly once, when the job settles or
    /// its future unwinds.
    async fn run(&self, mut job: Job) {
        let _slot = SlotGuard {
            queue: self.clone(),
        };

        loop {
            // Never issue a call during an active cooldown. The deadline is
            // re-read after every sleep, so extensions are honored.
            if self.is_deferring() {
                self.defer().await;
            }

            match (job)().await {
                Verdict::Settled => return,
                Verdict::RetryAfter(after) => {
                    debug!("job requested retry (retry-after: {after:?}s)");
                    self.register_throttle_event(after);
                    // Loop around: wait out the window, then re-run the same
                    // job out-of-band, ahead of the FIFO tail.
                }
            }
        }
    }

    fn state(&self) -> MutexGuard<'_, QueueState> {
        // The mutex is only held for pointer-sized bookkeeping, never across
        // an await. A poisoned lock can only mean a panic inside that
        // bookkeeping, in which case the state is still coherent.
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases one concurrency slot and admits pending work when the owning
/// task ends. Dropping on unwind keeps a panicking job from stranding its
/// slot and stalling the queue.
struct SlotGuard {
    queue: RequestQueue,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.queue.state().running -= 1;
        self.queue.pump();
    }
}

fn deferring(retry_until: Option<Instant>) -> bool {
    retry_until.is_some_and(|deadline| deadline > Instant::now())
}

/// Settles the caller's future at most once. The sender is consumed on the
/// first call; later calls (unreachable through the [`Attempt`] API, but
/// cheap to guard) are no-ops.
fn settle<T>(
    outcome: &Mutex<Option<oneshot::Sender<Result<T, Error>>>>,
    result: Result<T, Error>,
) {
    let tx = outcome
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();

    if let Some(tx) = tx {
        // The caller may have dropped the future; the job still ran.
        let _ = tx.send(result);
    }
}
