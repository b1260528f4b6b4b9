//! Dispatch Engine
//!
//! Routes `(source, bytes)` notifications through the registry to the
//! action sink.
//!
//! ```text
//!  transport callbacks        arrival queue     router      per-source lanes
//! ───────────────────► submit ──► [ ... ] ──► route ──┬──► button   ─► decode ─► sink.consume
//!                                                     ├──► touch    ─► decode ─► sink.consume
//!                                                     └──► rotation ─► decode ─► sink.consume
//! ```
//!
//! A single router takes notifications in arrival order and starts handling
//! each one before it looks at the next, so an instant sink sees gestures
//! in the order they arrived. Each source has at most one notification in
//! flight; later ones for that source wait behind it, while a slow sink
//! call for one source does not hold up the others.

use crate::domain::error::{DecodeError, SubmitError};
use crate::domain::models::{Gesture, SignalSource};
use crate::domain::ports::ActionSink;
use crate::domain::registry::Registry;
use std::collections::{HashMap, VecDeque};
use std::future::{poll_fn, Future};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Notifications that may wait in the arrival queue, and notifications
/// that may wait behind a busy call for one source. Overflow is dropped.
pub const QUEUE_CAPACITY: usize = 256;

type Call = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Decodes one notification and hands the gesture to the sink
pub struct Dispatcher {
    registry: Registry,
    sink: Arc<dyn ActionSink>,
}

impl Dispatcher {
    pub fn new(registry: Registry, sink: Arc<dyn ActionSink>) -> Self {
        Self { registry, sink }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Decode `data` for `source` and, if a gesture results, wait for the
    /// sink to consume it.
    pub async fn handle(
        &self,
        source: SignalSource,
        data: &[u8],
    ) -> Result<Option<Gesture>, DecodeError> {
        let decode = self.registry.lookup(source)?;
        let gesture = decode(data)?;

        if let Some(gesture) = gesture {
            info!("{}: {:?}", source.as_str().to_uppercase(), gesture);
            self.sink.consume(gesture).await;
        }

        Ok(gesture)
    }
}

#[derive(Debug, Default)]
struct DispatchStats {
    delivered: AtomicU64,
    empty: AtomicU64,
    dropped: AtomicU64,
}

/// Counters reported when the engine stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Notifications that produced a gesture
    pub delivered: u64,
    /// Notifications that decoded to no gesture
    pub empty: u64,
    /// Notifications rejected as unknown, malformed or over capacity
    pub dropped: u64,
}

impl DispatchStats {
    fn snapshot(&self) -> DispatchSummary {
        DispatchSummary {
            delivered: self.delivered.load(Ordering::Relaxed),
            empty: self.empty.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

struct HandleInner {
    queue: mpsc::Sender<(SignalSource, Vec<u8>)>,
    sources: Vec<SignalSource>,
    accepting: AtomicBool,
    stats: Arc<DispatchStats>,
}

/// Entry point for transport callbacks. Cheap to clone, never blocks.
#[derive(Clone)]
pub struct DispatchHandle {
    inner: Arc<HandleInner>,
}

impl DispatchHandle {
    /// Queue a notification behind everything that arrived before it
    pub fn submit(&self, source: SignalSource, data: Vec<u8>) -> Result<(), SubmitError> {
        if !self.inner.accepting.load(Ordering::Acquire) {
            debug!("Dispatch stopped, ignoring {} notification", source);
            return Err(SubmitError::Stopped);
        }

        debug!("{} notification: {:02X?}", source, data);

        if !self.inner.sources.contains(&source) {
            let err = DecodeError::UnknownSource(source);
            warn!("Dropping notification: {}", err);
            self.inner.stats.dropped.fetch_add(1, Ordering::Relaxed);
            return Err(err.into());
        }

        match self.inner.queue.try_send((source, data)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                warn!("Dispatch queue full, dropping {} notification", source);
                self.inner.stats.dropped.fetch_add(1, Ordering::Relaxed);
                Err(SubmitError::QueueFull(source))
            }
            Err(TrySendError::Closed(_)) => Err(SubmitError::Stopped),
        }
    }

    pub fn is_accepting(&self) -> bool {
        self.inner.accepting.load(Ordering::Acquire)
    }
}

/// Running router and its sink calls
pub struct DispatchEngine {
    handle: DispatchHandle,
    router: JoinHandle<()>,
    stop: CancellationToken,
}

impl DispatchEngine {
    /// Start routing with the default queue capacity.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(dispatcher: Dispatcher) -> Self {
        Self::with_capacity(dispatcher, QUEUE_CAPACITY)
    }

    pub fn with_capacity(dispatcher: Dispatcher, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let stats = Arc::new(DispatchStats::default());
        let stop = CancellationToken::new();
        let (tx, rx) = mpsc::channel(capacity);

        let handle = DispatchHandle {
            inner: Arc::new(HandleInner {
                queue: tx,
                sources: dispatcher.registry().sources(),
                accepting: AtomicBool::new(true),
                stats: stats.clone(),
            }),
        };

        let router = Router {
            dispatcher: Arc::new(dispatcher),
            stats,
            capacity,
        };
        let router = tokio::spawn(router.run(rx, stop.clone()));

        Self {
            handle,
            router,
            stop,
        }
    }

    pub fn handle(&self) -> DispatchHandle {
        self.handle.clone()
    }

    /// Stop accepting notifications, let in-flight sink calls finish and
    /// wait for the router to exit. Queued notifications are discarded.
    pub async fn shutdown(self) -> DispatchSummary {
        self.handle.inner.accepting.store(false, Ordering::Release);
        self.stop.cancel();

        if let Err(e) = self.router.await {
            warn!("Dispatch router ended abnormally: {}", e);
        }

        let summary = self.handle.inner.stats.snapshot();
        debug!("Dispatch stopped: {:?}", summary);
        summary
    }
}

/// Notifications of one source: at most one in flight, the rest waiting
struct Lane {
    source: SignalSource,
    in_flight: Option<Call>,
    waiting: VecDeque<Vec<u8>>,
}

impl Lane {
    fn new(source: SignalSource) -> Self {
        Self {
            source,
            in_flight: None,
            waiting: VecDeque::new(),
        }
    }

    /// Drive the in-flight notification and start waiting ones as earlier
    /// ones complete. Ready once the lane has nothing left to do.
    fn poll_calls(&mut self, cx: &mut Context<'_>, router: &Router) -> Poll<()> {
        loop {
            if let Some(call) = self.in_flight.as_mut() {
                ready!(call.as_mut().poll(cx));
                self.in_flight = None;
            }
            match self.waiting.pop_front() {
                Some(data) => self.in_flight = Some(router.call(self.source, data)),
                None => return Poll::Ready(()),
            }
        }
    }
}

struct Router {
    dispatcher: Arc<Dispatcher>,
    stats: Arc<DispatchStats>,
    capacity: usize,
}

impl Router {
    async fn run(self, mut queue: mpsc::Receiver<(SignalSource, Vec<u8>)>, stop: CancellationToken) {
        let mut lanes: HashMap<SignalSource, Lane> = self
            .dispatcher
            .registry()
            .sources()
            .into_iter()
            .map(|source| (source, Lane::new(source)))
            .collect();
        let cancelled = stop.cancelled();
        tokio::pin!(cancelled);

        loop {
            // Lanes are polled before the queue, so every notification
            // already routed has started before the next one is taken.
            let next = poll_fn(|cx| {
                for lane in lanes.values_mut() {
                    let _ = lane.poll_calls(cx, &self);
                }
                if cancelled.as_mut().poll(cx).is_ready() {
                    return Poll::Ready(None);
                }
                queue.poll_recv(cx)
            })
            .await;

            let Some((source, data)) = next else { break };
            let lane = lanes.entry(source).or_insert_with(|| Lane::new(source));
            if lane.waiting.len() >= self.capacity {
                warn!("{} notifications backed up, dropping one", source);
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                continue;
            }
            lane.waiting.push_back(data);
        }

        for lane in lanes.values_mut() {
            if !lane.waiting.is_empty() {
                debug!("Discarding {} queued {} notification(s)", lane.waiting.len(), lane.source);
                lane.waiting.clear();
            }
        }
        poll_fn(|cx| {
            let mut idle = true;
            for lane in lanes.values_mut() {
                idle &= lane.poll_calls(cx, &self).is_ready();
            }
            if idle {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
        .await;
        trace!("Dispatch router exited");
    }

    fn call(&self, source: SignalSource, data: Vec<u8>) -> Call {
        let dispatcher = self.dispatcher.clone();
        let stats = self.stats.clone();
        Box::pin(async move {
            match dispatcher.handle(source, &data).await {
                Ok(Some(_)) => {
                    stats.delivered.fetch_add(1, Ordering::Relaxed);
                }
                Ok(None) => {
                    stats.empty.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    warn!("Dropping notification: {}", e);
                    stats.dropped.fetch_add(1, Ordering::Relaxed);
                }
            }
        })
    }
}
