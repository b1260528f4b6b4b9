//! Session Lifecycle
//!
//! Drives one run against one device:
//!
//! ```text
//! Idle ─► Discovering ─► ConnectedSubscribing ─► Active ─► Terminated
//!              │                  │                          ▲
//!              └── not found ─────┴── transport error or ─────┘
//!                                     nothing subscribed
//! ```
//!
//! No reconnection is attempted. A caller that wants one starts a new
//! session.

use crate::domain::dispatch::{DispatchEngine, DispatchSummary, Dispatcher};
use crate::domain::error::{ConfigError, SessionError};
use crate::domain::models::{DeviceTarget, SessionState, SignalSource, TerminationReason};
use crate::domain::ports::{ActionSink, Transport};
use crate::domain::registry::Registry;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// What to connect to and which sources to subscribe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub target: DeviceTarget,
    pub sources: Vec<SignalSource>,
}

impl SessionConfig {
    /// Sources are deduplicated; an empty list is rejected
    pub fn new(target: DeviceTarget, sources: &[SignalSource]) -> Result<Self, ConfigError> {
        let mut sources = sources.to_vec();
        sources.sort();
        sources.dedup();
        if sources.is_empty() {
            return Err(ConfigError::EmptySourceList);
        }
        Ok(Self { target, sources })
    }

    /// Subscribe to every known source
    pub fn all_sources(target: DeviceTarget) -> Self {
        Self {
            target,
            sources: SignalSource::ALL.to_vec(),
        }
    }
}

/// Outcome of a session that reached `Active` or was stopped before it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub reason: TerminationReason,
    pub subscribed: Vec<SignalSource>,
    pub dispatch: DispatchSummary,
}

pub struct Session<T: Transport> {
    transport: T,
    sink: Arc<dyn ActionSink>,
    config: SessionConfig,
    state: watch::Sender<SessionState>,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T, sink: Arc<dyn ActionSink>, config: SessionConfig) -> Self {
        Self {
            transport,
            sink,
            config,
            state: watch::channel(SessionState::Idle).0,
        }
    }

    /// Observe state transitions
    pub fn state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Run until the device disconnects or `stop` is cancelled.
    ///
    /// `stop` may be cancelled at any point. Gestures already being
    /// delivered finish; nothing is accepted afterwards.
    pub async fn run(mut self, stop: CancellationToken) -> Result<SessionReport, SessionError> {
        let result = self.drive(&stop).await;
        self.set_state(SessionState::Terminated);

        match &result {
            Ok(report) => info!(
                "Session ended ({:?}): {} delivered, {} empty, {} dropped",
                report.reason,
                report.dispatch.delivered,
                report.dispatch.empty,
                report.dispatch.dropped
            ),
            Err(e) => error!("Session failed: {}", e),
        }
        result
    }

    async fn drive(&mut self, stop: &CancellationToken) -> Result<SessionReport, SessionError> {
        let registry = Registry::for_sources(&self.config.sources).map_err(ConfigError::from)?;

        self.set_state(SessionState::Discovering);
        info!("Starting scan for device with {}...", self.config.target);

        let discovered = tokio::select! {
            _ = stop.cancelled() => return Ok(Self::stopped_early()),
            result = self.transport.discover(&self.config.target) => result,
        };
        let device = match discovered {
            Ok(Some(device)) => device,
            Ok(None) => return Err(SessionError::DeviceNotFound(self.config.target.clone())),
            Err(e) => return Err(SessionError::Transport(e)),
        };

        self.set_state(SessionState::ConnectedSubscribing);
        info!("Connecting to device...");

        let connected = tokio::select! {
            _ = stop.cancelled() => None,
            result = self.transport.connect(device) => Some(result),
        };
        match connected {
            None => {
                self.transport.close().await;
                return Ok(Self::stopped_early());
            }
            Some(Err(e)) => {
                self.transport.close().await;
                return Err(SessionError::Transport(e));
            }
            Some(Ok(())) => info!("Connected"),
        }

        let engine = DispatchEngine::start(Dispatcher::new(registry, self.sink.clone()));

        let mut subscribed = Vec::new();
        for source in self.config.sources.clone() {
            let result = tokio::select! {
                _ = stop.cancelled() => None,
                result = self.transport.subscribe(source, engine.handle()) => Some(result),
            };
            match result {
                None => break,
                Some(Ok(true)) => {
                    info!("Subscribed to {} notifications", source);
                    subscribed.push(source);
                }
                Some(Ok(false)) => warn!("Device does not expose a {} characteristic", source),
                Some(Err(e)) => {
                    self.wind_down(engine).await;
                    return Err(SessionError::Transport(
                        e.context(format!("failed to subscribe to {}", source)),
                    ));
                }
            }
        }

        if stop.is_cancelled() {
            let dispatch = self.wind_down(engine).await;
            return Ok(SessionReport {
                reason: TerminationReason::StopRequested,
                subscribed,
                dispatch,
            });
        }
        if subscribed.is_empty() {
            self.wind_down(engine).await;
            return Err(SessionError::NothingSubscribed);
        }

        self.set_state(SessionState::Active);

        let reason = tokio::select! {
            _ = stop.cancelled() => TerminationReason::StopRequested,
            _ = self.transport.disconnected() => TerminationReason::Disconnected,
        };
        info!("Leaving active state: {:?}", reason);

        let dispatch = self.wind_down(engine).await;

        Ok(SessionReport {
            reason,
            subscribed,
            dispatch,
        })
    }

    /// Stop dispatching, then release the transport
    async fn wind_down(&mut self, engine: DispatchEngine) -> DispatchSummary {
        let dispatch = engine.shutdown().await;
        self.transport.close().await;
        dispatch
    }

    fn stopped_early() -> SessionReport {
        SessionReport {
            reason: TerminationReason::StopRequested,
            subscribed: Vec::new(),
            dispatch: DispatchSummary::default(),
        }
    }

    fn set_state(&self, state: SessionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            info!("Session state: {:?} -> {:?}", previous, state);
        }
    }
}
