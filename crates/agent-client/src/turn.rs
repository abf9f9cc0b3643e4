use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::StreamExt as _;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::conversation::Conversation;
use crate::errors::{TransportFault, TurnFailure};
use crate::event::AgentEvent;
use crate::retry::{ConnectionState, RetryPolicy};
use crate::transport::{Transport, TurnRequest};

/// Handle used to request cancellation of a running turn.
///
/// Cancellation is silent: once the turn task observes it, no further
/// events of any kind are delivered; the event channel simply closes.
#[derive(Clone)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
}

impl AbortHandle {
    /// Requests cancellation.
    pub fn abort(&self) {
        let _ = self.tx.send(true);
    }
}

/// Event delivered to the turn consumer.
#[derive(Clone, Debug, PartialEq)]
pub enum TurnEvent {
    /// One decoded agent event, in wire order.
    Agent(AgentEvent),
    /// The stream ended gracefully. Emitted exactly once, last.
    Completed,
    /// The retry budget is exhausted. Emitted exactly once, last.
    Failed(TurnFailure),
}

/// Final disposition of a driven turn.
#[derive(Clone, Debug, PartialEq)]
pub enum TurnOutcome {
    /// The agent finished its answer.
    Completed,
    /// The connection was lost for good; the failure is already folded
    /// into the conversation.
    Failed(TurnFailure),
    /// The caller aborted the turn.
    Cancelled,
}

/// Consumer handle for one running turn.
///
/// Events arrive in the exact order they were framed off the wire. A
/// reconnect appends newly produced events after whatever was already
/// delivered; content the backend produced between the fault and the
/// reconnect is lost, since the protocol has no resumption offset.
pub struct TurnStream {
    rx: mpsc::Receiver<TurnEvent>,
    abort: AbortHandle,
    connectivity: watch::Receiver<ConnectionState>,
}

impl TurnStream {
    /// Waits for the next event; `None` once the turn is over (terminal
    /// event consumed, or aborted).
    pub async fn next_event(&mut self) -> Option<TurnEvent> {
        self.rx.recv().await
    }

    /// Returns a handle that can cancel the turn.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Watches connectivity transitions for this turn. Advisory; lagging
    /// or ignoring it never blocks the event path.
    pub fn connectivity(&self) -> watch::Receiver<ConnectionState> {
        self.connectivity.clone()
    }

    /// Applies every agent event to `conversation` until the turn ends.
    ///
    /// A terminal failure is folded into the log as an error entry while
    /// content streamed before the failure stays in place.
    pub async fn drive(&mut self, conversation: &mut Conversation) -> TurnOutcome {
        while let Some(event) = self.rx.recv().await {
            match event {
                TurnEvent::Agent(event) => conversation.apply(&event),
                TurnEvent::Completed => return TurnOutcome::Completed,
                TurnEvent::Failed(failure) => {
                    conversation.fail_turn(&failure.to_string());
                    return TurnOutcome::Failed(failure);
                }
            }
        }
        TurnOutcome::Cancelled
    }
}

/// Clears a turn-active flag when the turn task ends, however it ends.
pub(crate) struct TurnGuard(Arc<AtomicBool>);

impl TurnGuard {
    /// Claims the flag; `None` if a turn already holds it.
    pub(crate) fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;
        Some(Self(flag.clone()))
    }
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Spawns the supervisor task for one turn and returns its consumer handle.
pub(crate) fn spawn_turn(
    transport: Arc<dyn Transport>,
    request: TurnRequest,
    policy: RetryPolicy,
    buffer_capacity: usize,
    guard: TurnGuard,
) -> TurnStream {
    let (tx, rx) = mpsc::channel(buffer_capacity);
    let (abort_tx, abort_rx) = watch::channel(false);
    let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);
    tokio::spawn(turn_task(
        transport, request, policy, tx, state_tx, abort_rx, guard,
    ));
    TurnStream {
        rx,
        abort: AbortHandle { tx: abort_tx },
        connectivity: state_rx,
    }
}

/// Supervisor for one logical turn.
///
/// Owns the connection lifecycle: open a transport session, forward its
/// events, and on fault re-open after the policy's doubling delay. The
/// attempt counter spans the whole turn: it never resets on a successful
/// reconnect, only a graceful stream end retires it. Abort is checked
/// first at every await point, so a cancelled turn stops without another
/// event reaching the consumer.
async fn turn_task(
    transport: Arc<dyn Transport>,
    request: TurnRequest,
    policy: RetryPolicy,
    tx: mpsc::Sender<TurnEvent>,
    state_tx: watch::Sender<ConnectionState>,
    mut abort_rx: watch::Receiver<bool>,
    _guard: TurnGuard,
) {
    let mut attempt: u32 = 0;
    'reconnect: loop {
        let _ = state_tx.send(ConnectionState::Connecting);
        let opened = tokio::select! {
            biased;
            _ = aborted(&mut abort_rx) => return,
            _ = tx.closed() => return,
            opened = transport.open(&request) => opened,
        };
        let mut handle = match opened {
            Ok(handle) => handle,
            Err(fault) => {
                if backoff_or_fail(&policy, &mut attempt, fault, &tx, &state_tx, &mut abort_rx)
                    .await
                {
                    continue 'reconnect;
                }
                return;
            }
        };
        let _ = state_tx.send(ConnectionState::Connected);

        loop {
            let next = tokio::select! {
                biased;
                _ = aborted(&mut abort_rx) => return,
                _ = tx.closed() => return,
                next = handle.stream.next() => next,
            };
            match next {
                Some(Ok(event)) => {
                    if tx.send(TurnEvent::Agent(event)).await.is_err() {
                        // Consumer dropped the stream; nothing left to do.
                        return;
                    }
                }
                Some(Err(fault)) => {
                    // One open session at a time: release this one before
                    // scheduling the next.
                    drop(handle);
                    if backoff_or_fail(&policy, &mut attempt, fault, &tx, &state_tx, &mut abort_rx)
                        .await
                    {
                        continue 'reconnect;
                    }
                    return;
                }
                None => {
                    let _ = state_tx.send(ConnectionState::Disconnected);
                    let _ = tx.send(TurnEvent::Completed).await;
                    return;
                }
            }
        }
    }
}

/// Handles one fault: sleeps the doubling backoff and returns `true` to
/// reconnect, or emits the terminal failure (or observes an abort) and
/// returns `false`.
async fn backoff_or_fail(
    policy: &RetryPolicy,
    attempt: &mut u32,
    fault: TransportFault,
    tx: &mpsc::Sender<TurnEvent>,
    state_tx: &watch::Sender<ConnectionState>,
    abort_rx: &mut watch::Receiver<bool>,
) -> bool {
    if !policy.should_retry(*attempt) {
        warn!(%fault, attempts = *attempt, "retry budget exhausted");
        let _ = state_tx.send(ConnectionState::Failed);
        let _ = tx
            .send(TurnEvent::Failed(TurnFailure::RetryExhausted {
                attempts: *attempt,
                last: fault,
            }))
            .await;
        return false;
    }

    let delay = policy.delay_for(*attempt);
    debug!(%fault, attempt = *attempt, delay_ms = delay.as_millis() as u64, "stream faulted, reconnecting");
    let _ = state_tx.send(ConnectionState::Reconnecting);
    *attempt += 1;
    tokio::select! {
        biased;
        _ = aborted(abort_rx) => false,
        _ = tx.closed() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

/// Resolves once cancellation is requested; never resolves otherwise.
async fn aborted(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            // Every abort handle is gone; nothing can cancel anymore.
            std::future::pending::<()>().await;
        }
    }
}
