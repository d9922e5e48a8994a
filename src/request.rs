//! The per-query state machine: one [`Request`] per outstanding query,
//! running as its own task from dispatch to a terminal outcome.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::config::ResolverConfig;
use crate::connection::{Connection, ConnectionOutcome};
use crate::dns::enums::RecordType;
use crate::dns::response::Response;
use crate::dns::{Name, Query};
use crate::error::ErrorKind;
use crate::handler::Handler;
use crate::nameserver::Nameserver;

/// Cooperative cancellation flag shared between a [`Request`]'s task and
/// the [`crate::context::QueryHandle`] the caller holds. `cancel()` is
/// synchronous from the caller's perspective: once it returns, the
/// handler is guaranteed never to run, even if a
/// reply is already in flight toward the task.
#[derive(Clone)]
pub(crate) struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub(crate) fn new() -> Self {
        CancelFlag(Arc::new(AtomicBool::new(false)))
    }

    pub(crate) fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

enum Phase {
    /// Waiting on UDP replies from every nameserver, retrying on the
    /// interval timer.
    Udp,
    /// A truncated UDP reply escalated this request to exactly one
    /// nameserver over TCP; further UDP replies are ignored and the
    /// retry timer no longer resends.
    Tcp(oneshot::Receiver<ConnectionOutcome>),
}

pub(crate) struct Request {
    query: Query,
    qtype: RecordType,
    handler: Arc<dyn Handler>,
    nameservers: Arc<Vec<Arc<Nameserver>>>,
    config: ResolverConfig,
    /// Identifies this request's subscription to each [`Nameserver`]
    /// independently of the DNS query ID, which two concurrently in-flight
    /// requests can collide on. Reuses the same `u64` as the
    /// [`crate::context::QueryHandle`] the caller holds, since `Context`
    /// already mints one per query and it is unique for the request's
    /// lifetime.
    token: u64,
    cancel: CancelFlag,
    started: Instant,
    on_complete: Option<Box<dyn FnOnce() + Send>>,
}

impl Request {
    /// Spawn the task driving this request to completion and return the
    /// cancellation flag the caller's [`crate::context::QueryHandle`]
    /// closes over. `on_complete` runs once the task reaches a terminal
    /// state by any path (success, failure, or cancellation), so the
    /// owning [`crate::context::Context`] can drop its bookkeeping entry
    /// for this request without waiting on an explicit cancel.
    pub(crate) fn spawn(
        name: Name,
        qtype: RecordType,
        handler: Arc<dyn Handler>,
        nameservers: Arc<Vec<Arc<Nameserver>>>,
        config: ResolverConfig,
        token: u64,
        on_complete: impl FnOnce() + Send + 'static,
    ) -> CancelFlag {
        let edns = config.edns.then(|| {
            crate::dns::edns::EdnsOpt::new(config.effective_buffer_size(), config.dnssec_do_bit)
        });
        let query = Query::new(name, qtype, edns);
        let cancel = CancelFlag::new();
        let request = Request {
            query,
            qtype,
            handler,
            nameservers,
            config,
            token,
            cancel: cancel.clone(),
            started: Instant::now(),
            on_complete: Some(Box::new(on_complete)),
        };
        tokio::spawn(request.run());
        cancel
    }

    async fn run(mut self) {
        if self.nameservers.is_empty() {
            self.finish_failure(ErrorKind::Network);
            if let Some(on_complete) = self.on_complete.take() {
                on_complete();
            }
            return;
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        for ns in self.nameservers.iter() {
            if let Err(err) = ns.subscribe(self.query.id, self.token, tx.clone()).await {
                warn!(nameserver = %ns.address, %err, "failed to open udp socket for query");
            }
        }
        drop(tx);

        self.send_to_all_with_spread().await;

        let expires = self.started + self.config.expire;
        let mut next_retry = Instant::now() + self.config.interval;
        let mut phase = Phase::Udp;

        loop {
            if self.cancel.is_cancelled() {
                trace!(id = self.query.id, "request cancelled, ending task");
                break;
            }

            let deadline = next_retry.min(expires);

            match &mut phase {
                Phase::Udp => {
                    tokio::select! {
                        biased;
                        maybe_response = rx.recv() => {
                            match maybe_response {
                                Some(response) => {
                                    if let Some(next) = self.handle_udp_response(response, expires).await {
                                        phase = next;
                                    } else {
                                        break;
                                    }
                                }
                                None => {
                                    // every nameserver's reader task exited; nothing left
                                    // to wait on but the deadline.
                                    tokio::time::sleep_until(deadline).await;
                                    if self.handle_timer(expires, &mut next_retry).await {
                                        break;
                                    }
                                }
                            }
                        }
                        _ = tokio::time::sleep_until(deadline) => {
                            if self.handle_timer(expires, &mut next_retry).await {
                                break;
                            }
                        }
                    }
                }
                Phase::Tcp(tcp_rx) => {
                    tokio::select! {
                        biased;
                        outcome = tcp_rx => {
                            match outcome {
                                Ok(ConnectionOutcome::Response(response)) => {
                                    self.finish_success(&response);
                                }
                                Ok(ConnectionOutcome::Failed(kind)) => {
                                    self.finish_failure(kind);
                                }
                                Err(_) => self.finish_failure(ErrorKind::Network),
                            }
                            break;
                        }
                        _ = tokio::time::sleep_until(expires) => {
                            self.finish_failure(ErrorKind::Network);
                            break;
                        }
                    }
                }
            }
        }

        for ns in self.nameservers.iter() {
            ns.unsubscribe(self.query.id, self.token);
        }
        if let Some(on_complete) = self.on_complete.take() {
            on_complete();
        }
    }

    async fn send_to_all_with_spread(&self) {
        for (index, ns) in self.nameservers.iter().enumerate() {
            if index > 0 && !self.config.spread.is_zero() {
                tokio::time::sleep(self.config.spread * index as u32).await;
            }
            if let Err(err) = ns.send(self.query.id, self.token, &self.query).await {
                warn!(nameserver = %ns.address, %err, "failed to send udp query");
            }
        }
    }

    /// Returns `Some(next phase)` to keep running, or `None` if the
    /// request reached a terminal state and the task should exit.
    async fn handle_udp_response(&mut self, response: Response, expires: Instant) -> Option<Phase> {
        if !self.query.matches(response.message()) {
            trace!(id = self.query.id, "ignoring non-matching response");
            return Some(Phase::Udp);
        }

        if response.truncated() {
            debug!(id = self.query.id, "response truncated, escalating to tcp");
            let (tx, rx) = oneshot::channel();
            // Fall back to the first configured nameserver only if the
            // response somehow carries no source (never the case for a
            // reply that came through a nameserver's read loop).
            let nameserver = response.source().unwrap_or(self.nameservers[0].address);
            let now = Instant::now();
            let remaining = if expires > now {
                expires - now
            } else {
                std::time::Duration::from_secs(0)
            };
            Connection::open(nameserver, self.query.clone(), remaining, tx);
            return Some(Phase::Tcp(rx));
        }

        self.finish_success(&response);
        None
    }

    /// Returns `true` if the request is now terminal and the caller
    /// should stop looping.
    async fn handle_timer(&mut self, expires: Instant, next_retry: &mut Instant) -> bool {
        let now = Instant::now();
        if now >= expires {
            self.finish_failure(ErrorKind::Network);
            return true;
        }
        self.send_to_all_with_spread().await;
        *next_retry = (now + self.config.interval).min(expires);
        false
    }

    fn finish_success(&self, response: &Response) {
        if self.cancel.is_cancelled() {
            return;
        }
        if let Some(kind) = ErrorKind::from_rcode(response.rcode()) {
            self.handler.on_failure(kind);
        } else {
            self.handler.on_received(self.qtype, response);
        }
    }

    fn finish_failure(&self, kind: ErrorKind) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.handler.on_failure(kind);
    }
}
