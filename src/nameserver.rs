//! A single configured nameserver: a pool of UDP sockets connected to it,
//! grown on demand up to a configured cap, plus the subscriber table that
//! fans a received datagram out to whichever [`crate::request::Request`]
//! tasks are waiting on its query ID.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::Mutex;
use smallvec::SmallVec;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::config::ResolverConfig;
use crate::dns::Query;
use crate::dns::response::Response;
use crate::error::Error;

type Subscriber = mpsc::UnboundedSender<Response>;

/// One request's interest in a query ID, tagged with the `token` its
/// `Context` minted for it. Two different requests can end up sharing a
/// 16-bit query ID (a birthday-bound collision, not a protocol error); the
/// token is what lets `unsubscribe` tell them apart instead of tearing
/// down both subscriptions at once.
struct Subscription {
    token: u64,
    sender: Subscriber,
}

/// A datagram delivered to more than one subscriber fans out to every one
/// of them; most query IDs have exactly one, a collision has more. Inline
/// capacity of 2 covers the common single-retry-in-flight case without an
/// allocation.
type Subscribers = SmallVec<[Subscription; 2]>;

/// One pooled UDP socket and the count of queries currently assigned to
/// it, used to pick the least-loaded socket for a new query and to decide
/// when the pool needs to grow.
struct Socket {
    io: Arc<UdpSocket>,
    load: AtomicUsize,
}

pub struct Nameserver {
    pub address: SocketAddr,
    sockets: Mutex<Vec<Arc<Socket>>>,
    max_sockets: usize,
    max_requests_per_socket: usize,
    subscribers: Arc<DashMap<u16, Subscribers>>,
    /// Which socket a (query ID, token) pair's datagrams go out on, fixed
    /// for the life of the query so retries reuse the same socket its load
    /// was accounted against. Keyed on the pair rather than just the ID so
    /// two requests colliding on the same ID still get independent socket
    /// assignments and independent load accounting.
    assignments: DashMap<(u16, u64), Arc<Socket>>,
}

impl Nameserver {
    pub async fn new(address: SocketAddr, config: &ResolverConfig) -> Result<Self, Error> {
        let subscribers: Arc<DashMap<u16, Subscribers>> = Arc::new(DashMap::new());
        let first = open_socket(address).await?;
        tokio::spawn(read_loop(first.io.clone(), subscribers.clone(), address));

        Ok(Nameserver {
            address,
            sockets: Mutex::new(vec![first]),
            max_sockets: config.sockets_per_nameserver.max(1),
            max_requests_per_socket: config.requests_per_socket.max(1),
            subscribers,
            assignments: DashMap::new(),
        })
    }

    /// Register interest in responses carrying `id` on behalf of the
    /// request identified by `token`, delivering every matching datagram to
    /// `tx` until [`Self::unsubscribe`] is called with the same
    /// `(id, token)` pair. Assigns the pair to a pooled socket on first
    /// subscription — opening a new one, up to the configured cap, if
    /// every existing socket is already at `requests_per_socket` — so
    /// [`Self::send`] has somewhere to route this query's datagrams for
    /// the rest of its retries.
    ///
    /// `tx` is typically shared across every nameserver a single
    /// [`crate::request::Request`] queries, so one receiver drains
    /// replies from all of them. The caller is responsible for validating
    /// each delivered [`Response`] with [`crate::dns::Query::matches`];
    /// this table dispatches purely on ID.
    pub async fn subscribe(&self, id: u16, token: u64, tx: Subscriber) -> std::io::Result<()> {
        self.subscribers
            .entry(id)
            .or_default()
            .push(Subscription { token, sender: tx });
        let socket = self.socket_for_new_query().await?;
        socket.load.fetch_add(1, Ordering::Relaxed);
        self.assignments.insert((id, token), socket);
        Ok(())
    }

    /// Remove the subscription registered under `(id, token)`, leaving any
    /// other request's subscription on the same `id` untouched. Safe to
    /// call more than once or for a pair with no remaining subscription.
    pub fn unsubscribe(&self, id: u16, token: u64) {
        if let Some(mut subs) = self.subscribers.get_mut(&id) {
            subs.retain(|s| s.token != token);
            let empty = subs.is_empty();
            drop(subs);
            if empty {
                self.subscribers.remove(&id);
            }
        }
        if let Some((_, socket)) = self.assignments.remove(&(id, token)) {
            socket.load.fetch_sub(1, Ordering::Relaxed);
        }
    }

    /// Send `query`'s wire bytes over the socket assigned to
    /// `(query.id, token)` at subscription time. Errors are returned for
    /// the caller's retry timer to observe rather than surfaced
    /// synchronously, per §4.2's failure semantics.
    pub async fn send(&self, id: u16, token: u64, query: &Query) -> std::io::Result<()> {
        let socket = self.assignments.get(&(id, token)).map(|entry| entry.clone());
        let socket = match socket {
            Some(socket) => socket,
            None => {
                // Not subscribed yet; fall back to the first pooled
                // socket rather than failing a legitimate send.
                self.sockets.lock()[0].clone()
            }
        };
        socket.io.send(query.wire()).await?;
        trace!(nameserver = %self.address, id = query.id, "sent query over udp");
        Ok(())
    }

    /// Pick the least-loaded existing socket if it has spare capacity;
    /// otherwise open a new one up to `max_sockets`, falling back to the
    /// least-loaded socket if the pool is already at its cap.
    async fn socket_for_new_query(&self) -> std::io::Result<Arc<Socket>> {
        let snapshot: Vec<Arc<Socket>> = self.sockets.lock().clone();
        let least_loaded = snapshot
            .iter()
            .min_by_key(|s| s.load.load(Ordering::Relaxed))
            .cloned()
            .expect("pool always has at least one socket");

        if least_loaded.load.load(Ordering::Relaxed) < self.max_requests_per_socket {
            return Ok(least_loaded);
        }
        if snapshot.len() >= self.max_sockets {
            return Ok(least_loaded);
        }

        let socket = open_socket(self.address).await?;
        tokio::spawn(read_loop(
            socket.io.clone(),
            self.subscribers.clone(),
            self.address,
        ));
        self.sockets.lock().push(socket.clone());
        debug!(
            nameserver = %self.address,
            sockets = snapshot.len() + 1,
            "opened additional udp socket"
        );
        Ok(socket)
    }
}

async fn open_socket(address: SocketAddr) -> Result<Arc<Socket>, Error> {
    let bind_addr: SocketAddr = if address.is_ipv6() {
        "[::]:0".parse().expect("valid literal")
    } else {
        "0.0.0.0:0".parse().expect("valid literal")
    };
    let socket = UdpSocket::bind(bind_addr).await.map_err(Error::Io)?;
    socket.connect(address).await.map_err(Error::Io)?;
    Ok(Arc::new(Socket {
        io: Arc::new(socket),
        load: AtomicUsize::new(0),
    }))
}

async fn read_loop(
    socket: Arc<UdpSocket>,
    subscribers: Arc<DashMap<u16, Subscribers>>,
    nameserver: SocketAddr,
) {
    let mut buf = vec![0u8; 4096];
    loop {
        let len = match socket.recv(&mut buf).await {
            Ok(len) => len,
            Err(err) => {
                warn!(%nameserver, %err, "udp socket read failed, reader exiting");
                return;
            }
        };

        let response = match Response::parse(Bytes::copy_from_slice(&buf[..len])) {
            Ok(response) => response.with_source(nameserver),
            Err(_) => {
                debug!(%nameserver, "dropped malformed udp datagram");
                continue;
            }
        };

        let id = response.id();
        if let Some(mut subs) = subscribers.get_mut(&id) {
            subs.retain(|s| s.sender.send(response.clone()).is_ok());
        } else {
            trace!(%nameserver, id, "no subscriber for response id, dropping");
        }
    }
}
