//! The entry point: a roster of nameservers plus the configuration every
//! request it spawns inherits.

use std::net::SocketAddr;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::config::{ResolverConfig, SystemConfig};
use crate::dns::Name;
use crate::dns::enums::RecordType;
use crate::error::Result;
use crate::handler::Handler;
use crate::nameserver::Nameserver;
use crate::request::{CancelFlag, Request};

/// An opaque reference to a request in flight, returned by
/// [`Context::query`] and accepted by [`Context::cancel`].
///
/// A `Copy` newtype over `u64` rather than an index into a `Vec` or an
/// `Option`: the original collaborator's handle is a raw pointer that can
/// be compared to a null sentinel, and this is the closest safe
/// equivalent that still lets a caller store "no active query" without
/// reaching for `Option<QueryHandle>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct QueryHandle(u64);

impl QueryHandle {
    /// Returned by [`Context::query`] in place of an error: no nameserver
    /// is configured yet, or (via [`Context::query_str`]) the domain
    /// failed syntax validation. Mirrors the original collaborator's
    /// null-handle convention rather than a `Result`.
    pub const NULL: QueryHandle = QueryHandle(u64::MAX);

    pub fn is_null(self) -> bool {
        self == Self::NULL
    }
}

/// Holds the nameserver roster, default configuration, and the registry
/// of in-flight requests' cancellation flags.
///
/// Cheap to clone (an `Arc` around the shared state), so a single
/// `Context` can be held by multiple tasks or wrapped in your own
/// application-level singleton.
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

struct Inner {
    config: Mutex<ResolverConfig>,
    nameservers: Mutex<Arc<Vec<Arc<Nameserver>>>>,
    nameserver_addrs: Mutex<Vec<SocketAddr>>,
    in_flight: Arc<DashMap<QueryHandle, CancelFlag>>,
    next_handle: std::sync::atomic::AtomicU64,
}

impl Context {
    /// A context with no nameservers configured; add at least one with
    /// [`Context::add_nameserver`] before issuing a query.
    pub fn new(config: ResolverConfig) -> Self {
        Context {
            inner: Arc::new(Inner {
                config: Mutex::new(config),
                nameservers: Mutex::new(Arc::new(Vec::new())),
                nameserver_addrs: Mutex::new(Vec::new()),
                in_flight: Arc::new(DashMap::new()),
                next_handle: std::sync::atomic::AtomicU64::new(0),
            }),
        }
    }

    /// Build a context whose nameserver roster comes from a caller-
    /// supplied [`SystemConfig`] (a `/etc/resolv.conf`/`/etc/hosts`
    /// equivalent this crate does not parse itself — see
    /// [`SystemConfig`]'s own docs). Nameservers are added in
    /// `source.nameservers()` order, the fan-out order `ResolverConfig`'s
    /// `spread` delays between. Search-domain suffixing and hosts-file
    /// short-circuiting are left to the caller to apply before calling
    /// [`Context::query_str`]; this constructor only seeds the roster.
    pub async fn with_system_defaults(
        config: ResolverConfig,
        source: &impl SystemConfig,
    ) -> Result<Self> {
        let context = Context::new(config);
        for addr in source.nameservers() {
            context.add_nameserver(SocketAddr::new(addr, 53)).await?;
        }
        Ok(context)
    }

    /// Register a nameserver to query. Binds its UDP socket pool
    /// immediately so failures surface at configuration time rather than
    /// on the first query.
    pub async fn add_nameserver(&self, address: SocketAddr) -> Result<()> {
        let config = self.inner.config.lock().clone();
        let nameserver = Nameserver::new(address, &config).await?;

        let mut nameservers = self.inner.nameservers.lock();
        let mut next = (**nameservers).clone();
        next.push(Arc::new(nameserver));
        *nameservers = Arc::new(next);
        self.inner.nameserver_addrs.lock().push(address);
        debug!(%address, "registered nameserver");
        Ok(())
    }

    /// Drop every registered nameserver. Requests already in flight keep
    /// using the roster they were dispatched with.
    pub fn clear_nameservers(&self) {
        *self.inner.nameservers.lock() = Arc::new(Vec::new());
        self.inner.nameserver_addrs.lock().clear();
    }

    /// Mutate the shared configuration applied to every request spawned
    /// from this point on. Requests already running keep the settings
    /// they were constructed with.
    pub fn set_config(&self, config: ResolverConfig) {
        *self.inner.config.lock() = config;
    }

    pub fn config(&self) -> ResolverConfig {
        self.inner.config.lock().clone()
    }

    /// Dispatch a query for `name`/`qtype` and return a handle that can
    /// later be passed to [`Context::cancel`]. `handler` receives the
    /// eventual outcome; there is no other way to observe it — no polling
    /// API, only callbacks.
    ///
    /// Returns [`QueryHandle::NULL`] if no nameserver is configured yet or
    /// `qtype` is not in the supported set (see [`RecordType::is_queryable`]),
    /// never an `Err`: a query that can't be dispatched is reported the
    /// same way a syntactically invalid domain is, a null handle the
    /// caller can check with [`QueryHandle::is_null`].
    pub fn query(&self, name: Name, qtype: RecordType, handler: Arc<dyn Handler>) -> QueryHandle {
        if !qtype.is_queryable() {
            return QueryHandle::NULL;
        }
        let nameservers = self.inner.nameservers.lock().clone();
        if nameservers.is_empty() {
            return QueryHandle::NULL;
        }
        let config = self.inner.config.lock().clone();

        let id = self
            .inner
            .next_handle
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let handle = QueryHandle(id);

        let in_flight = self.inner.in_flight.clone();
        let cancel = Request::spawn(name, qtype, handler, nameservers, config, id, move || {
            in_flight.remove(&handle);
        });
        self.inner.in_flight.insert(handle, cancel);
        handle
    }

    /// Reverse lookup: query the PTR record for `addr`'s
    /// `in-addr.arpa`/`ip6.arpa` owner name.
    pub fn query_ptr(&self, addr: std::net::IpAddr, handler: Arc<dyn Handler>) -> QueryHandle {
        self.query(Name::from_addr(addr), RecordType::Ptr, handler)
    }

    /// Convenience wrapper parsing `name` from presentation format.
    /// Returns [`QueryHandle::NULL`] if `name` fails [`Name`] syntax
    /// validation rather than reaching the network at all.
    pub fn query_str(
        &self,
        name: &str,
        qtype: RecordType,
        handler: Arc<dyn Handler>,
    ) -> QueryHandle {
        match Name::from_str(name) {
            Ok(name) => self.query(name, qtype, handler),
            Err(_) => QueryHandle::NULL,
        }
    }

    /// Cancel a query in flight. A no-op for an unknown or already
    /// completed handle. Once this returns, the associated handler is
    /// guaranteed never to be invoked, regardless of a reply already
    /// being in transit to the request task.
    pub fn cancel(&self, handle: QueryHandle) {
        if let Some((_, flag)) = self.inner.in_flight.remove(&handle) {
            flag.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    struct Noop;
    impl Handler for Noop {
        fn on_failure(&self, _kind: ErrorKind) {}
    }

    #[test]
    fn query_without_nameservers_returns_a_null_handle() {
        let context = Context::new(ResolverConfig::default());
        let handle = context.query_str("example.com", RecordType::A, Arc::new(Noop));
        assert!(handle.is_null());
    }

    #[test]
    fn query_str_rejects_a_syntactically_invalid_domain() {
        let context = Context::new(ResolverConfig::default());
        let label = "a".repeat(64);
        let handle = context.query_str(&label, RecordType::A, Arc::new(Noop));
        assert!(handle.is_null());
    }

    #[tokio::test]
    async fn query_rejects_an_unsupported_qtype() {
        let context = Context::new(ResolverConfig::default());
        // A configured nameserver, so the null handle below can only be
        // coming from the qtype check, not the empty-roster check.
        context
            .add_nameserver("127.0.0.1:1".parse().unwrap())
            .await
            .unwrap();
        let handle = context.query_str("example.com", RecordType::Unknown(9999), Arc::new(Noop));
        assert!(handle.is_null());
    }

    #[test]
    fn cancel_of_unknown_handle_is_a_no_op() {
        let context = Context::new(ResolverConfig::default());
        context.cancel(QueryHandle::NULL);
    }

    struct FixedSystemConfig(std::net::IpAddr);
    impl SystemConfig for FixedSystemConfig {
        fn nameservers(&self) -> Vec<std::net::IpAddr> {
            vec![self.0]
        }
        fn search_domains(&self) -> Vec<String> {
            Vec::new()
        }
        fn hosts(&self) -> Vec<(String, std::net::IpAddr)> {
            Vec::new()
        }
    }

    #[tokio::test]
    async fn with_system_defaults_seeds_the_roster_from_the_collaborator() {
        let source = FixedSystemConfig("127.0.0.1".parse().unwrap());
        let context = Context::with_system_defaults(ResolverConfig::default(), &source)
            .await
            .unwrap();
        assert_eq!(context.inner.nameserver_addrs.lock().len(), 1);
    }
}
