//! Tunable parameters for a [`crate::Context`], mirroring the setters on
//! the original collaborator's `Context`: per-request timing, retry, and
//! EDNS0 buffer-size/DO-bit behavior.

use std::net::IpAddr;
use std::time::Duration;

/// Resolver-wide configuration, constructed once per [`crate::Context`]
/// and shared read-only by every request it spawns.
///
/// A plain struct with a [`Default`] impl, not a builder: every field has
/// a sane standalone default and callers only ever override one or two,
/// the same shape the client library this crate is descended from used
/// for its own settings object.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverConfig {
    /// How long a request waits for a reply before giving up entirely and
    /// calling `on_failure(Network)`. Clamped to a minimum of 0.1s by
    /// [`ResolverConfig::set_expire`].
    pub expire: Duration,

    /// How often an unanswered request resends its query to every
    /// configured nameserver while waiting for `expire`.
    pub interval: Duration,

    /// Delay between the first datagram to nameserver 0 and nameserver 1,
    /// nameserver 1 and nameserver 2, and so on, so a burst of retries
    /// does not hit every nameserver in the same instant.
    pub spread: Duration,

    /// UDP payload size advertised via EDNS0 and applied to newly opened
    /// sockets. `0` defers to [`ResolverConfig::effective_buffer_size`]'s
    /// OS/protocol default rather than a literal zero-byte advertisement.
    pub buffer_size: u16,

    /// Whether outbound queries advertise EDNS0 at all. EDNS0 options
    /// beyond buffer size and the DO bit (NSID, cookies, client-subnet)
    /// are never emitted or interpreted, independent of this setting.
    pub edns: bool,

    /// Sets the DO (DNSSEC OK) bit on outbound queries when `edns` is
    /// enabled. This crate performs no validation of any DNSSEC records
    /// a response may then include; it only sets the bit.
    pub dnssec_do_bit: bool,

    /// Maximum UDP sockets opened per nameserver; a new one is opened on
    /// demand once every existing socket is carrying `requests_per_socket`
    /// outstanding queries, up to this cap.
    pub sockets_per_nameserver: usize,

    /// Maximum in-flight queries a single UDP socket carries before a new
    /// socket is opened (bounded by `sockets_per_nameserver`).
    pub requests_per_socket: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            expire: Duration::from_secs_f64(60.0),
            interval: Duration::from_secs_f64(2.0),
            spread: Duration::from_secs_f64(0.1),
            buffer_size: 0,
            edns: true,
            dnssec_do_bit: false,
            sockets_per_nameserver: 1,
            requests_per_socket: 1,
        }
    }
}

const MIN_TIMING: Duration = Duration::from_millis(100);

impl ResolverConfig {
    /// Set `expire`, clamped to the documented minimum of 0.1s. A request
    /// whose `expire` falls below `interval` simply never gets a retry
    /// burst before it fails — both fields are independent budgets.
    pub fn set_expire(&mut self, expire: Duration) {
        self.expire = expire.max(MIN_TIMING);
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval.max(MIN_TIMING);
    }

    pub fn set_spread(&mut self, spread: Duration) {
        self.spread = spread;
    }

    /// `0` means "OS/protocol default"; any other value is clamped up to
    /// 512, the RFC 1035 minimum guaranteed UDP message size.
    pub fn set_buffer_size(&mut self, size: u16) {
        self.buffer_size = if size == 0 { 0 } else { size.max(512) };
    }

    /// The UDP payload size to actually advertise via EDNS0: `buffer_size`
    /// if the caller set one, else the common-practice default of 1232
    /// bytes (the value most public resolvers and `spec.md` §4.3 itself
    /// suggest).
    pub fn effective_buffer_size(&self) -> u16 {
        if self.buffer_size == 0 {
            1232
        } else {
            self.buffer_size
        }
    }
}

/// The external collaborator `spec.md` §6 calls for to supply a running
/// system's own resolver configuration (`/etc/resolv.conf`) and hosts
/// database (`/etc/hosts`) — this crate ships the trait a caller wires up
/// with their own parser; it has no parser of its own (§1 Non-goals: no
/// `resolv.conf`/`hosts` parsing).
pub trait SystemConfig {
    /// Nameservers to query, in the order they should be tried.
    fn nameservers(&self) -> Vec<IpAddr>;
    /// Domain suffixes appended to a bare (non-FQDN, non-dotted) query
    /// name, tried in order. Empty if the caller's source has none.
    fn search_domains(&self) -> Vec<String>;
    /// Static name-to-address overrides consulted ahead of any network
    /// query (a hosts-file equivalent).
    fn hosts(&self) -> Vec<(String, IpAddr)>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let config = ResolverConfig::default();
        assert_eq!(config.expire, Duration::from_secs_f64(60.0));
        assert_eq!(config.interval, Duration::from_secs_f64(2.0));
        assert_eq!(config.spread, Duration::from_secs_f64(0.1));
    }

    #[test]
    fn set_interval_enforces_minimum() {
        let mut config = ResolverConfig::default();
        config.set_interval(Duration::from_millis(10));
        assert_eq!(config.interval, MIN_TIMING);
    }

    #[test]
    fn set_expire_enforces_minimum() {
        let mut config = ResolverConfig::default();
        config.set_expire(Duration::from_millis(10));
        assert_eq!(config.expire, MIN_TIMING);
    }

    #[test]
    fn set_buffer_size_enforces_minimum() {
        let mut config = ResolverConfig::default();
        config.set_buffer_size(100);
        assert_eq!(config.buffer_size, 512);
    }

    #[test]
    fn zero_buffer_size_means_os_default_and_resolves_to_1232() {
        let config = ResolverConfig::default();
        assert_eq!(config.buffer_size, 0);
        assert_eq!(config.effective_buffer_size(), 1232);
    }
}
