//! An asynchronous stub DNS resolver: dispatches queries to configured
//! nameservers over UDP, falls back to TCP on truncation, retries on
//! timeout, and delivers typed answers through a [`Handler`] callback.
//!
//! Recursive resolution, `resolv.conf`/`/etc/hosts` parsing, DNSSEC
//! validation, answer caching, and zone transfers are all out of scope;
//! this crate is the transport and correlation layer a recursive
//! resolver or application would sit on top of.
//!
//! ```no_run
//! use std::sync::Arc;
//! use nsquery::{Context, Handler, ResolverConfig};
//! use nsquery::dns::RecordType;
//! use nsquery::handler::RecordSet;
//!
//! struct PrintHandler;
//! impl Handler for PrintHandler {
//!     fn on_failure(&self, kind: nsquery::ErrorKind) {
//!         eprintln!("lookup failed: {kind}");
//!     }
//!     fn on_success(&self, records: RecordSet<'_>) {
//!         if let RecordSet::A(answers) = records {
//!             for answer in answers.filter_map(Result::ok) {
//!                 println!("{}", answer.data.0);
//!             }
//!         }
//!     }
//! }
//!
//! # async fn run() -> nsquery::error::Result<()> {
//! let context = Context::new(ResolverConfig::default());
//! context.add_nameserver("1.1.1.1:53".parse().unwrap()).await?;
//! let handle = context.query_str("example.com", RecordType::A, Arc::new(PrintHandler));
//! assert!(!handle.is_null());
//! # Ok(())
//! # }
//! ```

mod connection;
mod nameserver;
mod request;

pub mod config;
pub mod context;
pub mod dns;
pub mod error;
pub mod handler;

pub use config::{ResolverConfig, SystemConfig};
pub use context::{Context, QueryHandle};
pub use error::{Error, ErrorKind};
pub use handler::Handler;
