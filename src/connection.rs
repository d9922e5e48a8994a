//! TCP fallback for a single query, opened when a UDP reply arrives with
//! the TC bit set.

use std::net::SocketAddr;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::dns::Query;
use crate::dns::response::Response;
use crate::error::ErrorKind;

/// The outcome a [`Connection`] reports back to the owning
/// [`crate::request::Request`] task.
pub enum ConnectionOutcome {
    Response(Response),
    Failed(ErrorKind),
}

/// A one-shot TCP connection carrying a single query/response exchange,
/// length-prefixed per RFC 1035 §4.2.2. Dropped (and its socket closed)
/// as soon as the exchange completes or fails; nothing is pooled or
/// reused, matching the fallback's rare, one-off nature.
pub struct Connection;

impl Connection {
    /// Spawn a task that connects to `nameserver`, sends `query` with a
    /// 2-byte big-endian length prefix, reads a length-prefixed response,
    /// and reports the outcome on `done`. `timeout` bounds the entire
    /// connect+exchange.
    pub fn open(
        nameserver: SocketAddr,
        query: Query,
        timeout: Duration,
        done: oneshot::Sender<ConnectionOutcome>,
    ) {
        tokio::spawn(async move {
            let outcome = match tokio::time::timeout(timeout, exchange(nameserver, &query)).await
            {
                Ok(Ok(response)) => ConnectionOutcome::Response(response),
                Ok(Err(kind)) => ConnectionOutcome::Failed(kind),
                Err(_) => {
                    debug!(%nameserver, id = query.id, "tcp fallback timed out");
                    ConnectionOutcome::Failed(ErrorKind::Network)
                }
            };
            // The request may have already completed via another path
            // (e.g. cancellation); a closed receiver is not an error here.
            let _ = done.send(outcome);
        });
    }
}

async fn exchange(nameserver: SocketAddr, query: &Query) -> Result<Response, ErrorKind> {
    let mut stream = TcpStream::connect(nameserver)
        .await
        .map_err(|err| {
            warn!(%nameserver, %err, "tcp connect failed");
            ErrorKind::Network
        })?;

    let wire = query.wire();
    let len = u16::try_from(wire.len()).map_err(|_| ErrorKind::Malformed)?;
    stream
        .write_all(&len.to_be_bytes())
        .await
        .map_err(|_| ErrorKind::Network)?;
    stream.write_all(wire).await.map_err(|_| ErrorKind::Network)?;

    // A stray or duplicate reply on this connection is ignored rather than
    // delivered, exactly as the UDP leg's subscriber dispatch ignores a
    // non-matching datagram (request.rs's `handle_udp_response`); keep
    // reading frames off the same stream until one matches or the read
    // itself fails (including the overall `expire` timeout this function
    // is wrapped in by the caller).
    loop {
        let mut len_buf = [0u8; 2];
        stream
            .read_exact(&mut len_buf)
            .await
            .map_err(|_| ErrorKind::Network)?;
        let response_len = u16::from_be_bytes(len_buf) as usize;

        let mut body = BytesMut::zeroed(response_len);
        stream
            .read_exact(&mut body)
            .await
            .map_err(|_| ErrorKind::Network)?;

        let response = Response::parse(Bytes::from(body))?;
        if query.matches(response.message()) {
            return Ok(response);
        }
        debug!(
            %nameserver,
            id = query.id,
            "ignoring non-matching tcp response, waiting for another frame"
        );
    }
}
