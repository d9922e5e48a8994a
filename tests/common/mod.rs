//! Shared helpers for the integration suite: building canned wire-format
//! responses and standing up loopback UDP/TCP "nameservers" that reply
//! with them.

#![allow(dead_code)]

use bitstream_io::{BigEndian, BitWriter};
use nsquery::dns::enums::{Opcode, RecordClass, RecordType, ResponseCode};
use nsquery::dns::header::Header;
use nsquery::dns::name::Name;
use nsquery::dns::question::Question;
use std::net::SocketAddr;
use tokio::net::{TcpListener, UdpSocket};

/// Install a `tracing` subscriber that writes to the test harness's
/// captured output, so `RUST_LOG=nsquery=trace cargo test -- --nocapture`
/// surfaces the crate's own `trace!`/`debug!` events during a run. Safe to
/// call from every test; only the first call in the process takes effect.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Build a response message's wire bytes: header + echoed question +
/// answer records the caller has already serialized into `answers`.
pub fn build_response(
    id: u16,
    qname: &str,
    qtype: RecordType,
    rcode: ResponseCode,
    truncated: bool,
    answers: &[u8],
    ancount: u16,
) -> Vec<u8> {
    let header = Header {
        id,
        qr: true,
        opcode: Opcode::Query,
        rd: false,
        ra: false,
        tc: truncated,
        rcode,
        qdcount: 1,
        ancount,
        ..Default::default()
    };
    let question = Question::new(Name::from_str(qname).unwrap(), qtype, RecordClass::In);

    let mut buf = Vec::new();
    {
        let mut writer = BitWriter::endian(&mut buf, BigEndian);
        header.write(&mut writer).unwrap();
    }
    question.write(&mut buf);
    buf.extend_from_slice(answers);
    buf
}

/// Serialize one answer record: NAME (same as the question, uncompressed)
/// TYPE CLASS TTL RDLENGTH RDATA.
pub fn build_answer(name: &str, rtype: RecordType, ttl: u32, rdata: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();
    Name::from_str(name).unwrap().write(&mut buf);
    buf.extend_from_slice(&u16::from(rtype).to_be_bytes());
    buf.extend_from_slice(&u16::from(RecordClass::In).to_be_bytes());
    buf.extend_from_slice(&ttl.to_be_bytes());
    buf.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
    buf.extend_from_slice(rdata);
    buf
}

fn read_id_and_qname(datagram: &[u8]) -> (u16, String) {
    let id = u16::from_be_bytes([datagram[0], datagram[1]]);
    let (name, _) = Name::read(datagram, 12).unwrap();
    (id, name.to_string())
}

/// Bind a UDP socket that replies to every datagram it receives with
/// `response_for(id)`, once, then stops. Returns the bound address.
pub async fn spawn_udp_nameserver(
    response_for: impl Fn(u16) -> Vec<u8> + Send + 'static,
) -> SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();
    tokio::spawn(async move {
        let mut buf = vec![0u8; 512];
        loop {
            let Ok((len, peer)) = socket.recv_from(&mut buf).await else {
                return;
            };
            let (id, _qname) = read_id_and_qname(&buf[..len]);
            let response = response_for(id);
            let _ = socket.send_to(&response, peer).await;
        }
    });
    addr
}

/// Bind a UDP socket that never replies, for timeout/retry tests. The
/// returned counter increments once per datagram received.
pub async fn spawn_silent_udp_nameserver() -> (SocketAddr, std::sync::Arc<std::sync::atomic::AtomicUsize>) {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();
    let count = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let count_clone = count.clone();
    tokio::spawn(async move {
        let mut buf = vec![0u8; 512];
        loop {
            let Ok((_len, _peer)) = socket.recv_from(&mut buf).await else {
                return;
            };
            count_clone.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    });
    (addr, count)
}

/// Bind a TCP listener that accepts one connection, reads one
/// length-prefixed query, and replies with a length-prefixed
/// `response_for(id)`.
pub async fn spawn_tcp_nameserver(response_for: impl Fn(u16) -> Vec<u8> + Send + 'static) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    spawn_tcp_listener(listener, response_for)
}

/// Same as [`spawn_tcp_nameserver`], but bound to a caller-chosen port so
/// it can share a port number with a UDP nameserver (UDP and TCP have
/// independent port namespaces).
pub async fn spawn_tcp_nameserver_on_port(
    port: u16,
    response_for: impl Fn(u16) -> Vec<u8> + Send + 'static,
) -> SocketAddr {
    let listener = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
    spawn_tcp_listener(listener, response_for)
}

fn spawn_tcp_listener(
    listener: TcpListener,
    response_for: impl Fn(u16) -> Vec<u8> + Send + 'static,
) -> SocketAddr {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let Ok((mut stream, _)) = listener.accept().await else {
            return;
        };
        let mut len_buf = [0u8; 2];
        if stream.read_exact(&mut len_buf).await.is_err() {
            return;
        }
        let len = u16::from_be_bytes(len_buf) as usize;
        let mut body = vec![0u8; len];
        if stream.read_exact(&mut body).await.is_err() {
            return;
        }
        let (id, _) = read_id_and_qname(&body);
        let response = response_for(id);
        let _ = stream
            .write_all(&(response.len() as u16).to_be_bytes())
            .await;
        let _ = stream.write_all(&response).await;
    });
    addr
}
