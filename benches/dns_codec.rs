use criterion::{Criterion, black_box, criterion_group, criterion_main};

use bytes::Bytes;
use nsquery::dns::edns::EdnsOpt;
use nsquery::dns::enums::RecordType;
use nsquery::dns::packet::Message;
use nsquery::dns::{Name, Query};

fn build_query() -> Query {
    let name = Name::from_str("www.example.com").unwrap();
    Query::new(name, RecordType::A, Some(EdnsOpt::new(1232, false)))
}

fn bench_query_encode(c: &mut Criterion) {
    c.bench_function("encode outbound query", |b| {
        b.iter(|| {
            let query = build_query();
            black_box(query.wire().clone());
        });
    });
}

fn bench_message_parse(c: &mut Criterion) {
    let query = build_query();
    let wire: Bytes = query.wire().clone();

    c.bench_function("parse message from wire bytes", |b| {
        b.iter(|| {
            let message = Message::parse(black_box(wire.clone())).unwrap();
            black_box(message);
        });
    });
}

fn bench_name_compression_pointer_resolution(c: &mut Criterion) {
    let mut buf = Vec::new();
    Name::from_str("a.b.c.example.com").unwrap().write(&mut buf);
    let pointer_offset = buf.len();
    buf.push(0xC0);
    buf.push(0x00);
    let buf = Bytes::from(buf);

    c.bench_function("resolve single compression pointer", |b| {
        b.iter(|| {
            let (name, _) = Name::read(black_box(&buf), black_box(pointer_offset)).unwrap();
            black_box(name);
        });
    });
}

criterion_group!(
    benches,
    bench_query_encode,
    bench_message_parse,
    bench_name_compression_pointer_resolution
);
criterion_main!(benches);
