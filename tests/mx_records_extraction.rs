mod common;

use std::sync::{Arc, Mutex};

use nsquery::dns::enums::{RecordType, ResponseCode};
use nsquery::handler::{Handler, RecordSet};
use nsquery::{Context, ErrorKind, ResolverConfig};

struct CollectMx {
    exchanges: Mutex<Vec<(u16, String)>>,
}

impl Handler for CollectMx {
    fn on_failure(&self, kind: ErrorKind) {
        panic!("unexpected failure: {kind}");
    }

    fn on_success(&self, records: RecordSet<'_>) {
        if let RecordSet::Mx(iter) = records {
            for answer in iter.filter_map(Result::ok) {
                self.exchanges
                    .lock()
                    .unwrap()
                    .push((answer.data.preference, answer.data.exchange.to_string()));
            }
        }
    }
}

#[tokio::test]
async fn mx_lookup_yields_only_mx_records_in_order() {
    common::init_tracing();
    let mut mx1_rdata = vec![0, 10];
    nsquery::dns::Name::from_str("mail1.example")
        .unwrap()
        .write(&mut mx1_rdata);
    let mx1 = common::build_answer("mx.example", RecordType::Mx, 300, &mx1_rdata);

    let mut mx2_rdata = vec![0, 20];
    nsquery::dns::Name::from_str("mail2.example")
        .unwrap()
        .write(&mut mx2_rdata);
    let mx2 = common::build_answer("mx.example", RecordType::Mx, 300, &mx2_rdata);

    let a_record = common::build_answer("mx.example", RecordType::A, 300, &[10, 0, 0, 1]);

    let mut answers = Vec::new();
    answers.extend_from_slice(&mx1);
    answers.extend_from_slice(&mx2);
    answers.extend_from_slice(&a_record);

    let nameserver = common::spawn_udp_nameserver(move |id| {
        common::build_response(
            id,
            "mx.example",
            RecordType::Mx,
            ResponseCode::NoError,
            false,
            &answers,
            3,
        )
    })
    .await;

    let context = Context::new(ResolverConfig::default());
    context.add_nameserver(nameserver).await.unwrap();

    let handler = Arc::new(CollectMx {
        exchanges: Mutex::new(Vec::new()),
    });
    context.query_str("mx.example", RecordType::Mx, handler.clone());

    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let exchanges = handler.exchanges.lock().unwrap();
    assert_eq!(
        exchanges.as_slice(),
        &[
            (10, "mail1.example.".to_string()),
            (20, "mail2.example.".to_string()),
        ]
    );
}
