//! MX resolution against a local DNS server, and the provider shortcut on top of it.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig};
use hickory_resolver::proto::op::{Message, MessageType, OpCode, ResponseCode};
use hickory_resolver::proto::rr::rdata::MX;
use hickory_resolver::proto::rr::{Name, RData, Record};
use hickory_resolver::proto::serialize::binary::{BinDecodable, BinEncodable};
use mailwizard_core::discovery::{DnsResolver, MxRecord, MxResolver, ProviderMxProbe};
use mailwizard_core::{DiscoveredSettings, DiscoveryCoordinator, DiscoveryOutcome, DiscoveryProbe};
use tokio::net::UdpSocket;

/// How the local server answers every query.
#[derive(Clone, Copy)]
enum Answer {
    Mx(&'static [(u16, &'static str)]),
    Code(ResponseCode),
    Silent,
}

/// Serve `answer` over UDP on an ephemeral localhost port.
async fn serve(answer: Answer) -> SocketAddr {
    let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let addr = socket.local_addr().unwrap();

    tokio::spawn(async move {
        let mut buf = [0u8; 512];
        loop {
            let Ok((len, peer)) = socket.recv_from(&mut buf).await else {
                return;
            };
            let Some(reply) = reply_to(&buf[..len], answer) else {
                continue;
            };
            let _ = socket.send_to(&reply, peer).await;
        }
    });

    addr
}

fn reply_to(request: &[u8], answer: Answer) -> Option<Vec<u8>> {
    let request = Message::from_bytes(request).ok()?;

    let mut response = Message::new();
    response
        .set_id(request.id())
        .set_message_type(MessageType::Response)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(request.recursion_desired())
        .set_recursion_available(true);
    response.add_queries(request.queries().to_vec());

    match answer {
        Answer::Silent => return None,
        Answer::Code(code) => {
            response.set_response_code(code);
        }
        Answer::Mx(exchangers) => {
            response.set_response_code(ResponseCode::NoError);
            let name = request.queries().first()?.name().clone();
            for (preference, exchange) in exchangers {
                let exchange = Name::from_ascii(exchange).ok()?;
                response.add_answer(Record::from_rdata(
                    name.clone(),
                    300,
                    RData::MX(MX::new(*preference, exchange)),
                ));
            }
        }
    }

    response.to_bytes().ok()
}

fn resolver(addr: SocketAddr) -> DnsResolver {
    let servers = NameServerConfigGroup::from_ips_clear(
        &[IpAddr::from(Ipv4Addr::LOCALHOST)],
        addr.port(),
        true,
    );
    DnsResolver::with_config(
        ResolverConfig::from_parts(None, vec![], servers),
        Duration::from_millis(300),
    )
}

/// Generic probe that counts how often it runs.
#[derive(Clone, Default)]
struct CountingProbe(Arc<AtomicUsize>);

impl DiscoveryProbe for CountingProbe {
    async fn attempt(&self, _email_address: &str) -> DiscoveryOutcome {
        self.0.fetch_add(1, Ordering::SeqCst);
        DiscoveryOutcome::NotFound
    }
}

fn google_shortcut(addr: SocketAddr) -> ProviderMxProbe<DnsResolver> {
    ProviderMxProbe::new(
        resolver(addr),
        "Google Workspace",
        &["aspmx.l.google.com".to_string()],
    )
    .with_timeout(Duration::from_secs(2))
}

#[tokio::test]
async fn typed_mx_records() {
    let addr = serve(Answer::Mx(&[
        (1, "ASPMX.L.Google.com."),
        (5, "alt1.aspmx.l.google.com."),
    ]))
    .await;

    let mut records = resolver(addr).resolve_mx("example.com").await.unwrap();
    records.sort_by_key(|record| record.preference);
    assert_eq!(
        records,
        vec![
            MxRecord {
                preference: 1,
                exchange: "aspmx.l.google.com".to_string(),
            },
            MxRecord {
                preference: 5,
                exchange: "alt1.aspmx.l.google.com".to_string(),
            },
        ]
    );
}

#[tokio::test]
async fn nxdomain_has_no_records() {
    let addr = serve(Answer::Code(ResponseCode::NXDomain)).await;
    let records = resolver(addr).resolve_mx("missing.example").await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn empty_answer_has_no_records() {
    let addr = serve(Answer::Mx(&[])).await;
    let records = resolver(addr).resolve_mx("example.com").await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn silent_server_is_an_error() {
    let addr = serve(Answer::Silent).await;
    let result = tokio::time::timeout(
        Duration::from_secs(10),
        resolver(addr).resolve_mx("example.com"),
    )
    .await
    .expect("resolver timeout did not fire");
    assert!(result.is_err());
}

#[tokio::test]
async fn shortcut_recognizes_provider_exchange() {
    let addr = serve(Answer::Mx(&[(1, "aspmx.l.google.com.")])).await;
    let generic = CountingProbe::default();
    let coordinator = DiscoveryCoordinator::new(google_shortcut(addr), generic.clone());

    assert_eq!(
        coordinator.discover("user@corp.example").await,
        DiscoveryOutcome::Found(DiscoveredSettings::trusted_placeholder())
    );
    assert_eq!(generic.0.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failing_dns_falls_back_to_generic() {
    for answer in [
        Answer::Code(ResponseCode::ServFail),
        Answer::Code(ResponseCode::Refused),
        Answer::Silent,
        Answer::Mx(&[(10, "mx.other-host.example.")]),
    ] {
        let addr = serve(answer).await;
        let generic = CountingProbe::default();
        let coordinator = DiscoveryCoordinator::new(google_shortcut(addr), generic.clone());

        assert_eq!(
            coordinator.discover("user@corp.example").await,
            DiscoveryOutcome::NotFound
        );
        assert_eq!(generic.0.load(Ordering::SeqCst), 1);
    }
}
