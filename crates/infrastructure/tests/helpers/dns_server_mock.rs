#![allow(dead_code)]
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::rdata::{A, AAAA, CNAME, MX, NAPTR, NS, PTR, SOA, SRV, TXT};
use hickory_proto::rr::{DNSClass, Name, RData, Record, RecordType as HickoryRecordType};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::collections::HashMap;
use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, UdpSocket};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How the mock answers questions for a given name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Answer,
    NoData,
    NxDomain,
    ServFail,
    Refused,
    /// TC over UDP, full answer over TCP.
    Truncate,
    Silent,
    /// CNAME to the given name followed by its A record.
    CnameTo(&'static str),
    /// Answer under the right ID whose question names another host.
    WrongQuestion,
}

/// UDP + TCP DNS server on one loopback port, answering from fixed rules.
///
/// Names without a rule get a synthetic answer for the asked type.
pub struct MockDnsServer {
    addr: SocketAddr,
    stop: Arc<AtomicBool>,
    udp_queries: Arc<AtomicUsize>,
    tcp_queries: Arc<AtomicUsize>,
    threads: Vec<JoinHandle<()>>,
}

impl MockDnsServer {
    pub fn start() -> Self {
        Self::with_rules(&[])
    }

    pub fn with_rules(rules: &[(&str, Behavior)]) -> Self {
        let rules: Arc<HashMap<String, Behavior>> = Arc::new(
            rules
                .iter()
                .map(|(name, behavior)| (name.to_ascii_lowercase(), *behavior))
                .collect(),
        );
        let (udp, tcp) = bind_pair();
        let addr = udp.local_addr().unwrap();
        let stop = Arc::new(AtomicBool::new(false));
        let udp_queries = Arc::new(AtomicUsize::new(0));
        let tcp_queries = Arc::new(AtomicUsize::new(0));

        let udp_thread = {
            let (rules, stop, counter) = (rules.clone(), stop.clone(), udp_queries.clone());
            std::thread::spawn(move || serve_udp(udp, &rules, &stop, &counter))
        };
        let tcp_thread = {
            let (rules, stop, counter) = (rules, stop.clone(), tcp_queries.clone());
            std::thread::spawn(move || serve_tcp(tcp, rules, stop, counter))
        };

        Self {
            addr,
            stop,
            udp_queries,
            tcp_queries,
            threads: vec![udp_thread, tcp_thread],
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn udp_queries(&self) -> usize {
        self.udp_queries.load(Ordering::SeqCst)
    }

    pub fn tcp_queries(&self) -> usize {
        self.tcp_queries.load(Ordering::SeqCst)
    }

    pub fn total_queries(&self) -> usize {
        self.udp_queries() + self.tcp_queries()
    }
}

impl Drop for MockDnsServer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        for thread in self.threads.drain(..) {
            let _ = thread.join();
        }
    }
}

fn bind_pair() -> (UdpSocket, TcpListener) {
    for _ in 0..50 {
        let udp = UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = udp.local_addr().unwrap().port();
        if let Ok(tcp) = TcpListener::bind(("127.0.0.1", port)) {
            return (udp, tcp);
        }
    }
    panic!("no loopback port free for both UDP and TCP");
}

fn serve_udp(
    socket: UdpSocket,
    rules: &HashMap<String, Behavior>,
    stop: &AtomicBool,
    counter: &AtomicUsize,
) {
    socket.set_read_timeout(Some(POLL_INTERVAL)).unwrap();
    let mut buf = [0u8; 4096];
    while !stop.load(Ordering::SeqCst) {
        let Ok((len, peer)) = socket.recv_from(&mut buf) else {
            continue;
        };
        counter.fetch_add(1, Ordering::SeqCst);
        if let Some(response) = respond(rules, &buf[..len], false) {
            let _ = socket.send_to(&response, peer);
        }
    }
}

fn serve_tcp(
    listener: TcpListener,
    rules: Arc<HashMap<String, Behavior>>,
    stop: Arc<AtomicBool>,
    counter: Arc<AtomicUsize>,
) {
    listener.set_nonblocking(true).unwrap();
    let mut connections = Vec::new();
    while !stop.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, _)) => {
                let (rules, stop, counter) = (rules.clone(), stop.clone(), counter.clone());
                connections.push(std::thread::spawn(move || {
                    serve_connection(stream, &rules, &stop, &counter)
                }));
            }
            Err(_) => std::thread::sleep(POLL_INTERVAL),
        }
    }
    for connection in connections {
        let _ = connection.join();
    }
}

fn serve_connection(
    mut stream: TcpStream,
    rules: &HashMap<String, Behavior>,
    stop: &AtomicBool,
    counter: &AtomicUsize,
) {
    stream.set_nonblocking(false).unwrap();
    stream.set_read_timeout(Some(POLL_INTERVAL)).unwrap();
    let mut pending: Vec<u8> = Vec::new();
    let mut buf = [0u8; 4096];
    while !stop.load(Ordering::SeqCst) {
        match stream.read(&mut buf) {
            Ok(0) => return,
            Ok(n) => pending.extend_from_slice(&buf[..n]),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => continue,
            Err(_) => return,
        }
        while pending.len() >= 2 {
            let len = u16::from_be_bytes([pending[0], pending[1]]) as usize;
            if pending.len() < 2 + len {
                break;
            }
            let query: Vec<u8> = pending.drain(..2 + len).skip(2).collect();
            counter.fetch_add(1, Ordering::SeqCst);
            if let Some(response) = respond(rules, &query, true) {
                let mut framed = (response.len() as u16).to_be_bytes().to_vec();
                framed.extend_from_slice(&response);
                if stream.write_all(&framed).is_err() {
                    return;
                }
            }
        }
    }
}

/// Question name (no trailing dot) and type, plus the end offset of the
/// question section.
pub fn parse_question(query: &[u8]) -> Option<(String, u16, usize)> {
    if query.len() < 12 {
        return None;
    }
    let mut pos = 12;
    let mut labels = Vec::new();
    loop {
        let len = *query.get(pos)? as usize;
        pos += 1;
        if len == 0 {
            break;
        }
        labels.push(String::from_utf8_lossy(query.get(pos..pos + len)?).into_owned());
        pos += len;
    }
    let qtype = u16::from_be_bytes([*query.get(pos)?, *query.get(pos + 1)?]);
    Some((labels.join("."), qtype, pos + 4))
}

fn respond(rules: &HashMap<String, Behavior>, query: &[u8], over_tcp: bool) -> Option<Vec<u8>> {
    let (name, qtype, question_end) = parse_question(query)?;
    let id = u16::from_be_bytes([query[0], query[1]]);
    let behavior = rules
        .get(&name.to_ascii_lowercase())
        .copied()
        .unwrap_or(Behavior::Answer);

    match behavior {
        Behavior::Silent => None,
        Behavior::NxDomain => Some(header_only(query, question_end, 3, false)),
        Behavior::ServFail => Some(header_only(query, question_end, 2, false)),
        Behavior::Refused => Some(header_only(query, question_end, 5, false)),
        Behavior::Truncate if !over_tcp => Some(header_only(query, question_end, 0, true)),
        Behavior::NoData => Some(answer(id, &name, qtype, Vec::new())),
        Behavior::WrongQuestion => {
            let other = format!("other.{}", name);
            let records = synthetic_rdata(&other, HickoryRecordType::from(qtype))
                .into_iter()
                .map(|rdata| Record::from_rdata(fqdn(&other), 300, rdata))
                .collect();
            Some(answer(id, &other, qtype, records))
        }
        Behavior::CnameTo(target) => {
            let target_name = fqdn(target);
            let records = vec![
                Record::from_rdata(fqdn(&name), 300, RData::CNAME(CNAME(target_name.clone()))),
                Record::from_rdata(target_name, 300, RData::A(A::new(192, 0, 2, 10))),
            ];
            Some(answer(id, &name, qtype, records))
        }
        Behavior::Answer | Behavior::Truncate => {
            let owner = fqdn(&name);
            let records = synthetic_rdata(&name, HickoryRecordType::from(qtype))
                .into_iter()
                .map(|rdata| Record::from_rdata(owner.clone(), 300, rdata))
                .collect();
            Some(answer(id, &name, qtype, records))
        }
    }
}

/// Header plus echoed question, with the given RCODE and TC bit.
fn header_only(query: &[u8], question_end: usize, rcode: u8, truncated: bool) -> Vec<u8> {
    let mut response = Vec::with_capacity(question_end);
    response.extend_from_slice(&query[0..2]);
    response.push(0x81 | if truncated { 0x02 } else { 0 });
    response.push(0x80 | rcode);
    response.extend_from_slice(&[0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
    response.extend_from_slice(&query[12..question_end]);
    response
}

fn answer(id: u16, name: &str, qtype: u16, records: Vec<Record>) -> Vec<u8> {
    let mut query = Query::new();
    query.set_name(fqdn(name));
    query.set_query_type(HickoryRecordType::from(qtype));
    query.set_query_class(DNSClass::IN);

    let mut message = Message::new(id, MessageType::Response, OpCode::Query);
    message.set_recursion_desired(true);
    message.set_recursion_available(true);
    message.add_query(query);
    for record in records {
        message.add_answer(record);
    }

    let mut buf = Vec::with_capacity(512);
    let mut encoder = BinEncoder::new(&mut buf);
    message.emit(&mut encoder).unwrap();
    buf
}

fn fqdn(name: &str) -> Name {
    Name::from_str(&format!("{}.", name.trim_end_matches('.'))).unwrap()
}

fn synthetic_rdata(name: &str, record_type: HickoryRecordType) -> Vec<RData> {
    match record_type {
        HickoryRecordType::A if name.starts_with("multi.") => vec![
            RData::A(A::new(192, 0, 2, 1)),
            RData::A(A::new(192, 0, 2, 2)),
        ],
        HickoryRecordType::A => vec![RData::A(A::new(192, 0, 2, 1))],
        HickoryRecordType::AAAA => vec![RData::AAAA(AAAA::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1))],
        HickoryRecordType::CNAME => vec![RData::CNAME(CNAME(fqdn(&format!("target.{}", name))))],
        HickoryRecordType::MX => vec![
            RData::MX(MX::new(10, fqdn(&format!("mail.{}", name)))),
            RData::MX(MX::new(20, fqdn(&format!("backup.{}", name)))),
        ],
        HickoryRecordType::NS => vec![RData::NS(NS(fqdn(&format!("ns1.{}", name))))],
        HickoryRecordType::TXT => vec![RData::TXT(TXT::new(vec!["v=spf1 -all".to_string()]))],
        HickoryRecordType::SOA => vec![RData::SOA(SOA::new(
            fqdn(&format!("ns1.{}", name)),
            fqdn(&format!("hostmaster.{}", name)),
            2024010101,
            3600,
            900,
            604800,
            300,
        ))],
        HickoryRecordType::SRV => vec![RData::SRV(SRV::new(
            10,
            60,
            5060,
            fqdn(&format!("sip.{}", name)),
        ))],
        HickoryRecordType::NAPTR => vec![RData::NAPTR(NAPTR::new(
            100,
            10,
            b"S".to_vec().into_boxed_slice(),
            b"SIP+D2U".to_vec().into_boxed_slice(),
            b"".to_vec().into_boxed_slice(),
            fqdn(&format!("_sip._udp.{}", name)),
        ))],
        HickoryRecordType::PTR => vec![RData::PTR(PTR(fqdn("host.example.com")))],
        _ => Vec::new(),
    }
}
