//! Turns a validated response into the typed result of the pending query.

use super::record_type_map::RecordTypeMapper;
use ferrous_resolv_domain::{
    AddressRecord, CnameRecord, HostEntry, MxRecord, NaptrRecord, NsRecord, PtrRecord,
    QueryResult, RecordType, ResolveError, SoaRecord, SrvRecord, TxtRecord,
};
use hickory_proto::op::Message;
use hickory_proto::rr::{Name, RData, Record};
use rustc_hash::FxHashMap;
use std::net::IpAddr;

/// Longest CNAME chain followed before giving up.
const MAX_CNAME_HOPS: usize = 16;

pub struct RecordExtractor;

impl RecordExtractor {
    /// Typed result built from the answer records matching `record_type`.
    ///
    /// NOERROR without any matching answer yields `NoData`.
    pub fn records(message: &Message, record_type: RecordType) -> Result<QueryResult, ResolveError> {
        let wanted = RecordTypeMapper::to_hickory(record_type);
        let answers: Vec<&Record> = message
            .answers()
            .iter()
            .filter(|r| r.record_type() == wanted)
            .collect();
        if answers.is_empty() {
            return Err(ResolveError::NoData);
        }

        let result = match record_type {
            RecordType::A => QueryResult::A(collect(&answers, address)?),
            RecordType::AAAA => QueryResult::AAAA(collect(&answers, address)?),
            RecordType::CNAME => QueryResult::CNAME(cname(answers[0])?),
            RecordType::MX => QueryResult::MX(collect(&answers, mx)?),
            RecordType::NS => QueryResult::NS(collect(&answers, ns)?),
            RecordType::TXT => QueryResult::TXT(collect(&answers, txt)?),
            RecordType::SOA => QueryResult::SOA(soa(answers[0])?),
            RecordType::SRV => QueryResult::SRV(collect(&answers, srv)?),
            RecordType::NAPTR => QueryResult::NAPTR(collect(&answers, naptr)?),
            RecordType::PTR => QueryResult::PTR(ptr(&answers)?),
        };
        Ok(result)
    }

    /// Host entry for an address query on `queried`.
    ///
    /// CNAME owners met while walking from `queried` to the canonical name
    /// become aliases; every address of the requested type is collected.
    pub fn host(
        message: &Message,
        queried: &str,
        record_type: RecordType,
    ) -> Result<HostEntry, ResolveError> {
        let mut chain: FxHashMap<String, String> = FxHashMap::default();
        for record in message.answers() {
            if let RData::CNAME(target) = record.data() {
                chain.insert(name_key(record.name()), name_str(&target.0));
            }
        }

        let mut canonical = queried.trim_end_matches('.').to_string();
        let mut aliases = Vec::new();
        for _ in 0..MAX_CNAME_HOPS {
            match chain.get(&canonical.to_ascii_lowercase()) {
                Some(target) => {
                    aliases.push(std::mem::replace(&mut canonical, target.clone()));
                }
                None => break,
            }
        }

        let wanted = RecordTypeMapper::to_hickory(record_type);
        let mut entry = HostEntry::new(canonical).with_aliases(aliases);
        for record in message.answers().iter().filter(|r| r.record_type() == wanted) {
            entry.push_address(address(record)?.host);
        }
        if entry.addresses.is_empty() {
            return Err(ResolveError::NoData);
        }
        Ok(entry)
    }

    /// Host entry for a reverse lookup of `addr`.
    pub fn reverse_host(message: &Message, addr: IpAddr) -> Result<HostEntry, ResolveError> {
        match Self::records(message, RecordType::PTR)? {
            QueryResult::PTR(ptr) => Ok(HostEntry::new(ptr.name)
                .with_aliases(ptr.aliases)
                .with_addresses(vec![addr])),
            other => Err(ResolveError::MalformedResponse(format!(
                "expected PTR answer, got {}",
                other.record_type()
            ))),
        }
    }
}

/// Presentation form without the trailing root dot.
pub(crate) fn name_str(name: &Name) -> String {
    let text = name.to_utf8();
    match text.strip_suffix('.') {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => text,
    }
}

fn name_key(name: &Name) -> String {
    name_str(name).to_ascii_lowercase()
}

fn collect<T>(
    answers: &[&Record],
    extract: fn(&Record) -> Result<T, ResolveError>,
) -> Result<Vec<T>, ResolveError> {
    answers.iter().map(|r| extract(r)).collect()
}

fn unexpected(record: &Record) -> ResolveError {
    ResolveError::MalformedResponse(format!(
        "unexpected rdata for {} record",
        record.record_type()
    ))
}

fn address(record: &Record) -> Result<AddressRecord, ResolveError> {
    let host = match record.data() {
        RData::A(a) => IpAddr::V4(a.0),
        RData::AAAA(aaaa) => IpAddr::V6(aaaa.0),
        _ => return Err(unexpected(record)),
    };
    Ok(AddressRecord {
        host,
        ttl: record.ttl(),
    })
}

fn cname(record: &Record) -> Result<CnameRecord, ResolveError> {
    match record.data() {
        RData::CNAME(target) => Ok(CnameRecord {
            cname: name_str(&target.0),
            ttl: record.ttl(),
        }),
        _ => Err(unexpected(record)),
    }
}

fn mx(record: &Record) -> Result<MxRecord, ResolveError> {
    match record.data() {
        RData::MX(mx) => Ok(MxRecord {
            host: name_str(mx.exchange()),
            priority: mx.preference(),
            ttl: record.ttl(),
        }),
        _ => Err(unexpected(record)),
    }
}

fn ns(record: &Record) -> Result<NsRecord, ResolveError> {
    match record.data() {
        RData::NS(ns) => Ok(NsRecord {
            host: name_str(&ns.0),
            ttl: record.ttl(),
        }),
        _ => Err(unexpected(record)),
    }
}

fn txt(record: &Record) -> Result<TxtRecord, ResolveError> {
    match record.data() {
        RData::TXT(txt) => {
            let text = txt
                .txt_data()
                .iter()
                .map(|chunk| String::from_utf8_lossy(chunk))
                .collect::<String>();
            Ok(TxtRecord {
                text,
                ttl: record.ttl(),
            })
        }
        _ => Err(unexpected(record)),
    }
}

fn soa(record: &Record) -> Result<SoaRecord, ResolveError> {
    match record.data() {
        RData::SOA(soa) => Ok(SoaRecord {
            nsname: name_str(soa.mname()),
            hostmaster: name_str(soa.rname()),
            serial: soa.serial(),
            refresh: soa.refresh() as u32,
            retry: soa.retry() as u32,
            expires: soa.expire() as u32,
            minttl: soa.minimum(),
            ttl: record.ttl(),
        }),
        _ => Err(unexpected(record)),
    }
}

fn srv(record: &Record) -> Result<SrvRecord, ResolveError> {
    match record.data() {
        RData::SRV(srv) => Ok(SrvRecord {
            host: name_str(srv.target()),
            port: srv.port(),
            priority: srv.priority(),
            weight: srv.weight(),
            ttl: record.ttl(),
        }),
        _ => Err(unexpected(record)),
    }
}

fn naptr(record: &Record) -> Result<NaptrRecord, ResolveError> {
    match record.data() {
        RData::NAPTR(naptr) => Ok(NaptrRecord {
            order: naptr.order(),
            preference: naptr.preference(),
            flags: String::from_utf8_lossy(naptr.flags()).into_owned(),
            service: String::from_utf8_lossy(naptr.services()).into_owned(),
            regex: String::from_utf8_lossy(naptr.regexp()).into_owned(),
            replacement: name_str(naptr.replacement()),
            ttl: record.ttl(),
        }),
        _ => Err(unexpected(record)),
    }
}

fn ptr(answers: &[&Record]) -> Result<PtrRecord, ResolveError> {
    let mut names = Vec::with_capacity(answers.len());
    for record in answers {
        match record.data() {
            RData::PTR(target) => names.push(name_str(&target.0)),
            _ => return Err(unexpected(record)),
        }
    }
    let mut names = names.into_iter();
    let name = names.next().ok_or(ResolveError::NoData)?;
    Ok(PtrRecord {
        name,
        aliases: names.collect(),
        ttl: answers[0].ttl(),
    })
}
