use super::RecordType;
use std::net::IpAddr;

/// A or AAAA answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
    pub host: IpAddr,
    pub ttl: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CnameRecord {
    pub cname: String,
    pub ttl: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxRecord {
    pub host: String,
    pub priority: u16,
    pub ttl: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NsRecord {
    pub host: String,
    pub ttl: u32,
}

/// One TXT resource record; its character-strings are concatenated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxtRecord {
    pub text: String,
    pub ttl: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoaRecord {
    pub nsname: String,
    pub hostmaster: String,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expires: u32,
    pub minttl: u32,
    pub ttl: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrvRecord {
    pub host: String,
    pub port: u16,
    pub priority: u16,
    pub weight: u16,
    pub ttl: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NaptrRecord {
    pub order: u16,
    pub preference: u16,
    pub flags: String,
    pub service: String,
    pub regex: String,
    pub replacement: String,
    pub ttl: u32,
}

/// PTR answer: the first target is the name, further targets are aliases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PtrRecord {
    pub name: String,
    pub aliases: Vec<String>,
    pub ttl: u32,
}

/// Decoded result of a typed record query, one variant per record type.
///
/// CNAME, SOA and PTR queries produce a single record; every other type
/// produces the full answer set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResult {
    A(Vec<AddressRecord>),
    AAAA(Vec<AddressRecord>),
    CNAME(CnameRecord),
    MX(Vec<MxRecord>),
    NS(Vec<NsRecord>),
    TXT(Vec<TxtRecord>),
    SOA(SoaRecord),
    SRV(Vec<SrvRecord>),
    NAPTR(Vec<NaptrRecord>),
    PTR(PtrRecord),
}

impl QueryResult {
    pub fn record_type(&self) -> RecordType {
        match self {
            QueryResult::A(_) => RecordType::A,
            QueryResult::AAAA(_) => RecordType::AAAA,
            QueryResult::CNAME(_) => RecordType::CNAME,
            QueryResult::MX(_) => RecordType::MX,
            QueryResult::NS(_) => RecordType::NS,
            QueryResult::TXT(_) => RecordType::TXT,
            QueryResult::SOA(_) => RecordType::SOA,
            QueryResult::SRV(_) => RecordType::SRV,
            QueryResult::NAPTR(_) => RecordType::NAPTR,
            QueryResult::PTR(_) => RecordType::PTR,
        }
    }

    /// Number of resource records carried by the result.
    pub fn len(&self) -> usize {
        match self {
            QueryResult::A(v) | QueryResult::AAAA(v) => v.len(),
            QueryResult::MX(v) => v.len(),
            QueryResult::NS(v) => v.len(),
            QueryResult::TXT(v) => v.len(),
            QueryResult::SRV(v) => v.len(),
            QueryResult::NAPTR(v) => v.len(),
            QueryResult::CNAME(_) | QueryResult::SOA(_) | QueryResult::PTR(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest TTL across the carried records.
    pub fn min_ttl(&self) -> Option<u32> {
        match self {
            QueryResult::A(v) | QueryResult::AAAA(v) => v.iter().map(|r| r.ttl).min(),
            QueryResult::MX(v) => v.iter().map(|r| r.ttl).min(),
            QueryResult::NS(v) => v.iter().map(|r| r.ttl).min(),
            QueryResult::TXT(v) => v.iter().map(|r| r.ttl).min(),
            QueryResult::SRV(v) => v.iter().map(|r| r.ttl).min(),
            QueryResult::NAPTR(v) => v.iter().map(|r| r.ttl).min(),
            QueryResult::CNAME(r) => Some(r.ttl),
            QueryResult::SOA(r) => Some(r.ttl),
            QueryResult::PTR(r) => Some(r.ttl),
        }
    }

    pub fn addresses(&self) -> Vec<IpAddr> {
        match self {
            QueryResult::A(v) | QueryResult::AAAA(v) => v.iter().map(|r| r.host).collect(),
            _ => Vec::new(),
        }
    }
}
