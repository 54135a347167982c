#![allow(dead_code)]
use ferrous_resolv_domain::{AddressRecord, MxRecord, QueryResult, SoaRecord};
use std::net::IpAddr;
use std::str::FromStr;

pub struct AddressRecordsBuilder {
    records: Vec<AddressRecord>,
}

impl AddressRecordsBuilder {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub fn address(mut self, ip: &str, ttl: u32) -> Self {
        self.records.push(AddressRecord {
            host: IpAddr::from_str(ip).unwrap(),
            ttl,
        });
        self
    }

    pub fn build_a(self) -> QueryResult {
        QueryResult::A(self.records)
    }

    pub fn build_aaaa(self) -> QueryResult {
        QueryResult::AAAA(self.records)
    }
}

pub fn mx(host: &str, priority: u16, ttl: u32) -> MxRecord {
    MxRecord {
        host: host.to_string(),
        priority,
        ttl,
    }
}

pub fn soa(zone: &str, minttl: u32, ttl: u32) -> SoaRecord {
    SoaRecord {
        nsname: format!("ns1.{}", zone),
        hostmaster: format!("hostmaster.{}", zone),
        serial: 1,
        refresh: 3600,
        retry: 900,
        expires: 604_800,
        minttl,
        ttl,
    }
}
