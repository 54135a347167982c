use ferrous_resolv_domain::{CnameRecord, QueryResult, RecordType, ResolveError};
use std::net::IpAddr;
use std::str::FromStr;

mod helpers;
use helpers::{mx, soa, AddressRecordsBuilder};

#[test]
fn test_record_type_codes_roundtrip() {
    for rt in RecordType::ALL {
        assert_eq!(RecordType::from_u16(rt.to_u16()), Some(rt), "{}", rt);
    }
}

#[test]
fn test_record_type_wire_codes() {
    assert_eq!(RecordType::A.to_u16(), 1);
    assert_eq!(RecordType::NS.to_u16(), 2);
    assert_eq!(RecordType::SOA.to_u16(), 6);
    assert_eq!(RecordType::PTR.to_u16(), 12);
    assert_eq!(RecordType::AAAA.to_u16(), 28);
    assert_eq!(RecordType::NAPTR.to_u16(), 35);
}

#[test]
fn test_unsupported_code_is_bad_query() {
    let result = RecordType::try_from(667u16);
    assert!(matches!(result, Err(ResolveError::BadQuery(_))));
    assert!(RecordType::from_u16(255).is_none());
}

#[test]
fn test_record_type_from_str_case_insensitive() {
    assert_eq!(RecordType::from_str("naptr").unwrap(), RecordType::NAPTR);
    assert_eq!(RecordType::from_str("Aaaa").unwrap(), RecordType::AAAA);
    assert!(RecordType::from_str("DNSKEY").is_err());
}

#[test]
fn test_record_type_display() {
    assert_eq!(RecordType::SRV.to_string(), "SRV");
}

#[test]
fn test_query_result_addresses_and_ttl() {
    let result = AddressRecordsBuilder::new()
        .address("192.0.2.1", 300)
        .address("192.0.2.2", 60)
        .build_a();

    assert_eq!(result.record_type(), RecordType::A);
    assert_eq!(result.len(), 2);
    assert_eq!(result.min_ttl(), Some(60));
    assert_eq!(
        result.addresses(),
        vec![
            IpAddr::from_str("192.0.2.1").unwrap(),
            IpAddr::from_str("192.0.2.2").unwrap()
        ]
    );
}

#[test]
fn test_query_result_single_record_variants() {
    let cname = QueryResult::CNAME(CnameRecord {
        cname: "target.example.com".to_string(),
        ttl: 120,
    });
    assert_eq!(cname.len(), 1);
    assert!(cname.addresses().is_empty());

    let soa = QueryResult::SOA(soa("example.com", 300, 3600));
    assert_eq!(soa.record_type(), RecordType::SOA);
    assert_eq!(soa.min_ttl(), Some(3600));
}

#[test]
fn test_empty_mx_result() {
    let result = QueryResult::MX(vec![]);
    assert!(result.is_empty());
    assert_eq!(result.min_ttl(), None);

    let result = QueryResult::MX(vec![mx("mail.example.com", 10, 300)]);
    assert!(!result.is_empty());
}

#[test]
fn test_error_codes_and_retryability() {
    assert_eq!(ResolveError::NotFound.code(), "ENOTFOUND");
    assert_eq!(ResolveError::Timeout.code(), "ETIMEOUT");
    assert_eq!(ResolveError::Cancelled.code(), "ECANCELLED");
    assert!(ResolveError::ServerFailure.is_retryable());
    assert!(!ResolveError::NotFound.is_retryable());
    assert!(!ResolveError::Cancelled.is_retryable());
}

#[test]
fn test_io_connection_refused_maps_to_variant() {
    let err = std::io::Error::from(std::io::ErrorKind::ConnectionRefused);
    assert_eq!(ResolveError::from(err), ResolveError::ConnectionRefused);
}
