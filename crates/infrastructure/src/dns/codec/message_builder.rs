//! DNS Message Builder
//!
//! Constructs DNS query messages in wire format using `hickory-proto`.

use super::record_type_map::RecordTypeMapper;
use ferrous_resolv_domain::{RecordType, ResolveError};
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{DNSClass, Name};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::str::FromStr;

/// Longest presentation-format name accepted in a question.
const MAX_NAME_LEN: usize = 253;

/// Builds DNS query messages in wire format
pub struct MessageBuilder;

impl MessageBuilder {
    /// Build a query with a random message ID.
    ///
    /// Returns the ID together with the serialized bytes so the caller can
    /// match the response.
    pub fn build_query(
        domain: &str,
        record_type: RecordType,
        recursion_desired: bool,
    ) -> Result<(u16, Vec<u8>), ResolveError> {
        let id = fastrand::u16(..);
        let bytes = Self::build_query_with_id(domain, record_type, id, recursion_desired)?;
        Ok((id, bytes))
    }

    /// Build a single IN-class question for `domain` carrying message ID `id`.
    pub fn build_query_with_id(
        domain: &str,
        record_type: RecordType,
        id: u16,
        recursion_desired: bool,
    ) -> Result<Vec<u8>, ResolveError> {
        let name = Self::parse_name(domain)?;

        let mut query = Query::new();
        query.set_name(name);
        query.set_query_type(RecordTypeMapper::to_hickory(record_type));
        query.set_query_class(DNSClass::IN);

        let mut message = Message::new(id, MessageType::Query, OpCode::Query);
        message.set_recursion_desired(recursion_desired);
        message.add_query(query);

        Self::serialize_message(&message)
    }

    /// Validates a query name and turns it into a fully qualified `Name`.
    pub fn parse_name(domain: &str) -> Result<Name, ResolveError> {
        let trimmed = domain.trim();
        if trimmed.is_empty() || trimmed == "." {
            return Err(ResolveError::BadQuery("empty domain name".to_string()));
        }
        if trimmed.trim_end_matches('.').len() > MAX_NAME_LEN {
            return Err(ResolveError::BadQuery(format!(
                "domain name too long: {} bytes",
                trimmed.len()
            )));
        }
        if trimmed.contains("..") || trimmed.chars().any(char::is_whitespace) {
            return Err(ResolveError::BadQuery(format!(
                "Invalid domain '{}'",
                domain
            )));
        }

        let mut name = Name::from_str(trimmed).map_err(|e| {
            ResolveError::BadQuery(format!("Invalid domain '{}': {}", domain, e))
        })?;
        name.set_fqdn(true);
        Ok(name)
    }

    fn serialize_message(message: &Message) -> Result<Vec<u8>, ResolveError> {
        let mut buf = Vec::with_capacity(512);
        let mut encoder = BinEncoder::new(&mut buf);

        message.emit(&mut encoder).map_err(|e| {
            ResolveError::BadQuery(format!("Failed to serialize DNS message: {}", e))
        })?;

        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_a_query() {
        let (_, bytes) = MessageBuilder::build_query("google.com", RecordType::A, true).unwrap();
        assert!(bytes.len() >= 12, "DNS message too short: {} bytes", bytes.len());

        // Byte 2: QR(1) + Opcode(4) + AA(1) + TC(1) + RD(1)
        assert_eq!(bytes[2] & 0x01, 0x01, "RD flag should be set");
        assert_eq!(bytes[2] & 0x80, 0x00, "QR flag must be clear on queries");
        assert_eq!(u16::from_be_bytes([bytes[4], bytes[5]]), 1, "QDCOUNT");
    }

    #[test]
    fn test_no_recursion_clears_rd() {
        let bytes =
            MessageBuilder::build_query_with_id("example.com", RecordType::NS, 7, false).unwrap();
        assert_eq!(bytes[2] & 0x01, 0x00);
    }

    #[test]
    fn test_build_query_with_id() {
        let (id, bytes) = MessageBuilder::build_query("test.com", RecordType::MX, true).unwrap();
        assert_eq!(u16::from_be_bytes([bytes[0], bytes[1]]), id);
    }

    #[test]
    fn test_question_type_and_class() {
        let bytes =
            MessageBuilder::build_query_with_id("a.b", RecordType::NAPTR, 1, true).unwrap();
        let tail = &bytes[bytes.len() - 4..];
        assert_eq!(u16::from_be_bytes([tail[0], tail[1]]), 35);
        assert_eq!(u16::from_be_bytes([tail[2], tail[3]]), 1);
    }

    #[test]
    fn test_invalid_domains_rejected() {
        for bad in ["", "   ", ".", "a..b", "has space.com"] {
            let result = MessageBuilder::build_query(bad, RecordType::A, true);
            assert!(
                matches!(result, Err(ResolveError::BadQuery(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_overlong_name_rejected() {
        let long = format!("{}.com", "a".repeat(260));
        assert!(MessageBuilder::build_query(&long, RecordType::A, true).is_err());
    }

    #[test]
    fn test_all_record_types_build() {
        for rt in RecordType::ALL {
            let result = MessageBuilder::build_query("example.com", rt, true);
            assert!(result.is_ok(), "Failed to build query for {:?}", rt);
        }
    }

    #[test]
    fn test_reverse_name_builds() {
        let name = ferrous_resolv_domain::reverse_address_str("2001:4860:4860::8888").unwrap();
        assert!(MessageBuilder::build_query(&name, RecordType::PTR, true).is_ok());
    }
}
