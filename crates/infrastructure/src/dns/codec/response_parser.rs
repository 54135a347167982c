use super::record_extractor::name_str;
use super::RecordTypeMapper;
use ferrous_resolv_domain::{RecordType, ResolveError};
use hickory_proto::op::{Message, ResponseCode};
use tracing::debug;

const HEADER_LEN: usize = 12;
const FLAG_QR: u8 = 0x80;
const FLAG_TC: u8 = 0x02;

/// Outcome of validating a response for a pending query.
#[derive(Debug)]
pub enum ParsedResponse {
    /// A complete NOERROR response.
    Answer(Message),
    /// The TC bit was set; the question has to be repeated over TCP.
    Truncated,
    /// The ID matched but the question section names something else.
    QuestionMismatch,
}

pub struct ResponseParser;

impl ResponseParser {
    /// Message ID of a wire-format message, used to route it to its query.
    pub fn peek_id(bytes: &[u8]) -> Option<u16> {
        if bytes.len() < HEADER_LEN {
            return None;
        }
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Validates `bytes` as the response to query `expected_id` asking
    /// `name`/`record_type`.
    ///
    /// A non-zero RCODE becomes the matching error. With
    /// `accept_truncated` unset a response carrying TC is reported as
    /// [`ParsedResponse::Truncated`] before its body is decoded.
    pub fn parse(
        bytes: &[u8],
        expected_id: u16,
        name: &str,
        record_type: RecordType,
        accept_truncated: bool,
    ) -> Result<ParsedResponse, ResolveError> {
        let id = Self::peek_id(bytes).ok_or_else(|| {
            ResolveError::MalformedResponse(format!("short message: {} bytes", bytes.len()))
        })?;
        if id != expected_id {
            return Err(ResolveError::MalformedResponse(format!(
                "unexpected message id {} (expected {})",
                id, expected_id
            )));
        }
        if bytes[2] & FLAG_QR == 0 {
            return Err(ResolveError::MalformedResponse(
                "QR bit not set in response".to_string(),
            ));
        }
        if bytes[2] & FLAG_TC != 0 && !accept_truncated {
            debug!(id, "Truncated response");
            return Ok(ParsedResponse::Truncated);
        }

        let message = Message::from_vec(bytes).map_err(|e| {
            ResolveError::MalformedResponse(format!("Failed to parse DNS response: {}", e))
        })?;

        if !Self::question_matches(&message, name, record_type) {
            debug!(id, name, "Response question does not match the query");
            return Ok(ParsedResponse::QuestionMismatch);
        }

        let rcode = message.response_code();
        debug!(
            id,
            rcode = Self::rcode_to_status(rcode),
            answers = message.answers().len(),
            truncated = message.truncated(),
            "DNS response parsed"
        );

        match Self::rcode_to_error(rcode) {
            Some(err) => Err(err),
            None => Ok(ParsedResponse::Answer(message)),
        }
    }

    /// True when the single question of `message` is `name`/`record_type`,
    /// compared case-insensitively and ignoring the root dot.
    pub fn question_matches(message: &Message, name: &str, record_type: RecordType) -> bool {
        match message.queries() {
            [question] => {
                question.query_type() == RecordTypeMapper::to_hickory(record_type)
                    && name_str(question.name())
                        .eq_ignore_ascii_case(name.trim().trim_end_matches('.'))
            }
            _ => false,
        }
    }

    pub fn rcode_to_error(rcode: ResponseCode) -> Option<ResolveError> {
        match rcode {
            ResponseCode::NoError => None,
            ResponseCode::NXDomain => Some(ResolveError::NotFound),
            ResponseCode::ServFail => Some(ResolveError::ServerFailure),
            ResponseCode::Refused => Some(ResolveError::Refused),
            ResponseCode::NotImp => Some(ResolveError::NotImplemented),
            ResponseCode::FormErr => Some(ResolveError::FormatError),
            _ => Some(ResolveError::ServerFailure),
        }
    }

    pub fn rcode_to_status(rcode: ResponseCode) -> &'static str {
        match rcode {
            ResponseCode::NoError => "NOERROR",
            ResponseCode::NXDomain => "NXDOMAIN",
            ResponseCode::ServFail => "SERVFAIL",
            ResponseCode::Refused => "REFUSED",
            ResponseCode::NotImp => "NOTIMP",
            ResponseCode::FormErr => "FORMERR",
            _ => "UNKNOWN",
        }
    }
}
