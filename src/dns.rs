use anyhow::{anyhow, Result};
use hickory_proto::op::{Message, MessageType, Query};
use hickory_proto::rr::{Name, RecordType};

/// Build a DNS query message for the given name and record type.
///
/// Returns the serialized query bytes ready to send over UDP.
pub fn build_query(name: &str, record_type: RecordType, txid: u16) -> Result<Vec<u8>> {
	let name = Name::from_ascii(name).map_err(|e| anyhow!("invalid domain name '{}': {}", name, e))?;

	let mut message = Message::new();
	message.set_id(txid);
	message.set_recursion_desired(true);
	message.add_query(Query::query(name, record_type));

	message
		.to_vec()
		.map_err(|e| anyhow!("failed to serialize DNS query: {}", e))
}

/// Parse a DNS response, validating the transaction ID and message type.
///
/// Unlike a benchmarking tool that only cares about the rcode, the proxy needs the
/// full parsed `Message` so the candidate extractor and rewriter can inspect and
/// edit the Answer section.
pub fn parse_response(bytes: &[u8], expected_txid: u16) -> Result<Message> {
	let message =
		Message::from_vec(bytes).map_err(|e| anyhow!("failed to parse DNS response: {}", e))?;

	if message.id() != expected_txid {
		return Err(anyhow!(
			"txid mismatch: expected {}, got {}",
			expected_txid,
			message.id()
		));
	}
	if message.message_type() != MessageType::Response {
		return Err(anyhow!("received a query instead of a response"));
	}

	Ok(message)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_build_a_query() {
		let bytes = build_query("example.com", RecordType::A, 1234).unwrap();
		assert!(bytes.len() >= 12);
		assert_eq!(bytes[0], (1234 >> 8) as u8);
		assert_eq!(bytes[1], (1234 & 0xff) as u8);
	}

	#[test]
	fn test_build_aaaa_query() {
		let bytes = build_query("example.com", RecordType::AAAA, 5678).unwrap();
		assert!(bytes.len() >= 12);
	}

	#[test]
	fn test_parse_valid_response() {
		let query_bytes = build_query("example.com", RecordType::A, 9999).unwrap();
		let mut response = Message::from_vec(&query_bytes).unwrap();
		response.set_message_type(MessageType::Response);
		let response_bytes = response.to_vec().unwrap();

		let parsed = parse_response(&response_bytes, 9999).unwrap();
		assert_eq!(parsed.message_type(), MessageType::Response);
	}

	#[test]
	fn test_txid_mismatch() {
		let query_bytes = build_query("example.com", RecordType::A, 1111).unwrap();
		let mut response = Message::from_vec(&query_bytes).unwrap();
		response.set_message_type(MessageType::Response);
		let response_bytes = response.to_vec().unwrap();

		let result = parse_response(&response_bytes, 2222);
		assert!(result.is_err());
		assert!(result.unwrap_err().to_string().contains("txid mismatch"));
	}

	#[test]
	fn test_truncated_buffer() {
		let bytes = vec![0u8; 5];
		assert!(parse_response(&bytes, 0).is_err());
	}
}
