//! String formatting utilities.
//!
//! Provides hex prefix stripping, truncation of ids for log lines and
//! decoding of the hex-encoded error messages TRON nodes return.

/// Truncates an id for display, keeping the first 8 characters.
///
/// Counts characters rather than bytes, so ids the node returns with
/// non-ASCII content never split a code point.
pub fn truncate_id(id: &str) -> String {
	match id.char_indices().nth(8) {
		Some((end, _)) => format!("{}..", &id[..end]),
		None => id.to_string(),
	}
}

/// Removes a "0x" or "0X" prefix from a hex string if present.
pub fn without_0x_prefix(hex_str: &str) -> &str {
	hex_str
		.strip_prefix("0x")
		.or_else(|| hex_str.strip_prefix("0X"))
		.unwrap_or(hex_str)
}

/// Decodes a node error message.
///
/// Nodes hex-encode the UTF-8 text of `message` fields. Anything that is not
/// valid hex is returned as-is.
pub fn decode_node_message(message: &str) -> String {
	match hex::decode(without_0x_prefix(message)) {
		Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
		Err(_) => message.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_truncate_id() {
		assert_eq!(truncate_id("12345678"), "12345678");
		assert_eq!(truncate_id("123456789abc"), "12345678..");
	}

	#[test]
	fn test_truncate_id_multibyte() {
		// 'é' is two bytes and straddles byte 8
		assert_eq!(truncate_id("abcdefgé-tail"), "abcdefgé..");
		assert_eq!(truncate_id("ééééééé"), "ééééééé");
	}

	#[test]
	fn test_without_0x_prefix() {
		assert_eq!(without_0x_prefix("0Xab12"), "ab12");
		assert_eq!(without_0x_prefix("ab12"), "ab12");
	}

	#[test]
	fn test_decode_node_message() {
		// "REVERT opcode executed"
		assert_eq!(
			decode_node_message("524556455254206f70636f6465206578656375746564"),
			"REVERT opcode executed"
		);
		assert_eq!(
			decode_node_message("Contract validate error"),
			"Contract validate error"
		);
	}
}
