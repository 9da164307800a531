//! JSON encoding of receipts.

use serde::{Deserialize, Serialize};

use lumen_core::Receipt;

use crate::error::WireError;
use crate::frame::FramingMode;

#[derive(Serialize)]
struct ReceiptOut<'a> {
    filepath: &'a str,
}

#[derive(Deserialize)]
struct ReceiptIn {
    filepath: String,
}

/// Encode a receipt as the payload of a single transport write.
///
/// In [`FramingMode::NewlineDelimited`] the payload ends with `\n`.
pub fn encode_receipt(receipt: &Receipt, framing: FramingMode) -> Result<Vec<u8>, WireError> {
    let mut bytes = serde_json::to_vec(&ReceiptOut {
        filepath: &receipt.filepath,
    })
    .map_err(|e| WireError::Encode {
        detail: e.to_string(),
    })?;
    if framing == FramingMode::NewlineDelimited {
        bytes.push(b'\n');
    }
    Ok(bytes)
}

/// Decode a receipt message. Surrounding whitespace is ignored.
pub fn decode_receipt(text: &str) -> Result<Receipt, WireError> {
    serde_json::from_str::<ReceiptIn>(text.trim())
        .map(|r| Receipt::new(r.filepath))
        .map_err(|e| WireError::MalformedReceipt {
            detail: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_single_field_object() {
        let bytes = encode_receipt(&Receipt::new("/tmp/abcde7.png"), FramingMode::PerRead).unwrap();
        assert_eq!(bytes, br#"{"filepath":"/tmp/abcde7.png"}"#.to_vec());
    }

    #[test]
    fn delimited_mode_appends_newline() {
        let bytes = encode_receipt(&Receipt::new("x.png"), FramingMode::NewlineDelimited).unwrap();
        assert_eq!(bytes.last(), Some(&b'\n'));
        let text = std::str::from_utf8(&bytes).unwrap();
        assert_eq!(decode_receipt(text).unwrap(), Receipt::new("x.png"));
    }

    #[test]
    fn escapes_windows_paths() {
        let receipt = Receipt::new(r"C:\renders\a1.png");
        let bytes = encode_receipt(&receipt, FramingMode::PerRead).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains(r"C:\\renders\\a1.png"));
        assert_eq!(decode_receipt(&text).unwrap(), receipt);
    }

    #[test]
    fn rejects_missing_filepath() {
        let err = decode_receipt(r#"{"path":"x"}"#).unwrap_err();
        assert!(matches!(err, WireError::MalformedReceipt { .. }));
    }
}
