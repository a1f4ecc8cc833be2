//! CAN frame value type

use std::fmt;

use serde::{Deserialize, Serialize};

/// CAN arbitration identifier
pub type CanId = u32;

/// Largest 11-bit (standard) identifier
pub const STANDARD_ID_MAX: CanId = 0x7FF;

/// Largest 29-bit (extended) identifier
pub const EXTENDED_ID_MAX: CanId = 0x1FFF_FFFF;

/// Maximum payload of a classical CAN data frame
pub const CLASSIC_MAX_DLC: usize = 8;

/// One CAN message: arbitration identifier plus payload bytes
///
/// Frames are immutable once constructed. The payload length is not checked
/// here; transports that cannot carry more than [`CLASSIC_MAX_DLC`] bytes
/// reject oversized frames at write time.
///
/// In JSON the payload may be given as an array of byte values, as a base64
/// string (standard alphabet, padded), or as a `0x`-prefixed hex string. It is
/// always serialized as an array.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Frame {
    id: CanId,
    #[serde(default, deserialize_with = "payload::deserialize")]
    data: Vec<u8>,
}

impl Frame {
    pub fn new(id: CanId, data: impl Into<Vec<u8>>) -> Self {
        Self {
            id,
            data: data.into(),
        }
    }

    /// Arbitration identifier
    pub fn id(&self) -> CanId {
        self.id
    }

    /// Payload bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the identifier needs the 29-bit extended format
    pub fn is_extended(&self) -> bool {
        self.id > STANDARD_ID_MAX
    }

    /// Whether the frame fits a classical CAN data frame (valid id, at most 8 bytes)
    pub fn is_classic(&self) -> bool {
        self.id <= EXTENDED_ID_MAX && self.data.len() <= CLASSIC_MAX_DLC
    }

    /// Consume the frame, returning its parts
    pub fn into_parts(self) -> (CanId, Vec<u8>) {
        (self.id, self.data)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_extended() {
            write!(f, "ID=0x{:08X} Data=[", self.id)?;
        } else {
            write!(f, "ID=0x{:03X} Data=[", self.id)?;
        }
        for (i, byte) in self.data.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        f.write_str("]")
    }
}

/// Parse a CAN identifier from decimal or `0x`-prefixed hex
///
/// Any `u32` is accepted, matching what [`Frame`] carries; transports that
/// cannot put an identifier on the wire reject it when writing.
pub fn parse_can_id(s: &str) -> Result<CanId, String> {
    let s = s.trim();
    let (digits, radix) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (s, 10),
    };

    CanId::from_str_radix(digits, radix).map_err(|e| format!("Invalid CAN ID '{}': {}", s, e))
}

mod payload {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::de::{self, Deserializer, SeqAccess, Visitor};
    use std::fmt;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(PayloadVisitor)
    }

    struct PayloadVisitor;

    impl<'de> Visitor<'de> for PayloadVisitor {
        type Value = Vec<u8>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an array of bytes, a base64 string or a 0x-prefixed hex string")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            let cleaned: String = v.chars().filter(|c| !c.is_whitespace()).collect();
            match cleaned
                .strip_prefix("0x")
                .or_else(|| cleaned.strip_prefix("0X"))
            {
                Some(digits) => hex::decode(digits)
                    .map_err(|e| E::custom(format!("invalid hex payload: {}", e))),
                None => STANDARD
                    .decode(&cleaned)
                    .map_err(|e| E::custom(format!("invalid base64 payload: {}", e))),
            }
        }

        fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
            Ok(v.to_vec())
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut out = Vec::with_capacity(seq.size_hint().unwrap_or(8));
            while let Some(byte) = seq.next_element::<u8>()? {
                out.push(byte);
            }
            Ok(out)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_array_payload() {
        let frame: Frame = serde_json::from_str(r#"{"id":291,"data":[1,2,3,4]}"#).unwrap();
        assert_eq!(frame.id(), 0x123);
        assert_eq!(frame.data(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_deserialize_base64_payload() {
        let frame: Frame = serde_json::from_str(r#"{"id":291,"data":"CQoLDA=="}"#).unwrap();
        assert_eq!(frame, Frame::new(0x123, vec![9, 10, 11, 12]));

        // Digits without a prefix are base64, not hex
        let frame: Frame = serde_json::from_str(r#"{"id":291,"data":"ESIzRA=="}"#).unwrap();
        assert_eq!(frame.data(), &[0x11, 0x22, 0x33, 0x44]);

        let frame: Frame = serde_json::from_str(r#"{"id":291,"data":""}"#).unwrap();
        assert!(frame.is_empty());

        let err = serde_json::from_str::<Frame>(r#"{"id":291,"data":"not base64!"}"#).unwrap_err();
        assert!(err.to_string().contains("invalid base64 payload"));
    }

    #[test]
    fn test_deserialize_prefixed_hex_payload() {
        let frame: Frame = serde_json::from_str(r#"{"id":292,"data":"0x0d0E 0f10"}"#).unwrap();
        assert_eq!(frame.data(), &[0x0D, 0x0E, 0x0F, 0x10]);

        let frame: Frame = serde_json::from_str(r#"{"id":1,"data":"0XAABB"}"#).unwrap();
        assert_eq!(frame.data(), &[0xAA, 0xBB]);
    }

    #[test]
    fn test_missing_or_null_payload_is_empty() {
        let frame: Frame = serde_json::from_str(r#"{"id":1}"#).unwrap();
        assert!(frame.is_empty());
        let frame: Frame = serde_json::from_str(r#"{"id":1,"data":null}"#).unwrap();
        assert!(frame.is_empty());
    }

    #[test]
    fn test_serializes_payload_as_array() {
        let json = serde_json::to_value(Frame::new(0x123, vec![9, 10])).unwrap();
        assert_eq!(json, serde_json::json!({"id": 291, "data": [9, 10]}));
    }

    #[test]
    fn test_classic_limits() {
        assert!(Frame::new(0x7FF, vec![0; 8]).is_classic());
        assert!(!Frame::new(0x7FF, vec![0; 9]).is_classic());
        assert!(!Frame::new(0x2000_0000, vec![]).is_classic());
        assert!(Frame::new(0x800, vec![]).is_extended());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Frame::new(0x123, vec![1, 2, 0xAB]).to_string(),
            "ID=0x123 Data=[01 02 AB]"
        );
        assert_eq!(
            Frame::new(0x18DAF110, vec![]).to_string(),
            "ID=0x18DAF110 Data=[]"
        );
    }

    #[test]
    fn test_parse_can_id() {
        assert_eq!(parse_can_id("291"), Ok(0x123));
        assert_eq!(parse_can_id("0x123"), Ok(0x123));
        assert_eq!(parse_can_id(" 0X7ff "), Ok(0x7FF));
        assert!(parse_can_id("abc").is_err());
        assert_eq!(parse_can_id("0x20000000"), Ok(0x2000_0000));
        assert_eq!(parse_can_id("4294967295"), Ok(u32::MAX));
        assert!(parse_can_id("4294967296").is_err());
        assert!(parse_can_id("0x").is_err());
    }
}
