use crate::error::{ConvertError, Result};
use crate::instance::InstanceTree;

/// Every binary place/model starts with these bytes.
pub const BINARY_MAGIC: &[u8; 8] = b"<roblox!";

/// Guidance shown whenever a binary scene cannot be decoded.
pub const REEXPORT_HINT: &str = "Binary files (.rbxm/.rbxl) are not supported yet.\n\n\
To convert your file in Roblox Studio:\n\
1. Open the .rbxl/.rbxm file in Roblox Studio\n\
2. File → Save to File As...\n\
3. Choose 'Place Files (*.rbxlx)' or 'Model Files (*.rbxmx)'\n\
4. Convert the XML version instead";

pub fn has_binary_magic(bytes: &[u8]) -> bool {
    bytes.starts_with(BINARY_MAGIC)
}

/// An external decoder for the binary scene format.
pub trait BinaryDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<InstanceTree>;
}

/// The decoder used when no binary backend is available.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableDecoder;

impl BinaryDecoder for UnavailableDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<InstanceTree> {
        if !has_binary_magic(bytes) {
            return Err(ConvertError::Format(
                "Invalid RBXL/RBXM file format: missing binary header".into(),
            ));
        }
        Err(ConvertError::Format(REEXPORT_HINT.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_detection() {
        assert!(has_binary_magic(b"<roblox!\x89\xff\r\n\x1a\n"));
        assert!(!has_binary_magic(b"<roblox xmlns:xmime="));
        assert!(!has_binary_magic(b"<rob"));
    }

    #[test]
    fn test_unavailable_decoder_explains_reexport() {
        let err = UnavailableDecoder.decode(b"<roblox!\x89\xff").unwrap_err();
        match err {
            ConvertError::Format(msg) => assert!(msg.contains(".rbxmx")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unavailable_decoder_rejects_bad_header() {
        let err = UnavailableDecoder.decode(b"PK\x03\x04").unwrap_err();
        match err {
            ConvertError::Format(msg) => assert!(msg.contains("missing binary header")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
