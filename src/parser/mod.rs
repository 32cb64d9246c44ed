pub mod binary;
pub mod xml;

use std::path::Path;

use serde::Serialize;

use crate::error::{ConvertError, Result};
use crate::instance::InstanceTree;

pub use binary::{BinaryDecoder, UnavailableDecoder, BINARY_MAGIC};
pub use xml::parse_xml;

/// The two encodings Roblox Studio saves places and models in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SceneFormat {
    Xml,
    Binary,
}

/// Works out how a scene file is encoded.
///
/// The binary header always wins; otherwise the extension decides, and files
/// with an unknown extension are sniffed for an XML `<roblox` document element.
pub fn detect_format(path: &Path, bytes: &[u8]) -> Result<SceneFormat> {
    if binary::has_binary_magic(bytes) {
        return Ok(SceneFormat::Binary);
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("rbxmx") | Some("rbxlx") => return Ok(SceneFormat::Xml),
        Some("rbxm") | Some("rbxl") => return Ok(SceneFormat::Binary),
        _ => {}
    }

    let text = String::from_utf8_lossy(&bytes[..bytes.len().min(512)]);
    let text = text.trim_start_matches('\u{feff}').trim_start();
    let text = match text.strip_prefix("<?xml") {
        Some(rest) => rest.split_once("?>").map_or("", |(_, after)| after).trim_start(),
        None => text,
    };
    if text.starts_with("<roblox") {
        return Ok(SceneFormat::Xml);
    }

    Err(ConvertError::Format(format!(
        "{} is not a Roblox place or model. Expected .rbxmx, .rbxlx, .rbxm or .rbxl",
        path.display()
    )))
}

/// Decodes an in-memory scene of a known format.
pub fn decode_scene(
    format: SceneFormat,
    bytes: &[u8],
    decoder: &dyn BinaryDecoder,
) -> Result<InstanceTree> {
    match format {
        SceneFormat::Xml => {
            let text = std::str::from_utf8(bytes).map_err(|e| {
                ConvertError::Format(format!("XML scene is not valid UTF-8: {e}"))
            })?;
            parse_xml(text)
        }
        SceneFormat::Binary => decoder.decode(bytes),
    }
}

/// Reads and parses a scene file from disk.
pub fn load_scene(path: &Path, decoder: &dyn BinaryDecoder) -> Result<(SceneFormat, InstanceTree)> {
    let bytes = std::fs::read(path).map_err(|e| ConvertError::fs(path, e))?;
    let format = detect_format(path, &bytes)?;
    tracing::debug!("Loading {} as {:?}", path.display(), format);
    let tree = decode_scene(format, &bytes, decoder)?;
    Ok((format, tree))
}

/// Checks whether a scene file can be converted, without writing anything.
pub fn probe(path: &Path, decoder: &dyn BinaryDecoder) -> Result<SceneFormat> {
    load_scene(path, decoder).map(|(format, _)| format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const XML: &[u8] = br#"<roblox version="4"><Item class="Script" referent="RBX0"/></roblox>"#;

    #[test]
    fn test_detect_by_extension() {
        assert_eq!(
            detect_format(&PathBuf::from("place.rbxlx"), XML).unwrap(),
            SceneFormat::Xml
        );
        assert_eq!(
            detect_format(&PathBuf::from("Model.RBXMX"), XML).unwrap(),
            SceneFormat::Xml
        );
        assert_eq!(
            detect_format(&PathBuf::from("place.rbxl"), b"garbage").unwrap(),
            SceneFormat::Binary
        );
    }

    #[test]
    fn test_detect_magic_beats_extension() {
        assert_eq!(
            detect_format(&PathBuf::from("place.rbxlx"), b"<roblox!\x89\xff").unwrap(),
            SceneFormat::Binary
        );
    }

    #[test]
    fn test_detect_sniffs_unknown_extension() {
        let with_decl = b"\xef\xbb\xbf<?xml version=\"1.0\"?>\n<roblox version=\"4\"></roblox>";
        assert_eq!(
            detect_format(&PathBuf::from("scene.xml"), with_decl).unwrap(),
            SceneFormat::Xml
        );
        assert!(matches!(
            detect_format(&PathBuf::from("notes.txt"), b"hello"),
            Err(ConvertError::Format(_))
        ));
    }

    #[test]
    fn test_probe_reports_binary_as_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let binary = dir.path().join("place.rbxl");
        std::fs::write(&binary, b"<roblox!\x89\xff\r\n\x1a\n\0\0").unwrap();
        let xml = dir.path().join("model.rbxmx");
        std::fs::write(&xml, XML).unwrap();

        assert!(matches!(
            probe(&binary, &UnavailableDecoder),
            Err(ConvertError::Format(_))
        ));
        assert_eq!(probe(&xml, &UnavailableDecoder).unwrap(), SceneFormat::Xml);
    }

    #[test]
    fn test_missing_file_is_filesystem_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = probe(&dir.path().join("missing.rbxmx"), &UnavailableDecoder).unwrap_err();
        assert!(matches!(err, ConvertError::Filesystem { .. }));
    }
}
