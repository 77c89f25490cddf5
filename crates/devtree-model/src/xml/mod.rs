//! XML codecs
//!
//! Every document is stored in the run codepage with a declaration naming
//! it. Reading detects the codepage from that declaration.

pub mod component;
pub mod fragment;
pub mod header;
pub mod package;
pub mod records;

use std::sync::LazyLock;

use regex::bytes::Regex;

use crate::{Codepage, Result};
use fragment::{Declaration, Fragment};

pub use fragment::{Element, Node};

static ENCODING_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*<\?xml[^>]*encoding\s*=\s*["']([^"']+)["']"#).expect("valid regex")
});

/// Codepage declared by a document, if it names one of the known encodings.
pub fn declared_codepage(bytes: &[u8]) -> Option<Codepage> {
    let head = &bytes[..bytes.len().min(256)];
    let caps = ENCODING_ATTR.captures(head)?;
    let label = std::str::from_utf8(caps.get(1)?.as_bytes()).ok()?;
    Codepage::from_label(label)
}

/// Decode and parse a document stored in `codepage`.
pub fn parse_document(bytes: &[u8], codepage: Codepage, context: &str) -> Result<Fragment> {
    let text = codepage.decode_bytes(bytes);
    Fragment::parse(&text, context)
}

/// Serialize `root` indented, with a declaration, into `codepage` bytes.
pub fn write_document(root: Element, codepage: Codepage) -> Result<Vec<u8>> {
    let fragment = Fragment {
        declaration: Some(Declaration::new(codepage.label())),
        root,
    };
    let text = fragment.to_indented_string()?;
    Ok(codepage.encode_str(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_codepage_reads_declaration() {
        let doc = br#"<?xml version="1.0" encoding="windows-1250"?><Components/>"#;
        assert_eq!(declared_codepage(doc), Some(Codepage::English));
        assert_eq!(declared_codepage(b"<Components/>"), None);
    }

    #[test]
    fn documents_are_encoded_in_codepage() {
        let mut root = Element::new("Dialog");
        root.set_attr("DisplayValue", "Диалог");
        let bytes = write_document(root.clone(), Codepage::Russian).unwrap();

        assert!(std::str::from_utf8(&bytes).is_err());
        assert_eq!(declared_codepage(&bytes), Some(Codepage::Russian));
        let parsed = parse_document(&bytes, Codepage::Russian, "test").unwrap();
        assert_eq!(parsed.root, root);
    }
}
