//! Run-scoped text codepage

use std::borrow::Cow;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};

/// The text encoding governing one run.
///
/// Selects both the byte encoding of payloads and side files, and which of
/// the two field-code vocabularies (Cyrillic or Latin) is active. A value is
/// established once before a pass starts and passed explicitly everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codepage {
    /// windows-1251, Cyrillic vocabulary
    #[default]
    Russian,
    /// windows-1250, Latin vocabulary
    English,
}

impl Codepage {
    pub fn encoding(self) -> &'static Encoding {
        match self {
            Self::Russian => encoding_rs::WINDOWS_1251,
            Self::English => encoding_rs::WINDOWS_1250,
        }
    }

    /// Name used in XML declarations.
    pub fn label(self) -> &'static str {
        match self {
            Self::Russian => "windows-1251",
            Self::English => "windows-1250",
        }
    }

    /// Numeric codepage as the platform reports it.
    pub fn number(self) -> u16 {
        match self {
            Self::Russian => 1251,
            Self::English => 1250,
        }
    }

    /// Resolve an encoding label such as `windows-1251` or `cp1250`.
    ///
    /// Returns `None` for encodings that select neither vocabulary.
    pub fn from_label(label: &str) -> Option<Self> {
        let encoding = Encoding::for_label(label.trim().as_bytes())?;
        if encoding == encoding_rs::WINDOWS_1251 {
            Some(Self::Russian)
        } else if encoding == encoding_rs::WINDOWS_1250 {
            Some(Self::English)
        } else {
            None
        }
    }

    /// Pick the spelling of a field code for the active vocabulary.
    pub fn pick<'a>(self, russian: &'a str, english: &'a str) -> &'a str {
        match self {
            Self::Russian => russian,
            Self::English => english,
        }
    }

    pub fn is_russian(self) -> bool {
        self == Self::Russian
    }

    pub fn decode_bytes(self, bytes: &[u8]) -> String {
        let (text, _) = self.encoding().decode_without_bom_handling(bytes);
        text.into_owned()
    }

    pub fn encode_str(self, text: &str) -> Vec<u8> {
        let (bytes, _, _) = self.encoding().encode(text);
        match bytes {
            Cow::Borrowed(b) => b.to_vec(),
            Cow::Owned(b) => b,
        }
    }

    /// Decode an opaque payload: base64 over codepage bytes.
    ///
    /// Absent or whitespace-only input yields `None`.
    pub fn decode_opaque(self, raw: Option<&str>) -> Result<Option<String>, base64::DecodeError> {
        let Some(raw) = raw else {
            return Ok(None);
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = STANDARD.decode(compact)?;
        Ok(Some(self.decode_bytes(&bytes)))
    }

    /// Encode text into an opaque payload. Empty or absent text yields `""`.
    pub fn encode_opaque(self, text: Option<&str>) -> String {
        match text {
            Some(text) if !text.is_empty() => STANDARD.encode(self.encode_str(text)),
            _ => String::new(),
        }
    }
}

impl std::fmt::Display for Codepage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
