//! Reference records
//!
//! Wizards, route templates and their groups and roles travel as reference
//! records rather than package components. A [`RecordRef`] is a flat list
//! of [`Requisite`]s; a requisite may itself point at another record.

use devtree_fs::{NormalizedPath, io};

use crate::{Codepage, Error, Result, TEXT_KIND};

/// A named value of a reference record.
///
/// Long payloads are held encoded in `opaque` (base64 over codepage bytes),
/// like [`crate::Field`]. Unlike fields, a blank payload is not stored at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requisite {
    pub name: String,
    pub value: Option<String>,
    /// Row number inside a detail section.
    pub number: Option<String>,
    pub kind: Option<String>,
    pub record: Option<Box<RecordRef>>,
    pub opaque: Option<String>,
}

impl Requisite {
    pub fn scalar(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// A text requisite whose payload encodes `text`.
    pub fn text(name: impl Into<String>, codepage: Codepage, text: Option<&str>) -> Self {
        let mut requisite = Self {
            name: name.into(),
            kind: Some(TEXT_KIND.into()),
            ..Self::default()
        };
        requisite.set_decoded(codepage, text);
        requisite
    }

    /// A text requisite loaded from a side file; a missing file leaves it empty.
    pub fn from_file(name: impl Into<String>, codepage: Codepage, path: &NormalizedPath) -> Result<Self> {
        let text = io::read_optional(path)?.map(|bytes| codepage.decode_bytes(&bytes));
        Ok(Self::text(name, codepage, text.as_deref()))
    }

    pub fn is_text(&self) -> bool {
        self.kind.as_deref() == Some(TEXT_KIND)
    }

    pub fn decoded(&self, codepage: Codepage) -> Result<Option<String>> {
        codepage
            .decode_opaque(self.opaque.as_deref())
            .map_err(|e| Error::Payload {
                field: self.name.clone(),
                message: e.to_string(),
            })
    }

    /// Replace the payload. Blank text clears it.
    pub fn set_decoded(&mut self, codepage: Codepage, text: Option<&str>) {
        self.opaque = match text {
            Some(text) if !text.trim().is_empty() => Some(codepage.encode_opaque(Some(text))),
            _ => None,
        };
    }

    /// Move the decoded payload into `value`.
    pub fn prepare_for_export(&mut self, codepage: Codepage) -> Result<()> {
        if let Some(text) = self.decoded(codepage)? {
            self.value = Some(text);
        }
        self.opaque = None;
        Ok(())
    }

    /// For text requisites, encode `value` back into the payload.
    pub fn prepare_for_import(&mut self, codepage: Codepage) {
        if self.is_text() {
            let value = self.value.take();
            self.set_decoded(codepage, value.as_deref());
        }
    }
}

/// One reference record: its reference name (`Vid`), code and name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordRef {
    pub reference: String,
    pub code: String,
    pub name: Option<String>,
    pub requisites: Vec<Requisite>,
}

impl RecordRef {
    pub fn new(reference: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            code: code.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_requisite(mut self, requisite: Requisite) -> Self {
        self.requisites.push(requisite);
        self
    }

    pub fn requisite(&self, name: &str) -> Option<&Requisite> {
        self.requisites.iter().find(|r| r.name == name)
    }

    pub fn requisite_mut(&mut self, name: &str) -> Option<&mut Requisite> {
        self.requisites.iter_mut().find(|r| r.name == name)
    }

    /// Drop every requisite whose name is listed.
    pub fn remove_names<S: AsRef<str>>(&mut self, names: &[S]) {
        self.requisites
            .retain(|r| !names.iter().any(|n| n.as_ref() == r.name));
    }

    pub fn prepare_for_export(&mut self, codepage: Codepage) -> Result<()> {
        self.requisites
            .iter_mut()
            .try_for_each(|r| r.prepare_for_export(codepage))
    }

    pub fn prepare_for_import(&mut self, codepage: Codepage) {
        for requisite in &mut self.requisites {
            requisite.prepare_for_import(codepage);
        }
    }
}

/// Content of a reference-record file: records in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    pub records: Vec<RecordRef>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_stores_no_payload() {
        let cp = Codepage::Russian;
        assert_eq!(Requisite::text("ISBEvent", cp, Some("  ")).opaque, None);
        assert!(Requisite::text("ISBEvent", cp, Some("x")).opaque.is_some());
    }

    #[test]
    fn prepare_roundtrip_restores_payload() {
        let cp = Codepage::English;
        let mut requisite = Requisite::text("ISBSearchCondition", cp, Some("line\r\nnext"));
        let original = requisite.clone();

        requisite.prepare_for_export(cp).unwrap();
        assert_eq!(requisite.value.as_deref(), Some("line\r\nnext"));
        assert_eq!(requisite.opaque, None);

        requisite.prepare_for_import(cp);
        assert_eq!(requisite, original);
    }

    #[test]
    fn remove_names_keeps_others() {
        let mut record = RecordRef::new("ТМТ", "R1")
            .with_requisite(Requisite::scalar("ИД", "12"))
            .with_requisite(Requisite::scalar("Наименование", "Route"));
        record.remove_names(&["ИД", "LastUpdate"]);
        assert_eq!(record.requisites.len(), 1);
        assert!(record.requisite("Наименование").is_some());
    }
}
