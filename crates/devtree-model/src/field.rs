//! Fields and rows

use devtree_fs::{NormalizedPath, io};

use crate::{Codepage, Error, Result};

/// Kind tag marking a long-text field.
pub const TEXT_KIND: &str = "Text";

/// A named scalar-or-long-text value.
///
/// `value` holds short scalars. `opaque` holds long payloads in their encoded
/// form (base64 over codepage bytes) and is only read through
/// [`Field::decoded`]. The kind tag is stored once per vocabulary; the
/// active codepage decides which spelling is read and written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Field {
    pub code: String,
    pub value: Option<String>,
    pub value_localize_id: Option<String>,
    pub kind_ru: Option<String>,
    pub kind_en: Option<String>,
    pub opaque: Option<String>,
}

impl Field {
    /// A scalar field with a plain value.
    pub fn scalar(code: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// A field with only a code, no value and no payload.
    pub fn empty(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }

    /// A text field whose payload encodes `text`.
    pub fn text(code: impl Into<String>, codepage: Codepage, text: Option<&str>) -> Self {
        let mut field = Self::empty(code);
        field.set_kind(codepage, TEXT_KIND);
        field.set_decoded(codepage, text);
        field
    }

    /// A text field loaded from a side file.
    ///
    /// A missing file yields a text field without payload.
    pub fn from_file(code: impl Into<String>, codepage: Codepage, path: &NormalizedPath) -> Result<Self> {
        let mut field = Self::empty(code);
        field.set_kind(codepage, TEXT_KIND);
        if let Some(bytes) = io::read_optional(path)? {
            let text = codepage.decode_bytes(&bytes);
            field.set_decoded(codepage, Some(&text));
        }
        Ok(field)
    }

    pub fn kind(&self, codepage: Codepage) -> Option<&str> {
        match codepage {
            Codepage::Russian => self.kind_ru.as_deref(),
            Codepage::English => self.kind_en.as_deref(),
        }
    }

    pub fn set_kind(&mut self, codepage: Codepage, kind: impl Into<String>) {
        let slot = match codepage {
            Codepage::Russian => &mut self.kind_ru,
            Codepage::English => &mut self.kind_en,
        };
        *slot = Some(kind.into());
    }

    pub fn is_text(&self, codepage: Codepage) -> bool {
        self.kind(codepage) == Some(TEXT_KIND)
    }

    /// Decoded payload, or `None` when the payload is absent or blank.
    pub fn decoded(&self, codepage: Codepage) -> Result<Option<String>> {
        codepage
            .decode_opaque(self.opaque.as_deref())
            .map_err(|e| Error::Payload {
                field: self.code.clone(),
                message: e.to_string(),
            })
    }

    /// Replace the payload. Empty or absent text stores an empty payload.
    pub fn set_decoded(&mut self, codepage: Codepage, text: Option<&str>) {
        self.opaque = Some(codepage.encode_opaque(text));
    }

    /// Decoded payload if any, otherwise the plain value.
    pub fn text_or_value(&self, codepage: Codepage) -> Result<Option<String>> {
        Ok(self.decoded(codepage)?.or_else(|| self.value.clone()))
    }

    /// Move the decoded payload into `value` and drop the encoded form.
    pub fn prepare_for_export(&mut self, codepage: Codepage) -> Result<()> {
        if let Some(text) = self.decoded(codepage)? {
            self.value = Some(text);
        }
        self.opaque = None;
        Ok(())
    }

    /// For text fields, encode `value` back into the payload.
    pub fn prepare_for_import(&mut self, codepage: Codepage) {
        if self.is_text(codepage) {
            let value = self.value.take();
            self.set_decoded(codepage, value.as_deref());
        }
    }
}

/// An unordered set of fields with unique codes.
///
/// Insertion order is kept for serialization; equality ignores it.
#[derive(Debug, Clone, Default, Eq)]
pub struct Row {
    fields: Vec<Field>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row, keeping the last field for duplicated codes.
    pub fn from_fields(fields: impl IntoIterator<Item = Field>) -> Self {
        let mut row = Self::new();
        for field in fields {
            row.upsert(field);
        }
        row
    }

    pub fn get(&self, code: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.code == code)
    }

    pub fn get_mut(&mut self, code: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.code == code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    /// Insert a field, replacing any field with the same code in place.
    pub fn upsert(&mut self, field: Field) {
        match self.fields.iter_mut().find(|f| f.code == field.code) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
    }

    pub fn remove(&mut self, code: &str) -> Option<Field> {
        let index = self.fields.iter().position(|f| f.code == code)?;
        Some(self.fields.remove(index))
    }

    /// Drop every field whose code is listed.
    pub fn remove_codes<S: AsRef<str>>(&mut self, codes: &[S]) {
        self.fields
            .retain(|f| !codes.iter().any(|c| c.as_ref() == f.code));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Field> {
        self.fields.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Decoded text of `code`, falling back to its plain value.
    pub fn text(&self, code: &str, codepage: Codepage) -> Result<Option<String>> {
        match self.get(code) {
            Some(field) => field.text_or_value(codepage),
            None => Ok(None),
        }
    }

    pub fn prepare_for_export(&mut self, codepage: Codepage) -> Result<()> {
        self.fields
            .iter_mut()
            .try_for_each(|f| f.prepare_for_export(codepage))
    }

    pub fn prepare_for_import(&mut self, codepage: Codepage) {
        for field in &mut self.fields {
            field.prepare_for_import(codepage);
        }
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .all(|f| other.get(&f.code) == Some(f))
    }
}

impl FromIterator<Field> for Row {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Self::from_fields(iter)
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_replaces_same_code() {
        let mut row = Row::new();
        row.upsert(Field::scalar("Code", "A"));
        row.upsert(Field::scalar("Code", "B"));
        assert_eq!(row.len(), 1);
        assert_eq!(row.get("Code").unwrap().value.as_deref(), Some("B"));
    }

    #[test]
    fn equality_ignores_order() {
        let a = Row::from_fields([Field::scalar("A", "1"), Field::scalar("B", "2")]);
        let b = Row::from_fields([Field::scalar("B", "2"), Field::scalar("A", "1")]);
        assert_eq!(a, b);
    }

    #[test]
    fn prepare_roundtrip_restores_payload() {
        let cp = Codepage::Russian;
        let mut field = Field::text("Примечание", cp, Some("строка\r\nдве"));
        let original = field.clone();

        field.prepare_for_export(cp).unwrap();
        assert_eq!(field.value.as_deref(), Some("строка\r\nдве"));
        assert_eq!(field.opaque, None);

        field.prepare_for_import(cp);
        assert_eq!(field, original);
    }

    #[test]
    fn prepare_for_import_skips_scalars() {
        let cp = Codepage::English;
        let mut field = Field::scalar("Code", "X");
        field.prepare_for_import(cp);
        assert_eq!(field.value.as_deref(), Some("X"));
        assert_eq!(field.opaque, None);
    }
}
