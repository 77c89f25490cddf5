//! Reference-record documents
//!
//! ```xml
//! <ROOT Version="2.0">
//!   <RecordRef Vid="ТМТ" Kod="R1" Name="Approval">
//!     <Requisite Name="Наименование" Value="Approval" />
//!     <Requisite Name="Примечание" Type="Text"><![CDATA[...]]></Requisite>
//!   </RecordRef>
//! </ROOT>
//! ```
//!
//! A record's `Card.xml` holds the same `RecordRef` element renamed after
//! its record kind.

use super::{declared_codepage, parse_document, write_document};
use crate::xml::fragment::{Element, Node};
use crate::{Codepage, Error, RecordRef, RecordSet, Requisite, Result};

const ROOT: &str = "ROOT";
const VERSION: &str = "2.0";
const RECORD_REF: &str = "RecordRef";
const REQUISITE: &str = "Requisite";

fn requisite_to_element(requisite: &Requisite) -> Element {
    let mut element = Element::new(REQUISITE)
        .with_attr("Name", Some(requisite.name.as_str()))
        .with_attr("Value", requisite.value.as_deref())
        .with_attr("NumStr", requisite.number.as_deref())
        .with_attr("Type", requisite.kind.as_deref());
    if let Some(record) = &requisite.record {
        element.push(record_to_element(RECORD_REF, record));
    }
    if let Some(opaque) = &requisite.opaque {
        element.children.push(Node::CData(opaque.clone()));
    }
    element
}

fn requisite_from_element(element: &Element) -> Requisite {
    let owned = |name: &str| element.attr(name).map(str::to_string);
    Requisite {
        name: element.attr("Name").unwrap_or_default().to_string(),
        value: owned("Value"),
        number: owned("NumStr"),
        kind: owned("Type"),
        record: element
            .child(RECORD_REF)
            .map(|child| Box::new(record_from_element(child))),
        opaque: element.text().map(str::to_string),
    }
}

/// Build a record element under the given element name.
pub fn record_to_element(name: &str, record: &RecordRef) -> Element {
    let mut element = Element::new(name)
        .with_attr("Vid", Some(record.reference.as_str()))
        .with_attr("Kod", Some(record.code.as_str()))
        .with_attr("Name", record.name.as_deref());
    for requisite in &record.requisites {
        element.push(requisite_to_element(requisite));
    }
    element
}

/// Read a record from its element, whatever the element is named.
pub fn record_from_element(element: &Element) -> RecordRef {
    RecordRef {
        reference: element.attr("Vid").unwrap_or_default().to_string(),
        code: element.attr("Kod").unwrap_or_default().to_string(),
        name: element.attr("Name").map(str::to_string),
        requisites: element
            .elements()
            .filter(|e| e.name == REQUISITE)
            .map(requisite_from_element)
            .collect(),
    }
}

/// Read a record file, detecting its codepage from the declaration.
pub fn read_records(bytes: &[u8], default: Codepage) -> Result<(RecordSet, Codepage)> {
    let codepage = declared_codepage(bytes).unwrap_or(default);
    let root = parse_document(bytes, codepage, ROOT)?.root;
    if root.name != ROOT {
        return Err(Error::malformed(
            ROOT,
            format!("unexpected root element '{}'", root.name),
        ));
    }
    let records = root
        .elements()
        .filter(|e| e.name == RECORD_REF)
        .map(record_from_element)
        .collect();
    Ok((RecordSet { records }, codepage))
}

pub fn write_records(set: &RecordSet, codepage: Codepage) -> Result<Vec<u8>> {
    let mut root = Element::new(ROOT);
    root.set_attr("Version", VERSION);
    for record in &set.records {
        root.push(record_to_element(RECORD_REF, record));
    }
    write_document(root, codepage)
}

/// Serialize a record's `Card.xml` under the record kind's element name.
pub fn write_record_card(element: &str, record: &RecordRef, codepage: Codepage) -> Result<Vec<u8>> {
    write_document(record_to_element(element, record), codepage)
}

pub fn read_record_card(bytes: &[u8], codepage: Codepage) -> Result<RecordRef> {
    let codepage = declared_codepage(bytes).unwrap_or(codepage);
    let document = parse_document(bytes, codepage, "Card.xml")?;
    Ok(record_from_element(&document.root))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(cp: Codepage) -> RecordSet {
        let group = RecordRef::new("ГТМ", "G1").with_name("Согласования");
        let route = RecordRef::new("ТМТ", "R1")
            .with_name("Approval")
            .with_requisite(Requisite::scalar("Наименование", "Approval"))
            .with_requisite(Requisite {
                record: Some(Box::new(group.clone())),
                ..Requisite::scalar("ГруппаТМ", "G1")
            })
            .with_requisite(Requisite::text("Примечание", cp, Some("Маршрут")));
        RecordSet {
            records: vec![group, route],
        }
    }

    #[test]
    fn records_roundtrip_with_nested_reference() {
        let cp = Codepage::Russian;
        let set = sample(cp);
        let bytes = write_records(&set, cp).unwrap();
        let text = cp.decode_bytes(&bytes);

        assert!(text.contains(r#"<ROOT Version="2.0">"#));
        let (read, detected) = read_records(&bytes, Codepage::English).unwrap();
        assert_eq!(detected, cp);
        assert_eq!(read, set);
    }

    #[test]
    fn card_names_root_after_kind() {
        let cp = Codepage::English;
        let record = RecordRef::new("WIZARDS", "W1").with_requisite(Requisite::scalar("Kod", "W1"));
        let bytes = write_record_card("Wizard", &record, cp).unwrap();

        assert!(cp.decode_bytes(&bytes).contains(r#"<Wizard Vid="WIZARDS" Kod="W1">"#));
        assert_eq!(read_record_card(&bytes, cp).unwrap(), record);
    }

    #[test]
    fn foreign_root_is_rejected() {
        let doc = br#"<?xml version="1.0" encoding="windows-1251"?><Components/>"#;
        assert!(read_records(doc, Codepage::Russian).is_err());
    }
}
