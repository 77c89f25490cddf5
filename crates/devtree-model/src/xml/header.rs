//! Per-component header files (`Card.xml`)

use super::component::{component_from_element, component_to_element};
use super::{declared_codepage, parse_document, write_document};
use crate::xml::fragment::Element;
use crate::{Codepage, Component, Error, Result};

const GROUP_ROOT: &str = "LocalizationStrings";
const GROUP_ITEM: &str = "LocalizationString";

/// Serialize a component header under the kind's element name.
pub fn write_header(element: &str, component: &Component, codepage: Codepage) -> Result<Vec<u8>> {
    write_document(component_to_element(element, component), codepage)
}

/// Parse a component header. The root element name is not checked.
pub fn read_header(bytes: &[u8], codepage: Codepage) -> Result<Component> {
    let codepage = declared_codepage(bytes).unwrap_or(codepage);
    let document = parse_document(bytes, codepage, "Card.xml")?;
    component_from_element(&document.root)
}

/// Serialize a group of localization strings into one header.
pub fn write_group_header(components: &[Component], codepage: Codepage) -> Result<Vec<u8>> {
    let mut root = Element::new(GROUP_ROOT);
    for component in components {
        root.push(component_to_element(GROUP_ITEM, component));
    }
    write_document(root, codepage)
}

/// Parse a grouped header back into its components.
pub fn read_group_header(bytes: &[u8], codepage: Codepage) -> Result<Vec<Component>> {
    let codepage = declared_codepage(bytes).unwrap_or(codepage);
    let root = parse_document(bytes, codepage, "Card.xml")?.root;
    if root.name != GROUP_ROOT {
        return Err(Error::malformed(
            GROUP_ROOT,
            format!("unexpected root element '{}'", root.name),
        ));
    }
    root.elements()
        .filter(|e| e.name == GROUP_ITEM)
        .map(component_from_element)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Field, Row};

    #[test]
    fn header_names_root_after_kind() {
        let component =
            Component::new("D1").with_card(Row::from_fields([Field::scalar("Code", "D1")]));
        let bytes = write_header("Dialog", &component, Codepage::English).unwrap();
        let text = Codepage::English.decode_bytes(&bytes);

        assert!(text.starts_with(r#"<?xml version="1.0" encoding="windows-1250"?>"#));
        assert!(text.contains(r#"<Dialog KeyValue="D1">"#));
        assert_eq!(read_header(&bytes, Codepage::English).unwrap(), component);
    }

    #[test]
    fn group_header_roundtrips() {
        let strings = vec![Component::new("A"), Component::new("B")];
        let bytes = write_group_header(&strings, Codepage::Russian).unwrap();
        assert_eq!(read_group_header(&bytes, Codepage::Russian).unwrap(), strings);
    }
}
