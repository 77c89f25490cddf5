//! Component element layout shared by the package and header files
//!
//! ```xml
//! <Dialog KeyValue="D1" DisplayValue="Dialog">
//!   <Requisites>
//!     <Requisite Code="Code" Текст="Text"><![CDATA[...]]></Requisite>
//!   </Requisites>
//!   <DetailDataSet>
//!     <DetailDataSet1>
//!       <Requisites>...</Requisites>
//!     </DetailDataSet1>
//!   </DetailDataSet>
//! </Dialog>
//! ```

use crate::xml::fragment::{Element, Node};
use crate::{Component, Field, Result, Row, SECTION_COUNT, Section};

const REQUISITES: &str = "Requisites";
const REQUISITE: &str = "Requisite";
const DETAIL_DATA_SET: &str = "DetailDataSet";

fn field_to_element(field: &Field) -> Element {
    let mut element = Element::new(REQUISITE)
        .with_attr("Code", Some(field.code.as_str()))
        .with_attr("Value", field.value.as_deref())
        .with_attr("ValueLocalizeID", field.value_localize_id.as_deref())
        .with_attr("Текст", field.kind_ru.as_deref())
        .with_attr("Text", field.kind_en.as_deref());
    if let Some(opaque) = &field.opaque {
        element.children.push(Node::CData(opaque.clone()));
    }
    element
}

fn field_from_element(element: &Element) -> Field {
    let owned = |name: &str| element.attr(name).map(str::to_string);
    Field {
        code: element.attr("Code").unwrap_or_default().to_string(),
        value: owned("Value"),
        value_localize_id: owned("ValueLocalizeID"),
        kind_ru: owned("Текст"),
        kind_en: owned("Text"),
        opaque: element.text().map(str::to_string),
    }
}

fn row_to_element(row: &Row) -> Element {
    let mut element = Element::new(REQUISITES);
    for field in row {
        element.push(field_to_element(field));
    }
    element
}

fn row_from_element(element: &Element) -> Row {
    element
        .elements()
        .filter(|e| e.name == REQUISITE)
        .map(field_from_element)
        .collect()
}

/// Build the element for `component` under the given element name.
pub fn component_to_element(name: &str, component: &Component) -> Element {
    let mut element = Element::new(name)
        .with_attr("KeyValue", Some(component.key.as_str()))
        .with_attr("DisplayValue", component.display.as_deref())
        .with_attr("ReferenceName", component.reference_name.as_deref());
    element.push(row_to_element(&component.card));

    if component.has_sections() {
        let mut details = Element::new(DETAIL_DATA_SET);
        for (index, section) in component.sections() {
            let mut set = Element::new(format!("{DETAIL_DATA_SET}{index}"));
            for row in &section.rows {
                set.push(row_to_element(row));
            }
            details.push(set);
        }
        element.push(details);
    }
    element
}

/// Read a component from its element, whatever the element is named.
pub fn component_from_element(element: &Element) -> Result<Component> {
    let mut component = Component::new(element.attr("KeyValue").unwrap_or_default());
    component.display = element.attr("DisplayValue").map(str::to_string);
    component.reference_name = element.attr("ReferenceName").map(str::to_string);
    if let Some(card) = element.child(REQUISITES) {
        component.card = row_from_element(card);
    }

    if let Some(details) = element.child(DETAIL_DATA_SET) {
        for index in 1..=SECTION_COUNT {
            if let Some(set) = details.child(&format!("{DETAIL_DATA_SET}{index}")) {
                let rows = set
                    .elements()
                    .filter(|e| e.name == REQUISITES)
                    .map(row_from_element)
                    .collect();
                component.set_section(index, Section::new(rows))?;
            }
        }
    }
    Ok(component)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Codepage;

    #[test]
    fn component_roundtrips_through_element() {
        let cp = Codepage::Russian;
        let component = Component::new("D1")
            .with_card(Row::from_fields([
                Field::text("Наименование", cp, Some("Диалог")),
                Field::scalar("Code", "D1"),
            ]))
            .with_section(
                7,
                Section::new(vec![Row::from_fields([Field::scalar("Name", "Run")])]),
            )
            .unwrap();

        let element = component_to_element("Dialog", &component);
        assert_eq!(element.name, "Dialog");
        assert_eq!(component_from_element(&element).unwrap(), component);
    }
}
