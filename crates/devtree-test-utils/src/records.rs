//! Reference-record builders.
//!
//! Records whose requisites survive an export/import cycle unchanged: the
//! requisites import appends (structure, markup, calculation) come last.
//! Payload names and contents are exposed so tests can lay out the files a
//! route package ships next to its record files.

use devtree_model::{Codepage, RecordRef, RecordSet, Requisite, TEXT_KIND};

use crate::fixtures::MIME_MARKER;

/// Wizard structure in compact legacy form.
pub const WIZARD_STRUCTURE: &str = "object Wizard\r\n  Width = 100\r\nend\r\n";

/// Calculation script of [`role`].
pub const ROLE_CALCULATION: &str = "Result = Employees()\r\n";

pub fn wizard_group(code: &str) -> RecordRef {
    RecordRef::new("WIZARD_GROUPS", code)
        .with_name(format!("{code} group"))
        .with_requisite(Requisite::scalar("Наименование", code))
}

/// A wizard with a note and a structure.
pub fn wizard(code: &str, codepage: Codepage) -> RecordRef {
    RecordRef::new("WIZARDS", code)
        .with_name(format!("{code} wizard"))
        .with_requisite(Requisite::scalar("Наименование", code))
        .with_requisite(Requisite::text("Примечание", codepage, Some("Wizard note")))
        .with_requisite(Requisite::text(
            "ISBSearchCondition",
            codepage,
            Some(WIZARD_STRUCTURE),
        ))
}

/// A wizards package: one group, two wizards.
pub fn wizards(codepage: Codepage) -> RecordSet {
    RecordSet {
        records: vec![
            wizard_group("Contracts"),
            wizard("NewContract", codepage),
            wizard("CloseContract", codepage),
        ],
    }
}

pub fn route_group(code: &str) -> RecordRef {
    RecordRef::new("ГТМ", code)
        .with_name(format!("{code} routes"))
        .with_requisite(Requisite::scalar("Наименование", code))
}

/// A text requisite naming a payload file, as the platform ships it.
fn payload_requisite(name: &str, payload: String) -> Requisite {
    Requisite {
        name: name.into(),
        value: Some(payload),
        kind: Some(TEXT_KIND.into()),
        ..Requisite::default()
    }
}

/// Payload file holding the markup of route `code`.
pub fn route_payload(code: &str) -> String {
    format!("TipMarsh_ТМТ_{code}_ISBSearchCondition.IMG")
}

/// A route template in group `group` whose markup is [`route_properties`].
pub fn route(code: &str, group: &str) -> RecordRef {
    RecordRef::new("ТМТ", code)
        .with_name(format!("{code} route"))
        .with_requisite(Requisite::scalar("Наименование", code))
        .with_requisite(Requisite {
            record: Some(Box::new(RecordRef::new("ГТМ", group))),
            ..Requisite::scalar("ГруппаТМ", group)
        })
        .with_requisite(payload_requisite("ISBSearchCondition", route_payload(code)))
}

/// Route markup with a routed property, a plain property, an action, a
/// task event, a ribbon and two blocks, one of them unnamed.
pub fn route_properties(codepage: Codepage) -> String {
    let mime = |text: &str| format!("{MIME_MARKER}{}", codepage.encode_opaque(Some(text)));
    let action = codepage.encode_opaque(Some("Notify()\r\n"));
    format!(
        "<?xml version=\"1.0\" encoding=\"{label}\"?>\r\n<Settings>\
         <Properties>\
         <Property Name=\"BeforeStart\"><Value><Value>{start}</Value></Value></Property>\
         <Property Name=\"Title\"><Value><Value>{title}</Value></Value></Property>\
         </Properties>\
         <RouteActions><Action Code=\"Notify\"><ISBLText>{action}</ISBLText></Action></RouteActions>\
         <Event><InitScript><![CDATA[{init}]]></InitScript></Event>\
         <RouteRibbon><Value><![CDATA[object Ribbon]]></Value></RouteRibbon>\
         <Blocks>\
         <Block ID=\"1\" Name=\"Approve\">\
         <Properties><Property Name=\"Script\"><Value><Value>{calculation}</Value></Value></Property></Properties>\
         <Event><TaskStart><![CDATA[{task}]]></TaskStart></Event>\
         <Ribbon>BlockRibbon</Ribbon>\
         </Block>\
         <Block ID=\"2\"><Event><Script><![CDATA[{after}]]></Script></Event></Block>\
         </Blocks>\
         </Settings>\r\n",
        label = codepage.label(),
        start = mime("Start()\r\n"),
        title = mime("Согласование"),
        init = mime("Init()\r\n"),
        calculation = mime("Calculate()\r\n"),
        task = mime("CanStart()\r\n"),
        after = mime("Selected()\r\n"),
    )
}

/// Payload file holding the calculation of role `name`.
pub fn role_payload(name: &str) -> String {
    format!("RoleTM_РОЛ_{name}_ISBEvent.IMG")
}

/// A role whose calculation is [`ROLE_CALCULATION`].
pub fn role(code: &str, name: &str) -> RecordRef {
    RecordRef::new("РОЛ", code)
        .with_name(name)
        .with_requisite(Requisite::scalar("Наименование", name))
        .with_requisite(payload_requisite("ISBEvent", role_payload(name)))
}
