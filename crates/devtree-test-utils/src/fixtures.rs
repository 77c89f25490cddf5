//! Component and package builders.
//!
//! Every builder produces a component whose routed payloads survive an
//! export/import cycle unchanged, so tests can compare whole components.
//! Fields that export strips (record ids, timestamps) are left out; tests
//! covering removal add them explicitly.

use devtree_model::{Codepage, Component, ComponentSet, Field, Row, Section};

/// Marker prefixing MIME-coded route block property values.
pub const MIME_MARKER: &str = "{5314B05F-CF9F-4F66-99EC-24992A5FB114}";

/// A text field holding `text`.
pub fn text(code: &str, codepage: Codepage, text: &str) -> Field {
    Field::text(code, codepage, Some(text))
}

/// Attach `rows` as section `index`.
///
/// # Panics
/// Panics if `index` is outside `1..=8`.
pub fn with_rows(component: Component, index: usize, rows: Vec<Row>) -> Component {
    component
        .with_section(index, Section::new(rows))
        .unwrap_or_else(|e| panic!("with_rows: {e}"))
}

/// A component with only a scalar card, for header-only kinds.
pub fn header_only(key: &str) -> Component {
    Component::new(key).with_card(Row::from_fields([
        Field::scalar("Name", key),
        Field::scalar("Title", format!("{key} title")),
    ]))
}

/// A dialog with form, comment, events, one requisite and one action.
pub fn dialog(key: &str, codepage: Codepage) -> Component {
    let card = Row::from_fields([
        Field::scalar("ISBDialogName", key),
        text("ISBDialogForm", codepage, "object Form\r\nend\r\n"),
        text("ISBDialogComment", codepage, "Dialog comment"),
        text(
            "ISBDialogEventText",
            codepage,
            "CARD.OPEN\r\nOpen()\r\nFORM.SHOW\r\nShow()\r\n",
        ),
    ]);
    let requisite = Row::from_fields([
        Field::scalar("ISBDialogReqCode", "Amount"),
        text("ISBDialogReqOnChange", codepage, "Changed()\r\n"),
        text("ISBDialogReqOnSelect", codepage, "Selected()"),
    ]);
    let action = Row::from_fields([
        Field::scalar("ISBDialogActCode", "Run"),
        text("ISBDialogActOnExecute", codepage, "Execute()\r\n"),
    ]);

    let component = Component::new(key).with_card(card);
    let component = with_rows(component, 1, vec![requisite]);
    with_rows(component, 2, vec![action])
}

/// A reference type with views and methods.
///
/// Section 7 is present, so the action text stays in the header.
pub fn reference_type(key: &str, codepage: Codepage) -> Component {
    let card = Row::from_fields([
        Field::scalar("ISBRefTypeName", key),
        text("ISBRefTypeComment", codepage, "Reference comment"),
        text("ISBRefTypeAddParams", codepage, "[Params]\r\nA=1\r\n"),
        text("ISBRefTypeCommonSettings", codepage, "<Settings/>"),
        text(
            "ISBRefTypeEventText",
            codepage,
            "DATASET.OPEN\r\nLoad()\r\nCARD.CLOSE\r\nSave()\r\n",
        ),
    ]);
    let requisite = Row::from_fields([
        Field::scalar("ISBRefTypeReqCode", "Owner"),
        text("ISBRefTypeReqOnChange", codepage, "OwnerChanged()\r\n"),
        text(
            "ISBRefTypeReqOnSelect",
            codepage,
            "REQUISITE.BEFORE_SELECT\r\nBefore()\r\nREQUISITE.AFTER_SELECT\r\nAfter()\r\n",
        ),
    ]);
    let action = Row::from_fields([
        Field::scalar("ISBRefTypeActCode", "Approve"),
        text("ISBRefTypeActOnExecute", codepage, "Approve()\r\n"),
    ]);
    let view = Row::from_fields([
        Field::scalar("ISBRefTypeViewCode", "Main"),
        text("ISBRefTypeViewCardForm", codepage, "object Card\r\nend\r\n"),
        text("ISBRefTypeViewListForm", codepage, "object List\r\nend\r\n"),
        text("ISBRefTypeViewComment", codepage, "Main view"),
    ]);
    let method = Row::from_fields([
        Field::scalar("Name", "Recalculate"),
        text("Calculation", codepage, "Result = 1\r\n"),
    ]);

    let component = Component::new(key).with_card(card);
    let component = with_rows(component, 1, vec![requisite]);
    let component = with_rows(component, 2, vec![action]);
    let component = with_rows(component, 3, vec![view]);
    with_rows(component, 7, vec![method])
}

/// A document card type with one view and one action.
pub fn document_card_type(key: &str, codepage: Codepage) -> Component {
    let card = Row::from_fields([
        Field::scalar("ISBEDocTypeName", key),
        text("ISBEDocTypeComment", codepage, "Document comment"),
        text("ISBEDocTypeAddParams", codepage, "[Doc]\r\n"),
        text(
            "ISBEDocTypeEventText",
            codepage,
            "CARD.OPEN\r\nOpen()\r\nCARD.BEFORE_UPDATE\r\nCheck()\r\n",
        ),
    ]);
    let action = Row::from_fields([
        Field::scalar("ISBEDocTypeActCode", "Sign"),
        text("ISBEDocTypeActOnExecute", codepage, "Sign()\r\n"),
    ]);
    let view = Row::from_fields([
        Field::scalar("ISBEDocTypeViewCode", "Main"),
        text("ISBEDocTypeViewCardForm", codepage, "object Card\r\nend\r\n"),
        text("ISBEDocTypeViewComment", codepage, "Document view"),
    ]);

    let component = Component::new(key).with_card(card);
    let component = with_rows(component, 2, vec![action]);
    with_rows(component, 3, vec![view])
}

/// A script with text, comment and an empty unit id.
pub fn script(key: &str, codepage: Codepage) -> Component {
    Component::new(key).with_card(Row::from_fields([
        Field::scalar("NameRpt", key),
        text(codepage.pick("Текст", "Text"), codepage, "Result = Calc()\r\n"),
        text(codepage.pick("Примечание", "Note"), codepage, "Script note"),
        Field::empty(codepage.pick("ИДМодуля", "UnitID")),
    ]))
}

/// A report of `report_type` (`MBAnAccRpt` or `MBAnalitV`).
pub fn report(key: &str, report_type: &str, codepage: Codepage) -> Component {
    Component::new(key).with_card(Row::from_fields([
        Field::scalar("NameRpt", key),
        Field::scalar("Тип", report_type),
        text(codepage.pick("Расчет", "Script"), codepage, "Build()\r\n"),
        text(codepage.pick("Примечание", "Note"), codepage, "Report note"),
        text(codepage.pick("Шаблон", "Template"), codepage, "TEMPLATE"),
        Field::empty(codepage.pick("ИДМодуля", "UnitID")),
    ]))
}

/// A function with text and help.
pub fn function(key: &str, codepage: Codepage) -> Component {
    Component::new(key).with_card(Row::from_fields([
        Field::scalar("ISBFuncName", key),
        text("ISBFuncText", codepage, "Result = A + B\r\n"),
        text("ISBFuncHelp", codepage, "<Help/>"),
    ]))
}

/// A server event with a comment.
pub fn server_event(key: &str, codepage: Codepage) -> Component {
    Component::new(key).with_card(Row::from_fields([
        Field::scalar("Name", key),
        text(codepage.pick("Примечание", "Note"), codepage, "Server event note"),
    ]))
}

/// Properties markup of a route block in its stored compact form.
///
/// Holds one routed event, one MIME-coded plain property, one action and a
/// ribbon.
pub fn route_block_properties(codepage: Codepage) -> String {
    let event = codepage.encode_opaque(Some("Start()\r\n"));
    let title = codepage.encode_opaque(Some("Approval"));
    let action = codepage.encode_opaque(Some("Notify()\r\n"));
    format!(
        "<?xml version=\"1.0\" encoding=\"{label}\"?>\r\n<Settings>\r\n\t<Blocks><Block Name=\"Approve\">\
         <Properties>\
         <Property Name=\"BeforeStart\"><Value><Value>{MIME_MARKER}{event}</Value></Value></Property>\
         <Property Name=\"Title\"><Value><Value>{MIME_MARKER}{title}</Value></Value></Property>\
         </Properties>\
         <Actions><Action Code=\"Notify\"><ISBLText>{action}</ISBLText></Action></Actions>\
         <Ribbon>RibbonData</Ribbon>\
         </Block></Blocks></Settings>\r\n",
        label = codepage.label(),
    )
}

/// A route block whose properties come from [`route_block_properties`].
pub fn route_block(key: &str, codepage: Codepage) -> Component {
    Component::new(key).with_card(Row::from_fields([
        Field::scalar("Name", key),
        text("Properties", codepage, &route_block_properties(codepage)),
    ]))
}

/// A localization string of `group` with Russian and English values.
pub fn localization_string(key: &str, group: &str, codepage: Codepage) -> Component {
    let value = |language: &str, value: &str| {
        Row::from_fields([
            Field::scalar("ISBGroupCode", group),
            Field::scalar("ISBLanguage", language),
            Field::scalar("ISBValue", value),
        ])
    };
    let component = Component::new(key).with_card(Row::from_fields([
        Field::scalar("ISBCode", key),
        text("ISBComment", codepage, "Localized"),
    ]));
    with_rows(
        component,
        1,
        vec![value("ru", &format!("{key} ru")), value("en", &format!("{key} en"))],
    )
}

/// A package with one component of every kind.
pub fn package(codepage: Codepage) -> ComponentSet {
    let mut set = ComponentSet::new();
    set.info.platform_version = Some("7.58".into());
    set.info.system_mask = Some("DEV".into());

    set.push("Constants", header_only("MaxItems"));
    set.push("DialogRequisites", header_only("Amount"));
    set.push("Dialogs", dialog("Settings", codepage));
    set.push("EDocRequisites", header_only("DocNumber"));
    set.push("EDCardTypes", document_card_type("Contract", codepage));
    set.push("GrFunctions", header_only("Math"));
    set.push("Functions", function("Sum", codepage));
    set.push(
        "LocalizedStrings",
        localization_string("Greeting", "Common", codepage),
    );
    set.push("Modules", header_only("Core"));
    set.push("RefTypes", reference_type("Partners", codepage));
    set.push("RefRequisites", header_only("Owner"));
    set.push("Reports", report("Balance", "MBAnAccRpt", codepage));
    set.push("Reports", report("Dashboard", "MBAnalitV", codepage));
    set.push("WorkflowBlockGroups", header_only("Approvals"));
    set.push("WorkflowBlocks", route_block("Approve", codepage));
    set.push("Scripts", script("Cleanup", codepage));
    set.push("ServerEvents", server_event("OnLogin", codepage));
    set.push("Viewers", header_only("Pdf"));
    set
}
