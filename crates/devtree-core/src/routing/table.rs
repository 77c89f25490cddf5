//! Routing configuration of every entity kind

use super::{
    Code, Guard, LAST_UPDATE, Policy, Route, RoutingConfig, SectionRule, Selector, SourceTable,
    route_block,
};
use crate::Kind;

const COMMENT_FILE: &str = "Comment.txt";
const CARD_FORM_FILE: &str = "CardForm.dfm";
const LIST_FORM_FILE: &str = "ListForm.dfm";
const EVENTS_FOLDER: &str = "Events";

const NOTE: Code = Code::new("Примечание", "Note");
const UNIT_ID: Code = Code::new("ИДМодуля", "UnitID");

/// Field codes of the card-type kinds, which share one layout under
/// different prefixes.
struct CardTypeCodes {
    form: Option<Code>,
    comment: Code,
    add_params: Option<Code>,
    common_settings: Option<Code>,
    event_text: Code,
    req_code: Code,
    req_on_change: Code,
    req_on_select: Code,
    act_code: Code,
    act_on_execute: Code,
    view_code: Code,
    view_files: &'static [(Code, &'static str)],
}

const DIALOG: CardTypeCodes = CardTypeCodes {
    form: Some(Code::same("ISBDialogForm")),
    comment: Code::same("ISBDialogComment"),
    add_params: None,
    common_settings: None,
    event_text: Code::same("ISBDialogEventText"),
    req_code: Code::same("ISBDialogReqCode"),
    req_on_change: Code::same("ISBDialogReqOnChange"),
    req_on_select: Code::same("ISBDialogReqOnSelect"),
    act_code: Code::same("ISBDialogActCode"),
    act_on_execute: Code::same("ISBDialogActOnExecute"),
    view_code: Code::same("ISBDialogViewCode"),
    view_files: &[],
};

const REFERENCE_TYPE: CardTypeCodes = CardTypeCodes {
    form: None,
    comment: Code::same("ISBRefTypeComment"),
    add_params: Some(Code::same("ISBRefTypeAddParams")),
    common_settings: Some(Code::same("ISBRefTypeCommonSettings")),
    event_text: Code::same("ISBRefTypeEventText"),
    req_code: Code::same("ISBRefTypeReqCode"),
    req_on_change: Code::same("ISBRefTypeReqOnChange"),
    req_on_select: Code::same("ISBRefTypeReqOnSelect"),
    act_code: Code::same("ISBRefTypeActCode"),
    act_on_execute: Code::same("ISBRefTypeActOnExecute"),
    view_code: Code::same("ISBRefTypeViewCode"),
    view_files: &[
        (Code::same("ISBRefTypeViewCardForm"), CARD_FORM_FILE),
        (Code::same("ISBRefTypeViewListForm"), LIST_FORM_FILE),
        (Code::same("ISBRefTypeViewComment"), COMMENT_FILE),
    ],
};

const DOCUMENT_CARD_TYPE: CardTypeCodes = CardTypeCodes {
    form: None,
    comment: Code::same("ISBEDocTypeComment"),
    add_params: Some(Code::same("ISBEDocTypeAddParams")),
    common_settings: None,
    event_text: Code::same("ISBEDocTypeEventText"),
    req_code: Code::same("ISBEDocTypeReqCode"),
    req_on_change: Code::same("ISBEDocTypeReqOnChange"),
    req_on_select: Code::same("ISBEDocTypeReqOnSelect"),
    act_code: Code::same("ISBEDocTypeActCode"),
    act_on_execute: Code::same("ISBEDocTypeActOnExecute"),
    view_code: Code::same("ISBEDocTypeViewCode"),
    view_files: &[
        (Code::same("ISBEDocTypeViewCardForm"), CARD_FORM_FILE),
        (Code::same("ISBEDocTypeViewComment"), COMMENT_FILE),
    ],
};

fn card_type_rules(codes: &CardTypeCodes) -> Vec<SectionRule> {
    let mut card = Vec::new();
    if let Some(form) = codes.form {
        card.push(Route::File {
            field: form,
            file: CARD_FORM_FILE,
        });
    }
    card.push(Route::File {
        field: codes.comment,
        file: COMMENT_FILE,
    });
    if let Some(params) = codes.add_params {
        card.push(Route::File {
            field: params,
            file: "Params.ini",
        });
    }
    if let Some(settings) = codes.common_settings {
        card.push(Route::File {
            field: settings,
            file: "Settings.xml",
        });
    }
    card.push(Route::Events {
        field: codes.event_text,
        folder: EVENTS_FOLDER,
    });

    let mut rules = vec![
        SectionRule::new(0, card),
        SectionRule::new(
            1,
            vec![Route::RequisiteEvents {
                code: codes.req_code,
                change: codes.req_on_change,
                select: codes.req_on_select,
            }],
        ),
        SectionRule::new(
            2,
            vec![Route::Named {
                code: codes.act_code,
                text: codes.act_on_execute,
                folder: "Actions",
            }],
        )
        .when(Guard::SectionAbsent(7)),
    ];
    if !codes.view_files.is_empty() {
        rules.push(SectionRule::new(
            3,
            vec![Route::Subfolder {
                folder: "Views",
                code: codes.view_code,
                files: codes.view_files,
            }],
        ));
    }
    rules.push(SectionRule::new(
        7,
        vec![Route::Named {
            code: Code::same("Name"),
            text: Code::same("Calculation"),
            folder: "Methods",
        }],
    ));
    rules
}

fn report_rules() -> Vec<SectionRule> {
    vec![SectionRule::new(
        0,
        vec![
            Route::File {
                field: Code::new("Расчет", "Script"),
                file: "Calculation.isbl",
            },
            Route::File {
                field: NOTE,
                file: COMMENT_FILE,
            },
            Route::File {
                field: Code::new("Шаблон", "Template"),
                file: "Template",
            },
            Route::EmptyOnImport { field: UNIT_ID },
        ],
    )]
}

const fn table(table: &'static str, key: &'static [&'static str]) -> SourceTable {
    SourceTable {
        table,
        key_columns: key,
        filter: None,
        check_exists: false,
    }
}

const fn checked(table: &'static str, key: &'static [&'static str]) -> SourceTable {
    SourceTable {
        table,
        key_columns: key,
        filter: None,
        check_exists: true,
    }
}

const fn filtered(
    table: &'static str,
    key: &'static [&'static str],
    column: &'static str,
    value: &'static str,
) -> SourceTable {
    SourceTable {
        table,
        key_columns: key,
        filter: Some((column, value)),
        check_exists: false,
    }
}

fn per_component(
    kind: Kind,
    element: &'static str,
    key: &'static str,
    source: SourceTable,
    rules: Vec<SectionRule>,
) -> RoutingConfig {
    RoutingConfig {
        kind,
        element: Some(element),
        key_field: Some(key),
        source,
        selector: Selector::All,
        policy: Policy::PerComponent,
        rules,
    }
}

/// Routing configuration for `kind`.
pub fn routing(kind: Kind) -> RoutingConfig {
    use Kind::*;
    match kind {
        Constants => per_component(kind, "Constant", "Const", table("MBConstLst", &["Const"]), vec![]),
        Dialogs => per_component(
            kind,
            "Dialog",
            "Code",
            checked("SBDialog", &["Code"]),
            card_type_rules(&DIALOG),
        ),
        DialogRequisites => per_component(
            kind,
            "DialogRequisite",
            "Code",
            checked("SBDialogRequisite", &["Code"]),
            vec![],
        ),
        DocumentCardTypes => per_component(
            kind,
            "DocumentCardType",
            "Kod",
            table("MBEDocType", &["Kod"]),
            card_type_rules(&DOCUMENT_CARD_TYPE),
        ),
        DocumentRequisites => per_component(
            kind,
            "DocumentRequisite",
            "Kod",
            table("MBRecvEDoc", &["Kod"]),
            vec![],
        ),
        FunctionGroups => per_component(
            kind,
            "FunctionGroup",
            "GrName",
            table("MBGrFunc", &["GrName"]),
            vec![],
        ),
        Functions => per_component(
            kind,
            "Function",
            "FName",
            table("MBFunc", &["FName"]),
            vec![SectionRule::new(
                0,
                vec![
                    Route::File {
                        field: Code::same("ISBFuncText"),
                        file: "Text.isbl",
                    },
                    Route::File {
                        field: Code::same("ISBFuncHelp"),
                        file: "Help.xml",
                    },
                ],
            )],
        ),
        IntegratedReports => RoutingConfig {
            selector: Selector::CardValue {
                field: "Тип",
                value: "MBAnalitV",
            },
            ..per_component(
                kind,
                "IntegratedReport",
                "NameRpt",
                filtered("MBReports", &["NameRpt"], "TypeRpt", "MBAnalitV"),
                report_rules(),
            )
        },
        Reports => RoutingConfig {
            selector: Selector::CardValue {
                field: "Тип",
                value: "MBAnAccRpt",
            },
            ..per_component(
                kind,
                "Report",
                "NameRpt",
                filtered("MBReports", &["NameRpt"], "TypeRpt", "MBAnAccRpt"),
                report_rules(),
            )
        },
        LocalizationStrings => RoutingConfig {
            kind,
            element: None,
            key_field: None,
            source: table("SBLocalizedData", &["GroupCode", "Code"]),
            selector: Selector::All,
            policy: Policy::Grouped,
            rules: vec![SectionRule::new(1, vec![]).removing(vec![LAST_UPDATE])],
        },
        Modules => per_component(kind, "Module", "Name", table("MBRegUnit", &["Name"]), vec![]),
        ReferenceRequisites => per_component(
            kind,
            "ReferenceRequisite",
            "Kod",
            table("MBRecvAn", &["Kod"]),
            vec![],
        ),
        ReferenceTypes => per_component(
            kind,
            "ReferenceType",
            "Kod",
            table("MBVidAn", &["Kod"]),
            card_type_rules(&REFERENCE_TYPE),
        ),
        RouteBlockGroups => per_component(
            kind,
            "RouteBlockGroup",
            "Name",
            table("SBRouteBlockGroup", &["Name"]),
            vec![],
        ),
        RouteBlocks => per_component(
            kind,
            "RouteBlock",
            "Name",
            table("SBRouteBlock", &["Name"]),
            vec![SectionRule::new(
                0,
                vec![Route::Custom {
                    export: route_block::export,
                    import: route_block::import,
                    fields: &[route_block::PROPERTIES],
                }],
            )],
        ),
        Scripts => per_component(
            kind,
            "Script",
            "NameRpt",
            filtered("MBReports", &["NameRpt"], "TypeRpt", "Function"),
            vec![SectionRule::new(
                0,
                vec![
                    Route::File {
                        field: Code::new("Текст", "Text"),
                        file: "Text.isbl",
                    },
                    Route::File {
                        field: NOTE,
                        file: COMMENT_FILE,
                    },
                    Route::EmptyOnImport { field: UNIT_ID },
                ],
            )],
        ),
        ServerEvents => per_component(
            kind,
            "ServerEvent",
            "Name",
            checked("SBServerEvent", &["Name"]),
            vec![SectionRule::new(
                0,
                vec![Route::File {
                    field: NOTE,
                    file: COMMENT_FILE,
                }],
            )],
        ),
        Viewers => per_component(kind, "Viewer", "Viewer", table("MBRptView", &["Viewer"]), vec![]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use rstest::rstest;

    #[test]
    fn every_kind_has_a_config() {
        for kind in Kind::ALL {
            assert_eq!(routing(kind).kind, kind);
        }
    }

    #[rstest]
    #[case(Kind::Dialogs, "Dialog", "Code")]
    #[case(Kind::Reports, "Report", "NameRpt")]
    #[case(Kind::Viewers, "Viewer", "Viewer")]
    fn element_and_key(#[case] kind: Kind, #[case] element: &str, #[case] key: &str) {
        let config = routing(kind);
        assert_eq!(config.element_name().unwrap(), element);
        assert_eq!(config.key_field().unwrap(), key);
    }

    #[test]
    fn grouped_kind_has_no_element_or_key() {
        let config = routing(Kind::LocalizationStrings);
        assert!(matches!(config.element_name(), Err(Error::Unsupported { .. })));
        assert!(matches!(config.key_field(), Err(Error::Unsupported { .. })));
        assert_eq!(config.policy, Policy::Grouped);
    }

    #[test]
    fn actions_route_only_without_methods() {
        let config = routing(Kind::ReferenceTypes);
        let actions = config.rules.iter().find(|r| r.section == 2).unwrap();
        assert_eq!(actions.guard, Guard::SectionAbsent(7));
    }
}
