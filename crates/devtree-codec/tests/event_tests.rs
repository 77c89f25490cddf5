use std::collections::BTreeMap;

use devtree_codec::{EventKind, TableAction, join, parse};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

fn events(pairs: &[(EventKind, &str)]) -> BTreeMap<EventKind, String> {
    pairs.iter().map(|(k, t)| (*k, t.to_string())).collect()
}

#[test]
fn test_parse_plain_markers() {
    let parsed = parse("CARD.OPEN\r\nfoo\r\nCARD.CLOSE\r\nbar\r\n");

    assert_eq!(
        parsed,
        events(&[
            (EventKind::OnOpenRecord, "foo\r\n"),
            (EventKind::OnCloseRecord, "bar\r\n"),
        ])
    );
}

#[rstest]
#[case("CARD{2147B5A6-496E-4EFF-88D9-78970D889F1F}.OPEN", EventKind::OnOpenRecord)]
#[case("КАРТОЧКА.ОТКРЫТИЕ", EventKind::OnOpenRecord)]
#[case("НАБОР ДАННЫХ.ЗАКРЫТИЕ", EventKind::OnDataSetClose)]
#[case("OPERATION.EXECUTION", EventKind::OnUpdateRatifiedRecord)]
#[case("FORM.DIALOG_SHOW", EventKind::DialogShow)]
#[case("TABLE{D402E843-74B2-4DC1-BFFD-DE677B48452C}12.AFTER_DELETE", EventKind::Table { table: 12, action: TableAction::AfterDelete })]
#[case("ТАБЛИЦА24.ДОБАВЛЕНИЕ ДО", EventKind::Table { table: 24, action: TableAction::BeforeInsert })]
#[case("REQUISITE.SELECT", EventKind::Select)]
fn test_every_vocabulary_maps_to_kind(#[case] marker: &str, #[case] kind: EventKind) {
    assert_eq!(EventKind::from_marker(marker), Some(kind));
}

#[test]
fn test_join_writes_plain_markers_in_canonical_order() {
    let joined = join(&events(&[
        (EventKind::FormShow, "Show()\r\n"),
        (EventKind::OnOpenRecord, "Open()\r\n"),
    ]));

    assert_eq!(joined, "CARD.OPEN\r\nOpen()\r\nFORM.SHOW\r\nShow()\r\n");
}

#[test]
fn test_join_normalizes_guid_markers() {
    let source = "CARD{2147B5A6-496E-4EFF-88D9-78970D889F1F}.CLOSE\r\nb\r\nКАРТОЧКА.ОТКРЫТИЕ\r\na\r\n";

    assert_eq!(join(&parse(source)), "CARD.OPEN\r\na\r\nCARD.CLOSE\r\nb\r\n");
}

#[test]
fn test_lone_select_is_stored_bare() {
    let joined = join(&events(&[(EventKind::Select, "Result = 1\r\n")]));
    assert_eq!(joined, "Result = 1");

    let parsed = parse(&joined);
    assert_eq!(parsed, events(&[(EventKind::Unknown, "Result = 1\r\n")]));
}

#[test]
fn test_text_before_first_marker_is_unknown() {
    let source = "prefix\r\nCARD.OPEN\r\nbody\r\n";
    let parsed = parse(source);

    assert_eq!(parsed.get(&EventKind::Unknown).map(String::as_str), Some("prefix\r\n"));
    assert_eq!(join(&parsed), source);
}

#[test]
fn test_trailing_blank_line_kept_without_markers() {
    assert_eq!(
        parse("line\r\n"),
        events(&[(EventKind::Unknown, "line\r\n\r\n")])
    );
}

#[test]
fn test_trailing_blank_line_dropped_after_marker() {
    assert_eq!(
        parse("CARD.OPEN\r\n"),
        events(&[(EventKind::OnOpenRecord, "")])
    );
}

#[test]
fn test_empty_payload_has_no_events() {
    assert!(parse("").is_empty());
}

#[test]
fn test_repeated_marker_replaces_script() {
    let parsed = parse("CARD.OPEN\r\nfirst\r\nCARD.OPEN\r\nsecond\r\n");
    assert_eq!(parsed, events(&[(EventKind::OnOpenRecord, "second\r\n")]));
}

#[rstest]
#[case(EventKind::OnDataSetOpen, "DataSet.Open.isbl")]
#[case(EventKind::OnUpdateRatifiedRecord, "Operation.Execution.isbl")]
#[case(EventKind::OnValidCloseWithResult, "Dialog.ValidCloseWithResult.isbl")]
#[case(EventKind::DialogHide, "Form.DialogHide.isbl")]
#[case(EventKind::Table { table: 1, action: TableAction::BeforeDelete }, "Table.BeforeDelete.isbl")]
#[case(EventKind::Select, "Requisite.Select.isbl")]
#[case(EventKind::Unknown, "Unknown.isbl")]
fn test_file_names(#[case] kind: EventKind, #[case] name: &str) {
    assert_eq!(kind.file_name(), name);
    assert_eq!(EventKind::from_file_name(name).unwrap(), kind);
}

#[test]
fn test_unknown_file_name_is_error() {
    assert!(EventKind::from_file_name("Comment.txt").is_err());
}

fn script() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z ;=()]{0,12}", 0..4)
        .prop_map(|lines| lines.iter().map(|l| format!("{l}\r\n")).collect())
}

fn marked_payload() -> impl Strategy<Value = String> {
    let kinds = EventKind::all()[1..].to_vec();
    prop::sample::subsequence(kinds, 2..6).prop_flat_map(|kinds| {
        let count = kinds.len();
        prop::collection::vec(script(), count).prop_map(move |scripts| {
            kinds
                .iter()
                .zip(scripts)
                .map(|(kind, text)| format!("{}\r\n{text}", kind.marker().unwrap_or_default()))
                .collect::<String>()
        })
    })
}

proptest! {
    #[test]
    fn test_join_is_left_inverse_of_parse(payload in marked_payload()) {
        prop_assert_eq!(join(&parse(&payload)), payload);
    }

    #[test]
    fn test_select_roundtrips_its_text(text in "[a-z ]{1,20}") {
        let script = format!("{text}\r\n");
        let joined = join(&events(&[(EventKind::Select, script.as_str())]));
        let parsed = parse(&joined);
        prop_assert_eq!(parsed.len(), 1);
        prop_assert_eq!(parsed.values().next().cloned(), Some(script));
    }
}
