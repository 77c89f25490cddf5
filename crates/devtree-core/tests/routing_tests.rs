use devtree_core::routing::{ExportCtx, ImportCtx, routing};
use devtree_core::{Kind, WriteSet};
use devtree_fs::NormalizedPath;
use devtree_model::{Codepage, Component};
use devtree_test_utils::fixtures;
use pretty_assertions::assert_eq;
use rstest::rstest;
use tempfile::TempDir;

/// Export `component` into a temp folder, then import it back.
fn roundtrip(kind: Kind, component: &Component, codepage: Codepage) -> (Component, Component, Vec<String>) {
    let dir = TempDir::new().unwrap();
    let folder = NormalizedPath::new(dir.path());
    let config = routing(kind);

    let mut reduced = component.clone();
    let mut writes = WriteSet::new();
    let mut ctx = ExportCtx::new(kind, component.key.clone(), folder.clone(), codepage, &mut writes);
    config.apply_export(&mut reduced, &mut ctx).unwrap();
    let mut written: Vec<String> = writes
        .files()
        .filter_map(|path| path.relative_to(&folder))
        .collect();
    written.sort();

    let mut restored = reduced.clone();
    let ctx = ImportCtx::new(kind, component.key.clone(), folder, codepage);
    config.apply_import(&mut restored, &ctx).unwrap();
    (reduced, restored, written)
}

#[rstest]
#[case(Codepage::Russian)]
#[case(Codepage::English)]
fn script_unit_id_is_recreated_empty(#[case] codepage: Codepage) {
    let script = fixtures::script("Cleanup", codepage);

    let (reduced, restored, written) = roundtrip(Kind::Scripts, &script, codepage);

    assert_eq!(written, vec!["Comment.txt", "Text.isbl"]);
    assert!(!reduced.card.contains(codepage.pick("ИДМодуля", "UnitID")));
    assert!(!reduced.card.contains(codepage.pick("Текст", "Text")));
    assert_eq!(restored, script);
}

#[rstest]
#[case(Codepage::Russian)]
#[case(Codepage::English)]
fn route_block_properties_return_to_stored_form(#[case] codepage: Codepage) {
    let block = fixtures::route_block("Approve", codepage);

    let (reduced, restored, written) = roundtrip(Kind::RouteBlocks, &block, codepage);

    assert_eq!(
        written,
        vec![
            "Actions/Notify.isbl",
            "Events/BeforeStart.isbl",
            "Properties.xml",
            "Ribbon.dfm",
        ]
    );
    assert!(!reduced.card.contains("Properties"));
    assert_eq!(
        restored.card.text("Properties", codepage).unwrap(),
        Some(fixtures::route_block_properties(codepage))
    );
}

#[test]
fn reference_type_actions_stay_in_header_when_methods_exist() {
    let codepage = Codepage::Russian;
    let reference = fixtures::reference_type("Partners", codepage);

    let (reduced, restored, written) = roundtrip(Kind::ReferenceTypes, &reference, codepage);

    assert!(!written.iter().any(|f| f.starts_with("Actions/")));
    assert!(written.contains(&"Methods/Recalculate.isbl".to_string()));
    assert!(written.contains(&"Views/Main/ListForm.dfm".to_string()));
    let action = &reduced.section(2).unwrap().rows[0];
    assert!(action.contains("ISBRefTypeActOnExecute"));
    assert_eq!(restored, reference);
}
