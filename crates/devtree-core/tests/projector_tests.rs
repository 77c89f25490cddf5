use std::collections::{BTreeMap, BTreeSet};

use devtree_core::{
    Error, ImportFilter, Kind, Projector, ProjectorOptions, SnapshotSource, Stage,
    source::{Snapshot, SourceRow},
};
use devtree_fs::NormalizedPath;
use devtree_model::{Codepage, Component, ComponentSet, Field};
use devtree_test_utils::fixtures;
use pretty_assertions::assert_eq;
use rstest::rstest;
use tempfile::TempDir;
use walkdir::WalkDir;

fn projector(dir: &TempDir, codepage: Codepage) -> Projector {
    Projector::new(NormalizedPath::new(dir.path()), codepage)
}

fn only(projector: Projector, kinds: &[Kind]) -> Projector {
    projector.with_options(ProjectorOptions {
        workers: 2,
        kinds: Some(kinds.to_vec()),
    })
}

/// Components keyed by group and key, so kinds sharing a group compare
/// independently of import order.
fn by_key(set: &ComponentSet) -> BTreeMap<(String, String), Component> {
    set.groups()
        .flat_map(|(group, components)| {
            components
                .iter()
                .map(move |c| ((group.to_string(), c.key.clone()), c.clone()))
        })
        .collect()
}

/// Files below `folder`, relative and sorted.
fn files_below(folder: &NormalizedPath) -> Vec<String> {
    let mut files: Vec<String> = WalkDir::new(folder.to_native())
        .into_iter()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| NormalizedPath::new(entry.path()).relative_to(folder))
        .collect();
    files.sort();
    files
}

fn snapshot(tables: &[(&str, &[&[(&str, &str)]])]) -> SnapshotSource {
    let mut snapshot = Snapshot::default();
    for (table, rows) in tables {
        let rows = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect::<SourceRow>()
            })
            .collect();
        snapshot.tables.insert(table.to_string(), rows);
    }
    SnapshotSource::new(snapshot)
}

#[rstest]
#[case(Codepage::Russian)]
#[case(Codepage::English)]
fn export_then_import_restores_every_kind(#[case] codepage: Codepage) {
    let dir = TempDir::new().unwrap();
    let package = fixtures::package(codepage);
    let projector = projector(&dir, codepage);

    let exported = projector.export(&package).unwrap();
    let (imported, report) = projector.import(&ImportFilter::accept_all()).unwrap();

    assert_eq!(exported.stage, Stage::Export);
    assert_eq!(exported.total(), package.len());
    assert_eq!(report.total(), package.len());
    assert_eq!(imported.info, package.info);
    assert_eq!(by_key(&imported), by_key(&package));
}

#[test]
fn dialog_side_files_match_write_set() {
    let dir = TempDir::new().unwrap();
    let projector = projector(&dir, Codepage::Russian);
    projector.export(&fixtures::package(Codepage::Russian)).unwrap();

    let folder = NormalizedPath::new(dir.path()).join("Dialogs/Settings");
    assert_eq!(
        files_below(&folder),
        vec![
            "Actions/Run.isbl",
            "Card.xml",
            "CardForm.dfm",
            "Comment.txt",
            "Events/Card.Open.isbl",
            "Events/Form.Show.isbl",
            "Requisites/Amount/Requisite.Change.isbl",
            "Requisites/Amount/Requisite.Select.isbl",
        ]
    );
}

#[test]
fn reexport_prunes_stale_artifacts() {
    let dir = TempDir::new().unwrap();
    let root = NormalizedPath::new(dir.path());
    let projector = only(projector(&dir, Codepage::English), &[Kind::Dialogs]);
    let mut set = ComponentSet::new();
    set.push("Dialogs", fixtures::dialog("Settings", Codepage::English));
    projector.export(&set).unwrap();

    let folder = root.join("Dialogs/Settings");
    std::fs::write(folder.join("notes.txt").to_native(), "stray").unwrap();
    std::fs::create_dir_all(folder.join("Old/Deep").to_native()).unwrap();
    std::fs::write(folder.join("Old/Deep/x.isbl").to_native(), "stray").unwrap();

    // Without its action the dialog no longer needs an Actions folder.
    let mut dialog = fixtures::dialog("Settings", Codepage::English);
    dialog.take_section(2);
    let mut set = ComponentSet::new();
    set.push("Dialogs", dialog);
    projector.export(&set).unwrap();

    let files = files_below(&folder);
    assert!(!files.iter().any(|f| f.starts_with("Actions/")));
    assert!(!files.contains(&"notes.txt".to_string()));
    assert!(!folder.join("Old").exists());
    assert!(!folder.join("Actions").exists());
    assert!(files.contains(&"Card.xml".to_string()));
}

#[test]
fn route_block_scripts_get_their_own_files() {
    let dir = TempDir::new().unwrap();
    let projector = projector(&dir, Codepage::Russian);
    projector.export(&fixtures::package(Codepage::Russian)).unwrap();

    let folder = NormalizedPath::new(dir.path()).join("RouteBlocks/Approve");
    assert_eq!(
        files_below(&folder),
        vec![
            "Actions/Notify.isbl",
            "Card.xml",
            "Events/BeforeStart.isbl",
            "Properties.xml",
            "Ribbon.dfm",
        ]
    );
    let properties = std::fs::read(folder.join("Properties.xml").to_native()).unwrap();
    let properties = Codepage::Russian.decode_bytes(&properties);
    assert!(properties.contains("Approval"));
    assert!(!properties.contains(fixtures::MIME_MARKER));
}

#[test]
fn reports_are_split_by_type() {
    let dir = TempDir::new().unwrap();
    let root = NormalizedPath::new(dir.path());
    let report = projector(&dir, Codepage::Russian)
        .export(&fixtures::package(Codepage::Russian))
        .unwrap();

    assert_eq!(report.count(Kind::Reports), 1);
    assert_eq!(report.count(Kind::IntegratedReports), 1);
    assert!(root.join("Reports/Balance/Calculation.isbl").is_file());
    assert!(root.join("IntegratedReports/Dashboard/Template").is_file());
    assert!(!root.join("Reports/Dashboard").exists());
}

#[test]
fn record_ids_are_dropped_from_headers() {
    let dir = TempDir::new().unwrap();
    let codepage = Codepage::English;
    let mut dialog = fixtures::dialog("Settings", codepage);
    dialog.card.upsert(Field::scalar("ISBID", "17"));
    dialog.card.upsert(Field::scalar("LastUpdate", "2024-01-01"));
    for row in dialog.rows_mut(1) {
        row.upsert(Field::scalar("ISBID", "18"));
        row.upsert(Field::scalar("MainSectionRecordID", "17"));
    }
    let mut set = ComponentSet::new();
    set.push("Dialogs", dialog);
    let projector = only(projector(&dir, codepage), &[Kind::Dialogs]);

    projector.export(&set).unwrap();
    let (imported, _) = projector.import(&ImportFilter::accept_all()).unwrap();

    let card = std::fs::read(dir.path().join("Dialogs/Settings/Card.xml")).unwrap();
    let card = codepage.decode_bytes(&card);
    assert!(!card.contains("ISBID"));
    assert!(!card.contains("LastUpdate"));
    assert!(!card.contains("MainSectionRecordID"));
    assert_eq!(
        imported.group("Dialogs")[0],
        fixtures::dialog("Settings", codepage)
    );
}

#[test]
fn failing_kind_is_reported_after_siblings_finish() {
    let dir = TempDir::new().unwrap();
    let codepage = Codepage::English;
    let mut dialog = fixtures::dialog("Settings", codepage);
    for row in dialog.rows_mut(1) {
        row.remove("ISBDialogReqCode");
    }
    let mut set = ComponentSet::new();
    set.push("Dialogs", dialog);
    set.push("Scripts", fixtures::script("Cleanup", codepage));

    let err = projector(&dir, codepage).export(&set).unwrap_err();

    match err {
        Error::KindFailed { kind, source } => {
            assert_eq!(kind, Kind::Dialogs);
            assert!(matches!(
                *source,
                Error::MissingField { ref field, .. } if field == "ISBDialogReqCode"
            ));
        }
        other => panic!("expected kind failure, got {other:?}"),
    }
    assert!(dir.path().join("Scripts/Cleanup/Text.isbl").is_file());
}

#[test]
fn malformed_header_fails_the_kind() {
    let dir = TempDir::new().unwrap();
    let folder = dir.path().join("Scripts/Broken");
    std::fs::create_dir_all(&folder).unwrap();
    std::fs::write(folder.join("Card.xml"), "<Script><Requisites>").unwrap();

    let err = only(projector(&dir, Codepage::Russian), &[Kind::Scripts, Kind::Modules])
        .import(&ImportFilter::accept_all())
        .unwrap_err();

    assert!(matches!(err, Error::KindFailed { kind: Kind::Scripts, .. }));
}

#[test]
fn import_honours_filter() {
    let dir = TempDir::new().unwrap();
    let projector = projector(&dir, Codepage::Russian);
    projector.export(&fixtures::package(Codepage::Russian)).unwrap();

    let filter = ImportFilter::from_subpaths(["scripts/cleanup", "Dialogs/Settings"]);
    let (imported, report) = projector.import(&filter).unwrap();

    assert_eq!(report.total(), 2);
    assert_eq!(imported.group("Scripts").len(), 1);
    assert_eq!(imported.group("Dialogs").len(), 1);
    assert!(imported.group("Functions").is_empty());
}

#[test]
fn delete_removes_only_unknown_keys() {
    let dir = TempDir::new().unwrap();
    let mut set = ComponentSet::new();
    for key in ["K1", "K2", "K3"] {
        set.push("Constants", fixtures::header_only(key));
    }
    let projector = only(projector(&dir, Codepage::Russian), &[Kind::Constants]);
    projector.export(&set).unwrap();

    let source = snapshot(&[("MBConstLst", &[&[("Const", "K1")], &[("Const", "k2 ")]])]);
    let report = projector.delete(&source).unwrap();

    let root = NormalizedPath::new(dir.path());
    assert_eq!(report.count(Kind::Constants), 1);
    assert!(root.join("Constants/K1").is_dir());
    assert!(root.join("Constants/K2").is_dir());
    assert!(!root.join("Constants/K3").exists());
}

#[test]
fn delete_skips_kinds_without_table() {
    let dir = TempDir::new().unwrap();
    let mut set = ComponentSet::new();
    set.push("Dialogs", fixtures::dialog("Settings", Codepage::Russian));
    let projector = only(projector(&dir, Codepage::Russian), &[Kind::Dialogs]);
    projector.export(&set).unwrap();

    let report = projector.delete(&snapshot(&[])).unwrap();

    assert_eq!(report.count(Kind::Dialogs), 0);
    assert!(dir.path().join("Dialogs/Settings").is_dir());
}

fn strings(codepage: Codepage, entries: &[(&str, &str)]) -> ComponentSet {
    let mut set = ComponentSet::new();
    for (key, group) in entries {
        set.push(
            "LocalizedStrings",
            fixtures::localization_string(key, group, codepage),
        );
    }
    set
}

fn keys(set: &ComponentSet) -> BTreeSet<String> {
    set.group("LocalizedStrings")
        .iter()
        .map(|c| c.key.clone())
        .collect()
}

#[test]
fn grouped_export_merges_with_prior_strings() {
    let dir = TempDir::new().unwrap();
    let codepage = Codepage::Russian;
    let projector = only(projector(&dir, codepage), &[Kind::LocalizationStrings]);

    projector
        .export(&strings(codepage, &[("Hello", "Common"), ("Bye", "Common")]))
        .unwrap();
    let report = projector
        .export(&strings(codepage, &[("Thanks", "common")]))
        .unwrap();

    assert_eq!(report.count(Kind::LocalizationStrings), 1);
    let kind_folder = NormalizedPath::new(dir.path()).join("LocalizationStrings");
    let groups = devtree_fs::io::list_subdirs(&kind_folder).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].file_name(), Some("COMMON"));

    let (imported, _) = projector.import(&ImportFilter::accept_all()).unwrap();
    assert_eq!(
        keys(&imported),
        BTreeSet::from(["Bye".to_string(), "Hello".to_string(), "Thanks".to_string()])
    );
}

#[test]
fn grouped_export_replaces_same_key() {
    let dir = TempDir::new().unwrap();
    let codepage = Codepage::English;
    let projector = only(projector(&dir, codepage), &[Kind::LocalizationStrings]);
    projector
        .export(&strings(codepage, &[("Hello", "Common")]))
        .unwrap();

    let mut changed = fixtures::localization_string("Hello", "Common", codepage);
    changed.card.upsert(Field::scalar("ISBComment", "Changed"));
    let mut set = ComponentSet::new();
    set.push("LocalizedStrings", changed.clone());
    projector.export(&set).unwrap();

    let (imported, _) = projector.import(&ImportFilter::accept_all()).unwrap();
    assert_eq!(imported.group("LocalizedStrings"), &[changed]);
}

#[test]
fn grouped_delete_keeps_strings_known_to_source() {
    let dir = TempDir::new().unwrap();
    let codepage = Codepage::Russian;
    let projector = only(projector(&dir, codepage), &[Kind::LocalizationStrings]);
    projector
        .export(&strings(
            codepage,
            &[("Hello", "Common"), ("Bye", "Common"), ("Title", "Forms")],
        ))
        .unwrap();

    let source = snapshot(&[(
        "SBLocalizedData",
        &[&[("GroupCode", "COMMON"), ("Code", "hello")]],
    )]);
    let report = projector.delete(&source).unwrap();

    assert_eq!(report.count(Kind::LocalizationStrings), 2);
    assert!(!dir.path().join("LocalizationStrings/FORMS").exists());
    let (imported, _) = projector.import(&ImportFilter::accept_all()).unwrap();
    assert_eq!(keys(&imported), BTreeSet::from(["Hello".to_string()]));
}

#[test]
fn grouped_kind_has_no_key_field() {
    let config = devtree_core::routing(Kind::LocalizationStrings);
    let err = config.key_field().unwrap_err();
    assert!(err.is_configuration());
    assert!(matches!(err, Error::Unsupported { kind: Kind::LocalizationStrings, .. }));
}

#[test]
fn header_only_component_roundtrips() {
    let dir = TempDir::new().unwrap();
    let mut set = ComponentSet::new();
    let mut viewer = fixtures::header_only("Pdf");
    viewer.display = Some("PDF viewer".into());
    viewer.card.upsert(Field::scalar("Extension", "pdf"));
    set.push("Viewers", viewer.clone());
    let projector = only(projector(&dir, Codepage::Russian), &[Kind::Viewers]);

    projector.export(&set).unwrap();
    let (imported, _) = projector.import(&ImportFilter::accept_all()).unwrap();

    assert_eq!(imported.group("Viewers"), &[viewer]);
    assert_eq!(
        files_below(&NormalizedPath::new(dir.path()).join("Viewers")),
        vec!["Pdf/Card.xml"]
    );
}
