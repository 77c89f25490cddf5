use devtree_fs::NormalizedPath;
use rstest::rstest;

#[rstest]
#[case("a\\b\\c", "a/b/c")]
#[case("a/b/", "a/b")]
#[case("/", "/")]
#[case("C:\\dev\\", "C:/dev")]
fn test_new_normalizes(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(NormalizedPath::new(input).as_str(), expected);
}

#[test]
fn test_join_trims_leading_slash() {
    let base = NormalizedPath::new("root");
    assert_eq!(base.join("/Dialogs").as_str(), "root/Dialogs");
    assert_eq!(base.join("Dialogs\\D1").as_str(), "root/Dialogs/D1");
    assert_eq!(NormalizedPath::new("").join("x").as_str(), "x");
}

#[test]
fn test_parent_and_file_name() {
    let path = NormalizedPath::new("root/Dialogs/D1/Card.xml");
    assert_eq!(path.file_name(), Some("Card.xml"));
    assert_eq!(path.extension(), Some("xml"));
    assert_eq!(path.parent().unwrap().as_str(), "root/Dialogs/D1");
    assert_eq!(NormalizedPath::new("/x").parent().unwrap().as_str(), "/");
    assert_eq!(NormalizedPath::new("x").parent(), None);
}

#[test]
fn test_extension_ignores_dotfiles() {
    assert_eq!(NormalizedPath::new("a/.hidden").extension(), None);
    assert_eq!(NormalizedPath::new("a/Template").extension(), None);
}

#[test]
fn test_contains_is_reflexive_and_component_wise() {
    let root = NormalizedPath::new("/");
    let dev = NormalizedPath::new("/dev/tree");
    assert!(root.contains(&dev));
    assert!(dev.contains(&dev));
    assert!(!dev.contains(&NormalizedPath::new("/dev/trees")));
}

#[test]
fn test_canonical_falls_back_for_missing_path() {
    let path = NormalizedPath::canonical("does/not/exist");
    assert_eq!(path.as_str(), "does/not/exist");
}
