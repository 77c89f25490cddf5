use devtree_fs::{NormalizedPath, escape};
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_escape_yields_safe_names(s in "\\PC*") {
        let escaped = escape(&s);

        // One output char per input char
        prop_assert_eq!(escaped.chars().count(), s.chars().count());

        for c in escaped.chars() {
            prop_assert!(!"\"<>|:*?\\/".contains(c));
            prop_assert!((c as u32) >= 32);
        }
    }

    #[test]
    fn test_escape_is_idempotent(s in "\\PC*") {
        let once = escape(&s);
        prop_assert_eq!(escape(&once), once);
    }

    #[test]
    fn test_escaped_name_is_one_component(s in "[a-zA-Z0-9/\\\\:]{1,20}") {
        let base = NormalizedPath::new("root");
        let joined = base.join(&escape(&s));
        prop_assert_eq!(joined.parent(), Some(base));
    }
}

#[test]
fn test_escape_example() {
    assert_eq!(escape("A/B:C"), "A_B_C");
}
