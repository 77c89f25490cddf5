//! Mapping of identity strings onto safe file names

/// Characters rejected in a file name or path on at least one supported platform.
const RESERVED: &[char] = &['"', '<', '>', '|', ':', '*', '?', '\\', '/'];

fn is_reserved(c: char) -> bool {
    c.is_ascii_control() && c != '\u{7f}' || RESERVED.contains(&c)
}

/// Replace every character that is illegal in a file name with `_`.
///
/// Case and all other characters are preserved, so distinct keys that only
/// differ in reserved characters collapse onto the same folder name.
///
/// ```
/// assert_eq!(devtree_fs::escape("A/B:C"), "A_B_C");
/// ```
pub fn escape(name: &str) -> String {
    name.chars()
        .map(|c| if is_reserved(c) { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_control_characters() {
        assert_eq!(escape("a\tb\u{0}c\u{1f}"), "a_b_c_");
    }

    #[test]
    fn keeps_cyrillic_and_case() {
        assert_eq!(escape("Диалог?Main"), "Диалог_Main");
    }
}
