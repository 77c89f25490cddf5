//! Legacy structural-text codec
//!
//! Structure definitions are stored compactly: string literals are runs of
//! quoted text and `#<code>` character escapes, wrapped at 64 characters
//! and continued with `" +"` line endings. Cyrillic letters are always
//! escaped. The editable form resolves escapes and drops continuations.

use std::sync::LazyLock;

use regex::{Captures, Regex};

const LINE_WIDTH: usize = 64;
const LINE_BREAK_CODES: &str = "#13#10";
const VALUE_LIST: &str = "ValueList.Strings = (";

static COMPACT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(#[0-9]+|'[^']+'| \+\r\n *)").expect("valid regex"));

const CYRILLIC: [char; 40] = [
    'ё', 'й', 'ц', 'у', 'к', 'е', 'н', 'г', 'ш', 'щ', 'з', 'х', 'ъ', 'ф', 'ы', 'в', 'а', 'п', 'р',
    'о', 'л', 'д', 'ж', 'э', 'я', 'ч', 'с', 'м', 'и', 'т', 'ь', 'б', 'ю', '№', '»', '«', '…', '•',
    '“', '”',
];

fn is_cyrillic(c: char) -> bool {
    let lower = c.to_lowercase().next().unwrap_or(c);
    CYRILLIC.contains(&lower)
}

fn char_code(c: char) -> String {
    format!("#{}", u32::from(c))
}

/// Resolve escapes and drop continuations.
///
/// Quoted runs are kept with their quotes. Escapes that do not name a
/// valid character are left as written.
pub fn to_editable(compact: &str) -> String {
    COMPACT_TOKEN
        .replace_all(compact, |caps: &Captures<'_>| {
            let token = &caps[0];
            if let Some(code) = token.strip_prefix('#') {
                match code.parse::<u32>().ok().and_then(char::from_u32) {
                    Some(c) => c.to_string(),
                    None => token.to_string(),
                }
            } else if token.starts_with('\'') {
                token.to_string()
            } else {
                String::new()
            }
        })
        .into_owned()
}

/// Encode editable text into the compact stored form.
///
/// Every output line ends with CRLF and empty lines are dropped.
pub fn to_compact(text: &str) -> String {
    let lines = split_lines(text);
    let lines = escape_quotes(lines);
    let lines = escape_cyrillic(lines);
    let lines = mark_line_breaks(lines);
    let lines = wrap_literals(lines);
    lines
        .into_iter()
        .filter(|line| !line.is_empty())
        .map(|line| line + "\r\n")
        .collect()
}

/// Split on any line-break convention, `\n\r` taking precedence.
fn split_lines(text: &str) -> Vec<String> {
    const SEPARATORS: [&str; 4] = ["\n\r", "\r\n", "\n", "\r"];
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut rest = text;
    'outer: while !rest.is_empty() {
        for sep in SEPARATORS {
            if let Some(after) = rest.strip_prefix(sep) {
                lines.push(std::mem::take(&mut current));
                rest = after;
                continue 'outer;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            current.push(c);
        }
        rest = chars.as_str();
    }
    lines.push(current);
    lines
}

fn quote_neighbor(symbols: &[char], index: usize) -> bool {
    is_cyrillic(symbols[index]) || symbols[index] == '\''
}

/// Whether the apostrophe at `index` sits inside Cyrillic text.
fn is_embedded_quote(symbols: &[char], index: usize) -> bool {
    if symbols[index] != '\'' {
        return false;
    }
    let has_left = index > 0;
    let has_right = index + 1 < symbols.len();
    match (has_left, has_right) {
        (true, true) => quote_neighbor(symbols, index - 1) && quote_neighbor(symbols, index + 1),
        (true, false) => quote_neighbor(symbols, index - 1),
        (false, true) => quote_neighbor(symbols, index + 1),
        (false, false) => false,
    }
}

fn escape_quotes(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .map(|line| {
            let symbols: Vec<char> = line.chars().collect();
            let mut out = String::with_capacity(line.len());
            for (index, &c) in symbols.iter().enumerate() {
                if is_embedded_quote(&symbols, index) {
                    out.push_str(&char_code(c));
                } else {
                    out.push(c);
                }
            }
            out
        })
        .collect()
}

fn escape_cyrillic(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .map(|line| {
            let mut out = String::with_capacity(line.len());
            for c in line.chars() {
                if is_cyrillic(c) {
                    out.push_str(&char_code(c));
                } else {
                    out.push(c);
                }
            }
            out
        })
        .collect()
}

fn is_literal_line(line: &str) -> bool {
    line.contains('#') || line.contains('\'') || line.trim_start_matches(' ').is_empty()
}

fn starts_literal(line: &str) -> bool {
    let line = line.trim_start_matches(' ');
    line.starts_with('\'') || line.starts_with('#') || line.is_empty()
}

/// Append explicit line-break escapes where a literal continues on the next
/// line. Value lists are copied through untouched.
fn mark_line_breaks(lines: Vec<String>) -> Vec<String> {
    let count = lines.len();
    let mut result = Vec::with_capacity(count);
    let mut i = 0;

    while i + 1 < count {
        if lines[i].contains(VALUE_LIST) {
            while i < count && !lines[i].contains(')') {
                result.push(lines[i].clone());
                i += 1;
            }
            if i < count {
                result.push(lines[i].clone());
                i += 1;
            }
            if i + 1 >= count {
                break;
            }
        }

        let line = &lines[i];
        let next = &lines[i + 1];
        if (is_literal_line(line) && starts_literal(next))
            || (line.trim_end_matches(' ').ends_with('=') && next.is_empty())
        {
            result.push(format!("{line}{LINE_BREAK_CODES}"));
        } else {
            result.push(line.clone());
        }
        i += 1;
    }

    if i < count {
        result.push(lines[count - 1].clone());
    }
    result
}

/// Char offset where a line's literal part starts, one before the first
/// quote or escape. Offsets at the line start do not count.
fn literal_start(symbols: &[char]) -> Option<usize> {
    [
        symbols.iter().position(|&c| c == '#'),
        symbols.iter().position(|&c| c == '\''),
    ]
    .into_iter()
    .flatten()
    .filter(|&pos| pos >= 2)
    .map(|pos| pos - 1)
    .min()
}

/// Re-wrap literals so that no line holds more than 64 characters.
fn wrap_literals(lines: Vec<String>) -> Vec<String> {
    let mut result = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        let symbols: Vec<char> = lines[i].chars().collect();
        let Some(start) = literal_start(&symbols) else {
            result.push(lines[i].clone());
            i += 1;
            continue;
        };

        let head: String = symbols[..start].iter().collect();
        let indent = symbols.iter().take_while(|&&c| c == ' ').count();
        let literal: String = symbols[start..].iter().collect();

        let mut chunk = vec![literal.clone()];
        i += 1;
        while i < lines.len() && (lines[i].starts_with('#') || lines[i].starts_with('\'')) {
            chunk.push(lines[i].clone());
            i += 1;
        }

        let mut pieces = cut_on_length(&chunk).into_iter();
        match pieces.next() {
            Some(first) => {
                result.push(head + &first);
                let pad = " ".repeat(indent);
                result.extend(pieces.map(|piece| format!("{pad}{piece}")));
            }
            None => result.push(head + &literal),
        }
    }
    result
}

/// Append `#` and up to four digits starting at `index`. Returns the index
/// after the escape.
fn push_char_code(out: &mut String, symbols: &[char], index: usize) -> usize {
    out.push(symbols[index]);
    let mut i = index + 1;
    let mut digits = 0;
    while i < symbols.len() && digits < 4 && symbols[i].is_numeric() {
        out.push(symbols[i]);
        digits += 1;
        i += 1;
    }
    i
}

/// Whether a line cut after `index` leaves an open quoted run.
fn needs_closing_quote(symbols: &[char], index: usize) -> bool {
    let left = index.saturating_sub(4);
    let need_quotes = symbols[index] != '\'';
    let mut i = index;
    while symbols[i].is_numeric() && i > left {
        i -= 1;
    }
    symbols[i] != '#' && need_quotes
}

fn break_line(out: &mut String, symbols: &[char], index: usize, result: &mut Vec<String>) {
    if needs_closing_quote(symbols, index) {
        out.push('\'');
    }
    if index + 2 < symbols.len() {
        out.push_str(" +");
    }
    result.push(std::mem::take(out));
}

/// Cut a literal run into lines of at most 64 decoded characters.
fn cut_on_length(chunk: &[String]) -> Vec<String> {
    let symbols: Vec<char> = chunk
        .iter()
        .flat_map(|line| line.replace("''", "").chars().collect::<Vec<_>>())
        .collect();
    let Some(&first) = symbols.first() else {
        return Vec::new();
    };

    let mut result = Vec::with_capacity(chunk.len());
    let mut out = String::with_capacity(100);
    out.push(first);
    let mut count = 0;
    let mut i = 1;

    while i < symbols.len() {
        match symbols[i] {
            '#' => {
                i = push_char_code(&mut out, &symbols, i) - 1;
                count += 1;
            }
            '\'' => {
                if !out.is_empty() {
                    out.push('\'');
                }
            }
            c => {
                if out.is_empty() {
                    out.push('\'');
                }
                out.push(c);
                count += 1;
            }
        }

        if count == LINE_WIDTH {
            count = 0;
            break_line(&mut out, &symbols, i, &mut result);
        }
        i += 1;
    }

    if !out.is_empty() {
        result.push(out);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn split_lines_prefers_lf_cr_pairs() {
        assert_eq!(split_lines("a\n\rb\r\nc\rd\ne"), vec!["a", "b", "c", "d", "e"]);
        assert_eq!(split_lines("a\r\n"), vec!["a", ""]);
    }

    #[test]
    fn quotes_inside_cyrillic_are_escaped() {
        let lines = escape_quotes(vec!["д'а".into(), "'д".into(), "a'b".into(), "'".into()]);
        assert_eq!(lines, vec!["д#39а", "#39д", "a'b", "'"]);
    }

    #[test]
    fn line_break_codes_mark_continued_literals() {
        let lines = mark_line_breaks(vec![
            "Caption = 'a'".into(),
            "'b'".into(),
            "Name =".into(),
            "".into(),
            "end".into(),
        ]);
        assert_eq!(
            lines,
            vec!["Caption = 'a'#13#10", "'b'", "Name =#13#10", "", "end"]
        );
    }

    #[test]
    fn value_lists_are_copied_through() {
        let lines = mark_line_breaks(vec![
            "Items.ValueList.Strings = (".into(),
            "'x'".into(),
            "'y')".into(),
            "end".into(),
        ]);
        assert_eq!(
            lines,
            vec!["Items.ValueList.Strings = (", "'x'", "'y')", "end"]
        );
    }

    #[test]
    fn value_list_at_end_is_not_duplicated() {
        let lines = mark_line_breaks(vec!["X.ValueList.Strings = (".into(), "'a')".into()]);
        assert_eq!(lines, vec!["X.ValueList.Strings = (", "'a')"]);
    }

    #[test]
    fn escape_counts_as_one_character() {
        let literal = format!("'{}'", "a".repeat(63));
        let pieces = cut_on_length(&[format!("{literal}#1040")]);
        assert_eq!(pieces.len(), 1);
    }

    #[test]
    fn literal_line_at_column_zero_is_kept() {
        assert_eq!(wrap_literals(vec!["'abc'".into()]), vec!["'abc'"]);
    }
}
