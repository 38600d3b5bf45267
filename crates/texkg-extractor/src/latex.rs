//! LaTeX text utilities

/// Remove `%` comments while keeping escaped `\%`
///
/// A backslash escapes the character after it; an unescaped `%` discards
/// the rest of its line. Line structure is preserved.
pub fn strip_comments(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    for (i, line) in src.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let mut escaped = false;
        for c in line.chars() {
            if escaped {
                out.push(c);
                escaped = false;
                continue;
            }
            match c {
                '\\' => {
                    out.push(c);
                    escaped = true;
                }
                '%' => break,
                _ => out.push(c),
            }
        }
    }
    out
}

/// Collapse runs of whitespace into single spaces
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Largest char boundary not after `idx`
pub(crate) fn floor_boundary(s: &str, idx: usize) -> usize {
    let mut idx = idx.min(s.len());
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Smallest char boundary not before `idx`
pub(crate) fn ceil_boundary(s: &str, idx: usize) -> usize {
    let mut idx = idx.min(s.len());
    while !s.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_comments() {
        let src = "a % comment\nb \\% kept % gone\n%whole\nc";
        assert_eq!(strip_comments(src), "a \nb \\% kept \n\nc");
    }

    #[test]
    fn test_strip_double_backslash_before_percent() {
        // `\\` is a line break; the following `%` starts a comment
        assert_eq!(strip_comments(r"x \\% tail"), r"x \\");
    }

    #[test]
    fn test_boundaries() {
        let s = "aé";
        assert_eq!(floor_boundary(s, 2), 1);
        assert_eq!(ceil_boundary(s, 2), 3);
        assert_eq!(floor_boundary(s, 99), 3);
    }
}
