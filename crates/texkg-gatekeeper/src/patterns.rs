//! Text recognizers shared by extraction, grounding, and pruning

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\label\{([^}]+)\}").expect("valid regex"));

static MATH_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\[a-zA-Z]+|\$|\\\[|\\\(|[=<>^_]|\d\s*[+\-*/]\s*\d|[a-zA-Z]\s*[+\-]\s*[a-zA-Z0-9]\b")
        .expect("valid regex")
});

static MATH_CHAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[()\\=$_^]").expect("valid regex"));

static GENERIC_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(formula|equation|definition|theorem|lemma|corollary|proposition|axiom|conclusion|example|exercise|notation|construction|concept|result|statement)?\s*\d*\.?$",
    )
    .expect("valid regex")
});

static TEMPLATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // P(X = x) = p(...)
        r"P\s*\(\s*[A-Za-z]\\?[_A-Za-z0-9]*\s*=\s*[A-Za-z0-9_{}\\]+\s*\)\s*=\s*p\s*\(",
        r"P\\left\(\s*[A-Za-z]\\?[_A-Za-z0-9]*\s*=\s*[A-Za-z0-9_{}\\]+\s*\\right\)\s*=\s*p\\left\(",
        // f_X(x), f(x)
        r"\bf_?[A-Za-z]\s*\(\s*[A-Za-z]\s*\)",
        // p_X(x), p(x)
        r"p_?[A-Za-z]\s*\(\s*[A-Za-z]\s*\)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static NEG_INFTY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\s*\\infty").expect("valid regex"));
static LESS_THAN_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\s*[A-Za-z]").expect("valid regex"));

static OMEGA_INDEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\Omega_\{?\d+\}?").expect("valid regex"));
static LETTER_INDEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]_\{?\d+\}?").expect("valid regex"));

/// Environments whose solutions/answers are folded into the parent node
pub const EXAMPLE_ENVIRONMENTS: [&str; 2] = ["example", "exercise"];

/// Sub-blocks nested into Example/Exercise `meta`
pub const SOLUTION_ENVIRONMENTS: [&str; 2] = ["solution", "answer"];

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

/// First `\label{...}` argument in `s`
pub fn first_label(s: &str) -> Option<String> {
    LABEL_RE
        .captures(s)
        .map(|c| c[1].trim().to_string())
        .filter(|l| !l.is_empty())
}

/// Distinct `\label{...}` names in `s`, in order of first appearance
pub fn labels_in(s: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for caps in LABEL_RE.captures_iter(s) {
        let label = caps[1].trim();
        if !label.is_empty() && !out.iter().any(|l| l == label) {
            out.push(label.to_string());
        }
    }
    out
}

/// Whether `s` contains an elision marker (`...`, `…`, `略`)
pub fn contains_ellipsis(s: &str) -> bool {
    s.contains("...") || s.contains('…') || s.contains('略')
}

/// Whether `s` carries at least one recognizable mathematical token
pub fn looks_like_math(s: &str) -> bool {
    MATH_TOKEN_RE.is_match(s)
}

/// Whether a title reads like prose rather than a name
///
/// Prose titles have no math characters and are either long in CJK
/// characters or six or more words.
pub fn looks_narrative_title(title: &str) -> bool {
    let title = title.trim();
    if MATH_CHAR_RE.is_match(title) {
        return false;
    }
    let cjk = title.chars().filter(|&c| is_cjk(c)).count();
    let words = title.split_whitespace().count();
    (title.chars().count() >= 8 && cjk >= 8) || words >= 6
}

/// Whitespace-insensitive substring test
pub fn appears_in(haystack: &str, needle: &str) -> bool {
    let needle = collapse_whitespace(needle);
    if needle.is_empty() {
        return true;
    }
    collapse_whitespace(haystack).contains(&needle)
}

/// Whether a title is just a type name and/or a number
pub fn is_generic_title(title: &str) -> bool {
    GENERIC_TITLE_RE.is_match(title.trim())
}

/// Generic probability/density/domain notation that is never a reusable concept
pub fn looks_like_template_formula(s: &str) -> bool {
    let t = collapse_whitespace(s);
    if t.is_empty() {
        return false;
    }
    if TEMPLATE_PATTERNS.iter().any(|re| re.is_match(&t)) {
        return true;
    }
    // (-\infty, \infty) style domains
    t.contains("\\infty") && NEG_INFTY_RE.is_match(&t) && LESS_THAN_VAR_RE.is_match(&t)
}

/// Exercise-local objects such as `\Omega_5` or `A_{12}`
pub fn looks_problem_indexed(s: &str) -> bool {
    let t: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if t.is_empty() {
        return false;
    }
    if OMEGA_INDEX_RE.is_match(&t) {
        return true;
    }
    LETTER_INDEX_RE.is_match(&t) && t.chars().count() <= 25
}

/// One `\begin{name} ... \end{name}` occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvSpan {
    /// Environment name as written (lowercased)
    pub name: String,
    /// Byte range of the whole block including delimiters
    pub outer: Range<usize>,
    /// Byte range between `\begin{...}` and `\end{...}`
    pub body: Range<usize>,
}

impl EnvSpan {
    /// Untrimmed body text
    pub fn body<'a>(&self, text: &'a str) -> &'a str {
        &text[self.body.clone()]
    }

    /// Whole block text
    pub fn outer<'a>(&self, text: &'a str) -> &'a str {
        &text[self.outer.clone()]
    }
}

/// Find non-overlapping environments, leftmost first
///
/// Each `\begin{x}` is closed by the first following `\end{x}`; names are
/// matched case-insensitively. Unclosed openings are skipped.
pub fn find_environments(text: &str, names: &[&str]) -> Vec<EnvSpan> {
    if names.is_empty() {
        return Vec::new();
    }
    let alternation = names
        .iter()
        .map(|n| regex::escape(n))
        .collect::<Vec<_>>()
        .join("|");
    let Ok(begin_re) = Regex::new(&format!(r"(?i)\\begin\{{({})\}}", alternation)) else {
        return Vec::new();
    };

    let mut spans = Vec::new();
    let mut pos = 0;
    while pos < text.len() {
        let Some(caps) = begin_re.captures_at(text, pos) else {
            break;
        };
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let end_re = Regex::new(&format!(r"(?i)\\end\{{{}\}}", regex::escape(name.as_str())));
        let closing = end_re.ok().and_then(|re| re.find_at(text, whole.end()));
        match closing {
            Some(end) => {
                spans.push(EnvSpan {
                    name: name.as_str().to_ascii_lowercase(),
                    outer: whole.start()..end.end(),
                    body: whole.end()..end.start(),
                });
                pos = end.end();
            }
            None => pos = whole.end(),
        }
    }
    spans
}

/// Byte ranges covered by Example/Exercise blocks
///
/// A solution/answer block that directly follows an example (only whitespace
/// in between) is counted as part of it.
pub fn example_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans: Vec<Range<usize>> = find_environments(text, &EXAMPLE_ENVIRONMENTS)
        .into_iter()
        .map(|s| s.outer)
        .collect();
    let trailing = find_environments(text, &SOLUTION_ENVIRONMENTS);
    for span in spans.iter_mut() {
        for sol in &trailing {
            if sol.outer.start >= span.end && text[span.end..sol.outer.start].trim().is_empty() {
                span.end = sol.outer.end;
            }
        }
    }
    spans
}

/// Whether byte offset `pos` lies inside any of `spans`
pub fn within_spans(spans: &[Range<usize>], pos: usize) -> bool {
    spans.iter().any(|s| s.contains(&pos))
}
