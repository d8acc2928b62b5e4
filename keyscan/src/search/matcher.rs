use std::collections::VecDeque;

/// Strategy for matching one line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineStrategy {
    /// Line and folded keyword are ASCII: compare bytes
    Ascii,
    /// Fold every character and compare char slices
    Unicode,
    /// Line is ASCII but the folded keyword is not, so nothing can match
    Impossible,
}

/// Folds a character for case-insensitive comparison.
///
/// Uses the simple (one-to-one) lowercase mapping, then merges the characters
/// that share an uppercase form with another letter (final sigma, long s, dotless
/// i, the Greek symbol variants, ...). One input character always folds to
/// exactly one character, so columns stay aligned with the original text.
#[inline]
pub fn fold_char(c: char) -> char {
    if c.is_ascii() {
        return c.to_ascii_lowercase();
    }
    let lower = match c {
        // the only character whose full lowercase mapping is longer than one char
        'İ' => 'i',
        _ => {
            let mut lower = c.to_lowercase();
            match (lower.next(), lower.next()) {
                (Some(l), None) => l,
                _ => c,
            }
        }
    };
    match lower {
        'ς' => 'σ',
        'ſ' => 's',
        'ı' => 'i',
        'ϐ' => 'β',
        'ϑ' => 'θ',
        'ϕ' => 'φ',
        'ϖ' => 'π',
        'ϰ' => 'κ',
        'ϱ' => 'ρ',
        'ϵ' => 'ε',
        'ẛ' => 'ṡ',
        '\u{345}' | '\u{1fbe}' => 'ι',
        'ﬅ' => 'ﬆ',
        other => other,
    }
}

/// Literal, case-insensitive keyword matcher.
///
/// The keyword is plain text: characters such as `.` or `*` only match themselves.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    folded: Vec<char>,
    folded_ascii: Option<Vec<u8>>,
}

impl KeywordMatcher {
    pub fn new(keyword: &str) -> Self {
        let folded: Vec<char> = keyword.chars().map(fold_char).collect();
        let folded_ascii = folded
            .iter()
            .all(char::is_ascii)
            .then(|| folded.iter().map(|&c| c as u8).collect());
        Self {
            folded,
            folded_ascii,
        }
    }

    /// Whether `text` contains the keyword anywhere
    pub fn is_match(&self, text: &str) -> bool {
        let mut columns = VecDeque::new();
        self.collect_columns(text, &mut Vec::new(), &mut columns);
        !columns.is_empty()
    }

    /// 1-based character columns of every non-overlapping occurrence in `line`
    pub fn find_columns(&self, line: &str) -> Vec<usize> {
        let mut columns = VecDeque::new();
        self.collect_columns(line, &mut Vec::new(), &mut columns);
        columns.into()
    }

    fn strategy_for(&self, line: &str) -> LineStrategy {
        if !line.is_ascii() {
            LineStrategy::Unicode
        } else if self.folded_ascii.is_some() {
            LineStrategy::Ascii
        } else {
            LineStrategy::Impossible
        }
    }

    /// Appends the columns found in `line` to `out`, scanning left to right and
    /// resuming after each match. `scratch` is reused between calls to avoid
    /// allocating per line.
    pub(crate) fn collect_columns(
        &self,
        line: &str,
        scratch: &mut Vec<char>,
        out: &mut VecDeque<usize>,
    ) {
        let n = self.folded.len();
        if n == 0 {
            return;
        }

        match self.strategy_for(line) {
            LineStrategy::Impossible => {}
            LineStrategy::Ascii => {
                let needle = self.folded_ascii.as_deref().unwrap_or_default();
                let hay = line.as_bytes();
                let mut i = 0;
                while i + n <= hay.len() {
                    if hay[i..i + n].eq_ignore_ascii_case(needle) {
                        out.push_back(i + 1);
                        i += n;
                    } else {
                        i += 1;
                    }
                }
            }
            LineStrategy::Unicode => {
                scratch.clear();
                scratch.extend(line.chars().map(fold_char));
                let mut i = 0;
                while i + n <= scratch.len() {
                    if scratch[i..i + n] == self.folded[..] {
                        out.push_back(i + 1);
                        i += n;
                    } else {
                        i += 1;
                    }
                }
            }
        }
    }
}
