use anyhow::{Context, Result};
use regex::{Captures, Regex};
use serde::Serialize;

/// An `index/total` counter as written in a subject line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NumberPair {
    pub index: u32,
    pub total: u32,
}

impl NumberPair {
    /// Counter assumed for subjects that carry no numbering of a given kind.
    pub const SINGLE: Self = Self { index: 1, total: 1 };

    pub fn new(index: u32, total: u32) -> Self {
        Self { index, total }
    }

    /// Digits that do not fit a `u32` make the pair unusable.
    fn from_captures(caps: &Captures<'_>, index: &str, total: &str) -> Option<Self> {
        let index = caps.name(index)?.as_str().parse().ok()?;
        let total = caps.name(total)?.as_str().parse().ok()?;
        Some(Self { index, total })
    }
}

/// A numbering token found in the subject, tagged by its bracket shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberToken {
    /// `[1/2]`, `<1/2>`, `"[1/2]"` or a bare `1/2`.
    Bracketed(NumberPair),
    /// `(1/2)`, optionally quote-wrapped.
    Parenthesized(NumberPair),
}

/// Result of the numbering pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Numbering {
    pub files: NumberPair,
    pub segments: NumberPair,
    /// Subject text with the consumed counters cut out.
    pub remainder: String,
}

/// `[1/2]`, `<1/2>`, `"[1/2]"` or a bare `1/2`.
const BRACKETED_COUNTER: &str =
    r#"(?:"?\[|[<\[]? *)(?P<bracket_index>[0-9]+) */ *(?P<bracket_total>[0-9]+) *(?:\]"?|[>\]])?"#;

/// `(1/2)`, optionally quote-wrapped.
const PARENTHESIZED_COUNTER: &str =
    r#""?\((?P<paren_index>[0-9]+) */ *(?P<paren_total>[0-9]+)\)"?"#;

#[derive(Debug)]
pub struct NumberingMatcher {
    counter: Regex,
    spelled_out: Regex,
}

impl NumberingMatcher {
    pub fn new() -> Result<Self> {
        Ok(Self {
            counter: Regex::new(&format!(
                "(?P<bracketed>{BRACKETED_COUNTER})|(?P<parenthesized>{PARENTHESIZED_COUNTER})"
            ))
            .context("failed to compile counter regex")?,
            spelled_out: Regex::new(
                r"(?i)^(?P<before>.*?) *(?:\[|[<\[]? *(?:file|datei)?) *(?P<index>[0-9]+) *(?:of|von) *(?P<total>[0-9]+) *(?:\]|[>\]])?(?P<after>.*)$",
            )
            .context("failed to compile spelled-out counter regex")?,
        })
    }

    pub fn extract(&self, subject: &str) -> Numbering {
        let (tokens, remainder) = self.tokenize(subject);
        let (files, segments) = assign_roles(&tokens);

        let segments = segments.unwrap_or(NumberPair::SINGLE);
        let (files, remainder) = match files {
            Some(files) => (files, remainder),
            None => self
                .spelled_out_files(&remainder)
                .unwrap_or((NumberPair::SINGLE, remainder)),
        };

        Numbering {
            files,
            segments,
            remainder,
        }
    }

    /// Splits the subject into counter tokens and the text around them.
    ///
    /// Both counter shapes are searched in a single left-to-right pass, so
    /// the leftmost token wins and a bracketed and a parenthesized token
    /// starting at the same offset resolve to the bracketed one.
    pub fn tokenize(&self, subject: &str) -> (Vec<NumberToken>, String) {
        let mut tokens = Vec::new();
        let mut pieces = Vec::new();
        let mut pos = 0;

        for caps in self.counter.captures_iter(subject) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            pieces.push(&subject[pos..whole.start()]);
            pos = whole.end();

            let token = if caps.name("bracketed").is_some() {
                NumberPair::from_captures(&caps, "bracket_index", "bracket_total")
                    .map(NumberToken::Bracketed)
            } else {
                NumberPair::from_captures(&caps, "paren_index", "paren_total")
                    .map(NumberToken::Parenthesized)
            };
            if let Some(token) = token {
                tokens.push(token);
            }
        }
        pieces.push(&subject[pos..]);

        (tokens, join_trimmed(pieces))
    }

    /// `5 of 12`, `[file 5 of 12]`, `<datei 5 von 12>` and friends.
    fn spelled_out_files(&self, remainder: &str) -> Option<(NumberPair, String)> {
        let caps = self.spelled_out.captures(remainder)?;
        let pair = NumberPair::from_captures(&caps, "index", "total")?;
        let before = caps.name("before").map_or("", |m| m.as_str());
        let after = caps.name("after").map_or("", |m| m.as_str());

        Some((pair, join_trimmed([before, after])))
    }
}

/// Assigns file and segment roles, walking the tokens from the right.
///
/// Most posters put the segment counter last, so when two tokens share a
/// bracket shape the rightmost one ends up as the segment counter.
pub fn assign_roles(tokens: &[NumberToken]) -> (Option<NumberPair>, Option<NumberPair>) {
    let mut files = None;
    let mut segments = None;

    for token in tokens.iter().rev() {
        match (files, segments, *token) {
            (Some(_), Some(_), _) => break,
            (None, None, NumberToken::Bracketed(pair)) => files = Some(pair),
            (None, None, NumberToken::Parenthesized(pair)) => segments = Some(pair),
            (Some(later), None, NumberToken::Bracketed(pair)) => {
                segments = Some(later);
                files = Some(pair);
            }
            (Some(_), None, NumberToken::Parenthesized(pair)) => segments = Some(pair),
            (None, Some(_), NumberToken::Bracketed(pair))
            | (None, Some(_), NumberToken::Parenthesized(pair)) => files = Some(pair),
        }
    }

    (files, segments)
}

/// Trims every piece, drops the empty ones and joins the rest with one space.
pub fn join_trimmed<'a, I>(pieces: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    pieces
        .into_iter()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
