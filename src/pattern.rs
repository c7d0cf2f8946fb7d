//! Template compilation.
//!
//! A template such as `artist/year - album/title.extension` is split twice:
//! on the path delimiter to get directory/file segments, and on the delimiter
//! plus space, dash and dot to get the substitution keys. Keys may contain
//! any other character, so `xmpDM:trackNumber` stays one key.

use crate::error::PatternError;

/// Separator between directory levels in a template.
pub const DEFAULT_DELIMITER: char = '/';

/// Layout used when no pattern is configured.
pub const DEFAULT_PATTERN: &str =
    "albumArtist/releaseYear - album/artist - releaseYear - album - trackNumber - title.extension";

const KEY_SEPARATORS: [char; 3] = [' ', '-', '.'];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Key(String),
}

/// A template split into path segments and substitution keys.
///
/// Immutable once compiled. Each segment keeps its own token stream so a
/// substituted value can never introduce a new directory level.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    raw: String,
    delimiter: char,
    segments: Vec<String>,
    keys: Vec<String>,
    tokens: Vec<Vec<Token>>,
}

impl CompiledPattern {
    pub fn compile(template: &str, delimiter: char) -> Result<Self, PatternError> {
        if template.trim().is_empty() {
            return Err(PatternError::Empty);
        }

        let segments: Vec<String> = template
            .split(delimiter)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        let tokens: Vec<Vec<Token>> = segments.iter().map(|s| tokenize(s)).collect();
        let keys: Vec<String> = tokens
            .iter()
            .flatten()
            .filter_map(|t| match t {
                Token::Key(k) => Some(k.clone()),
                Token::Literal(_) => None,
            })
            .collect();

        if keys.is_empty() {
            return Err(PatternError::NoKeys(template.to_string()));
        }

        Ok(Self {
            raw: template.to_string(),
            delimiter,
            segments,
            keys,
            tokens,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Outer-to-inner directory segments; the last one is the file name.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Every key occurrence in template order, duplicates included.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Keys in first-occurrence order with duplicates removed.
    pub fn unique_keys(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::with_capacity(self.keys.len());
        for k in &self.keys {
            if !seen.contains(&k.as_str()) {
                seen.push(k);
            }
        }
        seen
    }

    /// Render each segment, replacing every key token with `value(key)`.
    ///
    /// Literal text between keys is copied as-is. Components that would render
    /// empty, `.` or `..` are replaced with `_`.
    pub fn render<F>(&self, value: F) -> Vec<String>
    where
        F: Fn(&str) -> String,
    {
        self.tokens
            .iter()
            .map(|segment| {
                let mut out = String::new();
                for token in segment {
                    match token {
                        Token::Literal(s) => out.push_str(s),
                        Token::Key(k) => out.push_str(&value(k)),
                    }
                }
                match out.as_str() {
                    "" | "." | ".." => "_".to_string(),
                    _ => out,
                }
            })
            .collect()
    }
}

fn tokenize(segment: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut key = String::new();
    let mut literal = String::new();

    for c in segment.chars() {
        if KEY_SEPARATORS.contains(&c) {
            if !key.is_empty() {
                tokens.push(Token::Key(std::mem::take(&mut key)));
            }
            literal.push(c);
        } else {
            if !literal.is_empty() {
                tokens.push(Token::Literal(std::mem::take(&mut literal)));
            }
            key.push(c);
        }
    }
    if !key.is_empty() {
        tokens.push(Token::Key(key));
    }
    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    tokens
}
