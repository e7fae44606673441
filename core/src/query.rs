//! Search queries over full-text index fields.
//!
//! # Design
//! A `Query` is a conjunction of field clauses. Values are split into terms
//! the same way RediSearch splits stored text with its default tokenizer:
//! on whitespace and ASCII punctuation other than `_`, lowercased, with the
//! default stopwords removed. A clause matches when every term appears in
//! the field. Rendering with `Display` produces the RediSearch dialect: `*`
//! for match-all, `@field:term` for a single term and `@field:(a b)` for
//! several, clauses separated by spaces (intersection). Terms hold only
//! characters the query parser reads literally, so nothing needs escaping.
//!
//! A non-blank value that leaves no terms (`"!!!"`, `"the"`) cannot match
//! anything. Such a query is flagged instead of rendered, and callers
//! answer it without asking the store.

use std::fmt;

/// Characters RediSearch's default tokenizer splits on, besides whitespace.
const SEPARATORS: &str = ",./(){}[]:;\\~!@#$%^&*-=+|'`\"<>?";

/// RediSearch's default stopword list. These are never indexed.
const STOPWORDS: [&str; 33] = [
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is",
    "it", "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there",
    "these", "they", "this", "to", "was", "will", "with",
];

/// One `@field:...` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub field: String,
    pub terms: Vec<String>,
}

impl Clause {
    /// Whether every term of the clause occurs in `text`.
    pub fn matches(&self, text: &str) -> bool {
        let words = tokenize(text);
        self.terms.iter().all(|term| words.contains(term))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Query {
    clauses: Vec<Clause>,
    matches_nothing: bool,
}

impl Query {
    pub fn match_all() -> Self {
        Self::default()
    }

    /// Add a clause on `field`. A blank value adds nothing; a value with no
    /// searchable terms (punctuation or stopwords only) makes the whole
    /// query match nothing.
    pub fn and(mut self, field: impl Into<String>, value: &str) -> Self {
        if value.trim().is_empty() {
            return self;
        }
        let terms = tokenize(value);
        if terms.is_empty() {
            self.matches_nothing = true;
        } else {
            self.clauses.push(Clause {
                field: field.into(),
                terms,
            });
        }
        self
    }

    pub fn is_match_all(&self) -> bool {
        self.clauses.is_empty() && !self.matches_nothing
    }

    pub fn matches_nothing(&self) -> bool {
        self.matches_nothing
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.clauses.is_empty() {
            return f.write_str("*");
        }
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match clause.terms.as_slice() {
                [term] => write!(f, "@{}:{term}", clause.field)?,
                terms => write!(f, "@{}:({})", clause.field, terms.join(" "))?,
            }
        }
        Ok(())
    }
}

fn is_stopword(term: &str) -> bool {
    STOPWORDS.contains(&term)
}

/// Split text into lowercase index terms, dropping stopwords.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || SEPARATORS.contains(c))
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .filter(|term| !is_stopword(term))
        .collect()
}
