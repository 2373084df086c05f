//! Order tokens: key prefixes that make a sorted encoder emit members in
//! declaration order, removed from the final text afterwards.
//!
//! Token shape: `{index:0width$}__{uuid}$`. The zero padding keeps
//! lexicographic order equal to numeric order up to `10^width` siblings; the
//! uuid keeps every token unique so stripping is a plain substring removal.
use regex::Regex;
use uuid::Uuid;

pub const TOKEN_DELIMITER: char = '$';

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderToken(String);

impl OrderToken {
    pub fn as_str(&self) -> &str { &self.0 }

    /// The working key: token followed by the serialized field key.
    pub fn prefix(&self, key: &str) -> String {
        format!("{}{key}", self.0)
    }
}

/// Mints tokens for one synthesis call and remembers every one of them.
#[derive(Debug)]
pub struct TokenMinter {
    pad_width: usize,
    minted: Vec<OrderToken>,
}

impl TokenMinter {
    pub fn new(pad_width: usize) -> Self {
        Self { pad_width, minted: Vec::new() }
    }

    pub fn mint(&mut self, index: usize) -> OrderToken {
        let token = OrderToken(format!(
            "{index:0width$}__{}{TOKEN_DELIMITER}",
            Uuid::new_v4().simple(),
            width = self.pad_width,
        ));
        self.minted.push(token.clone());
        token
    }

    pub fn into_tokens(self) -> Vec<OrderToken> { self.minted }
}

/// Remove every token from `text`. Pure substitution, no re-parsing; running
/// it twice is the same as running it once.
pub fn strip(text: &str, tokens: &[OrderToken]) -> String {
    if tokens.is_empty() {
        return text.to_string();
    }
    let pattern = tokens.iter()
        .map(|t| regex::escape(t.as_str()))
        .collect::<Vec<_>>()
        .join("|");
    match Regex::new(&pattern) {
        Ok(rx) => rx.replace_all(text, "").into_owned(),
        Err(error) => {
            // alternation too large for one automaton
            tracing::debug!(%error, tokens = tokens.len(), "stripping tokens one by one");
            tokens.iter().fold(text.to_string(), |acc, t| acc.replace(t.as_str(), ""))
        }
    }
}
