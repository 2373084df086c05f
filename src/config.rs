//! Synthesis knobs. Every field has a default so a config file only needs the
//! values it changes.
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::Result;

// ------------------------------- Defaults --------------------------------- //

/// How many times one type may be expanded before its subtree is cut.
pub const DEFAULT_DEPTH_BOUND: u32 = 2;
/// Zero-padding for the index part of an order token.
pub const DEFAULT_TOKEN_PAD_WIDTH: usize = 4;

// -------------------------------- Types ----------------------------------- //

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SynthConfig {
    pub depth_bound: u32,
    pub guard: GuardPolicy,
    pub ordering: KeyOrdering,
    pub token_pad_width: usize,
    pub enum_clauses: RepeatedEnum,
}

/// What the navigation guard counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GuardPolicy {
    /// Every visit within one synthesis call, siblings included.
    #[default]
    Cumulative,
    /// Only occurrences on the path from the root to the current field.
    Ancestry,
}

/// How field order survives into the encoded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum KeyOrdering {
    /// Insertion-ordered maps all the way down.
    #[default]
    Declaration,
    /// Keys are prefixed with order tokens, encoded sorted, then stripped.
    Tokens,
}

/// What a second `enum:` clause in one annotation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RepeatedEnum {
    /// Last clause wins, like `required:` and `example:`.
    #[default]
    Replace,
    /// Candidates from every clause are concatenated.
    Append,
}

// ---------------------------- Implementation ------------------------------ //

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            depth_bound: DEFAULT_DEPTH_BOUND,
            guard: GuardPolicy::default(),
            ordering: KeyOrdering::default(),
            token_pad_width: DEFAULT_TOKEN_PAD_WIDTH,
            enum_clauses: RepeatedEnum::default(),
        }
    }
}

impl SynthConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        crate::path_de::from_file_with_path(path)
    }

    pub fn with_ordering(mut self, ordering: KeyOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn with_guard(mut self, guard: GuardPolicy) -> Self {
        self.guard = guard;
        self
    }

    pub fn with_depth_bound(mut self, depth_bound: u32) -> Self {
        self.depth_bound = depth_bound;
        self
    }

    pub fn with_enum_clauses(mut self, enum_clauses: RepeatedEnum) -> Self {
        self.enum_clauses = enum_clauses;
        self
    }
}
