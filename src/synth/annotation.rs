//! Per-field metadata: `required:true; example:7; enum:1,2,3`.
use crate::config::RepeatedEnum;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    pub required: bool,
    /// Raw literal; converted against the field kind later.
    pub example: Option<String>,
    pub enum_: Vec<String>,
}

impl Annotation {
    /// Clauses are `;`-separated and matched by prefix. Unknown clauses are
    /// ignored. A repeated `required:` or `example:` overwrites the earlier
    /// one; a repeated `enum:` follows `repeated_enum`.
    pub fn parse(meta: &str, repeated_enum: RepeatedEnum) -> Self {
        let mut out = Self::default();
        for clause in meta.split(';').map(str::trim) {
            if let Some(v) = clause.strip_prefix("required:") {
                out.required = v.trim() == "true";
            } else if let Some(v) = clause.strip_prefix("example:") {
                out.example = Some(v.trim().to_string());
            } else if let Some(v) = clause.strip_prefix("enum:") {
                if repeated_enum == RepeatedEnum::Replace && !out.enum_.is_empty() {
                    tracing::debug!(meta, "later enum clause replaces earlier candidates");
                    out.enum_.clear();
                }
                out.enum_.extend(v.split(',').map(|e| e.trim().to_string()));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(meta: &str) -> Annotation {
        Annotation::parse(meta, RepeatedEnum::Replace)
    }

    #[test]
    fn empty_meta_is_default() {
        assert_eq!(parse(""), Annotation::default());
    }

    #[test]
    fn clauses_are_trimmed_and_matched_by_prefix() {
        let a = parse(" required:true ;  example: 7 ; enum: a, b ,c ; note:ignored");
        assert!(a.required);
        assert_eq!(a.example.as_deref(), Some("7"));
        assert_eq!(a.enum_, vec!["a", "b", "c"]);
    }

    #[test]
    fn required_needs_literal_true() {
        assert!(!parse("required:yes").required);
        assert!(!parse("required:").required);
    }

    #[test]
    fn last_required_and_example_win() {
        let a = parse("required:true;example:1;required:false;example:2");
        assert!(!a.required);
        assert_eq!(a.example.as_deref(), Some("2"));
    }

    #[test]
    fn repeated_enum_follows_policy() {
        let meta = "enum:1,2;enum:3";
        assert_eq!(parse(meta).enum_, vec!["3"]);
        assert_eq!(Annotation::parse(meta, RepeatedEnum::Append).enum_, vec!["1", "2", "3"]);
    }

    #[test]
    fn example_may_contain_colons() {
        let a = parse("example:2024-05-01T10:00:00Z");
        assert_eq!(a.example.as_deref(), Some("2024-05-01T10:00:00Z"));
    }
}
