//! Derivation of [`CommitRelationship`] from ref facts gathered by the analyzer.

use crate::core::types::CommitRelationship;

/// Facts about `HEAD` versus `origin/<base>` needed to pick a relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefFacts {
    pub head: String,
    /// `None` when the origin ref does not resolve.
    pub origin: Option<String>,
    /// `git merge-base --is-ancestor HEAD origin`.
    pub head_is_ancestor: bool,
    /// `git merge-base --is-ancestor origin HEAD`.
    pub origin_is_ancestor: bool,
    /// Merge base of the two refs, when known.
    pub merge_base: Option<String>,
}

/// Pick the relationship, first match wins:
///
/// - unresolvable origin ⇒ `Divergent`
/// - equal SHAs ⇒ `Same`
/// - HEAD ancestor of origin ⇒ `Ancestor`
/// - origin ancestor of HEAD ⇒ `Ahead`
/// - merge base equals HEAD but not origin ⇒ `Behind`
/// - otherwise ⇒ `Divergent`
pub fn derive(facts: &RefFacts) -> CommitRelationship {
    let Some(origin) = facts.origin.as_deref() else {
        return CommitRelationship::Divergent;
    };
    if facts.head == origin {
        return CommitRelationship::Same;
    }
    if facts.head_is_ancestor {
        return CommitRelationship::Ancestor;
    }
    if facts.origin_is_ancestor {
        return CommitRelationship::Ahead;
    }
    match facts.merge_base.as_deref() {
        Some(base) if base == facts.head && base != origin => CommitRelationship::Behind,
        _ => CommitRelationship::Divergent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(head: &str, origin: Option<&str>) -> RefFacts {
        RefFacts {
            head: head.to_string(),
            origin: origin.map(str::to_string),
            head_is_ancestor: false,
            origin_is_ancestor: false,
            merge_base: None,
        }
    }

    #[test]
    fn missing_origin_degrades_to_divergent() {
        let mut f = facts("aaa", None);
        f.head_is_ancestor = true;
        assert_eq!(derive(&f), CommitRelationship::Divergent);
    }

    #[test]
    fn equal_shas_are_same_even_when_ancestry_flags_are_set() {
        let mut f = facts("aaa", Some("aaa"));
        f.head_is_ancestor = true;
        f.origin_is_ancestor = true;
        assert_eq!(derive(&f), CommitRelationship::Same);
    }

    #[test]
    fn head_contained_in_origin_is_ancestor() {
        let mut f = facts("aaa", Some("bbb"));
        f.head_is_ancestor = true;
        assert_eq!(derive(&f), CommitRelationship::Ancestor);
    }

    #[test]
    fn origin_contained_in_head_is_ahead() {
        let mut f = facts("aaa", Some("bbb"));
        f.origin_is_ancestor = true;
        assert_eq!(derive(&f), CommitRelationship::Ahead);
    }

    #[test]
    fn merge_base_at_head_without_ancestry_flag_is_behind() {
        let mut f = facts("aaa", Some("bbb"));
        f.merge_base = Some("aaa".to_string());
        assert_eq!(derive(&f), CommitRelationship::Behind);
    }

    #[test]
    fn unrelated_histories_are_divergent() {
        let mut f = facts("aaa", Some("bbb"));
        f.merge_base = Some("ccc".to_string());
        assert_eq!(derive(&f), CommitRelationship::Divergent);
    }
}
