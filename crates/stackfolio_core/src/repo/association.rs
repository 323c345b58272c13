//! Technology-set transitions for one project.
//!
//! All transitions are keyed by technology name, never by row id, and only
//! ever describe the per-project association. Shared technology rows are
//! outside their reach.

use crate::model::project::check_unique_names;
use crate::model::{Patch, TechnologyInput, TechnologyVersion, ValidationError};
use std::collections::{BTreeMap, HashSet};

/// Rejects caller lists naming one technology twice.
pub fn ensure_distinct_inputs(inputs: &[TechnologyInput]) -> Result<(), ValidationError> {
    check_unique_names(inputs.iter().map(|input| input.name.as_str()))
}

/// Replace policy: the list to install, or `None` to keep the current set.
///
/// An explicit empty list clears the set. `Null` is treated like `Absent`.
pub fn replacement(patch: &Patch<Vec<TechnologyInput>>) -> Option<&[TechnologyInput]> {
    match patch {
        Patch::Value(list) => Some(list.as_slice()),
        Patch::Absent | Patch::Null => None,
    }
}

/// Overlays `incoming` onto the current set; incoming versions win by name.
///
/// The result is ordered by technology name.
pub fn merge_by_name(
    current: &[TechnologyVersion],
    incoming: &[TechnologyInput],
) -> Vec<TechnologyInput> {
    let mut versions: BTreeMap<&str, &str> = current
        .iter()
        .map(|entry| (entry.name(), entry.version.as_str()))
        .collect();
    for input in incoming {
        versions.insert(input.name.as_str(), input.version.as_str());
    }

    versions
        .into_iter()
        .map(|(name, version)| TechnologyInput::new(name, version))
        .collect()
}

/// Drops every entry whose technology name is listed. Unknown names are ignored.
pub fn remove_by_name(current: Vec<TechnologyVersion>, names: &[String]) -> Vec<TechnologyVersion> {
    let removed: HashSet<&str> = names.iter().map(String::as_str).collect();
    current
        .into_iter()
        .filter(|entry| !removed.contains(entry.name()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{ensure_distinct_inputs, merge_by_name, remove_by_name, replacement};
    use crate::model::{Patch, Technology, TechnologyInput, TechnologyVersion, ValidationError};

    fn stored(name: &str, version: &str) -> TechnologyVersion {
        TechnologyVersion {
            id: Some(1),
            technology: Technology::new(name),
            version: version.to_string(),
        }
    }

    #[test]
    fn merge_overwrites_versions_and_keeps_untouched_entries() {
        let current = vec![stored("Python", "3.12"), stored("Postgres", "16")];
        let merged = merge_by_name(
            &current,
            &[
                TechnologyInput::new("Python", "3.13"),
                TechnologyInput::new("Redis", "7"),
            ],
        );

        assert_eq!(
            merged,
            vec![
                TechnologyInput::new("Postgres", "16"),
                TechnologyInput::new("Python", "3.13"),
                TechnologyInput::new("Redis", "7"),
            ]
        );
    }

    #[test]
    fn merge_with_own_set_is_identity() {
        let current = vec![stored("Go", "1.22"), stored("Rust", "1.80")];
        let same: Vec<TechnologyInput> = current
            .iter()
            .map(|entry| TechnologyInput::new(entry.name(), entry.version.as_str()))
            .collect();

        assert_eq!(merge_by_name(&current, &same), same);
    }

    #[test]
    fn remove_ignores_unknown_names() {
        let current = vec![stored("Python", "3.12"), stored("Postgres", "16")];
        let kept = remove_by_name(current.clone(), &["Cobol".to_string()]);
        assert_eq!(kept, current);

        let kept = remove_by_name(current, &["Python".to_string()]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name(), "Postgres");
    }

    #[test]
    fn replacement_distinguishes_absent_from_empty() {
        assert!(replacement(&Patch::Absent).is_none());
        assert!(replacement(&Patch::Null).is_none());
        assert_eq!(replacement(&Patch::Value(Vec::new())), Some(&[][..]));
    }

    #[test]
    fn duplicate_input_names_are_rejected() {
        let err = ensure_distinct_inputs(&[
            TechnologyInput::new("Python", "3.12"),
            TechnologyInput::new("Python", "3.13"),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::DuplicateTechnology {
                name: "Python".to_string()
            }
        );
    }
}
