use std::{sync::Arc, time::SystemTime};

use dashmap::{DashMap, mapref::entry::Entry};
use indexmap::IndexMap;

use crate::dao::models::OfficialResultEntity;

/// Ground-truth lineup and tactics for a match, used as the scoring reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfficialResult {
    /// Match the result belongs to.
    pub match_id: u32,
    /// Trimmed names of the starters; may hold fewer than a full squad.
    pub players: Vec<String>,
    /// Formation actually fielded, when known.
    pub formation: Option<String>,
    /// Observed slider values keyed by lower-cased slider name.
    pub tactics: IndexMap<String, i32>,
}

impl OfficialResult {
    /// Persisted form, stamped with the registration time.
    pub fn to_entity(&self, recorded_at: SystemTime) -> OfficialResultEntity {
        OfficialResultEntity {
            match_id: self.match_id,
            players: self.players.clone(),
            formation: self.formation.clone(),
            tactics: self.tactics.clone(),
            recorded_at,
        }
    }
}

impl From<OfficialResultEntity> for OfficialResult {
    fn from(value: OfficialResultEntity) -> Self {
        Self {
            match_id: value.match_id,
            players: value.players,
            formation: value.formation,
            tactics: value.tactics,
        }
    }
}

/// Set-once registry of official results keyed by match.
#[derive(Default)]
pub struct OfficialResults {
    results: DashMap<u32, Arc<OfficialResult>>,
}

impl OfficialResults {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Result registered for `match_id`.
    pub fn get(&self, match_id: u32) -> Option<Arc<OfficialResult>> {
        self.results
            .get(&match_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Store `result` unless its match already has one.
    ///
    /// Returns the already-registered result as the error so callers can
    /// report what is in place.
    pub fn insert_once(
        &self,
        result: OfficialResult,
    ) -> Result<Arc<OfficialResult>, Arc<OfficialResult>> {
        match self.results.entry(result.match_id) {
            Entry::Occupied(existing) => Err(Arc::clone(existing.get())),
            Entry::Vacant(slot) => {
                let stored = Arc::new(result);
                slot.insert(Arc::clone(&stored));
                Ok(stored)
            }
        }
    }

    /// Number of matches with a result.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether no match has a result yet.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(match_id: u32, formation: &str) -> OfficialResult {
        OfficialResult {
            match_id,
            players: vec!["Lewandowski".into()],
            formation: Some(formation.into()),
            tactics: IndexMap::new(),
        }
    }

    #[test]
    fn second_insert_for_same_match_is_rejected() {
        let registry = OfficialResults::new();
        registry.insert_once(result(1, "4-3-3")).unwrap();

        let existing = registry.insert_once(result(1, "4-4-2")).unwrap_err();
        assert_eq!(existing.formation.as_deref(), Some("4-3-3"));
        assert_eq!(
            registry.get(1).unwrap().formation.as_deref(),
            Some("4-3-3")
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unknown_match_has_no_result() {
        let registry = OfficialResults::new();
        assert!(registry.get(99).is_none());
        assert!(registry.is_empty());
    }
}
