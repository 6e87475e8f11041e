//! Pair history snapshots
//!
//! Pairing never mutates history: it reads an immutable slice of
//! `PairHistory` records, indexed here for constant-time lookups.

use crate::types::{pair_key, Match, MatchStatus, PairHistory, PlayerId};
use std::collections::{BTreeMap, HashMap};

impl PairHistory {
    /// Derive pair histories from match records
    ///
    /// Every scheduled meeting counts except byes and cancelled or
    /// invalidated matches. Output is sorted by pair key.
    pub fn from_matches(matches: &[Match]) -> Vec<PairHistory> {
        let mut by_pair: BTreeMap<[PlayerId; 2], PairHistory> = BTreeMap::new();

        for m in matches.iter().filter(|m| {
            !m.is_bye()
                && !matches!(m.status, MatchStatus::Cancelled | MatchStatus::Invalidated)
        }) {
            let key = pair_key(m.player1.id.clone(), m.player2.id.clone());
            by_pair
                .entry(key)
                .or_insert_with(|| PairHistory::new(m.player1.id.clone(), m.player2.id.clone()))
                .record(m.round(), m.metadata.created_at);
        }

        by_pair.into_values().collect()
    }
}

/// Lookup table over a pair history snapshot
///
/// Records are keyed by their sorted pair, whatever seat order the caller
/// stored them in. Several records for one pair are all consulted.
#[derive(Debug, Default)]
pub struct PairHistoryIndex<'a> {
    by_pair: HashMap<(&'a str, &'a str), Vec<&'a PairHistory>>,
}

impl<'a> PairHistoryIndex<'a> {
    pub fn new(histories: &'a [PairHistory]) -> Self {
        let mut by_pair: HashMap<(&'a str, &'a str), Vec<&'a PairHistory>> = HashMap::new();
        for history in histories {
            let [a, b] = &history.players;
            by_pair
                .entry(ordered(a.as_str(), b.as_str()))
                .or_default()
                .push(history);
        }
        Self { by_pair }
    }

    /// Every record stored for the pair, in input order
    pub fn get<'s>(&'s self, a: &'s str, b: &'s str) -> &'s [&'a PairHistory] {
        self.by_pair
            .get(&ordered(a, b))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether `a` and `b` met in one of the `window` rounds before `round`
    pub fn met_within(&self, a: &str, b: &str, round: u32, window: u32) -> bool {
        self.get(a, b)
            .iter()
            .any(|history| history.met_within(round, window))
    }

    /// Most recent round before `round` in which `a` and `b` met
    pub fn last_round_before(&self, a: &str, b: &str, round: u32) -> Option<u32> {
        self.get(a, b)
            .iter()
            .filter_map(|history| history.last_round_before(round))
            .max()
    }

    /// Number of distinct pairs
    pub fn len(&self) -> usize {
        self.by_pair.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_pair.is_empty()
    }
}

fn ordered<'s>(a: &'s str, b: &'s str) -> (&'s str, &'s str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
