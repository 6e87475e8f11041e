//! Swiss-style round generation
//!
//! The generator is a pure function of its inputs: roster, pair history
//! snapshot, round number and options. Degraded situations (no standings,
//! unavoidable rematches, odd player counts) are reported as warnings and
//! never fail the round.

use crate::config::{PairingConfig, ScoringConfig};
use crate::pairing::history::PairHistoryIndex;
use crate::types::{
    EventId, Match, MatchResult, MatchStatus, PairHistory, Player, PlayerId, PlayerMatchInfo,
    RankingEntry, BYE_PLAYER_ID,
};
use crate::utils::generate_match_id;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, info, warn};

/// Inputs that vary per round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingOptions {
    pub event_id: EventId,
    pub is_first_round: bool,
    /// Standings after the previous round; ignored for the first round
    #[serde(default)]
    pub previous_standings: Option<Vec<RankingEntry>>,
    /// Shuffle the first round with this seed instead of seeding by rating
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Creation timestamp stamped on every generated match
    pub scheduled_at: DateTime<Utc>,
}

impl PairingOptions {
    pub fn first_round(event_id: impl Into<EventId>, scheduled_at: DateTime<Utc>) -> Self {
        Self {
            event_id: event_id.into(),
            is_first_round: true,
            previous_standings: None,
            random_seed: None,
            scheduled_at,
        }
    }

    pub fn next_round(
        event_id: impl Into<EventId>,
        previous_standings: Vec<RankingEntry>,
        scheduled_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            is_first_round: false,
            previous_standings: Some(previous_standings),
            random_seed: None,
            scheduled_at,
        }
    }
}

/// Non-fatal conditions met while pairing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "kind",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum PairingWarning {
    /// No usable standings for a later round; seeded by rating instead
    MissingPriorStandings { round: u32 },
    /// Every remaining opponent was met recently
    RematchUnavoidable {
        player1: PlayerId,
        player2: PlayerId,
        last_met_round: Option<u32>,
    },
    ByeAssigned { player_id: PlayerId },
}

impl fmt::Display for PairingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairingWarning::MissingPriorStandings { round } => write!(
                f,
                "No standings available before round {}; pairing by rating",
                round
            ),
            PairingWarning::RematchUnavoidable {
                player1,
                player2,
                last_met_round,
            } => match last_met_round {
                Some(met) => write!(
                    f,
                    "Rematch unavoidable: {} and {} already met in round {}",
                    player1, player2, met
                ),
                None => write!(f, "Rematch unavoidable: {} and {}", player1, player2),
            },
            PairingWarning::ByeAssigned { player_id } => {
                write!(f, "Player {} receives a bye", player_id)
            }
        }
    }
}

/// Matches and warnings of one generated round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundPairing {
    pub round: u32,
    pub matches: Vec<Match>,
    pub warnings: Vec<PairingWarning>,
}

impl RoundPairing {
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }

    /// Player receiving the bye, if the round has one
    pub fn bye_player(&self) -> Option<&str> {
        self.matches
            .iter()
            .find(|m| m.is_bye())
            .map(|m| {
                if m.player1.id == BYE_PLAYER_ID {
                    m.player2.id.as_str()
                } else {
                    m.player1.id.as_str()
                }
            })
    }

    pub fn pending_matches(&self) -> impl Iterator<Item = &Match> {
        self.matches
            .iter()
            .filter(|m| m.status == MatchStatus::Pending)
    }
}

/// Generates the next round's matches
#[derive(Debug, Clone, Default)]
pub struct PairingGenerator {
    config: PairingConfig,
    scoring: ScoringConfig,
}

impl PairingGenerator {
    pub fn new(config: PairingConfig, scoring: ScoringConfig) -> Self {
        Self { config, scoring }
    }

    /// Pair every active player for `round`
    pub fn generate_round(
        &self,
        players: &[Player],
        history: &[PairHistory],
        round: u32,
        options: &PairingOptions,
    ) -> RoundPairing {
        let mut warnings = Vec::new();
        let eligible = eligible_players(players);
        let index = PairHistoryIndex::new(history);

        let (ordered, is_random) = if options.is_first_round {
            let mut ordered = by_rating(eligible);
            let is_random = match options.random_seed {
                Some(seed) => {
                    let mut rng = StdRng::seed_from_u64(seed);
                    ordered.shuffle(&mut rng);
                    true
                }
                None => false,
            };
            (ordered, is_random)
        } else {
            match options
                .previous_standings
                .as_deref()
                .filter(|standings| !standings.is_empty())
            {
                Some(standings) => (by_standings(eligible, standings), false),
                None => {
                    warn!(
                        "No standings for event {} before round {}, falling back to rating order",
                        options.event_id, round
                    );
                    warnings.push(PairingWarning::MissingPriorStandings { round });
                    (by_rating(eligible), false)
                }
            }
        };

        let pairs = if options.is_first_round {
            pair_in_order(&ordered)
        } else {
            self.pair_avoiding_rematches(&ordered, &index, round, &mut warnings)
        };

        let mut matches: Vec<Match> = pairs
            .pairs
            .iter()
            .map(|(p1, p2)| {
                Match::new_pending(
                    generate_match_id(&options.event_id, round, &p1.id, &p2.id),
                    options.event_id.clone(),
                    PlayerMatchInfo::from_player(p1),
                    PlayerMatchInfo::from_player(p2),
                    round,
                    is_random,
                    options.scheduled_at,
                )
            })
            .collect();

        if let Some(player) = pairs.unpaired {
            info!("Player {} receives a bye in round {}", player.id, round);
            matches.push(self.bye_match(player, round, is_random, options));
            warnings.push(PairingWarning::ByeAssigned {
                player_id: player.id.clone(),
            });
        }

        debug!(
            "Generated round {} of event {}: {} matches, {} warnings",
            round,
            options.event_id,
            matches.len(),
            warnings.len()
        );

        RoundPairing {
            round,
            matches,
            warnings,
        }
    }

    /// Greedy Swiss pass: each top player takes the nearest opponent not met
    /// within the rematch window
    fn pair_avoiding_rematches<'a>(
        &self,
        ordered: &[&'a Player],
        index: &PairHistoryIndex<'_>,
        round: u32,
        warnings: &mut Vec<PairingWarning>,
    ) -> Pairs<'a> {
        let window = self.config.rematch_window;
        let mut pool: Vec<&'a Player> = ordered.to_vec();
        let mut pairs = Vec::with_capacity(pool.len() / 2);

        while pool.len() >= 2 {
            let top = pool.remove(0);
            let candidate = pool
                .iter()
                .position(|other| !index.met_within(&top.id, &other.id, round, window));

            let opponent = match candidate {
                Some(position) => pool.remove(position),
                None => {
                    let opponent = pool.remove(0);
                    let last_met_round = index.last_round_before(&top.id, &opponent.id, round);
                    warn!(
                        "Rematch unavoidable in round {}: {} vs {}",
                        round, top.id, opponent.id
                    );
                    warnings.push(PairingWarning::RematchUnavoidable {
                        player1: top.id.clone(),
                        player2: opponent.id.clone(),
                        last_met_round,
                    });
                    opponent
                }
            };
            pairs.push((top, opponent));
        }

        Pairs {
            pairs,
            unpaired: pool.pop(),
        }
    }

    fn bye_match(
        &self,
        player: &Player,
        round: u32,
        is_random: bool,
        options: &PairingOptions,
    ) -> Match {
        let mut m = Match::new_pending(
            generate_match_id(&options.event_id, round, &player.id, BYE_PLAYER_ID),
            options.event_id.clone(),
            PlayerMatchInfo::from_player(player),
            PlayerMatchInfo::bye(),
            round,
            is_random,
            options.scheduled_at,
        );
        m.status = MatchStatus::Completed;
        m.result = Some(MatchResult {
            score: [0, 0],
            pr: [self.scoring.points.draw, 0],
            pdi: [0, 0],
            ds: 0,
            forfeit: None,
        });
        m
    }
}

struct Pairs<'a> {
    pairs: Vec<(&'a Player, &'a Player)>,
    unpaired: Option<&'a Player>,
}

fn pair_in_order<'a>(ordered: &[&'a Player]) -> Pairs<'a> {
    let pairs = ordered
        .chunks_exact(2)
        .map(|chunk| (chunk[0], chunk[1]))
        .collect();
    let unpaired = if ordered.len() % 2 == 1 {
        ordered.last().copied()
    } else {
        None
    };
    Pairs { pairs, unpaired }
}

/// Active players, first occurrence of each id, bye sentinel excluded
fn eligible_players(players: &[Player]) -> Vec<&Player> {
    let mut seen = HashSet::new();
    players
        .iter()
        .filter(|p| {
            if !p.active || p.id == BYE_PLAYER_ID {
                return false;
            }
            if !seen.insert(p.id.as_str()) {
                warn!("Ignoring duplicate roster entry for player {}", p.id);
                return false;
            }
            true
        })
        .collect()
}

/// Rating desc, id asc
fn by_rating(mut players: Vec<&Player>) -> Vec<&Player> {
    players.sort_by(|a, b| {
        b.current_rating
            .cmp(&a.current_rating)
            .then_with(|| a.id.cmp(&b.id))
    });
    players
}

/// Previous rank asc; players without a standing follow in rating order
fn by_standings<'a>(players: Vec<&'a Player>, standings: &[RankingEntry]) -> Vec<&'a Player> {
    let ranks: HashMap<&str, u32> = standings
        .iter()
        .map(|entry| (entry.player_id.as_str(), entry.rank))
        .collect();

    let (mut ranked, unranked): (Vec<&Player>, Vec<&Player>) = players
        .into_iter()
        .partition(|p| ranks.contains_key(p.id.as_str()));

    ranked.sort_by(|a, b| {
        ranks[a.id.as_str()]
            .cmp(&ranks[b.id.as_str()])
            .then_with(|| a.id.cmp(&b.id))
    });
    ranked.extend(by_rating(unranked));
    ranked
}
