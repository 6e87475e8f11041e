//! Performance benchmarks for result processing, standings and pairing

use chrono::{DateTime, Utc};
use club_tournament::category::CategoryTable;
use club_tournament::config::AppConfig;
use club_tournament::matches::MatchProcessor;
use club_tournament::pairing::{PairingGenerator, PairingOptions};
use club_tournament::ranking::RankingAggregator;
use club_tournament::types::{Match, PairHistory, Player, PlayerMatchInfo, ScoreSubmission};
use club_tournament::utils::{generate_match_id, parse_timestamp};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const EVENT_ID: &str = "bench-open";

fn club_night() -> DateTime<Utc> {
    parse_timestamp("2024-03-01T19:00:00Z").unwrap()
}

fn create_roster(size: usize) -> Vec<Player> {
    let table = CategoryTable::default();
    (0..size)
        .map(|i| {
            let id = format!("player{:03}", i);
            let rating = 1000 + ((i * 53) % 1200) as i32;
            Player::new(id.clone(), id, rating, &table, club_night())
        })
        .collect()
}

/// Play `rounds` Swiss rounds where the higher seat always wins 3-1
fn create_event(players: &[Player], rounds: u32) -> Vec<Match> {
    let processor = MatchProcessor::from_config(&AppConfig::default()).unwrap();
    let aggregator = RankingAggregator::default();
    let generator = PairingGenerator::default();
    let mut matches: Vec<Match> = Vec::new();

    for round in 1..=rounds {
        let options = if round == 1 {
            PairingOptions::first_round(EVENT_ID, club_night())
        } else {
            PairingOptions::next_round(
                EVENT_ID,
                aggregator.aggregate(&matches, players),
                club_night(),
            )
        };
        let history = PairHistory::from_matches(&matches);
        let pairing = generator.generate_round(players, &history, round, &options);

        for m in pairing.matches {
            if m.is_bye() {
                matches.push(m);
                continue;
            }
            let processed = processor
                .process(&m, &ScoreSubmission::new(3, 1, club_night()), &matches)
                .unwrap();
            matches.push(processed.updated_match);
        }
    }

    matches
}

fn bench_process_match(c: &mut Criterion) {
    let processor = MatchProcessor::from_config(&AppConfig::default()).unwrap();
    let players = create_roster(2);
    let pending = Match::new_pending(
        generate_match_id(EVENT_ID, 1, &players[0].id, &players[1].id),
        EVENT_ID.to_string(),
        PlayerMatchInfo::from_player(&players[0]),
        PlayerMatchInfo::from_player(&players[1]),
        1,
        false,
        club_night(),
    );
    let submission = ScoreSubmission::new(4, 2, club_night());

    c.bench_function("process_match", |b| {
        b.iter(|| {
            processor
                .process(black_box(&pending), black_box(&submission), &[])
                .unwrap()
        })
    });
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate_standings");
    let aggregator = RankingAggregator::default();

    for size in [16usize, 64, 256] {
        let players = create_roster(size);
        let matches = create_event(&players, 5);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| aggregator.aggregate(black_box(&matches), black_box(&players)))
        });
    }

    group.finish();
}

fn bench_generate_round(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_round");
    let generator = PairingGenerator::default();
    let aggregator = RankingAggregator::default();

    for size in [16usize, 64, 256] {
        let players = create_roster(size);
        let matches = create_event(&players, 5);
        let history = PairHistory::from_matches(&matches);
        let options = PairingOptions::next_round(
            EVENT_ID,
            aggregator.aggregate(&matches, &players),
            club_night(),
        );

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| generator.generate_round(black_box(&players), &history, 6, &options))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_process_match,
    bench_aggregate,
    bench_generate_round
);
criterion_main!(benches);
