//! End-of-game detection and final ranking

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::game::player::PlayerRegistry;

/// Why the game ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum EndTrigger {
    /// A player's score reached zero or below
    Eliminated { player: String },
    /// The round number exceeded the configured maximum
    RoundLimit { rounds: u32 },
    /// Elapsed time exceeded the configured limit
    TimeLimit { elapsed_secs: i64 },
}

/// One row of the final ranking payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankEntry {
    pub name: String,
    pub score: i32,
    pub challenges_won: u32,
    pub bluffs_won: u32,
    pub hand_size: usize,
}

/// Check the end conditions, in fixed order: elimination, round limit,
/// time limit. Runs after every state-mutating event.
pub fn evaluate(
    players: &PlayerRegistry,
    round: u32,
    elapsed: Option<Duration>,
    config: &GameConfig,
) -> Option<EndTrigger> {
    // Join order keeps the named trigger deterministic if one event drove
    // several players to zero at once.
    if let Some(loser) = players.iter().find(|p| p.score <= 0) {
        return Some(EndTrigger::Eliminated {
            player: loser.name.clone(),
        });
    }

    if round > config.max_rounds {
        return Some(EndTrigger::RoundLimit { rounds: round });
    }

    if let Some(elapsed) = elapsed {
        if elapsed.num_seconds() > config.time_limit_secs as i64 {
            return Some(EndTrigger::TimeLimit {
                elapsed_secs: elapsed.num_seconds(),
            });
        }
    }

    None
}

/// Final standing: descending score, ties broken by successful challenges,
/// then successful bluffs, then remaining hand size
pub fn ranking(players: &PlayerRegistry) -> Vec<RankEntry> {
    let mut entries: Vec<RankEntry> = players
        .iter()
        .map(|p| RankEntry {
            name: p.name.clone(),
            score: p.score,
            challenges_won: p.stats.challenges_won,
            bluffs_won: p.stats.bluffs_won,
            hand_size: p.hand.len(),
        })
        .collect();

    entries.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(b.challenges_won.cmp(&a.challenges_won))
            .then(b.bluffs_won.cmp(&a.bluffs_won))
            .then(b.hand_size.cmp(&a.hand_size))
    });
    entries
}
