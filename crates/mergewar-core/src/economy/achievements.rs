//! Fixed run-stat achievements.

use serde::{Deserialize, Serialize};

/// Counters achievements are measured against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Enemies killed
    pub kills: u64,
    /// Merges performed
    pub merges: u64,
    /// Battles won
    pub wins: u64,
    /// Units recruited
    pub summons: u64,
}

/// Which counter an achievement tracks.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    /// [`RunStats::kills`]
    Kills,
    /// [`RunStats::merges`]
    Merges,
    /// [`RunStats::summons`]
    Summons,
    /// [`RunStats::wins`]
    Wins,
}

impl RunStats {
    /// Current value of one counter.
    #[must_use]
    pub const fn get(&self, metric: Metric) -> u64 {
        match metric {
            Metric::Kills => self.kills,
            Metric::Merges => self.merges,
            Metric::Summons => self.summons,
            Metric::Wins => self.wins,
        }
    }
}

/// A one-time reward for reaching a counter threshold.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct Achievement {
    /// Stable identifier
    pub id: &'static str,
    /// Display title
    pub title: &'static str,
    /// Counter measured
    pub metric: Metric,
    /// Counter value that earns the reward
    pub target: u64,
    /// Coins paid on claim
    pub reward: u64,
}

impl Achievement {
    /// Returns `true` once `stats` reach the target.
    #[must_use]
    pub const fn is_earned(&self, stats: &RunStats) -> bool {
        stats.get(self.metric) >= self.target
    }
}

const fn achievement(
    id: &'static str,
    title: &'static str,
    metric: Metric,
    target: u64,
    reward: u64,
) -> Achievement {
    Achievement {
        id,
        title,
        metric,
        target,
        reward,
    }
}

/// Every achievement in the game.
pub const ACHIEVEMENTS: [Achievement; 9] = [
    achievement("kill_1", "First Blood", Metric::Kills, 1, 100),
    achievement("kill_100", "Butcher of the Field", Metric::Kills, 100, 500),
    achievement("kill_1000", "God of War", Metric::Kills, 1000, 2000),
    achievement("merge_10", "Budding Merger", Metric::Merges, 10, 200),
    achievement("merge_100", "Alchemist", Metric::Merges, 100, 1000),
    achievement("summon_50", "Recruiter", Metric::Summons, 50, 300),
    achievement("summon_200", "Legion Commander", Metric::Summons, 200, 1500),
    achievement("win_10", "Taste of Victory", Metric::Wins, 10, 400),
    achievement("win_50", "Conqueror", Metric::Wins, 50, 2500),
];

/// Looks up an achievement by id.
#[must_use]
pub fn find(id: &str) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}
