use std::fmt;

use rabbit_escape_core::{Census, Counters, LevelResult};
use serde::{Deserialize, Serialize};

/// Final state of a headless run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct RunSummary {
    /// Level display name, if the level declared one.
    pub(crate) level: Option<String>,
    /// Terminal result, or `None` when the tick limit was reached first.
    pub(crate) result: Option<LevelResult>,
    /// Counters after the last executed tick.
    pub(crate) counters: Counters,
    /// Rabbits still in the level after the last executed tick.
    pub(crate) live_rabbits: u32,
}

impl RunSummary {
    pub(crate) fn new(level: Option<String>, result: Option<LevelResult>, census: Census) -> Self {
        Self {
            level,
            result,
            counters: census.counters,
            live_rabbits: census.live_rabbits,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = match self.result {
            Some(LevelResult::Won) => "won",
            Some(LevelResult::Lost) => "lost",
            None => "unfinished",
        };
        let Counters {
            waiting,
            saved,
            dead,
            tick,
        } = self.counters;
        write!(
            f,
            "{}: {result} after {tick} ticks (saved {saved}, dead {dead}, waiting {waiting}, alive {})",
            self.level.as_deref().unwrap_or("level"),
            self.live_rabbits,
        )
    }
}
