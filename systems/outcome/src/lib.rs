#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that decides when a level has been won or lost.

use rabbit_escape_core::{Census, Event, LevelResult};

/// Watches completed ticks and announces the level result once every rabbit is accounted for.
#[derive(Debug)]
pub struct Outcome {
    num_to_save: u32,
    result: Option<LevelResult>,
}

impl Outcome {
    /// Creates an outcome system requiring `num_to_save` rabbits to exit.
    #[must_use]
    pub const fn new(num_to_save: u32) -> Self {
        Self {
            num_to_save,
            result: None,
        }
    }

    /// Result announced so far, if any.
    #[must_use]
    pub const fn result(&self) -> Option<LevelResult> {
        self.result
    }

    /// Consumes the events of a tick and the post-tick census.
    ///
    /// Emits [`Event::LevelCompleted`] the first time a completed tick leaves
    /// no rabbits waiting and none alive.
    pub fn handle(&mut self, events: &[Event], census: Census, out: &mut Vec<Event>) {
        if self.result.is_some() {
            return;
        }

        let tick_completed = events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }));
        if !tick_completed || !census.is_settled() {
            return;
        }

        let result = if census.counters.saved >= self.num_to_save {
            LevelResult::Won
        } else {
            LevelResult::Lost
        };
        self.result = Some(result);
        out.push(Event::LevelCompleted { result });
    }
}
