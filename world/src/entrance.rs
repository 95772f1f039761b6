//! Entrance that emits rabbits on a fixed schedule.

use rabbit_escape_core::{Direction, Position};

use crate::entity::{Effect, WorldView};

/// Facing given to every rabbit emitted by an entrance.
const SPAWN_FACING: Direction = Direction::Right;

#[derive(Clone, Debug)]
pub(crate) struct Entrance {
    cell: Position,
    delay: Option<u32>,
    countdown: u32,
}

impl Entrance {
    pub(crate) const fn new(cell: Position) -> Self {
        Self {
            cell,
            delay: None,
            countdown: 0,
        }
    }

    pub(crate) const fn cell(&self) -> Position {
        self.cell
    }

    /// Resolves the spawn delay from the settings the first time it is evaluated.
    pub(crate) fn calc_new_state(&mut self, view: &WorldView<'_>) {
        if self.delay.is_none() {
            self.delay = Some(view.settings().spawn_delay());
        }
    }

    /// Emits a rabbit when the countdown has run out.
    ///
    /// The countdown drops by one on every tick with rabbits waiting, the spawn
    /// tick included, so rabbits appear on the first tick and then every
    /// `delay` ticks.
    pub(crate) fn step(&mut self, waiting: u32) -> Effect {
        if waiting == 0 {
            return Effect::Idle;
        }
        let Some(delay) = self.delay else {
            return Effect::Idle;
        };

        let spawn = self.countdown == 0;
        if spawn {
            self.countdown = delay;
        }
        self.countdown = self.countdown.saturating_sub(1);

        match self.cell.below() {
            Some(cell) if spawn => Effect::Spawn {
                cell,
                facing: SPAWN_FACING,
            },
            _ => Effect::Idle,
        }
    }
}
