//! Closed set of simulated entities and the two-phase dispatch over them.

use rabbit_escape_core::{
    Direction, FatalCause, Position, RabbitId, Settings, SlopeContact, Terrain,
};

use crate::{entrance::Entrance, rabbit::Rabbit};

/// Read-only view of the pre-tick world handed to entities during the intent phase.
#[derive(Clone, Copy, Debug)]
pub(crate) struct WorldView<'a> {
    terrain: &'a Terrain,
    exits: &'a [Position],
    settings: Settings,
}

impl<'a> WorldView<'a> {
    pub(crate) const fn new(terrain: &'a Terrain, exits: &'a [Position], settings: Settings) -> Self {
        Self {
            terrain,
            exits,
            settings,
        }
    }

    pub(crate) const fn terrain(&self) -> &'a Terrain {
        self.terrain
    }

    pub(crate) const fn settings(&self) -> Settings {
        self.settings
    }

    pub(crate) fn is_exit(&self, cell: Position) -> bool {
        self.exits.contains(&cell)
    }

    /// A rabbit is supported while standing on a slope or directly above solid ground.
    pub(crate) fn is_supported(&self, cell: Position) -> bool {
        self.terrain.cell(cell).is_slope() || self.terrain.cell_at(cell.below()).is_solid()
    }
}

/// Outcome of committing an entity's intent, interpreted by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Effect {
    Idle,
    Spawn {
        cell: Position,
        facing: Direction,
    },
    Moved {
        rabbit: RabbitId,
        from: Position,
        to: Position,
    },
    Turned {
        rabbit: RabbitId,
        facing: Direction,
    },
    Fell {
        rabbit: RabbitId,
        to: Position,
        fall_distance: u32,
    },
    Landed {
        rabbit: RabbitId,
        cell: Position,
        fall_distance: u32,
        contact: Option<SlopeContact>,
    },
    Impacted {
        rabbit: RabbitId,
        cell: Position,
        fall_distance: u32,
    },
    Died {
        rabbit: RabbitId,
        cell: Position,
        cause: FatalCause,
    },
    Saved {
        rabbit: RabbitId,
        cell: Position,
    },
}

/// Stationary exit. Rabbits standing on it leave the level.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Exit {
    cell: Position,
}

impl Exit {
    pub(crate) const fn new(cell: Position) -> Self {
        Self { cell }
    }

    pub(crate) const fn cell(&self) -> Position {
        self.cell
    }
}

#[derive(Clone, Debug)]
pub(crate) enum Entity {
    Entrance(Entrance),
    Exit(Exit),
    Rabbit(Rabbit),
}

impl Entity {
    /// Intent phase: decide what to do this tick without touching shared state.
    pub(crate) fn calc_new_state(&mut self, view: &WorldView<'_>) {
        match self {
            Self::Entrance(entrance) => entrance.calc_new_state(view),
            Self::Exit(_) => {}
            Self::Rabbit(rabbit) => rabbit.calc_new_state(view),
        }
    }

    /// Commit phase: apply the stored intent and report its effect.
    pub(crate) fn step(&mut self, waiting: u32) -> Effect {
        match self {
            Self::Entrance(entrance) => entrance.step(waiting),
            Self::Exit(_) => Effect::Idle,
            Self::Rabbit(rabbit) => rabbit.step(),
        }
    }

    pub(crate) fn rabbit_id(&self) -> Option<RabbitId> {
        match self {
            Self::Rabbit(rabbit) => Some(rabbit.id()),
            Self::Entrance(_) | Self::Exit(_) => None,
        }
    }
}
