#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Rabbit Escape engine.
//!
//! This crate defines the vocabulary that connects the level loader, the
//! authoritative world, pure systems and renderers. The loader produces a
//! [`Level`], the world advances it tick by tick and broadcasts [`Event`]
//! values describing what happened, and renderers consume an immutable
//! [`WorldSnapshot`] captured on a tick boundary.

mod terrain;

pub use terrain::{Terrain, TerrainCell, TerrainError};

use serde::{Deserialize, Serialize};

/// Horizontal facing of a rabbit. Vertical motion is implied by falling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Facing toward decreasing column indices.
    Left,
    /// Facing toward increasing column indices.
    Right,
}

impl Direction {
    /// Returns the opposite facing.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Location of a single grid cell. Row zero is the top of the level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    column: u32,
    row: u32,
}

impl Position {
    /// Creates a new grid position.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Cell directly below, in the direction gravity pulls.
    #[must_use]
    pub fn below(self) -> Option<Self> {
        self.row
            .checked_add(1)
            .map(|row| Self::new(self.column, row))
    }

    /// Cell directly above. `None` when the position is on row zero.
    #[must_use]
    pub fn above(self) -> Option<Self> {
        self.row
            .checked_sub(1)
            .map(|row| Self::new(self.column, row))
    }

    /// Neighbouring cell in the provided horizontal direction.
    #[must_use]
    pub fn ahead(self, facing: Direction) -> Option<Self> {
        let column = match facing {
            Direction::Left => self.column.checked_sub(1),
            Direction::Right => self.column.checked_add(1),
        };
        column.map(|column| Self::new(column, self.row))
    }
}

/// Unique identifier assigned to a rabbit by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RabbitId(u32);

impl RabbitId {
    /// Creates a new rabbit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// How a rabbit meets a slope, relative to the way it is facing.
///
/// The two slope cells combine with the two facings into four contacts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlopeContact {
    /// Facing left onto a slope rising to the left.
    RiseLeft,
    /// Facing right onto a slope rising to the right.
    RiseRight,
    /// Facing left onto a slope falling away to the left.
    LowerLeft,
    /// Facing right onto a slope falling away to the right.
    LowerRight,
}

impl SlopeContact {
    /// Resolves the contact made by a rabbit facing `facing` with a slope rising towards `rise`.
    #[must_use]
    pub const fn between(rise: Direction, facing: Direction) -> Self {
        match (rise, facing) {
            (Direction::Left, Direction::Left) => Self::RiseLeft,
            (Direction::Right, Direction::Right) => Self::RiseRight,
            (Direction::Right, Direction::Left) => Self::LowerLeft,
            (Direction::Left, Direction::Right) => Self::LowerRight,
        }
    }

    /// Direction the rabbit keeps walking in after the contact.
    #[must_use]
    pub const fn facing(self) -> Direction {
        match self {
            Self::RiseLeft | Self::LowerLeft => Direction::Left,
            Self::RiseRight | Self::LowerRight => Direction::Right,
        }
    }

    /// Reports whether the rabbit will climb rather than descend.
    #[must_use]
    pub const fn is_rise(self) -> bool {
        matches!(self, Self::RiseLeft | Self::RiseRight)
    }
}

/// Stage of a climb or descent across slope cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlopePhase {
    /// Stepping from flat ground onto a slope.
    Start,
    /// Stepping from one slope onto the next slope of the same run.
    Continue,
    /// Stepping off a slope onto flat ground.
    End,
}

/// Named ways a rabbit can die, each with a fixed dying animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FatalCause {
    /// Landed after falling at least the fatal fall distance.
    Impact,
    /// Walked or fell off the edge of the grid.
    OutOfBounds,
}

impl FatalCause {
    /// Number of ticks the rabbit spends dying before the world removes it.
    ///
    /// Zero means the rabbit is removed in the same tick the cause is detected.
    #[must_use]
    pub const fn animation_ticks(self) -> u32 {
        match self {
            Self::Impact => 1,
            Self::OutOfBounds => 0,
        }
    }
}

/// Behaviour state of a live rabbit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RabbitState {
    /// Supported and walking in its facing direction.
    Walking,
    /// Unsupported and dropping one row per tick.
    Falling,
    /// Landed on a slope this tick; walks according to the contact next tick.
    Landing(SlopeContact),
    /// Playing the death sequence for the provided cause.
    Dying {
        /// Cause of death.
        cause: FatalCause,
        /// Ticks already spent dying.
        elapsed: u32,
    },
}

/// Change a rabbit will make during the next tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Change {
    /// Walks one cell along flat ground.
    Walk(Direction),
    /// Reverses in place; carries the new facing.
    Turn(Direction),
    /// Climbs along a slope.
    Rise {
        /// Facing during the climb.
        facing: Direction,
        /// Stage of the climb.
        phase: SlopePhase,
    },
    /// Descends along a slope.
    Lower {
        /// Facing during the descent.
        facing: Direction,
        /// Stage of the descent.
        phase: SlopePhase,
    },
    /// Drops one row and is still airborne or lands on flat ground.
    Fall,
    /// Drops one row onto a slope.
    FallOnto(SlopeContact),
    /// Drops one row into a fatal landing.
    FallToDeath,
    /// Continues the death sequence.
    Dying {
        /// Ticks already spent dying.
        elapsed: u32,
    },
    /// Leaves the level through an exit.
    EnterExit,
    /// Moves off the grid.
    LeaveWorld,
}

/// Pending change of a rabbit together with the cell it concerns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Preview {
    /// Cell the change should be drawn on. `None` when it lies off the grid.
    pub cell: Option<Position>,
    /// Change the rabbit will make.
    pub change: Change,
}

/// Global simulation parameters supplied with a level and immutable during play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Settings {
    num_rabbits: u32,
    num_to_save: u32,
    spawn_delay: u32,
    fatal_fall_distance: u32,
}

impl Settings {
    /// Rabbits available to entrances when no value is supplied.
    pub const DEFAULT_NUM_RABBITS: u32 = 10;
    /// Rabbits that must be saved when no value is supplied.
    pub const DEFAULT_NUM_TO_SAVE: u32 = 1;
    /// Ticks between rabbit emissions when no value is supplied.
    pub const DEFAULT_SPAWN_DELAY: u32 = 4;
    /// Fall distance that kills a rabbit when no value is supplied.
    pub const DEFAULT_FATAL_FALL_DISTANCE: u32 = 5;

    /// Creates settings from explicit values.
    #[must_use]
    pub const fn new(
        num_rabbits: u32,
        num_to_save: u32,
        spawn_delay: u32,
        fatal_fall_distance: u32,
    ) -> Self {
        Self {
            num_rabbits,
            num_to_save,
            spawn_delay,
            fatal_fall_distance,
        }
    }

    /// Total rabbits waiting to be emitted by entrances at level start.
    #[must_use]
    pub const fn num_rabbits(&self) -> u32 {
        self.num_rabbits
    }

    /// Rabbits that must exit for the level to be won.
    #[must_use]
    pub const fn num_to_save(&self) -> u32 {
        self.num_to_save
    }

    /// Ticks between successive rabbits emitted by one entrance.
    #[must_use]
    pub const fn spawn_delay(&self) -> u32 {
        self.spawn_delay
    }

    /// Minimum fall distance, in rows, that kills a rabbit on landing.
    #[must_use]
    pub const fn fatal_fall_distance(&self) -> u32 {
        self.fatal_fall_distance
    }

    /// Returns a copy with a different number of rabbits waiting.
    #[must_use]
    pub const fn with_num_rabbits(mut self, num_rabbits: u32) -> Self {
        self.num_rabbits = num_rabbits;
        self
    }

    /// Returns a copy with a different number of rabbits to save.
    #[must_use]
    pub const fn with_num_to_save(mut self, num_to_save: u32) -> Self {
        self.num_to_save = num_to_save;
        self
    }

    /// Returns a copy with a different spawn delay.
    #[must_use]
    pub const fn with_spawn_delay(mut self, spawn_delay: u32) -> Self {
        self.spawn_delay = spawn_delay;
        self
    }

    /// Returns a copy with a different fatal fall distance.
    #[must_use]
    pub const fn with_fatal_fall_distance(mut self, fatal_fall_distance: u32) -> Self {
        self.fatal_fall_distance = fatal_fall_distance;
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_NUM_RABBITS,
            Self::DEFAULT_NUM_TO_SAVE,
            Self::DEFAULT_SPAWN_DELAY,
            Self::DEFAULT_FATAL_FALL_DISTANCE,
        )
    }
}

/// Initial placement of an entity described by a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Placement {
    /// Entrance emitting rabbits into the cell below it.
    Entrance(Position),
    /// Exit through which rabbits leave the level safely.
    Exit(Position),
    /// Rabbit present from the first tick.
    Rabbit {
        /// Cell occupied by the rabbit.
        cell: Position,
        /// Initial facing of the rabbit.
        facing: Direction,
    },
}

/// Initial world description produced by a level loader.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Level {
    name: Option<String>,
    terrain: Terrain,
    placements: Vec<Placement>,
    settings: Settings,
}

impl Level {
    /// Creates a level from terrain, entity placements and settings.
    #[must_use]
    pub fn new(terrain: Terrain, placements: Vec<Placement>, settings: Settings) -> Self {
        Self {
            name: None,
            terrain,
            placements,
            settings,
        }
    }

    /// Returns the level with a display name attached.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns the level with replaced settings.
    #[must_use]
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Display name of the level, if the description provided one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Terrain grid of the level.
    #[must_use]
    pub const fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    /// Entity placements in description order.
    #[must_use]
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Simulation settings supplied with the level.
    #[must_use]
    pub const fn settings(&self) -> Settings {
        self.settings
    }

    /// Splits the level into its terrain, placements and settings.
    #[must_use]
    pub fn into_parts(self) -> (Terrain, Vec<Placement>, Settings) {
        (self.terrain, self.placements, self.settings)
    }
}

/// Terminal result of a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelResult {
    /// Enough rabbits were saved.
    Won,
    /// Every rabbit is gone and too few were saved.
    Lost,
}

/// Events broadcast by the world and systems while a level runs.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// Indicates that a tick completed.
    TimeAdvanced {
        /// Number of ticks elapsed since the level started.
        tick: u64,
    },
    /// Confirms that an entrance emitted a rabbit.
    RabbitSpawned {
        /// Identifier assigned to the rabbit.
        rabbit: RabbitId,
        /// Cell the rabbit occupies after spawning.
        cell: Position,
    },
    /// Confirms that a rabbit walked, climbed or descended between two cells.
    RabbitMoved {
        /// Identifier of the rabbit that moved.
        rabbit: RabbitId,
        /// Cell occupied before the move.
        from: Position,
        /// Cell occupied after the move.
        to: Position,
    },
    /// Confirms that a rabbit reversed its facing in place.
    RabbitTurned {
        /// Identifier of the rabbit that turned.
        rabbit: RabbitId,
        /// Facing after the turn.
        facing: Direction,
    },
    /// Confirms that a rabbit dropped one row without landing.
    RabbitFell {
        /// Identifier of the falling rabbit.
        rabbit: RabbitId,
        /// Cell occupied after the drop.
        to: Position,
        /// Rows fallen since the rabbit last had support.
        fall_distance: u32,
    },
    /// Confirms that a rabbit survived a fall and regained support.
    RabbitLanded {
        /// Identifier of the rabbit that landed.
        rabbit: RabbitId,
        /// Cell the rabbit landed in.
        cell: Position,
        /// Rows fallen before landing.
        fall_distance: u32,
        /// Slope contact made on landing, `None` for flat ground.
        contact: Option<SlopeContact>,
    },
    /// Reports that a rabbit landed after a fatal fall and started dying.
    RabbitImpacted {
        /// Identifier of the rabbit that hit the ground.
        rabbit: RabbitId,
        /// Cell the rabbit landed in.
        cell: Position,
        /// Rows fallen before the impact.
        fall_distance: u32,
    },
    /// Reports that a rabbit was removed after dying.
    RabbitDied {
        /// Identifier of the dead rabbit.
        rabbit: RabbitId,
        /// Last cell the rabbit occupied.
        cell: Position,
        /// Cause of death.
        cause: FatalCause,
    },
    /// Reports that a rabbit left the level through an exit.
    RabbitSaved {
        /// Identifier of the saved rabbit.
        rabbit: RabbitId,
        /// Exit cell the rabbit used.
        cell: Position,
    },
    /// Announces that the level reached a terminal result.
    LevelCompleted {
        /// Result of the level.
        result: LevelResult,
    },
}

/// Global counters exposed for scoring.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Counters {
    /// Rabbits not yet emitted by any entrance.
    pub waiting: u32,
    /// Rabbits that left through an exit.
    pub saved: u32,
    /// Rabbits removed after dying.
    pub dead: u32,
    /// Ticks elapsed since the level started.
    pub tick: u64,
}

/// Counters together with the number of rabbits still alive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Census {
    /// Global counters.
    pub counters: Counters,
    /// Rabbits currently present in the world, dying ones included.
    pub live_rabbits: u32,
}

impl Census {
    /// Reports whether no rabbit can still reach an exit.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        self.counters.waiting == 0 && self.live_rabbits == 0
    }
}

/// Immutable representation of a single rabbit used for queries and rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RabbitSnapshot {
    /// Unique identifier assigned to the rabbit.
    pub id: RabbitId,
    /// Grid cell currently occupied by the rabbit.
    pub cell: Position,
    /// Current facing.
    pub facing: Direction,
    /// Current behaviour state.
    pub state: RabbitState,
    /// Rows fallen since the rabbit last had support.
    pub fall_distance: u32,
    /// Change the rabbit will make during the next tick.
    pub preview: Preview,
}

/// Tick-boundary-consistent copy of the world handed to renderers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldSnapshot {
    /// Terrain grid.
    pub terrain: Terrain,
    /// Entrance cells in update order.
    pub entrances: Vec<Position>,
    /// Exit cells in update order.
    pub exits: Vec<Position>,
    /// Live rabbits in update order.
    pub rabbits: Vec<RabbitSnapshot>,
    /// Global counters.
    pub counters: Counters,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbours_stop_at_the_origin() {
        let origin = Position::new(0, 0);

        assert_eq!(origin.above(), None);
        assert_eq!(origin.ahead(Direction::Left), None);
        assert_eq!(origin.ahead(Direction::Right), Some(Position::new(1, 0)));
        assert_eq!(origin.below(), Some(Position::new(0, 1)));
    }

    #[test]
    fn slope_contacts_follow_the_rise() {
        assert_eq!(
            SlopeContact::between(Direction::Right, Direction::Right),
            SlopeContact::RiseRight
        );
        assert_eq!(
            SlopeContact::between(Direction::Left, Direction::Right),
            SlopeContact::LowerRight
        );
        assert_eq!(
            SlopeContact::between(Direction::Right, Direction::Left),
            SlopeContact::LowerLeft
        );
        assert_eq!(
            SlopeContact::between(Direction::Left, Direction::Left),
            SlopeContact::RiseLeft
        );
        assert_eq!(SlopeContact::LowerRight.facing(), Direction::Right);
        assert!(!SlopeContact::LowerLeft.is_rise());
    }

    #[test]
    fn impact_death_lasts_a_single_tick() {
        assert_eq!(FatalCause::Impact.animation_ticks(), 1);
        assert_eq!(FatalCause::OutOfBounds.animation_ticks(), 0);
    }

    #[test]
    fn settings_overrides_keep_other_values() {
        let settings = Settings::default().with_spawn_delay(2);

        assert_eq!(settings.spawn_delay(), 2);
        assert_eq!(settings.num_rabbits(), Settings::DEFAULT_NUM_RABBITS);
        assert_eq!(
            settings.fatal_fall_distance(),
            Settings::DEFAULT_FATAL_FALL_DISTANCE
        );
    }

    #[test]
    fn census_settles_once_nothing_is_left() {
        let mut census = Census {
            counters: Counters {
                waiting: 0,
                saved: 1,
                dead: 2,
                tick: 9,
            },
            live_rabbits: 1,
        };
        assert!(!census.is_settled());

        census.live_rabbits = 0;
        assert!(census.is_settled());
    }

    #[test]
    fn settings_serialise_with_field_names() {
        let json = serde_json::to_value(Settings::new(3, 2, 5, 4)).expect("serialize");

        assert_eq!(json["num_rabbits"], 3);
        assert_eq!(json["spawn_delay"], 5);
        assert_eq!(json["fatal_fall_distance"], 4);
    }
}
