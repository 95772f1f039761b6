#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Rabbit Escape.
//!
//! The world owns the terrain, the ordered entity collection and the global
//! counters. Each tick runs in two phases: every entity first computes its
//! intent against the unmodified pre-tick state, then every entity commits
//! that intent in insertion order. Entities never touch counters or each
//! other; they return effects that the world interprets.

mod entity;
mod entrance;
mod rabbit;

use std::collections::BTreeSet;

use rabbit_escape_core::{
    Counters, Event, Level, Placement, Position, RabbitId, Settings, Terrain,
};
use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    entity::{Effect, Entity, Exit, WorldView},
    entrance::Entrance,
    rabbit::Rabbit,
};

/// Represents the authoritative Rabbit Escape world state.
#[derive(Debug)]
pub struct World {
    name: Option<String>,
    terrain: Terrain,
    entities: Vec<Entity>,
    settings: Settings,
    counters: Counters,
    next_rabbit_id: u32,
}

impl World {
    /// Builds a world from a level description, validating every placement.
    pub fn new(level: Level) -> Result<Self, WorldError> {
        let name = level.name().map(str::to_owned);
        let (terrain, placements, settings) = level.into_parts();

        if settings.spawn_delay() == 0 {
            return Err(WorldError::ZeroSpawnDelay);
        }
        if settings.fatal_fall_distance() == 0 {
            return Err(WorldError::ZeroFatalFallDistance);
        }

        let mut world = Self {
            name,
            terrain,
            entities: Vec::with_capacity(placements.len()),
            settings,
            counters: Counters {
                waiting: settings.num_rabbits(),
                ..Counters::default()
            },
            next_rabbit_id: 0,
        };

        for placement in placements {
            world.place(placement)?;
        }

        debug!(
            columns = world.terrain.columns(),
            rows = world.terrain.rows(),
            entities = world.entities.len(),
            waiting = world.counters.waiting,
            "world constructed"
        );
        Ok(world)
    }

    /// Advances the simulation by exactly one tick.
    pub fn step(&mut self) {
        let mut events = Vec::new();
        step(self, &mut events);
    }

    fn place(&mut self, placement: Placement) -> Result<(), WorldError> {
        let entity = match placement {
            Placement::Entrance(cell) => {
                self.check_free(cell)?;
                let spawn = cell
                    .below()
                    .filter(|spawn| self.terrain.contains(*spawn))
                    .ok_or(WorldError::EntranceSpawnOutOfBounds {
                        column: cell.column(),
                        row: cell.row(),
                    })?;
                if self.terrain.cell(spawn).is_solid() {
                    return Err(WorldError::EntranceSpawnBlocked {
                        column: cell.column(),
                        row: cell.row(),
                    });
                }
                Entity::Entrance(Entrance::new(cell))
            }
            Placement::Exit(cell) => {
                self.check_free(cell)?;
                Entity::Exit(Exit::new(cell))
            }
            Placement::Rabbit { cell, facing } => {
                self.check_free(cell)?;
                Entity::Rabbit(Rabbit::new(self.allocate_rabbit_id(), cell, facing))
            }
        };
        self.entities.push(entity);
        Ok(())
    }

    fn check_free(&self, cell: Position) -> Result<(), WorldError> {
        if !self.terrain.contains(cell) {
            return Err(WorldError::PlacementOutOfBounds {
                column: cell.column(),
                row: cell.row(),
                columns: self.terrain.columns(),
                rows: self.terrain.rows(),
            });
        }
        if self.terrain.cell(cell).is_solid() {
            return Err(WorldError::PlacementInSolid {
                column: cell.column(),
                row: cell.row(),
            });
        }
        Ok(())
    }

    fn allocate_rabbit_id(&mut self) -> RabbitId {
        let id = RabbitId::new(self.next_rabbit_id);
        self.next_rabbit_id = self.next_rabbit_id.wrapping_add(1);
        id
    }

    fn exit_cells(&self) -> Vec<Position> {
        self.entities
            .iter()
            .filter_map(|entity| match entity {
                Entity::Exit(exit) => Some(exit.cell()),
                _ => None,
            })
            .collect()
    }
}

/// Advances the world by one tick and reports what happened.
pub fn step(world: &mut World, out_events: &mut Vec<Event>) {
    let exits = world.exit_cells();
    let view = WorldView::new(&world.terrain, &exits, world.settings);
    for entity in &mut world.entities {
        entity.calc_new_state(&view);
    }

    let mut born: Vec<Entity> = Vec::new();
    let mut gone: BTreeSet<RabbitId> = BTreeSet::new();
    for entity in &mut world.entities {
        match entity.step(world.counters.waiting) {
            Effect::Idle => {}
            Effect::Spawn { cell, facing } => {
                world.counters.waiting = world.counters.waiting.saturating_sub(1);
                let rabbit = RabbitId::new(world.next_rabbit_id);
                world.next_rabbit_id = world.next_rabbit_id.wrapping_add(1);
                born.push(Entity::Rabbit(Rabbit::new(rabbit, cell, facing)));
                debug!(
                    rabbit = rabbit.get(),
                    column = cell.column(),
                    row = cell.row(),
                    waiting = world.counters.waiting,
                    "rabbit spawned"
                );
                out_events.push(Event::RabbitSpawned { rabbit, cell });
            }
            Effect::Moved { rabbit, from, to } => {
                out_events.push(Event::RabbitMoved { rabbit, from, to });
            }
            Effect::Turned { rabbit, facing } => {
                out_events.push(Event::RabbitTurned { rabbit, facing });
            }
            Effect::Fell {
                rabbit,
                to,
                fall_distance,
            } => {
                out_events.push(Event::RabbitFell {
                    rabbit,
                    to,
                    fall_distance,
                });
            }
            Effect::Landed {
                rabbit,
                cell,
                fall_distance,
                contact,
            } => {
                debug!(rabbit = rabbit.get(), fall_distance, ?contact, "rabbit landed");
                out_events.push(Event::RabbitLanded {
                    rabbit,
                    cell,
                    fall_distance,
                    contact,
                });
            }
            Effect::Impacted {
                rabbit,
                cell,
                fall_distance,
            } => {
                debug!(rabbit = rabbit.get(), fall_distance, "rabbit hit the ground too hard");
                out_events.push(Event::RabbitImpacted {
                    rabbit,
                    cell,
                    fall_distance,
                });
            }
            Effect::Died {
                rabbit,
                cell,
                cause,
            } => {
                world.counters.dead = world.counters.dead.saturating_add(1);
                let _ = gone.insert(rabbit);
                debug!(rabbit = rabbit.get(), ?cause, "rabbit died");
                out_events.push(Event::RabbitDied {
                    rabbit,
                    cell,
                    cause,
                });
            }
            Effect::Saved { rabbit, cell } => {
                world.counters.saved = world.counters.saved.saturating_add(1);
                let _ = gone.insert(rabbit);
                debug!(rabbit = rabbit.get(), "rabbit saved");
                out_events.push(Event::RabbitSaved { rabbit, cell });
            }
        }
    }

    if !gone.is_empty() {
        world
            .entities
            .retain(|entity| entity.rabbit_id().map_or(true, |id| !gone.contains(&id)));
    }
    world.entities.extend(born);

    world.counters.tick = world.counters.tick.saturating_add(1);
    trace!(
        tick = world.counters.tick,
        entities = world.entities.len(),
        "tick committed"
    );
    out_events.push(Event::TimeAdvanced {
        tick: world.counters.tick,
    });
}

/// Reasons a level cannot be turned into a world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum WorldError {
    /// An entity was placed outside the terrain grid.
    #[error("entity at column {column}, row {row} lies outside the {columns}x{rows} grid")]
    PlacementOutOfBounds {
        /// Column of the placement.
        column: u32,
        /// Row of the placement.
        row: u32,
        /// Width of the grid.
        columns: u32,
        /// Height of the grid.
        rows: u32,
    },
    /// An entity was placed inside a solid block.
    #[error("entity at column {column}, row {row} is inside solid terrain")]
    PlacementInSolid {
        /// Column of the placement.
        column: u32,
        /// Row of the placement.
        row: u32,
    },
    /// An entrance would emit rabbits below the bottom of the grid.
    #[error("entrance at column {column}, row {row} has no cell below it")]
    EntranceSpawnOutOfBounds {
        /// Column of the entrance.
        column: u32,
        /// Row of the entrance.
        row: u32,
    },
    /// An entrance would emit rabbits into a solid block.
    #[error("entrance at column {column}, row {row} sits on solid terrain")]
    EntranceSpawnBlocked {
        /// Column of the entrance.
        column: u32,
        /// Row of the entrance.
        row: u32,
    },
    /// The spawn delay must be at least one tick.
    #[error("spawn delay must be at least one tick")]
    ZeroSpawnDelay,
    /// The fatal fall distance must be at least one row.
    #[error("fatal fall distance must be at least one row")]
    ZeroFatalFallDistance,
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use rabbit_escape_core::{
        Census, Counters, Position, RabbitId, RabbitSnapshot, Settings, Terrain, WorldSnapshot,
    };

    use super::World;
    use crate::entity::{Entity, WorldView};

    /// Display name of the level the world was built from.
    #[must_use]
    pub fn name(world: &World) -> Option<&str> {
        world.name.as_deref()
    }

    /// Provides read-only access to the terrain grid.
    #[must_use]
    pub fn terrain(world: &World) -> &Terrain {
        &world.terrain
    }

    /// Settings the world runs with.
    #[must_use]
    pub fn settings(world: &World) -> Settings {
        world.settings
    }

    /// Global counters exposed for scoring.
    #[must_use]
    pub fn counters(world: &World) -> Counters {
        world.counters
    }

    /// Counters together with the number of live rabbits.
    #[must_use]
    pub fn census(world: &World) -> Census {
        let live = world
            .entities
            .iter()
            .filter(|entity| matches!(entity, Entity::Rabbit(_)))
            .count();
        Census {
            counters: world.counters,
            live_rabbits: u32::try_from(live).unwrap_or(u32::MAX),
        }
    }

    /// Cells occupied by entrances, in update order.
    #[must_use]
    pub fn entrances(world: &World) -> Vec<Position> {
        world
            .entities
            .iter()
            .filter_map(|entity| match entity {
                Entity::Entrance(entrance) => Some(entrance.cell()),
                _ => None,
            })
            .collect()
    }

    /// Cells occupied by exits, in update order.
    #[must_use]
    pub fn exits(world: &World) -> Vec<Position> {
        world.exit_cells()
    }

    /// Captures every live rabbit, including the change each will make next tick.
    #[must_use]
    pub fn rabbits(world: &World) -> Vec<RabbitSnapshot> {
        let exits = world.exit_cells();
        let view = WorldView::new(&world.terrain, &exits, world.settings);
        world
            .entities
            .iter()
            .filter_map(|entity| match entity {
                Entity::Rabbit(rabbit) => Some(rabbit.snapshot(&view)),
                _ => None,
            })
            .collect()
    }

    /// Captures a single rabbit, if it is still alive.
    #[must_use]
    pub fn rabbit(world: &World, id: RabbitId) -> Option<RabbitSnapshot> {
        rabbits(world).into_iter().find(|rabbit| rabbit.id == id)
    }

    /// Copies the world into an immutable snapshot consistent with the last tick.
    #[must_use]
    pub fn snapshot(world: &World) -> WorldSnapshot {
        WorldSnapshot {
            terrain: world.terrain.clone(),
            entrances: entrances(world),
            exits: exits(world),
            rabbits: rabbits(world),
            counters: world.counters,
        }
    }
}
