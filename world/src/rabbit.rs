//! Rabbit behaviour: gravity, landing, slope redirection and death.

use rabbit_escape_core::{
    Change, Direction, FatalCause, Position, Preview, RabbitId, RabbitSnapshot, RabbitState,
    SlopeContact, SlopePhase, TerrainCell,
};

use crate::entity::{Effect, WorldView};

/// Decision taken in the intent phase and applied in the commit phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Intent {
    /// Walk, climb, descend or turn in place (`to` equals the current cell).
    Move {
        to: Position,
        facing: Direction,
        change: Change,
    },
    /// Drop one row.
    Fall { to: Position, landing: Landing },
    /// Keep playing the death sequence.
    Linger,
    /// Death sequence finished.
    Expire(FatalCause),
    /// Standing on an exit.
    Exit,
    /// Destination lies off the grid.
    Leave,
}

/// What a one-row drop ends in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Landing {
    Airborne,
    Flat,
    Slope(SlopeContact),
    Fatal,
}

#[derive(Clone, Debug)]
pub(crate) struct Rabbit {
    id: RabbitId,
    cell: Position,
    facing: Direction,
    state: RabbitState,
    fall_distance: u32,
    intent: Option<Intent>,
}

impl Rabbit {
    pub(crate) const fn new(id: RabbitId, cell: Position, facing: Direction) -> Self {
        Self {
            id,
            cell,
            facing,
            state: RabbitState::Walking,
            fall_distance: 0,
            intent: None,
        }
    }

    pub(crate) const fn id(&self) -> RabbitId {
        self.id
    }

    pub(crate) fn calc_new_state(&mut self, view: &WorldView<'_>) {
        self.intent = Some(self.plan(view));
    }

    pub(crate) fn snapshot(&self, view: &WorldView<'_>) -> RabbitSnapshot {
        RabbitSnapshot {
            id: self.id,
            cell: self.cell,
            facing: self.facing,
            state: self.state,
            fall_distance: self.fall_distance,
            preview: self.describe(self.plan(view)),
        }
    }

    fn plan(&self, view: &WorldView<'_>) -> Intent {
        match self.state {
            RabbitState::Dying { cause, elapsed } => {
                if elapsed.saturating_add(1) >= cause.animation_ticks() {
                    Intent::Expire(cause)
                } else {
                    Intent::Linger
                }
            }
            _ if view.is_exit(self.cell) => Intent::Exit,
            RabbitState::Falling => self.plan_fall(view),
            RabbitState::Walking | RabbitState::Landing(_) => {
                if view.is_supported(self.cell) {
                    self.plan_walk(view)
                } else {
                    self.plan_fall(view)
                }
            }
        }
    }

    fn plan_fall(&self, view: &WorldView<'_>) -> Intent {
        let terrain = view.terrain();
        let Some(to) = self.cell.below().filter(|cell| terrain.contains(*cell)) else {
            return Intent::Leave;
        };

        let distance = self.fall_distance.saturating_add(1);
        let landing = if !view.is_supported(to) {
            Landing::Airborne
        } else if distance >= view.settings().fatal_fall_distance() {
            Landing::Fatal
        } else {
            match terrain.cell(to).rise() {
                Some(rise) => Landing::Slope(SlopeContact::between(rise, self.facing)),
                None => Landing::Flat,
            }
        };

        Intent::Fall { to, landing }
    }

    fn plan_walk(&self, view: &WorldView<'_>) -> Intent {
        let terrain = view.terrain();
        let facing = self.facing;
        let here = terrain.cell(self.cell);

        match here.rise() {
            Some(rise) if rise == facing => {
                let peak = self
                    .cell
                    .ahead(facing)
                    .filter(|cell| terrain.cell(*cell).rises_towards(facing.opposite()));
                if let Some(ahead) = peak {
                    return self.descend(ahead, SlopePhase::Start);
                }
                let Some(target) = self
                    .cell
                    .ahead(facing)
                    .and_then(Position::above)
                    .filter(|cell| terrain.contains(*cell))
                else {
                    return Intent::Leave;
                };
                let next = terrain.cell(target);
                if next.rises_towards(facing) {
                    self.climb(target, SlopePhase::Continue)
                } else if next.blocks(facing) {
                    self.turn()
                } else {
                    self.climb(target, SlopePhase::End)
                }
            }
            Some(_) => {
                let Some(ahead) = self.cell.ahead(facing) else {
                    return Intent::Leave;
                };
                let next = terrain.cell(ahead);
                if next == TerrainCell::Empty {
                    if let Some(lower) = ahead.below().filter(|cell| terrain.cell(*cell) == here) {
                        return self.descend(lower, SlopePhase::Continue);
                    }
                }
                if !terrain.contains(ahead) {
                    Intent::Leave
                } else if next.blocks(facing) {
                    self.turn()
                } else if next.rises_towards(facing) {
                    self.climb(ahead, SlopePhase::Start)
                } else {
                    self.descend(ahead, SlopePhase::End)
                }
            }
            None => {
                let Some(ahead) = self.cell.ahead(facing).filter(|cell| terrain.contains(*cell))
                else {
                    return Intent::Leave;
                };
                let next = terrain.cell(ahead);
                if next.blocks(facing) {
                    return self.turn();
                }
                if next.rises_towards(facing) {
                    return self.climb(ahead, SlopePhase::Start);
                }
                let falls_away = |cell: &Position| terrain.cell(*cell).rises_towards(facing.opposite());
                match ahead.below().filter(falls_away) {
                    Some(lower) => self.descend(lower, SlopePhase::Start),
                    None => Intent::Move {
                        to: ahead,
                        facing,
                        change: Change::Walk(facing),
                    },
                }
            }
        }
    }

    fn turn(&self) -> Intent {
        let facing = self.facing.opposite();
        Intent::Move {
            to: self.cell,
            facing,
            change: Change::Turn(facing),
        }
    }

    const fn climb(&self, to: Position, phase: SlopePhase) -> Intent {
        Intent::Move {
            to,
            facing: self.facing,
            change: Change::Rise {
                facing: self.facing,
                phase,
            },
        }
    }

    const fn descend(&self, to: Position, phase: SlopePhase) -> Intent {
        Intent::Move {
            to,
            facing: self.facing,
            change: Change::Lower {
                facing: self.facing,
                phase,
            },
        }
    }

    fn describe(&self, intent: Intent) -> Preview {
        let here = Some(self.cell);
        let dying = match self.state {
            RabbitState::Dying { elapsed, .. } => Change::Dying { elapsed },
            _ => Change::Dying { elapsed: 0 },
        };
        match intent {
            Intent::Move { to, change, .. } => Preview {
                cell: Some(to),
                change,
            },
            Intent::Fall { to, landing } => Preview {
                cell: Some(to),
                change: match landing {
                    Landing::Airborne | Landing::Flat => Change::Fall,
                    Landing::Slope(contact) => Change::FallOnto(contact),
                    Landing::Fatal => Change::FallToDeath,
                },
            },
            Intent::Linger | Intent::Expire(_) => Preview {
                cell: here,
                change: dying,
            },
            Intent::Exit => Preview {
                cell: here,
                change: Change::EnterExit,
            },
            Intent::Leave => Preview {
                cell: None,
                change: Change::LeaveWorld,
            },
        }
    }

    /// Applies the intent computed for this tick.
    pub(crate) fn step(&mut self) -> Effect {
        let Some(intent) = self.intent.take() else {
            return Effect::Idle;
        };
        let rabbit = self.id;

        match intent {
            Intent::Move { to, facing, change } => {
                let from = self.cell;
                self.cell = to;
                self.facing = facing;
                self.state = RabbitState::Walking;
                self.fall_distance = 0;
                if matches!(change, Change::Turn(_)) {
                    Effect::Turned { rabbit, facing }
                } else {
                    Effect::Moved { rabbit, from, to }
                }
            }
            Intent::Fall { to, landing } => {
                self.cell = to;
                let fall_distance = self.fall_distance.saturating_add(1);
                match landing {
                    Landing::Airborne => {
                        self.state = RabbitState::Falling;
                        self.fall_distance = fall_distance;
                        Effect::Fell {
                            rabbit,
                            to,
                            fall_distance,
                        }
                    }
                    Landing::Flat | Landing::Slope(_) => {
                        let contact = match landing {
                            Landing::Slope(contact) => Some(contact),
                            _ => None,
                        };
                        self.state = contact.map_or(RabbitState::Walking, RabbitState::Landing);
                        self.fall_distance = 0;
                        Effect::Landed {
                            rabbit,
                            cell: to,
                            fall_distance,
                            contact,
                        }
                    }
                    Landing::Fatal => {
                        self.state = RabbitState::Dying {
                            cause: FatalCause::Impact,
                            elapsed: 0,
                        };
                        self.fall_distance = 0;
                        Effect::Impacted {
                            rabbit,
                            cell: to,
                            fall_distance,
                        }
                    }
                }
            }
            Intent::Linger => {
                if let RabbitState::Dying { cause, elapsed } = self.state {
                    self.state = RabbitState::Dying {
                        cause,
                        elapsed: elapsed.saturating_add(1),
                    };
                }
                Effect::Idle
            }
            Intent::Expire(cause) => Effect::Died {
                rabbit,
                cell: self.cell,
                cause,
            },
            Intent::Exit => Effect::Saved {
                rabbit,
                cell: self.cell,
            },
            Intent::Leave => Effect::Died {
                rabbit,
                cell: self.cell,
                cause: FatalCause::OutOfBounds,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use rabbit_escape_core::{Settings, Terrain};

    use super::*;

    fn terrain(rows: &[&str]) -> Terrain {
        Terrain::from_rows(
            rows.iter()
                .map(|row| {
                    row.chars()
                        .map(|glyph| TerrainCell::from_glyph(glyph).expect("terrain glyph"))
                        .collect()
                })
                .collect(),
        )
        .expect("valid terrain")
    }

    fn plan(rows: &[&str], cell: Position, facing: Direction) -> Intent {
        let terrain = terrain(rows);
        let view = WorldView::new(&terrain, &[], Settings::default());
        Rabbit::new(RabbitId::new(0), cell, facing).plan(&view)
    }

    #[test]
    fn walks_forward_on_flat_ground() {
        let intent = plan(&["   ", "###"], Position::new(1, 0), Direction::Right);

        assert_eq!(
            intent,
            Intent::Move {
                to: Position::new(2, 0),
                facing: Direction::Right,
                change: Change::Walk(Direction::Right),
            }
        );
    }

    #[test]
    fn turns_in_place_at_a_wall() {
        let intent = plan(&[" #", "##"], Position::new(0, 0), Direction::Right);

        assert_eq!(
            intent,
            Intent::Move {
                to: Position::new(0, 0),
                facing: Direction::Left,
                change: Change::Turn(Direction::Left),
            }
        );
    }

    #[test]
    fn raised_side_of_a_slope_acts_as_a_wall() {
        let intent = plan(&[" \\", "##"], Position::new(0, 0), Direction::Right);

        assert!(matches!(
            intent,
            Intent::Move {
                change: Change::Turn(Direction::Left),
                ..
            }
        ));
    }

    #[test]
    fn starts_climbing_a_slope_rising_ahead() {
        let intent = plan(&["  #", " /#", "###"], Position::new(0, 1), Direction::Right);

        assert_eq!(
            intent,
            Intent::Move {
                to: Position::new(1, 1),
                facing: Direction::Right,
                change: Change::Rise {
                    facing: Direction::Right,
                    phase: SlopePhase::Start,
                },
            }
        );
    }

    #[test]
    fn climbing_continues_along_a_staircase_of_slopes() {
        let intent = plan(&["  /", " / ", "###"], Position::new(1, 1), Direction::Right);

        assert_eq!(
            intent,
            Intent::Move {
                to: Position::new(2, 0),
                facing: Direction::Right,
                change: Change::Rise {
                    facing: Direction::Right,
                    phase: SlopePhase::Continue,
                },
            }
        );
    }

    #[test]
    fn starts_descending_into_a_slope_falling_away() {
        let intent = plan(&["   ", "#\\ ", "###"], Position::new(0, 0), Direction::Right);

        assert_eq!(
            intent,
            Intent::Move {
                to: Position::new(1, 1),
                facing: Direction::Right,
                change: Change::Lower {
                    facing: Direction::Right,
                    phase: SlopePhase::Start,
                },
            }
        );
    }

    #[test]
    fn descending_continues_down_a_staircase() {
        let intent = plan(&["\\  ", " \\ ", "###"], Position::new(0, 0), Direction::Right);

        assert_eq!(
            intent,
            Intent::Move {
                to: Position::new(1, 1),
                facing: Direction::Right,
                change: Change::Lower {
                    facing: Direction::Right,
                    phase: SlopePhase::Continue,
                },
            }
        );
    }

    #[test]
    fn crosses_a_peak_straight_into_the_falling_slope() {
        let intent = plan(&["    ", " /\\ ", "####"], Position::new(1, 1), Direction::Right);

        assert_eq!(
            intent,
            Intent::Move {
                to: Position::new(2, 1),
                facing: Direction::Right,
                change: Change::Lower {
                    facing: Direction::Right,
                    phase: SlopePhase::Start,
                },
            }
        );
    }

    #[test]
    fn crosses_a_peak_facing_left() {
        let intent = plan(&["    ", " /\\ ", "####"], Position::new(2, 1), Direction::Left);

        assert_eq!(
            intent,
            Intent::Move {
                to: Position::new(1, 1),
                facing: Direction::Left,
                change: Change::Lower {
                    facing: Direction::Left,
                    phase: SlopePhase::Start,
                },
            }
        );
    }

    #[test]
    fn gap_without_a_slope_is_walked_into() {
        let intent = plan(&["   ", "# \\", "###"], Position::new(0, 0), Direction::Right);

        assert_eq!(
            intent,
            Intent::Move {
                to: Position::new(1, 0),
                facing: Direction::Right,
                change: Change::Walk(Direction::Right),
            }
        );
    }

    #[test]
    fn unsupported_rabbit_falls_one_row() {
        let intent = plan(&[" ", " ", " ", "#"], Position::new(0, 0), Direction::Right);

        assert_eq!(
            intent,
            Intent::Fall {
                to: Position::new(0, 1),
                landing: Landing::Airborne,
            }
        );
    }

    #[test]
    fn walking_off_the_grid_leaves_the_world() {
        let intent = plan(&["  ", "##"], Position::new(1, 0), Direction::Right);

        assert_eq!(intent, Intent::Leave);
    }

    #[test]
    fn falling_below_the_grid_leaves_the_world() {
        let intent = plan(&[" "], Position::new(0, 0), Direction::Right);

        assert_eq!(intent, Intent::Leave);
    }

    #[test]
    fn fatal_landing_is_detected_from_the_accumulated_distance() {
        let terrain = terrain(&[" ", " ", "#"]);
        let view = WorldView::new(&terrain, &[], Settings::default().with_fatal_fall_distance(3));
        let mut rabbit = Rabbit::new(RabbitId::new(0), Position::new(0, 0), Direction::Right);
        rabbit.state = RabbitState::Falling;
        rabbit.fall_distance = 2;

        assert_eq!(
            rabbit.plan(&view),
            Intent::Fall {
                to: Position::new(0, 1),
                landing: Landing::Fatal,
            }
        );
    }

    #[test]
    fn fatal_landing_is_reported_as_an_impact() {
        let terrain = terrain(&[" ", " ", "#"]);
        let view = WorldView::new(&terrain, &[], Settings::default().with_fatal_fall_distance(2));
        let mut rabbit = Rabbit::new(RabbitId::new(2), Position::new(0, 0), Direction::Right);
        rabbit.state = RabbitState::Falling;
        rabbit.fall_distance = 1;

        rabbit.calc_new_state(&view);

        assert_eq!(
            rabbit.step(),
            Effect::Impacted {
                rabbit: RabbitId::new(2),
                cell: Position::new(0, 1),
                fall_distance: 2,
            }
        );
        assert_eq!(
            rabbit.state,
            RabbitState::Dying {
                cause: FatalCause::Impact,
                elapsed: 0,
            }
        );
        assert_eq!(rabbit.fall_distance, 0);
    }

    #[test]
    fn dying_rabbit_expires_after_its_animation() {
        let terrain = terrain(&[" ", "#"]);
        let view = WorldView::new(&terrain, &[], Settings::default());
        let mut rabbit = Rabbit::new(RabbitId::new(4), Position::new(0, 0), Direction::Left);
        rabbit.state = RabbitState::Dying {
            cause: FatalCause::Impact,
            elapsed: 0,
        };

        rabbit.calc_new_state(&view);

        assert_eq!(
            rabbit.step(),
            Effect::Died {
                rabbit: RabbitId::new(4),
                cell: Position::new(0, 0),
                cause: FatalCause::Impact,
            }
        );
    }

    #[test]
    fn rabbit_on_an_exit_is_saved() {
        let terrain = terrain(&[" ", "#"]);
        let exits = [Position::new(0, 0)];
        let view = WorldView::new(&terrain, &exits, Settings::default());
        let mut rabbit = Rabbit::new(RabbitId::new(1), Position::new(0, 0), Direction::Right);

        rabbit.calc_new_state(&view);

        assert_eq!(
            rabbit.step(),
            Effect::Saved {
                rabbit: RabbitId::new(1),
                cell: Position::new(0, 0),
            }
        );
    }

    #[test]
    fn commit_without_intent_is_idle() {
        let mut rabbit = Rabbit::new(RabbitId::new(0), Position::new(0, 0), Direction::Right);

        assert_eq!(rabbit.step(), Effect::Idle);
    }
}
