#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Text level loader for Rabbit Escape.
//!
//! A level is a grid of glyphs, one row per line, optionally interleaved with
//! metadata lines of the form `:key=value`:
//!
//! ```text
//! :name=First steps
//! :num_rabbits=2
//! :rabbit_delay=3
//!  Q
//!      O
//! ######
//! ```

use std::num::ParseIntError;

use rabbit_escape_core::{
    Direction, Level, Placement, Position, Settings, Terrain, TerrainCell, TerrainError,
};
use thiserror::Error;

const META_PREFIX: char = ':';
const ENTRANCE_GLYPH: char = 'Q';
const EXIT_GLYPH: char = 'O';
const RABBIT_RIGHT_GLYPH: char = 'r';
const RABBIT_LEFT_GLYPH: char = 'j';

/// Parses level text into a [`Level`].
pub fn parse(text: &str) -> Result<Level, LevelError> {
    let lines: Vec<&str> = text.lines().collect();
    parse_lines(&lines)
}

/// Parses a level given as individual lines.
pub fn parse_lines<S: AsRef<str>>(lines: &[S]) -> Result<Level, LevelError> {
    let mut name = None;
    let mut settings = Settings::default();
    let mut rows: Vec<Vec<TerrainCell>> = Vec::new();
    let mut placements = Vec::new();

    for line in lines {
        let line = line.as_ref();
        if let Some(meta) = line.strip_prefix(META_PREFIX) {
            if let Some(value) = apply_meta(meta, &mut settings)? {
                name = Some(value);
            }
            continue;
        }

        let row = u32::try_from(rows.len()).map_err(|_| LevelError::TooLarge)?;
        let mut cells = Vec::with_capacity(line.len());
        for (column, glyph) in line.chars().enumerate() {
            let column = u32::try_from(column).map_err(|_| LevelError::TooLarge)?;
            let cell = Position::new(column, row);
            let (terrain, placement) = decode(glyph).ok_or(LevelError::UnknownGlyph {
                glyph,
                column,
                row,
            })?;
            cells.push(terrain);
            placements.extend(placement.map(|place| place(cell)));
        }
        rows.push(cells);
    }

    validate(&settings)?;
    let terrain = Terrain::from_rows(rows)?;
    let level = Level::new(terrain, placements, settings);
    Ok(match name {
        Some(name) => level.with_name(name),
        None => level,
    })
}

type Place = fn(Position) -> Placement;

fn decode(glyph: char) -> Option<(TerrainCell, Option<Place>)> {
    if let Some(terrain) = TerrainCell::from_glyph(glyph) {
        return Some((terrain, None));
    }
    let place: Place = match glyph {
        ENTRANCE_GLYPH => Placement::Entrance,
        EXIT_GLYPH => Placement::Exit,
        RABBIT_RIGHT_GLYPH => |cell| Placement::Rabbit {
            cell,
            facing: Direction::Right,
        },
        RABBIT_LEFT_GLYPH => |cell| Placement::Rabbit {
            cell,
            facing: Direction::Left,
        },
        _ => return None,
    };
    Some((TerrainCell::Empty, Some(place)))
}

/// Applies one metadata entry, returning the level name when the entry sets it.
fn apply_meta(meta: &str, settings: &mut Settings) -> Result<Option<String>, LevelError> {
    let (key, value) = meta
        .split_once('=')
        .ok_or_else(|| LevelError::MalformedMeta(meta.to_owned()))?;
    let key = key.trim();
    let value = value.trim();

    let number = || {
        value
            .parse::<u32>()
            .map_err(|source| LevelError::InvalidNumber {
                key: key.to_owned(),
                value: value.to_owned(),
                source,
            })
    };

    *settings = match key {
        "name" => return Ok(Some(value.to_owned())),
        "num_rabbits" => settings.with_num_rabbits(number()?),
        "num_to_save" => settings.with_num_to_save(number()?),
        "rabbit_delay" => settings.with_spawn_delay(number()?),
        "fatal_fall_distance" => settings.with_fatal_fall_distance(number()?),
        _ => return Err(LevelError::UnknownMeta(key.to_owned())),
    };
    Ok(None)
}

fn validate(settings: &Settings) -> Result<(), LevelError> {
    if settings.spawn_delay() == 0 {
        return Err(LevelError::InvalidSetting {
            key: "rabbit_delay",
            reason: "must be at least 1",
        });
    }
    if settings.fatal_fall_distance() == 0 {
        return Err(LevelError::InvalidSetting {
            key: "fatal_fall_distance",
            reason: "must be at least 1",
        });
    }
    Ok(())
}

/// Errors that can occur while loading level text.
#[derive(Debug, Error)]
pub enum LevelError {
    /// The grid is empty or ragged.
    #[error("invalid terrain: {0}")]
    Terrain(#[from] TerrainError),
    /// A grid character does not name any terrain or entity.
    #[error("unknown glyph {glyph:?} at column {column}, row {row}")]
    UnknownGlyph {
        /// Offending character.
        glyph: char,
        /// Column of the character.
        column: u32,
        /// Grid row of the character, metadata lines excluded.
        row: u32,
    },
    /// A metadata line is missing its `=` separator.
    #[error("metadata line ':{0}' is not of the form key=value")]
    MalformedMeta(String),
    /// A metadata key is not recognised.
    #[error("unknown metadata key '{0}'")]
    UnknownMeta(String),
    /// A numeric metadata value could not be parsed.
    #[error("metadata '{key}' has invalid value '{value}'")]
    InvalidNumber {
        /// Metadata key.
        key: String,
        /// Raw value.
        value: String,
        /// Parse failure.
        #[source]
        source: ParseIntError,
    },
    /// A setting parsed but is out of range.
    #[error("metadata '{key}' {reason}")]
    InvalidSetting {
        /// Metadata key.
        key: &'static str,
        /// Constraint that was violated.
        reason: &'static str,
    },
    /// The grid dimensions do not fit the coordinate type.
    #[error("level is too large")]
    TooLarge,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_terrain_entities_and_metadata() {
        let level = parse(
            ":name=Slopes\n:num_rabbits=3\n:rabbit_delay=2\n Q  \nr/\\j\n####\n",
        )
        .expect("level parses");

        assert_eq!(level.name(), Some("Slopes"));
        assert_eq!(level.settings().num_rabbits(), 3);
        assert_eq!(level.settings().spawn_delay(), 2);
        assert_eq!(
            level.settings().fatal_fall_distance(),
            Settings::DEFAULT_FATAL_FALL_DISTANCE
        );
        assert_eq!(level.terrain().columns(), 4);
        assert_eq!(level.terrain().rows(), 3);
        assert_eq!(
            level.terrain().cell(Position::new(1, 1)),
            TerrainCell::SlopeUpRight
        );
        assert_eq!(
            level.terrain().cell(Position::new(2, 1)),
            TerrainCell::SlopeUpLeft
        );
        assert_eq!(
            level.placements(),
            &[
                Placement::Entrance(Position::new(1, 0)),
                Placement::Rabbit {
                    cell: Position::new(0, 1),
                    facing: Direction::Right,
                },
                Placement::Rabbit {
                    cell: Position::new(3, 1),
                    facing: Direction::Left,
                },
            ]
        );
    }

    #[test]
    fn entity_cells_are_empty_terrain() {
        let level = parse_lines(&["rO", "##"]).expect("level parses");

        assert_eq!(level.terrain().cell(Position::new(0, 0)), TerrainCell::Empty);
        assert_eq!(level.terrain().cell(Position::new(1, 0)), TerrainCell::Empty);
    }

    #[test]
    fn rejects_ragged_rows() {
        let error = parse_lines(&["   ", "##"]).expect_err("ragged rows must fail");

        assert!(matches!(
            error,
            LevelError::Terrain(TerrainError::RaggedRow {
                row: 1,
                expected: 3,
                found: 2,
            })
        ));
    }

    #[test]
    fn rejects_unknown_glyphs() {
        let error = parse_lines(&[" ", "?"]).expect_err("unknown glyph must fail");

        assert!(matches!(
            error,
            LevelError::UnknownGlyph {
                glyph: '?',
                column: 0,
                row: 1,
            }
        ));
    }

    #[test]
    fn rejects_unknown_metadata() {
        let error = parse_lines(&[":colour=blue", "#"]).expect_err("unknown key must fail");

        assert!(matches!(error, LevelError::UnknownMeta(key) if key == "colour"));
    }

    #[test]
    fn rejects_non_numeric_metadata() {
        let error = parse_lines(&[":num_rabbits=lots", "#"]).expect_err("bad number must fail");

        assert!(matches!(error, LevelError::InvalidNumber { key, .. } if key == "num_rabbits"));
    }

    #[test]
    fn rejects_zero_spawn_delay() {
        let error = parse_lines(&[":rabbit_delay=0", "#"]).expect_err("zero delay must fail");

        assert!(matches!(
            error,
            LevelError::InvalidSetting {
                key: "rabbit_delay",
                ..
            }
        ));
    }

    #[test]
    fn rejects_empty_levels() {
        let error = parse("").expect_err("empty level must fail");

        assert!(matches!(error, LevelError::Terrain(TerrainError::Empty)));
    }
}
