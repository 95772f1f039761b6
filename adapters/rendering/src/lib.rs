#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Text rendering for Rabbit Escape adapters.
//!
//! Rendering is a pure function of a [`WorldSnapshot`]: it never observes the
//! world mid-tick and never mutates it.

use std::{fmt, io::Write};

use anyhow::Result as AnyResult;
use rabbit_escape_core::{
    Change, Direction, Position, Preview, SlopeContact, SlopePhase, WorldSnapshot,
};

const ENTRANCE_GLYPH: char = 'Q';
const EXIT_GLYPH: char = 'O';
const RABBIT_RIGHT_GLYPH: char = 'r';
const RABBIT_LEFT_GLYPH: char = 'j';

/// Grid of glyphs describing one tick boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    columns: usize,
    glyphs: Vec<char>,
}

impl Frame {
    fn blank(columns: u32, rows: u32) -> Self {
        let columns = usize::try_from(columns).unwrap_or(0);
        let rows = usize::try_from(rows).unwrap_or(0);
        Self {
            columns,
            glyphs: vec![' '; columns.saturating_mul(rows)],
        }
    }

    /// Glyph drawn at the provided cell, if it lies inside the frame.
    #[must_use]
    pub fn glyph(&self, cell: Position) -> Option<char> {
        self.index(cell).map(|index| self.glyphs[index])
    }

    /// Returns the frame as one string per row.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        if self.columns == 0 {
            return Vec::new();
        }
        self.glyphs
            .chunks(self.columns)
            .map(|row| row.iter().collect())
            .collect()
    }

    fn draw(&mut self, cell: Position, glyph: char) {
        if let Some(index) = self.index(cell) {
            self.glyphs[index] = glyph;
        }
    }

    fn index(&self, cell: Position) -> Option<usize> {
        let column = usize::try_from(cell.column()).ok()?;
        let row = usize::try_from(cell.row()).ok()?;
        if column >= self.columns {
            return None;
        }
        let index = row.checked_mul(self.columns)?.checked_add(column)?;
        (index < self.glyphs.len()).then_some(index)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Draws the snapshot, optionally overlaying each rabbit's next change.
#[must_use]
pub fn render(snapshot: &WorldSnapshot, lookahead: bool) -> Frame {
    let terrain = &snapshot.terrain;
    let mut frame = Frame::blank(terrain.columns(), terrain.rows());

    for (row, cells) in terrain.iter_rows().enumerate() {
        let Ok(row) = u32::try_from(row) else {
            break;
        };
        for (column, cell) in cells.iter().enumerate() {
            let Ok(column) = u32::try_from(column) else {
                break;
            };
            frame.draw(Position::new(column, row), cell.glyph());
        }
    }

    for entrance in &snapshot.entrances {
        frame.draw(*entrance, ENTRANCE_GLYPH);
    }
    for exit in &snapshot.exits {
        frame.draw(*exit, EXIT_GLYPH);
    }
    for rabbit in &snapshot.rabbits {
        let glyph = match rabbit.facing {
            Direction::Right => RABBIT_RIGHT_GLYPH,
            Direction::Left => RABBIT_LEFT_GLYPH,
        };
        frame.draw(rabbit.cell, glyph);
    }

    if lookahead {
        for rabbit in &snapshot.rabbits {
            let Preview { cell, change } = rabbit.preview;
            if let Some(cell) = cell {
                frame.draw(cell, change_glyph(change));
            }
        }
    }

    frame
}

/// Glyph used by lookahead rendering for a pending change.
#[must_use]
pub const fn change_glyph(change: Change) -> char {
    match change {
        Change::Walk(Direction::Right) => '>',
        Change::Walk(Direction::Left) => '<',
        Change::Turn(Direction::Right) => '|',
        Change::Turn(Direction::Left) => '?',
        Change::Rise { facing, phase } => match (facing, phase) {
            (Direction::Right, SlopePhase::Start) => '~',
            (Direction::Right, SlopePhase::Continue) => '$',
            (Direction::Right, SlopePhase::End) => '\'',
            (Direction::Left, SlopePhase::Start) => '`',
            (Direction::Left, SlopePhase::Continue) => '^',
            (Direction::Left, SlopePhase::End) => '!',
        },
        Change::Lower { facing, phase } => match (facing, phase) {
            (Direction::Right, SlopePhase::Start) => '-',
            (Direction::Right, SlopePhase::Continue) => '@',
            (Direction::Right, SlopePhase::End) => '_',
            (Direction::Left, SlopePhase::Start) => '=',
            (Direction::Left, SlopePhase::Continue) => '%',
            (Direction::Left, SlopePhase::End) => '+',
        },
        Change::Fall => 'f',
        Change::FallOnto(SlopeContact::LowerRight) => 'e',
        Change::FallOnto(SlopeContact::LowerLeft) => 's',
        Change::FallOnto(SlopeContact::RiseRight) => 'd',
        Change::FallOnto(SlopeContact::RiseLeft) => 'a',
        Change::FallToDeath => 'x',
        Change::Dying { .. } => 'X',
        Change::EnterExit => 'E',
        Change::LeaveWorld => ' ',
    }
}

/// Destination for rendered frames.
pub trait Presenter {
    /// Presents the frame captured after `tick` ticks.
    fn present(&mut self, tick: u64, frame: &Frame) -> AnyResult<()>;
}

/// Presenter writing frames as plain text, separated by a tick header.
#[derive(Debug)]
pub struct TextPresenter<W> {
    writer: W,
}

impl<W: Write> TextPresenter<W> {
    /// Creates a presenter writing into `writer`.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Releases the underlying writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Presenter for TextPresenter<W> {
    fn present(&mut self, tick: u64, frame: &Frame) -> AnyResult<()> {
        writeln!(self.writer, "tick {tick}")?;
        write!(self.writer, "{frame}")?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rabbit_escape_core::{
        Counters, RabbitId, RabbitSnapshot, RabbitState, Terrain, TerrainCell,
    };

    use super::*;

    fn snapshot(preview: Preview) -> WorldSnapshot {
        let mut rows = vec![vec![TerrainCell::Empty; 3]];
        rows.push(vec![TerrainCell::Solid; 3]);
        WorldSnapshot {
            terrain: Terrain::from_rows(rows).expect("valid terrain"),
            entrances: Vec::new(),
            exits: vec![Position::new(2, 0)],
            rabbits: vec![RabbitSnapshot {
                id: RabbitId::new(0),
                cell: Position::new(0, 0),
                facing: Direction::Left,
                state: RabbitState::Walking,
                fall_distance: 0,
                preview,
            }],
            counters: Counters::default(),
        }
    }

    #[test]
    fn lookahead_overlays_previews() {
        let snapshot = snapshot(Preview {
            cell: Some(Position::new(1, 0)),
            change: Change::Walk(Direction::Right),
        });

        assert_eq!(render(&snapshot, false).lines(), vec!["j O", "###"]);
        assert_eq!(render(&snapshot, true).lines(), vec!["j>O", "###"]);
    }

    #[test]
    fn previews_off_the_grid_are_not_drawn() {
        let snapshot = snapshot(Preview {
            cell: None,
            change: Change::LeaveWorld,
        });

        assert_eq!(render(&snapshot, true).lines(), vec!["j O", "###"]);
    }

    #[test]
    fn dying_glyph_is_the_same_on_every_tick() {
        assert_eq!(change_glyph(Change::Dying { elapsed: 0 }), 'X');
        assert_eq!(change_glyph(Change::Dying { elapsed: 2 }), 'X');
    }

    #[test]
    fn text_presenter_prefixes_the_tick() {
        let snapshot = snapshot(Preview {
            cell: None,
            change: Change::LeaveWorld,
        });
        let mut presenter = TextPresenter::new(Vec::new());

        presenter
            .present(3, &render(&snapshot, false))
            .expect("write to memory");

        let text = String::from_utf8(presenter.into_inner()).expect("utf-8");
        assert_eq!(text, "tick 3\nj O\n###\n");
    }
}
