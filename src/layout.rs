//! Static terrain layouts: the input from which an [ArenaGrid](crate::arena_grid::ArenaGrid) is
//! built.
//!
//! Layouts are read from a small plain-text format modelled on common grid map files:
//! ```text
//! height 3
//! width 4
//! map
//! .Fs.
//! .F..
//! ....
//! ```
//! Every row holds one [Terrain::symbol] per cell.
use crate::arena_grid::CellCoord;
use crate::terrain::Terrain;
use core::fmt;
use itertools::Itertools;
use thiserror::Error;

const ARENA_MAP: &str = include_str!("../maps/arena.map");

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("layout is missing the `{0}` header line")]
    MissingHeader(&'static str),
    #[error("invalid value `{value}` for the `{field}` header")]
    InvalidHeader { field: &'static str, value: String },
    #[error("layout has no cells")]
    Empty,
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("expected {expected} rows, found {found}")]
    RowCountMismatch { expected: usize, found: usize },
    #[error("expected rows of width {expected}, found {found}")]
    WidthMismatch { expected: usize, found: usize },
    #[error("unknown terrain symbol `{symbol}` at ({row}, {col})")]
    UnknownSymbol { symbol: char, row: usize, col: usize },
    #[error("unknown terrain code {code} at ({row}, {col})")]
    UnknownCode { code: u8, row: usize, col: usize },
}

/// Rectangular terrain layout in row-major order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    rows: usize,
    cols: usize,
    terrain: Vec<Terrain>,
}

impl Layout {
    pub fn new(rows: usize, cols: usize, fill: Terrain) -> Layout {
        Layout {
            rows,
            cols,
            terrain: vec![fill; rows * cols],
        }
    }

    /// The 19x31 arena: a fenced play area with stone paths, trees and impassable rocks, and a
    /// spawn cell outside each of the four gaps in the fence.
    pub fn arena() -> Layout {
        Layout::parse(ARENA_MAP).expect("embedded arena map is well-formed")
    }

    /// Builds a layout from rows of numeric terrain codes.
    pub fn from_codes<R: AsRef<[u8]>>(codes: &[R]) -> Result<Layout, LayoutError> {
        Layout::from_cells(codes.iter().map(|row| row.as_ref().iter()), |code, row, col| {
            Terrain::from_code(*code).ok_or(LayoutError::UnknownCode { code: *code, row, col })
        })
    }

    /// Builds a layout from rows of terrain symbols.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Layout, LayoutError> {
        Layout::from_cells(rows.iter().map(|row| row.as_ref().chars()), |symbol, row, col| {
            Terrain::from_symbol(symbol).ok_or(LayoutError::UnknownSymbol { symbol, row, col })
        })
    }

    fn from_cells<I, T, F>(rows: I, mut decode: F) -> Result<Layout, LayoutError>
    where
        I: Iterator,
        I::Item: Iterator<Item = T>,
        F: FnMut(T, usize, usize) -> Result<Terrain, LayoutError>,
    {
        let mut terrain = Vec::new();
        let mut cols = None;
        let mut n_rows = 0;
        for (row, cells) in rows.enumerate() {
            let before = terrain.len();
            for (col, cell) in cells.enumerate() {
                terrain.push(decode(cell, row, col)?);
            }
            let found = terrain.len() - before;
            let expected = *cols.get_or_insert(found);
            if found != expected {
                return Err(LayoutError::RaggedRow {
                    row,
                    found,
                    expected,
                });
            }
            n_rows += 1;
        }
        let cols = cols.unwrap_or(0);
        if terrain.is_empty() {
            return Err(LayoutError::Empty);
        }
        Ok(Layout {
            rows: n_rows,
            cols,
            terrain,
        })
    }

    /// Parses the plain-text map format described in the module documentation.
    pub fn parse(text: &str) -> Result<Layout, LayoutError> {
        let mut lines = text.lines().map(str::trim_end).filter(|l| !l.is_empty());
        let height = parse_header(lines.next(), "height")?;
        let width = parse_header(lines.next(), "width")?;
        match lines.next() {
            Some("map") => {}
            _ => return Err(LayoutError::MissingHeader("map")),
        }
        let rows = lines.collect::<Vec<&str>>();
        if rows.len() != height {
            return Err(LayoutError::RowCountMismatch {
                expected: height,
                found: rows.len(),
            });
        }
        let layout = Layout::from_rows(&rows)?;
        if layout.cols != width {
            return Err(LayoutError::WidthMismatch {
                expected: width,
                found: layout.cols,
            });
        }
        Ok(layout)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
    pub fn cols(&self) -> usize {
        self.cols
    }

    fn index(&self, coord: CellCoord) -> usize {
        assert!(
            coord.row >= 0
                && coord.col >= 0
                && (coord.row as usize) < self.rows
                && (coord.col as usize) < self.cols,
            "cell {} is outside the {}x{} layout",
            coord,
            self.rows,
            self.cols
        );
        coord.row as usize * self.cols + coord.col as usize
    }

    pub fn get(&self, coord: CellCoord) -> Terrain {
        self.terrain[self.index(coord)]
    }

    pub fn set(&mut self, coord: CellCoord, terrain: Terrain) {
        let ix = self.index(coord);
        self.terrain[ix] = terrain;
    }

    /// Fills `height` rows and `width` columns starting at `origin`, clipped to the layout.
    pub fn set_rect(&mut self, origin: CellCoord, height: i32, width: i32, terrain: Terrain) {
        for row in origin.row.max(0)..(origin.row + height).min(self.rows as i32) {
            for col in origin.col.max(0)..(origin.col + width).min(self.cols as i32) {
                self.set(CellCoord::new(row, col), terrain);
            }
        }
    }
}

fn parse_header(line: Option<&str>, field: &'static str) -> Result<usize, LayoutError> {
    let line = line.ok_or(LayoutError::MissingHeader(field))?;
    match line.split_once(' ') {
        Some((name, value)) if name == field => {
            value
                .trim()
                .parse::<usize>()
                .map_err(|_| LayoutError::InvalidHeader {
                    field,
                    value: value.trim().to_owned(),
                })
        }
        _ => Err(LayoutError::MissingHeader(field)),
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "height {}", self.rows)?;
        writeln!(f, "width {}", self.cols)?;
        writeln!(f, "map")?;
        for row in self.terrain.chunks(self.cols.max(1)) {
            writeln!(f, "{}", row.iter().join(""))?;
        }
        Ok(())
    }
}
