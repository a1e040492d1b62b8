//! Grid structure: parsing, slot discovery, and the overlap map.
//!
//! A structure file is a text grid where `_` marks an open cell and any other
//! character a blocked cell. A [`Variable`] is a maximal horizontal or
//! vertical run of at least two open cells. For every pair of crossing slots
//! the puzzle records the overlap `(i, j)`: the i-th letter of the first
//! slot's word must equal the j-th letter of the second's. Overlaps and
//! neighbor lists are computed once at construction and are read-only during
//! solving.

use std::collections::HashMap;
use std::path::Path;

use crate::errors::PuzzleError;
use crate::variable::{Direction, Variable};

/// The character that marks an open cell in a structure file.
pub const OPEN_CELL: char = '_';

/// An immutable crossword grid: geometry plus the derived constraint graph.
#[derive(Debug, Clone)]
pub struct Puzzle {
    height: usize,
    width: usize,
    open: Vec<Vec<bool>>,
    variables: Vec<Variable>,
    overlaps: HashMap<(Variable, Variable), (usize, usize)>,
    neighbors: HashMap<Variable, Vec<Variable>>,
}

impl Puzzle {
    /// Parse a structure description into a puzzle.
    ///
    /// Rows may be ragged; the grid width is the longest row and missing
    /// trailing cells are treated as blocked.
    ///
    /// # Errors
    /// Returns [`PuzzleError::EmptyStructure`] if the input contains no
    /// cells. A grid with cells but no slots is valid (it solves trivially).
    pub fn parse(structure: &str) -> Result<Puzzle, PuzzleError> {
        let rows: Vec<&str> = structure
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .collect();
        let width = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0);
        if width == 0 {
            return Err(PuzzleError::EmptyStructure);
        }

        let open: Vec<Vec<bool>> = rows
            .iter()
            .map(|row| {
                let mut cells: Vec<bool> = row.chars().map(|c| c == OPEN_CELL).collect();
                cells.resize(width, false);
                cells
            })
            .collect();

        Ok(Self::from_grid(open))
    }

    /// Read a structure file from `path` and parse it.
    ///
    /// # Errors
    /// Returns [`PuzzleError::Io`] if the file cannot be read, or any error
    /// of [`Puzzle::parse`].
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Puzzle, PuzzleError> {
        let path_ref = path.as_ref();
        let data = std::fs::read_to_string(path_ref).map_err(|e| PuzzleError::Io {
            path: path_ref.display().to_string(),
            source: e,
        })?;
        Self::parse(&data)
    }

    /// Build the puzzle from an open/blocked matrix (rows already padded to a
    /// uniform width).
    fn from_grid(open: Vec<Vec<bool>>) -> Puzzle {
        let height = open.len();
        let width = open.first().map_or(0, Vec::len);

        let mut variables = Vec::new();
        for i in 0..height {
            for j in 0..width {
                if !open[i][j] {
                    continue;
                }
                // A slot starts where a run of open cells is not preceded by
                // another open cell. Runs of a single cell are not slots.
                if j == 0 || !open[i][j - 1] {
                    let length = (j..width).take_while(|&k| open[i][k]).count();
                    if length > 1 {
                        variables.push(Variable::new(i, j, Direction::Across, length));
                    }
                }
                if i == 0 || !open[i - 1][j] {
                    let length = (i..height).take_while(|&k| open[k][j]).count();
                    if length > 1 {
                        variables.push(Variable::new(i, j, Direction::Down, length));
                    }
                }
            }
        }
        variables.sort_unstable();

        let mut overlaps = HashMap::new();
        let mut neighbors: HashMap<Variable, Vec<Variable>> =
            variables.iter().map(|&v| (v, Vec::new())).collect();
        for (a, &x) in variables.iter().enumerate() {
            let x_cells: HashMap<(usize, usize), usize> =
                x.cells().enumerate().map(|(i, cell)| (cell, i)).collect();
            for &y in &variables[a + 1..] {
                // Maximal runs cross in at most one cell.
                let Some((j, i)) = y
                    .cells()
                    .enumerate()
                    .find_map(|(j, cell)| x_cells.get(&cell).map(|&i| (j, i)))
                else {
                    continue;
                };
                overlaps.insert((x, y), (i, j));
                overlaps.insert((y, x), (j, i));
                if let Some(list) = neighbors.get_mut(&x) {
                    list.push(y);
                }
                if let Some(list) = neighbors.get_mut(&y) {
                    list.push(x);
                }
            }
        }
        for list in neighbors.values_mut() {
            list.sort_unstable();
        }

        Puzzle { height, width, open, variables, overlaps, neighbors }
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Whether the cell at (row, col) is open. Out-of-range cells are blocked.
    #[must_use]
    pub fn is_open(&self, row: usize, col: usize) -> bool {
        self.open
            .get(row)
            .and_then(|cells| cells.get(col))
            .copied()
            .unwrap_or(false)
    }

    /// All slots of the grid, in canonical (row, col, direction) order.
    #[must_use]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// The overlap between `x` and `y`, if they share a cell: `(i, j)` such
    /// that the i-th letter of `x`'s word equals the j-th letter of `y`'s.
    #[must_use]
    pub fn overlap(&self, x: Variable, y: Variable) -> Option<(usize, usize)> {
        self.overlaps.get(&(x, y)).copied()
    }

    /// Slots sharing a cell with `x`, in canonical order.
    #[must_use]
    pub fn neighbors(&self, x: Variable) -> &[Variable] {
        self.neighbors.get(&x).map_or(&[], Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CROSS: &str = "___\n##_\n##_\n";

    #[test]
    fn test_parse_finds_maximal_runs() {
        let puzzle = Puzzle::parse(CROSS).unwrap();
        assert_eq!(
            puzzle.variables(),
            &[
                Variable::new(0, 0, Direction::Across, 3),
                Variable::new(0, 2, Direction::Down, 3),
            ]
        );
        assert_eq!(puzzle.height(), 3);
        assert_eq!(puzzle.width(), 3);
    }

    #[test]
    fn test_parse_ignores_single_cell_runs() {
        // The middle column opens in isolated cells only.
        let puzzle = Puzzle::parse("#_#\n___\n#_#\n").unwrap();
        assert_eq!(
            puzzle.variables(),
            &[
                // The outer columns and rows open in isolated cells only;
                // just the middle row and middle column form slots.
                Variable::new(0, 1, Direction::Down, 3),
                Variable::new(1, 0, Direction::Across, 3),
            ]
        );
    }

    #[test]
    fn test_parse_pads_ragged_rows_with_blocked_cells() {
        let puzzle = Puzzle::parse("____\n__\n").unwrap();
        assert_eq!(puzzle.width(), 4);
        assert!(!puzzle.is_open(1, 2));
        assert!(!puzzle.is_open(1, 3));
        assert_eq!(
            puzzle.variables(),
            &[
                Variable::new(0, 0, Direction::Across, 4),
                Variable::new(0, 0, Direction::Down, 2),
                Variable::new(0, 1, Direction::Down, 2),
                Variable::new(1, 0, Direction::Across, 2),
            ]
        );
    }

    #[test]
    fn test_parse_handles_crlf() {
        let unix = Puzzle::parse(CROSS).unwrap();
        let dos = Puzzle::parse("___\r\n##_\r\n##_\r\n").unwrap();
        assert_eq!(unix.variables(), dos.variables());
    }

    #[test]
    fn test_parse_empty_input_is_an_error() {
        assert!(matches!(Puzzle::parse(""), Err(PuzzleError::EmptyStructure)));
        assert!(matches!(Puzzle::parse("\n\n"), Err(PuzzleError::EmptyStructure)));
    }

    #[test]
    fn test_all_blocked_grid_has_no_variables() {
        let puzzle = Puzzle::parse("###\n###\n").unwrap();
        assert!(puzzle.variables().is_empty());
    }

    #[test]
    fn test_overlap_is_symmetric_with_swapped_indices() {
        let puzzle = Puzzle::parse(CROSS).unwrap();
        let across = Variable::new(0, 0, Direction::Across, 3);
        let down = Variable::new(0, 2, Direction::Down, 3);

        // Shared cell is (0, 2): letter 2 of the across slot, letter 0 of
        // the down slot.
        assert_eq!(puzzle.overlap(across, down), Some((2, 0)));
        assert_eq!(puzzle.overlap(down, across), Some((0, 2)));
    }

    #[test]
    fn test_no_overlap_between_parallel_slots() {
        let puzzle = Puzzle::parse("___\n###\n___\n").unwrap();
        let top = Variable::new(0, 0, Direction::Across, 3);
        let bottom = Variable::new(2, 0, Direction::Across, 3);
        assert_eq!(puzzle.overlap(top, bottom), None);
        assert!(puzzle.neighbors(top).is_empty());
    }

    #[test]
    fn test_neighbors_are_sorted_and_mutual() {
        let puzzle = Puzzle::parse("_____\n#_#_#\n#_#_#\n").unwrap();
        let across = Variable::new(0, 0, Direction::Across, 5);
        let left = Variable::new(0, 1, Direction::Down, 3);
        let right = Variable::new(0, 3, Direction::Down, 3);

        assert_eq!(puzzle.neighbors(across), &[left, right]);
        assert_eq!(puzzle.neighbors(left), &[across]);
        assert_eq!(puzzle.neighbors(right), &[across]);
    }

    #[test]
    fn test_is_open_out_of_range_is_blocked() {
        let puzzle = Puzzle::parse(CROSS).unwrap();
        assert!(puzzle.is_open(0, 0));
        assert!(!puzzle.is_open(0, 99));
        assert!(!puzzle.is_open(99, 0));
    }
}
