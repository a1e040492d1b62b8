//! Render a solved assignment as a text grid.

use std::io;
use std::path::Path;

use crate::puzzle::Puzzle;
use crate::solver::Assignment;

/// Character used for blocked cells in rendered output.
pub const BLOCKED_CELL: char = '█';

/// Place each assigned word's letters on a height × width matrix.
///
/// Cells not covered by any assigned slot stay `None`.
#[must_use]
pub fn letter_grid(puzzle: &Puzzle, assignment: &Assignment) -> Vec<Vec<Option<char>>> {
    let mut letters = vec![vec![None; puzzle.width()]; puzzle.height()];
    for (var, word) in assignment {
        for (k, (row, col)) in var.cells().enumerate() {
            if let Some(&b) = word.as_bytes().get(k) {
                letters[row][col] = Some(b as char);
            }
        }
    }
    letters
}

/// Terminal form of a solved grid: one character per cell, [`BLOCKED_CELL`]
/// for blocked cells, the letter (or a space when unassigned) for open ones,
/// one line per row.
#[must_use]
pub fn render_text(puzzle: &Puzzle, assignment: &Assignment) -> String {
    let letters = letter_grid(puzzle, assignment);
    let mut out = String::with_capacity((puzzle.width() + 1) * puzzle.height());
    for (i, row) in letters.iter().enumerate() {
        for (j, letter) in row.iter().enumerate() {
            if puzzle.is_open(i, j) {
                out.push(letter.unwrap_or(' '));
            } else {
                out.push(BLOCKED_CELL);
            }
        }
        out.push('\n');
    }
    out
}

/// Write the rendered grid to a file.
///
/// # Errors
///
/// Will return an `Error` if unable to write the file at `path`.
pub fn save_text<P: AsRef<Path>>(
    puzzle: &Puzzle,
    assignment: &Assignment,
    path: P,
) -> io::Result<()> {
    let path_ref = path.as_ref();
    std::fs::write(path_ref, render_text(puzzle, assignment)).map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("failed to write solution to '{}': {}", path_ref.display(), e),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::{Direction, Variable};
    use std::rc::Rc;

    fn cross_fixture() -> (Puzzle, Assignment) {
        let puzzle = Puzzle::parse("___\n##_\n##_\n").unwrap();
        let mut assignment = Assignment::new();
        assignment.insert(Variable::new(0, 0, Direction::Across, 3), Rc::from("cat"));
        assignment.insert(Variable::new(0, 2, Direction::Down, 3), Rc::from("tac"));
        (puzzle, assignment)
    }

    #[test]
    fn test_letter_grid_places_words() {
        let (puzzle, assignment) = cross_fixture();
        let letters = letter_grid(&puzzle, &assignment);

        assert_eq!(letters[0][0], Some('c'));
        assert_eq!(letters[0][1], Some('a'));
        // Shared cell: last letter of "cat", first of "tac".
        assert_eq!(letters[0][2], Some('t'));
        assert_eq!(letters[1][2], Some('a'));
        assert_eq!(letters[2][2], Some('c'));
        assert_eq!(letters[1][0], None);
    }

    #[test]
    fn test_render_text_cross() {
        let (puzzle, assignment) = cross_fixture();
        assert_eq!(render_text(&puzzle, &assignment), "cat\n██a\n██c\n");
    }

    #[test]
    fn test_render_text_unassigned_cells_are_spaces() {
        let (puzzle, mut assignment) = cross_fixture();
        assignment.remove(&Variable::new(0, 2, Direction::Down, 3));
        assert_eq!(render_text(&puzzle, &assignment), "cat\n██ \n██ \n");
    }

    #[test]
    fn test_save_text_round_trips_through_a_file() {
        let (puzzle, assignment) = cross_fixture();
        let path = std::env::temp_dir().join(format!("crossfill_render_{}.txt", std::process::id()));

        save_text(&puzzle, &assignment, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(written, render_text(&puzzle, &assignment));
    }
}
