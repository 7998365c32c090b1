//! Grid model and serpentine traversal
//!
//! The field is a rectangle of `length` x `width` physical units, swept in
//! cells of `cell_size` units. Traversal is boustrophedon: even rows move
//! right, odd rows move left, rows advance downward. That covers an
//! `rows x cols` grid in exactly `rows * cols` steps with no row re-entry,
//! so no separate path-planning pass is needed.
//!
//! The grid is owned exclusively by the cycle controller; the single-activity
//! model means no locking around it.

use sdk::errors::ActuatorError;

/// Result type for grid operations
pub type Result<T> = std::result::Result<T, ActuatorError>;

/// Movement direction across the field.
///
/// `Up` exists for symmetry with the drive hardware but is never entered by
/// the serpentine traversal; it is reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Right,
    Down,
    Left,
    Up,
}

/// Grid lifecycle.
///
/// `Complete` is reachable only from `Active`, and only by crossing the
/// final row. Once complete, the position is frozen until `reset()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Idle,
    Active,
    Complete,
}

/// The field grid: dimensions, current position, visited matrix, lifecycle.
#[derive(Debug, Clone)]
pub struct Grid {
    length: u32,
    width: u32,
    cell_size: u32,
    rows: usize,
    cols: usize,
    row: usize,
    col: usize,
    direction: Direction,
    visited: Vec<Vec<bool>>,
    field_id: u32,
    lifecycle: Lifecycle,
}

impl Grid {
    /// Create an unconfigured grid: idle, no matrix.
    pub fn new() -> Self {
        Self {
            length: 0,
            width: 0,
            cell_size: 0,
            rows: 0,
            cols: 0,
            row: 0,
            col: 0,
            direction: Direction::Right,
            visited: Vec::new(),
            field_id: 0,
            lifecycle: Lifecycle::Idle,
        }
    }

    /// Configure the grid for a field.
    ///
    /// `rows = ceil(length / cell_size)`, `cols = ceil(width / cell_size)`.
    /// Allocates an all-false visited matrix, resets the position to (0,0)
    /// heading right, and returns the lifecycle to `Idle`.
    pub fn configure(
        &mut self,
        length: u32,
        width: u32,
        cell_size: u32,
        field_id: u32,
    ) -> Result<()> {
        if length == 0 || width == 0 || cell_size == 0 {
            return Err(ActuatorError::InvalidDimensions {
                length: length as i64,
                width: width as i64,
                cell_size: cell_size as i64,
            });
        }

        self.length = length;
        self.width = width;
        self.cell_size = cell_size;
        self.field_id = field_id;
        self.rows = length.div_ceil(cell_size) as usize;
        self.cols = width.div_ceil(cell_size) as usize;
        self.visited = vec![vec![false; self.cols]; self.rows];
        self.row = 0;
        self.col = 0;
        self.direction = Direction::Right;
        self.lifecycle = Lifecycle::Idle;

        Ok(())
    }

    /// Transition `Idle -> Active`. Idempotent on `Active` and `Complete`.
    pub fn start(&mut self) {
        if self.lifecycle == Lifecycle::Idle && !self.visited.is_empty() {
            self.lifecycle = Lifecycle::Active;
        }
    }

    /// Transition `Active -> Idle`, preserving visited state and position.
    pub fn stop(&mut self) {
        if self.lifecycle == Lifecycle::Active {
            self.lifecycle = Lifecycle::Idle;
        }
    }

    /// Mark the current cell visited and apply one serpentine movement step.
    ///
    /// Fails with `NotActive` on an idle grid and `AlreadyComplete` once the
    /// traversal has finished; neither failure mutates any state.
    pub fn advance(&mut self) -> Result<()> {
        match self.lifecycle {
            Lifecycle::Idle => return Err(ActuatorError::NotActive),
            Lifecycle::Complete => return Err(ActuatorError::AlreadyComplete),
            Lifecycle::Active => {}
        }

        self.visited[self.row][self.col] = true;

        match self.direction {
            Direction::Right => {
                if self.col < self.cols - 1 {
                    self.col += 1;
                } else {
                    self.direction = Direction::Down;
                    self.descend();
                }
            }
            Direction::Left => {
                if self.col > 0 {
                    self.col -= 1;
                } else {
                    self.direction = Direction::Down;
                    self.descend();
                }
            }
            Direction::Down => self.descend(),
            // Reserved: the serpentine sweep never turns upward.
            Direction::Up => {
                if self.row > 0 {
                    self.row -= 1;
                    self.direction = if self.row % 2 == 0 {
                        Direction::Right
                    } else {
                        Direction::Left
                    };
                } else {
                    self.lifecycle = Lifecycle::Complete;
                }
            }
        }

        Ok(())
    }

    /// Move one row down, or mark the traversal complete on the last row.
    fn descend(&mut self) {
        if self.row < self.rows - 1 {
            self.row += 1;
            self.direction = if self.row % 2 == 0 {
                Direction::Right
            } else {
                Direction::Left
            };
        } else {
            self.lifecycle = Lifecycle::Complete;
        }
    }

    /// Drop the visited matrix and zero all fields, returning to `Idle`.
    pub fn reset(&mut self) {
        *self = Grid::new();
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle == Lifecycle::Active
    }

    pub fn is_complete(&self) -> bool {
        self.lifecycle == Lifecycle::Complete
    }

    pub fn is_configured(&self) -> bool {
        !self.visited.is_empty()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Current position as (row, col).
    pub fn position(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    pub fn field_id(&self) -> u32 {
        self.field_id
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Whether a cell has been visited. Out-of-range cells read as false.
    pub fn visited(&self, row: usize, col: usize) -> bool {
        self.visited
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(false)
    }

    /// Number of visited cells.
    pub fn visited_count(&self) -> usize {
        self.visited
            .iter()
            .map(|r| r.iter().filter(|&&v| v).count())
            .sum()
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn active_grid(length: u32, width: u32, cell_size: u32) -> Grid {
        let mut grid = Grid::new();
        grid.configure(length, width, cell_size, 1).unwrap();
        grid.start();
        grid
    }

    #[test]
    fn test_dimension_derivation_rounds_up() {
        let mut grid = Grid::new();
        grid.configure(10, 10, 3, 1).unwrap();
        assert_eq!(grid.rows(), 4);
        assert_eq!(grid.cols(), 4);

        grid.configure(9, 6, 3, 1).unwrap();
        assert_eq!(grid.rows(), 3);
        assert_eq!(grid.cols(), 2);
    }

    #[test]
    fn test_invalid_dimensions_rejected() {
        let mut grid = Grid::new();
        assert!(matches!(
            grid.configure(0, 10, 1, 1),
            Err(ActuatorError::InvalidDimensions { .. })
        ));
        assert!(grid.configure(10, 0, 1, 1).is_err());
        assert!(grid.configure(10, 10, 0, 1).is_err());
        assert!(!grid.is_configured());
    }

    #[test]
    fn test_advance_requires_active() {
        let mut grid = Grid::new();
        grid.configure(3, 3, 1, 1).unwrap();

        let before = grid.position();
        assert!(matches!(grid.advance(), Err(ActuatorError::NotActive)));
        assert_eq!(grid.position(), before);
        assert_eq!(grid.visited_count(), 0);
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut grid = active_grid(2, 2, 1);
        grid.start();
        assert!(grid.is_active());

        // start() on an unconfigured grid stays idle
        let mut empty = Grid::new();
        empty.start();
        assert!(!empty.is_active());
    }

    #[test]
    fn test_stop_preserves_progress() {
        let mut grid = active_grid(3, 3, 1);
        grid.advance().unwrap();
        grid.advance().unwrap();

        grid.stop();
        assert!(!grid.is_active());
        assert_eq!(grid.position(), (0, 2));
        assert_eq!(grid.visited_count(), 2);

        grid.start();
        assert!(grid.is_active());
        assert_eq!(grid.position(), (0, 2));
    }

    #[test]
    fn test_serpentine_3x3_sequence() {
        let mut grid = active_grid(3, 3, 1);

        let expected = [
            ((0, 1), Direction::Right),
            ((0, 2), Direction::Right),
            ((1, 2), Direction::Left),
            ((1, 1), Direction::Left),
            ((1, 0), Direction::Left),
            ((2, 0), Direction::Right),
            ((2, 1), Direction::Right),
            ((2, 2), Direction::Right),
        ];

        assert_eq!(grid.position(), (0, 0));
        for (pos, dir) in expected {
            grid.advance().unwrap();
            assert_eq!(grid.position(), pos);
            assert_eq!(grid.direction(), dir);
        }

        grid.advance().unwrap();
        assert!(grid.is_complete());
        assert_eq!(grid.visited_count(), 9);
    }

    #[test]
    fn test_serpentine_4x2_sequence() {
        // length 4 -> 4 rows, width 2 -> 2 cols
        let mut grid = active_grid(4, 2, 1);

        let expected = [
            (0, 1),
            (1, 1),
            (1, 0),
            (2, 0),
            (2, 1),
            (3, 1),
            (3, 0),
        ];

        for pos in expected {
            grid.advance().unwrap();
            assert_eq!(grid.position(), pos);
        }

        grid.advance().unwrap();
        assert!(grid.is_complete());
        assert_eq!(grid.visited_count(), 8);
    }

    #[test]
    fn test_2x2_end_to_end() {
        let mut grid = Grid::new();
        grid.configure(2, 2, 1, 7).unwrap();
        assert_eq!(grid.rows(), 2);
        assert_eq!(grid.cols(), 2);
        assert_eq!(grid.field_id(), 7);
        grid.start();

        assert_eq!(grid.position(), (0, 0));
        assert_eq!(grid.direction(), Direction::Right);

        grid.advance().unwrap();
        assert_eq!(grid.position(), (0, 1));
        assert_eq!(grid.direction(), Direction::Right);

        grid.advance().unwrap();
        assert_eq!(grid.position(), (1, 1));
        assert_eq!(grid.direction(), Direction::Left);

        grid.advance().unwrap();
        assert!(grid.is_complete());
        assert_eq!(grid.position(), (1, 1));
    }

    #[test]
    fn test_complete_freezes_position() {
        let mut grid = active_grid(1, 1, 1);
        grid.advance().unwrap();
        assert!(grid.is_complete());

        let frozen = grid.position();
        assert!(matches!(
            grid.advance(),
            Err(ActuatorError::AlreadyComplete)
        ));
        assert_eq!(grid.position(), frozen);

        // start() on a completed grid is a no-op
        grid.start();
        assert!(grid.is_complete());
    }

    #[test]
    fn test_reset_returns_to_empty_idle() {
        let mut grid = active_grid(3, 3, 1);
        grid.advance().unwrap();
        grid.reset();

        assert!(!grid.is_configured());
        assert!(!grid.is_active());
        assert_eq!(grid.position(), (0, 0));
        assert_eq!(grid.field_id(), 0);
        assert_eq!(grid.rows(), 0);
    }

    proptest! {
        /// Full traversal visits every cell exactly once and completes in
        /// exactly rows * cols advances.
        #[test]
        fn prop_full_coverage(length in 1u32..12, width in 1u32..12, cell_size in 1u32..4) {
            let mut grid = Grid::new();
            grid.configure(length, width, cell_size, 1).unwrap();
            grid.start();

            let cells = grid.rows() * grid.cols();
            for step in 0..cells {
                prop_assert!(!grid.is_complete(), "completed early at step {}", step);
                let (row, col) = grid.position();
                prop_assert!(!grid.visited(row, col), "cell revisited at step {}", step);
                grid.advance().unwrap();
            }

            prop_assert!(grid.is_complete());
            prop_assert_eq!(grid.visited_count(), cells);
        }
    }
}
