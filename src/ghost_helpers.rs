use crate::game_state::{GameMode, GameState};
use crate::ghost_state::{GhostColor, GHOST_COLORS};
use crate::location::{Direction, CARDINAL_DIRS};
use crate::variables::{in_bounds, wall_at};

/// Squared distance below which orange gives up chasing and retreats to
/// its scatter corner
const ORANGE_RETREAT_DIST_SQ: i64 = 64;

fn dist_sq(row1: i8, col1: i8, row2: i8, col2: i8) -> i64 {
    let d_row = (row1 - row2) as i64;
    let d_col = (col1 - col2) as i64;
    d_row * d_row + d_col * d_col
}

impl GameState {
    /************************ Ghost Targeting (Chase Mode) ************************/

    /// The chase target of the red ghost: Pacman's exact cell
    fn chase_target_red(&self) -> (i8, i8) {
        (self.pacman_loc.row, self.pacman_loc.col)
    }

    /// The chase target of the pink ghost: 4 cells ahead of Pacman
    fn chase_target_pink(&self) -> (i8, i8) {
        self.pacman_loc.ahead_cell(4)
    }

    /// The chase target of the cyan ghost: red's cell, reflected about the
    /// cell 2 ahead of Pacman
    fn chase_target_cyan(&self) -> (i8, i8) {
        let (pivot_row, pivot_col) = self.pacman_loc.ahead_cell(2);
        let red = &self.ghosts[GhostColor::Red as usize].loc;
        (2 * pivot_row - red.row, 2 * pivot_col - red.col)
    }

    /// The chase target of the orange ghost: Pacman while far away, its own
    /// scatter corner once it closes in. The distance is measured from the
    /// cell the ghost is about to occupy.
    fn chase_target_orange(&self, next_row: i8, next_col: i8) -> (i8, i8) {
        let far = dist_sq(next_row, next_col, self.pacman_loc.row, self.pacman_loc.col)
            > ORANGE_RETREAT_DIST_SQ;
        if far {
            (self.pacman_loc.row, self.pacman_loc.col)
        } else {
            GhostColor::Orange.scatter_target()
        }
    }

    /// The chase target of an arbitrary ghost color
    fn chase_target(&self, color: GhostColor, next_row: i8, next_col: i8) -> (i8, i8) {
        match color {
            GhostColor::Red => self.chase_target_red(),
            GhostColor::Pink => self.chase_target_pink(),
            GhostColor::Cyan => self.chase_target_cyan(),
            GhostColor::Orange => self.chase_target_orange(next_row, next_col),
        }
    }

    /***************************** Ghost Prediction *****************************/

    /// Guess the next direction one ghost will take, writing the choice to
    /// its `planned_direction`.
    ///
    /// The arbiter never tells us ghost intentions, so this mirrors the
    /// engine's own rules: pick the legal non-reversing step whose landing
    /// cell sits closest to the target (farthest, when frightened), with
    /// ties falling to enumeration order Up, Left, Down, Right.
    pub fn guess_plan(&mut self, color: GhostColor) {
        let ghost = &self.ghosts[color as usize];

        // Spawning ghosts are effectively frozen over short lookaheads,
        // and absent ghosts have nothing to plan
        if ghost.spawning || !in_bounds(ghost.loc.row, ghost.loc.col) {
            return;
        }

        let (next_row, next_col) = ghost.loc.next_cell();
        let (row_dir, col_dir) = (ghost.loc.row_dir, ghost.loc.col_dir);
        let frightened = ghost.is_frightened();

        let (target_row, target_col) = match self.game_mode {
            GameMode::Chase => self.chase_target(color, next_row, next_col),
            GameMode::Scatter => color.scatter_target(),
            // No target while paused; candidates fall back on tie-breaks
            GameMode::Paused => (0, 0),
        };

        let mut best_dir = Direction::Up;
        let mut best_dist = if frightened { -1 } else { i64::MAX };

        for dir in CARDINAL_DIRS {
            let (d_row, d_col) = dir.deltas();

            // Ghosts are not allowed to reverse
            if d_row + row_dir == 0 && d_col + col_dir == 0 {
                continue;
            }

            let (new_row, new_col) = (next_row + d_row, next_col + d_col);
            if wall_at(new_row, new_col) {
                continue;
            }

            let dist = dist_sq(new_row, new_col, target_row, target_col);
            let better = if frightened {
                dist > best_dist
            } else {
                dist < best_dist
            };
            if better {
                best_dir = dir;
                best_dist = dist;
            }
        }

        self.ghosts[color as usize].planned_direction = best_dir;
    }

    /// Fill in a guessed plan for every ghost
    pub fn plan_all_ghosts(&mut self) {
        for color in GHOST_COLORS {
            self.guess_plan(color);
        }
    }

    /// Reverse every ghost's planned direction, as happens on each mode
    /// transition and super-pellet collection
    pub fn reverse_all_ghost_plans(&mut self) {
        for ghost in &mut self.ghosts {
            ghost.planned_direction = ghost.planned_direction.reversed();
        }
    }
}
