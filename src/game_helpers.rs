use crate::actions::ActionMessage;
use crate::game_state::{GameMode, GameState};
use crate::location::{Direction, LocationState};
use crate::variables::*;

impl GameState {
    /**************************** Positional Queries ****************************/

    /// Determine if a pellet is at a given location
    pub fn pellet_at(&self, row: i8, col: i8) -> bool {
        if !in_bounds(row, col) {
            return false;
        }
        (self.pellet_arr[row as usize] >> col) & 1 == 1
    }

    /// Determine if a super pellet is at a given location: one of the four
    /// canonical corners, with its pellet bit still set
    pub fn super_pellet_at(&self, row: i8, col: i8) -> bool {
        self.pellet_at(row, col)
            && SUPER_PELLET_ROWS.contains(&row)
            && SUPER_PELLET_COLS.contains(&col)
    }

    /// Determine if the fruit is live at a given location
    pub fn fruit_at(&self, row: i8, col: i8) -> bool {
        self.fruit_steps > 0 && self.fruit_loc.at(row, col)
    }

    /// Determine if a wall is at a given location
    pub fn wall_at(&self, row: i8, col: i8) -> bool {
        wall_at(row, col)
    }

    /// Count the pellets left in the maze
    pub fn num_pellets(&self) -> u16 {
        self.pellet_arr
            .iter()
            .map(|row| row.count_ones() as u16)
            .sum()
    }

    /**************************** Collection Events ****************************/

    /// Collect the fruit if Pacman stands on it, and bring it one step
    /// closer to despawning either way
    pub fn collect_fruit(&mut self, row: i8, col: i8) {
        if self.fruit_at(row, col) {
            self.curr_score = self.curr_score.saturating_add(FRUIT_POINTS);
            self.fruit_steps = 0;
            self.fruit_loc = LocationState::empty();
            log::debug!("fruit collected at ({row}, {col})");
        }

        if self.fruit_steps > 0 {
            self.fruit_steps -= 1;
        }

        if self.fruit_steps == 0 {
            self.fruit_loc = LocationState::empty();
        }
    }

    /// Collect the pellet at a given location, scoring it and firing the
    /// pellet-count events (fruit spawns, chase lock, frightening ghosts)
    pub fn collect_pellet(&mut self, row: i8, col: i8) {
        if !self.pellet_at(row, col) {
            return;
        }

        let super_pellet = self.super_pellet_at(row, col);

        // Remove the pellet at this location
        self.pellet_arr[row as usize] &= !(1 << col);
        self.curr_score = self.curr_score.saturating_add(if super_pellet {
            SUPER_PELLET_POINTS
        } else {
            PELLET_POINTS
        });

        // Spawn the fruit when the count crosses a threshold
        let num_pellets = self.num_pellets();
        if num_pellets == FRUIT_THRESHOLD_1 || num_pellets == FRUIT_THRESHOLD_2 {
            self.fruit_steps = FRUIT_DURATION;
            self.fruit_loc = LocationState::new(FRUIT_ROW, FRUIT_COL, Direction::None);
        }

        // With few pellets left, the ghosts stop scattering for good
        if num_pellets <= CHASE_LOCK_THRESHOLD && self.game_mode == GameMode::Scatter {
            self.game_mode = GameMode::Chase;
        }

        // A super pellet frightens every ghost and snaps it around
        if super_pellet {
            log::debug!("super pellet collected at ({row}, {col})");
            for ghost in &mut self.ghosts {
                ghost.fright_steps = GHOST_FRIGHT_STEPS;
                ghost.planned_direction = ghost.planned_direction.reversed();
            }
        }
    }

    /***************************** Collision Checks *****************************/

    /// Check whether Pacman survives the current cell occupancy: a shared
    /// cell with a non-frightened ghost is fatal, while a frightened ghost
    /// is eaten and sent back through the spawn pipeline.
    pub fn safety_check(&mut self) -> bool {
        let (pacman_row, pacman_col) = (self.pacman_loc.row, self.pacman_loc.col);

        for ghost in &mut self.ghosts {
            if ghost.loc.at(pacman_row, pacman_col) {
                if !ghost.is_frightened() {
                    return false;
                }
                ghost.respawn();
            }
        }

        true
    }

    /***************************** Outbound Actions *****************************/

    /// Enqueue an action for the dispatcher
    pub fn queue_action(&mut self, message: ActionMessage) {
        log::debug!(
            "queueing action: {} x{} -> ({}, {}) after {} ticks",
            message.direction_byte() as char,
            message.distance,
            message.target_row,
            message.target_col,
            message.wait_ticks,
        );
        self.action_queue.push(message);
    }

    /// Apply an observed Pacman position from the localization sidecar.
    /// Corrections landing in walls or out of bounds are ignored.
    pub fn correct_pacman_loc(&mut self, row: i8, col: i8) {
        if wall_at(row, col) {
            log::debug!("dropping localization fix inside a wall: ({row}, {col})");
            return;
        }
        self.pacman_loc.row = row;
        self.pacman_loc.col = col;
    }
}
