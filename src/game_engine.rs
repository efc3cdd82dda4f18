use crate::game_state::{GameMode, GameState};
use crate::ghost_state::GHOST_COLORS;
use crate::location::Direction;
use crate::variables::{CHASE_LOCK_THRESHOLD, CHASE_STEPS, SCATTER_STEPS};

impl GameState {
    /// Advance the game by `num_ticks` engine ticks and then move Pacman
    /// one cell in `pacman_dir`, as one high-level planning step.
    ///
    /// Ghosts only move on update-period boundaries; between boundaries the
    /// world stands still. Returns whether Pacman survives the transition
    /// (a collision with a non-frightened ghost is fatal, a frightened one
    /// is eaten). Given identical inputs the outcome is always identical;
    /// nothing here rolls dice.
    pub fn simulate_action(&mut self, num_ticks: u16, pacman_dir: Direction) -> bool {
        // Fill in any ghost plans the last arbiter update wiped out
        for color in GHOST_COLORS {
            if self.ghosts[color as usize].planned_direction == Direction::None {
                self.guess_plan(color);
            }
        }

        let period = u16::from(self.update_period.max(1));

        for tick in 1..=num_ticks {
            // Keep ticking until an update boundary
            if self.curr_ticks.wrapping_add(tick) % period != 0 {
                continue;
            }

            // Move the ghosts, and reduce frightened steps if applicable
            for ghost in &mut self.ghosts {
                ghost.step();
            }

            // A fatal collision ends the rollout right here
            if !self.safety_check() {
                return false;
            }

            // Update the mode steps counter, and change the mode on expiry
            if self.mode_steps > 0 {
                self.mode_steps -= 1;
            }
            if self.mode_steps == 0 {
                match self.game_mode {
                    GameMode::Scatter => {
                        self.game_mode = GameMode::Chase;
                        self.mode_steps = CHASE_STEPS;
                        self.mode_duration = CHASE_STEPS;
                        self.reverse_all_ghost_plans();
                    }
                    // Chase only yields back to scatter while pellets are
                    // plentiful; the endgame stays locked to chase
                    GameMode::Chase if self.num_pellets() > CHASE_LOCK_THRESHOLD => {
                        self.game_mode = GameMode::Scatter;
                        self.mode_steps = SCATTER_STEPS;
                        self.mode_duration = SCATTER_STEPS;
                        self.reverse_all_ghost_plans();
                    }
                    _ => {}
                }
            }

            // Re-guess the ghost plans against the new positions and mode
            self.plan_all_ghosts();
        }

        // Without a direction for Pacman there is nothing left to do
        if pacman_dir == Direction::None {
            return true;
        }

        // Move Pacman one cell (walls block) and collect what's there
        self.pacman_loc.set_direction(pacman_dir);
        self.pacman_loc.advance();
        self.collect_fruit(self.pacman_loc.row, self.pacman_loc.col);
        self.collect_pellet(self.pacman_loc.row, self.pacman_loc.col);

        // Clearing the board ends the level; no ghost can spoil it now
        if self.num_pellets() == 0 {
            return true;
        }

        if !self.safety_check() {
            return false;
        }

        self.curr_ticks = self.curr_ticks.wrapping_add(num_ticks);
        true
    }
}
