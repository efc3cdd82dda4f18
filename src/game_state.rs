use array_init::array_init;
use byteorder::{BigEndian, ByteOrder};
use thiserror::Error;

use crate::actions::ActionQueue;
use crate::ghost_state::{GhostState, GHOST_COLORS, NUM_COLORS};
use crate::location::{Direction, LocationState};
use crate::variables::*;

/// The byte length of one serialized game state
pub const SERIALIZED_LEN: usize = 28 + 4 * MAZE_ROWS;

/// The possible game modes
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum GameMode {
    #[default]
    Paused = 0,
    Scatter = 1,
    Chase = 2,
}

impl GameMode {
    /// Decode a mode byte; unknown values read as paused, the do-nothing
    /// mode, so a confused arbiter cannot make us move
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            1 => GameMode::Scatter,
            2 => GameMode::Chase,
            _ => GameMode::Paused,
        }
    }
}

/// An inbound frame the decision core refuses to apply
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UpdateError {
    #[error("malformed update: expected {SERIALIZED_LEN} bytes, got {0}")]
    BadLength(usize),
}

/// The live mirror of the arbiter's game state, plus the decision core's
/// bookkeeping (lock flag, connection flag, outbound action queue).
///
/// The serialized form is the arbiter's fixed 152-byte big-endian layout;
/// `update` consumes it and `serialize` reproduces it bit-exactly, which
/// is also what makes snapshot/restore cheap during search.
pub struct GameState {
    /* Message header */
    pub curr_ticks: u16,
    pub update_period: u8,
    pub game_mode: GameMode,
    pub mode_steps: u8,
    pub mode_duration: u8,

    /* Game information */
    pub curr_score: u16,
    pub curr_level: u8,
    pub curr_lives: u8,

    /* Entities, in wire order */
    pub ghosts: [GhostState; NUM_COLORS],
    pub pacman_loc: LocationState,
    pub fruit_loc: LocationState,
    pub fruit_steps: u8,
    pub fruit_duration: u8,

    /* Pellets encoded as one bit array per row */
    pub pellet_arr: [u32; MAZE_ROWS],

    /* Decision-core bookkeeping (never serialized) */
    locked: bool,
    connected: bool,
    pub action_queue: ActionQueue,
}

impl GameState {
    /// Create a new game state with default values
    pub fn new() -> Self {
        Self {
            curr_ticks: 0,
            update_period: INIT_UPDATE_PERIOD,
            game_mode: GameMode::Paused,
            mode_steps: 0,
            mode_duration: u8::MAX,

            curr_score: 0,
            curr_level: INIT_LEVEL,
            curr_lives: INIT_LIVES,

            ghosts: array_init(|color| GhostState::new(GHOST_COLORS[color])),
            pacman_loc: LocationState::empty(),
            fruit_loc: LocationState::empty(),
            fruit_steps: 0,
            fruit_duration: FRUIT_DURATION,

            pellet_arr: INIT_PELLETS,

            locked: false,
            connected: false,
            action_queue: ActionQueue::new(),
        }
    }

    /******************************** State Lock ********************************/

    /// Lock the game state, to prevent inbound overwrites mid-plan
    pub fn lock(&mut self) {
        self.locked = true;
    }

    /// Unlock the game state, to allow updates
    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// Check if the game state is locked
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /***************************** Connection Status *****************************/

    /// Set the connection status of the client feeding this state
    pub fn set_connection_status(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// Check if the client feeding this state is connected
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /******************************* Serialization *******************************/

    /// Serialize this game state with the same layout as arbiter updates
    pub fn serialize(&self) -> [u8; SERIALIZED_LEN] {
        let mut buf = [0u8; SERIALIZED_LEN];

        BigEndian::write_u16(&mut buf[0..2], self.curr_ticks);
        buf[2] = self.update_period;
        buf[3] = self.game_mode as u8;
        buf[4] = self.mode_steps;
        buf[5] = self.mode_duration;
        BigEndian::write_u16(&mut buf[6..8], self.curr_score);
        buf[8] = self.curr_level;
        buf[9] = self.curr_lives;

        // Four ghosts: 2 bytes of location, 1 byte of auxiliary info
        let mut offset = 10;
        for ghost in &self.ghosts {
            BigEndian::write_u16(&mut buf[offset..offset + 2], ghost.loc.serialize());
            buf[offset + 2] = ghost.serialize_aux();
            offset += 3;
        }

        BigEndian::write_u16(&mut buf[22..24], self.pacman_loc.serialize());
        BigEndian::write_u16(&mut buf[24..26], self.fruit_loc.serialize());
        buf[26] = self.fruit_steps;
        buf[27] = self.fruit_duration;

        let mut offset = 28;
        for row in &self.pellet_arr {
            BigEndian::write_u32(&mut buf[offset..offset + 4], *row);
            offset += 4;
        }

        buf
    }

    /// Update this game state from an arbiter frame. Frames are dropped
    /// while the state is locked (the next frame carries a full snapshot,
    /// so nothing is lost) and rejected when the length is wrong.
    pub fn update(&mut self, bytes: &[u8], lock_override: bool) -> Result<(), UpdateError> {
        if self.locked && !lock_override {
            return Ok(());
        }
        if bytes.len() != SERIALIZED_LEN {
            return Err(UpdateError::BadLength(bytes.len()));
        }

        self.apply(bytes);

        // A fresh frame invalidates our guesses of the ghost plans
        for ghost in &mut self.ghosts {
            ghost.planned_direction = Direction::None;
        }

        Ok(())
    }

    /// Overwrite every serialized field from a length-checked frame
    fn apply(&mut self, bytes: &[u8]) {
        self.curr_ticks = BigEndian::read_u16(&bytes[0..2]);
        self.update_period = bytes[2];
        self.game_mode = GameMode::from_byte(bytes[3]);
        self.mode_steps = bytes[4];
        self.mode_duration = bytes[5];
        self.curr_score = BigEndian::read_u16(&bytes[6..8]);
        self.curr_level = bytes[8];
        self.curr_lives = bytes[9];

        let mut offset = 10;
        for ghost in &mut self.ghosts {
            ghost.loc.update(BigEndian::read_u16(&bytes[offset..offset + 2]));
            ghost.update_aux(bytes[offset + 2]);
            offset += 3;
        }

        self.pacman_loc.update(BigEndian::read_u16(&bytes[22..24]));
        self.fruit_loc.update(BigEndian::read_u16(&bytes[24..26]));
        self.fruit_steps = bytes[26];
        self.fruit_duration = bytes[27];

        let mut offset = 28;
        for row in &mut self.pellet_arr {
            *row = BigEndian::read_u32(&bytes[offset..offset + 4]);
            offset += 4;
        }
    }

    /********************************* Snapshots *********************************/

    /// The ghosts' planned directions, in color order
    pub fn ghost_plans(&self) -> [Direction; NUM_COLORS] {
        array_init(|color| self.ghosts[color].planned_direction)
    }

    /// Copy a set of planned directions back onto the ghosts
    pub fn update_ghost_plans(&mut self, plans: &[Direction; NUM_COLORS]) {
        for (ghost, plan) in self.ghosts.iter_mut().zip(plans) {
            ghost.planned_direction = *plan;
        }
    }

    /// Compress this state for cheap storage during path planning
    pub fn compress(&self) -> GameStateCompressed {
        GameStateCompressed {
            serialized: self.serialize(),
            ghost_plans: self.ghost_plans(),
        }
    }

    /// Restore this state from a compressed copy, lock or no lock
    pub fn restore(&mut self, snapshot: &GameStateCompressed) {
        self.apply(&snapshot.serialized);
        self.update_ghost_plans(&snapshot.ghost_plans);
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

/// Compressed copy of the game state: the serialized bytes plus the four
/// ghost plans the serialization does not carry. The unit of memory for
/// search frontier nodes.
#[derive(Copy, Clone, Debug)]
pub struct GameStateCompressed {
    pub serialized: [u8; SERIALIZED_LEN],
    pub ghost_plans: [Direction; NUM_COLORS],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_len_matches_the_wire_layout() {
        assert_eq!(SERIALIZED_LEN, 152);
    }

    #[test]
    fn default_state_round_trips() {
        let state = GameState::new();
        let bytes = state.serialize();
        assert_eq!(bytes.len(), SERIALIZED_LEN);

        let mut back = GameState::new();
        back.curr_score = 9999;
        back.pellet_arr = [0; MAZE_ROWS];
        back.update(&bytes, false).unwrap();
        assert_eq!(back.serialize(), bytes);
    }

    #[test]
    fn default_state_is_paused_with_three_lives() {
        let state = GameState::new();
        assert_eq!(state.game_mode, GameMode::Paused);
        assert_eq!(state.curr_lives, 3);
        assert_eq!(state.pacman_loc, LocationState::empty());
        assert_eq!(state.num_pellets(), INIT_PELLET_COUNT);
    }

    #[test]
    fn populated_state_round_trips() {
        let mut state = GameState::new();
        state.curr_ticks = 4660;
        state.update_period = 6;
        state.game_mode = GameMode::Chase;
        state.mode_steps = 17;
        state.mode_duration = 180;
        state.curr_score = 1234;
        state.curr_level = 2;
        state.curr_lives = 1;
        state.pacman_loc = LocationState::new(23, 13, Direction::Left);
        state.fruit_loc = LocationState::new(17, 13, Direction::None);
        state.fruit_steps = 12;
        state.ghosts[0].loc = LocationState::new(14, 13, Direction::Right);
        state.ghosts[0].fright_steps = 7;
        state.ghosts[0].spawning = false;
        state.ghosts[3].update_aux(0x85);
        state.pellet_arr[5] = 0x00aa_aa00;

        let bytes = state.serialize();
        let mut back = GameState::new();
        back.update(&bytes, false).unwrap();
        assert_eq!(back.serialize(), bytes);
        assert_eq!(back.curr_ticks, 4660);
        assert_eq!(back.game_mode, GameMode::Chase);
        assert_eq!(back.ghosts[0].fright_steps, 7);
        assert!(!back.ghosts[0].spawning);
        assert!(back.ghosts[3].spawning);
        assert_eq!(back.ghosts[3].fright_steps, 5);
    }

    #[test]
    fn short_frames_are_rejected() {
        let mut state = GameState::new();
        let err = state.update(&[0u8; 10], false).unwrap_err();
        assert_eq!(err, UpdateError::BadLength(10));
        // Prior state is kept
        assert_eq!(state.num_pellets(), INIT_PELLET_COUNT);
    }

    #[test]
    fn locked_states_drop_updates() {
        let mut state = GameState::new();
        let mut frame = state.serialize();
        frame[6] = 0x01; // score = 256

        state.lock();
        state.update(&frame, false).unwrap();
        assert_eq!(state.curr_score, 0);

        // An override (snapshot restore) still applies
        state.update(&frame, true).unwrap();
        assert_eq!(state.curr_score, 256);

        state.unlock();
        state.update(&frame, false).unwrap();
        assert_eq!(state.curr_score, 256);
    }

    #[test]
    fn updates_reset_ghost_plans() {
        let mut state = GameState::new();
        state.ghosts[1].planned_direction = Direction::Left;
        let frame = state.serialize();
        state.update(&frame, false).unwrap();
        assert_eq!(state.ghosts[1].planned_direction, Direction::None);
    }

    #[test]
    fn snapshots_restore_ghost_plans() {
        let mut state = GameState::new();
        state.ghosts[0].planned_direction = Direction::Down;
        state.ghosts[2].planned_direction = Direction::Left;
        state.curr_score = 777;

        let snapshot = state.compress();

        state.ghosts[0].planned_direction = Direction::None;
        state.curr_score = 0;
        state.restore(&snapshot);

        assert_eq!(state.curr_score, 777);
        assert_eq!(state.ghosts[0].planned_direction, Direction::Down);
        assert_eq!(state.ghosts[2].planned_direction, Direction::Left);
    }

    #[test]
    fn snapshots_restore_through_a_lock() {
        let mut state = GameState::new();
        state.curr_score = 42;
        let snapshot = state.compress();

        state.curr_score = 0;
        state.lock();
        state.restore(&snapshot);
        assert_eq!(state.curr_score, 42);
        state.unlock();
    }
}
