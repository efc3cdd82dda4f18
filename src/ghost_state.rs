use crate::location::{Direction, LocationState};
use crate::variables::{SCATTER_COL, SCATTER_ROW};

/// The ghost colors, in wire order
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GhostColor {
    Red = 0,
    Pink = 1,
    Cyan = 2,
    Orange = 3,
}

pub const NUM_COLORS: usize = 4;

/// All four colors, in wire order R, P, C, O
pub const GHOST_COLORS: [GhostColor; NUM_COLORS] = [
    GhostColor::Red,
    GhostColor::Pink,
    GhostColor::Cyan,
    GhostColor::Orange,
];

impl GhostColor {
    /// The fixed scatter corner for this color
    pub fn scatter_target(self) -> (i8, i8) {
        (SCATTER_ROW[self as usize], SCATTER_COL[self as usize])
    }
}

/// Location and auxiliary info of one ghost, as mirrored from the arbiter.
///
/// The auxiliary byte packs the spawning flag into the high bit and the
/// frightened steps into the low six bits.
#[derive(Copy, Clone, Debug)]
pub struct GhostState {
    pub color: GhostColor,
    pub loc: LocationState,
    pub fright_steps: u8,
    pub spawning: bool,

    /// Guessed next direction, maintained for simulation only
    pub planned_direction: Direction,
}

impl GhostState {
    /// Create a new ghost state for a given color
    pub fn new(color: GhostColor) -> Self {
        Self {
            color,
            loc: LocationState::empty(),
            fright_steps: 0,
            spawning: true,
            planned_direction: Direction::None,
        }
    }

    /// Update auxiliary info (fright steps and spawning flag, 1 byte)
    pub fn update_aux(&mut self, aux: u8) {
        self.fright_steps = aux & 0x3f;
        self.spawning = (aux >> 7) == 1;
    }

    /// Serialize auxiliary info (fright steps and spawning flag, 1 byte)
    pub fn serialize_aux(&self) -> u8 {
        ((self.spawning as u8) << 7) | (self.fright_steps & 0x3f)
    }

    /// Check if this ghost is frightened
    pub fn is_frightened(&self) -> bool {
        self.fright_steps > 0
    }

    /// Advance this ghost one step for simulation purposes: move along the
    /// current heading, adopt the planned direction, and burn a frightened
    /// step if applicable.
    ///
    /// Spawning ghosts hold still; the arbiter gives us no view into the
    /// ghost house, and freezing them is a fair model over short lookaheads.
    pub fn step(&mut self) {
        if self.spawning {
            return;
        }

        self.loc.advance();
        self.loc.set_direction(self.planned_direction);

        if self.is_frightened() {
            self.fright_steps -= 1;
        }
    }

    /// Mark this ghost as eaten during a simulated collision: it leaves the
    /// board and re-enters through the spawn pipeline.
    pub fn respawn(&mut self) {
        self.loc = LocationState::empty();
        self.spawning = true;
    }
}
