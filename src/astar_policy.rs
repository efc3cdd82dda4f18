use std::collections::{BinaryHeap, VecDeque};

use crate::actions::ActionMessage;
use crate::game_state::{GameMode, GameState, GameStateCompressed};
use crate::ghost_state::GhostColor;
use crate::location::{Direction, LocationState, CARDINAL_DIRS};
use crate::pachattan::{DistMetric, UNREACHABLE};
use crate::variables::*;

/*
Cost conventions:

Started at point    S
Targetting point    T
Currently at point  C

gcost = cost from S to C (past, known)
hcost = cost from C to T (future, predicted)

fcost = (gcost + hcost) * ghost risk multiplier

Start-------Current-------Target
S--------------C---------------T
|-----gcost----|-----hcost-----|
|------------fcost-------------|
*/

/// Plans are emitted once they span this many steps
const MAX_BUF_LEN: usize = 14;

/// Shorter horizon while a frightened ghost is being chased; stale chases
/// are worse than short ones
const VICTIM_BUF_LEN: usize = 4;

/// Strong attractor returned by the heuristic on reaching the target
const TARGET_REACHED: i64 = -1_000_000;

/// Numerator of the ghost-proximity risk terms
const GHOST_RISK_K: i64 = 64;

/// Numerator of the spawning-ghost lair risk term
const LAIR_RISK_K: i64 = 16;

/// Extra g-cost charged when a step changes Pacman's heading
const TURN_PENALTY: i64 = 2;

/// Extra simulated ticks a physical turn costs the robot
const TURN_LAG: u16 = 4;

/// Extra g-cost charged when a step retreats from the chased victim
const EVADE_PENALTY: i64 = 10;

/// Victims within this distance of a dangerous ghost are not worth chasing
const SCARY_DIST: i64 = 2;

/// Backstop on frontier pops; past this the best plan so far is emitted
const MAX_POPS: usize = 4096;

/// One frontier entry: a compressed rollout state plus the path that
/// produced it and its costs.
#[derive(Clone)]
struct AStarNode {
    compressed: GameStateCompressed,
    f_cost: i64,
    g_cost: i64,
    direction_buf: Vec<Direction>,
    delay_buf: Vec<u16>,
    buf_length: usize,
    victim: Option<GhostColor>,
    victim_caught: bool,
    target_caught: bool,
}

impl PartialEq for AStarNode {
    fn eq(&self, other: &Self) -> bool {
        self.f_cost == other.f_cost
    }
}

impl Eq for AStarNode {}

impl PartialOrd for AStarNode {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AStarNode {
    /// Reversed on f-cost, turning the std max-heap into a min-heap
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other.f_cost.cmp(&self.f_cost)
    }
}

/// A-star policy over forward-simulated game states.
///
/// Each `act` call searches from the live state and enqueues the first leg
/// of the best plan found. The chosen victim and pellet target are handed
/// back to the caller, to be passed into the next call so preferences stay
/// stable between decisions.
pub struct AStarPolicy {
    metric: DistMetric,
}

impl Default for AStarPolicy {
    fn default() -> Self {
        Self::new(DistMetric::Pachattan)
    }
}

impl AStarPolicy {
    pub fn new(metric: DistMetric) -> Self {
        Self { metric }
    }

    fn dist(&self, a: LocationState, b: LocationState) -> i64 {
        self.metric.dist(a.row, a.col, b.row, b.col)
    }

    /****************************** Target Selection ******************************/

    /// Nearest cell holding a plain pellet, by BFS from Pacman. Super
    /// pellets are approached on the planner's terms, never as BFS goals.
    /// With nothing reachable, Pacman's own cell stands in so the planner
    /// still runs for safety.
    fn nearest_pellet(&self, state: &GameState) -> (i8, i8) {
        let start = (state.pacman_loc.row, state.pacman_loc.col);
        if wall_at(start.0, start.1) {
            return start;
        }

        let mut visited = [[false; MAZE_COLS]; MAZE_ROWS];
        let mut queue = VecDeque::new();
        visited[start.0 as usize][start.1 as usize] = true;
        queue.push_back(start);

        while let Some((row, col)) = queue.pop_front() {
            if state.pellet_at(row, col) && !state.super_pellet_at(row, col) {
                return (row, col);
            }

            for dir in CARDINAL_DIRS {
                let (d_row, d_col) = dir.deltas();
                let (next_row, next_col) = (row + d_row, col + d_col);
                if wall_at(next_row, next_col) || visited[next_row as usize][next_col as usize] {
                    continue;
                }
                visited[next_row as usize][next_col as usize] = true;
                queue.push_back((next_row, next_col));
            }
        }

        start
    }

    /// Choose the cell the plan should head for: the approach cell of a
    /// live super pellet during chase mode, a still-valid prior target,
    /// or the nearest plain pellet.
    fn select_target(&self, state: &GameState, prior: Option<(i8, i8)>) -> (i8, i8) {
        if state.game_mode == GameMode::Chase {
            for (corner, approach) in super_pellet_corners().zip(SUPER_PELLET_APPROACH) {
                if state.super_pellet_at(corner.0, corner.1) {
                    return approach;
                }
            }
        }

        if let Some((row, col)) = prior {
            if state.pellet_at(row, col) && !state.pacman_loc.at(row, col) {
                return (row, col);
            }
        }

        self.nearest_pellet(state)
    }

    /****************************** Victim Selection ******************************/

    /// Whether a would-be victim sits within arm's reach of a ghost that
    /// could kill us over it
    fn is_scary(&self, state: &GameState, victim: GhostColor) -> bool {
        let victim_loc = state.ghosts[victim as usize].loc;
        state.ghosts.iter().any(|ghost| {
            ghost.color != victim
                && !ghost.is_frightened()
                && !ghost.spawning
                && !wall_at(ghost.loc.row, ghost.loc.col)
                && self.dist(victim_loc, ghost.loc) <= SCARY_DIST
        })
    }

    /// The closest frightened, catchable ghost, if any
    fn select_victim(&self, state: &GameState) -> Option<GhostColor> {
        let mut best: Option<(i64, GhostColor)> = None;
        for ghost in &state.ghosts {
            if !ghost.is_frightened() || ghost.spawning {
                continue;
            }
            let dist = self.dist(state.pacman_loc, ghost.loc);
            if best.map_or(true, |(best_dist, _)| dist < best_dist) {
                best = Some((dist, ghost.color));
            }
        }

        let (_, color) = best?;
        if self.is_scary(state, color) {
            None
        } else {
            Some(color)
        }
    }

    /// Keep a prior victim while it stays catchable; otherwise pick fresh
    fn refresh_victim(&self, state: &GameState, prior: Option<GhostColor>) -> Option<GhostColor> {
        if let Some(color) = prior {
            let ghost = &state.ghosts[color as usize];
            if ghost.is_frightened() && !ghost.spawning && !self.is_scary(state, color) {
                return Some(color);
            }
        }
        self.select_victim(state)
    }

    /********************************** Costs **********************************/

    /// Future-cost estimate for the current (rolled-out) state: distance
    /// to whichever prize matters most, scaled by the cost a step has been
    /// averaging on this branch.
    fn h_cost_extend(
        &self,
        state: &GameState,
        target: (i8, i8),
        g_cost: i64,
        buf_length: usize,
        victim: Option<GhostColor>,
    ) -> i64 {
        let pacman = state.pacman_loc;
        if !in_bounds(pacman.row, pacman.col) {
            return UNREACHABLE;
        }

        let dist_target = self.metric.dist(pacman.row, pacman.col, target.0, target.1);
        if dist_target == 0 {
            return TARGET_REACHED;
        }

        let dist_scared = victim
            .map(|color| &state.ghosts[color as usize])
            .filter(|ghost| !ghost.spawning)
            .map(|ghost| self.dist(pacman, ghost.loc));

        let dist_fruit = (state.fruit_steps > 0).then(|| self.dist(pacman, state.fruit_loc));

        // A catchable victim outranks everything; otherwise chase the
        // pellet target, or the fruit when it is reasonably close
        let dist = match (dist_scared, dist_fruit) {
            (Some(scared), _) if scared < UNREACHABLE => scared,
            (_, Some(fruit)) if 2 * fruit <= dist_target => fruit,
            _ => dist_target,
        };

        let g_per_step = if buf_length < 4 {
            2
        } else {
            g_cost / buf_length as i64
        };
        g_per_step * dist
    }

    /// Risk multiplier penalizing plans that linger near dangerous ghosts,
    /// and near the lair while ghosts are respawning with nothing frightened
    fn f_cost_multiplier(&self, state: &GameState) -> i64 {
        let pacman = state.pacman_loc;
        let mut multiplier = 1;

        for ghost in &state.ghosts {
            if ghost.spawning || ghost.is_frightened() {
                continue;
            }
            let dist = self.dist(pacman, ghost.loc).clamp(0, 63);
            multiplier += GHOST_RISK_K >> dist;
        }

        let any_frightened = state
            .ghosts
            .iter()
            .any(|ghost| ghost.is_frightened() && !ghost.spawning);
        if !any_frightened {
            let lair_dist = self
                .metric
                .dist(pacman.row, pacman.col, GHOST_LAIR_ROW, GHOST_LAIR_COL)
                .clamp(0, 63);
            for ghost in &state.ghosts {
                if ghost.spawning {
                    multiplier += LAIR_RISK_K >> lair_dist;
                }
            }
        }

        multiplier
    }

    /********************************** Search **********************************/

    /// Plan from the current state and enqueue the first leg of the best
    /// plan found. Returns the (victim, pellet target) pair to pass back
    /// into the next call.
    pub fn act(
        &mut self,
        state: &mut GameState,
        predicted_delay: u16,
        prior_victim: Option<GhostColor>,
        prior_target: Option<(i8, i8)>,
    ) -> (Option<GhostColor>, (i8, i8)) {
        let home = state.compress();
        let result = self.plan(state, predicted_delay, prior_victim, prior_target);
        state.restore(&home);
        result
    }

    fn plan(
        &mut self,
        state: &mut GameState,
        predicted_delay: u16,
        prior_victim: Option<GhostColor>,
        prior_target: Option<(i8, i8)>,
    ) -> (Option<GhostColor>, (i8, i8)) {
        let home_pacman = state.pacman_loc;

        // Without a located Pacman there is nothing to plan from
        if !in_bounds(home_pacman.row, home_pacman.col) {
            let target = prior_target.unwrap_or((home_pacman.row, home_pacman.col));
            return (prior_victim, target);
        }

        let target = self.select_target(state, prior_target);
        let victim = self.refresh_victim(state, prior_victim);

        let mut frontier: BinaryHeap<AStarNode> = BinaryHeap::new();
        let initial = AStarNode {
            compressed: state.compress(),
            f_cost: self.h_cost_extend(state, target, 0, 0, victim) * self.f_cost_multiplier(state),
            g_cost: 0,
            direction_buf: Vec::new(),
            delay_buf: Vec::new(),
            buf_length: 0,
            victim,
            victim_caught: false,
            target_caught: false,
        };
        frontier.push(initial);

        // The fallback plan should the frontier run dry
        let mut best: Option<AStarNode> = None;
        let mut pops = 0;

        while let Some(node) = frontier.pop() {
            pops += 1;
            state.restore(&node.compressed);

            // A caught victim ends the search outright
            if node.victim_caught {
                log::debug!("emitting a victim-catching plan of {} steps", node.buf_length);
                self.emit(state, &node, home_pacman, predicted_delay);
                return (node.victim, target);
            }

            // Reaching the pellet target does too, with a fresh target
            // for the next decision
            if node.target_caught && node.victim.is_none() {
                self.emit(state, &node, home_pacman, predicted_delay);
                let next_target = self.select_target(state, None);
                return (node.victim, next_target);
            }

            // Deep enough plans are good enough plans
            let horizon = if node.victim.is_some() {
                VICTIM_BUF_LEN
            } else {
                MAX_BUF_LEN
            };
            if node.buf_length >= horizon || pops > MAX_POPS {
                self.emit(state, &node, home_pacman, predicted_delay);
                return (node.victim, target);
            }

            self.expand(state, &node, target, predicted_delay, &mut frontier, &mut best);
        }

        // Frontier exhausted: fall back on the best partial plan seen
        match best {
            Some(node) => {
                self.emit(state, &node, home_pacman, predicted_delay);
                (node.victim, target)
            }
            None => {
                log::debug!("frontier exhausted with no plan; emitting a wait");
                self.emit_wait(state, home_pacman, predicted_delay);
                (victim, target)
            }
        }
    }

    /// Push every surviving one-step extension of a node onto the frontier
    fn expand(
        &mut self,
        state: &mut GameState,
        node: &AStarNode,
        target: (i8, i8),
        predicted_delay: u16,
        frontier: &mut BinaryHeap<AStarNode>,
        best: &mut Option<AStarNode>,
    ) {
        // Waiting in place is only an option when nothing is being chased
        let mut directions: Vec<Direction> = CARDINAL_DIRS.to_vec();
        if node.victim.is_none() {
            directions.push(Direction::None);
        }

        for direction in directions {
            state.restore(&node.compressed);

            let curr_dir = state.pacman_loc.get_direction();
            let turned = direction != Direction::None && direction != curr_dir;
            let turn_lag = if turned { TURN_LAG } else { 0 };

            // Retreating from a chased victim costs extra
            let evading = match node.victim {
                Some(color) => {
                    let ghost_loc = state.ghosts[color as usize].loc;
                    let before = self.dist(state.pacman_loc, ghost_loc);
                    let (d_row, d_col) = direction.deltas();
                    let after = self.metric.dist(
                        state.pacman_loc.row + d_row,
                        state.pacman_loc.col + d_col,
                        ghost_loc.row,
                        ghost_loc.col,
                    );
                    after > before
                }
                None => false,
            };

            let pellets_before = state.num_pellets();
            let victim_spawning_before = node
                .victim
                .map(|color| state.ghosts[color as usize].spawning);

            if !state.simulate_action(predicted_delay + turn_lag, direction) {
                continue;
            }

            let ate_pellet = state.num_pellets() < pellets_before;
            let victim_caught = matches!(victim_spawning_before, Some(false))
                && node
                    .victim
                    .map_or(false, |color| state.ghosts[color as usize].spawning);
            let target_caught = state.pacman_loc.at(target.0, target.1);

            let next_victim = if victim_caught {
                node.victim
            } else {
                self.refresh_victim(state, node.victim)
            };

            let mut g_cost = node.g_cost + 2;
            if !ate_pellet && next_victim.is_none() {
                g_cost += 4;
            }
            if turned {
                g_cost += 2 * TURN_PENALTY;
            }
            if evading {
                g_cost += 5 * EVADE_PENALTY;
            }

            let buf_length = node.buf_length + 1;
            let h_cost = self.h_cost_extend(state, target, g_cost, buf_length, next_victim);
            let f_cost = (h_cost + g_cost) * self.f_cost_multiplier(state);

            let mut direction_buf = node.direction_buf.clone();
            direction_buf.push(direction);
            let mut delay_buf = node.delay_buf.clone();
            delay_buf.push(predicted_delay + turn_lag);

            let next = AStarNode {
                compressed: state.compress(),
                f_cost,
                g_cost,
                direction_buf,
                delay_buf,
                buf_length,
                victim: next_victim,
                victim_caught,
                target_caught,
            };

            let better_fallback = best.as_ref().map_or(true, |curr| {
                next.buf_length > curr.buf_length
                    || (next.buf_length == curr.buf_length && next.f_cost < curr.f_cost)
            });
            if better_fallback {
                *best = Some(next.clone());
            }

            frontier.push(next);
        }
    }

    /********************************** Emission **********************************/

    /// Queue the first leg of a plan: the leading run of identical
    /// directions collapses into one action whose target is found by
    /// walking Pacman forward through open cells.
    fn emit(
        &self,
        state: &mut GameState,
        node: &AStarNode,
        home_pacman: LocationState,
        predicted_delay: u16,
    ) {
        let Some(&first) = node.direction_buf.first() else {
            self.emit_wait(state, home_pacman, predicted_delay);
            return;
        };

        if first == Direction::None {
            self.emit_wait(state, home_pacman, predicted_delay);
            return;
        }

        let run = node
            .direction_buf
            .iter()
            .take_while(|dir| **dir == first)
            .count();

        let mut target = home_pacman;
        target.set_direction(first);
        let mut distance = 0u8;
        for _ in 0..run {
            if !target.advance() {
                break;
            }
            distance += 1;
        }

        let wait_ticks = node.delay_buf[0].min(u16::from(u8::MAX)) as u8;
        state.queue_action(ActionMessage::new(
            first,
            distance,
            target.row,
            target.col,
            wait_ticks,
        ));
    }

    /// Queue a stand-still action at Pacman's own cell
    fn emit_wait(&self, state: &mut GameState, home_pacman: LocationState, predicted_delay: u16) {
        let wait_ticks = predicted_delay.min(u16::from(u8::MAX)) as u8;
        state.queue_action(ActionMessage::new(
            Direction::None,
            0,
            home_pacman.row,
            home_pacman.col,
            wait_ticks,
        ));
    }
}

/// The four super-pellet corners, in approach-cell order
fn super_pellet_corners() -> impl Iterator<Item = (i8, i8)> {
    [(3, 1), (3, 26), (23, 1), (23, 26)].into_iter()
}
