//! Decision core of an autonomous Pacman-playing agent: a bit-packed
//! mirror of the arbiter's game state with a deterministic forward
//! simulator, per-color ghost prediction, and an A-star planner that
//! emits coalesced move actions for the robot.
//!
//! Transports stay outside this crate: arbiter frames and localization
//! fixes come in over channels, and planned actions leave through the
//! bounded outbound queue drained by the dispatcher.

mod game_engine;
mod game_helpers;
mod ghost_helpers;

pub mod actions;
pub mod astar_policy;
pub mod config;
pub mod decision_module;
pub mod game_state;
pub mod ghost_state;
pub mod location;
pub mod pachattan;
pub mod variables;
