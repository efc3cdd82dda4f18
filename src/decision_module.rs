//! The cooperative task trio around the planner: inbound receiver,
//! decision loop, and outbound dispatcher.
//!
//! Everything here targets a current-thread runtime; the three loops share
//! the game state through `Rc<RefCell<..>>` and interleave only at their
//! explicit await points, so planner rollouts are never torn mid-flight.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::actions::ActionMessage;
use crate::astar_policy::AStarPolicy;
use crate::config::Config;
use crate::game_state::{GameMode, GameState};
use crate::ghost_state::GhostColor;

/// Game state shared between the cooperative loops
pub type SharedState = Rc<RefCell<GameState>>;

/// How far ahead one planned step is assumed to land, in engine ticks
const PREDICTED_DELAY: u16 = 4;

/// Breather between decisions, releasing the cooperative scheduler
const DECISION_INTERVAL: Duration = Duration::from_millis(5);

/// Drives the planner against the live state, carrying the chosen victim
/// and pellet target from one decision to the next.
pub struct DecisionModule {
    state: SharedState,
    policy: AStarPolicy,
    victim: Option<GhostColor>,
    pellet_target: Option<(i8, i8)>,
}

impl DecisionModule {
    pub fn new(state: SharedState) -> Self {
        Self {
            state,
            policy: AStarPolicy::default(),
            victim: None,
            // Start by herding toward the lower-left pellet cluster
            pellet_target: Some((23, 6)),
        }
    }

    /// Decision loop: plan and enqueue actions while the arbiter is live
    pub async fn decision_loop(&mut self) {
        while self.state.borrow().is_connected() {
            // While paused or mid-update, there is nothing to decide
            {
                let state = self.state.borrow();
                if state.is_locked() || state.game_mode == GameMode::Paused {
                    drop(state);
                    tokio::task::yield_now().await;
                    continue;
                }
            }

            {
                let mut state = self.state.borrow_mut();
                state.lock();
                let (victim, target) =
                    self.policy
                        .act(&mut state, PREDICTED_DELAY, self.victim, self.pellet_target);
                self.victim = victim;
                self.pellet_target = Some(target);
                state.unlock();
            }

            // No action produced: try again on the next pass
            if self.state.borrow().action_queue.is_empty() {
                log::debug!("planner produced no action; retrying");
                tokio::task::yield_now().await;
                continue;
            }

            tokio::time::sleep(DECISION_INTERVAL).await;
        }

        log::info!("arbiter disconnected; decision loop exiting");
    }
}

/// Inbound receiver: applies arbiter frames and localization fixes to the
/// shared state. Frames that arrive while the planner holds the lock are
/// dropped; every frame is a full snapshot, so the next one catches us up.
pub async fn receive_loop(
    state: SharedState,
    mut frames: mpsc::Receiver<Vec<u8>>,
    mut fixes: mpsc::Receiver<(i8, i8)>,
) {
    loop {
        tokio::select! {
            frame = frames.recv() => {
                let Some(bytes) = frame else {
                    log::info!("arbiter feed closed");
                    state.borrow_mut().set_connection_status(false);
                    break;
                };

                let mut game = state.borrow_mut();
                if game.is_locked() {
                    log::debug!("dropping arbiter frame while planning");
                } else if let Err(err) = game.update(&bytes, false) {
                    log::warn!("dropping arbiter frame: {err}");
                }
            }
            Some((row, col)) = fixes.recv() => {
                state.borrow_mut().correct_pacman_loc(row, col);
            }
        }

        tokio::task::yield_now().await;
    }
}

/// Outbound dispatcher: paces queued actions by their wait ticks and
/// forwards ready ones to the transport. A queued follow-up cancels the
/// delay of the message behind it.
pub async fn dispatch_loop(state: SharedState, sink: mpsc::Sender<ActionMessage>, tick: Duration) {
    while state.borrow().is_connected() {
        let ready = {
            let mut game = state.borrow_mut();
            let head_ready = game
                .action_queue
                .front_mut()
                .map_or(false, |head| head.tick());
            if head_ready {
                game.action_queue.pop()
            } else {
                None
            }
        };

        if let Some(message) = ready {
            if let Some(next) = state.borrow_mut().action_queue.front_mut() {
                next.skip_delay();
            }
            if sink.send(message).await.is_err() {
                log::info!("action sink closed; dispatcher exiting");
                break;
            }
        }

        tokio::time::sleep(tick).await;
    }
}

/// The dispatcher turn length implied by the configured tick rate
pub fn dispatch_tick(config: &Config) -> Duration {
    Duration::from_millis(1000 / u64::from(config.game_fps.max(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{Direction, LocationState};
    use crate::variables::{SUPER_PELLET_COLS, SUPER_PELLET_ROWS};

    fn shared_state() -> SharedState {
        let mut state = GameState::new();
        state.set_connection_status(true);
        Rc::new(RefCell::new(state))
    }

    #[tokio::test]
    async fn decision_loop_exits_when_disconnected() {
        let state = shared_state();
        state.borrow_mut().set_connection_status(false);
        DecisionModule::new(state).decision_loop().await;
    }

    #[tokio::test]
    async fn decision_loop_queues_actions_for_a_live_game() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let state = shared_state();
                {
                    let mut game = state.borrow_mut();
                    game.game_mode = GameMode::Chase;
                    game.mode_steps = 100;
                    game.pacman_loc = LocationState::new(5, 6, Direction::Right);
                    for &row in &SUPER_PELLET_ROWS {
                        for &col in &SUPER_PELLET_COLS {
                            game.pellet_arr[row as usize] &= !(1 << col);
                        }
                    }
                }

                let mut module = DecisionModule::new(state.clone());
                let task = tokio::task::spawn_local(async move { module.decision_loop().await });

                while state.borrow().action_queue.is_empty() {
                    tokio::task::yield_now().await;
                }

                state.borrow_mut().set_connection_status(false);
                task.await.unwrap();
                assert!(!state.borrow().action_queue.is_empty());
                assert!(!state.borrow().is_locked());
            })
            .await;
    }

    #[tokio::test]
    async fn receiver_applies_frames_and_fixes() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let state = shared_state();
                let (frame_tx, frame_rx) = mpsc::channel(4);
                let (fix_tx, fix_rx) = mpsc::channel(4);
                let task =
                    tokio::task::spawn_local(receive_loop(state.clone(), frame_rx, fix_rx));

                // A valid frame lands, a malformed one is dropped without damage
                let mut frame = state.borrow().serialize();
                frame[6] = 0x01; // score = 256
                frame_tx.send(frame.to_vec()).await.unwrap();
                frame_tx.send(vec![1, 2, 3]).await.unwrap();
                while state.borrow().curr_score != 256 {
                    tokio::task::yield_now().await;
                }

                // A localization fix moves Pacman
                fix_tx.send((23, 13)).await.unwrap();
                while state.borrow().pacman_loc.row != 23 {
                    tokio::task::yield_now().await;
                }

                drop(frame_tx);
                task.await.unwrap();

                let game = state.borrow();
                assert_eq!(game.curr_score, 256);
                assert_eq!((game.pacman_loc.row, game.pacman_loc.col), (23, 13));
                assert!(!game.is_connected());
            })
            .await;
    }

    #[tokio::test]
    async fn locked_state_drops_inbound_frames() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let state = shared_state();
                state.borrow_mut().lock();
                let (frame_tx, frame_rx) = mpsc::channel(4);
                let (_fix_tx, fix_rx) = mpsc::channel::<(i8, i8)>(4);
                let task =
                    tokio::task::spawn_local(receive_loop(state.clone(), frame_rx, fix_rx));

                let mut frame = state.borrow().serialize();
                frame[6] = 0x01;
                frame_tx.send(frame.to_vec()).await.unwrap();
                drop(frame_tx);
                task.await.unwrap();

                assert_eq!(state.borrow().curr_score, 0);
            })
            .await;
    }

    #[tokio::test]
    async fn dispatcher_paces_and_forwards_in_order() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let state = shared_state();
                state
                    .borrow_mut()
                    .queue_action(ActionMessage::new(Direction::Right, 1, 1, 2, 2));
                state
                    .borrow_mut()
                    .queue_action(ActionMessage::new(Direction::Down, 1, 2, 2, 200));

                let (sink_tx, mut sink_rx) = mpsc::channel(4);
                let task = tokio::task::spawn_local(dispatch_loop(
                    state.clone(),
                    sink_tx,
                    Duration::from_millis(1),
                ));

                let first = sink_rx.recv().await.unwrap();
                assert_eq!(first.direction, Direction::Right);

                // The follow-up's long delay was cancelled on send
                let second = sink_rx.recv().await.unwrap();
                assert_eq!(second.direction, Direction::Down);

                state.borrow_mut().set_connection_status(false);
                task.await.unwrap();
            })
            .await;
    }

    #[test]
    fn dispatch_tick_follows_the_configured_fps() {
        let mut config = Config::default();
        config.game_fps = 40;
        assert_eq!(dispatch_tick(&config), Duration::from_millis(25));
    }
}
