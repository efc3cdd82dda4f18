use std::collections::VecDeque;

use crate::location::Direction;
use crate::variables::ACTION_QUEUE_CAPACITY;

/// One outbound move decision: travel `distance` cells in `direction`,
/// ending at the target cell, after `wait_ticks` dispatcher turns.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ActionMessage {
    pub direction: Direction,
    pub distance: u8,
    pub target_row: i8,
    pub target_col: i8,
    pub wait_ticks: u8,
}

impl ActionMessage {
    pub fn new(direction: Direction, distance: u8, target_row: i8, target_col: i8, wait_ticks: u8) -> Self {
        Self {
            direction,
            distance,
            target_row,
            target_col,
            wait_ticks,
        }
    }

    /// Each dispatcher turn, burn one waiting tick; the message is ready
    /// to send once no ticks remain.
    pub fn tick(&mut self) -> bool {
        self.wait_ticks = self.wait_ticks.saturating_sub(1);
        self.wait_ticks == 0
    }

    /// Cancel the remaining delay (a newer decision supersedes the pacing)
    pub fn skip_delay(&mut self) {
        self.wait_ticks = 0;
    }

    /// The ASCII direction byte sent over the wire
    pub fn direction_byte(&self) -> u8 {
        self.direction.to_ascii()
    }
}

/// Bounded single-producer single-consumer FIFO of outbound actions.
/// On overflow the oldest entry is dropped; a stale decision is worth
/// less than a fresh one.
#[derive(Debug, Default)]
pub struct ActionQueue {
    messages: VecDeque<ActionMessage>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self {
            messages: VecDeque::with_capacity(ACTION_QUEUE_CAPACITY),
        }
    }

    /// Append a message, evicting the oldest when full
    pub fn push(&mut self, message: ActionMessage) {
        if self.messages.len() == ACTION_QUEUE_CAPACITY {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    /// Remove and return the oldest message
    pub fn pop(&mut self) -> Option<ActionMessage> {
        self.messages.pop_front()
    }

    /// Peek the oldest message mutably, for wait-tick pacing
    pub fn front_mut(&mut self) -> Option<&mut ActionMessage> {
        self.messages.front_mut()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(wait_ticks: u8) -> ActionMessage {
        ActionMessage::new(Direction::Right, 1, 1, 2, wait_ticks)
    }

    #[test]
    fn queue_never_exceeds_capacity() {
        let mut queue = ActionQueue::new();
        for i in 0..10 {
            queue.push(probe(i));
            assert!(queue.len() <= ACTION_QUEUE_CAPACITY);
        }
    }

    #[test]
    fn overflow_drops_the_oldest_entry() {
        let mut queue = ActionQueue::new();
        for i in 0..=ACTION_QUEUE_CAPACITY as u8 {
            queue.push(probe(i));
        }
        // Entry 0 was evicted; entry 1 is now the head
        assert_eq!(queue.pop().map(|m| m.wait_ticks), Some(1));
    }

    #[test]
    fn messages_leave_in_fifo_order() {
        let mut queue = ActionQueue::new();
        queue.push(probe(1));
        queue.push(probe(2));
        queue.push(probe(3));
        assert_eq!(queue.pop().map(|m| m.wait_ticks), Some(1));
        assert_eq!(queue.pop().map(|m| m.wait_ticks), Some(2));
        assert_eq!(queue.pop().map(|m| m.wait_ticks), Some(3));
        assert!(queue.pop().is_none());
    }

    #[test]
    fn tick_reports_readiness_at_zero() {
        let mut message = probe(2);
        assert!(!message.tick());
        assert!(message.tick());
        // Ready messages stay ready
        assert!(message.tick());
    }

    #[test]
    fn skip_delay_makes_a_message_ready() {
        let mut message = probe(200);
        message.skip_delay();
        assert_eq!(message.wait_ticks, 0);
    }

    #[test]
    fn direction_bytes_match_the_wire_encoding() {
        let codes: Vec<u8> = [
            Direction::Up,
            Direction::Left,
            Direction::Down,
            Direction::Right,
            Direction::None,
        ]
        .iter()
        .map(|dir| ActionMessage::new(*dir, 0, 0, 0, 0).direction_byte())
        .collect();
        assert_eq!(codes, b"wasd.");
    }
}
