//! Single-writer mutation queue.
//!
//! Commands are applied strictly in submission order, each against the
//! snapshot confirmed by the previous one.

use std::collections::VecDeque;

use super::command::Command;

#[derive(Debug, Default)]
pub struct MutationQueue {
    pending: VecDeque<Command>,
}

impl MutationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command; returns its id.
    pub fn enqueue(&mut self, command: Command) -> String {
        let id = command.id.clone();
        self.pending.push_back(command);
        id
    }

    /// Next command to apply.
    pub fn next(&mut self) -> Option<Command> {
        self.pending.pop_front()
    }

    /// Get number of pending commands.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check if queue is empty.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
