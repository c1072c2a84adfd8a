//! FIFO serialization point for store commands.
//!
//! # Invariants
//! - Commands run one at a time, in the order they called `enter`.
//! - A turn is released when its guard drops, including during unwinding.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Tickets {
    next: u64,
    serving: u64,
}

/// Ticket queue: each caller draws a number and waits until it is served.
#[derive(Debug, Default)]
pub(crate) struct CommandQueue {
    tickets: Mutex<Tickets>,
    turn: Condvar,
}

/// Exclusive turn held by one running command.
#[must_use]
pub(crate) struct CommandTurn<'a> {
    queue: &'a CommandQueue,
}

impl CommandQueue {
    /// Blocks until every earlier caller has finished, then returns the turn.
    pub(crate) fn enter(&self) -> CommandTurn<'_> {
        let mut tickets = self.tickets();
        let ticket = tickets.next;
        tickets.next += 1;
        while tickets.serving != ticket {
            tickets = self
                .turn
                .wait(tickets)
                .unwrap_or_else(PoisonError::into_inner);
        }
        CommandTurn { queue: self }
    }

    /// Callers that drew a ticket and are still waiting.
    pub(crate) fn waiting(&self) -> u64 {
        let tickets = self.tickets();
        (tickets.next - tickets.serving).saturating_sub(1)
    }

    fn tickets(&self) -> MutexGuard<'_, Tickets> {
        self.tickets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for CommandTurn<'_> {
    fn drop(&mut self) {
        self.queue.tickets().serving += 1;
        self.queue.turn.notify_all();
    }
}
