//! Fetch slots: one lifecycle per kind of request, guarded by a generation
//! counter so a late response never overwrites a newer one.

use std::mem;

use shared::error::ApiError;

/// Tag handed out when a request starts; only the latest one may complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchState<T> {
    Idle,
    Loading,
    Ready(T),
    Failed(ApiError),
}

impl<T> FetchState<T> {
    pub fn is_idle(&self) -> bool {
        matches!(self, FetchState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            FetchState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            FetchState::Failed(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// A newer request was started after this one; the result was dropped.
    Stale,
}

#[derive(Debug, Clone)]
pub struct FetchSlot<T> {
    state: FetchState<T>,
    retained: Option<T>,
    generation: u64,
}

impl<T> Default for FetchSlot<T> {
    fn default() -> Self {
        Self {
            state: FetchState::Idle,
            retained: None,
            generation: 0,
        }
    }
}

impl<T> FetchSlot<T> {
    pub fn state(&self) -> &FetchState<T> {
        &self.state
    }

    /// Current value, or the last good one while reloading or after a failure.
    pub fn last_good(&self) -> Option<&T> {
        self.state.ready().or(self.retained.as_ref())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts a request, keeping the current value as last good.
    pub fn begin(&mut self) -> Ticket {
        if let FetchState::Ready(value) = mem::replace(&mut self.state, FetchState::Loading) {
            self.retained = Some(value);
        }
        self.next_ticket()
    }

    /// Starts a request for a different subject; nothing is retained.
    pub fn begin_fresh(&mut self) -> Ticket {
        self.state = FetchState::Loading;
        self.retained = None;
        self.next_ticket()
    }

    pub fn complete(&mut self, ticket: Ticket, result: Result<T, ApiError>) -> Completion {
        if ticket.0 != self.generation {
            return Completion::Stale;
        }
        match result {
            Ok(value) => {
                self.state = FetchState::Ready(value);
                self.retained = None;
            }
            Err(err) => self.state = FetchState::Failed(err),
        }
        Completion::Applied
    }

    fn next_ticket(&mut self) -> Ticket {
        self.generation += 1;
        Ticket(self.generation)
    }
}
