//! Delayed actions owned by a single game instance.
//!
//! Games that sequence feedback over time (reveal-then-hide cards, mole
//! pop-ups, the tic-tac-toe reply) push typed actions into a `Schedule`
//! instead of capturing state in timer callbacks. The schedule is advanced
//! by the game's own `update`, so nothing can fire once the game is dropped,
//! and `cancel_all` invalidates the generation token so any action that was
//! queued before a restart or teardown is discarded rather than applied to
//! the new session.

use std::time::Duration;

use log::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerId(u64);

#[derive(Clone, Debug)]
struct Pending<A> {
    id: TimerId,
    due: Duration,
    generation: u64,
    action: A,
}

#[derive(Clone, Debug)]
pub struct Schedule<A> {
    /// Time up to which actions have been delivered.
    now: Duration,
    /// Time the owner has advanced the schedule to.
    horizon: Duration,
    generation: u64,
    next_id: u64,
    pending: Vec<Pending<A>>,
}

impl<A> Default for Schedule<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Schedule<A> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            horizon: Duration::ZERO,
            generation: 0,
            next_id: 0,
            pending: Vec::new(),
        }
    }

    /// Queues `action` to fire `delay` after the current schedule time.
    ///
    /// While actions are being drained with [`Schedule::pop_due`], the
    /// current time is the due time of the action being handled, so
    /// follow-ups chain precisely regardless of frame size.
    pub fn after(&mut self, delay: Duration, action: A) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            id,
            due: self.now + delay,
            generation: self.generation,
            action,
        });
        id
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        before != self.pending.len()
    }

    /// Invalidates every queued action.
    pub fn cancel_all(&mut self) {
        if !self.pending.is_empty() {
            debug!("cancelling {} scheduled action(s)", self.pending.len());
        }
        self.generation += 1;
        self.pending.clear();
    }

    /// Moves the horizon forward; call [`Schedule::pop_due`] afterwards.
    pub fn advance(&mut self, dt: Duration) {
        self.horizon += dt;
    }

    /// Returns the earliest action due at or before the horizon.
    pub fn pop_due(&mut self) -> Option<A> {
        let generation = self.generation;
        self.pending.retain(|p| p.generation == generation);
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= self.horizon)
            .min_by_key(|(_, p)| (p.due, p.id.0))
            .map(|(i, _)| i);
        match idx {
            Some(i) => {
                let p = self.pending.swap_remove(i);
                self.now = p.due;
                Some(p.action)
            }
            None => {
                self.now = self.horizon;
                None
            }
        }
    }

    #[cfg(test)]
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending
            .iter()
            .any(|p| p.id == id && p.generation == self.generation)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Schedule time, i.e. the instant of the last delivered action or horizon.
    #[cfg(test)]
    pub fn now(&self) -> Duration {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(s: &mut Schedule<&'static str>) -> Vec<&'static str> {
        std::iter::from_fn(|| s.pop_due()).collect()
    }

    #[test]
    fn fires_in_due_order() {
        let mut s = Schedule::new();
        s.after(Duration::from_millis(300), "late");
        s.after(Duration::from_millis(100), "early");
        s.advance(Duration::from_millis(200));
        assert_eq!(drain(&mut s), vec!["early"]);
        s.advance(Duration::from_millis(100));
        assert_eq!(drain(&mut s), vec!["late"]);
        assert!(s.is_empty());
    }

    #[test]
    fn cancelled_actions_never_fire() {
        let mut s = Schedule::new();
        let a = s.after(Duration::from_millis(10), "a");
        s.after(Duration::from_millis(10), "b");
        assert!(s.cancel(a));
        assert!(!s.is_pending(a));
        s.advance(Duration::from_millis(10));
        assert_eq!(drain(&mut s), vec!["b"]);
    }

    #[test]
    fn cancel_all_mid_drain_stops_delivery() {
        let mut s = Schedule::new();
        s.after(Duration::from_millis(1), "first");
        s.after(Duration::from_millis(2), "second");
        s.advance(Duration::from_millis(5));
        assert_eq!(s.pop_due(), Some("first"));
        s.cancel_all();
        assert_eq!(s.pop_due(), None);
    }

    #[test]
    fn follow_ups_chain_from_due_time() {
        let mut s: Schedule<u32> = Schedule::new();
        s.after(Duration::from_millis(1000), 1);
        s.advance(Duration::from_millis(3500));
        let mut fired = Vec::new();
        while let Some(n) = s.pop_due() {
            fired.push((n, s.now()));
            if n < 10 {
                s.after(Duration::from_millis(1000), n + 1);
            }
        }
        assert_eq!(
            fired,
            vec![
                (1, Duration::from_millis(1000)),
                (2, Duration::from_millis(2000)),
                (3, Duration::from_millis(3000)),
            ]
        );
        assert_eq!(s.now(), Duration::from_millis(3500));
    }
}
