//! Round-robin turn bookkeeping
//!
//! The turn is stored as a client ID rather than a position, and every
//! operation takes the current active order as a slice. The active list can
//! change between calls without leaving a stale reference behind, as long as
//! `on_remove` runs before a client is unlinked.

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TurnOrder {
    current: Option<u32>,
}

impl TurnOrder {
    pub fn new() -> Self {
        Self { current: None }
    }

    pub fn current(&self) -> Option<u32> {
        self.current
    }

    pub fn is_turn_of(&self, client_id: u32) -> bool {
        self.current == Some(client_id)
    }

    /// Hands the turn to the head of `order` if nobody holds it yet
    pub fn begin(&mut self, order: &[u32]) {
        if self.current.is_none() {
            self.current = order.first().copied();
        }
    }

    /// Gives the turn to the head of `order` unconditionally
    pub fn restart(&mut self, order: &[u32]) {
        self.current = order.first().copied();
    }

    /// Passes the turn to the next client in `order`, wrapping at the tail
    pub fn advance(&mut self, order: &[u32]) {
        let next = match self.position_in(order) {
            Some(pos) if pos + 1 < order.len() => Some(order[pos + 1]),
            _ => order.first().copied(),
        };
        self.current = next;
    }

    /// Repairs the turn for a client about to leave `order`.
    ///
    /// Must be called while `removed` is still present in `order`. If the
    /// leaving client holds the turn, it moves to the successor, or to the
    /// head when the leaver was the tail. A lone leaver clears the turn.
    pub fn on_remove(&mut self, order: &[u32], removed: u32) {
        if self.current != Some(removed) {
            return;
        }

        let successor = match order.iter().position(|&id| id == removed) {
            Some(pos) if pos + 1 < order.len() => Some(order[pos + 1]),
            _ => order.first().copied(),
        };
        self.current = successor.filter(|&id| id != removed);
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    fn position_in(&self, order: &[u32]) -> Option<usize> {
        let current = self.current?;
        order.iter().position(|&id| id == current)
    }
}
