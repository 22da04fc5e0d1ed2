/// Undo/redo slots addressed by a single pointer.
///
/// The first `record` also stores `T::default()` as the initial empty state at
/// slot 0, unless the ledger was seeded with [`HistoryLedger::with_initial`].
/// Every later `record` appends and moves the pointer to the new slot, so
/// anything that was ahead of the pointer can no longer be reached with
/// [`HistoryLedger::forward`].
#[derive(Debug, Clone)]
pub struct HistoryLedger<T> {
    slots: Vec<T>,
    pointer: usize,
    limit: Option<usize>,
}

impl<T> Default for HistoryLedger<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            pointer: 0,
            limit: None,
        }
    }
}

impl<T: Clone + Default> HistoryLedger<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A ledger whose slot 0 is `initial` instead of the empty state.
    pub fn with_initial(initial: T) -> Self {
        Self {
            slots: vec![initial],
            ..Self::default()
        }
    }

    /// Keeps at most `limit` undo steps; the oldest slots are dropped first.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self.trim();
        self
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn record(&mut self, snapshot: T) {
        if self.slots.is_empty() {
            self.slots.push(T::default());
        }
        self.slots.push(snapshot);
        self.trim();
        self.pointer = self.slots.len() - 1;
    }

    fn trim(&mut self) {
        let Some(limit) = self.limit else {
            return;
        };
        let excess = self.slots.len().saturating_sub(limit + 1);
        if excess > 0 {
            self.slots.drain(..excess);
            self.pointer = self.pointer.saturating_sub(excess);
        }
    }

    /// Steps back one slot and returns it. At slot 0 the pointer stays put and
    /// the initial state is returned again.
    pub fn back(&mut self) -> Option<T> {
        if self.pointer > 0 {
            self.pointer -= 1;
        }
        self.slots.get(self.pointer).cloned()
    }

    pub fn forward(&mut self) -> Option<T> {
        if self.pointer + 1 < self.slots.len() {
            self.pointer += 1;
            return self.slots.get(self.pointer).cloned();
        }
        None
    }

    pub fn is_back_disabled(&self) -> bool {
        self.pointer < 1
    }

    pub fn is_forward_disabled(&self) -> bool {
        self.pointer + 1 >= self.slots.len()
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.pointer = 0;
    }
}
