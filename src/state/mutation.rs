use crate::dto::sse::RoomUpdate;

/// What happens to the room record once a mutation succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// Stamp and write the record, refreshing its expiry.
    Save,
    /// Remove the record and disconnect its subscribers.
    Delete,
    /// Nothing changed; the store is left alone.
    Unchanged,
}

/// Outcome of a room mutation: the caller's value, the updates to fan out and the commit mode.
#[derive(Debug)]
pub struct Mutation<T> {
    /// Value handed back to the caller.
    pub value: T,
    /// Updates to publish, in order.
    pub updates: Vec<RoomUpdate>,
    /// How the record is persisted.
    pub commit: Commit,
}

impl<T> Mutation<T> {
    /// Persist the mutated record.
    pub fn save(value: T) -> Self {
        Self::new(value, Commit::Save)
    }

    /// Delete the record and close its streams.
    pub fn delete(value: T) -> Self {
        Self::new(value, Commit::Delete)
    }

    /// Leave the record as stored.
    pub fn unchanged(value: T) -> Self {
        Self::new(value, Commit::Unchanged)
    }

    fn new(value: T, commit: Commit) -> Self {
        Self {
            value,
            updates: Vec::new(),
            commit,
        }
    }

    /// Queue an update, published in push order after the commit.
    pub fn with(mut self, update: RoomUpdate) -> Self {
        self.updates.push(update);
        self
    }

    /// Queue an update only when `condition` holds.
    pub fn with_if(self, condition: bool, update: impl FnOnce() -> RoomUpdate) -> Self {
        if condition { self.with(update()) } else { self }
    }
}
