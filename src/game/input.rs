//! Per-player buffer of inputs waiting for the next tick

use std::collections::BTreeMap;

use crate::ws::protocol::InputCommand;

/// Bounded, sequence-ordered, duplicate-free input buffer.
///
/// Inputs are keyed by sequence number so transport reordering is undone on
/// insert. When full, the lowest sequence is evicted.
#[derive(Debug, Clone)]
pub struct InputChannel {
    pending: BTreeMap<u32, InputCommand>,
    capacity: usize,
}

impl InputChannel {
    pub fn new(capacity: usize) -> Self {
        Self {
            pending: BTreeMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Buffer an input. Returns false for a sequence already buffered, or
    /// one older than everything in a full buffer.
    pub fn push(&mut self, input: InputCommand) -> bool {
        let seq = input.seq;
        if self.pending.contains_key(&seq) {
            return false;
        }
        self.pending.insert(seq, input);
        while self.pending.len() > self.capacity {
            self.pending.pop_first();
        }
        self.pending.contains_key(&seq)
    }

    /// Take every buffered input newer than `last_processed`, ascending.
    /// The buffer is empty afterwards.
    pub fn drain_after(&mut self, last_processed: u32) -> Vec<InputCommand> {
        std::mem::take(&mut self.pending)
            .into_values()
            .filter(|input| input.seq > last_processed)
            .collect()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
