//! Feed marker gate

/// Tracks the last accepted feed marker (microsecond timestamp)
#[derive(Debug, Clone, Default)]
pub struct UpdateSequencer {
    last_update_id: u64,
}

impl UpdateSequencer {
    /// Create a sequencer starting at marker 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `marker` if it is strictly newer than the stored one
    ///
    /// A rejected marker means the whole batch must be dropped.
    pub fn accept(&mut self, marker: u64) -> bool {
        if marker <= self.last_update_id {
            return false;
        }
        self.last_update_id = marker;
        true
    }

    /// Last accepted marker
    pub fn last_update_id(&self) -> u64 {
        self.last_update_id
    }
}
