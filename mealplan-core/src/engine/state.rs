/// Where the engine is in its save cycle.
///
/// ```text
///            mutate             timer fires
///   Idle ───────────► DirtyDebouncing ───────► Saving ──► Idle
///    │  ▲               │  ▲ mutate                ▲  │
///    │  └───────────────┘  └──┘                    │  ▼
///    └──── select/create/delete ──► Switching ◄────┘ (flush old file)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Nothing scheduled.
    Idle,
    /// An edit is waiting for the debounce timer.
    DirtyDebouncing,
    /// Moving to another plan file: flush the old one, then load the new.
    Switching,
    /// A write of the active plan is in progress.
    Saving,
}

impl SyncState {
    /// Whether `next` may follow `self`.
    pub fn can_enter(self, next: SyncState) -> bool {
        use SyncState::*;
        matches!(
            (self, next),
            (Idle, DirtyDebouncing)
                | (Idle, Switching)
                | (Idle, Saving)
                | (DirtyDebouncing, DirtyDebouncing)
                | (DirtyDebouncing, Saving)
                | (DirtyDebouncing, Switching)
                | (DirtyDebouncing, Idle)
                | (Switching, Saving)
                | (Switching, Idle)
                | (Saving, Idle)
                | (Saving, Switching)
        )
    }

    /// Edits are only accepted while no write or switch is in flight.
    pub fn accepts_edits(self) -> bool {
        matches!(self, SyncState::Idle | SyncState::DirtyDebouncing)
    }
}
