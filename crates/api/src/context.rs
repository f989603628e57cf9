use upkeep_core::UserId;

/// Actor context for a request.
///
/// Every mutating ledger operation is stamped with an explicit identity
/// passed as a parameter, never read from ambient state; this is where that
/// identity enters the process.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ActorContext {
    actor: UserId,
}

impl ActorContext {
    pub fn new(actor: UserId) -> Self {
        Self { actor }
    }

    pub fn actor(&self) -> UserId {
        self.actor
    }
}
