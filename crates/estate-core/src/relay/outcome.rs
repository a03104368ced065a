//! Relay outcome

/// What happened to a relayed message. Informational only; never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelayOutcome {
    /// Participants other than the sender
    pub recipients: usize,
    /// Connections that accepted the event
    pub delivered: usize,
}

impl RelayOutcome {
    pub const fn new(recipients: usize, delivered: usize) -> Self {
        Self {
            recipients,
            delivered,
        }
    }

    /// Recipients that were offline or unreachable
    pub const fn offline(&self) -> usize {
        self.recipients.saturating_sub(self.delivered)
    }
}
