//! Per-action busy flags with request generations.
//!
//! Every backend call is issued with a [`Ticket`]. A response is applied only
//! if its ticket is still the latest one issued for that action; anything else
//! is stale and dropped.

/// Backend action types. Each has its own generation counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Health,
    Login,
    ParseReport,
    Predict,
    SavePatient,
    History,
    CreateAccount,
}

impl RequestKind {
    /// Short name used in busy notices and logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Health => "health check",
            Self::Login => "login",
            Self::ParseReport => "document parse",
            Self::Predict => "diagnosis",
            Self::SavePatient => "save",
            Self::History => "history fetch",
            Self::CreateAccount => "account creation",
        }
    }
}

/// Identifies one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub kind: RequestKind,
    pub generation: u64,
}

/// Busy flag plus generation counter for one action type.
#[derive(Debug, Clone)]
pub struct RequestFence {
    kind: RequestKind,
    latest: u64,
    in_flight: bool,
}

impl RequestFence {
    #[must_use]
    pub const fn new(kind: RequestKind) -> Self {
        Self {
            kind,
            latest: 0,
            in_flight: false,
        }
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// Issue a ticket, refusing if a request is already in flight.
    ///
    /// # Errors
    /// Returns the action label when busy.
    pub fn try_issue(&mut self) -> Result<Ticket, &'static str> {
        if self.in_flight {
            return Err(self.kind.label());
        }
        Ok(self.issue())
    }

    /// Issue a ticket unconditionally, superseding any in-flight request.
    pub fn issue(&mut self) -> Ticket {
        self.latest += 1;
        self.in_flight = true;
        Ticket {
            kind: self.kind,
            generation: self.latest,
        }
    }

    /// Accept a response. Returns `false` for stale tickets.
    ///
    /// A current ticket clears the busy flag.
    pub fn settle(&mut self, ticket: Ticket) -> bool {
        if ticket.kind != self.kind || ticket.generation != self.latest || !self.in_flight {
            tracing::debug!(
                kind = self.kind.label(),
                stale = ticket.generation,
                latest = self.latest,
                "Discarding stale response"
            );
            return false;
        }
        self.in_flight = false;
        true
    }

    /// Invalidate any in-flight request and clear the busy flag.
    pub fn cancel(&mut self) {
        if self.in_flight {
            tracing::debug!(kind = self.kind.label(), "Cancelling in-flight request");
        }
        self.latest += 1;
        self.in_flight = false;
    }
}
