//! Admin-issued bonus tasks that mint credits on completion
use chrono::Utc;

use crate::types::{EventId, PartyId, TimeStamp};

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub enum EventTarget {
    /// Whichever party claims it first.
    #[n(0)]
    Either,
    #[n(1)]
    Party(#[n(0)] PartyId),
}

impl EventTarget {
    pub fn allows(&self, party: &PartyId) -> bool {
        match self {
            EventTarget::Either => true,
            EventTarget::Party(p) => p == party,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub enum EventStatus {
    #[n(0)]
    Active,
    #[n(1)]
    Completed,
    #[n(2)]
    Cancelled,
}

#[derive(Debug, Clone, minicbor::Encode, minicbor::Decode)]
pub struct SpecialEvent {
    #[n(0)]
    pub id: EventId,
    #[n(1)]
    pub title: String,
    #[n(2)]
    pub description: String,
    #[n(3)]
    pub credits: u64,
    #[n(4)]
    pub target: EventTarget,
    #[n(5)]
    pub status: EventStatus,
    /// Set at most once, when a party claims the event.
    #[n(6)]
    pub assigned_to: Option<PartyId>,
    #[n(7)]
    pub completed_by: Option<PartyId>,
    #[n(8)]
    pub completed_at: Option<TimeStamp<Utc>>,
    #[n(9)]
    pub created_at: TimeStamp<Utc>,
}
