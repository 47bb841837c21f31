//! Core offer types and the lifecycle state machine vocabulary
use std::collections::BTreeSet;

use chrono::Utc;

use crate::types::{EventId, OfferId, PartyId, ServiceId, TimeStamp};

/// Extra credits minted for the payee of a flagged request:
/// 30% of the price, rounded half-up.
pub fn super_bonus(price: u64) -> u64 {
    (price * 3 + 5) / 10
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub enum OfferStatus {
    #[n(0)]
    Pending,
    #[n(1)]
    Accepted,
    #[n(2)]
    Rejected,
    #[n(3)]
    Countered,
    #[n(4)]
    Realized,
}

impl OfferStatus {
    /// Settled offers count toward the relationship window.
    pub fn is_settled(self) -> bool {
        matches!(self, OfferStatus::Accepted | OfferStatus::Realized)
    }
}

/// Display data for a service that exists only inside a request chain.
#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct RequestDetail {
    #[n(0)]
    pub title: String,
    #[n(1)]
    pub category: String,
    #[n(2)]
    pub icon: String,
}

/// Which side of a request ultimately pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayerSide {
    /// The initiator asks the counterparty to perform a service the
    /// initiator pays for.
    Initiator,
    /// The initiator offers to perform a service the counterparty pays for.
    Recipient,
}

/// One variant per offer kind, each carrying only the fields that kind
/// needs. `debited` exists only on purchases (the escrowed amount, kept
/// for exact refund); the bonus only on requests.
#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub enum OfferKind {
    #[n(0)]
    Purchase {
        #[n(0)]
        service: ServiceId,
        /// Amount removed from the buyer at creation time. Refunds use
        /// this, never the current price.
        #[n(1)]
        debited: u64,
    },
    #[n(1)]
    Negotiation {
        #[n(0)]
        service: ServiceId,
    },
    #[n(2)]
    Request {
        #[n(0)]
        detail: RequestDetail,
        /// The party whose balance is debited on acceptance. Fixed for
        /// the whole chain, no matter who is currently proposing numbers.
        #[n(1)]
        original_requester: PartyId,
        #[n(2)]
        super_service: bool,
        #[n(3)]
        bonus: u64,
    },
    #[n(3)]
    Donation,
    #[n(4)]
    SpecialEvent {
        #[n(0)]
        event: EventId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub enum Feedback {
    #[n(0)]
    Happy,
    #[n(1)]
    Neutral,
    #[n(2)]
    Sad,
}

/// A response to a pending offer, issued by its recipient.
#[derive(Debug, Clone)]
pub enum Response {
    Accept,
    Reject,
    Counter { price: u64, comment: Option<String> },
}

#[derive(Debug, Clone, minicbor::Encode, minicbor::Decode)]
pub struct Offer {
    #[n(0)]
    pub id: OfferId,
    #[n(1)]
    pub from: PartyId,
    #[n(2)]
    pub to: PartyId,
    #[n(3)]
    pub price: u64,
    #[n(4)]
    pub comment: String,
    #[n(5)]
    pub status: OfferStatus,
    #[n(6)]
    pub kind: OfferKind,
    #[n(7)]
    pub parent: Option<OfferId>,
    /// First offer of the counter chain; self-referential for roots.
    #[n(8)]
    pub root: OfferId,
    #[n(9)]
    pub read_by: BTreeSet<PartyId>,
    #[n(10)]
    pub feedback: Option<Feedback>,
    #[n(11)]
    pub feedback_at: Option<TimeStamp<Utc>>,
    #[n(12)]
    pub created_at: TimeStamp<Utc>,
}

impl Offer {
    /// A fresh pending chain root. Counter offers overwrite `parent`,
    /// `root` and `status` after construction.
    pub(crate) fn new(
        id: OfferId,
        from: PartyId,
        to: PartyId,
        price: u64,
        comment: String,
        kind: OfferKind,
    ) -> Self {
        Self {
            id,
            from,
            to,
            price,
            comment,
            status: OfferStatus::Pending,
            kind,
            parent: None,
            root: id,
            read_by: BTreeSet::new(),
            feedback: None,
            feedback_at: None,
            created_at: TimeStamp::new(),
        }
    }

    /// The party whose balance settles this offer. Accept and realize
    /// both resolve the payer through here so the two paths can never
    /// disagree.
    pub fn payer(&self) -> &PartyId {
        match &self.kind {
            OfferKind::Request {
                original_requester, ..
            } => original_requester,
            _ => &self.from,
        }
    }

    /// The participant on the other side of `party`.
    pub fn counterparty_of(&self, party: &PartyId) -> &PartyId {
        if self.from == *party { &self.to } else { &self.from }
    }

    pub fn involves(&self, party: &PartyId) -> bool {
        self.from == *party || self.to == *party
    }

    /// Bonus credits minted on acceptance; zero unless the request was
    /// flagged at creation.
    pub fn bonus(&self) -> u64 {
        match &self.kind {
            OfferKind::Request {
                super_service: true,
                bonus,
                ..
            } => *bonus,
            _ => 0,
        }
    }
}
