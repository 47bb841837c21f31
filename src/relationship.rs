//! Relationship level derived from recent settled exchanges
use chrono::{DateTime, Duration, Utc};

use crate::offer::Offer;

/// Days of ledger history that count toward the level.
pub const WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct RelationshipLevel {
    #[n(0)]
    pub name: String,
    #[n(1)]
    pub min_credits: u64,
    #[n(2)]
    pub icon: String,
}

impl RelationshipLevel {
    pub fn new(name: impl Into<String>, min_credits: u64, icon: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_credits,
            icon: icon.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipStatus {
    pub level: Option<RelationshipLevel>,
    pub next_level: Option<RelationshipLevel>,
    pub total_credits: u64,
}

pub fn default_ladder() -> Vec<RelationshipLevel> {
    vec![
        RelationshipLevel::new("Roommates", 0, "🏠"),
        RelationshipLevel::new("Companions", 100, "🤝"),
        RelationshipLevel::new("Team", 300, "⚡"),
        RelationshipLevel::new("Connected", 600, "💫"),
        RelationshipLevel::new("In Love", 1000, "💕"),
    ]
}

fn in_window(offer: &Offer, now: DateTime<Utc>) -> bool {
    let window_start = now - Duration::days(WINDOW_DAYS);
    offer.status.is_settled() && offer.created_at.to_datetime_utc() >= window_start
}

/// Settled offers inside the window, most recent first.
pub fn settled_in_window(offers: &[Offer], now: DateTime<Utc>) -> Vec<&Offer> {
    let mut settled: Vec<&Offer> = offers.iter().filter(|o| in_window(o, now)).collect();
    settled.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    settled
}

/// Recomputed on demand, never cached. The total can shrink as old
/// settlements age out of the window; that is expected, not a bug.
pub fn status_at(
    offers: &[Offer],
    levels: &[RelationshipLevel],
    now: DateTime<Utc>,
) -> RelationshipStatus {
    let total_credits: u64 = offers
        .iter()
        .filter(|o| in_window(o, now))
        .map(|o| o.price + o.bonus())
        .sum();

    // Highest tier whose threshold is met; the bottom tier is the floor.
    let reached = levels
        .iter()
        .enumerate()
        .rev()
        .find(|(_, l)| total_credits >= l.min_credits)
        .map(|(i, _)| i)
        .unwrap_or(0);

    RelationshipStatus {
        level: levels.get(reached).cloned(),
        next_level: levels.get(reached + 1).cloned(),
        total_credits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offer::{OfferKind, OfferStatus};
    use crate::types::{OfferId, PartyId, ServiceId, TimeStamp};

    fn settled_offer(id: u64, price: u64, status: OfferStatus, at: TimeStamp<Utc>) -> Offer {
        let mut offer = Offer::new(
            OfferId::new(id),
            PartyId::from("alice"),
            PartyId::from("bob"),
            price,
            String::new(),
            OfferKind::Negotiation {
                service: ServiceId::new(1),
            },
        );
        offer.status = status;
        offer.created_at = at;
        offer
    }

    #[test]
    fn selects_highest_reached_tier() {
        let now = Utc::now();
        let offers = vec![
            settled_offer(1, 200, OfferStatus::Accepted, TimeStamp::new()),
            settled_offer(2, 150, OfferStatus::Realized, TimeStamp::new()),
        ];

        let status = status_at(&offers, &default_ladder(), now);
        assert_eq!(status.total_credits, 350);
        assert_eq!(status.level.unwrap().name, "Team");
        assert_eq!(status.next_level.unwrap().name, "Connected");
    }

    #[test]
    fn old_settlements_age_out() {
        let now = Utc::now();
        let stale: TimeStamp<Utc> = (now - Duration::days(WINDOW_DAYS + 1)).into();
        let offers = vec![
            settled_offer(1, 500, OfferStatus::Accepted, stale),
            settled_offer(2, 120, OfferStatus::Accepted, TimeStamp::new()),
        ];

        let status = status_at(&offers, &default_ladder(), now);
        assert_eq!(status.total_credits, 120);
        assert_eq!(status.level.unwrap().name, "Companions");
    }

    #[test]
    fn pending_and_rejected_never_count() {
        let now = Utc::now();
        let mut pending = settled_offer(1, 900, OfferStatus::Accepted, TimeStamp::new());
        pending.status = OfferStatus::Pending;
        let mut rejected = settled_offer(2, 900, OfferStatus::Accepted, TimeStamp::new());
        rejected.status = OfferStatus::Rejected;

        let status = status_at(&[pending, rejected], &default_ladder(), now);
        assert_eq!(status.total_credits, 0);
        assert_eq!(status.level.unwrap().name, "Roommates");
    }

    #[test]
    fn top_tier_has_no_next() {
        let now = Utc::now();
        let offers = vec![settled_offer(1, 1500, OfferStatus::Realized, TimeStamp::new())];

        let status = status_at(&offers, &default_ladder(), now);
        assert_eq!(status.level.unwrap().name, "In Love");
        assert!(status.next_level.is_none());
    }
}
