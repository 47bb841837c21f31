//! Per-offer read tracking and unread counts
use crate::offer::{Offer, OfferStatus};
use crate::types::PartyId;

/// An offer is unread for a party when they participate, have not
/// acknowledged the current status, and either the status changed or the
/// offer is pending with them as recipient.
pub fn unread_count(offers: &[Offer], party: &PartyId) -> usize {
    offers
        .iter()
        .filter(|o| {
            let unread = !o.read_by.contains(party);
            let status_change = matches!(
                o.status,
                OfferStatus::Accepted
                    | OfferStatus::Rejected
                    | OfferStatus::Countered
                    | OfferStatus::Realized
            );
            let pending_for_me = o.status == OfferStatus::Pending && o.to == *party;
            o.involves(party) && unread && (status_change || pending_for_me)
        })
        .count()
}

/// Idempotent: adding an already-present party is a no-op.
pub fn mark_all_read(offers: &mut [Offer], party: &PartyId) {
    for offer in offers.iter_mut().filter(|o| o.involves(party)) {
        offer.read_by.insert(party.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offer::OfferKind;
    use crate::types::{OfferId, ServiceId};

    fn offer_between(id: u64, from: &str, to: &str, status: OfferStatus) -> Offer {
        let mut offer = Offer::new(
            OfferId::new(id),
            PartyId::from(from),
            PartyId::from(to),
            10,
            String::new(),
            OfferKind::Negotiation {
                service: ServiceId::new(1),
            },
        );
        offer.status = status;
        offer
    }

    #[test]
    fn pending_counts_only_for_the_recipient() {
        let offers = vec![offer_between(1, "alice", "bob", OfferStatus::Pending)];
        assert_eq!(unread_count(&offers, &PartyId::from("bob")), 1);
        assert_eq!(unread_count(&offers, &PartyId::from("alice")), 0);
    }

    #[test]
    fn status_changes_count_for_both_until_read() {
        let mut offers = vec![offer_between(1, "alice", "bob", OfferStatus::Rejected)];
        let alice = PartyId::from("alice");
        let bob = PartyId::from("bob");
        assert_eq!(unread_count(&offers, &alice), 1);
        assert_eq!(unread_count(&offers, &bob), 1);

        mark_all_read(&mut offers, &alice);
        assert_eq!(unread_count(&offers, &alice), 0);
        assert_eq!(unread_count(&offers, &bob), 1);
    }

    #[test]
    fn marking_read_twice_changes_nothing() {
        let mut offers = vec![offer_between(1, "alice", "bob", OfferStatus::Accepted)];
        let bob = PartyId::from("bob");

        mark_all_read(&mut offers, &bob);
        let snapshot = offers[0].read_by.clone();
        mark_all_read(&mut offers, &bob);

        assert_eq!(offers[0].read_by, snapshot);
        assert_eq!(offers[0].read_by.len(), 1);
    }

    #[test]
    fn outsiders_are_never_counted_or_marked() {
        let mut offers = vec![offer_between(1, "alice", "bob", OfferStatus::Accepted)];
        let stranger = PartyId::from("mallory");

        assert_eq!(unread_count(&offers, &stranger), 0);
        mark_all_read(&mut offers, &stranger);
        assert!(offers[0].read_by.is_empty());
    }
}
