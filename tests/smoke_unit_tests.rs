//! Smoke screen unit tests for the exchange components
//!
//! These are unit tests that span the codebase, testing behavior in
//! isolation from the integration scenarios. They are intended as a
//! smoke screen and generally cover the happy path.

use std::collections::BTreeSet;

use credit_exchange::offer::{Offer, OfferKind, OfferStatus, RequestDetail, super_bonus};
use credit_exchange::types::{OfferId, PartyId, ServiceId, TimeStamp};

fn sample_offer(id: u64, from: &str, to: &str, kind: OfferKind, status: OfferStatus) -> Offer {
    Offer {
        id: OfferId::new(id),
        from: PartyId::from(from),
        to: PartyId::from(to),
        price: 20,
        comment: String::new(),
        status,
        kind,
        parent: None,
        root: OfferId::new(id),
        read_by: BTreeSet::new(),
        feedback: None,
        feedback_at: None,
        created_at: TimeStamp::new(),
    }
}

fn sample_request(requester: &str) -> OfferKind {
    OfferKind::Request {
        detail: RequestDetail {
            title: "Breakfast".into(),
            category: "Home".into(),
            icon: "🥐".into(),
        },
        original_requester: PartyId::from(requester),
        super_service: false,
        bonus: 0,
    }
}

// UTILS MODULE TESTS
#[cfg(test)]
mod utils_tests {
    use credit_exchange::utils::new_party_id;

    /// Generated ids carry the human-readable prefix and enough entropy
    /// to never collide in practice.
    #[test]
    fn generates_valid_bech32_with_hrp() {
        let result = new_party_id("party_");
        assert!(result.is_ok());

        let encoded = result.unwrap();
        assert!(encoded.as_str().starts_with("party_1"));
        assert!(encoded.as_str().len() > 10);
    }

    #[test]
    fn handles_empty_hrp() {
        assert!(new_party_id("").is_err());
    }

    #[test]
    fn generates_unique_ids() {
        let id1 = new_party_id("party_").unwrap();
        let id2 = new_party_id("party_").unwrap();
        let id3 = new_party_id("party_").unwrap();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }
}

// TYPES MODULE TESTS
#[cfg(test)]
mod types_tests {
    use super::*;
    use chrono::{Datelike, Timelike, Utc};

    #[test]
    fn timestamp_new_with_creates_specific_time() {
        let ts = TimeStamp::new_with(2024, 6, 15, 10, 30, 0);
        let dt = ts.to_datetime_utc();

        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 6);
        assert_eq!(dt.day(), 15);
        assert_eq!(dt.hour(), 10);
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn timestamp_cbor_roundtrip() {
        let original = TimeStamp::new();

        let encoded = minicbor::to_vec(&original).unwrap();
        let decoded: TimeStamp<Utc> = minicbor::decode(&encoded).unwrap();

        assert_eq!(original, decoded);
    }

    #[test]
    fn ids_cbor_roundtrip() {
        let party = PartyId::from("Alice");
        let encoded = minicbor::to_vec(&party).unwrap();
        let decoded: PartyId = minicbor::decode(&encoded).unwrap();
        assert_eq!(party, decoded);

        let offer = OfferId::new(42);
        let encoded = minicbor::to_vec(offer).unwrap();
        let decoded: OfferId = minicbor::decode(&encoded).unwrap();
        assert_eq!(offer, decoded);
    }
}

// OFFER MODULE TESTS
#[cfg(test)]
mod offer_tests {
    use super::*;

    #[test]
    fn bonus_is_thirty_percent_rounded() {
        assert_eq!(super_bonus(50), 15);
        assert_eq!(super_bonus(100), 30);
        assert_eq!(super_bonus(25), 8);
        assert_eq!(super_bonus(0), 0);
    }

    #[test]
    fn payer_is_the_sender_except_for_requests() {
        let purchase = sample_offer(
            1,
            "Alice",
            "Sylvain",
            OfferKind::Purchase {
                service: ServiceId::new(1),
                debited: 20,
            },
            OfferStatus::Pending,
        );
        assert_eq!(purchase.payer(), &PartyId::from("Alice"));

        let negotiation = sample_offer(
            2,
            "Sylvain",
            "Alice",
            OfferKind::Negotiation {
                service: ServiceId::new(1),
            },
            OfferStatus::Pending,
        );
        assert_eq!(negotiation.payer(), &PartyId::from("Sylvain"));

        // A request resolves through the stable chain requester, no
        // matter who sent this particular leg.
        let request = sample_offer(
            3,
            "Sylvain",
            "Alice",
            sample_request("Alice"),
            OfferStatus::Pending,
        );
        assert_eq!(request.payer(), &PartyId::from("Alice"));
    }

    #[test]
    fn bonus_requires_the_flag() {
        let mut offer = sample_offer(
            1,
            "Alice",
            "Sylvain",
            sample_request("Alice"),
            OfferStatus::Pending,
        );
        assert_eq!(offer.bonus(), 0);

        offer.kind = OfferKind::Request {
            detail: RequestDetail {
                title: "Breakfast".into(),
                category: "Home".into(),
                icon: "🥐".into(),
            },
            original_requester: PartyId::from("Alice"),
            super_service: true,
            bonus: 6,
        };
        assert_eq!(offer.bonus(), 6);
    }

    #[test]
    fn offer_cbor_roundtrip() {
        let mut offer = sample_offer(
            9,
            "Alice",
            "Sylvain",
            OfferKind::Purchase {
                service: ServiceId::new(3),
                debited: 20,
            },
            OfferStatus::Accepted,
        );
        offer.read_by.insert(PartyId::from("Sylvain"));
        offer.parent = Some(OfferId::new(4));

        let encoded = minicbor::to_vec(&offer).unwrap();
        let decoded: Offer = minicbor::decode(&encoded).unwrap();

        assert_eq!(decoded.id, offer.id);
        assert_eq!(decoded.kind, offer.kind);
        assert_eq!(decoded.status, offer.status);
        assert_eq!(decoded.read_by, offer.read_by);
        assert_eq!(decoded.parent, offer.parent);
        assert_eq!(decoded.created_at, offer.created_at);
    }
}

// NOTIFY MODULE TESTS
#[cfg(test)]
mod notify_tests {
    use super::*;
    use credit_exchange::notify::{mark_all_read, unread_count};

    #[test]
    fn unread_mixes_status_changes_and_pending_inbox() {
        let alice = PartyId::from("Alice");
        let offers = vec![
            // Pending toward Alice: counts.
            sample_offer(1, "Sylvain", "Alice", sample_request("Sylvain"), OfferStatus::Pending),
            // Pending from Alice: does not.
            sample_offer(2, "Alice", "Sylvain", sample_request("Alice"), OfferStatus::Pending),
            // Status change involving Alice: counts until read.
            sample_offer(3, "Alice", "Sylvain", sample_request("Alice"), OfferStatus::Rejected),
        ];

        assert_eq!(unread_count(&offers, &alice), 2);
    }

    #[test]
    fn reading_is_idempotent() {
        let alice = PartyId::from("Alice");
        let mut offers = vec![sample_offer(
            1,
            "Alice",
            "Sylvain",
            sample_request("Alice"),
            OfferStatus::Accepted,
        )];

        mark_all_read(&mut offers, &alice);
        mark_all_read(&mut offers, &alice);

        assert_eq!(offers[0].read_by.len(), 1);
        assert_eq!(unread_count(&offers, &alice), 0);
    }
}

// RELATIONSHIP MODULE TESTS
#[cfg(test)]
mod relationship_tests {
    use super::*;
    use chrono::Utc;
    use credit_exchange::relationship::{RelationshipLevel, default_ladder, status_at};

    #[test]
    fn default_ladder_is_monotonic() {
        let ladder = default_ladder();
        assert!(ladder.windows(2).all(|w| w[0].min_credits <= w[1].min_credits));
        assert_eq!(ladder[0].min_credits, 0);
    }

    #[test]
    fn custom_ladder_is_respected() {
        let ladder = vec![
            RelationshipLevel::new("Bronze", 0, "🥉"),
            RelationshipLevel::new("Silver", 50, "🥈"),
            RelationshipLevel::new("Gold", 500, "🥇"),
        ];
        let offers = vec![sample_offer(
            1,
            "Alice",
            "Sylvain",
            sample_request("Alice"),
            OfferStatus::Realized,
        )];

        // 20 settled credits stay below Silver's threshold.
        let status = status_at(&offers, &ladder, Utc::now());
        assert_eq!(status.total_credits, 20);
        assert_eq!(status.level.unwrap().name, "Bronze");
        assert_eq!(status.next_level.unwrap().name, "Silver");
    }

    #[test]
    fn empty_ladder_reports_no_level() {
        let status = status_at(&[], &[], Utc::now());
        assert!(status.level.is_none());
        assert!(status.next_level.is_none());
        assert_eq!(status.total_credits, 0);
    }
}

// CATALOG TESTS THROUGH THE SERVICE LAYER
#[cfg(test)]
mod catalog_tests {
    use std::sync::Arc;

    use credit_exchange::error::MarketError;
    use credit_exchange::party::{Party, Role};
    use credit_exchange::service::MarketService;
    use credit_exchange::store::MarketState;
    use credit_exchange::types::PartyId;

    fn market() -> anyhow::Result<(MarketService, PartyId, PartyId)> {
        let db = Arc::new(sled::Config::new().temporary(true).open()?);
        let alice = PartyId::from("Alice");
        let sylvain = PartyId::from("Sylvain");
        let mut state = MarketState::new();
        state.register_party(Party::new(alice.clone(), "Alice", Role::Member, 100));
        state.register_party(Party::new(sylvain.clone(), "Sylvain", Role::Administrator, 100));
        Ok((MarketService::with_state(db, state)?, alice, sylvain))
    }

    #[test]
    fn owner_scoped_crud() -> anyhow::Result<()> {
        let (market, alice, sylvain) = market()?;

        let service = market.add_service(&alice, "Massage", "Back only", "Relax", 40, "💆")?;
        assert_eq!(market.services_of(&alice).len(), 1);
        assert!(market.services_of(&sylvain).is_empty());

        let updated =
            market.update_service(&alice, service.id, "Massage", "Full", "Relax", 45, "💆")?;
        assert_eq!(updated.price, 45);
        assert_eq!(updated.description, "Full");

        // Ownership is enforced on edits and removal.
        let err = market
            .update_service(&sylvain, service.id, "x", "", "", 1, "")
            .unwrap_err();
        assert!(matches!(err, MarketError::Forbidden(..)));
        let err = market.remove_service(&sylvain, service.id).unwrap_err();
        assert!(matches!(err, MarketError::Forbidden(..)));

        market.remove_service(&alice, service.id)?;
        assert!(market.services_of(&alice).is_empty());

        Ok(())
    }

    #[test]
    fn service_ids_are_never_reused() -> anyhow::Result<()> {
        let (market, alice, _) = market()?;

        let first = market.add_service(&alice, "One", "", "Misc", 10, "1️⃣")?;
        market.remove_service(&alice, first.id)?;
        let second = market.add_service(&alice, "Two", "", "Misc", 10, "2️⃣")?;

        assert!(second.id > first.id);
        Ok(())
    }
}

// STORE SNAPSHOT TESTS
#[cfg(test)]
mod store_tests {
    use credit_exchange::party::{Party, Role};
    use credit_exchange::store::MarketState;
    use credit_exchange::types::PartyId;

    #[test]
    fn empty_database_has_no_snapshot() -> anyhow::Result<()> {
        let db = sled::Config::new().temporary(true).open()?;
        assert!(MarketState::load_from_db(&db)?.is_none());
        Ok(())
    }

    #[test]
    fn snapshot_roundtrips_through_sled() -> anyhow::Result<()> {
        let db = sled::Config::new().temporary(true).open()?;
        let alice = PartyId::from("Alice");

        let mut state = MarketState::new();
        state.register_party(Party::new(alice.clone(), "Alice", Role::Member, 120));
        state.save_to_db(&db)?;

        let restored = MarketState::load_from_db(&db)?.expect("snapshot should exist");
        assert_eq!(restored.balance(&alice)?, 120);
        assert_eq!(restored.party(&alice).unwrap().display_name, "Alice");
        Ok(())
    }

    #[test]
    fn registering_twice_replaces_the_party() -> anyhow::Result<()> {
        let alice = PartyId::from("Alice");
        let mut state = MarketState::new();
        state.register_party(Party::new(alice.clone(), "Alice", Role::Member, 120));
        state.register_party(Party::new(alice.clone(), "Alice", Role::Member, 80));

        assert_eq!(state.balance(&alice)?, 80);
        Ok(())
    }
}
