//! End-to-end walkthrough of the exchange: seed two parties, run a
//! purchase, a counter chain, a donation, a special event and a voucher,
//! then print the resulting balances and relationship level.
//!
//! Run with `cargo run --example market`; set RUST_LOG=debug for the
//! snapshot and settlement logs.

use std::sync::Arc;

use credit_exchange::event::EventTarget;
use credit_exchange::offer::{Feedback, PayerSide, RequestDetail, Response};
use credit_exchange::party::{Party, Role};
use credit_exchange::service::MarketService;
use credit_exchange::store::MarketState;
use credit_exchange::utils;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let dir = tempfile::tempdir()?;
    let db = Arc::new(sled::open(dir.path().join("market.db"))?);

    let alice = utils::new_party_id("alice_")?;
    let sylvain = utils::new_party_id("sylvain_")?;

    let mut state = MarketState::new();
    state.register_party(Party::new(alice.clone(), "Alice", Role::Member, 120));
    state.register_party(Party::new(
        sylvain.clone(),
        "Sylvain",
        Role::Administrator,
        120,
    ));
    let market = MarketService::with_state(db, state)?;

    // Sylvain lists a service, Alice buys it outright.
    let massage = market.add_service(
        &sylvain,
        "30 minute massage",
        "Back and neck, with quiet music.",
        "Relaxation",
        40,
        "💆",
    )?;
    let purchase = market.purchase_service(&alice, massage.id)?;
    market.respond(&sylvain, purchase.id, Response::Accept)?;
    market.realize(&alice, purchase.id, Some(Feedback::Happy))?;

    // Alice requests a custom super service; Sylvain counters the price
    // and Alice takes the new terms.
    let request = market.create_request(
        &alice,
        &sylvain,
        RequestDetail {
            title: "Breakfast in bed".into(),
            category: "Romantic".into(),
            icon: "🥐".into(),
        },
        30,
        true,
        PayerSide::Initiator,
        "Coffee, juice and a pastry.",
    )?;
    let counter = market.respond(
        &sylvain,
        request.id,
        Response::Counter {
            price: 35,
            comment: None,
        },
    )?;
    market.respond(&alice, counter.id, Response::Accept)?;

    // A small thank-you donation and an admin-issued event and voucher.
    market.donate(&sylvain, &alice, 10, "For the lovely evening")?;
    let event = market.create_event(
        &sylvain,
        "Plan a surprise outing",
        "Anything goes, one afternoon.",
        25,
        EventTarget::Either,
    )?;
    market.assign_event(&alice, event.id)?;
    market.complete_event(&alice, event.id)?;

    let voucher = market.issue_voucher(&sylvain, 15, "Anniversary gift")?;
    market.redeem_voucher(&alice, &voucher.code)?;

    for id in [&alice, &sylvain] {
        let party = market.party(id)?;
        println!(
            "{}: {} credits, {} unread notifications",
            party.display_name,
            party.credits,
            market.unread_count(id),
        );
    }

    let status = market.relationship_status();
    if let Some(level) = status.level {
        println!(
            "relationship: {} {} ({} credits in the window)",
            level.icon, level.name, status.total_credits
        );
    }

    Ok(())
}
