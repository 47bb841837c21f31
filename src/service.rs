//! Service layer API for the offer lifecycle and every operation the
//! outer web/session layer calls, keyed by an authenticated actor id.
//!
//! All operations lock the whole market state, so per-party balance
//! mutations and per-offer transitions are serialized: of two concurrent
//! responses to one offer, the second sees the post-transition status
//! and is refused. Each successful mutation persists the snapshot before
//! returning; persistence is a side effect, in-memory state is the
//! source of truth for subsequent reads.
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use rand::thread_rng;
use sled::Db;

use crate::catalog::Service;
use crate::error::MarketError;
use crate::event::{EventStatus, EventTarget, SpecialEvent};
use crate::notify;
use crate::offer::{
    Feedback, Offer, OfferKind, OfferStatus, PayerSide, RequestDetail, Response, super_bonus,
};
use crate::party::Party;
use crate::relationship::{self, RelationshipStatus};
use crate::store::MarketState;
use crate::types::{EventId, OfferId, PartyId, ServiceId, TimeStamp};
use crate::voucher::{self, Voucher};

pub struct MarketService {
    instance: Arc<Db>,
    state: Mutex<MarketState>,
}

impl MarketService {
    /// Open over an existing database, loading the stored snapshot or
    /// starting empty.
    pub fn open(instance: Arc<Db>) -> anyhow::Result<Self> {
        let state = MarketState::load_from_db(&instance)?.unwrap_or_default();
        Ok(Self {
            instance,
            state: Mutex::new(state),
        })
    }

    /// Start from caller-provided state (parties registered, catalog
    /// seeded) and persist it as the initial snapshot.
    pub fn with_state(instance: Arc<Db>, state: MarketState) -> anyhow::Result<Self> {
        state.save_to_db(&instance)?;
        Ok(Self {
            instance,
            state: Mutex::new(state),
        })
    }

    fn lock(&self) -> MutexGuard<'_, MarketState> {
        self.state.lock().expect("market state mutex poisoned")
    }

    fn persist(&self, state: &MarketState) -> Result<(), MarketError> {
        state.save_to_db(&self.instance)?;
        Ok(())
    }

    // ---- offer lifecycle ----------------------------------------------

    /// Buy a catalog service at its listed price. The buyer is debited
    /// immediately (escrow); the recorded amount is what a later reject
    /// refunds, even if the service price changes in the meantime.
    pub fn purchase_service(
        &self,
        buyer: &PartyId,
        service_id: ServiceId,
    ) -> Result<Offer, MarketError> {
        let mut state = self.lock();
        let service = state
            .service(service_id)
            .ok_or(MarketError::ServiceNotFound(service_id))?
            .clone();
        if state.party(&service.owner).is_none() {
            return Err(MarketError::PartyNotFound(service.owner));
        }

        state.debit(buyer, service.price)?;
        let id = state.allocate_offer_id();
        let offer = Offer::new(
            id,
            buyer.clone(),
            service.owner.clone(),
            service.price,
            String::new(),
            OfferKind::Purchase {
                service: service_id,
                debited: service.price,
            },
        );
        state.insert_offer(offer.clone());
        tracing::info!(offer = %id, %buyer, price = service.price, "purchase escrowed");
        self.persist(&state)?;
        Ok(offer)
    }

    /// Propose a different price for a catalog service. No funds move
    /// until the owner accepts.
    pub fn propose_negotiation(
        &self,
        from: &PartyId,
        service_id: ServiceId,
        price: u64,
        comment: impl Into<String>,
    ) -> Result<Offer, MarketError> {
        let mut state = self.lock();
        let service = state
            .service(service_id)
            .ok_or(MarketError::ServiceNotFound(service_id))?
            .clone();
        if state.party(from).is_none() {
            return Err(MarketError::PartyNotFound(from.clone()));
        }

        let id = state.allocate_offer_id();
        let offer = Offer::new(
            id,
            from.clone(),
            service.owner,
            price,
            comment.into(),
            OfferKind::Negotiation {
                service: service_id,
            },
        );
        state.insert_offer(offer.clone());
        self.persist(&state)?;
        Ok(offer)
    }

    /// Ask the counterparty for a service that has no catalog entry, or
    /// offer to perform one. `payer` fixes who ultimately pays; that
    /// identity survives the whole counter chain.
    pub fn create_request(
        &self,
        from: &PartyId,
        to: &PartyId,
        detail: RequestDetail,
        price: u64,
        super_service: bool,
        payer: PayerSide,
        comment: impl Into<String>,
    ) -> Result<Offer, MarketError> {
        let mut state = self.lock();
        for party in [from, to] {
            if state.party(party).is_none() {
                return Err(MarketError::PartyNotFound(party.clone()));
            }
        }
        if price == 0 {
            return Err(MarketError::InvalidAmount);
        }

        let original_requester = match payer {
            PayerSide::Initiator => from.clone(),
            PayerSide::Recipient => to.clone(),
        };
        let bonus = if super_service { super_bonus(price) } else { 0 };

        let id = state.allocate_offer_id();
        let offer = Offer::new(
            id,
            from.clone(),
            to.clone(),
            price,
            comment.into(),
            OfferKind::Request {
                detail,
                original_requester,
                super_service,
                bonus,
            },
        );
        state.insert_offer(offer.clone());
        self.persist(&state)?;
        Ok(offer)
    }

    /// Transfer credits outright. The record is born `accepted`; a
    /// donation has no negotiation phase.
    pub fn donate(
        &self,
        from: &PartyId,
        to: &PartyId,
        amount: u64,
        message: &str,
    ) -> Result<Offer, MarketError> {
        let mut state = self.lock();
        if amount == 0 {
            return Err(MarketError::InvalidAmount);
        }
        state.transfer(from, to, amount)?;

        let comment = if message.is_empty() {
            "Credit donation".to_string()
        } else {
            message.to_string()
        };
        let id = state.allocate_offer_id();
        let mut offer = Offer::new(
            id,
            from.clone(),
            to.clone(),
            amount,
            comment,
            OfferKind::Donation,
        );
        offer.status = OfferStatus::Accepted;
        state.insert_offer(offer.clone());
        tracing::info!(offer = %id, %from, %to, amount, "credits donated");
        self.persist(&state)?;
        Ok(offer)
    }

    /// Accept, reject or counter a pending offer. Only the recipient may
    /// respond. Returns the updated offer; for a counter, the newly
    /// spawned pending offer.
    pub fn respond(
        &self,
        actor: &PartyId,
        offer_id: OfferId,
        response: Response,
    ) -> Result<Offer, MarketError> {
        let mut state = self.lock();
        let idx = state
            .offer_position(offer_id)
            .ok_or(MarketError::OfferNotFound(offer_id))?;
        {
            let offer = &state.offers[idx];
            if offer.to != *actor {
                return Err(MarketError::Forbidden(actor.clone(), "respond to this offer"));
            }
            if offer.status != OfferStatus::Pending {
                return Err(MarketError::InvalidState("offer is not pending"));
            }
        }

        let result = match response {
            Response::Accept => {
                apply_accept(&mut state, idx, actor)?;
                state.offers[idx].clone()
            }
            Response::Reject => {
                apply_reject(&mut state, idx, actor)?;
                state.offers[idx].clone()
            }
            Response::Counter { price, comment } => {
                apply_counter(&mut state, idx, actor, price, comment)?
            }
        };
        self.persist(&state)?;
        Ok(result)
    }

    /// Confirm that an accepted exchange actually happened. Only the
    /// payer may realize; no credits move here.
    pub fn realize(
        &self,
        actor: &PartyId,
        offer_id: OfferId,
        feedback: Option<Feedback>,
    ) -> Result<Offer, MarketError> {
        let mut state = self.lock();
        let idx = state
            .offer_position(offer_id)
            .ok_or(MarketError::OfferNotFound(offer_id))?;
        {
            let offer = &state.offers[idx];
            if offer.status != OfferStatus::Accepted {
                return Err(MarketError::InvalidState("offer is not accepted"));
            }
            if offer.payer() != actor {
                return Err(MarketError::Forbidden(actor.clone(), "realize this offer"));
            }
        }

        let offer = &mut state.offers[idx];
        offer.status = OfferStatus::Realized;
        offer.read_by.clear();
        offer.read_by.insert(actor.clone());
        if let Some(rating) = feedback {
            offer.feedback = Some(rating);
            offer.feedback_at = Some(TimeStamp::new());
        }
        let updated = offer.clone();
        tracing::info!(offer = %offer_id, %actor, "offer realized");
        self.persist(&state)?;
        Ok(updated)
    }

    // ---- special events -----------------------------------------------

    pub fn create_event(
        &self,
        actor: &PartyId,
        title: impl Into<String>,
        description: impl Into<String>,
        credits: u64,
        target: EventTarget,
    ) -> Result<SpecialEvent, MarketError> {
        let mut state = self.lock();
        require_admin(&state, actor)?;
        if credits == 0 {
            return Err(MarketError::InvalidAmount);
        }
        if let EventTarget::Party(id) = &target {
            if state.party(id).is_none() {
                return Err(MarketError::PartyNotFound(id.clone()));
            }
        }

        let event = SpecialEvent {
            id: state.allocate_event_id(),
            title: title.into(),
            description: description.into(),
            credits,
            target,
            status: EventStatus::Active,
            assigned_to: None,
            completed_by: None,
            completed_at: None,
            created_at: TimeStamp::new(),
        };
        state.events.push(event.clone());
        self.persist(&state)?;
        Ok(event)
    }

    /// Claim an active event. Assignment happens at most once; it also
    /// records an `accepted` offer for ledger history, without moving
    /// any credits yet.
    pub fn assign_event(&self, actor: &PartyId, event_id: EventId) -> Result<Offer, MarketError> {
        let mut state = self.lock();
        if state.party(actor).is_none() {
            return Err(MarketError::PartyNotFound(actor.clone()));
        }
        let ev_idx = state
            .events
            .iter()
            .position(|e| e.id == event_id)
            .ok_or(MarketError::EventNotFound(event_id))?;
        let (credits, title) = {
            let event = &state.events[ev_idx];
            if event.status != EventStatus::Active {
                return Err(MarketError::InvalidState("event is not active"));
            }
            if !event.target.allows(actor) {
                return Err(MarketError::Forbidden(actor.clone(), "accept this event"));
            }
            if event.assigned_to.is_some() {
                return Err(MarketError::AlreadyAssigned);
            }
            (event.credits, event.title.clone())
        };

        state.events[ev_idx].assigned_to = Some(actor.clone());
        let id = state.allocate_offer_id();
        let mut offer = Offer::new(
            id,
            actor.clone(),
            actor.clone(),
            credits,
            format!("Special event: {title}"),
            OfferKind::SpecialEvent { event: event_id },
        );
        offer.status = OfferStatus::Accepted;
        state.insert_offer(offer.clone());
        self.persist(&state)?;
        Ok(offer)
    }

    /// Finish an assigned event: mints the event credits to the
    /// assignee, closes the event and realizes the linked offer.
    pub fn complete_event(
        &self,
        actor: &PartyId,
        event_id: EventId,
    ) -> Result<SpecialEvent, MarketError> {
        let mut state = self.lock();
        let ev_idx = state
            .events
            .iter()
            .position(|e| e.id == event_id)
            .ok_or(MarketError::EventNotFound(event_id))?;
        {
            let event = &state.events[ev_idx];
            if event.status != EventStatus::Active {
                return Err(MarketError::InvalidState("event is not active"));
            }
            if event.assigned_to.as_ref() != Some(actor) {
                return Err(MarketError::Forbidden(actor.clone(), "complete this event"));
            }
        }
        let offer_idx = state
            .offers
            .iter()
            .position(|o| {
                o.from == *actor && matches!(o.kind, OfferKind::SpecialEvent { event } if event == event_id)
            })
            .ok_or(MarketError::InvalidState("event has no linked offer"))?;

        let credits = state.events[ev_idx].credits;
        state.credit_party(actor, credits)?;

        let event = &mut state.events[ev_idx];
        event.status = EventStatus::Completed;
        event.completed_by = Some(actor.clone());
        event.completed_at = Some(TimeStamp::new());
        let completed = event.clone();

        state.offers[offer_idx].status = OfferStatus::Realized;
        tracing::info!(event = %event_id, %actor, credits, "special event completed");
        self.persist(&state)?;
        Ok(completed)
    }

    /// Administrative cancellation of an active event.
    pub fn cancel_event(
        &self,
        actor: &PartyId,
        event_id: EventId,
    ) -> Result<SpecialEvent, MarketError> {
        let mut state = self.lock();
        require_admin(&state, actor)?;
        let ev_idx = state
            .events
            .iter()
            .position(|e| e.id == event_id)
            .ok_or(MarketError::EventNotFound(event_id))?;
        if state.events[ev_idx].status != EventStatus::Active {
            return Err(MarketError::InvalidState("event is not active"));
        }
        state.events[ev_idx].status = EventStatus::Cancelled;
        let cancelled = state.events[ev_idx].clone();
        self.persist(&state)?;
        Ok(cancelled)
    }

    /// Active events the party could claim.
    pub fn events_for(&self, party: &PartyId) -> Vec<SpecialEvent> {
        let state = self.lock();
        state
            .events
            .iter()
            .filter(|e| e.status == EventStatus::Active && e.target.allows(party))
            .cloned()
            .collect()
    }

    // ---- vouchers ------------------------------------------------------

    pub fn issue_voucher(
        &self,
        actor: &PartyId,
        credits: u64,
        comment: impl Into<String>,
    ) -> Result<Voucher, MarketError> {
        let mut state = self.lock();
        require_admin(&state, actor)?;
        if credits == 0 {
            return Err(MarketError::InvalidAmount);
        }

        let code = voucher::draw_code(&mut thread_rng(), &state.vouchers);
        let voucher = Voucher {
            id: state.allocate_voucher_id(),
            code,
            credits,
            comment: comment.into(),
            used: false,
            used_by: None,
            used_at: None,
            created_at: TimeStamp::new(),
        };
        state.vouchers.push(voucher.clone());
        self.persist(&state)?;
        Ok(voucher)
    }

    /// Redeem a code. Single-use and irreversible.
    pub fn redeem_voucher(&self, actor: &PartyId, code: &str) -> Result<Voucher, MarketError> {
        let mut state = self.lock();
        let idx = state
            .vouchers
            .iter()
            .position(|v| v.code == code && !v.used)
            .ok_or(MarketError::InvalidOrUsedVoucher)?;

        let credits = state.vouchers[idx].credits;
        state.credit_party(actor, credits)?;
        let voucher = &mut state.vouchers[idx];
        voucher.used = true;
        voucher.used_by = Some(actor.clone());
        voucher.used_at = Some(TimeStamp::new());
        let redeemed = voucher.clone();
        tracing::info!(code, %actor, credits, "voucher redeemed");
        self.persist(&state)?;
        Ok(redeemed)
    }

    /// Look up a printable, still-unused voucher by code.
    pub fn voucher_by_code(&self, code: &str) -> Result<Voucher, MarketError> {
        let state = self.lock();
        state
            .vouchers
            .iter()
            .find(|v| v.code == code && !v.used)
            .cloned()
            .ok_or(MarketError::InvalidOrUsedVoucher)
    }

    // ---- administration ------------------------------------------------

    /// Direct balance override, bypassing the funds check.
    pub fn set_balance(
        &self,
        actor: &PartyId,
        target: &PartyId,
        credits: i64,
    ) -> Result<(), MarketError> {
        let mut state = self.lock();
        require_admin(&state, actor)?;
        state.set_balance(target, credits)?;
        self.persist(&state)
    }

    /// Adjust one tier's threshold. The ladder stays monotonically
    /// increasing, so the new value must sit between its neighbours.
    pub fn set_level_threshold(
        &self,
        actor: &PartyId,
        index: usize,
        min_credits: u64,
    ) -> Result<(), MarketError> {
        let mut state = self.lock();
        require_admin(&state, actor)?;
        let levels = &state.levels;
        if index >= levels.len() {
            return Err(MarketError::InvalidState("no such relationship level"));
        }
        let lower_ok = index == 0 || levels[index - 1].min_credits <= min_credits;
        let upper_ok = index + 1 >= levels.len() || min_credits <= levels[index + 1].min_credits;
        if !lower_ok || !upper_ok {
            return Err(MarketError::InvalidAmount);
        }
        state.levels[index].min_credits = min_credits;
        self.persist(&state)
    }

    // ---- catalog -------------------------------------------------------

    pub fn add_service(
        &self,
        owner: &PartyId,
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        price: u64,
        icon: impl Into<String>,
    ) -> Result<Service, MarketError> {
        let mut state = self.lock();
        if state.party(owner).is_none() {
            return Err(MarketError::PartyNotFound(owner.clone()));
        }
        let id = state.insert_service(
            owner.clone(),
            title.into(),
            description.into(),
            category.into(),
            price,
            icon.into(),
        );
        let service = state
            .service(id)
            .cloned()
            .ok_or(MarketError::ServiceNotFound(id))?;
        self.persist(&state)?;
        Ok(service)
    }

    pub fn update_service(
        &self,
        owner: &PartyId,
        service_id: ServiceId,
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        price: u64,
        icon: impl Into<String>,
    ) -> Result<Service, MarketError> {
        let mut state = self.lock();
        let idx = state
            .services
            .iter()
            .position(|s| s.id == service_id)
            .ok_or(MarketError::ServiceNotFound(service_id))?;
        if state.services[idx].owner != *owner {
            return Err(MarketError::Forbidden(owner.clone(), "edit this service"));
        }
        let service = &mut state.services[idx];
        service.title = title.into();
        service.description = description.into();
        service.category = category.into();
        service.price = price;
        service.icon = icon.into();
        let updated = service.clone();
        self.persist(&state)?;
        Ok(updated)
    }

    /// Remove a catalog entry. Offers already referencing it survive but
    /// fail resolution at settlement time.
    pub fn remove_service(
        &self,
        owner: &PartyId,
        service_id: ServiceId,
    ) -> Result<Service, MarketError> {
        let mut state = self.lock();
        let idx = state
            .services
            .iter()
            .position(|s| s.id == service_id)
            .ok_or(MarketError::ServiceNotFound(service_id))?;
        if state.services[idx].owner != *owner {
            return Err(MarketError::Forbidden(owner.clone(), "remove this service"));
        }
        let removed = state.services.remove(idx);
        self.persist(&state)?;
        Ok(removed)
    }

    pub fn services_of(&self, owner: &PartyId) -> Vec<Service> {
        let state = self.lock();
        state.services_of(owner).into_iter().cloned().collect()
    }

    // ---- read-side queries ---------------------------------------------

    pub fn offer(&self, id: OfferId) -> Result<Offer, MarketError> {
        let state = self.lock();
        state
            .offer(id)
            .cloned()
            .ok_or(MarketError::OfferNotFound(id))
    }

    /// Offers the party participates in, most recent first.
    pub fn offers_for(&self, party: &PartyId) -> Vec<Offer> {
        let state = self.lock();
        let mut offers: Vec<Offer> = state
            .offers_for_party(party)
            .into_iter()
            .cloned()
            .collect();
        offers.sort_by(|a, b| b.id.cmp(&a.id));
        offers
    }

    /// The whole counter chain below a root offer, in creation order.
    pub fn offers_in_chain(&self, root: OfferId) -> Vec<Offer> {
        let state = self.lock();
        state.offers_in_chain(root).into_iter().cloned().collect()
    }

    /// The negotiation inbox: returns the party's offers, most recent
    /// first, and marks every one of them read (idempotent, persisted).
    pub fn view_negotiations(&self, party: &PartyId) -> Result<Vec<Offer>, MarketError> {
        let mut state = self.lock();
        notify::mark_all_read(&mut state.offers, party);
        self.persist(&state)?;
        let mut offers: Vec<Offer> = state
            .offers_for_party(party)
            .into_iter()
            .cloned()
            .collect();
        offers.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(offers)
    }

    pub fn unread_count(&self, party: &PartyId) -> usize {
        let state = self.lock();
        notify::unread_count(&state.offers, party)
    }

    pub fn relationship_status(&self) -> RelationshipStatus {
        let state = self.lock();
        relationship::status_at(&state.offers, &state.levels, Utc::now())
    }

    /// Settled exchanges inside the relationship window, newest first.
    pub fn settled_history(&self) -> Vec<Offer> {
        let state = self.lock();
        relationship::settled_in_window(&state.offers, Utc::now())
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn balance(&self, party: &PartyId) -> Result<i64, MarketError> {
        let state = self.lock();
        state.balance(party)
    }

    pub fn party(&self, id: &PartyId) -> Result<Party, MarketError> {
        let state = self.lock();
        state
            .party(id)
            .cloned()
            .ok_or_else(|| MarketError::PartyNotFound(id.clone()))
    }
}

fn require_admin(state: &MarketState, actor: &PartyId) -> Result<(), MarketError> {
    let party = state
        .party(actor)
        .ok_or_else(|| MarketError::PartyNotFound(actor.clone()))?;
    if !party.is_admin() {
        return Err(MarketError::Forbidden(actor.clone(), "administer the market"));
    }
    Ok(())
}

fn apply_accept(state: &mut MarketState, idx: usize, actor: &PartyId) -> Result<(), MarketError> {
    let (kind, price, from, to) = {
        let offer = &state.offers[idx];
        (
            offer.kind.clone(),
            offer.price,
            offer.from.clone(),
            offer.to.clone(),
        )
    };

    match kind {
        OfferKind::Purchase { service, .. } => {
            // The buyer already paid at creation; only the seller side
            // settles here.
            if state.service(service).is_none() {
                return Err(MarketError::ServiceNotFound(service));
            }
            if state.party(&from).is_none() {
                return Err(MarketError::PartyNotFound(from));
            }
            state.credit_party(&to, price)?;
        }
        OfferKind::Request {
            original_requester,
            super_service,
            bonus,
            ..
        } => {
            let payee = if original_requester == from {
                to.clone()
            } else {
                from.clone()
            };
            state.transfer(&original_requester, &payee, price)?;
            if super_service && bonus > 0 {
                state.credit_party(&payee, bonus)?;
            }
        }
        OfferKind::Negotiation { service } => {
            if state.service(service).is_none() {
                return Err(MarketError::ServiceNotFound(service));
            }
            state.transfer(&from, &to, price)?;
        }
        // Donations and event records are born accepted, never pending.
        OfferKind::Donation | OfferKind::SpecialEvent { .. } => {
            return Err(MarketError::InvalidState("offer cannot be accepted"));
        }
    }

    let offer = &mut state.offers[idx];
    offer.status = OfferStatus::Accepted;
    offer.read_by.clear();
    offer.read_by.insert(actor.clone());
    tracing::info!(offer = %offer.id, %actor, "offer accepted");
    Ok(())
}

fn apply_reject(state: &mut MarketState, idx: usize, actor: &PartyId) -> Result<(), MarketError> {
    let refund = {
        let offer = &state.offers[idx];
        match offer.kind {
            // Refund exactly what was escrowed, not the current price.
            OfferKind::Purchase { debited, .. } => Some((offer.from.clone(), debited)),
            _ => None,
        }
    };
    if let Some((buyer, debited)) = refund {
        state.credit_party(&buyer, debited)?;
        tracing::info!(%buyer, refunded = debited, "escrow refunded on reject");
    }

    let offer = &mut state.offers[idx];
    offer.status = OfferStatus::Rejected;
    offer.read_by.clear();
    offer.read_by.insert(actor.clone());
    Ok(())
}

fn apply_counter(
    state: &mut MarketState,
    idx: usize,
    actor: &PartyId,
    price: u64,
    comment: Option<String>,
) -> Result<Offer, MarketError> {
    if price == 0 {
        return Err(MarketError::InvalidAmount);
    }
    let (original_id, from, to, root, kind) = {
        let offer = &state.offers[idx];
        (
            offer.id,
            offer.from.clone(),
            offer.to.clone(),
            offer.root,
            offer.kind.clone(),
        )
    };

    // Request chains stay requests so the payer identity survives;
    // everything else continues as a plain price negotiation. A counter
    // is a fresh creation, so it carries no super-service bonus.
    let new_kind = match kind {
        OfferKind::Request {
            detail,
            original_requester,
            ..
        } => OfferKind::Request {
            detail,
            original_requester,
            super_service: false,
            bonus: 0,
        },
        OfferKind::Purchase { service, .. } | OfferKind::Negotiation { service } => {
            OfferKind::Negotiation { service }
        }
        OfferKind::Donation | OfferKind::SpecialEvent { .. } => {
            return Err(MarketError::InvalidState("offer cannot be countered"));
        }
    };

    let id = state.allocate_offer_id();
    let mut counter = Offer::new(
        id,
        to,
        from,
        price,
        comment.unwrap_or_else(|| "Counter-proposal".to_string()),
        new_kind,
    );
    counter.parent = Some(original_id);
    counter.root = root;
    state.insert_offer(counter.clone());

    let offer = &mut state.offers[idx];
    offer.status = OfferStatus::Countered;
    offer.read_by.clear();
    offer.read_by.insert(actor.clone());
    tracing::debug!(original = %original_id, counter = %id, price, "offer countered");
    Ok(counter)
}
