//! The market snapshot: every entity collection plus the id counters,
//! loaded whole at startup and persisted whole after each mutation.
use sled::{Batch, Db};

use crate::catalog::Service;
use crate::event::SpecialEvent;
use crate::offer::Offer;
use crate::party::Party;
use crate::relationship::{self, RelationshipLevel};
use crate::types::{EventId, OfferId, PartyId, ServiceId, VoucherId};
use crate::voucher::Voucher;

const K_PARTIES: &[u8] = b"parties";
const K_SERVICES: &[u8] = b"services";
const K_OFFERS: &[u8] = b"offers";
const K_VOUCHERS: &[u8] = b"vouchers";
const K_EVENTS: &[u8] = b"events";
const K_LEVELS: &[u8] = b"levels";
const K_COUNTERS: &[u8] = b"counters";

#[derive(Debug, Clone, minicbor::Encode, minicbor::Decode)]
struct Counters {
    #[n(0)]
    next_offer: u64,
    #[n(1)]
    next_service: u64,
    #[n(2)]
    next_voucher: u64,
    #[n(3)]
    next_event: u64,
}

impl Default for Counters {
    fn default() -> Self {
        Self {
            next_offer: 1,
            next_service: 1,
            next_voucher: 1,
            next_event: 1,
        }
    }
}

#[derive(Debug)]
pub struct MarketState {
    pub(crate) parties: Vec<Party>,
    pub(crate) services: Vec<Service>,
    pub(crate) offers: Vec<Offer>,
    pub(crate) vouchers: Vec<Voucher>,
    pub(crate) events: Vec<SpecialEvent>,
    pub(crate) levels: Vec<RelationshipLevel>,
    counters: Counters,
}

impl Default for MarketState {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketState {
    /// Empty state with the default relationship ladder.
    pub fn new() -> Self {
        Self {
            parties: Vec::new(),
            services: Vec::new(),
            offers: Vec::new(),
            vouchers: Vec::new(),
            events: Vec::new(),
            levels: relationship::default_ladder(),
            counters: Counters::default(),
        }
    }

    /// Register a participant. The engine never creates or removes
    /// parties on its own.
    pub fn register_party(&mut self, party: Party) {
        self.parties.retain(|p| p.id != party.id);
        self.parties.push(party);
    }

    pub fn set_levels(&mut self, levels: Vec<RelationshipLevel>) {
        self.levels = levels;
    }

    pub fn party(&self, id: &PartyId) -> Option<&Party> {
        self.parties.iter().find(|p| p.id == *id)
    }

    pub(crate) fn party_mut(&mut self, id: &PartyId) -> Option<&mut Party> {
        self.parties.iter_mut().find(|p| p.id == *id)
    }

    pub fn offer(&self, id: OfferId) -> Option<&Offer> {
        self.offers.iter().find(|o| o.id == id)
    }

    pub(crate) fn offer_position(&self, id: OfferId) -> Option<usize> {
        self.offers.iter().position(|o| o.id == id)
    }

    /// Offers where the party is sender or recipient.
    pub fn offers_for_party(&self, party: &PartyId) -> Vec<&Offer> {
        self.offers.iter().filter(|o| o.involves(party)).collect()
    }

    /// Every offer of a counter chain, in creation order.
    pub fn offers_in_chain(&self, root: OfferId) -> Vec<&Offer> {
        self.offers.iter().filter(|o| o.root == root).collect()
    }

    /// Ids are strictly increasing for the lifetime of the store and
    /// never reused; offers are never physically removed.
    pub(crate) fn allocate_offer_id(&mut self) -> OfferId {
        let id = OfferId::new(self.counters.next_offer);
        self.counters.next_offer += 1;
        id
    }

    pub(crate) fn allocate_service_id(&mut self) -> ServiceId {
        let id = ServiceId::new(self.counters.next_service);
        self.counters.next_service += 1;
        id
    }

    pub(crate) fn allocate_voucher_id(&mut self) -> VoucherId {
        let id = VoucherId::new(self.counters.next_voucher);
        self.counters.next_voucher += 1;
        id
    }

    pub(crate) fn allocate_event_id(&mut self) -> EventId {
        let id = EventId::new(self.counters.next_event);
        self.counters.next_event += 1;
        id
    }

    pub(crate) fn insert_offer(&mut self, offer: Offer) {
        self.offers.push(offer);
    }

    /// Load the snapshot; `None` when the database holds no snapshot yet.
    pub fn load_from_db(db: &Db) -> anyhow::Result<Option<Self>> {
        let Some(raw) = db.get(K_COUNTERS)? else {
            return Ok(None);
        };
        let counters: Counters = minicbor::decode(raw.as_ref())?;

        let state = Self {
            parties: read_collection(db, K_PARTIES)?,
            services: read_collection(db, K_SERVICES)?,
            offers: read_collection(db, K_OFFERS)?,
            vouchers: read_collection(db, K_VOUCHERS)?,
            events: read_collection(db, K_EVENTS)?,
            levels: read_collection(db, K_LEVELS)?,
            counters,
        };
        tracing::info!(
            parties = state.parties.len(),
            offers = state.offers.len(),
            "market snapshot loaded"
        );
        Ok(Some(state))
    }

    /// Persist the whole snapshot in one atomic batch.
    pub fn save_to_db(&self, db: &Db) -> anyhow::Result<()> {
        let mut batch = Batch::default();
        batch.insert(K_PARTIES, minicbor::to_vec(&self.parties)?);
        batch.insert(K_SERVICES, minicbor::to_vec(&self.services)?);
        batch.insert(K_OFFERS, minicbor::to_vec(&self.offers)?);
        batch.insert(K_VOUCHERS, minicbor::to_vec(&self.vouchers)?);
        batch.insert(K_EVENTS, minicbor::to_vec(&self.events)?);
        batch.insert(K_LEVELS, minicbor::to_vec(&self.levels)?);
        batch.insert(K_COUNTERS, minicbor::to_vec(&self.counters)?);
        db.apply_batch(batch)?;
        tracing::debug!(offers = self.offers.len(), "market snapshot saved");
        Ok(())
    }
}

fn read_collection<T>(db: &Db, key: &[u8]) -> anyhow::Result<Vec<T>>
where
    T: for<'b> minicbor::Decode<'b, ()>,
{
    match db.get(key)? {
        Some(raw) => Ok(minicbor::decode(raw.as_ref())?),
        None => Ok(Vec::new()),
    }
}
