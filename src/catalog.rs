//! Service catalog entries. Offers reference these by id and re-resolve
//! at settlement time; a removed service makes the settlement fail.
use crate::store::MarketState;
use crate::types::{PartyId, ServiceId};

#[derive(Debug, Clone, minicbor::Encode, minicbor::Decode)]
pub struct Service {
    #[n(0)]
    pub id: ServiceId,
    #[n(1)]
    pub owner: PartyId,
    #[n(2)]
    pub title: String,
    #[n(3)]
    pub description: String,
    #[n(4)]
    pub category: String,
    #[n(5)]
    pub price: u64,
    #[n(6)]
    pub icon: String,
}

impl MarketState {
    pub fn service(&self, id: ServiceId) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }

    pub fn services_of(&self, owner: &PartyId) -> Vec<&Service> {
        self.services.iter().filter(|s| s.owner == *owner).collect()
    }

    pub(crate) fn insert_service(
        &mut self,
        owner: PartyId,
        title: String,
        description: String,
        category: String,
        price: u64,
        icon: String,
    ) -> ServiceId {
        let id = self.allocate_service_id();
        self.services.push(Service {
            id,
            owner,
            title,
            description,
            category,
            price,
            icon,
        });
        id
    }
}
