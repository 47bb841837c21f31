use crate::types::{EventId, OfferId, PartyId, ServiceId};

#[derive(thiserror::Error, Debug)]
pub enum MarketError {
    #[error("party {0} not found")]
    PartyNotFound(PartyId),
    #[error("service {0} not found")]
    ServiceNotFound(ServiceId),
    #[error("offer {0} not found")]
    OfferNotFound(OfferId),
    #[error("event {0} not found")]
    EventNotFound(EventId),
    #[error("{0} is not allowed to {1}")]
    Forbidden(PartyId, &'static str),
    #[error("{0}")]
    InvalidState(&'static str),
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: i64 },
    #[error("voucher code is invalid or already used")]
    InvalidOrUsedVoucher,
    #[error("event is already assigned")]
    AlreadyAssigned,
    #[error("amount must be positive")]
    InvalidAmount,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
