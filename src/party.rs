use crate::types::PartyId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub enum Role {
    #[n(0)]
    Member,
    #[n(1)]
    Administrator,
}

/// A participant in the exchange. Parties are registered by the caller at
/// bootstrap and live for the process lifetime; only the ledger mutates
/// `credits`.
#[derive(Debug, Clone, minicbor::Encode, minicbor::Decode)]
pub struct Party {
    #[n(0)]
    pub id: PartyId,
    #[n(1)]
    pub display_name: String,
    #[n(2)]
    pub role: Role,
    #[n(3)]
    pub credits: i64,
}

impl Party {
    pub fn new(id: PartyId, display_name: impl Into<String>, role: Role, credits: i64) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            role,
            credits,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Administrator
    }
}
