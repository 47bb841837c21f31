//! Balance mutation. These methods are the only code that touches
//! `Party::credits`; everything else goes through them.
use crate::error::MarketError;
use crate::store::MarketState;
use crate::types::PartyId;

impl MarketState {
    pub fn balance(&self, id: &PartyId) -> Result<i64, MarketError> {
        self.party(id)
            .map(|p| p.credits)
            .ok_or_else(|| MarketError::PartyNotFound(id.clone()))
    }

    /// Remove `amount` from a party's balance. Fails with
    /// `InsufficientFunds` when the balance would go negative.
    pub(crate) fn debit(&mut self, id: &PartyId, amount: u64) -> Result<(), MarketError> {
        let party = self
            .party_mut(id)
            .ok_or_else(|| MarketError::PartyNotFound(id.clone()))?;
        if (amount as i64) > party.credits {
            return Err(MarketError::InsufficientFunds {
                needed: amount,
                available: party.credits,
            });
        }
        party.credits -= amount as i64;
        Ok(())
    }

    pub(crate) fn credit_party(&mut self, id: &PartyId, amount: u64) -> Result<(), MarketError> {
        let party = self
            .party_mut(id)
            .ok_or_else(|| MarketError::PartyNotFound(id.clone()))?;
        party.credits += amount as i64;
        Ok(())
    }

    /// Move `amount` from payer to payee. Both legs are validated before
    /// either balance changes, so a settlement is all-or-nothing.
    pub(crate) fn transfer(
        &mut self,
        payer: &PartyId,
        payee: &PartyId,
        amount: u64,
    ) -> Result<(), MarketError> {
        if self.party(payee).is_none() {
            return Err(MarketError::PartyNotFound(payee.clone()));
        }
        self.debit(payer, amount)?;
        self.credit_party(payee, amount)?;
        tracing::debug!(%payer, %payee, amount, "credits transferred");
        Ok(())
    }

    /// Administrative override, bypasses the funds check.
    pub(crate) fn set_balance(&mut self, id: &PartyId, credits: i64) -> Result<(), MarketError> {
        let party = self
            .party_mut(id)
            .ok_or_else(|| MarketError::PartyNotFound(id.clone()))?;
        party.credits = credits;
        Ok(())
    }
}
