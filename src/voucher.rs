//! Single-use redemption codes issued by an administrator
use chrono::Utc;
use rand::Rng;

use crate::types::{PartyId, TimeStamp, VoucherId};

#[derive(Debug, Clone, minicbor::Encode, minicbor::Decode)]
pub struct Voucher {
    #[n(0)]
    pub id: VoucherId,
    /// 4-digit numeric string, unique among every voucher ever issued.
    #[n(1)]
    pub code: String,
    #[n(2)]
    pub credits: u64,
    #[n(3)]
    pub comment: String,
    #[n(4)]
    pub used: bool,
    #[n(5)]
    pub used_by: Option<PartyId>,
    #[n(6)]
    pub used_at: Option<TimeStamp<Utc>>,
    #[n(7)]
    pub created_at: TimeStamp<Utc>,
}

/// Draw 4-digit codes until one collides with no existing voucher, used
/// or unused. The code space holds 9000 codes, so a collision retries
/// rather than fails.
pub fn draw_code<R: Rng>(rng: &mut R, existing: &[Voucher]) -> String {
    loop {
        let code = rng.gen_range(1000u32..10_000).to_string();
        if !existing.iter().any(|v| v.code == code) {
            return code;
        }
    }
}
