use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::{Cents, MemberId, RoomId};

pub type TreasuryEntryId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreasuryEntryKind {
    /// Money put into the room's fund
    Deposit,
    /// Money spent out of the room's fund
    Withdrawal,
}

impl TreasuryEntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TreasuryEntryKind::Deposit => "deposit",
            TreasuryEntryKind::Withdrawal => "withdrawal",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "deposit" => Some(TreasuryEntryKind::Deposit),
            "withdrawal" => Some(TreasuryEntryKind::Withdrawal),
            _ => None,
        }
    }
}

impl std::fmt::Display for TreasuryEntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreasuryEntry {
    pub id: TreasuryEntryId,
    pub room_id: RoomId,
    pub kind: TreasuryEntryKind,
    /// Always positive; the kind carries the direction
    pub amount_cents: Cents,
    pub description: Option<String>,
    pub recorded_by: MemberId,
    pub recorded_at: DateTime<Utc>,
}

impl TreasuryEntry {
    pub fn new(
        room_id: RoomId,
        kind: TreasuryEntryKind,
        amount_cents: Cents,
        recorded_by: MemberId,
    ) -> Result<Self, TreasuryError> {
        if amount_cents <= 0 {
            return Err(TreasuryError::NonPositiveAmount(amount_cents));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            room_id,
            kind,
            amount_cents,
            description: None,
            recorded_by,
            recorded_at: Utc::now(),
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Effect of this entry on the treasury total.
    pub fn signed_amount(&self) -> Cents {
        match self.kind {
            TreasuryEntryKind::Deposit => self.amount_cents,
            TreasuryEntryKind::Withdrawal => -self.amount_cents,
        }
    }
}

/// Current treasury: deposits minus withdrawals.
pub fn treasury_total(entries: &[TreasuryEntry]) -> Result<Cents, TreasuryError> {
    entries
        .iter()
        .map(TreasuryEntry::signed_amount)
        .try_fold(0, Cents::checked_add)
        .ok_or(TreasuryError::Overflow)
}

/// Check that recording `entry` keeps the treasury at or above zero.
pub fn check_entry(current: Cents, entry: &TreasuryEntry) -> Result<Cents, TreasuryError> {
    let after = current
        .checked_add(entry.signed_amount())
        .ok_or(TreasuryError::Overflow)?;
    if after < 0 {
        return Err(TreasuryError::InsufficientFunds {
            available: current,
            required: entry.amount_cents,
        });
    }
    Ok(after)
}

/// Check that removing `entry` keeps the treasury at or above zero.
pub fn check_removal(current: Cents, entry: &TreasuryEntry) -> Result<Cents, TreasuryError> {
    let after = current
        .checked_sub(entry.signed_amount())
        .ok_or(TreasuryError::Overflow)?;
    if after < 0 {
        return Err(TreasuryError::InsufficientFunds {
            available: current,
            required: entry.amount_cents,
        });
    }
    Ok(after)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreasuryError {
    #[error("Treasury amount must be positive, got {0} cents")]
    NonPositiveAmount(Cents),

    #[error("Treasury holds {available} cents, {required} cents required")]
    InsufficientFunds { available: Cents, required: Cents },

    #[error("Treasury total would be too large to represent")]
    Overflow,
}
