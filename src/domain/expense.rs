use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::{
    BasisPoints, Cents, FULL_PERCENTAGE, MemberId, RoomId, allocate_equal, allocate_weighted,
    format_cents,
};

pub type ExpenseId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMethod {
    Equal,
    Unequal,
    Percentage,
    Shares,
}

impl SplitMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitMethod::Equal => "equal",
            SplitMethod::Unequal => "unequal",
            SplitMethod::Percentage => "percentage",
            SplitMethod::Shares => "shares",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "equal" => Some(SplitMethod::Equal),
            "unequal" => Some(SplitMethod::Unequal),
            "percentage" => Some(SplitMethod::Percentage),
            "shares" => Some(SplitMethod::Shares),
            _ => None,
        }
    }
}

impl std::fmt::Display for SplitMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a new expense should be divided, before amounts are allocated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitRequest {
    Equal(Vec<MemberId>),
    Unequal(Vec<(MemberId, Cents)>),
    Percentage(Vec<(MemberId, BasisPoints)>),
    Shares(Vec<(MemberId, i64)>),
}

impl SplitRequest {
    pub fn method(&self) -> SplitMethod {
        match self {
            SplitRequest::Equal(_) => SplitMethod::Equal,
            SplitRequest::Unequal(_) => SplitMethod::Unequal,
            SplitRequest::Percentage(_) => SplitMethod::Percentage,
            SplitRequest::Shares(_) => SplitMethod::Shares,
        }
    }

    pub fn participants(&self) -> Vec<MemberId> {
        match self {
            SplitRequest::Equal(members) => members.clone(),
            SplitRequest::Unequal(parts) => parts.iter().map(|(m, _)| *m).collect(),
            SplitRequest::Percentage(parts) => parts.iter().map(|(m, _)| *m).collect(),
            SplitRequest::Shares(parts) => parts.iter().map(|(m, _)| *m).collect(),
        }
    }

    /// Turn the request into concrete splits that sum exactly to `total_cents`.
    pub fn allocate(&self, total_cents: Cents) -> Result<Vec<Split>, SplitError> {
        if total_cents <= 0 {
            return Err(SplitError::NonPositiveTotal(total_cents));
        }

        let participants = self.participants();
        if participants.is_empty() {
            return Err(SplitError::NoParticipants);
        }
        let mut seen = HashSet::new();
        for member in &participants {
            if !seen.insert(*member) {
                return Err(SplitError::DuplicateParticipant(*member));
            }
        }

        match self {
            SplitRequest::Equal(members) => Ok(members
                .iter()
                .zip(allocate_equal(total_cents, members.len()))
                .map(|(member, amount)| Split::new(*member, amount))
                .collect()),

            SplitRequest::Unequal(parts) => {
                if let Some((member, amount)) = parts.iter().find(|(_, a)| *a <= 0) {
                    return Err(SplitError::NonPositiveShare {
                        member: *member,
                        value: *amount,
                    });
                }
                let actual = checked_sum(parts.iter().map(|(_, a)| *a))
                    .ok_or(SplitError::AmountOverflow)?;
                if actual != total_cents {
                    return Err(SplitError::SplitSumMismatch {
                        expected: total_cents,
                        actual,
                    });
                }
                Ok(parts.iter().map(|(m, a)| Split::new(*m, *a)).collect())
            }

            SplitRequest::Percentage(parts) => {
                if let Some((member, pct)) = parts
                    .iter()
                    .find(|(_, p)| *p < 0 || *p > FULL_PERCENTAGE)
                {
                    return Err(SplitError::InvalidPercentage {
                        member: *member,
                        value: *pct,
                    });
                }
                let actual: BasisPoints = parts.iter().map(|(_, p)| p).sum();
                if actual != FULL_PERCENTAGE {
                    return Err(SplitError::PercentageSumMismatch(actual));
                }
                let weights: Vec<i64> = parts.iter().map(|(_, p)| *p).collect();
                Ok(parts
                    .iter()
                    .zip(allocate_weighted(total_cents, &weights))
                    .map(|((member, pct), amount)| Split::new(*member, amount).with_percentage(*pct))
                    .collect())
            }

            SplitRequest::Shares(parts) => {
                if let Some((member, shares)) = parts.iter().find(|(_, s)| *s <= 0) {
                    return Err(SplitError::NonPositiveShare {
                        member: *member,
                        value: *shares,
                    });
                }
                let weights: Vec<i64> = parts.iter().map(|(_, s)| *s).collect();
                Ok(parts
                    .iter()
                    .zip(allocate_weighted(total_cents, &weights))
                    .map(|((member, shares), amount)| Split::new(*member, amount).with_shares(*shares))
                    .collect())
            }
        }
    }
}

/// One member's part of an expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub member: MemberId,
    /// Amount this member owes for the expense
    pub amount_cents: Cents,
    /// Requested percentage for percentage splits, in hundredths of a percent
    pub percentage: Option<BasisPoints>,
    /// Requested share count for share splits
    pub shares: Option<i64>,
}

impl Split {
    pub fn new(member: MemberId, amount_cents: Cents) -> Self {
        Self {
            member,
            amount_cents,
            percentage: None,
            shares: None,
        }
    }

    pub fn with_percentage(mut self, percentage: BasisPoints) -> Self {
        self.percentage = Some(percentage);
        self
    }

    pub fn with_shares(mut self, shares: i64) -> Self {
        self.shares = Some(shares);
        self
    }
}

/// An expense paid by one member on behalf of the splitters.
/// Expenses are immutable; corrections are made by deleting and re-adding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub room_id: RoomId,
    /// Monotonically increasing sequence number for ordering
    pub sequence: i64,
    pub description: String,
    pub total_cents: Cents,
    pub paid_by: MemberId,
    pub split_method: SplitMethod,
    pub splits: Vec<Split>,
    pub created_by: MemberId,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    /// Build a validated expense. The splits always sum to `total_cents`.
    /// Sequence number must be assigned by the repository.
    pub fn new(
        room_id: RoomId,
        description: impl Into<String>,
        total_cents: Cents,
        paid_by: MemberId,
        request: &SplitRequest,
        created_by: MemberId,
    ) -> Result<Self, SplitError> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(SplitError::MissingDescription);
        }
        let splits = request.allocate(total_cents)?;

        Ok(Self {
            id: Uuid::new_v4(),
            room_id,
            sequence: 0,
            description,
            total_cents,
            paid_by,
            split_method: request.method(),
            splits,
            created_by,
            created_at: Utc::now(),
        })
    }

    /// A settlement is recorded as an expense paid by the debtor whose only
    /// split is the creditor.
    pub fn settlement(
        room_id: RoomId,
        from: MemberId,
        from_name: &str,
        to: MemberId,
        to_name: &str,
        amount_cents: Cents,
        created_by: MemberId,
    ) -> Result<Self, SplitError> {
        Self::new(
            room_id,
            format!(
                "Settlement: {} from {} to {}",
                format_cents(amount_cents),
                from_name,
                to_name
            ),
            amount_cents,
            from,
            &SplitRequest::Unequal(vec![(to, amount_cents)]),
            created_by,
        )
    }

    /// Sum of the split amounts, or `None` if it does not fit in `Cents`.
    pub fn split_total(&self) -> Option<Cents> {
        checked_sum(self.splits.iter().map(|s| s.amount_cents))
    }

    /// Re-check the split invariant, for expenses read back from storage.
    pub fn validate(&self) -> Result<(), SplitError> {
        if self.total_cents <= 0 {
            return Err(SplitError::NonPositiveTotal(self.total_cents));
        }
        if self.splits.is_empty() {
            return Err(SplitError::NoParticipants);
        }
        if let Some(split) = self.splits.iter().find(|s| s.amount_cents < 0) {
            return Err(SplitError::NegativeSplit {
                member: split.member,
                amount: split.amount_cents,
            });
        }
        let actual = self.split_total().ok_or(SplitError::AmountOverflow)?;
        if actual != self.total_cents {
            return Err(SplitError::SplitSumMismatch {
                expected: self.total_cents,
                actual,
            });
        }
        Ok(())
    }

    pub fn owed_by(&self, member: MemberId) -> Cents {
        self.splits
            .iter()
            .find(|s| s.member == member)
            .map_or(0, |s| s.amount_cents)
    }

    pub fn involves(&self, member: MemberId) -> bool {
        self.paid_by == member || self.splits.iter().any(|s| s.member == member)
    }
}

fn checked_sum(amounts: impl IntoIterator<Item = Cents>) -> Option<Cents> {
    amounts.into_iter().try_fold(0, Cents::checked_add)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SplitError {
    #[error("Expense description is required")]
    MissingDescription,

    #[error("Total amount must be positive, got {0} cents")]
    NonPositiveTotal(Cents),

    #[error("At least one member must take part in the split")]
    NoParticipants,

    #[error("Member {0} appears more than once in the split")]
    DuplicateParticipant(MemberId),

    #[error("Split value for member {member} must be positive, got {value}")]
    NonPositiveShare { member: MemberId, value: i64 },

    #[error("Split amounts sum to {actual} cents but the total is {expected} cents")]
    SplitSumMismatch { expected: Cents, actual: Cents },

    #[error("Split amount for member {member} cannot be negative, got {amount} cents")]
    NegativeSplit { member: MemberId, amount: Cents },

    #[error("Split amounts are too large to add up")]
    AmountOverflow,

    #[error("Percentage for member {member} must be between 0 and 100, got {value} hundredths")]
    InvalidPercentage { member: MemberId, value: BasisPoints },

    #[error("Percentages must sum to 100, got {0} hundredths of a percent")]
    PercentageSumMismatch(BasisPoints),
}
