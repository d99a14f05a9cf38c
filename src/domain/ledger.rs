use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Cents, Expense, ExpenseId, MemberId, SplitError};

/// Net position of every member in a room.
///
/// Positive balances are owed to the member, negative balances are owed by
/// the member. Iteration follows insertion order, which makes settlement
/// tie-breaks deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BalanceSheet {
    balances: IndexMap<MemberId, Cents>,
}

impl BalanceSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a sheet with the given members at zero, in the given order.
    pub fn seeded(members: impl IntoIterator<Item = MemberId>) -> Self {
        Self {
            balances: members.into_iter().map(|m| (m, 0)).collect(),
        }
    }

    pub fn credit(&mut self, member: MemberId, amount: Cents) -> Result<(), LedgerError> {
        let balance = self.balances.entry(member).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { member })?;
        Ok(())
    }

    pub fn debit(&mut self, member: MemberId, amount: Cents) -> Result<(), LedgerError> {
        let balance = self.balances.entry(member).or_insert(0);
        *balance = balance
            .checked_sub(amount)
            .ok_or(LedgerError::Overflow { member })?;
        Ok(())
    }

    /// Payer is credited the full total, every splitter is debited their part.
    /// A payer who also splits nets out automatically.
    pub fn apply_expense(&mut self, expense: &Expense) -> Result<(), LedgerError> {
        self.credit(expense.paid_by, expense.total_cents)?;
        for split in &expense.splits {
            self.debit(split.member, split.amount_cents)?;
        }
        Ok(())
    }

    pub fn get(&self, member: MemberId) -> Cents {
        self.balances.get(&member).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MemberId, Cents)> + '_ {
        self.balances.iter().map(|(m, b)| (*m, *b))
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// Sum of all balances, or `None` if it does not fit in `Cents`.
    /// Accumulated wide so that large balances cancelling out still sum to zero.
    pub fn total(&self) -> Option<Cents> {
        let wide: i128 = self.balances.values().map(|b| i128::from(*b)).sum();
        Cents::try_from(wide).ok()
    }

    /// True when every member is at zero.
    pub fn is_settled(&self) -> bool {
        self.balances.values().all(|b| *b == 0)
    }

    pub fn non_zero_count(&self) -> usize {
        self.balances.values().filter(|b| **b != 0).count()
    }

    /// Balances must sum to zero: every expense moves a fixed total between
    /// its payer and its splitters.
    pub fn verify_conservation(&self) -> Result<(), LedgerError> {
        match self.total() {
            Some(0) => Ok(()),
            Some(imbalance) => Err(LedgerError::Unbalanced { imbalance }),
            None => Err(LedgerError::TotalOverflow),
        }
    }
}

/// Builds a sheet from explicit balances; a repeated member keeps the last one.
impl FromIterator<(MemberId, Cents)> for BalanceSheet {
    fn from_iter<T: IntoIterator<Item = (MemberId, Cents)>>(iter: T) -> Self {
        Self {
            balances: iter.into_iter().collect(),
        }
    }
}

/// Compute net balances from an ordered list of expenses.
pub fn compute_balances(expenses: &[Expense]) -> Result<BalanceSheet, LedgerError> {
    compute_balances_for(std::iter::empty(), expenses)
}

/// Compute net balances, listing `members` first (at zero if inactive).
///
/// Every expense is re-validated before it is applied; an expense that slipped
/// past construction with a broken split is reported, not aggregated.
pub fn compute_balances_for(
    members: impl IntoIterator<Item = MemberId>,
    expenses: &[Expense],
) -> Result<BalanceSheet, LedgerError> {
    let mut sheet = BalanceSheet::seeded(members);

    for expense in expenses {
        expense
            .validate()
            .map_err(|source| LedgerError::MalformedExpense {
                expense_id: expense.id,
                source,
            })?;
        sheet.apply_expense(expense)?;
    }

    sheet.verify_conservation()?;
    Ok(sheet)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Expense {expense_id} is malformed: {source}")]
    MalformedExpense {
        expense_id: ExpenseId,
        #[source]
        source: SplitError,
    },

    #[error("Balances do not sum to zero (off by {imbalance} cents)")]
    Unbalanced { imbalance: Cents },

    #[error("Balance of member {member} is too large to represent")]
    Overflow { member: MemberId },

    #[error("Balances are too large to add up")]
    TotalOverflow,
}
