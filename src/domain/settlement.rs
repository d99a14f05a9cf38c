use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{BalanceSheet, Cents, LedgerError, MemberId};

/// A payment from a debtor to a creditor that moves both toward zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementTransfer {
    pub from: MemberId,
    pub to: MemberId,
    pub amount_cents: Cents,
}

/// Produce the transfers that settle every balance in the sheet.
///
/// Greedy largest-to-largest pairing: at each step the member owed the most
/// is paid by the member owing the most, for the smaller of the two amounts.
/// At least one of them reaches zero per step, so the result has at most
/// `non_zero_count - 1` transfers. Equal amounts are resolved in sheet order.
pub fn simplify_debts(balances: &BalanceSheet) -> Result<Vec<SettlementTransfer>, SettlementError> {
    // (member, remaining magnitude), kept in sheet order
    let mut creditors: Vec<(MemberId, Cents)> = Vec::new();
    let mut debtors: Vec<(MemberId, Cents)> = Vec::new();

    for (member, balance) in balances.iter() {
        if balance > 0 {
            creditors.push((member, balance));
        } else if balance < 0 {
            let debt = balance
                .checked_neg()
                .ok_or(SettlementError::OutOfRange { member })?;
            debtors.push((member, debt));
        }
    }

    let mut transfers = Vec::new();

    while !creditors.is_empty() && !debtors.is_empty() {
        let ci = largest(&creditors);
        let di = largest(&debtors);

        let amount = creditors[ci].1.min(debtors[di].1);
        transfers.push(SettlementTransfer {
            from: debtors[di].0,
            to: creditors[ci].0,
            amount_cents: amount,
        });

        creditors[ci].1 -= amount;
        debtors[di].1 -= amount;

        // `remove` rather than `swap_remove`: sheet order must survive
        if creditors[ci].1 == 0 {
            creditors.remove(ci);
        }
        if debtors[di].1 == 0 {
            debtors.remove(di);
        }
    }

    if !creditors.is_empty() || !debtors.is_empty() {
        let residual = creditors
            .into_iter()
            .chain(debtors.into_iter().map(|(m, d)| (m, -d)))
            .collect();
        return Err(SettlementError::Unsettled { residual });
    }

    Ok(transfers)
}

/// Index of the largest remaining amount; the first one wins on ties.
fn largest(side: &[(MemberId, Cents)]) -> usize {
    let mut best = 0;
    for (index, (_, amount)) in side.iter().enumerate().skip(1) {
        if *amount > side[best].1 {
            best = index;
        }
    }
    best
}

/// Balances after every transfer has been paid: the payer moves up, the
/// receiver moves down.
pub fn apply_transfers(
    balances: &BalanceSheet,
    transfers: &[SettlementTransfer],
) -> Result<BalanceSheet, LedgerError> {
    let mut sheet = balances.clone();
    for transfer in transfers {
        sheet.credit(transfer.from, transfer.amount_cents)?;
        sheet.debit(transfer.to, transfer.amount_cents)?;
    }
    Ok(sheet)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    /// Credits and debts did not cancel out. This means the balances were
    /// inconsistent before simplification started.
    #[error("Balances cannot be fully settled; {} member(s) left with a residual", .residual.len())]
    Unsettled { residual: Vec<(MemberId, Cents)> },

    #[error("Balance of member {member} is out of range for settlement")]
    OutOfRange { member: MemberId },
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn members<const N: usize>() -> [MemberId; N] {
        std::array::from_fn(|_| Uuid::new_v4())
    }

    fn sheet(entries: &[(MemberId, Cents)]) -> BalanceSheet {
        entries.iter().copied().collect()
    }

    fn transfer(from: MemberId, to: MemberId, amount_cents: Cents) -> SettlementTransfer {
        SettlementTransfer {
            from,
            to,
            amount_cents,
        }
    }

    #[test]
    fn test_empty_sheet_needs_no_transfers() {
        assert_eq!(simplify_debts(&BalanceSheet::new()), Ok(vec![]));
    }

    #[test]
    fn test_one_creditor_two_equal_debtors() {
        let [a, b, c] = members::<3>();
        let balances = sheet(&[(a, 6000), (b, -3000), (c, -3000)]);

        let transfers = simplify_debts(&balances).unwrap();
        assert_eq!(transfers, vec![transfer(b, a, 3000), transfer(c, a, 3000)]);
    }

    #[test]
    fn test_two_creditors_one_debtor() {
        let [a, b, c] = members::<3>();
        let balances = sheet(&[(a, 5000), (b, 2000), (c, -7000)]);

        let transfers = simplify_debts(&balances).unwrap();
        assert_eq!(transfers, vec![transfer(c, a, 5000), transfer(c, b, 2000)]);
    }

    #[test]
    fn test_two_members() {
        let [a, b] = members::<2>();
        let transfers = simplify_debts(&sheet(&[(a, 1000), (b, -1000)])).unwrap();
        assert_eq!(transfers, vec![transfer(b, a, 1000)]);
    }

    #[test]
    fn test_largest_pairs_first() {
        let [a, b, c, d] = members::<4>();
        let balances = sheet(&[(a, 1000), (b, 4000), (c, -2000), (d, -3000)]);

        let transfers = simplify_debts(&balances).unwrap();
        assert_eq!(
            transfers,
            vec![
                transfer(d, b, 3000),
                transfer(c, a, 1000),
                transfer(c, b, 1000)
            ]
        );
        assert!(apply_transfers(&balances, &transfers).unwrap().is_settled());
    }

    #[test]
    fn test_zero_balances_are_ignored() {
        let [a, b, c] = members::<3>();
        let transfers = simplify_debts(&sheet(&[(a, 0), (b, 500), (c, -500)])).unwrap();
        assert_eq!(transfers, vec![transfer(c, b, 500)]);
    }

    #[test]
    fn test_deterministic_output() {
        let [a, b, c, d] = members::<4>();
        let balances = sheet(&[(a, 2500), (b, 2500), (c, -2500), (d, -2500)]);

        let first = simplify_debts(&balances).unwrap();
        let second = simplify_debts(&balances).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, vec![transfer(c, a, 2500), transfer(d, b, 2500)]);
    }

    #[test]
    fn test_unbalanced_input_reports_residual() {
        let [a, b] = members::<2>();
        let result = simplify_debts(&sheet(&[(a, 1500), (b, -1000)]));

        assert_eq!(
            result,
            Err(SettlementError::Unsettled {
                residual: vec![(a, 500)]
            })
        );
    }

    #[test]
    fn test_most_negative_balance_is_out_of_range() {
        let [a, b] = members::<2>();
        let result = simplify_debts(&sheet(&[(a, Cents::MAX), (b, Cents::MIN)]));
        assert_eq!(result, Err(SettlementError::OutOfRange { member: b }));
    }

    #[test]
    fn test_residual_debt_is_negative() {
        let [a, b] = members::<2>();
        let result = simplify_debts(&sheet(&[(a, 100), (b, -400)]));

        assert_eq!(
            result,
            Err(SettlementError::Unsettled {
                residual: vec![(b, -300)]
            })
        );
    }
}
