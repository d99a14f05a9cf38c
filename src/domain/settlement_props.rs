//! Property-based tests for split allocation, balance aggregation, debt
//! simplification and duty rotation.

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use uuid::Uuid;

use super::{
    BalanceSheet, Cents, DutyRoster, Expense, FULL_PERCENTAGE, MemberId, SplitRequest,
    allocate_equal, allocate_weighted, apply_transfers, compute_balances, compute_balances_for,
    simplify_debts,
};

#[derive(Debug, Clone, Copy)]
enum Method {
    Equal,
    Unequal,
    Percentage,
    Shares,
}

fn method() -> impl Strategy<Value = Method> {
    prop_oneof![
        Just(Method::Equal),
        Just(Method::Unequal),
        Just(Method::Percentage),
        Just(Method::Shares),
    ]
}

/// A valid request of the given method over `members`, driven by `weights`
/// (one positive weight per member).
fn split_request(
    method: Method,
    members: &[MemberId],
    weights: &[i64],
    total: Cents,
) -> SplitRequest {
    let weights = &weights[..members.len()];
    match method {
        Method::Equal => SplitRequest::Equal(members.to_vec()),
        Method::Unequal => {
            // One cent each up front keeps every amount positive
            let spread = total - members.len() as Cents;
            let amounts = allocate_weighted(spread, weights);
            SplitRequest::Unequal(
                members
                    .iter()
                    .zip(amounts)
                    .map(|(m, a)| (*m, a + 1))
                    .collect(),
            )
        }
        Method::Percentage => {
            let percentages = allocate_weighted(FULL_PERCENTAGE, weights);
            SplitRequest::Percentage(members.iter().copied().zip(percentages).collect())
        }
        Method::Shares => {
            SplitRequest::Shares(members.iter().copied().zip(weights.iter().copied()).collect())
        }
    }
}

/// A generated expense: payer index, total, split method, participant
/// indices and per-member weights.
#[derive(Debug, Clone)]
struct ExpenseShape {
    payer: usize,
    total: Cents,
    method: Method,
    participants: Vec<usize>,
    weights: Vec<i64>,
}

fn expense_shape(members: usize) -> impl Strategy<Value = ExpenseShape> {
    (
        0..members,
        // At least a cent per participant for unequal splits
        (members as i64)..1_000_000,
        method(),
        prop::sample::subsequence((0..members).collect::<Vec<_>>(), 1..=members),
        prop::collection::vec(1i64..100, members),
    )
        .prop_map(|(payer, total, method, participants, weights)| ExpenseShape {
            payer,
            total,
            method,
            participants,
            weights,
        })
}

/// 2 to 8 members with up to 20 expenses between them.
fn room() -> impl Strategy<Value = (usize, Vec<ExpenseShape>)> {
    (2usize..=8).prop_flat_map(|members| {
        (
            Just(members),
            prop::collection::vec(expense_shape(members), 0..20),
        )
    })
}

fn build(members: usize, shapes: &[ExpenseShape]) -> (Vec<MemberId>, Vec<Expense>) {
    let ids: Vec<MemberId> = (0..members).map(|_| Uuid::new_v4()).collect();
    let expenses = shapes
        .iter()
        .map(|shape| {
            let participants: Vec<MemberId> =
                shape.participants.iter().map(|i| ids[*i]).collect();
            let request =
                split_request(shape.method, &participants, &shape.weights, shape.total);
            Expense::new(
                Uuid::nil(),
                "generated",
                shape.total,
                ids[shape.payer],
                &request,
                ids[shape.payer],
            )
            .unwrap()
        })
        .collect();
    (ids, expenses)
}

/// Balances that sum to zero, built directly.
fn zero_sum_sheet() -> impl Strategy<Value = BalanceSheet> {
    prop::collection::vec(-100_000i64..100_000, 1..12).prop_map(|mut amounts| {
        let total: Cents = amounts.iter().sum();
        amounts.push(-total);
        amounts.into_iter().map(|a| (Uuid::new_v4(), a)).collect()
    })
}

/// Rotation size, duty count, start offset, day offset and who is skipped.
fn rotation() -> impl Strategy<Value = (usize, usize, i64, i64, Vec<bool>)> {
    (1usize..=8).prop_flat_map(|members| {
        (
            Just(members),
            1..=members,
            -1_000i64..1_000,
            -2_000i64..2_000,
            prop::collection::vec(any::<bool>(), members),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Balances computed from valid expenses always sum to zero, whatever
    /// split methods were used.
    #[test]
    fn prop_balances_sum_to_zero((members, shapes) in room()) {
        let (_, expenses) = build(members, &shapes);
        let sheet = compute_balances(&expenses).unwrap();
        prop_assert_eq!(sheet.total(), Some(0));
    }

    /// Seeding with members never changes any balance.
    #[test]
    fn prop_seeding_keeps_balances((members, shapes) in room()) {
        let (ids, expenses) = build(members, &shapes);
        let plain = compute_balances(&expenses).unwrap();
        let seeded = compute_balances_for(ids.iter().copied(), &expenses).unwrap();

        prop_assert_eq!(seeded.len(), members);
        for id in &ids {
            prop_assert_eq!(plain.get(*id), seeded.get(*id));
        }
    }

    /// Every split method allocates exactly the total, never a negative part.
    #[test]
    fn prop_split_allocation_sums_to_total(
        method in method(),
        count in 1usize..12,
        extra in 0i64..1_000_000_000_000,
        weights in prop::collection::vec(1i64..10_000, 12),
    ) {
        let members: Vec<MemberId> = (0..count).map(|_| Uuid::new_v4()).collect();
        let total = count as Cents + extra;
        let splits = split_request(method, &members, &weights, total)
            .allocate(total)
            .unwrap();

        prop_assert_eq!(splits.len(), count);
        prop_assert_eq!(splits.iter().map(|s| s.amount_cents).sum::<Cents>(), total);
        prop_assert!(splits.iter().all(|s| s.amount_cents >= 0));
        for (split, member) in splits.iter().zip(&members) {
            prop_assert_eq!(split.member, *member);
        }
    }

    /// Applying the simplified transfers settles everyone.
    #[test]
    fn prop_transfers_settle_all(sheet in zero_sum_sheet()) {
        let transfers = simplify_debts(&sheet).unwrap();
        prop_assert!(apply_transfers(&sheet, &transfers).unwrap().is_settled());
    }

    /// Every transfer is positive, goes debtor to creditor, and there are at
    /// most `non_zero - 1` of them.
    #[test]
    fn prop_transfers_are_few_and_well_directed(sheet in zero_sum_sheet()) {
        let transfers = simplify_debts(&sheet).unwrap();

        let non_zero = sheet.non_zero_count();
        prop_assert!(transfers.len() <= non_zero.saturating_sub(1));
        for t in &transfers {
            prop_assert!(t.amount_cents > 0);
            prop_assert!(sheet.get(t.from) < 0);
            prop_assert!(sheet.get(t.to) > 0);
            prop_assert_ne!(t.from, t.to);
        }
    }

    /// Simplifying is deterministic, and simplifying a settled sheet yields
    /// nothing.
    #[test]
    fn prop_simplify_deterministic_and_idempotent(sheet in zero_sum_sheet()) {
        let first = simplify_debts(&sheet).unwrap();
        let second = simplify_debts(&sheet).unwrap();
        prop_assert_eq!(&first, &second);

        let settled = apply_transfers(&sheet, &first).unwrap();
        prop_assert!(simplify_debts(&settled).unwrap().is_empty());
    }

    /// A sheet that does not sum to zero is reported, never silently settled.
    #[test]
    fn prop_unbalanced_sheet_is_reported(
        sheet in zero_sum_sheet(),
        skew in prop_oneof![-10_000i64..0, 1i64..10_000],
    ) {
        let mut skewed = sheet.clone();
        skewed.credit(Uuid::new_v4(), skew).unwrap();
        prop_assert!(simplify_debts(&skewed).is_err());
    }

    /// Equal allocation always sums to the total and differs by at most a cent.
    #[test]
    fn prop_equal_allocation_sums(total in 1i64..10_000_000, count in 1usize..50) {
        let parts = allocate_equal(total, count);
        prop_assert_eq!(parts.iter().sum::<Cents>(), total);
        let max = parts.iter().max().copied().unwrap_or(0);
        let min = parts.iter().min().copied().unwrap_or(0);
        prop_assert!(max - min <= 1);
    }

    /// On any day, assigned members are distinct and eligible, and only the
    /// duties beyond the eligible head count stay open.
    #[test]
    fn prop_duty_assignment_distinct_eligible(
        (members, duties, start_offset, day_offset, skipped) in rotation(),
    ) {
        let epoch = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let start = epoch + Duration::days(start_offset);
        let day = epoch + Duration::days(day_offset);

        let ids: Vec<MemberId> = (0..members).map(|_| Uuid::new_v4()).collect();
        let names = (0..duties).map(|i| format!("duty {}", i)).collect();
        let mut roster = DutyRoster::new(Uuid::nil(), names, ids.clone(), start).unwrap();
        for (id, skip) in ids.iter().zip(&skipped) {
            if *skip {
                roster.skip(*id, day).unwrap();
            }
        }

        let eligible = roster.eligible_on(day);
        let assignments = roster.assignments_on(day);
        prop_assert_eq!(assignments.len(), duties);

        let mut seen = std::collections::HashSet::new();
        for (i, assignment) in assignments.iter().enumerate() {
            match assignment.member {
                Some(member) => {
                    prop_assert!(i < eligible.len());
                    prop_assert!(eligible.contains(&member));
                    prop_assert!(!roster.is_skipped(member, day));
                    prop_assert!(seen.insert(member));
                }
                None => prop_assert!(i >= eligible.len()),
            }
        }
        prop_assert_eq!(seen.len(), duties.min(eligible.len()));
    }
}
