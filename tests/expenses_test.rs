mod common;

use anyhow::Result;
use common::{Flat, equal_expense, session, test_service};
use tallyroom::application::{AppError, NewExpense, SplitSpec};
use tallyroom::domain::{
    Cents, LedgerError, SettlementTransfer, SplitError, SplitMethod, parse_cents,
};

fn owed(expense: &tallyroom::domain::Expense) -> Vec<i64> {
    expense.splits.iter().map(|s| s.amount_cents).collect()
}

#[tokio::test]
async fn test_one_payer_three_way_split() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let flat = Flat::create(&service).await?;

    equal_expense(&service, &flat.alice, "alice", 9000, &["alice", "bob", "carol"]).await?;

    let balances = service.room_balances(&flat.bob, Flat::ROOM).await?;
    assert_eq!(balances.raw_balances.get(flat.alice.member_id()), 6000);
    assert_eq!(balances.raw_balances.get(flat.bob.member_id()), -3000);
    assert_eq!(balances.raw_balances.get(flat.carol.member_id()), -3000);

    assert_eq!(
        balances.simplified_debts,
        vec![
            SettlementTransfer {
                from: flat.bob.member_id(),
                to: flat.alice.member_id(),
                amount_cents: 3000,
            },
            SettlementTransfer {
                from: flat.carol.member_id(),
                to: flat.alice.member_id(),
                amount_cents: 3000,
            },
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_two_creditors_one_debtor() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let flat = Flat::create(&service).await?;

    equal_expense(&service, &flat.alice, "alice", 5000, &["carol"]).await?;
    equal_expense(&service, &flat.bob, "bob", 2000, &["carol"]).await?;

    let balances = service.room_balances(&flat.carol, Flat::ROOM).await?;
    let debts: Vec<(String, String, i64)> = balances
        .simplified_debts
        .iter()
        .map(|t| (balances.name_of(t.from), balances.name_of(t.to), t.amount_cents))
        .collect();

    assert_eq!(
        debts,
        vec![
            ("carol".to_string(), "alice".to_string(), 5000),
            ("carol".to_string(), "bob".to_string(), 2000),
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_balances_list_every_member_in_join_order() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let flat = Flat::create(&service).await?;

    equal_expense(&service, &flat.carol, "carol", 1000, &["bob"]).await?;

    let balances = service.room_balances(&flat.alice, Flat::ROOM).await?;
    let entries: Vec<(String, i64)> = balances
        .raw_balances
        .iter()
        .map(|(m, b)| (balances.name_of(m), b))
        .collect();

    assert_eq!(
        entries,
        vec![
            ("alice".to_string(), 0),
            ("bob".to_string(), -1000),
            ("carol".to_string(), 1000),
        ]
    );
    assert_eq!(balances.simplified_debts.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_empty_room_is_settled() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let flat = Flat::create(&service).await?;

    let balances = service.room_balances(&flat.alice, Flat::ROOM).await?;
    assert!(balances.raw_balances.is_settled());
    assert!(balances.simplified_debts.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_equal_split_remainder_goes_to_first_members() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let flat = Flat::create(&service).await?;

    let expense =
        equal_expense(&service, &flat.alice, "alice", 1000, &["alice", "bob", "carol"]).await?;

    assert_eq!(owed(&expense), vec![334, 333, 333]);
    assert_eq!(expense.split_total(), Some(1000));

    Ok(())
}

#[tokio::test]
async fn test_unequal_percentage_and_share_splits() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let flat = Flat::create(&service).await?;

    let unequal = service
        .add_expense(
            &flat.alice,
            Flat::ROOM,
            NewExpense {
                description: "concert".to_string(),
                total_cents: 10000,
                paid_by: "alice".to_string(),
                split: SplitSpec::Unequal(vec![
                    ("bob".to_string(), 6000),
                    ("carol".to_string(), 4000),
                ]),
            },
        )
        .await?;
    assert_eq!(unequal.split_method, SplitMethod::Unequal);
    assert_eq!(owed(&unequal), vec![6000, 4000]);

    let percentage = service
        .add_expense(
            &flat.bob,
            Flat::ROOM,
            NewExpense {
                description: "rent".to_string(),
                total_cents: 1000,
                paid_by: "bob".to_string(),
                split: SplitSpec::Percentage(vec![
                    ("alice".to_string(), 3334),
                    ("bob".to_string(), 3333),
                    ("carol".to_string(), 3333),
                ]),
            },
        )
        .await?;
    assert_eq!(owed(&percentage), vec![334, 333, 333]);
    assert_eq!(percentage.splits[0].percentage, Some(3334));

    let shares = service
        .add_expense(
            &flat.carol,
            Flat::ROOM,
            NewExpense {
                description: "pizza".to_string(),
                total_cents: 1000,
                paid_by: "carol".to_string(),
                split: SplitSpec::Shares(vec![
                    ("alice".to_string(), 2),
                    ("bob".to_string(), 1),
                    ("carol".to_string(), 1),
                ]),
            },
        )
        .await?;
    assert_eq!(owed(&shares), vec![500, 250, 250]);

    // Reading back preserves method and split details
    let (_, stored) = service.list_expenses(&flat.alice, Flat::ROOM).await?;
    assert_eq!(stored.len(), 3);
    assert_eq!(stored[1].split_method, SplitMethod::Percentage);
    assert_eq!(stored[2].splits[0].shares, Some(2));
    assert!(stored.windows(2).all(|w| w[0].sequence < w[1].sequence));

    let balances = service.room_balances(&flat.alice, Flat::ROOM).await?;
    assert_eq!(balances.raw_balances.total(), Some(0));

    Ok(())
}

#[tokio::test]
async fn test_invalid_splits_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let flat = Flat::create(&service).await?;

    let result = service
        .add_expense(
            &flat.alice,
            Flat::ROOM,
            NewExpense {
                description: "short".to_string(),
                total_cents: 1000,
                paid_by: "alice".to_string(),
                split: SplitSpec::Unequal(vec![("bob".to_string(), 900)]),
            },
        )
        .await;
    assert!(matches!(
        result,
        Err(AppError::Split(SplitError::SplitSumMismatch {
            expected: 1000,
            actual: 900
        }))
    ));

    let result = service
        .add_expense(
            &flat.alice,
            Flat::ROOM,
            NewExpense {
                description: "over".to_string(),
                total_cents: 1000,
                paid_by: "alice".to_string(),
                split: SplitSpec::Percentage(vec![
                    ("alice".to_string(), 6000),
                    ("bob".to_string(), 5000),
                ]),
            },
        )
        .await;
    assert!(matches!(
        result,
        Err(AppError::Split(SplitError::PercentageSumMismatch(11000)))
    ));

    let result = equal_expense(&service, &flat.alice, "alice", 0, &["bob"]).await;
    assert!(result.is_err());

    let result = equal_expense(&service, &flat.alice, "alice", 1000, &[]).await;
    assert!(result.is_err());

    let (_, stored) = service.list_expenses(&flat.alice, Flat::ROOM).await?;
    assert!(stored.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_participants_must_be_room_members() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let flat = Flat::create(&service).await?;
    session(&service, "dave").await?;

    let result = service
        .add_expense(
            &flat.alice,
            Flat::ROOM,
            NewExpense {
                description: "lunch".to_string(),
                total_cents: 1000,
                paid_by: "alice".to_string(),
                split: SplitSpec::Equal(vec!["alice".to_string(), "dave".to_string()]),
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::NotRoomMember { .. })));

    let result = service
        .add_expense(
            &flat.alice,
            Flat::ROOM,
            NewExpense {
                description: "lunch".to_string(),
                total_cents: 1000,
                paid_by: "dave".to_string(),
                split: SplitSpec::Equal(vec!["alice".to_string()]),
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::NotRoomMember { .. })));

    Ok(())
}

#[tokio::test]
async fn test_delete_expense_permissions() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let flat = Flat::create(&service).await?;

    // Recorded by carol, paid by bob
    let expense = equal_expense(&service, &flat.carol, "bob", 600, &["bob", "carol"]).await?;

    // carol neither recorded nor paid this one
    let other = equal_expense(&service, &flat.bob, "bob", 400, &["bob", "alice"]).await?;
    let result = service.delete_expense(&flat.carol, other.id).await;
    assert!(matches!(result, Err(AppError::PermissionDenied(_))));

    // creator
    service.delete_expense(&flat.carol, expense.id).await?;
    // admin
    service.delete_expense(&flat.alice, other.id).await?;

    let result = service.delete_expense(&flat.alice, other.id).await;
    assert!(matches!(result, Err(AppError::ExpenseNotFound(_))));

    let balances = service.room_balances(&flat.alice, Flat::ROOM).await?;
    assert!(balances.raw_balances.is_settled());

    Ok(())
}

#[tokio::test]
async fn test_payer_can_delete_expense() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let flat = Flat::create(&service).await?;

    let expense = equal_expense(&service, &flat.carol, "bob", 600, &["bob", "carol"]).await?;
    service.delete_expense(&flat.bob, expense.id).await?;

    let (_, stored) = service.list_expenses(&flat.bob, Flat::ROOM).await?;
    assert!(stored.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_settle_debt_records_expense() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let flat = Flat::create(&service).await?;

    equal_expense(&service, &flat.alice, "alice", 9000, &["alice", "bob", "carol"]).await?;

    let settlement = service
        .settle_debt(&flat.bob, Flat::ROOM, "bob", "alice", 3000)
        .await?;
    assert_eq!(settlement.description, "Settlement: 30.00 from bob to alice");
    assert_eq!(settlement.split_method, SplitMethod::Unequal);
    assert_eq!(settlement.paid_by, flat.bob.member_id());
    assert_eq!(settlement.splits.len(), 1);
    assert_eq!(settlement.splits[0].member, flat.alice.member_id());

    let balances = service.room_balances(&flat.alice, Flat::ROOM).await?;
    assert_eq!(balances.raw_balances.get(flat.bob.member_id()), 0);
    assert_eq!(balances.raw_balances.get(flat.alice.member_id()), 3000);
    assert_eq!(balances.simplified_debts.len(), 1);

    // An admin may record it on carol's behalf
    service
        .settle_debt(&flat.alice, Flat::ROOM, "carol", "alice", 3000)
        .await?;
    let balances = service.room_balances(&flat.alice, Flat::ROOM).await?;
    assert!(balances.raw_balances.is_settled());
    assert!(balances.simplified_debts.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_settle_debt_permissions() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let flat = Flat::create(&service).await?;

    equal_expense(&service, &flat.alice, "alice", 2000, &["alice", "bob"]).await?;

    let result = service
        .settle_debt(&flat.carol, Flat::ROOM, "bob", "alice", 1000)
        .await;
    assert!(matches!(result, Err(AppError::PermissionDenied(_))));

    let result = service
        .settle_debt(&flat.bob, Flat::ROOM, "bob", "bob", 1000)
        .await;
    assert!(matches!(result, Err(AppError::SelfSettlement)));

    let result = service
        .settle_debt(&flat.bob, Flat::ROOM, "bob", "alice", 0)
        .await;
    assert!(matches!(
        result,
        Err(AppError::Split(SplitError::NonPositiveTotal(0)))
    ));

    Ok(())
}

#[tokio::test]
async fn test_unequal_split_that_wraps_around_is_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let flat = Flat::create(&service).await?;
    let max = parse_cents("92233720368547758.07")?;
    assert_eq!(max, Cents::MAX);

    let input = NewExpense {
        description: "Wraps around".to_string(),
        total_cents: 100,
        paid_by: "alice".to_string(),
        split: SplitSpec::Unequal(vec![
            ("alice".to_string(), max),
            ("bob".to_string(), max),
            ("carol".to_string(), 102),
        ]),
    };
    let result = service.add_expense(&flat.alice, Flat::ROOM, input).await;
    assert!(matches!(
        result,
        Err(AppError::Split(SplitError::AmountOverflow))
    ));

    let (_, expenses) = service.list_expenses(&flat.alice, Flat::ROOM).await?;
    assert!(expenses.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_expense_overflowing_balances_is_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let flat = Flat::create(&service).await?;

    let huge = || NewExpense {
        description: "Huge".to_string(),
        total_cents: Cents::MAX,
        paid_by: "alice".to_string(),
        split: SplitSpec::Equal(vec!["bob".to_string()]),
    };
    service.add_expense(&flat.alice, Flat::ROOM, huge()).await?;

    let result = service.add_expense(&flat.alice, Flat::ROOM, huge()).await;
    assert!(matches!(
        result,
        Err(AppError::Ledger(LedgerError::Overflow { member })) if member == flat.alice.member_id()
    ));

    // The room stays readable with the first expense only
    let balances = service.room_balances(&flat.alice, Flat::ROOM).await?;
    assert_eq!(balances.raw_balances.get(flat.alice.member_id()), Cents::MAX);
    assert_eq!(balances.raw_balances.get(flat.bob.member_id()), -Cents::MAX);
    assert_eq!(balances.simplified_debts.len(), 1);

    Ok(())
}
