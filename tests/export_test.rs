mod common;

use anyhow::Result;
use common::{Flat, equal_expense, test_service};
use tallyroom::io::Exporter;

#[tokio::test]
async fn test_export_expenses_csv() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let flat = Flat::create(&service).await?;

    equal_expense(&service, &flat.alice, "alice", 900, &["alice", "bob", "carol"]).await?;
    equal_expense(&service, &flat.bob, "bob", 500, &["carol"]).await?;

    let exporter = Exporter::new(&service, &flat.alice);
    let mut buffer = Vec::new();
    let count = exporter
        .export_expenses_csv(Flat::ROOM, &mut buffer)
        .await?;
    assert_eq!(count, 2);

    let csv = String::from_utf8(buffer)?;
    let lines: Vec<&str> = csv.lines().collect();
    // header + one row per split
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("id,sequence,created_at,description"));
    assert!(lines[4].contains(",bob,equal,carol,500,"));

    Ok(())
}

#[tokio::test]
async fn test_export_balances_csv() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let flat = Flat::create(&service).await?;

    equal_expense(&service, &flat.alice, "alice", 9000, &["alice", "bob", "carol"]).await?;

    let exporter = Exporter::new(&service, &flat.carol);
    let mut buffer = Vec::new();
    exporter
        .export_balances_csv(Flat::ROOM, &mut buffer)
        .await?;

    let csv = String::from_utf8(buffer)?;
    assert_eq!(
        csv,
        "member,balance_cents\nalice,6000\nbob,-3000\ncarol,-3000\n"
    );

    Ok(())
}

#[tokio::test]
async fn test_export_full_json_covers_my_rooms() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let flat = Flat::create(&service).await?;

    equal_expense(&service, &flat.alice, "alice", 9000, &["alice", "bob", "carol"]).await?;
    service.deposit(&flat.alice, Flat::ROOM, 2000, None).await?;
    service
        .create_room(&flat.bob, "office".to_string())
        .await?;

    let exporter = Exporter::new(&service, &flat.alice);
    let mut buffer = Vec::new();
    let snapshot = exporter.export_full_json(&mut buffer).await?;

    // alice is not in bob's office
    assert_eq!(snapshot.rooms.len(), 1);
    let room = &snapshot.rooms[0];
    assert_eq!(room.details.room.name, Flat::ROOM);
    assert_eq!(room.expenses.len(), 1);
    assert_eq!(room.treasury.len(), 1);
    assert_eq!(room.simplified_debts.len(), 2);
    assert!(room.duty_roster.is_none());

    let json: serde_json::Value = serde_json::from_slice(&buffer)?;
    assert_eq!(json["exported_by"], "alice");
    assert_eq!(json["rooms"][0]["expenses"][0]["split_method"], "equal");

    Ok(())
}
