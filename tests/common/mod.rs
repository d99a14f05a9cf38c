// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use tallyroom::application::{NewExpense, RoomService, SplitSpec};
use tallyroom::domain::{Cents, Expense, Role, Session};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(RoomService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = RoomService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Register a member and open a session for them
pub async fn session(service: &RoomService, name: &str) -> Result<Session> {
    service.register_member(name.to_string(), None).await?;
    Ok(service.session_for(name).await?)
}

/// Test fixture: a room "flat" with alice as admin and bob and carol as members
pub struct Flat {
    pub alice: Session,
    pub bob: Session,
    pub carol: Session,
}

impl Flat {
    pub const ROOM: &'static str = "flat";

    pub async fn create(service: &RoomService) -> Result<Self> {
        let alice = session(service, "alice").await?;
        let bob = session(service, "bob").await?;
        let carol = session(service, "carol").await?;

        service.create_room(&alice, Self::ROOM.to_string()).await?;
        service
            .add_member(&alice, Self::ROOM, "bob", Role::Member)
            .await?;
        service.join_room(&carol, Self::ROOM).await?;

        Ok(Self { alice, bob, carol })
    }
}

/// Record an expense split equally among the named members
pub async fn equal_expense(
    service: &RoomService,
    session: &Session,
    paid_by: &str,
    total_cents: Cents,
    among: &[&str],
) -> Result<Expense> {
    let input = NewExpense {
        description: format!("paid by {}", paid_by),
        total_cents,
        paid_by: paid_by.to_string(),
        split: SplitSpec::Equal(among.iter().map(|s| s.to_string()).collect()),
    };
    Ok(service.add_expense(session, Flat::ROOM, input).await?)
}
