use thiserror::Error;

use crate::domain::{Cents, DutyError, LedgerError, SettlementError, SplitError, TreasuryError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Member not found: {0}")]
    MemberNotFound(String),

    #[error("Member already exists: {0}")]
    MemberAlreadyExists(String),

    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("Room already exists: {0}")]
    RoomAlreadyExists(String),

    #[error("Expense not found: {0}")]
    ExpenseNotFound(String),

    #[error("Treasury entry not found: {0}")]
    TreasuryEntryNotFound(String),

    #[error("{member} is not a member of room {room}")]
    NotRoomMember { member: String, room: String },

    #[error("{member} is already a member of room {room}")]
    AlreadyRoomMember { member: String, room: String },

    #[error("Only an admin of room {0} can do this")]
    AdminRequired(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("{member} still has a balance of {balance} cents in room {room}")]
    OutstandingBalance {
        member: String,
        room: String,
        balance: Cents,
    },

    #[error("The last admin cannot leave room {0} while other members remain")]
    LastAdmin(String),

    #[error("A member cannot settle a debt with themselves")]
    SelfSettlement,

    #[error("No duties configured for room {0}")]
    DutiesNotConfigured(String),

    #[error("Invalid expense: {0}")]
    Split(#[from] SplitError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Settlement(#[from] SettlementError),

    #[error("Treasury: {0}")]
    Treasury(#[from] TreasuryError),

    #[error("Duty roster: {0}")]
    Duty(#[from] DutyError),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
