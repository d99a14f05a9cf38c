use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::RoomService;
use crate::domain::{
    BalanceSheet, DutyRoster, Expense, MemberId, RoomDetails, Session, SettlementTransfer,
    TreasuryEntry,
};

/// Everything recorded in one room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub details: RoomDetails,
    pub expenses: Vec<Expense>,
    pub balances: BalanceSheet,
    pub simplified_debts: Vec<SettlementTransfer>,
    pub treasury: Vec<TreasuryEntry>,
    pub duty_roster: Option<DutyRoster>,
}

/// Snapshot of every room the exporting member belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub exported_by: String,
    pub rooms: Vec<RoomSnapshot>,
}

/// Exporter for converting room data to various formats.
/// Reads go through the service, so the session's permissions apply.
pub struct Exporter<'a> {
    service: &'a RoomService,
    session: &'a Session,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a RoomService, session: &'a Session) -> Self {
        Self { service, session }
    }

    /// Export a room's expenses to CSV, one row per split
    pub async fn export_expenses_csv<W: Write>(&self, room: &str, writer: W) -> Result<usize> {
        let (details, expenses) = self.service.list_expenses(self.session, room).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        let name_of = |id: MemberId| {
            details
                .member_name(id)
                .map(str::to_string)
                .unwrap_or_else(|| id.to_string())
        };

        // Write header
        csv_writer.write_record([
            "id",
            "sequence",
            "created_at",
            "description",
            "total_cents",
            "paid_by",
            "split_method",
            "member",
            "amount_cents",
            "percentage",
            "shares",
        ])?;

        let mut count = 0;
        for expense in &expenses {
            for split in &expense.splits {
                csv_writer.write_record([
                    expense.id.to_string(),
                    expense.sequence.to_string(),
                    expense.created_at.to_rfc3339(),
                    expense.description.clone(),
                    expense.total_cents.to_string(),
                    name_of(expense.paid_by),
                    expense.split_method.as_str().to_string(),
                    name_of(split.member),
                    split.amount_cents.to_string(),
                    split.percentage.map(|p| p.to_string()).unwrap_or_default(),
                    split.shares.map(|s| s.to_string()).unwrap_or_default(),
                ])?;
            }
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export a room's net balances to CSV
    pub async fn export_balances_csv<W: Write>(&self, room: &str, writer: W) -> Result<usize> {
        let balances = self.service.room_balances(self.session, room).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        // Write header
        csv_writer.write_record(["member", "balance_cents"])?;

        let mut count = 0;
        for (member, balance) in balances.raw_balances.iter() {
            csv_writer.write_record([balances.name_of(member), balance.to_string()])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export every room of the session's member as a JSON snapshot
    pub async fn export_full_json<W: Write>(&self, mut writer: W) -> Result<DatabaseSnapshot> {
        let mut rooms = Vec::new();

        for room in self.service.list_my_rooms(self.session).await? {
            let (_, expenses) = self.service.list_expenses(self.session, &room.name).await?;
            let balances = self.service.room_balances(self.session, &room.name).await?;
            let treasury = self.service.treasury(self.session, &room.name).await?;
            let duty_roster = self.service.duty_roster(self.session, &room.name).await?;

            rooms.push(RoomSnapshot {
                details: balances.room,
                expenses,
                balances: balances.raw_balances,
                simplified_debts: balances.simplified_debts,
                treasury: treasury.entries,
                duty_roster,
            });
        }

        let snapshot = DatabaseSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            exported_by: self.session.member.name.clone(),
            rooms,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
