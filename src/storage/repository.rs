use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::domain::{
    Cents, DutyRoster, DutySkip, Expense, ExpenseId, Member, MemberId, Role, Room, RoomDetails,
    RoomId, RoomMember, Split, SplitMethod, TreasuryEntry, TreasuryEntryId, TreasuryEntryKind,
    TreasuryError, check_entry, check_removal,
};

use super::{MIGRATION_001_INITIAL, MIGRATION_002_DUTIES};

/// Outcome of a treasury write that had to respect the current total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreasuryWrite {
    /// The write happened; the treasury now holds `total`.
    Applied { total: Cents },
    /// The write was refused and nothing changed.
    Rejected(TreasuryError),
}

/// Counts used by `check`.
#[derive(Debug, Clone)]
pub struct IntegrityStats {
    pub member_count: i64,
    pub room_count: i64,
    pub expense_count: i64,
    pub has_sequence_gaps: bool,
    pub orphan_splits: i64,
}

/// Repository for persisting and querying rooms, expenses, treasury and duties.
pub struct Repository {
    pool: SqlitePool,
}

const EXPENSE_COLUMNS: &str = "id, room_id, sequence, description, total_cents, paid_by, split_method, created_by, created_at";

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations. Every migration is idempotent.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        sqlx::query(MIGRATION_002_DUTIES)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 002")?;

        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Member operations
    // ========================

    pub async fn save_member(&self, member: &Member) -> Result<()> {
        sqlx::query("INSERT INTO members (id, name, email, created_at) VALUES (?, ?, ?, ?)")
            .bind(member.id.to_string())
            .bind(&member.name)
            .bind(&member.email)
            .bind(member.created_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .context("Failed to save member")?;
        Ok(())
    }

    pub async fn get_member(&self, id: MemberId) -> Result<Option<Member>> {
        let row = sqlx::query("SELECT id, name, email, created_at FROM members WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch member")?;

        row.as_ref().map(Self::row_to_member).transpose()
    }

    pub async fn get_member_by_name(&self, name: &str) -> Result<Option<Member>> {
        let row = sqlx::query("SELECT id, name, email, created_at FROM members WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch member by name")?;

        row.as_ref().map(Self::row_to_member).transpose()
    }

    pub async fn list_members(&self) -> Result<Vec<Member>> {
        let rows = sqlx::query("SELECT id, name, email, created_at FROM members ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list members")?;

        rows.iter().map(Self::row_to_member).collect()
    }

    fn row_to_member(row: &sqlx::sqlite::SqliteRow) -> Result<Member> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(Member {
            id: Uuid::parse_str(&id_str).context("Invalid member ID")?,
            name: row.get("name"),
            email: row.get("email"),
            created_at: parse_timestamp(&created_at_str)?,
        })
    }

    // ========================
    // Room operations
    // ========================

    /// Save a room and seat its creator as admin, atomically.
    pub async fn save_room(&self, room: &Room) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query("INSERT INTO rooms (id, name, created_by, created_at) VALUES (?, ?, ?, ?)")
            .bind(room.id.to_string())
            .bind(&room.name)
            .bind(room.created_by.to_string())
            .bind(room.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await
            .context("Failed to save room")?;

        sqlx::query(
            "INSERT INTO room_members (room_id, member_id, role, joined_at) VALUES (?, ?, ?, ?)",
        )
        .bind(room.id.to_string())
        .bind(room.created_by.to_string())
        .bind(Role::Admin.as_str())
        .bind(room.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .context("Failed to seat room creator")?;

        tx.commit().await.context("Failed to commit room")?;
        Ok(())
    }

    pub async fn get_room(&self, id: RoomId) -> Result<Option<Room>> {
        let row = sqlx::query("SELECT id, name, created_by, created_at FROM rooms WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch room")?;

        row.as_ref().map(Self::row_to_room).transpose()
    }

    pub async fn get_room_by_name(&self, name: &str) -> Result<Option<Room>> {
        let row = sqlx::query("SELECT id, name, created_by, created_at FROM rooms WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch room by name")?;

        row.as_ref().map(Self::row_to_room).transpose()
    }

    pub async fn list_rooms(&self) -> Result<Vec<Room>> {
        let rows = sqlx::query("SELECT id, name, created_by, created_at FROM rooms ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list rooms")?;

        rows.iter().map(Self::row_to_room).collect()
    }

    /// Rooms the member belongs to, by name.
    pub async fn list_rooms_for_member(&self, member_id: MemberId) -> Result<Vec<Room>> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.name, r.created_by, r.created_at
            FROM rooms r
            JOIN room_members rm ON rm.room_id = r.id
            WHERE rm.member_id = ?
            ORDER BY r.name
            "#,
        )
        .bind(member_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list rooms for member")?;

        rows.iter().map(Self::row_to_room).collect()
    }

    /// Members of a room in join order.
    pub async fn list_room_members(&self, room_id: RoomId) -> Result<Vec<RoomMember>> {
        let rows = sqlx::query(
            r#"
            SELECT m.id, m.name, m.email, m.created_at, rm.role, rm.joined_at
            FROM room_members rm
            JOIN members m ON m.id = rm.member_id
            WHERE rm.room_id = ?
            ORDER BY rm.rowid
            "#,
        )
        .bind(room_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list room members")?;

        rows.iter()
            .map(|row| {
                let role_str: String = row.get("role");
                let joined_at_str: String = row.get("joined_at");
                Ok(RoomMember {
                    member: Self::row_to_member(row)?,
                    role: Role::from_str(&role_str)
                        .ok_or_else(|| anyhow::anyhow!("Invalid role: {}", role_str))?,
                    joined_at: parse_timestamp(&joined_at_str)?,
                })
            })
            .collect()
    }

    pub async fn get_room_details(&self, id: RoomId) -> Result<Option<RoomDetails>> {
        let Some(room) = self.get_room(id).await? else {
            return Ok(None);
        };
        let members = self.list_room_members(id).await?;
        Ok(Some(RoomDetails { room, members }))
    }

    pub async fn add_room_member(&self, room_id: RoomId, member_id: MemberId, role: Role) -> Result<()> {
        sqlx::query(
            "INSERT INTO room_members (room_id, member_id, role, joined_at) VALUES (?, ?, ?, ?)",
        )
        .bind(room_id.to_string())
        .bind(member_id.to_string())
        .bind(role.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to add room member")?;
        Ok(())
    }

    /// Remove a member from a room and from its duty rotation, atomically.
    pub async fn remove_room_member(&self, room_id: RoomId, member_id: MemberId) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM room_members WHERE room_id = ? AND member_id = ?")
            .bind(room_id.to_string())
            .bind(member_id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to remove room member")?;

        Self::drop_from_rotation(&mut tx, room_id, member_id).await?;

        tx.commit().await.context("Failed to commit member removal")?;
        Ok(())
    }

    pub async fn update_member_role(&self, room_id: RoomId, member_id: MemberId, role: Role) -> Result<()> {
        sqlx::query("UPDATE room_members SET role = ? WHERE room_id = ? AND member_id = ?")
            .bind(role.as_str())
            .bind(room_id.to_string())
            .bind(member_id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to update member role")?;
        Ok(())
    }

    /// Delete a room and everything recorded in it.
    pub async fn delete_room(&self, room_id: RoomId) -> Result<()> {
        let id = room_id.to_string();
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        for statement in [
            "DELETE FROM duty_skips WHERE room_id = ?",
            "DELETE FROM duty_rosters WHERE room_id = ?",
            "DELETE FROM treasury_entries WHERE room_id = ?",
            "DELETE FROM expense_splits WHERE expense_id IN (SELECT id FROM expenses WHERE room_id = ?)",
            "DELETE FROM expenses WHERE room_id = ?",
            "DELETE FROM room_members WHERE room_id = ?",
            "DELETE FROM rooms WHERE id = ?",
        ] {
            sqlx::query(statement)
                .bind(&id)
                .execute(&mut *tx)
                .await
                .context("Failed to delete room data")?;
        }

        tx.commit().await.context("Failed to commit room deletion")?;
        Ok(())
    }

    fn row_to_room(row: &sqlx::sqlite::SqliteRow) -> Result<Room> {
        let id_str: String = row.get("id");
        let created_by_str: String = row.get("created_by");
        let created_at_str: String = row.get("created_at");

        Ok(Room {
            id: Uuid::parse_str(&id_str).context("Invalid room ID")?,
            name: row.get("name"),
            created_by: Uuid::parse_str(&created_by_str).context("Invalid room creator ID")?,
            created_at: parse_timestamp(&created_at_str)?,
        })
    }

    // ========================
    // Expense operations
    // ========================

    /// Save a new expense with its splits.
    /// Automatically assigns the next sequence number.
    pub async fn save_expense(&self, expense: &mut Expense) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let row = sqlx::query(
            r#"
            UPDATE sequence_counter
            SET value = value + 1
            WHERE name = 'expense_sequence'
            RETURNING value
            "#,
        )
        .fetch_one(&mut *tx)
        .await
        .context("Failed to get next sequence number")?;
        expense.sequence = row.get("value");

        sqlx::query(
            r#"
            INSERT INTO expenses (id, room_id, sequence, description, total_cents, paid_by, split_method, created_by, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(expense.id.to_string())
        .bind(expense.room_id.to_string())
        .bind(expense.sequence)
        .bind(&expense.description)
        .bind(expense.total_cents)
        .bind(expense.paid_by.to_string())
        .bind(expense.split_method.as_str())
        .bind(expense.created_by.to_string())
        .bind(expense.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .context("Failed to save expense")?;

        for (position, split) in expense.splits.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO expense_splits (expense_id, position, member_id, amount_cents, percentage, shares)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(expense.id.to_string())
            .bind(position as i64)
            .bind(split.member.to_string())
            .bind(split.amount_cents)
            .bind(split.percentage)
            .bind(split.shares)
            .execute(&mut *tx)
            .await
            .context("Failed to save expense split")?;
        }

        tx.commit().await.context("Failed to commit expense")?;
        Ok(())
    }

    pub async fn get_expense(&self, id: ExpenseId) -> Result<Option<Expense>> {
        let query = format!("SELECT {} FROM expenses WHERE id = ?", EXPENSE_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch expense")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let split_rows = sqlx::query(
            r#"
            SELECT expense_id, member_id, amount_cents, percentage, shares
            FROM expense_splits
            WHERE expense_id = ?
            ORDER BY position
            "#,
        )
        .bind(id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch expense splits")?;

        let splits = split_rows
            .iter()
            .map(|r| Self::row_to_split(r).map(|(_, split)| split))
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(Self::row_to_expense(&row, splits)?))
    }

    /// All expenses of a room, ordered by sequence number.
    pub async fn list_expenses_for_room(&self, room_id: RoomId) -> Result<Vec<Expense>> {
        let query = format!(
            "SELECT {} FROM expenses WHERE room_id = ? ORDER BY sequence",
            EXPENSE_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(room_id.to_string())
            .fetch_all(&self.pool)
            .await
            .context("Failed to list expenses")?;

        let split_rows = sqlx::query(
            r#"
            SELECT s.expense_id, s.member_id, s.amount_cents, s.percentage, s.shares
            FROM expense_splits s
            JOIN expenses e ON e.id = s.expense_id
            WHERE e.room_id = ?
            ORDER BY e.sequence, s.position
            "#,
        )
        .bind(room_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list expense splits")?;

        let mut splits_by_expense: HashMap<ExpenseId, Vec<Split>> = HashMap::new();
        for row in &split_rows {
            let (expense_id, split) = Self::row_to_split(row)?;
            splits_by_expense.entry(expense_id).or_default().push(split);
        }

        rows.iter()
            .map(|row| {
                let id_str: String = row.get("id");
                let id = Uuid::parse_str(&id_str).context("Invalid expense ID")?;
                let splits = splits_by_expense.remove(&id).unwrap_or_default();
                Self::row_to_expense(row, splits)
            })
            .collect()
    }

    pub async fn delete_expense(&self, id: ExpenseId) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM expense_splits WHERE expense_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to delete expense splits")?;

        sqlx::query("DELETE FROM expenses WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to delete expense")?;

        tx.commit().await.context("Failed to commit expense deletion")?;
        Ok(())
    }

    fn row_to_expense(row: &sqlx::sqlite::SqliteRow, splits: Vec<Split>) -> Result<Expense> {
        let id_str: String = row.get("id");
        let room_id_str: String = row.get("room_id");
        let paid_by_str: String = row.get("paid_by");
        let created_by_str: String = row.get("created_by");
        let method_str: String = row.get("split_method");
        let created_at_str: String = row.get("created_at");

        Ok(Expense {
            id: Uuid::parse_str(&id_str).context("Invalid expense ID")?,
            room_id: Uuid::parse_str(&room_id_str).context("Invalid room ID")?,
            sequence: row.get("sequence"),
            description: row.get("description"),
            total_cents: row.get("total_cents"),
            paid_by: Uuid::parse_str(&paid_by_str).context("Invalid payer ID")?,
            split_method: SplitMethod::from_str(&method_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid split method: {}", method_str))?,
            splits,
            created_by: Uuid::parse_str(&created_by_str).context("Invalid creator ID")?,
            created_at: parse_timestamp(&created_at_str)?,
        })
    }

    fn row_to_split(row: &sqlx::sqlite::SqliteRow) -> Result<(ExpenseId, Split)> {
        let expense_id_str: String = row.get("expense_id");
        let member_id_str: String = row.get("member_id");

        Ok((
            Uuid::parse_str(&expense_id_str).context("Invalid expense ID")?,
            Split {
                member: Uuid::parse_str(&member_id_str).context("Invalid split member ID")?,
                amount_cents: row.get("amount_cents"),
                percentage: row.get("percentage"),
                shares: row.get("shares"),
            },
        ))
    }

    // ========================
    // Treasury operations
    // ========================

    /// Record a treasury entry if the treasury can cover it.
    /// The total is read and written in one transaction.
    pub async fn record_treasury_entry(&self, entry: &TreasuryEntry) -> Result<TreasuryWrite> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let current = Self::treasury_total_in(&mut tx, entry.room_id).await?;
        let total = match check_entry(current, entry) {
            Ok(total) => total,
            Err(e) => return Ok(TreasuryWrite::Rejected(e)),
        };

        sqlx::query(
            r#"
            INSERT INTO treasury_entries (id, room_id, kind, amount_cents, description, recorded_by, recorded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(entry.room_id.to_string())
        .bind(entry.kind.as_str())
        .bind(entry.amount_cents)
        .bind(&entry.description)
        .bind(entry.recorded_by.to_string())
        .bind(entry.recorded_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .context("Failed to save treasury entry")?;

        tx.commit().await.context("Failed to commit treasury entry")?;
        Ok(TreasuryWrite::Applied { total })
    }

    /// Delete a treasury entry if the treasury stays non-negative without it.
    pub async fn remove_treasury_entry(&self, entry: &TreasuryEntry) -> Result<TreasuryWrite> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let current = Self::treasury_total_in(&mut tx, entry.room_id).await?;
        let total = match check_removal(current, entry) {
            Ok(total) => total,
            Err(e) => return Ok(TreasuryWrite::Rejected(e)),
        };

        sqlx::query("DELETE FROM treasury_entries WHERE id = ?")
            .bind(entry.id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to delete treasury entry")?;

        tx.commit().await.context("Failed to commit treasury deletion")?;
        Ok(TreasuryWrite::Applied { total })
    }

    pub async fn get_treasury_entry(&self, id: TreasuryEntryId) -> Result<Option<TreasuryEntry>> {
        let row = sqlx::query(
            r#"
            SELECT id, room_id, kind, amount_cents, description, recorded_by, recorded_at
            FROM treasury_entries
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch treasury entry")?;

        row.as_ref().map(Self::row_to_treasury_entry).transpose()
    }

    /// Treasury history of a room, oldest first.
    pub async fn list_treasury_entries(&self, room_id: RoomId) -> Result<Vec<TreasuryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, room_id, kind, amount_cents, description, recorded_by, recorded_at
            FROM treasury_entries
            WHERE room_id = ?
            ORDER BY recorded_at, rowid
            "#,
        )
        .bind(room_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list treasury entries")?;

        rows.iter().map(Self::row_to_treasury_entry).collect()
    }

    /// Current treasury, aggregated in SQL.
    pub async fn treasury_total(&self, room_id: RoomId) -> Result<Cents> {
        let mut conn = self.pool.acquire().await.context("Failed to acquire connection")?;
        Self::treasury_total_in(&mut conn, room_id).await
    }

    async fn treasury_total_in(conn: &mut SqliteConnection, room_id: RoomId) -> Result<Cents> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(CASE WHEN kind = 'deposit' THEN amount_cents ELSE -amount_cents END), 0) as total
            FROM treasury_entries
            WHERE room_id = ?
            "#,
        )
        .bind(room_id.to_string())
        .fetch_one(&mut *conn)
        .await
        .context("Failed to compute treasury total")?;

        Ok(row.get("total"))
    }

    fn row_to_treasury_entry(row: &sqlx::sqlite::SqliteRow) -> Result<TreasuryEntry> {
        let id_str: String = row.get("id");
        let room_id_str: String = row.get("room_id");
        let kind_str: String = row.get("kind");
        let recorded_by_str: String = row.get("recorded_by");
        let recorded_at_str: String = row.get("recorded_at");

        Ok(TreasuryEntry {
            id: Uuid::parse_str(&id_str).context("Invalid treasury entry ID")?,
            room_id: Uuid::parse_str(&room_id_str).context("Invalid room ID")?,
            kind: TreasuryEntryKind::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid treasury entry kind: {}", kind_str))?,
            amount_cents: row.get("amount_cents"),
            description: row.get("description"),
            recorded_by: Uuid::parse_str(&recorded_by_str).context("Invalid recorder ID")?,
            recorded_at: parse_timestamp(&recorded_at_str)?,
        })
    }

    // ========================
    // Duty operations
    // ========================

    /// Replace the room's duty roster, skips included.
    pub async fn save_duty_roster(&self, roster: &DutyRoster) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        Self::write_duty_roster(&mut tx, roster).await?;
        tx.commit().await.context("Failed to commit duty roster")?;
        Ok(())
    }

    async fn write_duty_roster(conn: &mut SqliteConnection, roster: &DutyRoster) -> Result<()> {
        let room_id = roster.room_id.to_string();
        let duties_json = serde_json::to_string(&roster.duties)?;
        let order_json = serde_json::to_string(&roster.member_order)?;

        sqlx::query("DELETE FROM duty_skips WHERE room_id = ?")
            .bind(&room_id)
            .execute(&mut *conn)
            .await
            .context("Failed to clear duty skips")?;

        sqlx::query(
            r#"
            INSERT INTO duty_rosters (room_id, duties, member_order, start_date, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(room_id) DO UPDATE SET
                duties = excluded.duties,
                member_order = excluded.member_order,
                start_date = excluded.start_date,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&room_id)
        .bind(&duties_json)
        .bind(&order_json)
        .bind(roster.start_date.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *conn)
        .await
        .context("Failed to save duty roster")?;

        for skip in &roster.skips {
            Self::insert_duty_skip(conn, roster.room_id, skip).await?;
        }
        Ok(())
    }

    pub async fn get_duty_roster(&self, room_id: RoomId) -> Result<Option<DutyRoster>> {
        let mut conn = self.pool.acquire().await.context("Failed to acquire connection")?;
        Self::fetch_duty_roster(&mut conn, room_id).await
    }

    async fn fetch_duty_roster(
        conn: &mut SqliteConnection,
        room_id: RoomId,
    ) -> Result<Option<DutyRoster>> {
        let row = sqlx::query(
            "SELECT room_id, duties, member_order, start_date FROM duty_rosters WHERE room_id = ?",
        )
        .bind(room_id.to_string())
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to fetch duty roster")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let duties_json: String = row.get("duties");
        let order_json: String = row.get("member_order");
        let start_date_str: String = row.get("start_date");

        let skip_rows = sqlx::query(
            "SELECT date, member_id FROM duty_skips WHERE room_id = ? ORDER BY date, rowid",
        )
        .bind(room_id.to_string())
        .fetch_all(&mut *conn)
        .await
        .context("Failed to fetch duty skips")?;

        let skips = skip_rows
            .iter()
            .map(|r| {
                let date_str: String = r.get("date");
                let member_str: String = r.get("member_id");
                Ok(DutySkip {
                    date: parse_date(&date_str)?,
                    member: Uuid::parse_str(&member_str).context("Invalid skipped member ID")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(DutyRoster {
            room_id,
            duties: serde_json::from_str(&duties_json).context("Invalid duties JSON")?,
            member_order: serde_json::from_str(&order_json).context("Invalid member order JSON")?,
            start_date: parse_date(&start_date_str)?,
            skips,
        }))
    }

    pub async fn save_duty_skip(&self, room_id: RoomId, skip: &DutySkip) -> Result<()> {
        let mut conn = self.pool.acquire().await.context("Failed to acquire connection")?;
        Self::insert_duty_skip(&mut conn, room_id, skip).await
    }

    async fn insert_duty_skip(conn: &mut SqliteConnection, room_id: RoomId, skip: &DutySkip) -> Result<()> {
        sqlx::query("INSERT INTO duty_skips (room_id, date, member_id) VALUES (?, ?, ?)")
            .bind(room_id.to_string())
            .bind(skip.date.to_string())
            .bind(skip.member.to_string())
            .execute(&mut *conn)
            .await
            .context("Failed to save duty skip")?;
        Ok(())
    }

    /// Drop a member from the room's rotation order. A rotation left without
    /// members is deleted.
    async fn drop_from_rotation(
        conn: &mut SqliteConnection,
        room_id: RoomId,
        member_id: MemberId,
    ) -> Result<()> {
        let Some(mut roster) = Self::fetch_duty_roster(conn, room_id).await? else {
            return Ok(());
        };
        roster.member_order.retain(|m| *m != member_id);
        roster.skips.retain(|s| s.member != member_id);

        if !roster.member_order.is_empty() {
            return Self::write_duty_roster(conn, &roster).await;
        }

        for statement in [
            "DELETE FROM duty_skips WHERE room_id = ?",
            "DELETE FROM duty_rosters WHERE room_id = ?",
        ] {
            sqlx::query(statement)
                .bind(room_id.to_string())
                .execute(&mut *conn)
                .await
                .context("Failed to delete duty roster")?;
        }
        Ok(())
    }

    // ========================
    // Integrity
    // ========================

    pub async fn get_integrity_stats(&self) -> Result<IntegrityStats> {
        let member_count: i64 = sqlx::query("SELECT COUNT(*) as count FROM members")
            .fetch_one(&self.pool)
            .await?
            .get("count");

        let room_count: i64 = sqlx::query("SELECT COUNT(*) as count FROM rooms")
            .fetch_one(&self.pool)
            .await?
            .get("count");

        let sequence_check = sqlx::query(
            "SELECT MIN(sequence) as min_seq, MAX(sequence) as max_seq, COUNT(*) as count FROM expenses",
        )
        .fetch_one(&self.pool)
        .await?;

        let min_seq: Option<i64> = sequence_check.get("min_seq");
        let max_seq: Option<i64> = sequence_check.get("max_seq");
        let expense_count: i64 = sequence_check.get("count");

        // Deleted expenses leave holes, so gaps are informational
        let has_sequence_gaps = match (min_seq, max_seq) {
            (Some(min), Some(max)) => (max - min + 1) != expense_count,
            _ => false,
        };

        let orphan_splits: i64 = sqlx::query(
            r#"
            SELECT COUNT(*) as count
            FROM expense_splits s
            WHERE NOT EXISTS (SELECT 1 FROM expenses e WHERE e.id = s.expense_id)
            "#,
        )
        .fetch_one(&self.pool)
        .await?
        .get("count");

        Ok(IntegrityStats {
            member_count,
            room_count,
            expense_count,
            has_sequence_gaps,
            orphan_splits,
        })
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("Invalid timestamp: {}", s))?
        .with_timezone(&Utc))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("Invalid date: {}", s))
}
