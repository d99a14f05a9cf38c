use chrono::{NaiveDate, Utc};
use tracing::{debug, error, info, warn};

use crate::domain::{
    BalanceSheet, BasisPoints, Cents, DutyRoster, DutySkip, Expense, ExpenseId, Member, MemberId,
    Role, Room, RoomDetails, RoomMember, Session, SettlementTransfer, SplitRequest, TreasuryEntry,
    TreasuryEntryId, TreasuryEntryKind, compute_balances_for, simplify_debts,
};
use crate::storage::{IntegrityStats, Repository, TreasuryWrite};

use super::AppError;

/// Application service providing the room use cases.
/// This is the primary interface for any client (CLI, API, TUI, etc.).
/// Every room operation runs on behalf of the member in the given `Session`.
pub struct RoomService {
    repo: Repository,
}

/// How an expense is divided, with participants named as in the room.
#[derive(Debug, Clone)]
pub enum SplitSpec {
    Equal(Vec<String>),
    Unequal(Vec<(String, Cents)>),
    Percentage(Vec<(String, BasisPoints)>),
    Shares(Vec<(String, i64)>),
}

/// Input for recording an expense.
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub description: String,
    pub total_cents: Cents,
    /// Payer's member name
    pub paid_by: String,
    pub split: SplitSpec,
}

/// Net balances of a room and the transfers that settle them.
#[derive(Debug, Clone)]
pub struct RoomBalances {
    pub room: RoomDetails,
    pub raw_balances: BalanceSheet,
    pub simplified_debts: Vec<SettlementTransfer>,
}

impl RoomBalances {
    /// Display name for a balance entry; former members keep their id.
    pub fn name_of(&self, id: MemberId) -> String {
        self.room
            .member_name(id)
            .map(str::to_string)
            .unwrap_or_else(|| id.to_string())
    }
}

/// A treasury write and the resulting total.
#[derive(Debug, Clone)]
pub struct TreasuryReceipt {
    pub entry: TreasuryEntry,
    pub total: Cents,
}

/// Treasury history of a room.
#[derive(Debug, Clone)]
pub struct TreasuryStatement {
    pub entries: Vec<TreasuryEntry>,
    pub total: Cents,
}

/// Who does which duty on a given day.
#[derive(Debug, Clone)]
pub struct DutyTable {
    pub date: NaiveDate,
    pub assignments: Vec<AssignedDuty>,
    pub skipped: Vec<Member>,
}

#[derive(Debug, Clone)]
pub struct AssignedDuty {
    pub duty: String,
    pub member: Option<Member>,
}

/// A problem found while checking a room.
#[derive(Debug, Clone)]
pub struct RoomIssue {
    pub room: String,
    pub problem: String,
}

#[derive(Debug, Clone)]
pub struct IntegrityReport {
    pub stats: IntegrityStats,
    pub room_issues: Vec<RoomIssue>,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.stats.orphan_splits == 0 && self.room_issues.is_empty()
    }
}

impl RoomService {
    /// Create a new room service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        info!(database = database_path, "Database initialized");
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        debug!(database = database_path, "Connected to database");
        Ok(Self::new(repo))
    }

    // ========================
    // Member operations
    // ========================

    pub async fn register_member(
        &self,
        name: String,
        email: Option<String>,
    ) -> Result<Member, AppError> {
        let name = name.trim().to_string();
        if self.repo.get_member_by_name(&name).await?.is_some() {
            return Err(AppError::MemberAlreadyExists(name));
        }

        let mut member = Member::new(name);
        if let Some(email) = email {
            member = member.with_email(email);
        }

        self.repo.save_member(&member).await?;
        info!(member = %member.name, "Member registered");
        Ok(member)
    }

    pub async fn get_member(&self, name: &str) -> Result<Member, AppError> {
        self.repo
            .get_member_by_name(name)
            .await?
            .ok_or_else(|| AppError::MemberNotFound(name.to_string()))
    }

    pub async fn list_members(&self) -> Result<Vec<Member>, AppError> {
        Ok(self.repo.list_members().await?)
    }

    /// Open a session acting as the named member.
    pub async fn session_for(&self, name: &str) -> Result<Session, AppError> {
        let member = self.get_member(name).await?;
        debug!(member = %member.name, "Session opened");
        Ok(Session::new(member))
    }

    // ========================
    // Room operations
    // ========================

    /// Create a room; the acting member becomes its first admin.
    pub async fn create_room(&self, session: &Session, name: String) -> Result<Room, AppError> {
        let name = name.trim().to_string();
        if self.repo.get_room_by_name(&name).await?.is_some() {
            return Err(AppError::RoomAlreadyExists(name));
        }

        let room = Room::new(name, session.member_id());
        self.repo.save_room(&room).await?;
        info!(room = %room.name, admin = %session.member.name, "Room created");
        Ok(room)
    }

    pub async fn join_room(&self, session: &Session, room_name: &str) -> Result<Room, AppError> {
        let details = self.load_room(room_name).await?;
        if details.is_member(session.member_id()) {
            return Err(AppError::AlreadyRoomMember {
                member: session.member.name.clone(),
                room: details.room.name,
            });
        }

        self.repo
            .add_room_member(details.room.id, session.member_id(), Role::Member)
            .await?;
        info!(room = %details.room.name, member = %session.member.name, "Member joined room");
        Ok(details.room)
    }

    /// Seat another member in the room. Admin only.
    pub async fn add_member(
        &self,
        session: &Session,
        room_name: &str,
        member_name: &str,
        role: Role,
    ) -> Result<Member, AppError> {
        let details = self.admin_room(session, room_name).await?;
        let member = self.get_member(member_name).await?;
        if details.is_member(member.id) {
            return Err(AppError::AlreadyRoomMember {
                member: member.name,
                room: details.room.name,
            });
        }

        self.repo
            .add_room_member(details.room.id, member.id, role)
            .await?;
        info!(room = %details.room.name, member = %member.name, %role, "Member added to room");
        Ok(member)
    }

    /// Remove another member from the room. Admin only, and only once the
    /// member's balance is back to zero.
    pub async fn remove_member(
        &self,
        session: &Session,
        room_name: &str,
        member_name: &str,
    ) -> Result<Member, AppError> {
        let details = self.admin_room(session, room_name).await?;
        let seat = find_seat(&details, member_name)?;
        let member = seat.member.clone();

        if member.id == session.member_id() {
            return Err(AppError::PermissionDenied(
                "admins cannot remove themselves; use leave instead".to_string(),
            ));
        }

        let balances = self.balances_of(&details).await?;
        let balance = balances.get(member.id);
        if balance != 0 {
            return Err(AppError::OutstandingBalance {
                member: member.name,
                room: details.room.name,
                balance,
            });
        }

        self.repo
            .remove_room_member(details.room.id, member.id)
            .await?;
        info!(room = %details.room.name, member = %member.name, "Member removed from room");
        Ok(member)
    }

    /// Change another member's role. Admin only.
    pub async fn change_role(
        &self,
        session: &Session,
        room_name: &str,
        member_name: &str,
        role: Role,
    ) -> Result<Member, AppError> {
        let details = self.admin_room(session, room_name).await?;
        let seat = find_seat(&details, member_name)?;

        if seat.member.id == session.member_id() {
            return Err(AppError::PermissionDenied(
                "admins cannot change their own role".to_string(),
            ));
        }

        self.repo
            .update_member_role(details.room.id, seat.member.id, role)
            .await?;
        info!(room = %details.room.name, member = %seat.member.name, %role, "Member role changed");
        Ok(seat.member.clone())
    }

    /// Leave a room. The room is deleted when its last member leaves.
    pub async fn leave_room(&self, session: &Session, room_name: &str) -> Result<Room, AppError> {
        let details = self.member_room(session, room_name).await?;
        let me = session.member_id();

        let balances = self.balances_of(&details).await?;
        let balance = balances.get(me);
        if balance != 0 {
            return Err(AppError::OutstandingBalance {
                member: session.member.name.clone(),
                room: details.room.name,
                balance,
            });
        }

        if details.members.len() == 1 {
            self.repo.delete_room(details.room.id).await?;
            info!(room = %details.room.name, "Last member left, room deleted");
            return Ok(details.room);
        }

        if details.is_admin(me) && details.admin_count() == 1 {
            return Err(AppError::LastAdmin(details.room.name));
        }

        self.repo.remove_room_member(details.room.id, me).await?;
        info!(room = %details.room.name, member = %session.member.name, "Member left room");
        Ok(details.room)
    }

    /// Delete a room with all its expenses, treasury and duties. Admin only.
    pub async fn delete_room(&self, session: &Session, room_name: &str) -> Result<Room, AppError> {
        let details = self.admin_room(session, room_name).await?;
        self.repo.delete_room(details.room.id).await?;
        info!(room = %details.room.name, "Room deleted");
        Ok(details.room)
    }

    pub async fn list_my_rooms(&self, session: &Session) -> Result<Vec<Room>, AppError> {
        Ok(self
            .repo
            .list_rooms_for_member(session.member_id())
            .await?)
    }

    pub async fn room_details(
        &self,
        session: &Session,
        room_name: &str,
    ) -> Result<RoomDetails, AppError> {
        self.member_room(session, room_name).await
    }

    // ========================
    // Expense operations
    // ========================

    /// Record an expense. Payer and participants must be room members.
    pub async fn add_expense(
        &self,
        session: &Session,
        room_name: &str,
        input: NewExpense,
    ) -> Result<Expense, AppError> {
        let details = self.member_room(session, room_name).await?;
        let payer = find_seat(&details, &input.paid_by)?.member.id;
        let request = resolve_split(&details, &input.split)?;

        let mut expense = Expense::new(
            details.room.id,
            input.description,
            input.total_cents,
            payer,
            &request,
            session.member_id(),
        )?;

        // Balances must stay representable once the expense is in
        self.balances_of(&details).await?.apply_expense(&expense)?;

        self.repo.save_expense(&mut expense).await?;
        info!(
            room = %details.room.name,
            sequence = expense.sequence,
            total_cents = expense.total_cents,
            method = %expense.split_method,
            "Expense recorded"
        );
        Ok(expense)
    }

    /// Delete an expense. Allowed for its creator, its payer, or a room admin.
    pub async fn delete_expense(
        &self,
        session: &Session,
        expense_id: ExpenseId,
    ) -> Result<Expense, AppError> {
        let expense = self
            .repo
            .get_expense(expense_id)
            .await?
            .ok_or_else(|| AppError::ExpenseNotFound(expense_id.to_string()))?;

        let details = self
            .repo
            .get_room_details(expense.room_id)
            .await?
            .ok_or_else(|| AppError::RoomNotFound(expense.room_id.to_string()))?;
        let me = session.member_id();
        if !details.is_member(me) {
            return Err(not_member(session, &details));
        }

        if expense.created_by != me && expense.paid_by != me && !details.is_admin(me) {
            return Err(AppError::PermissionDenied(
                "only the creator, the payer or an admin can delete an expense".to_string(),
            ));
        }

        self.repo.delete_expense(expense.id).await?;
        info!(room = %details.room.name, sequence = expense.sequence, "Expense deleted");
        Ok(expense)
    }

    /// Expenses of a room in recording order.
    pub async fn list_expenses(
        &self,
        session: &Session,
        room_name: &str,
    ) -> Result<(RoomDetails, Vec<Expense>), AppError> {
        let details = self.member_room(session, room_name).await?;
        let expenses = self.repo.list_expenses_for_room(details.room.id).await?;
        Ok((details, expenses))
    }

    /// Net balances of every member and the simplified set of debts.
    pub async fn room_balances(
        &self,
        session: &Session,
        room_name: &str,
    ) -> Result<RoomBalances, AppError> {
        let details = self.member_room(session, room_name).await?;
        let raw_balances = self.balances_of(&details).await?;

        let simplified_debts = simplify_debts(&raw_balances).map_err(|e| {
            error!(room = %details.room.name, error = ?e, "Balances could not be settled");
            e
        })?;

        debug!(
            room = %details.room.name,
            members = raw_balances.len(),
            transfers = simplified_debts.len(),
            "Balances simplified"
        );
        Ok(RoomBalances {
            room: details,
            raw_balances,
            simplified_debts,
        })
    }

    /// Record that `from` paid `to`. The acting member must be one of the
    /// two, or a room admin.
    pub async fn settle_debt(
        &self,
        session: &Session,
        room_name: &str,
        from: &str,
        to: &str,
        amount_cents: Cents,
    ) -> Result<Expense, AppError> {
        let details = self.member_room(session, room_name).await?;
        let debtor = find_seat(&details, from)?.member.clone();
        let creditor = find_seat(&details, to)?.member.clone();

        if debtor.id == creditor.id {
            return Err(AppError::SelfSettlement);
        }
        let me = session.member_id();
        if me != debtor.id && me != creditor.id && !details.is_admin(me) {
            return Err(AppError::PermissionDenied(
                "only the two members involved or an admin can record a settlement".to_string(),
            ));
        }

        let mut balances = self.balances_of(&details).await?;
        if amount_cents > balances.get(debtor.id).saturating_neg() {
            warn!(
                room = %details.room.name,
                debtor = %debtor.name,
                amount_cents,
                "Settlement exceeds the debtor's outstanding debt"
            );
        }

        let mut expense = Expense::settlement(
            details.room.id,
            debtor.id,
            &debtor.name,
            creditor.id,
            &creditor.name,
            amount_cents,
            me,
        )?;
        balances.apply_expense(&expense)?;

        self.repo.save_expense(&mut expense).await?;
        info!(
            room = %details.room.name,
            from = %debtor.name,
            to = %creditor.name,
            amount_cents,
            "Settlement recorded"
        );
        Ok(expense)
    }

    // ========================
    // Treasury operations
    // ========================

    pub async fn deposit(
        &self,
        session: &Session,
        room_name: &str,
        amount_cents: Cents,
        description: Option<String>,
    ) -> Result<TreasuryReceipt, AppError> {
        self.record_treasury(
            session,
            room_name,
            TreasuryEntryKind::Deposit,
            amount_cents,
            description,
        )
        .await
    }

    pub async fn withdraw(
        &self,
        session: &Session,
        room_name: &str,
        amount_cents: Cents,
        description: Option<String>,
    ) -> Result<TreasuryReceipt, AppError> {
        self.record_treasury(
            session,
            room_name,
            TreasuryEntryKind::Withdrawal,
            amount_cents,
            description,
        )
        .await
    }

    async fn record_treasury(
        &self,
        session: &Session,
        room_name: &str,
        kind: TreasuryEntryKind,
        amount_cents: Cents,
        description: Option<String>,
    ) -> Result<TreasuryReceipt, AppError> {
        let details = self.admin_room(session, room_name).await?;

        let mut entry =
            TreasuryEntry::new(details.room.id, kind, amount_cents, session.member_id())?;
        if let Some(description) = description {
            entry = entry.with_description(description);
        }

        match self.repo.record_treasury_entry(&entry).await? {
            TreasuryWrite::Applied { total } => {
                info!(room = %details.room.name, %kind, amount_cents, total, "Treasury entry recorded");
                Ok(TreasuryReceipt { entry, total })
            }
            TreasuryWrite::Rejected(e) => Err(e.into()),
        }
    }

    /// Delete a treasury entry, reverting its effect. Admin only.
    pub async fn delete_treasury_entry(
        &self,
        session: &Session,
        entry_id: TreasuryEntryId,
    ) -> Result<TreasuryReceipt, AppError> {
        let entry = self
            .repo
            .get_treasury_entry(entry_id)
            .await?
            .ok_or_else(|| AppError::TreasuryEntryNotFound(entry_id.to_string()))?;

        let details = self
            .repo
            .get_room_details(entry.room_id)
            .await?
            .ok_or_else(|| AppError::RoomNotFound(entry.room_id.to_string()))?;
        require_admin(session, &details)?;

        match self.repo.remove_treasury_entry(&entry).await? {
            TreasuryWrite::Applied { total } => {
                info!(room = %details.room.name, kind = %entry.kind, total, "Treasury entry deleted");
                Ok(TreasuryReceipt { entry, total })
            }
            TreasuryWrite::Rejected(e) => Err(e.into()),
        }
    }

    pub async fn treasury(
        &self,
        session: &Session,
        room_name: &str,
    ) -> Result<TreasuryStatement, AppError> {
        let details = self.member_room(session, room_name).await?;
        let entries = self.repo.list_treasury_entries(details.room.id).await?;
        let total = self.repo.treasury_total(details.room.id).await?;
        Ok(TreasuryStatement { entries, total })
    }

    // ========================
    // Duty operations
    // ========================

    /// Replace the room's duty roster. Without an explicit order, every room
    /// member rotates in join order. Admin only.
    pub async fn configure_duties(
        &self,
        session: &Session,
        room_name: &str,
        duties: Vec<String>,
        order: Option<Vec<String>>,
        start_date: Option<NaiveDate>,
    ) -> Result<DutyRoster, AppError> {
        let details = self.admin_room(session, room_name).await?;

        let member_order = match order {
            Some(names) => names
                .iter()
                .map(|name| find_seat(&details, name).map(|seat| seat.member.id))
                .collect::<Result<Vec<_>, _>>()?,
            None => details.member_ids(),
        };

        let roster = match start_date {
            Some(start) => DutyRoster::new(details.room.id, duties, member_order, start)?,
            None => DutyRoster::starting_today(details.room.id, duties, member_order)?,
        };

        self.repo.save_duty_roster(&roster).await?;
        info!(
            room = %details.room.name,
            duties = roster.duties.len(),
            members = roster.member_order.len(),
            "Duty roster configured"
        );
        Ok(roster)
    }

    /// The room's roster, if one is configured.
    pub async fn duty_roster(
        &self,
        session: &Session,
        room_name: &str,
    ) -> Result<Option<DutyRoster>, AppError> {
        let details = self.member_room(session, room_name).await?;
        Ok(self.repo.get_duty_roster(details.room.id).await?)
    }

    /// Duty assignments for a day (today by default).
    pub async fn duty_table(
        &self,
        session: &Session,
        room_name: &str,
        date: Option<NaiveDate>,
    ) -> Result<DutyTable, AppError> {
        let details = self.member_room(session, room_name).await?;
        let roster = self.require_roster(&details).await?;
        let date = date.unwrap_or_else(|| Utc::now().date_naive());

        let member_of = |id: MemberId| details.find_member(id).map(|seat| seat.member.clone());

        let assignments = roster
            .assignments_on(date)
            .into_iter()
            .map(|a| AssignedDuty {
                duty: a.duty,
                member: a.member.and_then(member_of),
            })
            .collect();

        let skipped = roster
            .skips
            .iter()
            .filter(|s| s.date == date)
            .filter_map(|s| member_of(s.member))
            .collect();

        Ok(DutyTable {
            date,
            assignments,
            skipped,
        })
    }

    /// The acting member's duty for a day, if any.
    pub async fn my_duty(
        &self,
        session: &Session,
        room_name: &str,
        date: Option<NaiveDate>,
    ) -> Result<Option<String>, AppError> {
        let details = self.member_room(session, room_name).await?;
        let roster = self.require_roster(&details).await?;
        let date = date.unwrap_or_else(|| Utc::now().date_naive());
        Ok(roster.duty_of(session.member_id(), date))
    }

    /// Take a member out of the rotation for one day. Admin only.
    pub async fn skip_duty(
        &self,
        session: &Session,
        room_name: &str,
        member_name: &str,
        date: Option<NaiveDate>,
    ) -> Result<DutySkip, AppError> {
        let details = self.admin_room(session, room_name).await?;
        let member = find_seat(&details, member_name)?.member.clone();
        let mut roster = self.require_roster(&details).await?;
        let date = date.unwrap_or_else(|| Utc::now().date_naive());

        let skip = roster.skip(member.id, date)?;
        self.repo.save_duty_skip(details.room.id, &skip).await?;
        info!(room = %details.room.name, member = %member.name, %date, "Duty skipped");
        Ok(skip)
    }

    // ========================
    // Integrity
    // ========================

    /// Check every room's ledger adds up and settles.
    pub async fn check_integrity(&self) -> Result<IntegrityReport, AppError> {
        let stats = self.repo.get_integrity_stats().await?;
        let mut room_issues = Vec::new();

        for room in self.repo.list_rooms().await? {
            let members = self.repo.list_room_members(room.id).await?;
            let details = RoomDetails { room, members };

            if details.admin_count() == 0 {
                room_issues.push(RoomIssue {
                    room: details.room.name.clone(),
                    problem: "room has no admin".to_string(),
                });
            }

            let problem = match self.balances_of(&details).await {
                Ok(sheet) => simplify_debts(&sheet).err().map(|e| e.to_string()),
                Err(AppError::Ledger(e)) => Some(e.to_string()),
                Err(e) => return Err(e),
            };
            if let Some(problem) = problem {
                room_issues.push(RoomIssue {
                    room: details.room.name.clone(),
                    problem,
                });
            }

            let treasury = self.repo.treasury_total(details.room.id).await?;
            if treasury < 0 {
                room_issues.push(RoomIssue {
                    room: details.room.name.clone(),
                    problem: format!("treasury is negative ({} cents)", treasury),
                });
            }
        }

        Ok(IntegrityReport { stats, room_issues })
    }

    // ========================
    // Helpers
    // ========================

    async fn load_room(&self, room_name: &str) -> Result<RoomDetails, AppError> {
        let room = self
            .repo
            .get_room_by_name(room_name)
            .await?
            .ok_or_else(|| AppError::RoomNotFound(room_name.to_string()))?;
        let members = self.repo.list_room_members(room.id).await?;
        Ok(RoomDetails { room, members })
    }

    /// Load a room the acting member belongs to.
    async fn member_room(&self, session: &Session, room_name: &str) -> Result<RoomDetails, AppError> {
        let details = self.load_room(room_name).await?;
        if !details.is_member(session.member_id()) {
            return Err(not_member(session, &details));
        }
        Ok(details)
    }

    /// Load a room the acting member administers.
    async fn admin_room(&self, session: &Session, room_name: &str) -> Result<RoomDetails, AppError> {
        let details = self.member_room(session, room_name).await?;
        require_admin(session, &details)?;
        Ok(details)
    }

    async fn balances_of(&self, details: &RoomDetails) -> Result<BalanceSheet, AppError> {
        let expenses = self.repo.list_expenses_for_room(details.room.id).await?;
        let sheet = compute_balances_for(details.member_ids(), &expenses)?;
        debug!(room = %details.room.name, expenses = expenses.len(), "Balances computed");
        Ok(sheet)
    }

    async fn require_roster(&self, details: &RoomDetails) -> Result<DutyRoster, AppError> {
        self.repo
            .get_duty_roster(details.room.id)
            .await?
            .ok_or_else(|| AppError::DutiesNotConfigured(details.room.name.clone()))
    }
}

fn not_member(session: &Session, details: &RoomDetails) -> AppError {
    AppError::NotRoomMember {
        member: session.member.name.clone(),
        room: details.room.name.clone(),
    }
}

fn require_admin(session: &Session, details: &RoomDetails) -> Result<(), AppError> {
    if !details.is_member(session.member_id()) {
        return Err(not_member(session, details));
    }
    if !details.is_admin(session.member_id()) {
        return Err(AppError::AdminRequired(details.room.name.clone()));
    }
    Ok(())
}

fn find_seat<'a>(details: &'a RoomDetails, member_name: &str) -> Result<&'a RoomMember, AppError> {
    details
        .members
        .iter()
        .find(|seat| seat.member.name == member_name)
        .ok_or_else(|| AppError::NotRoomMember {
            member: member_name.to_string(),
            room: details.room.name.clone(),
        })
}

fn resolve_split(details: &RoomDetails, spec: &SplitSpec) -> Result<SplitRequest, AppError> {
    let id_of = |name: &String| find_seat(details, name).map(|seat| seat.member.id);

    Ok(match spec {
        SplitSpec::Equal(names) => {
            SplitRequest::Equal(names.iter().map(id_of).collect::<Result<_, _>>()?)
        }
        SplitSpec::Unequal(parts) => SplitRequest::Unequal(
            parts
                .iter()
                .map(|(name, amount)| id_of(name).map(|id| (id, *amount)))
                .collect::<Result<_, _>>()?,
        ),
        SplitSpec::Percentage(parts) => SplitRequest::Percentage(
            parts
                .iter()
                .map(|(name, bp)| id_of(name).map(|id| (id, *bp)))
                .collect::<Result<_, _>>()?,
        ),
        SplitSpec::Shares(parts) => SplitRequest::Shares(
            parts
                .iter()
                .map(|(name, shares)| id_of(name).map(|id| (id, *shares)))
                .collect::<Result<_, _>>()?,
        ),
    })
}
