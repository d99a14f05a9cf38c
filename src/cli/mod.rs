use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::application::{NewExpense, RoomService, SplitSpec};
use crate::domain::{
    Expense, Role, Session, SplitMethod, format_cents, format_percentage, parse_cents,
    parse_percentage,
};

/// Tallyroom - shared expenses, treasury and chores for a room of people
#[derive(Parser)]
#[command(name = "tallyroom")]
#[command(about = "Track shared expenses in rooms and settle them with as few payments as possible")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "TALLYROOM_DATABASE", default_value = "tallyroom.db")]
    pub database: String,

    /// Member acting on this command
    #[arg(long = "as", env = "TALLYROOM_MEMBER", global = true)]
    pub acting_member: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Member management commands
    #[command(subcommand)]
    Member(MemberCommands),

    /// Room management commands
    #[command(subcommand)]
    Room(RoomCommands),

    /// Expense commands
    #[command(subcommand)]
    Expense(ExpenseCommands),

    /// Show member balances and the payments that settle them
    Balances {
        /// Room name
        room: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Record a payment from one member to another
    Settle {
        /// Room name
        room: String,

        /// Member paying
        #[arg(long)]
        from: String,

        /// Member receiving
        #[arg(long)]
        to: String,

        /// Amount paid (e.g., "30.00" or "30")
        #[arg(long)]
        amount: String,
    },

    /// Room treasury commands
    #[command(subcommand)]
    Treasury(TreasuryCommands),

    /// Duty rotation commands
    #[command(subcommand)]
    Duty(DutyCommands),

    /// Export data to CSV or JSON
    Export {
        /// What to export: expenses, balances, full
        export_type: String,

        /// Room to export (required for expenses and balances)
        #[arg(short, long)]
        room: Option<String>,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Verify database integrity
    Check,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum MemberCommands {
    /// Register a new member
    Add {
        /// Member name (must be unique)
        name: String,

        /// Contact email
        #[arg(short, long)]
        email: Option<String>,
    },

    /// List all members
    List,
}

#[derive(Subcommand)]
pub enum RoomCommands {
    /// Create a room; you become its admin
    Create {
        /// Room name (must be unique)
        name: String,
    },

    /// Join an existing room
    Join {
        /// Room name
        name: String,
    },

    /// List your rooms
    List,

    /// Show room details and members
    Show {
        /// Room name
        name: String,
    },

    /// Delete a room and everything in it (admin)
    Delete {
        /// Room name
        name: String,
    },

    /// Leave a room
    Leave {
        /// Room name
        name: String,
    },

    /// Add a member to a room (admin)
    AddMember {
        /// Room name
        room: String,

        /// Member name
        member: String,

        /// Role: admin or member
        #[arg(long, default_value = "member")]
        role: Role,
    },

    /// Remove a member from a room (admin)
    RemoveMember {
        /// Room name
        room: String,

        /// Member name
        member: String,
    },

    /// Change a member's role (admin)
    Role {
        /// Room name
        room: String,

        /// Member name
        member: String,

        /// New role: admin or member
        role: Role,
    },
}

#[derive(Subcommand)]
pub enum ExpenseCommands {
    /// Record an expense
    Add {
        /// Room name
        room: String,

        /// Total amount (e.g., "90.00" or "90")
        amount: String,

        /// What was paid for
        #[arg(short, long)]
        description: String,

        /// Member who paid (defaults to you)
        #[arg(long)]
        paid_by: Option<String>,

        /// Split method: equal, unequal, percentage, shares
        #[arg(short, long, default_value = "equal")]
        split: String,

        /// Members sharing an equal split, comma separated (defaults to everyone)
        #[arg(long, value_delimiter = ',')]
        among: Vec<String>,

        /// Member share as NAME=VALUE (amount, percentage or share count)
        #[arg(short, long = "part")]
        parts: Vec<String>,
    },

    /// List the expenses of a room
    List {
        /// Room name
        room: String,

        /// Show individual splits
        #[arg(long)]
        splits: bool,
    },

    /// Delete an expense
    Delete {
        /// Expense ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum TreasuryCommands {
    /// Put money into the room's fund (admin)
    Deposit {
        /// Room name
        room: String,

        /// Amount (e.g., "50.00")
        amount: String,

        /// Description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Take money out of the room's fund (admin)
    Withdraw {
        /// Room name
        room: String,

        /// Amount (e.g., "50.00")
        amount: String,

        /// Description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Show the treasury total and history
    Show {
        /// Room name
        room: String,
    },

    /// Delete a treasury entry (admin)
    Delete {
        /// Treasury entry ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum DutyCommands {
    /// Set up the duty rotation (admin)
    Configure {
        /// Room name
        room: String,

        /// A duty; repeat for each duty
        #[arg(long = "duty", required = true)]
        duties: Vec<String>,

        /// Rotation order, comma separated (defaults to join order)
        #[arg(long, value_delimiter = ',')]
        order: Option<Vec<String>>,

        /// First day of the rotation (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        start: Option<String>,
    },

    /// Show who does what on a day
    Show {
        /// Room name
        room: String,

        /// Day to show (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Show your own duty
    Mine {
        /// Room name
        room: String,

        /// Day to show (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Take a member out of the rotation for one day (admin)
    Skip {
        /// Room name
        room: String,

        /// Member name
        member: String,

        /// Day to skip (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
}

impl Cli {
    /// Install the tracing subscriber. `TALLYROOM_LOG` sets the filter;
    /// `--verbose` forces debug output for this crate.
    pub fn init_tracing(&self) {
        let filter = if self.verbose {
            EnvFilter::new("tallyroom=debug")
        } else {
            EnvFilter::try_from_env("TALLYROOM_LOG")
                .unwrap_or_else(|_| EnvFilter::new("tallyroom=warn"))
        };

        // Ignore a subscriber already installed by an embedding program
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    pub async fn run(self) -> Result<()> {
        if let Commands::Init = self.command {
            RoomService::init(&self.database).await?;
            println!("Database initialized: {}", self.database);
            return Ok(());
        }

        let service = RoomService::connect(&self.database).await?;

        match self.command {
            Commands::Init => {}

            Commands::Member(cmd) => run_member_command(&service, cmd).await?,

            Commands::Check => run_check_command(&service).await?,

            command => {
                let session = open_session(&service, self.acting_member.as_deref()).await?;
                run_session_command(&service, &session, command).await?;
            }
        }

        Ok(())
    }
}

async fn open_session(service: &RoomService, acting_member: Option<&str>) -> Result<Session> {
    let name = acting_member
        .context("No acting member. Pass --as NAME or set TALLYROOM_MEMBER")?;
    Ok(service.session_for(name).await?)
}

async fn run_session_command(
    service: &RoomService,
    session: &Session,
    command: Commands,
) -> Result<()> {
    match command {
        Commands::Room(cmd) => run_room_command(service, session, cmd).await?,

        Commands::Expense(cmd) => run_expense_command(service, session, cmd).await?,

        Commands::Balances { room, format } => {
            run_balances_command(service, session, &room, format).await?
        }

        Commands::Settle {
            room,
            from,
            to,
            amount,
        } => {
            let amount_cents =
                parse_cents(&amount).context("Invalid amount format. Use '30.00' or '30'")?;
            let expense = service
                .settle_debt(session, &room, &from, &to, amount_cents)
                .await?;
            println!("Recorded: {} (#{})", expense.description, expense.sequence);
        }

        Commands::Treasury(cmd) => run_treasury_command(service, session, cmd).await?,

        Commands::Duty(cmd) => run_duty_command(service, session, cmd).await?,

        Commands::Export {
            export_type,
            room,
            output,
        } => {
            run_export_command(
                service,
                session,
                &export_type,
                room.as_deref(),
                output.as_deref(),
            )
            .await?
        }

        Commands::Init | Commands::Member(_) | Commands::Check => {}
    }
    Ok(())
}

async fn run_member_command(service: &RoomService, cmd: MemberCommands) -> Result<()> {
    match cmd {
        MemberCommands::Add { name, email } => {
            let member = service.register_member(name, email).await?;
            println!("Registered member: {} ({})", member.name, member.id);
        }

        MemberCommands::List => {
            let members = service.list_members().await?;
            if members.is_empty() {
                println!("No members found.");
            } else {
                println!("{:<20} {:<30}", "NAME", "EMAIL");
                println!("{}", "-".repeat(50));
                for member in members {
                    println!(
                        "{:<20} {:<30}",
                        member.name,
                        member.email.unwrap_or_default()
                    );
                }
            }
        }
    }
    Ok(())
}

async fn run_room_command(service: &RoomService, session: &Session, cmd: RoomCommands) -> Result<()> {
    match cmd {
        RoomCommands::Create { name } => {
            let room = service.create_room(session, name).await?;
            println!("Created room: {} (you are admin)", room.name);
        }

        RoomCommands::Join { name } => {
            let room = service.join_room(session, &name).await?;
            println!("Joined room: {}", room.name);
        }

        RoomCommands::List => {
            let rooms = service.list_my_rooms(session).await?;
            if rooms.is_empty() {
                println!("You are not in any room.");
            } else {
                println!("{:<24} {:<20}", "ROOM", "CREATED");
                println!("{}", "-".repeat(44));
                for room in rooms {
                    println!(
                        "{:<24} {:<20}",
                        room.name,
                        room.created_at.format("%Y-%m-%d %H:%M")
                    );
                }
            }
        }

        RoomCommands::Show { name } => {
            let details = service.room_details(session, &name).await?;
            println!("Room: {}", details.room.name);
            println!("  ID:      {}", details.room.id);
            println!(
                "  Created: {}",
                details.room.created_at.format("%Y-%m-%d %H:%M:%S")
            );
            println!();
            println!("  {:<20} {:<8} {:<12}", "MEMBER", "ROLE", "JOINED");
            for seat in &details.members {
                println!(
                    "  {:<20} {:<8} {:<12}",
                    seat.member.name,
                    seat.role,
                    seat.joined_at.format("%Y-%m-%d")
                );
            }
        }

        RoomCommands::Delete { name } => {
            let room = service.delete_room(session, &name).await?;
            println!("Deleted room: {}", room.name);
        }

        RoomCommands::Leave { name } => {
            let room = service.leave_room(session, &name).await?;
            println!("Left room: {}", room.name);
        }

        RoomCommands::AddMember { room, member, role } => {
            let member = service.add_member(session, &room, &member, role).await?;
            println!("Added {} to {} as {}", member.name, room, role);
        }

        RoomCommands::RemoveMember { room, member } => {
            let member = service.remove_member(session, &room, &member).await?;
            println!("Removed {} from {}", member.name, room);
        }

        RoomCommands::Role { room, member, role } => {
            let member = service.change_role(session, &room, &member, role).await?;
            println!("{} is now {} of {}", member.name, role, room);
        }
    }
    Ok(())
}

async fn run_expense_command(
    service: &RoomService,
    session: &Session,
    cmd: ExpenseCommands,
) -> Result<()> {
    match cmd {
        ExpenseCommands::Add {
            room,
            amount,
            description,
            paid_by,
            split,
            among,
            parts,
        } => {
            let total_cents =
                parse_cents(&amount).context("Invalid amount format. Use '90.00' or '90'")?;
            let method = SplitMethod::from_str(&split).with_context(|| {
                format!(
                    "Invalid split method '{}'. Valid methods: equal, unequal, percentage, shares",
                    split
                )
            })?;

            let split = match method {
                SplitMethod::Equal if among.is_empty() => {
                    let details = service.room_details(session, &room).await?;
                    SplitSpec::Equal(
                        details
                            .members
                            .into_iter()
                            .map(|seat| seat.member.name)
                            .collect(),
                    )
                }
                SplitMethod::Equal => SplitSpec::Equal(among),
                SplitMethod::Unequal => SplitSpec::Unequal(parse_parts(&parts, |v| {
                    parse_cents(v).context("amount must look like '12.50'")
                })?),
                SplitMethod::Percentage => SplitSpec::Percentage(parse_parts(&parts, |v| {
                    parse_percentage(v).context("percentage must look like '33.33'")
                })?),
                SplitMethod::Shares => SplitSpec::Shares(parse_parts(&parts, |v| {
                    v.parse::<i64>().context("share count must be a whole number")
                })?),
            };

            let input = NewExpense {
                description,
                total_cents,
                paid_by: paid_by.unwrap_or_else(|| session.member.name.clone()),
                split,
            };

            let expense = service.add_expense(session, &room, input).await?;
            println!(
                "Recorded expense #{}: {} {} ({})",
                expense.sequence,
                format_cents(expense.total_cents),
                expense.description,
                expense.id
            );
        }

        ExpenseCommands::List { room, splits } => {
            let (details, expenses) = service.list_expenses(session, &room).await?;
            if expenses.is_empty() {
                println!("No expenses in {}.", details.room.name);
                return Ok(());
            }

            let name_of = |id: Uuid| details.member_name(id).unwrap_or("(former member)");

            println!(
                "{:<5} {:<12} {:<30} {:>12} {:<16} {:<10}",
                "SEQ", "DATE", "DESCRIPTION", "AMOUNT", "PAID BY", "SPLIT"
            );
            println!("{}", "-".repeat(90));
            for expense in &expenses {
                println!(
                    "{:<5} {:<12} {:<30} {:>12} {:<16} {:<10}",
                    expense.sequence,
                    expense.created_at.format("%Y-%m-%d"),
                    truncate(&expense.description, 30),
                    format_cents(expense.total_cents),
                    name_of(expense.paid_by),
                    expense.split_method
                );
                if splits {
                    print_splits(expense, &name_of);
                }
            }
        }

        ExpenseCommands::Delete { id } => {
            let expense_id =
                Uuid::parse_str(&id).context("Invalid expense ID format (expected UUID)")?;
            let expense = service.delete_expense(session, expense_id).await?;
            println!(
                "Deleted expense #{}: {} {}",
                expense.sequence,
                format_cents(expense.total_cents),
                expense.description
            );
        }
    }
    Ok(())
}

fn print_splits<'a>(expense: &Expense, name_of: &impl Fn(Uuid) -> &'a str) {
    for split in &expense.splits {
        let detail = match (split.percentage, split.shares) {
            (Some(bp), _) => format!(" ({})", format_percentage(bp)),
            (_, Some(shares)) => format!(" ({} shares)", shares),
            _ => String::new(),
        };
        println!(
            "        {:<20} {:>12}{}",
            name_of(split.member),
            format_cents(split.amount_cents),
            detail
        );
    }
}

/// Parse repeated `NAME=VALUE` arguments.
fn parse_parts<T>(parts: &[String], parse: impl Fn(&str) -> Result<T>) -> Result<Vec<(String, T)>> {
    if parts.is_empty() {
        anyhow::bail!("This split method needs at least one --part NAME=VALUE");
    }

    parts
        .iter()
        .map(|part| {
            let (name, value) = part
                .split_once('=')
                .with_context(|| format!("Invalid part '{}'. Use NAME=VALUE", part))?;
            let value = parse(value.trim()).with_context(|| format!("Invalid part '{}'", part))?;
            Ok((name.trim().to_string(), value))
        })
        .collect()
}

async fn run_balances_command(
    service: &RoomService,
    session: &Session,
    room: &str,
    format: OutputFormat,
) -> Result<()> {
    let balances = service.room_balances(session, room).await?;

    match format {
        OutputFormat::Json => {
            let raw: serde_json::Map<String, serde_json::Value> = balances
                .raw_balances
                .iter()
                .map(|(member, cents)| (balances.name_of(member), cents.into()))
                .collect();
            let debts: Vec<serde_json::Value> = balances
                .simplified_debts
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "from": balances.name_of(t.from),
                        "to": balances.name_of(t.to),
                        "amount_cents": t.amount_cents,
                    })
                })
                .collect();
            let output = serde_json::json!({
                "room": balances.room.room.name,
                "raw_balances": raw,
                "simplified_debts": debts,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        OutputFormat::Table => {
            println!("Balances in {}:", balances.room.room.name);
            println!("{:<20} {:>12}", "MEMBER", "BALANCE");
            println!("{}", "-".repeat(33));
            for (member, cents) in balances.raw_balances.iter() {
                println!("{:<20} {:>12}", balances.name_of(member), format_cents(cents));
            }
            println!();

            if balances.simplified_debts.is_empty() {
                println!("Everyone is settled up.");
            } else {
                println!("To settle up:");
                for transfer in &balances.simplified_debts {
                    println!(
                        "  {} pays {} {}",
                        balances.name_of(transfer.from),
                        balances.name_of(transfer.to),
                        format_cents(transfer.amount_cents)
                    );
                }
            }
        }
    }
    Ok(())
}

async fn run_treasury_command(
    service: &RoomService,
    session: &Session,
    cmd: TreasuryCommands,
) -> Result<()> {
    match cmd {
        TreasuryCommands::Deposit {
            room,
            amount,
            description,
        } => {
            let amount_cents = parse_cents(&amount).context("Invalid amount format")?;
            let receipt = service
                .deposit(session, &room, amount_cents, description)
                .await?;
            println!(
                "Deposited {} ({}). Treasury: {}",
                format_cents(receipt.entry.amount_cents),
                receipt.entry.id,
                format_cents(receipt.total)
            );
        }

        TreasuryCommands::Withdraw {
            room,
            amount,
            description,
        } => {
            let amount_cents = parse_cents(&amount).context("Invalid amount format")?;
            let receipt = service
                .withdraw(session, &room, amount_cents, description)
                .await?;
            println!(
                "Withdrew {} ({}). Treasury: {}",
                format_cents(receipt.entry.amount_cents),
                receipt.entry.id,
                format_cents(receipt.total)
            );
        }

        TreasuryCommands::Show { room } => {
            let statement = service.treasury(session, &room).await?;
            println!("Treasury: {}", format_cents(statement.total));
            if statement.entries.is_empty() {
                return Ok(());
            }
            println!();
            println!(
                "{:<12} {:<10} {:>12} {:<30}",
                "DATE", "KIND", "AMOUNT", "DESCRIPTION"
            );
            println!("{}", "-".repeat(66));
            for entry in &statement.entries {
                println!(
                    "{:<12} {:<10} {:>12} {:<30}",
                    entry.recorded_at.format("%Y-%m-%d"),
                    entry.kind,
                    format_cents(entry.signed_amount()),
                    truncate(entry.description.as_deref().unwrap_or(""), 30)
                );
            }
        }

        TreasuryCommands::Delete { id } => {
            let entry_id =
                Uuid::parse_str(&id).context("Invalid treasury entry ID format (expected UUID)")?;
            let receipt = service.delete_treasury_entry(session, entry_id).await?;
            println!(
                "Deleted {} of {}. Treasury: {}",
                receipt.entry.kind,
                format_cents(receipt.entry.amount_cents),
                format_cents(receipt.total)
            );
        }
    }
    Ok(())
}

async fn run_duty_command(service: &RoomService, session: &Session, cmd: DutyCommands) -> Result<()> {
    match cmd {
        DutyCommands::Configure {
            room,
            duties,
            order,
            start,
        } => {
            let start = start.as_deref().map(parse_date).transpose()?;
            let roster = service
                .configure_duties(session, &room, duties, order, start)
                .await?;
            println!(
                "Configured {} duties rotating over {} members from {}",
                roster.duties.len(),
                roster.member_order.len(),
                roster.start_date
            );
        }

        DutyCommands::Show { room, date } => {
            let date = date.as_deref().map(parse_date).transpose()?;
            let table = service.duty_table(session, &room, date).await?;

            println!("Duties for {}:", table.date);
            for assigned in &table.assignments {
                let who = assigned
                    .member
                    .as_ref()
                    .map(|m| m.name.as_str())
                    .unwrap_or("(unassigned)");
                println!("  {:<24} {}", assigned.duty, who);
            }
            if !table.skipped.is_empty() {
                let names: Vec<&str> = table.skipped.iter().map(|m| m.name.as_str()).collect();
                println!("Skipped: {}", names.join(", "));
            }
        }

        DutyCommands::Mine { room, date } => {
            let date = date.as_deref().map(parse_date).transpose()?;
            match service.my_duty(session, &room, date).await? {
                Some(duty) => println!("Your duty: {}", duty),
                None => println!("No duty for you."),
            }
        }

        DutyCommands::Skip { room, member, date } => {
            let date = date.as_deref().map(parse_date).transpose()?;
            let skip = service.skip_duty(session, &room, &member, date).await?;
            println!("{} is off duty on {}", member, skip.date);
        }
    }
    Ok(())
}

async fn run_export_command(
    service: &RoomService,
    session: &Session,
    export_type: &str,
    room: Option<&str>,
    output: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{Write, stdout};

    let exporter = Exporter::new(service, session);
    let room_for = |what: &str| {
        room.with_context(|| format!("Exporting {} needs --room", what))
    };

    // Determine output writer
    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match export_type {
        "expenses" => {
            let count = exporter
                .export_expenses_csv(room_for("expenses")?, writer)
                .await?;
            if output.is_some() {
                eprintln!("Exported {} expenses", count);
            }
        }
        "balances" => {
            let count = exporter
                .export_balances_csv(room_for("balances")?, writer)
                .await?;
            if output.is_some() {
                eprintln!("Exported {} balances", count);
            }
        }
        "full" => {
            let snapshot = exporter.export_full_json(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} rooms", snapshot.rooms.len());
            }
        }
        _ => {
            anyhow::bail!(
                "Invalid export type '{}'. Valid types: expenses, balances, full",
                export_type
            );
        }
    }

    Ok(())
}

async fn run_check_command(service: &RoomService) -> Result<()> {
    println!("Checking database integrity...\n");

    let report = service.check_integrity().await?;

    println!("Members:  {}", report.stats.member_count);
    println!("Rooms:    {}", report.stats.room_count);
    println!("Expenses: {}", report.stats.expense_count);
    if report.stats.has_sequence_gaps {
        println!("(sequence has gaps from deleted expenses)");
    }
    println!();

    if report.is_healthy() {
        println!("All rooms are consistent.");
    } else {
        println!("Issues found:");
        if report.stats.orphan_splits > 0 {
            println!("  - {} splits without an expense", report.stats.orphan_splits);
        }
        for issue in &report.room_issues {
            println!("  - {}: {}", issue.room, issue.problem);
        }
        anyhow::bail!("Integrity check failed");
    }

    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}'. Use YYYY-MM-DD", date_str))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_parts() {
        let parts = vec!["alice=12.50".to_string(), "bob = 7".to_string()];
        let parsed = parse_parts(&parts, |v| Ok(parse_cents(v)?)).unwrap();
        assert_eq!(
            parsed,
            vec![("alice".to_string(), 1250), ("bob".to_string(), 700)]
        );
    }

    #[test]
    fn test_parse_parts_rejects_missing_value() {
        let parts = vec!["alice".to_string()];
        assert!(parse_parts(&parts, |v| Ok(parse_cents(v)?)).is_err());
        assert!(parse_parts::<i64>(&[], |v| Ok(v.parse()?)).is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("groceries", 30), "groceries");
        assert_eq!(truncate("a very long description of lunch", 10), "a very ...");
    }

    #[test]
    fn test_cli_parses_expense_add() {
        let cli = Cli::try_parse_from([
            "tallyroom",
            "--as",
            "alice",
            "expense",
            "add",
            "flat",
            "90",
            "-d",
            "groceries",
            "--among",
            "alice,bob,carol",
        ])
        .unwrap();

        assert_eq!(cli.acting_member.as_deref(), Some("alice"));
        match cli.command {
            Commands::Expense(ExpenseCommands::Add { among, split, .. }) => {
                assert_eq!(among, vec!["alice", "bob", "carol"]);
                assert_eq!(split, "equal");
            }
            _ => panic!("expected expense add"),
        }
    }
}
