mod repository;

pub use repository::*;

/// SQL migration for members, rooms, expenses and treasury
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// SQL migration for duty rosters
pub const MIGRATION_002_DUTIES: &str = include_str!("migrations/002_duties.sql");
