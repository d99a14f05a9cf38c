use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type MemberId = Uuid;

/// A person who can belong to rooms. Members are reference data: they are
/// created once and never change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    /// Display name, unique across the database
    pub name: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Member {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// The member acting on a request. Every service call that reads or writes
/// room data takes one explicitly.
#[derive(Debug, Clone)]
pub struct Session {
    pub member: Member,
}

impl Session {
    pub fn new(member: Member) -> Self {
        Self { member }
    }

    pub fn member_id(&self) -> MemberId {
        self.member.id
    }
}
