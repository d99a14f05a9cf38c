use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Member, MemberId};

pub type RoomId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Manages membership, treasury and duties
    Admin,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Member => "member",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "member" => Some(Role::Member),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::from_str(s).ok_or_else(|| format!("unknown role '{}'", s))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub created_by: MemberId,
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn new(name: impl Into<String>, created_by: MemberId) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_by,
            created_at: Utc::now(),
        }
    }
}

/// A member's seat in a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomMember {
    pub member: Member,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
}

impl RoomMember {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A room together with its members in join order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomDetails {
    pub room: Room,
    pub members: Vec<RoomMember>,
}

impl RoomDetails {
    pub fn find_member(&self, id: MemberId) -> Option<&RoomMember> {
        self.members.iter().find(|m| m.member.id == id)
    }

    pub fn is_member(&self, id: MemberId) -> bool {
        self.find_member(id).is_some()
    }

    pub fn is_admin(&self, id: MemberId) -> bool {
        self.find_member(id).is_some_and(RoomMember::is_admin)
    }

    pub fn admin_count(&self) -> usize {
        self.members.iter().filter(|m| m.is_admin()).count()
    }

    pub fn member_ids(&self) -> Vec<MemberId> {
        self.members.iter().map(|m| m.member.id).collect()
    }

    pub fn member_name(&self, id: MemberId) -> Option<&str> {
        self.find_member(id).map(|m| m.member.name.as_str())
    }
}
