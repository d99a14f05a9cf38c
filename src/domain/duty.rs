use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{MemberId, RoomId};

/// A member taken out of the rotation for a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutySkip {
    pub date: NaiveDate,
    pub member: MemberId,
}

/// Rotating chore table for a room.
///
/// On each day the rotation shifts by one: duty `i` goes to the eligible member
/// at `(i + days_since_start) % eligible.len()`. Members skipped for that day
/// are not eligible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DutyRoster {
    pub room_id: RoomId,
    pub duties: Vec<String>,
    pub member_order: Vec<MemberId>,
    pub start_date: NaiveDate,
    pub skips: Vec<DutySkip>,
}

/// One duty and who does it on a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyAssignment {
    pub duty: String,
    /// None when there are more duties than eligible members that day
    pub member: Option<MemberId>,
}

impl DutyRoster {
    pub fn new(
        room_id: RoomId,
        duties: Vec<String>,
        member_order: Vec<MemberId>,
        start_date: NaiveDate,
    ) -> Result<Self, DutyError> {
        let duties: Vec<String> = duties
            .into_iter()
            .map(|d| d.trim().to_string())
            .collect();

        if duties.is_empty() {
            return Err(DutyError::NoDuties);
        }
        if duties.iter().any(String::is_empty) {
            return Err(DutyError::EmptyDuty);
        }
        if member_order.is_empty() {
            return Err(DutyError::NoMembers);
        }
        if duties.len() > member_order.len() {
            return Err(DutyError::TooManyDuties {
                duties: duties.len(),
                members: member_order.len(),
            });
        }
        let mut seen = HashSet::new();
        for member in &member_order {
            if !seen.insert(*member) {
                return Err(DutyError::DuplicateMember(*member));
            }
        }

        Ok(Self {
            room_id,
            duties,
            member_order,
            start_date,
            skips: Vec::new(),
        })
    }

    pub fn starting_today(
        room_id: RoomId,
        duties: Vec<String>,
        member_order: Vec<MemberId>,
    ) -> Result<Self, DutyError> {
        Self::new(room_id, duties, member_order, Utc::now().date_naive())
    }

    pub fn is_skipped(&self, member: MemberId, date: NaiveDate) -> bool {
        self.skips
            .iter()
            .any(|s| s.member == member && s.date == date)
    }

    /// Take `member` out of the rotation on `date`.
    pub fn skip(&mut self, member: MemberId, date: NaiveDate) -> Result<DutySkip, DutyError> {
        if !self.member_order.contains(&member) {
            return Err(DutyError::NotInRotation(member));
        }
        if self.is_skipped(member, date) {
            return Err(DutyError::AlreadySkipped { member, date });
        }
        let skip = DutySkip { date, member };
        self.skips.push(skip);
        Ok(skip)
    }

    pub fn eligible_on(&self, date: NaiveDate) -> Vec<MemberId> {
        self.member_order
            .iter()
            .copied()
            .filter(|m| !self.is_skipped(*m, date))
            .collect()
    }

    pub fn assignments_on(&self, date: NaiveDate) -> Vec<DutyAssignment> {
        let eligible = self.eligible_on(date);
        let offset = (date - self.start_date).num_days();

        self.duties
            .iter()
            .enumerate()
            .map(|(i, duty)| {
                // More duties than people: trailing duties stay open
                let member = if i < eligible.len() {
                    let n = eligible.len() as i64;
                    let slot = (i as i64 + offset).rem_euclid(n) as usize;
                    Some(eligible[slot])
                } else {
                    None
                };
                DutyAssignment {
                    duty: duty.clone(),
                    member,
                }
            })
            .collect()
    }

    pub fn duty_of(&self, member: MemberId, date: NaiveDate) -> Option<String> {
        self.assignments_on(date)
            .into_iter()
            .find(|a| a.member == Some(member))
            .map(|a| a.duty)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DutyError {
    #[error("At least one duty is required")]
    NoDuties,

    #[error("Duty descriptions cannot be empty")]
    EmptyDuty,

    #[error("At least one member is required in the rotation")]
    NoMembers,

    #[error("Cannot have {duties} duties for only {members} members")]
    TooManyDuties { duties: usize, members: usize },

    #[error("Member {0} appears more than once in the rotation")]
    DuplicateMember(MemberId),

    #[error("Member {0} is not part of the duty rotation")]
    NotInRotation(MemberId),

    #[error("Member {member} is already skipped on {date}")]
    AlreadySkipped { member: MemberId, date: NaiveDate },
}
