use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Leave categories. `Overtime` is the one variant whose duration is
/// counted as continuous elapsed time instead of being clipped to the
/// requester's work window (see `leave::duration`).
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumIter, EnumString,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
    Sick,
    Personal,
    Compensatory,
    Annual,
    Overtime,
    Parental,
}

impl LeaveType {
    /// Display name shown to users. Immutable enum-to-string table, never
    /// a runtime dictionary.
    pub fn label(self) -> &'static str {
        match self {
            LeaveType::Sick => "病假",
            LeaveType::Personal => "事假",
            LeaveType::Compensatory => "補休",
            LeaveType::Annual => "特休",
            LeaveType::Overtime => "加班",
            LeaveType::Parental => "育嬰假",
        }
    }

    /// Whether this category is clipped to the work window and lunch break.
    pub fn is_clipped(self) -> bool {
        !matches!(self, LeaveType::Overtime)
    }
}

/// One side of the two-party sign-off, stored as the integer codes the
/// leave_requests table carries (0/1/2).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
pub enum ApprovalState {
    Pending = 0,
    Approved = 1,
    Rejected = 2,
}

impl ApprovalState {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ApprovalState::Pending),
            1 => Some(ApprovalState::Approved),
            2 => Some(ApprovalState::Rejected),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Overall request status, derived from the two approval fields. This is
/// a read-side view only; there is no matching setter.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

/// Approved iff both parties approved; rejected iff either rejected.
pub fn derive_status(hr: ApprovalState, manager: ApprovalState) -> LeaveStatus {
    if hr == ApprovalState::Approved && manager == ApprovalState::Approved {
        LeaveStatus::Approved
    } else if hr == ApprovalState::Rejected || manager == ApprovalState::Rejected {
        LeaveStatus::Rejected
    } else {
        LeaveStatus::Pending
    }
}

/// A whole-request decision (admin shortcut). Applying one fans out to
/// BOTH approval fields; callers see the fan-out explicitly instead of a
/// property setter hiding it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

/// The two fields a [`Decision`] writes. Persisted by the caller.
pub fn apply_decision(decision: Decision) -> (ApprovalState, ApprovalState) {
    match decision {
        Decision::Approve => (ApprovalState::Approved, ApprovalState::Approved),
        Decision::Reject => (ApprovalState::Rejected, ApprovalState::Rejected),
    }
}

/// Row shape of leave_requests. `duration_hours`/`duration_days`/
/// `duration_label` are computed once at submission and frozen; readers
/// must not re-derive them.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveRequest {
    pub id: u64,
    pub user_id: u64,
    pub leave_type: String,
    #[schema(example = "2026-03-02T01:00:00Z", format = "date-time", value_type = String)]
    pub start_at: DateTime<Utc>,
    #[schema(example = "2026-03-02T07:00:00Z", format = "date-time", value_type = String)]
    pub end_at: DateTime<Utc>,
    pub reason: Option<String>,
    pub hr_approval: u8,
    pub manager_approval: u8,
    pub duration_hours: f64,
    pub duration_days: f64,
    pub duration_label: String,
    pub deputy_id: Option<u64>,
    pub handover_notes: Option<String>,
    pub deputy_confirmation: bool,
    #[schema(example = "2026-03-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: Option<DateTime<Utc>>,
}

impl LeaveRequest {
    pub fn status(&self) -> LeaveStatus {
        let hr = ApprovalState::from_code(self.hr_approval).unwrap_or(ApprovalState::Pending);
        let mgr = ApprovalState::from_code(self.manager_approval).unwrap_or(ApprovalState::Pending);
        derive_status(hr, mgr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_requires_both_approvals() {
        use ApprovalState::*;
        assert_eq!(derive_status(Pending, Pending), LeaveStatus::Pending);
        assert_eq!(derive_status(Approved, Pending), LeaveStatus::Pending);
        assert_eq!(derive_status(Pending, Approved), LeaveStatus::Pending);
        assert_eq!(derive_status(Approved, Approved), LeaveStatus::Approved);
    }

    #[test]
    fn either_rejection_rejects() {
        use ApprovalState::*;
        assert_eq!(derive_status(Rejected, Pending), LeaveStatus::Rejected);
        assert_eq!(derive_status(Pending, Rejected), LeaveStatus::Rejected);
        // A rejection outweighs the other side's approval.
        assert_eq!(derive_status(Approved, Rejected), LeaveStatus::Rejected);
    }

    #[test]
    fn decision_fans_out_to_both_fields() {
        assert_eq!(
            apply_decision(Decision::Approve),
            (ApprovalState::Approved, ApprovalState::Approved)
        );
        assert_eq!(
            apply_decision(Decision::Reject),
            (ApprovalState::Rejected, ApprovalState::Rejected)
        );
    }

    #[test]
    fn leave_type_tags_and_labels() {
        assert_eq!(LeaveType::from_str("overtime").unwrap(), LeaveType::Overtime);
        assert_eq!(LeaveType::Sick.to_string(), "sick");
        assert_eq!(LeaveType::Annual.label(), "特休");
        assert!(LeaveType::from_str("holiday").is_err());
    }

    #[test]
    fn only_overtime_escapes_clipping() {
        for lt in [
            LeaveType::Sick,
            LeaveType::Personal,
            LeaveType::Compensatory,
            LeaveType::Annual,
            LeaveType::Parental,
        ] {
            assert!(lt.is_clipped());
        }
        assert!(!LeaveType::Overtime.is_clipped());
    }

    #[test]
    fn approval_codes_round_trip() {
        for st in [
            ApprovalState::Pending,
            ApprovalState::Approved,
            ApprovalState::Rejected,
        ] {
            assert_eq!(ApprovalState::from_code(st.code()), Some(st));
        }
        assert_eq!(ApprovalState::from_code(3), None);
    }
}
