use serde::{Deserialize, Serialize};

/// Closed role set. One canonical representation; handlers never compare
/// role strings (the display name is presentation only, see `label`).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum Role {
    Admin = 1,
    Hr = 2,
    Manager = 3,
    Employee = 4,
}

/// Everything a handler may gate on. All authorization decisions go
/// through `Role::allows`, so a new capability gets exactly one row here.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Capability {
    ManageUsers,
    ViewAllRecords,
    EditPunchRecord,
    DeletePunchRecord,
    ApproveAsHr,
    ApproveAsManager,
    DecideWholeRequest,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Hr),
            3 => Some(Role::Manager),
            4 => Some(Role::Employee),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    /// Display name shown to users.
    pub fn label(self) -> &'static str {
        match self {
            Role::Admin => "管理員",
            Role::Hr => "人事",
            Role::Manager => "主管",
            Role::Employee => "員工",
        }
    }

    /// The single capability table.
    pub fn allows(self, cap: Capability) -> bool {
        use Capability::*;
        match cap {
            ManageUsers => matches!(self, Role::Admin | Role::Hr),
            ViewAllRecords => matches!(self, Role::Admin | Role::Hr | Role::Manager),
            EditPunchRecord => matches!(self, Role::Admin | Role::Hr),
            DeletePunchRecord => matches!(self, Role::Admin | Role::Hr | Role::Manager),
            ApproveAsHr => matches!(self, Role::Admin | Role::Hr),
            ApproveAsManager => matches!(self, Role::Admin | Role::Manager),
            DecideWholeRequest => matches!(self, Role::Admin),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ids_round_trip() {
        for role in [Role::Admin, Role::Hr, Role::Manager, Role::Employee] {
            assert_eq!(Role::from_id(role.id()), Some(role));
        }
        assert_eq!(Role::from_id(0), None);
        assert_eq!(Role::from_id(9), None);
    }

    #[test]
    fn hr_approves_as_hr_not_manager() {
        assert!(Role::Hr.allows(Capability::ApproveAsHr));
        assert!(!Role::Hr.allows(Capability::ApproveAsManager));
        assert!(Role::Manager.allows(Capability::ApproveAsManager));
        assert!(!Role::Manager.allows(Capability::ApproveAsHr));
    }

    #[test]
    fn admin_approves_as_either_and_decides_whole() {
        assert!(Role::Admin.allows(Capability::ApproveAsHr));
        assert!(Role::Admin.allows(Capability::ApproveAsManager));
        assert!(Role::Admin.allows(Capability::DecideWholeRequest));
        assert!(!Role::Hr.allows(Capability::DecideWholeRequest));
    }

    #[test]
    fn employee_has_no_privileged_capability() {
        for cap in [
            Capability::ManageUsers,
            Capability::ViewAllRecords,
            Capability::EditPunchRecord,
            Capability::DeletePunchRecord,
            Capability::ApproveAsHr,
            Capability::ApproveAsManager,
            Capability::DecideWholeRequest,
        ] {
            assert!(!Role::Employee.allows(cap));
        }
    }
}
