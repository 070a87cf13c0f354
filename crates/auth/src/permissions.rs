use serde::Serialize;

use crate::{Role, RoleSet};

/// Guarded operations and the roles allowed to perform them.
///
/// Holding any one of an action's roles is enough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ViewDetainees,
    RegisterDetainee,
    ChangeDetaineeStatus,
    ReportIncident,
    ListIncidents,
    ManageUsers,
}

impl Action {
    pub fn required_roles(&self) -> RoleSet {
        match self {
            Action::ViewDetainees | Action::RegisterDetainee | Action::ReportIncident => {
                RoleSet::from([Role::Admin, Role::Medecin, Role::Personnel])
            }
            Action::ListIncidents => RoleSet::from([Role::Admin, Role::Personnel]),
            Action::ChangeDetaineeStatus | Action::ManageUsers => RoleSet::from([Role::Admin]),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ViewDetainees => "view_detainees",
            Action::RegisterDetainee => "register_detainee",
            Action::ChangeDetaineeStatus => "change_detainee_status",
            Action::ReportIncident => "report_incident",
            Action::ListIncidents => "list_incidents",
            Action::ManageUsers => "manage_users",
        }
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
