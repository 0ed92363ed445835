//! Role checks applied before calling the API. The server enforces its own
//! rules; these only keep the client from issuing requests it knows will
//! be refused.

use crate::contract::model::{Identity, Person, Role};

/// Whether `viewer` may see `person`'s contract, salary and identity
/// numbers.
pub fn can_view_sensitive_info(viewer: &Identity, person: &Person) -> bool {
    match viewer.role {
        Role::Admin | Role::Hr => true,
        Role::Head => viewer.department_id.is_some() && viewer.department_id == person.department_id(),
        Role::Employee => person.has_email(&viewer.email),
        Role::Unknown(_) => false,
    }
}

/// People, departments and titles.
pub fn can_edit(role: &Role) -> bool {
    matches!(role, Role::Admin | Role::Hr)
}

pub fn can_delete(role: &Role) -> bool {
    matches!(role, Role::Admin | Role::Hr)
}

pub fn can_create_task(role: &Role) -> bool {
    matches!(role, Role::Admin | Role::Hr | Role::Head)
}

pub fn can_create_meeting(role: &Role) -> bool {
    matches!(role, Role::Admin | Role::Hr | Role::Head)
}

pub fn can_close_task(role: &Role) -> bool {
    matches!(role, Role::Admin | Role::Head)
}

/// Person as `viewer` should see it.
pub fn visible_person(viewer: &Identity, person: &Person) -> Person {
    if can_view_sensitive_info(viewer, person) {
        person.clone()
    } else {
        person.redacted()
    }
}
