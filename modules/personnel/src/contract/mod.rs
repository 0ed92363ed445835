pub mod client;
pub mod error;
pub mod model;

pub use client::{AuthApi, PersonnelApi};
pub use error::{PersonnelError, PersonnelResult};
pub use model::{
    AuthGrant, Department, DepartmentPatch, EntityId, Identity, Meeting, MeetingPhase, NewDepartment,
    NewMeeting, NewPerson, NewTask, NewTitle, PeopleFilter, PeopleQuery, Person, PersonPatch, Role,
    Task, TaskPriority, TaskStatus, Title,
};
