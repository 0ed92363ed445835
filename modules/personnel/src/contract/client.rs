use async_trait::async_trait;
use paging::Page;

use crate::contract::error::PersonnelResult;
use crate::contract::model::{
    AuthGrant, Department, DepartmentPatch, EntityId, Identity, Meeting, NewDepartment, NewMeeting,
    NewPerson, NewTask, NewTitle, PeopleQuery, Person, PersonPatch, Task, TaskStatus, Title,
};

/// The authentication service.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for a token. Rejection is `InvalidCredentials`.
    async fn login(&self, email: &str, password: &str) -> PersonnelResult<AuthGrant>;

    /// Ask the service whether `token` is still good and whom it belongs to.
    async fn validate(&self, token: &str) -> PersonnelResult<Identity>;
}

/// The personnel REST API. Implementations sign every call with the
/// current session token.
#[async_trait]
pub trait PersonnelApi: Send + Sync {
    async fn list_departments(&self) -> PersonnelResult<Vec<Department>>;
    async fn list_titles(&self) -> PersonnelResult<Vec<Title>>;
    async fn list_people(&self) -> PersonnelResult<Vec<Person>>;
    async fn list_tasks(&self) -> PersonnelResult<Vec<Task>>;
    async fn list_meetings(&self) -> PersonnelResult<Vec<Meeting>>;

    /// Paginated, filtered listing; never cached.
    async fn search_people(&self, query: &PeopleQuery) -> PersonnelResult<Page<Person>>;

    async fn find_person_by_email(&self, email: &str) -> PersonnelResult<Option<Person>>;

    async fn create_person(&self, new_person: &NewPerson) -> PersonnelResult<Person>;
    async fn update_person(&self, id: EntityId, patch: &PersonPatch) -> PersonnelResult<Person>;
    async fn delete_person(&self, id: EntityId) -> PersonnelResult<()>;

    async fn create_department(&self, new_department: &NewDepartment) -> PersonnelResult<Department>;
    async fn update_department(
        &self,
        id: EntityId,
        patch: &DepartmentPatch,
    ) -> PersonnelResult<Department>;
    async fn delete_department(&self, id: EntityId) -> PersonnelResult<()>;
    async fn clear_department_head(&self, id: EntityId) -> PersonnelResult<()>;

    async fn create_title(&self, new_title: &NewTitle) -> PersonnelResult<Title>;

    async fn create_task(&self, new_task: &NewTask) -> PersonnelResult<Task>;
    async fn update_task_status(&self, id: EntityId, status: TaskStatus) -> PersonnelResult<Task>;
    async fn close_task(&self, id: EntityId) -> PersonnelResult<Task>;

    async fn create_meeting(&self, new_meeting: &NewMeeting) -> PersonnelResult<Meeting>;
}
