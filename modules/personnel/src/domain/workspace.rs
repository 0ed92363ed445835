use std::future::Future;
use std::sync::Arc;

use chrono::NaiveDate;
use paging::Page;
use tracing::{debug, info, instrument, warn};

use crate::contract::client::PersonnelApi;
use crate::contract::error::{PersonnelError, PersonnelResult};
use crate::contract::model::{
    Department, DepartmentPatch, EntityId, Identity, Meeting, NewDepartment, NewMeeting, NewPerson,
    NewTask, NewTitle, PeopleQuery, Person, PersonPatch, Role, Task, TaskStatus, Title,
};
use crate::domain::cache::{CacheSnapshot, DataCache};
use crate::domain::colors::normalize_hex;
use crate::domain::dashboard::{compose_dashboard, Dashboard};
use crate::domain::guard::InFlightGuard;
use crate::domain::permissions;
use crate::domain::ports::Clock;
use crate::domain::session::Session;

/// Application context: the session, the shared cache and the API, built
/// once and handed to whatever needs them.
///
/// Every successful mutation is followed by a forced refresh of the whole
/// cache; there is no incremental patching.
pub struct Workspace {
    session: Session,
    cache: DataCache,
    api: Arc<dyn PersonnelApi>,
    clock: Arc<dyn Clock>,
    guard: InFlightGuard,
}

impl Workspace {
    pub fn new(
        session: Session,
        cache: DataCache,
        api: Arc<dyn PersonnelApi>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            session,
            cache,
            api,
            clock,
            guard: InFlightGuard::default(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn cache(&self) -> &DataCache {
        &self.cache
    }

    pub fn identity(&self) -> Option<Identity> {
        self.session.identity()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }

    // ---- session lifecycle ----

    /// Sign in and warm the cache.
    pub async fn try_login(&self, email: &str, password: &str) -> PersonnelResult<Identity> {
        let identity = self.session.try_login(email, password).await?;
        self.cache.refresh_all(false).await;
        Ok(identity)
    }

    pub async fn login(&self, email: &str, password: &str) -> bool {
        match self.try_login(email, password).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "login failed");
                false
            }
        }
    }

    /// Resume a persisted session, warming the cache if it is still valid.
    pub async fn restore(&self) -> bool {
        if !self.session.restore().await {
            return false;
        }
        self.cache.refresh_all(false).await;
        true
    }

    pub fn logout(&self) {
        self.session.logout();
        self.cache.clear();
    }

    pub async fn refresh(&self, force: bool) {
        self.cache.refresh_all(force).await
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        self.cache.snapshot()
    }

    // ---- reads ----

    pub fn dashboard(&self, today: NaiveDate) -> PersonnelResult<Dashboard> {
        let identity = self.require_identity()?;
        Ok(compose_dashboard(&identity, &self.cache.snapshot(), today))
    }

    /// Paged people listing straight from the API, redacted for the viewer.
    #[instrument(name = "personnel.workspace.search_people", skip(self, query))]
    pub async fn search_people(&self, query: &PeopleQuery) -> PersonnelResult<Page<Person>> {
        let identity = self.require_identity()?;
        let page = self.api.search_people(query).await?;
        Ok(page.map_items(|p| permissions::visible_person(&identity, &p)))
    }

    // ---- people ----

    #[instrument(name = "personnel.workspace.create_person", skip_all, fields(email = %new_person.email))]
    pub async fn create_person(&self, new_person: &NewPerson) -> PersonnelResult<Person> {
        let new_person = NewPerson {
            first_name: required_text("first_name", &new_person.first_name)?,
            last_name: required_text("last_name", &new_person.last_name)?,
            email: required_text("email", &new_person.email)?,
            ..new_person.clone()
        };
        self.submit(
            "create_person",
            permissions::can_edit,
            "create people",
            self.api.create_person(&new_person),
        )
        .await
    }

    #[instrument(name = "personnel.workspace.update_person", skip(self, patch))]
    pub async fn update_person(&self, id: EntityId, patch: &PersonPatch) -> PersonnelResult<Person> {
        self.submit(
            "update_person",
            permissions::can_edit,
            "edit people",
            self.api.update_person(id, patch),
        )
        .await
    }

    #[instrument(name = "personnel.workspace.delete_person", skip(self))]
    pub async fn delete_person(&self, id: EntityId) -> PersonnelResult<()> {
        self.submit(
            "delete_person",
            permissions::can_delete,
            "delete people",
            self.api.delete_person(id),
        )
        .await
    }

    /// Move a person to another department or title. If they headed the
    /// department they are leaving, that department's head is cleared
    /// afterwards. The follow-up is best effort: its failure is logged and
    /// the reassignment still counts as saved.
    #[instrument(name = "personnel.workspace.reassign_person", skip(self, patch))]
    pub async fn reassign_person(&self, id: EntityId, patch: &PersonPatch) -> PersonnelResult<Person> {
        let headed = self.headed_department(id);
        let follow_up = async {
            let person = self.api.update_person(id, patch).await?;
            if let Some(old) = headed.filter(|old| {
                patch.department_id.is_some_and(|new| new != *old)
            }) {
                match self.api.clear_department_head(old).await {
                    Ok(()) => info!(department_id = old, "cleared head of previous department"),
                    Err(e) => warn!(department_id = old, error = %e, "failed to clear previous department head"),
                }
            }
            Ok::<_, PersonnelError>(person)
        };
        self.submit("update_person", permissions::can_edit, "edit people", follow_up)
            .await
    }

    fn headed_department(&self, person_id: EntityId) -> Option<EntityId> {
        self.cache
            .departments()
            .items
            .iter()
            .find(|d| d.head_of_department.as_ref().is_some_and(|h| h.id == person_id))
            .map(|d| d.id)
    }

    // ---- departments and titles ----

    #[instrument(name = "personnel.workspace.create_department", skip(self, color))]
    pub async fn create_department(&self, name: &str, color: &str) -> PersonnelResult<Department> {
        let new_department = NewDepartment {
            name: required_text("name", name)?,
            color: checked_color(color)?,
        };
        self.submit(
            "create_department",
            permissions::can_edit,
            "create departments",
            self.api.create_department(&new_department),
        )
        .await
    }

    #[instrument(name = "personnel.workspace.update_department", skip(self, patch))]
    pub async fn update_department(
        &self,
        id: EntityId,
        patch: &DepartmentPatch,
    ) -> PersonnelResult<Department> {
        let patch = DepartmentPatch {
            name: patch
                .name
                .as_deref()
                .map(|n| required_text("name", n))
                .transpose()?,
            color: patch.color.as_deref().map(checked_color).transpose()?,
        };
        self.submit(
            "update_department",
            permissions::can_edit,
            "edit departments",
            self.api.update_department(id, &patch),
        )
        .await
    }

    #[instrument(name = "personnel.workspace.delete_department", skip(self))]
    pub async fn delete_department(&self, id: EntityId) -> PersonnelResult<()> {
        self.submit(
            "delete_department",
            permissions::can_delete,
            "delete departments",
            self.api.delete_department(id),
        )
        .await
    }

    #[instrument(name = "personnel.workspace.clear_department_head", skip(self))]
    pub async fn clear_department_head(&self, id: EntityId) -> PersonnelResult<()> {
        self.submit(
            "clear_department_head",
            permissions::can_edit,
            "edit departments",
            self.api.clear_department_head(id),
        )
        .await
    }

    #[instrument(name = "personnel.workspace.create_title", skip(self))]
    pub async fn create_title(&self, name: &str, department_id: EntityId) -> PersonnelResult<Title> {
        let new_title = NewTitle {
            name: required_text("name", name)?,
            department_id,
        };
        self.submit(
            "create_title",
            permissions::can_edit,
            "create titles",
            self.api.create_title(&new_title),
        )
        .await
    }

    // ---- tasks and meetings ----

    #[instrument(name = "personnel.workspace.create_task", skip_all, fields(title = %new_task.title))]
    pub async fn create_task(&self, new_task: &NewTask) -> PersonnelResult<Task> {
        let new_task = NewTask {
            title: required_text("title", &new_task.title)?,
            ..new_task.clone()
        };
        self.submit(
            "create_task",
            permissions::can_create_task,
            "create tasks",
            self.api.create_task(&new_task),
        )
        .await
    }

    /// Move a task one step forward. Closing goes through [`Self::close_task`].
    #[instrument(name = "personnel.workspace.advance_task", skip(self))]
    pub async fn advance_task(&self, id: EntityId, to: TaskStatus) -> PersonnelResult<Task> {
        let from = self.cached_task_status(id)?;
        if to == TaskStatus::Closed || !from.can_advance_to(to) {
            return Err(PersonnelError::InvalidTransition { from, to });
        }
        self.submit(
            "advance_task",
            |_: &Role| true,
            "update tasks",
            self.api.update_task_status(id, to),
        )
        .await
    }

    /// Close a completed task.
    #[instrument(name = "personnel.workspace.close_task", skip(self))]
    pub async fn close_task(&self, id: EntityId) -> PersonnelResult<Task> {
        let identity = self.require_identity()?;
        if !permissions::can_close_task(&identity.role) {
            return Err(PersonnelError::forbidden("close tasks"));
        }
        let from = self.cached_task_status(id)?;
        if from != TaskStatus::Completed {
            return Err(PersonnelError::InvalidTransition {
                from,
                to: TaskStatus::Closed,
            });
        }
        self.submit(
            "close_task",
            permissions::can_close_task,
            "close tasks",
            self.api.close_task(id),
        )
        .await
    }

    fn cached_task_status(&self, id: EntityId) -> PersonnelResult<TaskStatus> {
        self.cache
            .tasks()
            .items
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.status)
            .ok_or_else(|| PersonnelError::validation("task", format!("task {id} is not loaded")))
    }

    #[instrument(name = "personnel.workspace.create_meeting", skip_all, fields(title = %new_meeting.title))]
    pub async fn create_meeting(&self, new_meeting: &NewMeeting) -> PersonnelResult<Meeting> {
        let new_meeting = NewMeeting {
            title: required_text("title", &new_meeting.title)?,
            ..new_meeting.clone()
        };
        if new_meeting.end_time <= new_meeting.start_time {
            return Err(PersonnelError::validation(
                "end_time",
                "meeting must end after it starts",
            ));
        }
        self.submit(
            "create_meeting",
            permissions::can_create_meeting,
            "create meetings",
            self.api.create_meeting(&new_meeting),
        )
        .await
    }

    // ---- plumbing ----

    fn require_identity(&self) -> PersonnelResult<Identity> {
        if !self.session.is_authenticated() {
            return Err(PersonnelError::Unauthenticated);
        }
        self.session.identity().ok_or(PersonnelError::Unauthenticated)
    }

    /// Run one mutation: role check, double-submit guard, the call itself,
    /// then a forced refresh of everything.
    async fn submit<T, Fut>(
        &self,
        operation: &'static str,
        allowed: impl Fn(&Role) -> bool,
        action: &str,
        call: Fut,
    ) -> PersonnelResult<T>
    where
        Fut: Future<Output = PersonnelResult<T>>,
    {
        let identity = self.require_identity()?;
        if !allowed(&identity.role) {
            return Err(PersonnelError::forbidden(action));
        }
        let _submission = self.guard.try_acquire(operation)?;

        let result = call.await;
        match &result {
            Ok(_) => {
                debug!(operation, "mutation succeeded; refreshing cache");
                self.cache.refresh_all(true).await;
            }
            Err(e) => warn!(operation, error = %e, "mutation failed"),
        }
        result
    }
}

/// Trimmed copy of a required field; blank is rejected.
fn required_text(field: &str, value: &str) -> PersonnelResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(PersonnelError::validation(field, "must not be empty"));
    }
    Ok(value.to_string())
}

/// Empty means "no preference" and takes the fallback color; anything else
/// must be a valid hex code.
fn checked_color(input: &str) -> PersonnelResult<String> {
    let (color, valid) = normalize_hex(input);
    if !valid && !input.trim().is_empty() {
        return Err(PersonnelError::validation(
            "color",
            format!("'{}' is not a hex color", input.trim()),
        ));
    }
    Ok(color)
}
