#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use paging::{Page, PageInfo};
use parking_lot::Mutex;
use tokio::sync::oneshot;

use personnel::contract::client::{AuthApi, PersonnelApi};
use personnel::contract::error::{PersonnelError, PersonnelResult};
use personnel::contract::model::*;
use personnel::domain::cache::DataCache;
use personnel::domain::ports::{ManualClock, TokenStore};
use personnel::domain::session::{Session, SessionHandle};
use personnel::infra::token_store::MemoryTokenStore;
use personnel::Workspace;

pub const PASSWORD: &str = "secret";

// ---------- builders ----------

pub fn department(id: i64, name: &str) -> Department {
    Department {
        id,
        name: name.to_string(),
        color: Some("#336699".into()),
        head_of_department: None,
        employees: vec![],
        titles: vec![],
    }
}

pub fn title(id: i64, name: &str) -> Title {
    Title {
        id: Some(id),
        name: name.to_string(),
        department: None,
    }
}

pub fn person(id: i64, email: &str, dept: Option<i64>) -> Person {
    Person {
        id,
        first_name: format!("First{id}"),
        last_name: format!("Last{id}"),
        email: email.to_string(),
        department: dept.map(|d| Box::new(department(d, &format!("Dept{d}")))),
        ..Default::default()
    }
}

pub fn task(id: i64, status: TaskStatus, assignee: Option<&str>, dept: Option<i64>) -> Task {
    Task {
        id,
        title: format!("Task {id}"),
        description: None,
        priority: TaskPriority::Medium,
        status,
        department: dept.map(|d| Box::new(department(d, &format!("Dept{d}")))),
        created_by: None,
        assignee: assignee.map(|e| person(100 + id, e, dept)),
        closed_at: None,
        created_at: None,
    }
}

pub fn meeting(id: i64, day: NaiveDate, organizer: Option<&str>, dept: Option<i64>) -> Meeting {
    Meeting {
        id,
        title: format!("Meeting {id}"),
        description: None,
        department: dept.map(|d| Box::new(department(d, &format!("Dept{d}")))),
        organizer: organizer.map(|e| person(200 + id, e, dept)),
        participants: vec![],
        day,
        start_time: None,
        end_time: None,
        finalized: false,
        created_at: None,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn clock_at(y: i32, m: u32, d: u32) -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap(),
    ))
}

// ---------- fake auth service ----------

#[derive(Default)]
pub struct FakeAuth {
    roles: Mutex<HashMap<String, Role>>,
    revoked: Mutex<HashSet<String>>,
    unreachable: Mutex<bool>,
    pub validations: Mutex<usize>,
}

impl FakeAuth {
    pub fn with_user(self, email: &str, role: Role) -> Self {
        self.roles.lock().insert(email.to_string(), role);
        self
    }

    pub fn revoke(&self, token: &str) {
        self.revoked.lock().insert(token.to_string());
    }

    pub fn set_unreachable(&self, down: bool) {
        *self.unreachable.lock() = down;
    }

    pub fn token_for(email: &str) -> String {
        format!("tok-{email}")
    }
}

#[async_trait]
impl AuthApi for FakeAuth {
    async fn login(&self, email: &str, password: &str) -> PersonnelResult<AuthGrant> {
        if *self.unreachable.lock() {
            return Err(PersonnelError::transport("connection refused"));
        }
        let role = self.roles.lock().get(email).cloned();
        match role {
            Some(role) if password == PASSWORD => Ok(AuthGrant {
                token: Self::token_for(email),
                identity: Identity::new(email, role),
            }),
            _ => Err(PersonnelError::InvalidCredentials),
        }
    }

    async fn validate(&self, token: &str) -> PersonnelResult<Identity> {
        *self.validations.lock() += 1;
        if *self.unreachable.lock() {
            return Err(PersonnelError::transport("connection refused"));
        }
        if self.revoked.lock().contains(token) {
            return Err(PersonnelError::http(400, "Invalid token"));
        }
        let email = token
            .strip_prefix("tok-")
            .ok_or_else(|| PersonnelError::http(400, "Invalid token"))?;
        let role = self
            .roles
            .lock()
            .get(email)
            .cloned()
            .ok_or_else(|| PersonnelError::http(400, "Invalid token"))?;
        Ok(Identity::new(email, role))
    }
}

// ---------- fake personnel API ----------

type Script<T> = Mutex<VecDeque<oneshot::Receiver<Vec<T>>>>;

/// In-process personnel API that counts calls, can fail or stall chosen
/// endpoints, and records mutations in order.
#[derive(Default)]
pub struct FakeApi {
    pub departments: Mutex<Vec<Department>>,
    pub titles: Mutex<Vec<Title>>,
    pub people: Mutex<Vec<Person>>,
    pub tasks: Mutex<Vec<Task>>,
    pub meetings: Mutex<Vec<Meeting>>,

    calls: Mutex<HashMap<&'static str, usize>>,
    failing: Mutex<HashSet<&'static str>>,
    department_script: Script<Department>,
    gates: Mutex<HashMap<&'static str, oneshot::Receiver<()>>>,
    pub mutations: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn calls(&self, endpoint: &str) -> usize {
        self.calls.lock().get(endpoint).copied().unwrap_or(0)
    }

    pub fn total_list_calls(&self) -> usize {
        ["departments", "titles", "people", "tasks", "meetings"]
            .iter()
            .map(|e| self.calls(e))
            .sum()
    }

    pub fn fail(&self, endpoint: &'static str) {
        self.failing.lock().insert(endpoint);
    }

    pub fn heal(&self, endpoint: &'static str) {
        self.failing.lock().remove(endpoint);
    }

    /// The next department fetches resolve with whatever is sent on the
    /// matching channel, in call order.
    pub fn script_departments(&self, replies: Vec<oneshot::Receiver<Vec<Department>>>) {
        self.department_script.lock().extend(replies);
    }

    /// The next call to `endpoint` waits until the sender fires.
    pub fn gate(&self, endpoint: &'static str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().insert(endpoint, rx);
        tx
    }

    async fn hit(&self, endpoint: &'static str) -> PersonnelResult<()> {
        *self.calls.lock().entry(endpoint).or_default() += 1;
        let gate = self.gates.lock().remove(endpoint);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if self.failing.lock().contains(endpoint) {
            return Err(PersonnelError::http(500, format!("{endpoint} is down")));
        }
        Ok(())
    }

    fn record(&self, what: String) {
        self.mutations.lock().push(what);
    }
}

#[async_trait]
impl PersonnelApi for FakeApi {
    async fn list_departments(&self) -> PersonnelResult<Vec<Department>> {
        self.hit("departments").await?;
        let scripted = self.department_script.lock().pop_front();
        match scripted {
            Some(reply) => reply
                .await
                .map_err(|_| PersonnelError::transport("script dropped")),
            None => Ok(self.departments.lock().clone()),
        }
    }

    async fn list_titles(&self) -> PersonnelResult<Vec<Title>> {
        self.hit("titles").await?;
        Ok(self.titles.lock().clone())
    }

    async fn list_people(&self) -> PersonnelResult<Vec<Person>> {
        self.hit("people").await?;
        Ok(self.people.lock().clone())
    }

    async fn list_tasks(&self) -> PersonnelResult<Vec<Task>> {
        self.hit("tasks").await?;
        Ok(self.tasks.lock().clone())
    }

    async fn list_meetings(&self) -> PersonnelResult<Vec<Meeting>> {
        self.hit("meetings").await?;
        Ok(self.meetings.lock().clone())
    }

    async fn search_people(&self, query: &PeopleQuery) -> PersonnelResult<Page<Person>> {
        self.hit("search_people").await?;
        let people = self.people.lock().clone();
        let total = people.len() as u64;
        let size = query.page.size;
        let items: Vec<Person> = people
            .into_iter()
            .skip((query.page.page * size) as usize)
            .take(size as usize)
            .collect();
        Ok(Page::new(
            items,
            PageInfo {
                number: query.page.page,
                size,
                total_elements: total,
            },
        ))
    }

    async fn find_person_by_email(&self, email: &str) -> PersonnelResult<Option<Person>> {
        self.hit("find_person_by_email").await?;
        Ok(self.people.lock().iter().find(|p| p.has_email(email)).cloned())
    }

    async fn create_person(&self, new_person: &NewPerson) -> PersonnelResult<Person> {
        self.hit("create_person").await?;
        self.record(format!(
            "create_person {} {} {}",
            new_person.first_name, new_person.last_name, new_person.email
        ));
        let mut people = self.people.lock();
        let p = person(people.len() as i64 + 1, &new_person.email, new_person.department_id);
        people.push(p.clone());
        Ok(p)
    }

    async fn update_person(&self, id: EntityId, patch: &PersonPatch) -> PersonnelResult<Person> {
        self.hit("update_person").await?;
        self.record(format!("update_person {id}"));
        let mut people = self.people.lock();
        let p = people
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| PersonnelError::http(404, "Person not found"))?;
        if let Some(d) = patch.department_id {
            p.department = Some(Box::new(department(d, &format!("Dept{d}"))));
        }
        Ok(p.clone())
    }

    async fn delete_person(&self, id: EntityId) -> PersonnelResult<()> {
        self.hit("delete_person").await?;
        self.record(format!("delete_person {id}"));
        self.people.lock().retain(|p| p.id != id);
        Ok(())
    }

    async fn create_department(&self, new_department: &NewDepartment) -> PersonnelResult<Department> {
        self.hit("create_department").await?;
        let mut deps = self.departments.lock();
        if deps.iter().any(|d| d.name == new_department.name) {
            return Err(PersonnelError::conflict("Department name already exists"));
        }
        self.record(format!(
            "create_department {} {}",
            new_department.name, new_department.color
        ));
        let mut d = department(deps.len() as i64 + 1, &new_department.name);
        d.color = Some(new_department.color.clone());
        deps.push(d.clone());
        Ok(d)
    }

    async fn update_department(
        &self,
        id: EntityId,
        patch: &DepartmentPatch,
    ) -> PersonnelResult<Department> {
        self.hit("update_department").await?;
        self.record(format!("update_department {id} {:?} {:?}", patch.name, patch.color));
        let deps = self.departments.lock();
        deps.iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| PersonnelError::http(404, "Department not found"))
    }

    async fn delete_department(&self, id: EntityId) -> PersonnelResult<()> {
        self.hit("delete_department").await?;
        self.record(format!("delete_department {id}"));
        Ok(())
    }

    async fn clear_department_head(&self, id: EntityId) -> PersonnelResult<()> {
        self.hit("clear_department_head").await?;
        self.record(format!("clear_department_head {id}"));
        if let Some(d) = self.departments.lock().iter_mut().find(|d| d.id == id) {
            d.head_of_department = None;
        }
        Ok(())
    }

    async fn create_title(&self, new_title: &NewTitle) -> PersonnelResult<Title> {
        self.hit("create_title").await?;
        self.record(format!("create_title {}", new_title.name));
        Ok(title(99, &new_title.name))
    }

    async fn create_task(&self, new_task: &NewTask) -> PersonnelResult<Task> {
        self.hit("create_task").await?;
        self.record(format!("create_task {}", new_task.title));
        Ok(task(99, TaskStatus::Assigned, None, new_task.department_id))
    }

    async fn update_task_status(&self, id: EntityId, status: TaskStatus) -> PersonnelResult<Task> {
        self.hit("update_task_status").await?;
        self.record(format!("update_task_status {id} {status}"));
        let mut tasks = self.tasks.lock();
        let t = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| PersonnelError::http(404, "Task not found"))?;
        t.status = status;
        Ok(t.clone())
    }

    async fn close_task(&self, id: EntityId) -> PersonnelResult<Task> {
        self.update_task_status(id, TaskStatus::Closed).await
    }

    async fn create_meeting(&self, new_meeting: &NewMeeting) -> PersonnelResult<Meeting> {
        self.hit("create_meeting").await?;
        self.record(format!("create_meeting {}", new_meeting.title));
        Ok(meeting(99, new_meeting.day, None, new_meeting.department_id))
    }
}

// ---------- assembled fixtures ----------

pub struct Fixture {
    pub auth: Arc<FakeAuth>,
    pub api: Arc<FakeApi>,
    pub store: Arc<MemoryTokenStore>,
    pub clock: Arc<ManualClock>,
    pub handle: SessionHandle,
    pub workspace: Workspace,
}

pub const TTL: Duration = Duration::from_secs(300);

/// Users known to the fake auth service.
pub fn default_auth() -> FakeAuth {
    FakeAuth::default()
        .with_user("admin@corp.io", Role::Admin)
        .with_user("hr@corp.io", Role::Hr)
        .with_user("head@corp.io", Role::Head)
        .with_user("emp@corp.io", Role::Employee)
}

pub fn fixture_with(api: FakeApi, fetch_timeout: Duration) -> Fixture {
    let auth = Arc::new(default_auth());
    let api = Arc::new(api);
    let store = Arc::new(MemoryTokenStore::default());
    let clock = clock_at(2024, 6, 10);
    let handle = SessionHandle::default();

    let session = Session::new(
        auth.clone(),
        api.clone(),
        store.clone() as Arc<dyn TokenStore>,
        handle.clone(),
    );
    let cache = DataCache::new(api.clone(), handle.clone(), clock.clone(), TTL, fetch_timeout);
    let workspace = Workspace::new(session, cache, api.clone(), clock.clone());

    Fixture {
        auth,
        api,
        store,
        clock,
        handle,
        workspace,
    }
}

pub fn fixture(api: FakeApi) -> Fixture {
    fixture_with(api, Duration::from_secs(5))
}

/// Directory with a little of everything, departments in reverse order.
pub fn seeded_api() -> FakeApi {
    let api = FakeApi::default();
    *api.departments.lock() = vec![department(2, "Zeta"), department(1, "Alpha")];
    *api.titles.lock() = vec![title(2, "engineer"), title(1, "Analyst")];
    *api.people.lock() = vec![
        person(1, "admin@corp.io", None),
        person(2, "head@corp.io", Some(1)),
        person(3, "emp@corp.io", Some(1)),
        person(4, "hr@corp.io", Some(2)),
    ];
    *api.tasks.lock() = vec![
        task(1, TaskStatus::Assigned, Some("emp@corp.io"), Some(1)),
        task(2, TaskStatus::Completed, Some("emp@corp.io"), Some(1)),
    ];
    api
}

pub fn department_names(ws: &Workspace) -> Vec<String> {
    ws.cache()
        .departments()
        .items
        .into_iter()
        .map(|d| d.name)
        .collect()
}
