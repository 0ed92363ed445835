use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use paging::PageRequest;
use serde::{Deserialize, Serialize};

pub type EntityId = i64;

/// Role carried by the auth token. Unrecognized roles are kept verbatim and
/// grant nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Hr,
    Head,
    Employee,
    Unknown(String),
}

impl Role {
    /// Parse a wire role; accepts Spring's `ROLE_` prefix and any case.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let bare = trimmed
            .strip_prefix("ROLE_")
            .or_else(|| trimmed.strip_prefix("role_"))
            .unwrap_or(trimmed);
        match bare.to_ascii_uppercase().as_str() {
            "ADMIN" => Role::Admin,
            "HR" => Role::Hr,
            "HEAD" => Role::Head,
            "EMPLOYEE" => Role::Employee,
            _ => Role::Unknown(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "ADMIN",
            Role::Hr => "HR",
            Role::Head => "HEAD",
            Role::Employee => "EMPLOYEE",
            Role::Unknown(raw) => raw,
        }
    }
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        Role::parse(&raw)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who is logged in. Department affiliation arrives later via enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
    pub role: Role,
    pub department_id: Option<EntityId>,
    pub department_name: Option<String>,
}

impl Identity {
    pub fn new(email: impl Into<String>, role: Role) -> Self {
        Self {
            email: email.into(),
            role,
            department_id: None,
            department_name: None,
        }
    }
}

/// Successful login: the opaque token plus the minimal identity it encodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGrant {
    pub token: String,
    pub identity: Identity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub head_of_department: Option<Box<Person>>,
    #[serde(default, deserialize_with = "wire::null_as_default")]
    pub employees: Vec<Person>,
    #[serde(default, deserialize_with = "wire::null_as_default")]
    pub titles: Vec<Title>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Title {
    #[serde(default)]
    pub id: Option<EntityId>,
    pub name: String,
    #[serde(default)]
    pub department: Option<Box<Department>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: EntityId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub department: Option<Box<Department>>,
    #[serde(default)]
    pub title: Option<Box<Title>>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub profile_picture_url: Option<String>,

    // Sensitive fields: see `permissions::can_view_sensitive_info`.
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub contract_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub contract_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub contract_type: Option<String>,
    #[serde(default)]
    pub salary: Option<i64>,
    #[serde(default)]
    pub national_id: Option<String>,
    #[serde(default)]
    pub bank_account: Option<String>,
    #[serde(default)]
    pub insurance_number: Option<String>,
}

impl Person {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn department_id(&self) -> Option<EntityId> {
        self.department.as_ref().map(|d| d.id)
    }

    /// Copy with every sensitive field removed.
    pub fn redacted(&self) -> Person {
        Person {
            address: None,
            birth_date: None,
            contract_start_date: None,
            contract_end_date: None,
            contract_type: None,
            salary: None,
            national_id: None,
            bank_account: None,
            insurance_number: None,
            ..self.clone()
        }
    }

    pub fn has_email(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Assigned,
    InProgress,
    Completed,
    Closed,
}

impl TaskStatus {
    /// The single forward step from this status, if any.
    pub fn next(self) -> Option<TaskStatus> {
        match self {
            TaskStatus::Assigned => Some(TaskStatus::InProgress),
            TaskStatus::InProgress => Some(TaskStatus::Completed),
            TaskStatus::Completed => Some(TaskStatus::Closed),
            TaskStatus::Closed => None,
        }
    }

    /// Lifecycle is forward-only, one step at a time.
    pub fn can_advance_to(self, target: TaskStatus) -> bool {
        self.next() == Some(target)
    }

    pub fn is_open(self) -> bool {
        matches!(self, TaskStatus::Assigned | TaskStatus::InProgress)
    }

    pub fn is_done(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Closed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Assigned => "ASSIGNED",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    #[serde(default)]
    pub department: Option<Box<Department>>,
    #[serde(default)]
    pub created_by: Option<Person>,
    #[serde(default)]
    pub assignee: Option<Person>,
    #[serde(default, deserialize_with = "wire::lenient_datetime")]
    pub closed_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "wire::lenient_datetime")]
    pub created_at: Option<NaiveDateTime>,
}

impl Task {
    pub fn department_id(&self) -> Option<EntityId> {
        self.department.as_ref().map(|d| d.id)
    }

    /// Assigned to or created by the person with `email`.
    pub fn involves(&self, email: &str) -> bool {
        let matches = |p: &Option<Person>| p.as_ref().is_some_and(|p| p.has_email(email));
        matches(&self.assignee) || matches(&self.created_by)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingPhase {
    Before,
    Ongoing,
    After,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub department: Option<Box<Department>>,
    #[serde(default)]
    pub organizer: Option<Person>,
    #[serde(default, deserialize_with = "wire::null_as_default")]
    pub participants: Vec<Person>,
    pub day: NaiveDate,
    #[serde(default, deserialize_with = "wire::lenient_time")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, deserialize_with = "wire::lenient_time")]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub finalized: bool,
    #[serde(default, deserialize_with = "wire::lenient_datetime")]
    pub created_at: Option<NaiveDateTime>,
}

impl Meeting {
    pub fn department_id(&self) -> Option<EntityId> {
        self.department.as_ref().map(|d| d.id)
    }

    /// Organized by or attended by the person with `email`.
    pub fn involves(&self, email: &str) -> bool {
        self.organizer.as_ref().is_some_and(|p| p.has_email(email))
            || self.participants.iter().any(|p| p.has_email(email))
    }

    /// Where `now` falls relative to the meeting slot. A missing start time
    /// counts as the start of the day, a missing end time as its end.
    pub fn phase(&self, now: NaiveDateTime) -> MeetingPhase {
        let start = self.day.and_time(self.start_time.unwrap_or(NaiveTime::MIN));
        let end = match self.end_time {
            Some(t) => self.day.and_time(t),
            None => self.day.and_time(NaiveTime::MIN) + chrono::Duration::days(1),
        };
        if now < start {
            MeetingPhase::Before
        } else if now < end {
            MeetingPhase::Ongoing
        } else {
            MeetingPhase::After
        }
    }
}

// ---- mutation payloads ----

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPerson {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub department_id: Option<EntityId>,
    pub title_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub national_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurance_number: Option<String>,
}

/// Partial update; absent fields are left alone by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<i64>,
}

impl PersonPatch {
    pub fn touches_assignment(&self) -> bool {
        self.department_id.is_some() || self.title_id.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewDepartment {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DepartmentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTitle {
    pub name: String,
    pub department_id: EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub department_id: Option<EntityId>,
    pub assignee_id: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMeeting {
    pub title: String,
    pub description: Option<String>,
    pub department_id: Option<EntityId>,
    pub day: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub participant_ids: Vec<EntityId>,
}

// ---- people listing ----

/// Filters accepted by the people listing. Empty values are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeopleFilter {
    pub q: Option<String>,
    pub email: Option<String>,
    pub department_id: Option<EntityId>,
    pub title_id: Option<EntityId>,
    pub gender: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeopleQuery {
    pub page: PageRequest,
    pub filter: PeopleFilter,
}

impl PeopleQuery {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = self.page.query_pairs();
        let f = &self.filter;
        let text = [("q", &f.q), ("email", &f.email), ("gender", &f.gender)];
        for (key, value) in text {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                pairs.push((key, v.to_string()));
            }
        }
        if let Some(id) = f.department_id {
            pairs.push(("departmentId", id.to_string()));
        }
        if let Some(id) = f.title_id {
            pairs.push(("titleId", id.to_string()));
        }
        pairs
    }
}

/// Lenient decoders for the server's Java time formats.
mod wire {
    use chrono::{DateTime, NaiveDateTime, NaiveTime};
    use serde::{Deserialize, Deserializer};

    pub fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
    }

    /// `LocalDateTime` drops zero seconds (`2024-05-01T09:30`), and some
    /// proxies add an offset; accept all of them.
    pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
        const FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
        FORMATS
            .iter()
            .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|d| d.naive_utc()))
    }

    pub fn parse_time(raw: &str) -> Option<NaiveTime> {
        ["%H:%M:%S%.f", "%H:%M"]
            .iter()
            .find_map(|f| NaiveTime::parse_from_str(raw, f).ok())
    }

    pub fn lenient_datetime<'de, D>(d: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.as_deref().and_then(parse_datetime))
    }

    pub fn lenient_time<'de, D>(d: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.as_deref().and_then(parse_time))
    }
}
