//! Role-specific dashboards. Every variant is computed from the same cache
//! snapshot, so refreshing the cache is enough to keep all of them current.

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

use crate::contract::model::{EntityId, Identity, Meeting, Person, Role, Task, TaskStatus};
use crate::domain::cache::CacheSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Dashboard {
    Admin(AdminDashboard),
    Hr(HrDashboard),
    Head(HeadDashboard),
    Employee(EmployeeDashboard),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminDashboard {
    pub total_employees: usize,
    pub active_departments: usize,
    pub total_tasks: usize,
    pub closed_tasks: usize,
    pub completion_rate: u32,
    pub upcoming_meetings: usize,
    pub tasks: Vec<Task>,
    pub meetings: Vec<Meeting>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HrDashboard {
    pub total_employees: usize,
    pub active_departments: usize,
    pub open_tasks: usize,
    pub new_hires_this_month: usize,
    pub average_salary: i64,
    pub retention_rate: u32,
    pub tasks: Vec<Task>,
    pub meetings: Vec<Meeting>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadDashboard {
    pub department_id: Option<EntityId>,
    pub department_name: Option<String>,
    pub department_employees: usize,
    pub open_department_tasks: usize,
    pub completed_this_month: usize,
    pub completion_rate: u32,
    /// Open department tasks per employee, one decimal.
    pub team_workload: f64,
    pub upcoming_department_meetings: usize,
    pub tasks: Vec<Task>,
    pub meetings: Vec<Meeting>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeDashboard {
    pub open_tasks: usize,
    pub completed_tasks: usize,
    pub completion_rate: u32,
    pub department_colleagues: usize,
    pub upcoming_meetings: usize,
    /// Whole years since contract start; `None` without a start date.
    pub work_anniversary_years: Option<u32>,
    pub tasks: Vec<Task>,
    pub meetings: Vec<Meeting>,
}

/// Build the dashboard for `identity`'s role. Unknown roles get the
/// employee view.
pub fn compose_dashboard(identity: &Identity, snapshot: &CacheSnapshot, today: NaiveDate) -> Dashboard {
    match identity.role {
        Role::Admin => Dashboard::Admin(admin(snapshot, today)),
        Role::Hr => Dashboard::Hr(hr(identity, snapshot, today)),
        Role::Head => Dashboard::Head(head(identity, snapshot, today)),
        Role::Employee | Role::Unknown(_) => Dashboard::Employee(employee(identity, snapshot, today)),
    }
}

fn admin(snapshot: &CacheSnapshot, today: NaiveDate) -> AdminDashboard {
    let tasks = &snapshot.tasks.items;
    let meetings = &snapshot.meetings.items;

    AdminDashboard {
        total_employees: snapshot.people.items.len(),
        active_departments: snapshot.departments.items.len(),
        total_tasks: tasks.len(),
        closed_tasks: count_status(tasks, |s| s == TaskStatus::Closed),
        completion_rate: percent(count_status(tasks, TaskStatus::is_done), tasks.len()),
        upcoming_meetings: meetings.iter().filter(|m| m.day >= today).count(),
        tasks: newest_tasks_first(tasks.clone()),
        meetings: newest_meetings_first(meetings.clone()),
    }
}

fn hr(identity: &Identity, snapshot: &CacheSnapshot, today: NaiveDate) -> HrDashboard {
    let people = &snapshot.people.items;
    let mine = my_tasks(identity, &snapshot.tasks.items);

    let new_hires_this_month = people
        .iter()
        .filter_map(|p| p.contract_start_date)
        .filter(|d| d.month() == today.month() && d.year() == today.year())
        .count();

    let salaries: Vec<i64> = people.iter().filter_map(|p| p.salary).filter(|s| *s > 0).collect();
    let average_salary = if salaries.is_empty() {
        0
    } else {
        (salaries.iter().sum::<i64>() as f64 / salaries.len() as f64).round() as i64
    };

    let one_year_ago = today.checked_sub_months(Months::new(12)).unwrap_or(NaiveDate::MIN);
    let long_term = people
        .iter()
        .filter_map(|p| p.contract_start_date)
        .filter(|d| *d < one_year_ago)
        .count();

    HrDashboard {
        total_employees: people.len(),
        active_departments: snapshot.departments.items.len(),
        open_tasks: count_status(&mine, TaskStatus::is_open),
        new_hires_this_month,
        average_salary,
        retention_rate: percent(long_term, people.len()),
        tasks: newest_tasks_first(mine),
        meetings: newest_meetings_first(my_meetings(identity, &snapshot.meetings.items)),
    }
}

fn head(identity: &Identity, snapshot: &CacheSnapshot, today: NaiveDate) -> HeadDashboard {
    let mine = newest_tasks_first(my_tasks(identity, &snapshot.tasks.items));
    let meetings = newest_meetings_first(my_meetings(identity, &snapshot.meetings.items));

    let Some(dept) = identity.department_id else {
        return HeadDashboard {
            department_id: None,
            department_name: None,
            department_employees: 0,
            open_department_tasks: 0,
            completed_this_month: 0,
            completion_rate: 0,
            team_workload: 0.0,
            upcoming_department_meetings: 0,
            tasks: mine,
            meetings,
        };
    };

    let employees = department_headcount(&snapshot.people.items, dept);
    let dept_tasks: Vec<&Task> = snapshot
        .tasks
        .items
        .iter()
        .filter(|t| t.department_id() == Some(dept))
        .collect();

    let open = dept_tasks.iter().filter(|t| t.status != TaskStatus::Closed).count();
    let done = dept_tasks.iter().filter(|t| t.status.is_done()).count();
    let completed_this_month = dept_tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .filter_map(|t| t.created_at)
        .filter(|at| at.month() == today.month() && at.year() == today.year())
        .count();
    let upcoming = snapshot
        .meetings
        .items
        .iter()
        .filter(|m| m.department_id() == Some(dept) && m.day >= today)
        .count();

    HeadDashboard {
        department_id: Some(dept),
        department_name: identity.department_name.clone(),
        department_employees: employees,
        open_department_tasks: open,
        completed_this_month,
        completion_rate: percent(done, dept_tasks.len()),
        team_workload: (open as f64 / employees.max(1) as f64 * 10.0).round() / 10.0,
        upcoming_department_meetings: upcoming,
        tasks: mine,
        meetings,
    }
}

fn employee(identity: &Identity, snapshot: &CacheSnapshot, today: NaiveDate) -> EmployeeDashboard {
    let mine = my_tasks(identity, &snapshot.tasks.items);
    let meetings = my_meetings(identity, &snapshot.meetings.items);
    let completed = count_status(&mine, TaskStatus::is_done);

    let department_colleagues = identity
        .department_id
        .map(|d| department_headcount(&snapshot.people.items, d).saturating_sub(1))
        .unwrap_or(0);

    let work_anniversary_years = snapshot
        .people
        .items
        .iter()
        .find(|p| p.has_email(&identity.email))
        .and_then(|p| p.contract_start_date)
        .map(|start| whole_years_between(start, today));

    EmployeeDashboard {
        open_tasks: count_status(&mine, TaskStatus::is_open),
        completed_tasks: completed,
        completion_rate: percent(completed, mine.len()),
        department_colleagues,
        upcoming_meetings: meetings.iter().filter(|m| m.day >= today).count(),
        work_anniversary_years,
        tasks: newest_tasks_first(mine),
        meetings: newest_meetings_first(meetings),
    }
}

fn my_tasks(identity: &Identity, tasks: &[Task]) -> Vec<Task> {
    tasks.iter().filter(|t| t.involves(&identity.email)).cloned().collect()
}

fn my_meetings(identity: &Identity, meetings: &[Meeting]) -> Vec<Meeting> {
    meetings.iter().filter(|m| m.involves(&identity.email)).cloned().collect()
}

fn department_headcount(people: &[Person], dept: EntityId) -> usize {
    people.iter().filter(|p| p.department_id() == Some(dept)).count()
}

fn count_status<'a, I>(tasks: I, pred: impl Fn(TaskStatus) -> bool) -> usize
where
    I: IntoIterator<Item = &'a Task>,
{
    tasks.into_iter().filter(|t| pred(t.status)).count()
}

/// Rounded percentage; zero when there is nothing to divide by.
fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}

fn whole_years_between(start: NaiveDate, today: NaiveDate) -> u32 {
    let mut years = today.year() - start.year();
    if (today.month(), today.day()) < (start.month(), start.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

fn newest_tasks_first(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    tasks
}

fn newest_meetings_first(mut meetings: Vec<Meeting>) -> Vec<Meeting> {
    meetings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    meetings
}
