use std::sync::Arc;

use apikit::TracedClient;
use async_trait::async_trait;
use paging::Page;
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

use crate::contract::client::PersonnelApi;
use crate::contract::error::{PersonnelError, PersonnelResult};
use crate::contract::model::{
    Department, DepartmentPatch, EntityId, Meeting, NewDepartment, NewMeeting, NewPerson, NewTask,
    NewTitle, PeopleQuery, Person, PersonPatch, Task, TaskStatus, Title,
};
use crate::domain::ports::TokenSource;
use crate::infra::http::response;

const DEPARTMENT_EXISTS: &str = "Department name already exists";
const TITLE_EXISTS: &str = "Title name already exists";

#[derive(Serialize)]
struct StatusUpdate {
    status: TaskStatus,
}

/// Adapter for the personnel REST API. Every call is signed with the token
/// current at the time of the call; without one, nothing is sent.
pub struct HttpPersonnelClient {
    client: TracedClient,
    base: Url,
    tokens: Arc<dyn TokenSource>,
    people_fetch_size: u32,
}

impl HttpPersonnelClient {
    pub fn new(client: TracedClient, base: Url, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            client,
            base,
            tokens,
            people_fetch_size: 1000,
        }
    }

    pub fn with_people_fetch_size(mut self, size: u32) -> Self {
        self.people_fetch_size = size;
        self
    }

    fn request(&self, method: Method, segments: &[&str]) -> PersonnelResult<RequestBuilder> {
        let token = self
            .tokens
            .bearer_token()
            .ok_or(PersonnelError::Unauthenticated)?;
        let url = response::join(&self.base, segments)?;
        Ok(self.client.request(method, url.as_str(), Some(&token)))
    }

    async fn send(&self, builder: RequestBuilder) -> PersonnelResult<Response> {
        Ok(self.client.send(builder).await?)
    }

    async fn get_list<T>(&self, segments: &[&str]) -> PersonnelResult<Vec<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let resp = self.send(self.request(Method::GET, segments)?).await?;
        Ok(response::list(resp).await?.into_items())
    }

    async fn people_list(&self, pairs: &[(&str, String)]) -> PersonnelResult<paging::ListBody<Person>> {
        let builder = self.request(Method::GET, &["people"])?.query(pairs);
        response::list(self.send(builder).await?).await
    }
}

#[async_trait]
impl PersonnelApi for HttpPersonnelClient {
    #[instrument(name = "personnel.http.list_departments", skip_all)]
    async fn list_departments(&self) -> PersonnelResult<Vec<Department>> {
        self.get_list(&["departments"]).await
    }

    #[instrument(name = "personnel.http.list_titles", skip_all)]
    async fn list_titles(&self) -> PersonnelResult<Vec<Title>> {
        self.get_list(&["titles"]).await
    }

    #[instrument(name = "personnel.http.list_people", skip_all, fields(size = self.people_fetch_size))]
    async fn list_people(&self) -> PersonnelResult<Vec<Person>> {
        let pairs = [
            ("page", "0".to_string()),
            ("size", self.people_fetch_size.to_string()),
        ];
        Ok(self.people_list(&pairs).await?.into_items())
    }

    #[instrument(name = "personnel.http.list_tasks", skip_all)]
    async fn list_tasks(&self) -> PersonnelResult<Vec<Task>> {
        self.get_list(&["tasks"]).await
    }

    #[instrument(name = "personnel.http.list_meetings", skip_all)]
    async fn list_meetings(&self) -> PersonnelResult<Vec<Meeting>> {
        self.get_list(&["meetings"]).await
    }

    #[instrument(name = "personnel.http.search_people", skip_all, fields(page = query.page.page))]
    async fn search_people(&self, query: &PeopleQuery) -> PersonnelResult<Page<Person>> {
        let body = self.people_list(&query.query_pairs()).await?;
        let page = body.into_page();
        debug!(items = page.items.len(), total = page.page_info.total_elements, "people page");
        Ok(page)
    }

    #[instrument(name = "personnel.http.find_person_by_email", skip_all)]
    async fn find_person_by_email(&self, email: &str) -> PersonnelResult<Option<Person>> {
        let pairs = [("size", "1".to_string()), ("email", email.to_string())];
        let people = self.people_list(&pairs).await?.into_items();
        Ok(people.into_iter().find(|p| p.has_email(email)))
    }

    #[instrument(name = "personnel.http.create_person", skip_all)]
    async fn create_person(&self, new_person: &NewPerson) -> PersonnelResult<Person> {
        let builder = self.request(Method::POST, &["people"])?.json(new_person);
        response::json(self.send(builder).await?, None).await
    }

    #[instrument(name = "personnel.http.update_person", skip(self, patch))]
    async fn update_person(&self, id: EntityId, patch: &PersonPatch) -> PersonnelResult<Person> {
        let builder = self
            .request(Method::PUT, &["people", &id.to_string()])?
            .json(patch);
        response::json(self.send(builder).await?, None).await
    }

    #[instrument(name = "personnel.http.delete_person", skip(self))]
    async fn delete_person(&self, id: EntityId) -> PersonnelResult<()> {
        let builder = self.request(Method::DELETE, &["people", &id.to_string()])?;
        response::empty(self.send(builder).await?, None).await
    }

    #[instrument(name = "personnel.http.create_department", skip_all)]
    async fn create_department(&self, new_department: &NewDepartment) -> PersonnelResult<Department> {
        let builder = self
            .request(Method::POST, &["departments"])?
            .json(new_department);
        response::json(self.send(builder).await?, Some(DEPARTMENT_EXISTS)).await
    }

    #[instrument(name = "personnel.http.update_department", skip(self, patch))]
    async fn update_department(
        &self,
        id: EntityId,
        patch: &DepartmentPatch,
    ) -> PersonnelResult<Department> {
        let builder = self
            .request(Method::PUT, &["departments", &id.to_string()])?
            .json(patch);
        response::json(self.send(builder).await?, Some(DEPARTMENT_EXISTS)).await
    }

    #[instrument(name = "personnel.http.delete_department", skip(self))]
    async fn delete_department(&self, id: EntityId) -> PersonnelResult<()> {
        let builder = self.request(Method::DELETE, &["departments", &id.to_string()])?;
        response::empty(self.send(builder).await?, None).await
    }

    #[instrument(name = "personnel.http.clear_department_head", skip(self))]
    async fn clear_department_head(&self, id: EntityId) -> PersonnelResult<()> {
        let builder = self.request(Method::POST, &["departments", &id.to_string(), "clear-head"])?;
        response::empty(self.send(builder).await?, None).await
    }

    #[instrument(name = "personnel.http.create_title", skip_all)]
    async fn create_title(&self, new_title: &NewTitle) -> PersonnelResult<Title> {
        let builder = self.request(Method::POST, &["titles"])?.json(new_title);
        response::json(self.send(builder).await?, Some(TITLE_EXISTS)).await
    }

    #[instrument(name = "personnel.http.create_task", skip_all)]
    async fn create_task(&self, new_task: &NewTask) -> PersonnelResult<Task> {
        let builder = self.request(Method::POST, &["tasks", "create"])?.json(new_task);
        response::json(self.send(builder).await?, None).await
    }

    #[instrument(name = "personnel.http.update_task_status", skip(self))]
    async fn update_task_status(&self, id: EntityId, status: TaskStatus) -> PersonnelResult<Task> {
        let builder = self
            .request(Method::PUT, &["tasks", &id.to_string(), "status"])?
            .json(&StatusUpdate { status });
        response::json(self.send(builder).await?, None).await
    }

    #[instrument(name = "personnel.http.close_task", skip(self))]
    async fn close_task(&self, id: EntityId) -> PersonnelResult<Task> {
        let builder = self.request(Method::PUT, &["tasks", &id.to_string(), "close"])?;
        response::json(self.send(builder).await?, None).await
    }

    #[instrument(name = "personnel.http.create_meeting", skip_all)]
    async fn create_meeting(&self, new_meeting: &NewMeeting) -> PersonnelResult<Meeting> {
        let builder = self
            .request(Method::POST, &["meetings", "create"])?
            .json(new_meeting);
        response::json(self.send(builder).await?, None).await
    }
}
