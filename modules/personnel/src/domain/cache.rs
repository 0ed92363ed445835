//! Time-to-live cache over the five shared collections.
//!
//! Every collection follows the same rules: refreshes are gated on an
//! authenticated session, served from memory while younger than the TTL
//! unless forced, and a failed fetch keeps whatever was loaded before. When
//! refreshes of one collection overlap, only the most recently started one
//! may write its result.

use std::cmp::Ordering;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::RwLock;
use tracing::{debug, instrument, warn};

use crate::contract::client::PersonnelApi;
use crate::contract::error::{PersonnelError, PersonnelResult};
use crate::contract::model::{Department, Meeting, Person, Task, Title};
use crate::domain::ports::Clock;
use crate::domain::session::SessionHandle;

/// One cached collection as seen by consumers.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    pub items: Vec<T>,
    pub is_loading: bool,
    pub last_fetched_at: Option<DateTime<Utc>>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            is_loading: false,
            last_fetched_at: None,
        }
    }
}

impl<T> Collection<T> {
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        self.last_fetched_at.is_some_and(|at| now - at < ttl)
    }
}

/// Cloned view of every collection at one point in time.
#[derive(Debug, Clone, Default)]
pub struct CacheSnapshot {
    pub departments: Collection<Department>,
    pub titles: Collection<Title>,
    pub people: Collection<Person>,
    pub tasks: Collection<Task>,
    pub meetings: Collection<Meeting>,
}

struct SlotState<T> {
    data: Collection<T>,
    /// Sequence number of the most recently started fetch.
    latest: u64,
}

struct Slot<T> {
    name: &'static str,
    state: RwLock<SlotState<T>>,
}

impl<T: Clone> Slot<T> {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            state: RwLock::new(SlotState {
                data: Collection::default(),
                latest: 0,
            }),
        }
    }

    fn read(&self) -> Collection<T> {
        self.state.read().data.clone()
    }

    /// Claim a sequence number unless the data is still fresh.
    fn begin(&self, force: bool, now: DateTime<Utc>, ttl: TimeDelta) -> Option<u64> {
        let mut s = self.state.write();
        if !force && s.data.is_fresh(now, ttl) {
            return None;
        }
        s.latest += 1;
        s.data.is_loading = true;
        Some(s.latest)
    }

    /// Apply a settled fetch. Results of superseded fetches are dropped.
    fn settle(&self, seq: u64, result: PersonnelResult<Vec<T>>, now: DateTime<Utc>) {
        let mut s = self.state.write();
        if seq != s.latest {
            debug!(collection = self.name, seq, latest = s.latest, "discarding superseded fetch");
            return;
        }
        s.data.is_loading = false;
        match result {
            Ok(items) => {
                debug!(collection = self.name, count = items.len(), "collection refreshed");
                s.data.items = items;
                s.data.last_fetched_at = Some(now);
            }
            Err(e) => {
                warn!(collection = self.name, error = %e, "refresh failed; keeping previous data");
            }
        }
    }

    fn clear(&self) {
        let mut s = self.state.write();
        s.latest += 1;
        s.data = Collection::default();
    }
}

/// The shared data cache.
pub struct DataCache {
    api: Arc<dyn PersonnelApi>,
    session: SessionHandle,
    clock: Arc<dyn Clock>,
    ttl: TimeDelta,
    fetch_timeout: Duration,
    departments: Slot<Department>,
    titles: Slot<Title>,
    people: Slot<Person>,
    tasks: Slot<Task>,
    meetings: Slot<Meeting>,
}

impl DataCache {
    pub fn new(
        api: Arc<dyn PersonnelApi>,
        session: SessionHandle,
        clock: Arc<dyn Clock>,
        ttl: Duration,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            api,
            session,
            clock,
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            fetch_timeout,
            departments: Slot::new("departments"),
            titles: Slot::new("titles"),
            people: Slot::new("people"),
            tasks: Slot::new("tasks"),
            meetings: Slot::new("meetings"),
        }
    }

    async fn refresh_slot<T, Fut>(&self, slot: &Slot<T>, force: bool, fetch: Fut)
    where
        T: Clone,
        Fut: Future<Output = PersonnelResult<Vec<T>>>,
    {
        if !self.session.is_authenticated() {
            debug!(collection = slot.name, "not signed in; skipping refresh");
            return;
        }
        let Some(seq) = slot.begin(force, self.clock.now(), self.ttl) else {
            debug!(collection = slot.name, "cache hit");
            return;
        };

        let result = match tokio::time::timeout(self.fetch_timeout, fetch).await {
            Ok(result) => result,
            Err(_) => Err(PersonnelError::Timeout),
        };
        slot.settle(seq, result, self.clock.now());
    }

    #[instrument(name = "personnel.cache.refresh_departments", skip(self))]
    pub async fn refresh_departments(&self, force: bool) {
        let fetch = async {
            let mut items = self.api.list_departments().await?;
            items.sort_by(|a, b| compare_names(&a.name, &b.name));
            Ok::<_, PersonnelError>(items)
        };
        self.refresh_slot(&self.departments, force, fetch).await
    }

    #[instrument(name = "personnel.cache.refresh_titles", skip(self))]
    pub async fn refresh_titles(&self, force: bool) {
        let fetch = async {
            let mut items = self.api.list_titles().await?;
            items.sort_by(|a, b| compare_names(&a.name, &b.name));
            Ok::<_, PersonnelError>(items)
        };
        self.refresh_slot(&self.titles, force, fetch).await
    }

    #[instrument(name = "personnel.cache.refresh_people", skip(self))]
    pub async fn refresh_people(&self, force: bool) {
        self.refresh_slot(&self.people, force, self.api.list_people())
            .await
    }

    #[instrument(name = "personnel.cache.refresh_tasks", skip(self))]
    pub async fn refresh_tasks(&self, force: bool) {
        self.refresh_slot(&self.tasks, force, self.api.list_tasks())
            .await
    }

    #[instrument(name = "personnel.cache.refresh_meetings", skip(self))]
    pub async fn refresh_meetings(&self, force: bool) {
        self.refresh_slot(&self.meetings, force, self.api.list_meetings())
            .await
    }

    /// Refresh all five collections concurrently; one failure never holds
    /// up the others.
    #[instrument(name = "personnel.cache.refresh_all", skip(self))]
    pub async fn refresh_all(&self, force: bool) {
        futures::join!(
            self.refresh_departments(force),
            self.refresh_titles(force),
            self.refresh_people(force),
            self.refresh_tasks(force),
            self.refresh_meetings(force),
        );
    }

    pub fn departments(&self) -> Collection<Department> {
        self.departments.read()
    }

    pub fn titles(&self) -> Collection<Title> {
        self.titles.read()
    }

    pub fn people(&self) -> Collection<Person> {
        self.people.read()
    }

    pub fn tasks(&self) -> Collection<Task> {
        self.tasks.read()
    }

    pub fn meetings(&self) -> Collection<Meeting> {
        self.meetings.read()
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            departments: self.departments(),
            titles: self.titles(),
            people: self.people(),
            tasks: self.tasks(),
            meetings: self.meetings(),
        }
    }

    /// Drop everything. Fetches still in flight will not write back.
    pub fn clear(&self) {
        self.departments.clear();
        self.titles.clear();
        self.people.clear();
        self.tasks.clear();
        self.meetings.clear();
        debug!("cache cleared");
    }
}

/// Display-order comparison for names: case and accents are ignored first,
/// the raw string breaks ties.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    name_key(a).cmp(&name_key(b)).then_with(|| a.cmp(b))
}

/// Lowercased, with Latin-1 and Latin Extended-A letters folded to their
/// base ASCII spelling. Other scripts compare by code point.
fn name_key(s: &str) -> String {
    let mut key = String::with_capacity(s.len());
    for c in s.chars().flat_map(char::to_lowercase) {
        match fold_ligature(c) {
            Some(spelled) => key.push_str(spelled),
            None => key.push(fold_accent(c)),
        }
    }
    key
}

fn fold_ligature(c: char) -> Option<&'static str> {
    Some(match c {
        'ß' => "ss",
        'æ' => "ae",
        'œ' => "oe",
        'þ' => "th",
        'ĳ' => "ij",
        _ => return None,
    })
}

fn fold_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => 'c',
        'ď' | 'đ' | 'ð' => 'd',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => 'g',
        'ĥ' | 'ħ' => 'h',
        'ì' | 'í' | 'î' | 'ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => 'i',
        'ĵ' => 'j',
        'ķ' => 'k',
        'ĺ' | 'ļ' | 'ľ' | 'ŀ' | 'ł' => 'l',
        'ñ' | 'ń' | 'ņ' | 'ň' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ŏ' | 'ő' => 'o',
        'ŕ' | 'ŗ' | 'ř' => 'r',
        'ś' | 'ŝ' | 'ş' | 'š' | 'ș' => 's',
        'ţ' | 'ť' | 'ŧ' | 'ț' => 't',
        'ù' | 'ú' | 'û' | 'ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => 'u',
        'ŵ' => 'w',
        'ý' | 'ÿ' | 'ŷ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        other => other,
    }
}
