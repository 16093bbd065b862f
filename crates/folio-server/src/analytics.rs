//! In-memory visit counters.
//!
//! Counts page views, contact submissions, resume downloads and per-project
//! views for the lifetime of the process. Nothing is persisted; a restart
//! starts from zero.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use folio_common::{AnalyticsError, DayKey, ProjectId};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

/// Longest accepted project id, in characters.
pub const MAX_PROJECT_ID_LEN: usize = 128;

/// Distinct project ids tracked before new ones share the overflow bucket.
pub const MAX_TRACKED_PROJECTS: usize = 512;

/// Bucket counting views of projects past `MAX_TRACKED_PROJECTS`.
pub const OVERFLOW_PROJECT_ID: &str = "(other)";

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current UTC time.
    fn now(&self) -> DateTime<Utc>;

    /// Current UTC day.
    fn today(&self) -> DayKey {
        DayKey::new(self.now().date_naive())
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a settable instant.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Creates a clock stopped at `now`.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Kinds of site-wide visit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitKind {
    /// A page was viewed
    PageView,
    /// The contact form was submitted
    ContactForm,
    /// The resume was downloaded
    ResumeDownload,
}

/// Counts for one bucket (all time, or one day).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitTotals {
    /// Page views
    pub page_views: u64,
    /// Contact form submissions
    pub contact_forms: u64,
    /// Resume downloads
    pub resume_downloads: u64,
}

impl VisitTotals {
    fn bump(&mut self, kind: VisitKind) {
        let counter = match kind {
            VisitKind::PageView => &mut self.page_views,
            VisitKind::ContactForm => &mut self.contact_forms,
            VisitKind::ResumeDownload => &mut self.resume_downloads,
        };
        *counter = counter.saturating_add(1);
    }
}

/// Point-in-time copy of the counters, as served by the stats endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    /// All-time totals
    pub total: VisitTotals,
    /// Today's totals (zeros if nothing happened today)
    pub today: VisitTotals,
    /// Views per project
    pub project_views: BTreeMap<ProjectId, u64>,
    /// When the snapshot was taken
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct CounterState {
    total: VisitTotals,
    daily: BTreeMap<DayKey, VisitTotals>,
    project_views: BTreeMap<ProjectId, u64>,
}

/// Shared visit counter store.
///
/// Cheap to clone; clones share the same counters.
#[derive(Clone)]
pub struct VisitCounters {
    state: Arc<Mutex<CounterState>>,
    clock: Arc<dyn Clock>,
}

impl Default for VisitCounters {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl std::fmt::Debug for VisitCounters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisitCounters")
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

impl VisitCounters {
    /// Creates an empty store reading days from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(CounterState::default())),
            clock,
        }
    }

    /// Counts one event against the total and today's bucket.
    pub fn record(&self, kind: VisitKind) {
        let today = self.clock.today();
        let mut state = self.state.lock();
        state.total.bump(kind);
        state.daily.entry(today).or_default().bump(kind);
        debug!("Recorded {kind:?} for {today}");
    }

    /// Counts one view of a project. Returns its new view count.
    ///
    /// Missing or blank ids are rejected, as are ids longer than
    /// `MAX_PROJECT_ID_LEN`. Once `MAX_TRACKED_PROJECTS` ids are known,
    /// views of new ids count against `OVERFLOW_PROJECT_ID`.
    pub fn record_project_view(&self, project: Option<&str>) -> Result<u64, AnalyticsError> {
        let id = project
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(AnalyticsError::MissingProjectId)?;
        if id.chars().count() > MAX_PROJECT_ID_LEN {
            return Err(AnalyticsError::ProjectIdTooLong {
                max: MAX_PROJECT_ID_LEN,
            });
        }

        let mut state = self.state.lock();
        let mut key = ProjectId::new(id);
        if !state.project_views.contains_key(&key)
            && state.project_views.len() >= MAX_TRACKED_PROJECTS
        {
            debug!("Project table full, counting {id:?} as {OVERFLOW_PROJECT_ID}");
            key = ProjectId::new(OVERFLOW_PROJECT_ID);
        }
        let views = state.project_views.entry(key).or_insert(0);
        *views = views.saturating_add(1);
        Ok(*views)
    }

    /// Totals for one day.
    #[must_use]
    pub fn day(&self, day: DayKey) -> VisitTotals {
        self.state.lock().daily.get(&day).copied().unwrap_or_default()
    }

    /// Copies the current counters.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        let now = self.clock.now();
        let today = DayKey::new(now.date_naive());
        let state = self.state.lock();
        StatsSnapshot {
            total: state.total,
            today: state.daily.get(&today).copied().unwrap_or_default(),
            project_views: state.project_views.clone(),
            last_updated: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0)
            .single()
            .expect("valid time")
    }

    fn counters() -> (VisitCounters, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(at(14, 9)));
        (VisitCounters::new(clock.clone()), clock)
    }

    #[test]
    fn test_totals_and_today() {
        let (counters, _) = counters();
        for _ in 0..3 {
            counters.record(VisitKind::PageView);
        }
        counters.record(VisitKind::ContactForm);

        let stats = counters.snapshot();
        assert_eq!(stats.total.page_views, 3);
        assert_eq!(stats.today.page_views, 3);
        assert_eq!(stats.total.contact_forms, 1);
        assert_eq!(stats.today.contact_forms, 1);
        assert_eq!(stats.total.resume_downloads, 0);
    }

    #[test]
    fn test_day_rollover() {
        let (counters, clock) = counters();
        counters.record(VisitKind::ResumeDownload);
        clock.set(at(15, 0));
        counters.record(VisitKind::ResumeDownload);
        counters.record(VisitKind::PageView);

        let stats = counters.snapshot();
        assert_eq!(stats.total.resume_downloads, 2);
        assert_eq!(stats.today.resume_downloads, 1);
        assert_eq!(stats.today.page_views, 1);

        let yesterday = DayKey::from_ymd(2025, 3, 14).expect("valid date");
        assert_eq!(counters.day(yesterday).resume_downloads, 1);
    }

    #[test]
    fn test_empty_today() {
        let (counters, clock) = counters();
        counters.record(VisitKind::PageView);
        clock.set(at(20, 12));
        assert_eq!(counters.snapshot().today, VisitTotals::default());
    }

    #[test]
    fn test_project_views() {
        let (counters, _) = counters();
        let first = counters.record_project_view(Some("drill")).expect("recorded");
        let second = counters.record_project_view(Some(" drill ")).expect("recorded");
        let other = counters.record_project_view(Some("fireworks")).expect("recorded");
        assert_eq!((first, second, other), (1, 2, 1));

        let stats = counters.snapshot();
        assert_eq!(stats.project_views.get(&ProjectId::new("drill")), Some(&2));
        assert_eq!(stats.project_views.len(), 2);
    }

    #[test]
    fn test_project_view_requires_id() {
        let (counters, _) = counters();
        assert!(matches!(
            counters.record_project_view(None),
            Err(AnalyticsError::MissingProjectId)
        ));
        assert!(matches!(
            counters.record_project_view(Some("  ")),
            Err(AnalyticsError::MissingProjectId)
        ));
    }

    #[test]
    fn test_project_id_length_limit() {
        let (counters, _) = counters();
        let longest = "p".repeat(MAX_PROJECT_ID_LEN);
        assert_eq!(counters.record_project_view(Some(&longest)).expect("recorded"), 1);

        let too_long = "p".repeat(1_000_000);
        assert!(matches!(
            counters.record_project_view(Some(&too_long)),
            Err(AnalyticsError::ProjectIdTooLong { max: MAX_PROJECT_ID_LEN })
        ));
        assert_eq!(counters.snapshot().project_views.len(), 1);
    }

    #[test]
    fn test_distinct_projects_are_capped() {
        let (counters, _) = counters();
        for i in 0..MAX_TRACKED_PROJECTS + 100 {
            counters
                .record_project_view(Some(&format!("project-{i}")))
                .expect("recorded");
        }
        // Known ids keep counting after the table fills
        assert_eq!(counters.record_project_view(Some("project-0")).expect("recorded"), 2);

        let views = counters.snapshot().project_views;
        assert_eq!(views.len(), MAX_TRACKED_PROJECTS + 1);
        assert_eq!(views.get(&ProjectId::new(OVERFLOW_PROJECT_ID)), Some(&100));
    }

    #[test]
    fn test_clones_share_state() {
        let (counters, _) = counters();
        let other = counters.clone();
        other.record(VisitKind::PageView);
        assert_eq!(counters.snapshot().total.page_views, 1);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let (counters, _) = counters();
        counters.record(VisitKind::PageView);
        counters.record_project_view(Some("drill")).expect("recorded");

        let json = serde_json::to_value(counters.snapshot()).expect("serialize");
        assert_eq!(json["total"]["pageViews"], 1);
        assert_eq!(json["today"]["resumeDownloads"], 0);
        assert_eq!(json["projectViews"]["drill"], 1);
        assert_eq!(json["lastUpdated"], "2025-03-14T09:00:00Z");
    }
}
