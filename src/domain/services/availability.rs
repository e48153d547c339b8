use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};
use crate::domain::models::{
    blackout::Blackout, booking::Booking, professional::Professional, schedule::{TimeWindow, WeekdayConfig, MINUTES_PER_DAY},
    service::Service, tenant::Tenant,
};
use crate::domain::ports::{BookingRepository, CatalogRepository};
use crate::domain::services::catalog::{CatalogService, Offering};
use crate::error::AppError;

/// Who the client asked for. `Any` stays unresolved until the reservation
/// transaction picks a concrete professional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfessionalSelector {
    Specific(String),
    Any,
}

impl ProfessionalSelector {
    pub fn from_request(professional: Option<&str>, indistinct: bool) -> Self {
        match professional.map(str::trim) {
            Some(id) if !indistinct && !id.is_empty() && !is_any_alias(id) => {
                ProfessionalSelector::Specific(id.to_string())
            }
            _ => ProfessionalSelector::Any,
        }
    }
}

fn is_any_alias(id: &str) -> bool {
    matches!(id.to_ascii_lowercase().as_str(), "any" | "indistinto" | "indistinct")
}

/// Half-open [start, end) in minutes since local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MinuteRange {
    start: i32,
    end: i32,
}

impl MinuteRange {
    fn overlaps(&self, other: &MinuteRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    fn intersect(&self, other: &MinuteRange) -> Option<MinuteRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then_some(MinuteRange { start, end })
    }
}

fn windows_to_ranges(windows: &[TimeWindow]) -> Vec<MinuteRange> {
    windows.iter()
        .filter_map(TimeWindow::as_minutes)
        .map(|(start, end)| MinuteRange { start, end })
        .collect()
}

/// Grid parameters for one service on one tenant.
#[derive(Debug, Clone, Copy)]
pub struct SlotRules {
    pub duration_min: i32,
    pub step_min: i32,
    /// Slots must start strictly after this instant.
    pub not_before: DateTime<Utc>,
}

impl SlotRules {
    pub fn for_service(tenant: &Tenant, service: &Service, now: DateTime<Utc>) -> Self {
        let duration_min = service.session_duration_min;
        Self {
            duration_min,
            step_min: tenant.slot_step_min.filter(|s| *s > 0).unwrap_or(duration_min),
            not_before: now + Duration::minutes(tenant.min_notice_min.max(0) as i64),
        }
    }
}

/// One professional's inputs for one local calendar day.
#[derive(Debug, Clone, Copy)]
pub struct DayCalendar<'a> {
    pub date: NaiveDate,
    pub tz: Tz,
    pub working_hours: &'a WeekdayConfig,
    /// `None` when the branch does not restrict hours.
    pub branch_hours: Option<&'a WeekdayConfig>,
    /// Absolute intervals the professional cannot be booked in.
    pub busy: &'a [(DateTime<Utc>, DateTime<Utc>)],
}

/// Maps a local wall-clock time to an instant. Times skipped by a DST
/// jump have no instant; repeated times resolve to the first occurrence.
pub fn local_to_utc(tz: Tz, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

fn local_minute_range(date: NaiveDate, tz: Tz, start: DateTime<Utc>, end: DateTime<Utc>) -> MinuteRange {
    let midnight = date.and_time(NaiveTime::MIN);
    let to_offset = |instant: DateTime<Utc>| -> TimeDelta { instant.with_timezone(&tz).naive_local() - midnight };
    let clamp = |minutes: i64| minutes.clamp(-1, MINUTES_PER_DAY as i64 + 1) as i32;

    MinuteRange {
        start: clamp(to_offset(start).num_seconds().div_euclid(60)),
        end: clamp((to_offset(end).num_seconds() + 59).div_euclid(60)),
    }
}

/// Free slot start times for one professional on one day: working hours
/// intersected with branch hours, minus busy intervals, cut into a grid of
/// `duration_min` wide slots every `step_min` from each open window's start.
pub fn compute_day_slots(day: &DayCalendar<'_>, rules: &SlotRules) -> Vec<NaiveTime> {
    if rules.duration_min <= 0 || rules.step_min <= 0 {
        return Vec::new();
    }

    let weekday = day.date.weekday();
    let working = windows_to_ranges(day.working_hours.windows_for(weekday));
    let open: Vec<MinuteRange> = match day.branch_hours {
        Some(hours) => {
            let branch = windows_to_ranges(hours.windows_for(weekday));
            working.iter()
                .flat_map(|w| branch.iter().filter_map(move |b| w.intersect(b)))
                .collect()
        }
        None => working,
    };

    let busy: Vec<MinuteRange> = day.busy.iter()
        .map(|(start, end)| local_minute_range(day.date, day.tz, *start, *end))
        .filter(|r| r.start < r.end && r.end > 0 && r.start < MINUTES_PER_DAY)
        .collect();

    let mut slots = Vec::new();
    for window in open {
        let mut cursor = window.start;
        while cursor + rules.duration_min <= window.end {
            let candidate = MinuteRange { start: cursor, end: cursor + rules.duration_min };

            if !busy.iter().any(|b| b.overlaps(&candidate))
                && let Some(time) = NaiveTime::from_hms_opt((cursor / 60) as u32, (cursor % 60) as u32, 0)
                && let Some(start_utc) = local_to_utc(day.tz, day.date, time)
                && start_utc > rules.not_before
            {
                slots.push(time);
            }
            cursor += rules.step_min;
        }
    }

    slots.sort();
    slots.dedup();
    slots
}

/// Union of several professionals' slot lists, deduplicated by start time.
pub fn merge_slots<I>(lists: I) -> Vec<NaiveTime>
where
    I: IntoIterator<Item = Vec<NaiveTime>>,
{
    lists.into_iter().flatten().collect::<BTreeSet<_>>().into_iter().collect()
}

/// Last bookable local date. `None` when the horizon runs past the
/// calendar, which leaves nothing bookable.
pub fn horizon_end(today: NaiveDate, max_horizon_days: i32) -> Option<NaiveDate> {
    today.checked_add_days(Days::new(max_horizon_days.max(0) as u64))
}

pub fn is_within_horizon(date: NaiveDate, today: NaiveDate, max_horizon_days: i32) -> bool {
    horizon_end(today, max_horizon_days).is_some_and(|end| date >= today && date <= end)
}

pub fn parse_month(month: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(&format!("{}-01", month.trim()), "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Invalid month format (YYYY-MM)".into()))
}

/// Slots of one professional for one day. `open` ignores existing bookings
/// and tells an off-grid time apart from a taken one.
#[derive(Debug, Clone)]
pub struct ProfessionalSlots {
    pub professional_id: String,
    pub free: Vec<NaiveTime>,
    pub open: Vec<NaiveTime>,
}

/// Bookings and blackouts read once for a whole date range.
struct CalendarSnapshot {
    bookings: Vec<Booking>,
    blackouts: Vec<Blackout>,
}

impl CalendarSnapshot {
    fn blocked_for(&self, branch_id: &str, professional_id: &str, include_bookings: bool) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        let blackouts = self.blackouts.iter()
            .filter(|b| b.applies_to(branch_id, professional_id))
            .map(|b| (b.starts_at, b.ends_at));

        if !include_bookings {
            return blackouts.collect();
        }

        self.bookings.iter()
            .filter(|b| b.professional_id == professional_id && b.status.blocks_calendar())
            .map(|b| (b.start_time, b.end_time))
            .chain(blackouts)
            .collect()
    }
}

pub struct AvailabilityService {
    catalog: Arc<CatalogService>,
    catalog_repo: Arc<dyn CatalogRepository>,
    booking_repo: Arc<dyn BookingRepository>,
}

#[derive(Debug, Clone)]
pub struct SlotQuery {
    pub service_id: String,
    pub branch_id: Option<String>,
    pub professional: ProfessionalSelector,
}

impl AvailabilityService {
    pub fn new(
        catalog: Arc<CatalogService>,
        catalog_repo: Arc<dyn CatalogRepository>,
        booking_repo: Arc<dyn BookingRepository>,
    ) -> Self {
        Self { catalog, catalog_repo, booking_repo }
    }

    /// Days of `month` (any date inside it) with at least one free slot.
    pub async fn available_days(
        &self,
        tenant: &Tenant,
        query: &SlotQuery,
        month: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<NaiveDate>, AppError> {
        let offering = self.resolve(tenant, query).await?;
        if offering.professionals.is_empty() {
            return Ok(Vec::new());
        }

        let first = month.with_day(1).unwrap_or(month);
        let last = first.checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(first);

        let tz = tenant.tz();
        let today = now.with_timezone(&tz).date_naive();
        let Some(last_bookable) = horizon_end(today, tenant.max_horizon_days) else {
            warn!("available_days: horizon of {} days overflows the calendar for tenant {}", tenant.max_horizon_days, tenant.slug);
            return Ok(Vec::new());
        };
        let range_start = first.max(today);
        let range_end = last.min(last_bookable);
        if range_start > range_end {
            return Ok(Vec::new());
        }

        let snapshot = self.load_snapshot(tenant, &offering, range_start, range_end).await?;
        let rules = SlotRules::for_service(tenant, &offering.service, now);

        let mut days = Vec::new();
        let mut date = range_start;
        while date <= range_end {
            let bookable = offering.professionals.iter().any(|p| {
                !self.slots_for(&offering, &snapshot, p, date, tz, &rules, true).is_empty()
            });
            if bookable {
                days.push(date);
            }
            let Some(next) = date.succ_opt() else { break };
            date = next;
        }

        debug!("available_days: {} of {} bookable for service {}", days.len(), first.format("%Y-%m"), offering.service.id);
        Ok(days)
    }

    /// Start times on `date`; for `Any` the union over eligible professionals.
    pub async fn day_slots(
        &self,
        tenant: &Tenant,
        query: &SlotQuery,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<NaiveTime>, AppError> {
        let offering = self.resolve(tenant, query).await?;
        let per_professional = self.slots_by_professional(tenant, &offering, date, now).await?;
        Ok(merge_slots(per_professional.into_iter().map(|p| p.free)))
    }

    /// Per-professional slots in catalog order (by professional id).
    pub async fn slots_by_professional(
        &self,
        tenant: &Tenant,
        offering: &Offering,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<ProfessionalSlots>, AppError> {
        let tz = tenant.tz();
        let today = now.with_timezone(&tz).date_naive();
        if offering.professionals.is_empty() || !is_within_horizon(date, today, tenant.max_horizon_days) {
            return Ok(Vec::new());
        }

        let snapshot = self.load_snapshot(tenant, offering, date, date).await?;
        let rules = SlotRules::for_service(tenant, &offering.service, now);

        Ok(offering.professionals.iter()
            .map(|p| ProfessionalSlots {
                professional_id: p.id.clone(),
                free: self.slots_for(offering, &snapshot, p, date, tz, &rules, true),
                open: self.slots_for(offering, &snapshot, p, date, tz, &rules, false),
            })
            .collect())
    }

    async fn resolve(&self, tenant: &Tenant, query: &SlotQuery) -> Result<Offering, AppError> {
        self.catalog.resolve_offering(tenant, &query.service_id, query.branch_id.as_deref(), &query.professional).await
    }

    #[allow(clippy::too_many_arguments)]
    fn slots_for(
        &self,
        offering: &Offering,
        snapshot: &CalendarSnapshot,
        professional: &Professional,
        date: NaiveDate,
        tz: Tz,
        rules: &SlotRules,
        include_bookings: bool,
    ) -> Vec<NaiveTime> {
        let working_hours = professional.working_hours();
        let branch_hours = offering.branch.opening_hours();
        let busy = snapshot.blocked_for(&offering.branch.id, &professional.id, include_bookings);

        compute_day_slots(&DayCalendar {
            date,
            tz,
            working_hours: &working_hours,
            branch_hours: branch_hours.as_ref(),
            busy: &busy,
        }, rules)
    }

    /// One read of bookings and blackouts covering the local dates. The UTC
    /// window is padded by a day on each side so any offset is covered.
    async fn load_snapshot(
        &self,
        tenant: &Tenant,
        offering: &Offering,
        first: NaiveDate,
        last: NaiveDate,
    ) -> Result<CalendarSnapshot, AppError> {
        let start = first.checked_sub_days(Days::new(1)).unwrap_or(first).and_time(NaiveTime::MIN).and_utc();
        let end = last.checked_add_days(Days::new(2)).unwrap_or(last).and_time(NaiveTime::MIN).and_utc();
        let ids: Vec<String> = offering.professionals.iter().map(|p| p.id.clone()).collect();

        let bookings = self.booking_repo.list_active_for_professionals(&ids, start, end).await?;
        let blackouts = self.catalog_repo.list_blackouts(&tenant.id, start, end).await?;
        Ok(CalendarSnapshot { bookings, blackouts })
    }
}
