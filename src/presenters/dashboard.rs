//! Seller dashboard aggregation.
//!
//! Bookings are bucketed by the calendar day they were made, in the
//! viewer's timezone, and the last bucket is compared with the mean of the
//! earlier ones.

use crate::error::AppError;
use crate::models::{Booking, Listing};
use crate::presenters::{Alert, ViewScope};
use crate::services::{AuthSession, BookingRepository, ListingRepository};
use chrono::{Local, NaiveDate, TimeZone};
use serde::Serialize;
use std::collections::BTreeMap;

/// Label for bookings without a usable timestamp.
pub const UNKNOWN_DAY: &str = "Unknown";

/// Number of bookings made on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayBucket {
    pub label: String,
    pub count: u64,
}

/// Change of the last bucket against the mean of the prior ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Trend {
    pub percent: u32,
    pub up: bool,
}

impl Default for Trend {
    fn default() -> Self {
        Self {
            percent: 0,
            up: true,
        }
    }
}

/// Bucket bookings by day, oldest first; undated bookings go last.
pub fn bucket_by_day<Tz: TimeZone>(bookings: &[Booking], tz: &Tz) -> Vec<DayBucket> {
    let mut days: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    let mut unknown = 0;

    for booking in bookings {
        match booking.created_at {
            Some(ts) => *days.entry(ts.with_timezone(tz).date_naive()).or_default() += 1,
            None => unknown += 1,
        }
    }

    let mut buckets: Vec<DayBucket> = days
        .into_iter()
        .map(|(day, count)| DayBucket {
            label: day.format("%-m/%-d/%Y").to_string(),
            count,
        })
        .collect();
    if unknown > 0 {
        buckets.push(DayBucket {
            label: UNKNOWN_DAY.to_string(),
            count: unknown,
        });
    }
    buckets
}

/// Trend of the last value against the mean of the values before it.
///
/// Fewer than two values is flat. A zero prior mean yields
/// `round(last * 100)` and counts as up.
pub fn calc_trend(series: &[u64]) -> Trend {
    let Some((&last, prior)) = series.split_last() else {
        return Trend::default();
    };
    if prior.is_empty() {
        return Trend::default();
    }

    let last = last as f64;
    let mean = prior.iter().sum::<u64>() as f64 / prior.len() as f64;
    if mean == 0.0 {
        return Trend {
            percent: (last * 100.0).round() as u32,
            up: true,
        };
    }

    Trend {
        percent: ((last - mean).abs() / mean * 100.0).round() as u32,
        up: last >= mean,
    }
}

/// Everything the dashboard renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub service_count: usize,
    pub booking_count: usize,
    pub labels: Vec<String>,
    /// Bookings per day; `[0]` when there are none.
    pub series: Vec<u64>,
    pub bookings_trend: Trend,
    pub services_trend: Trend,
}

impl DashboardSummary {
    pub fn compute<Tz: TimeZone>(listings: &[Listing], bookings: &[Booking], tz: &Tz) -> Self {
        let buckets = bucket_by_day(bookings, tz);
        let labels: Vec<String> = buckets.iter().map(|b| b.label.clone()).collect();
        let mut series: Vec<u64> = buckets.iter().map(|b| b.count).collect();
        if series.is_empty() {
            series.push(0);
        }

        let services = listings.len() as u64;
        Self {
            service_count: listings.len(),
            booking_count: bookings.len(),
            bookings_trend: calc_trend(&series),
            services_trend: calc_trend(&[services, services.saturating_sub(1)]),
            labels,
            series,
        }
    }
}

pub struct DashboardView {
    scope: ViewScope,
    listings: ListingRepository,
    bookings: BookingRepository,
    session: AuthSession,
    pub summary: Option<DashboardSummary>,
    pub loading: bool,
    pub alert: Option<Alert>,
}

impl DashboardView {
    pub fn new(
        scope: ViewScope,
        listings: ListingRepository,
        bookings: BookingRepository,
        session: AuthSession,
    ) -> Self {
        Self {
            scope,
            listings,
            bookings,
            session,
            summary: None,
            loading: false,
            alert: None,
        }
    }

    /// Fetch listings and every booking concurrently and aggregate them in
    /// the local timezone.
    pub async fn load(&mut self) {
        self.load_in(&Local).await
    }

    pub async fn load_in<Tz: TimeZone>(&mut self, tz: &Tz) {
        if self.session.current_identity().is_none() {
            self.alert = Some(Alert::from_error(&AppError::unauthorized(
                "Sign in to see your dashboard",
            )));
            return;
        }

        self.loading = true;
        let result = futures::try_join!(
            self.listings.list_all(),
            self.bookings.list_all()
        );
        if !self.scope.is_mounted() {
            return;
        }
        self.loading = false;

        match result {
            Ok((listings, bookings)) => {
                self.summary = Some(DashboardSummary::compute(&listings, &bookings, tz));
            }
            Err(e) => {
                log::warn!("[dashboard] Could not load dashboard: {}", e);
                self.alert = Some(Alert::from_error(&e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};
    use serde_json::json;

    fn booking(id: &str, created_at: Option<&str>) -> Booking {
        let mut record = json!({"_id": id, "userEmail": "ada@example.com"});
        if let Some(ts) = created_at {
            record["createdAt"] = json!(ts);
        }
        Booking::decode(&record).unwrap()
    }

    #[test]
    fn test_trend_examples() {
        assert_eq!(calc_trend(&[2, 4]), Trend { percent: 100, up: true });
        assert_eq!(calc_trend(&[0, 3]), Trend { percent: 300, up: true });
        assert_eq!(calc_trend(&[4, 2]), Trend { percent: 50, up: false });
    }

    #[test]
    fn test_trend_short_series_is_flat() {
        assert_eq!(calc_trend(&[]), Trend::default());
        assert_eq!(calc_trend(&[7]), Trend::default());
    }

    #[test]
    fn test_trend_uses_mean_of_prior_buckets() {
        // prior mean 2, last 3
        assert_eq!(calc_trend(&[1, 3, 3]), Trend { percent: 50, up: true });
    }

    #[test]
    fn test_buckets_sorted_with_unknown_last() {
        let bookings = vec![
            booking("1", Some("2025-02-10T09:00:00Z")),
            booking("2", None),
            booking("3", Some("2025-01-05T09:00:00Z")),
            booking("4", Some("2025-02-10T18:00:00Z")),
        ];

        let buckets = bucket_by_day(&bookings, &Utc);
        let labels: Vec<&str> = buckets.iter().map(|b| b.label.as_str()).collect();
        let counts: Vec<u64> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(labels, vec!["1/5/2025", "2/10/2025", "Unknown"]);
        assert_eq!(counts, vec![1, 2, 1]);
    }

    #[test]
    fn test_buckets_follow_viewer_timezone() {
        let bookings = vec![booking("1", Some("2025-01-05T23:30:00Z"))];
        let east = FixedOffset::east_opt(2 * 3600).unwrap();

        assert_eq!(bucket_by_day(&bookings, &Utc)[0].label, "1/5/2025");
        assert_eq!(bucket_by_day(&bookings, &east)[0].label, "1/6/2025");
    }

    #[test]
    fn test_summary_of_empty_data() {
        let summary = DashboardSummary::compute(&[], &[], &Utc);
        assert_eq!(summary.series, vec![0]);
        assert!(summary.labels.is_empty());
        assert_eq!(summary.bookings_trend, Trend::default());
        assert_eq!(summary.services_trend, Trend::default());
    }

    #[test]
    fn test_services_trend() {
        let listings: Vec<Listing> = (0..4)
            .map(|i| Listing::decode(&json!({"_id": i.to_string()})).unwrap())
            .collect();
        let summary = DashboardSummary::compute(&listings, &[], &Utc);
        assert_eq!(summary.service_count, 4);
        // [4, 3]: 25% below
        assert_eq!(summary.services_trend, Trend { percent: 25, up: false });
    }
}
