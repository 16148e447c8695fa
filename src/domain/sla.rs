//! Queue age and SLA urgency, derived from the local clock.

use chrono::{DateTime, Duration, Utc};

use super::models::{ReviewQueueItem, SlaStatus};

/// A deadline closer than this is reported as "Due Soon".
pub const DUE_SOON_WINDOW_MINUTES: i64 = 60;

/// Whole minutes an item has spent in the queue. Never negative, so clock
/// skew between client and backend cannot produce a negative age.
pub fn age_minutes(entered_queue_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - entered_queue_at).num_minutes().max(0)
}

/// Urgency of an item relative to its deadline.
///
/// No deadline means the item is on time.
pub fn sla_status(sla_deadline: Option<DateTime<Utc>>, now: DateTime<Utc>) -> SlaStatus {
    match sla_deadline {
        None => SlaStatus::OnTime,
        Some(deadline) if now > deadline => SlaStatus::Overdue,
        Some(deadline) if deadline - now <= Duration::minutes(DUE_SOON_WINDOW_MINUTES) => {
            SlaStatus::DueSoon
        }
        Some(_) => SlaStatus::OnTime,
    }
}

impl ReviewQueueItem {
    /// Recomputes `age_minutes`, `sla_status` and `is_overdue` against `now`.
    pub fn refresh_derived(&mut self, now: DateTime<Utc>) {
        self.age_minutes = age_minutes(self.entered_queue_at, now);
        self.sla_status = sla_status(self.sla_deadline, now);
        self.is_overdue = self.sla_status == SlaStatus::Overdue;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::fixtures;
    use crate::domain::models::{Priority, QueueStatus};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_age_minutes_is_never_negative() {
        let future = now() + Duration::minutes(30);
        assert_eq!(age_minutes(future, now()), 0);
        assert_eq!(age_minutes(now() - Duration::seconds(119), now()), 1);
        assert_eq!(age_minutes(now() - Duration::hours(25), now()), 1500);
    }

    #[test]
    fn test_sla_status_bands() {
        assert_eq!(sla_status(None, now()), SlaStatus::OnTime);
        assert_eq!(sla_status(Some(now() - Duration::minutes(5)), now()), SlaStatus::Overdue);
        assert_eq!(sla_status(Some(now()), now()), SlaStatus::DueSoon);
        assert_eq!(sla_status(Some(now() + Duration::minutes(60)), now()), SlaStatus::DueSoon);
        assert_eq!(sla_status(Some(now() + Duration::minutes(61)), now()), SlaStatus::OnTime);
    }

    #[test]
    fn test_urgent_item_past_deadline_is_overdue() {
        let mut item = fixtures::queue_item(1);
        item.queue_status = QueueStatus::Pending;
        item.priority = Priority::Urgent;
        item.entered_queue_at = now() - Duration::minutes(1500);
        item.sla_deadline = Some(now() - Duration::minutes(5));

        item.refresh_derived(now());

        assert_eq!(item.age_minutes, 1500);
        assert_eq!(item.sla_status, SlaStatus::Overdue);
        assert!(item.is_overdue);
    }

    #[test]
    fn test_refresh_overrides_backend_labels() {
        let mut item = fixtures::queue_item(2);
        item.entered_queue_at = now() - Duration::minutes(10);
        item.sla_deadline = Some(now() + Duration::hours(4));
        item.sla_status = SlaStatus::Overdue;
        item.is_overdue = true;

        item.refresh_derived(now());

        assert_eq!(item.sla_status, SlaStatus::OnTime);
        assert!(!item.is_overdue);
        assert_eq!(item.age_minutes, 10);
    }
}
