use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};

use crate::models::{DueDateRecord, DueDateSection};

/// Classifies each record into exactly one section relative to `now`.
///
/// The calendar-day and week comparisons happen in `now`'s time zone, while
/// the past-due check compares full instants. Week arithmetic uses ISO 8601
/// week-based years: "next week" is the ISO week containing `now + 7 days`,
/// which keeps week 52/53 rolling into week 1 well defined.
///
/// Input order is preserved within each bucket; any display sorting is the
/// caller's concern.
pub fn group_due_dates<Tz: TimeZone>(
    records: &[DueDateRecord],
    now: &DateTime<Tz>,
) -> BTreeMap<DueDateSection, Vec<DueDateRecord>> {
    let now_utc = now.with_timezone(&Utc);
    let this_week = now.iso_week();
    let next_week = (now.clone() + Duration::days(7)).iso_week();

    let mut sections: BTreeMap<DueDateSection, Vec<DueDateRecord>> = BTreeMap::new();
    for record in records {
        let section = if record.is_complete {
            DueDateSection::Completed
        } else if record.due_at < now_utc {
            DueDateSection::PastDue
        } else {
            let due_local = record.due_at.with_timezone(&now.timezone());
            if due_local.date_naive() == now.date_naive() {
                DueDateSection::Today
            } else if due_local.iso_week() == this_week {
                DueDateSection::ThisWeek
            } else if due_local.iso_week() == next_week {
                DueDateSection::NextWeek
            } else {
                DueDateSection::Upcoming
            }
        };
        sections.entry(section).or_default().push(record.clone());
    }
    sections
}

/// Appends each section of a freshly grouped page after the records already
/// accumulated for that section.
pub fn merge_sections(
    acc: &mut BTreeMap<DueDateSection, Vec<DueDateRecord>>,
    page: BTreeMap<DueDateSection, Vec<DueDateRecord>>,
) {
    for (section, records) in page {
        acc.entry(section).or_default().extend(records);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(block_id: &str, due_at: DateTime<Utc>) -> DueDateRecord {
        DueDateRecord {
            course_id: "course-v1:edX+DemoX+2024".to_string(),
            first_block_id: block_id.to_string(),
            due_at,
            title: format!("Assignment {block_id}"),
            learner_has_access: true,
            is_relative: false,
            course_name: "Demo Course".to_string(),
            is_complete: false,
        }
    }

    fn at(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
    }

    // Thursday, ISO week 52 of 2024.
    fn now() -> DateTime<Utc> {
        at(2024, 12, 26, 12)
    }

    #[test]
    fn every_record_lands_in_exactly_one_section() {
        let records = vec![
            record("a", at(2024, 12, 25, 12)),
            record("b", at(2024, 12, 26, 18)),
            record("c", at(2024, 12, 28, 9)),
            record("d", at(2024, 12, 31, 9)),
            record("e", at(2025, 1, 10, 9)),
        ];
        let grouped = group_due_dates(&records, &now());

        let total: usize = grouped.values().map(Vec::len).sum();
        assert_eq!(total, records.len());
        for r in &records {
            let holders = grouped
                .values()
                .filter(|list| list.iter().any(|g| g.first_block_id == r.first_block_id))
                .count();
            assert_eq!(holders, 1, "record {} duplicated or dropped", r.first_block_id);
        }
    }

    #[test]
    fn due_exactly_now_is_today_not_past_due() {
        let grouped = group_due_dates(&[record("a", now())], &now());
        assert!(grouped.contains_key(&DueDateSection::Today));
        assert!(!grouped.contains_key(&DueDateSection::PastDue));
    }

    #[test]
    fn earlier_same_day_is_past_due() {
        let grouped = group_due_dates(&[record("a", at(2024, 12, 26, 8))], &now());
        assert!(grouped.contains_key(&DueDateSection::PastDue));
    }

    #[test]
    fn later_same_day_is_today() {
        let grouped = group_due_dates(&[record("a", at(2024, 12, 26, 23))], &now());
        assert!(grouped.contains_key(&DueDateSection::Today));
    }

    #[test]
    fn same_iso_week_is_this_week() {
        // Saturday of the same ISO week.
        let grouped = group_due_dates(&[record("a", at(2024, 12, 28, 9))], &now());
        assert!(grouped.contains_key(&DueDateSection::ThisWeek));
    }

    #[test]
    fn next_week_across_iso_year_boundary() {
        // Dec 31 2024 falls in ISO week 1 of 2025; a raw week-number
        // increment from week 52 would misclassify it.
        let grouped = group_due_dates(&[record("a", at(2024, 12, 31, 9))], &now());
        assert!(grouped.contains_key(&DueDateSection::NextWeek));
    }

    #[test]
    fn beyond_next_week_is_upcoming() {
        let grouped = group_due_dates(&[record("a", at(2025, 1, 10, 9))], &now());
        assert!(grouped.contains_key(&DueDateSection::Upcoming));
    }

    #[test]
    fn completed_flag_wins_over_time_buckets() {
        let mut done = record("a", at(2024, 12, 1, 9));
        done.is_complete = true;
        let grouped = group_due_dates(&[done], &now());
        assert!(grouped.contains_key(&DueDateSection::Completed));
        assert!(!grouped.contains_key(&DueDateSection::PastDue));
    }

    #[test]
    fn bucket_preserves_input_order() {
        let records = vec![
            record("first", at(2024, 12, 20, 9)),
            record("second", at(2024, 12, 10, 9)),
        ];
        let grouped = group_due_dates(&records, &now());
        let past = &grouped[&DueDateSection::PastDue];
        assert_eq!(past[0].first_block_id, "first");
        assert_eq!(past[1].first_block_id, "second");
    }

    #[test]
    fn merge_appends_in_fetch_order() {
        let mut acc = group_due_dates(&[record("p1", at(2024, 12, 20, 9))], &now());
        let page2 = group_due_dates(
            &[
                record("p2a", at(2024, 12, 21, 9)),
                record("p2b", at(2025, 1, 10, 9)),
            ],
            &now(),
        );
        merge_sections(&mut acc, page2);

        let past: Vec<&str> = acc[&DueDateSection::PastDue]
            .iter()
            .map(|r| r.first_block_id.as_str())
            .collect();
        assert_eq!(past, vec!["p1", "p2a"]);
        assert_eq!(acc[&DueDateSection::Upcoming].len(), 1);
    }

    #[test]
    fn sections_iterate_in_display_priority_order() {
        let records = vec![
            record("up", at(2025, 1, 10, 9)),
            record("past", at(2024, 12, 20, 9)),
            record("today", at(2024, 12, 26, 20)),
        ];
        let grouped = group_due_dates(&records, &now());
        let order: Vec<DueDateSection> = grouped.keys().copied().collect();
        assert_eq!(
            order,
            vec![
                DueDateSection::PastDue,
                DueDateSection::Today,
                DueDateSection::Upcoming
            ]
        );
    }
}
