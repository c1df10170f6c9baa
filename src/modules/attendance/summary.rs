//! Yearly attendance summaries.
//!
//! Summaries are observational: they report how much quota was actually
//! used, including overshoot that the write path would have refused (for
//! example rows edited or imported outside the ledger). They never fail.

use chrono::Datelike;
use homeroom_config::AttendancePolicyConfig;
use std::collections::BTreeMap;

use crate::modules::attendance::model::{
    AttendanceReason, AttendanceRecord, AttendanceSummary, AttendanceType,
};
use crate::modules::attendance::policy::{annual_cap, distinct_dates, month_token};

pub fn build_summary(
    student_id: i64,
    year: i32,
    records: &[AttendanceRecord],
    policy: &AttendancePolicyConfig,
) -> AttendanceSummary {
    let in_scope: Vec<&AttendanceRecord> = records
        .iter()
        .filter(|record| record.student_id == student_id && record.date.year() == year)
        .collect();

    let mut counts_by_type: BTreeMap<AttendanceType, i64> =
        AttendanceType::ALL.into_iter().map(|kind| (kind, 0)).collect();
    for record in &in_scope {
        *counts_by_type.entry(record.kind).or_insert(0) += 1;
    }

    let external_domestic_days =
        distinct_dates(in_scope.iter().copied(), AttendanceReason::ExternalDomestic).len() as i64;
    let external_overseas_days =
        distinct_dates(in_scope.iter().copied(), AttendanceReason::ExternalOverseas).len() as i64;

    let mut menstrual_per_month: BTreeMap<String, usize> = BTreeMap::new();
    for record in in_scope
        .iter()
        .filter(|record| record.reason == AttendanceReason::Menstrual)
    {
        *menstrual_per_month.entry(month_token(record.date)).or_insert(0) += 1;
    }

    let mut warnings = Vec::new();
    for (reason, label, used) in [
        (AttendanceReason::ExternalDomestic, "domestic", external_domestic_days),
        (AttendanceReason::ExternalOverseas, "overseas", external_overseas_days),
    ] {
        if let Some(cap) = annual_cap(policy, reason)
            && used > cap
        {
            warnings.push(format!(
                "External {label} leave used on {used} days, exceeding the annual limit of {cap}"
            ));
        }
    }

    let repeated_months: Vec<&str> = menstrual_per_month
        .iter()
        .filter(|(_, count)| **count > 1)
        .map(|(month, _)| month.as_str())
        .collect();
    if !repeated_months.is_empty() {
        warnings.push(format!(
            "More than one MENSTRUAL record in {}; manual data review required",
            repeated_months.join(", ")
        ));
    }

    AttendanceSummary {
        student_id,
        year,
        counts_by_type,
        external_domestic_days,
        external_overseas_days,
        menstrual_months_used: menstrual_per_month.into_keys().collect(),
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    const STUDENT: i64 = 7;

    fn record(
        id: i64,
        kind: AttendanceType,
        reason: AttendanceReason,
        on: NaiveDate,
    ) -> AttendanceRecord {
        AttendanceRecord {
            id,
            student_id: STUDENT,
            date: on,
            kind,
            reason,
            periods: 0,
            note: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    #[test]
    fn test_empty_year_has_all_types_at_zero() {
        let summary = build_summary(STUDENT, 2025, &[], &AttendancePolicyConfig::default());

        assert_eq!(summary.counts_by_type.len(), 5);
        assert!(summary.counts_by_type.values().all(|count| *count == 0));
        assert_eq!(summary.external_domestic_days, 0);
        assert_eq!(summary.external_overseas_days, 0);
        assert!(summary.menstrual_months_used.is_empty());
        assert!(summary.warnings.is_empty());
    }

    #[test]
    fn test_counts_and_months() {
        let records = vec![
            record(1, AttendanceType::Absent, AttendanceReason::Menstrual, day(3, 10)),
            record(2, AttendanceType::Late, AttendanceReason::Normal, day(3, 11)),
            record(3, AttendanceType::Late, AttendanceReason::Menstrual, day(1, 5)),
            record(4, AttendanceType::EarlyLeave, AttendanceReason::Official, day(6, 2)),
        ];
        let summary = build_summary(STUDENT, 2025, &records, &AttendancePolicyConfig::default());

        assert_eq!(summary.counts_by_type[&AttendanceType::Absent], 1);
        assert_eq!(summary.counts_by_type[&AttendanceType::Late], 2);
        assert_eq!(summary.counts_by_type[&AttendanceType::EarlyLeave], 1);
        assert_eq!(summary.counts_by_type[&AttendanceType::Present], 0);
        assert_eq!(summary.menstrual_months_used, vec!["2025-01", "2025-03"]);
        assert!(summary.warnings.is_empty());
    }

    #[test]
    fn test_external_days_are_distinct_dates() {
        let mut records = Vec::new();
        for d in 1..=7 {
            records.push(record(
                d as i64,
                AttendanceType::Absent,
                AttendanceReason::ExternalDomestic,
                day(4, d),
            ));
        }
        records.push(record(
            100,
            AttendanceType::Late,
            AttendanceReason::ExternalDomestic,
            day(4, 1),
        ));

        let summary = build_summary(STUDENT, 2025, &records, &AttendancePolicyConfig::default());

        assert_eq!(summary.external_domestic_days, 7);
        assert!(summary.warnings.is_empty());
    }

    #[test]
    fn test_overshoot_is_reported() {
        let mut records = Vec::new();
        for d in 1..=8 {
            records.push(record(
                d as i64,
                AttendanceType::Absent,
                AttendanceReason::ExternalDomestic,
                day(5, d),
            ));
        }
        for d in 1..=31 {
            records.push(record(
                100 + d as i64,
                AttendanceType::Absent,
                AttendanceReason::ExternalOverseas,
                day(7, d),
            ));
        }

        let summary = build_summary(STUDENT, 2025, &records, &AttendancePolicyConfig::default());

        assert_eq!(summary.external_domestic_days, 8);
        assert_eq!(summary.external_overseas_days, 31);
        assert_eq!(summary.warnings.len(), 2);
        assert!(summary.warnings[0].contains("domestic"));
        assert!(summary.warnings[1].contains("overseas"));
    }

    #[test]
    fn test_repeated_menstrual_month_is_flagged() {
        let records = vec![
            record(1, AttendanceType::Absent, AttendanceReason::Menstrual, day(3, 10)),
            record(2, AttendanceType::Late, AttendanceReason::Menstrual, day(3, 20)),
        ];
        let summary = build_summary(STUDENT, 2025, &records, &AttendancePolicyConfig::default());

        assert_eq!(summary.menstrual_months_used, vec!["2025-03"]);
        assert_eq!(summary.warnings.len(), 1);
        assert!(summary.warnings[0].contains("2025-03"));
    }

    #[test]
    fn test_records_outside_scope_are_ignored() {
        let mut other_student =
            record(1, AttendanceType::Absent, AttendanceReason::Normal, day(3, 10));
        other_student.student_id = STUDENT + 1;
        let other_year = record(
            2,
            AttendanceType::Absent,
            AttendanceReason::Normal,
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        );

        let summary = build_summary(
            STUDENT,
            2025,
            &[other_student, other_year],
            &AttendancePolicyConfig::default(),
        );
        assert_eq!(summary.counts_by_type[&AttendanceType::Absent], 0);
    }

    #[test]
    fn test_summary_is_deterministic() {
        let records = vec![
            record(2, AttendanceType::Late, AttendanceReason::ExternalOverseas, day(9, 1)),
            record(1, AttendanceType::Absent, AttendanceReason::Menstrual, day(2, 3)),
        ];
        let mut reversed = records.clone();
        reversed.reverse();

        let policy = AttendancePolicyConfig::default();
        assert_eq!(
            build_summary(STUDENT, 2025, &records, &policy),
            build_summary(STUDENT, 2025, &reversed, &policy)
        );
    }
}
