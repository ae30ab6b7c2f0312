//! Meetings attended and funnel conversion (intro → POA → closing).

use std::collections::BTreeMap;

use serde::Serialize;

use super::{breakdown_key, rate, sort_rows, AggregationInput, DealRow};
use crate::targets::on_track;
use crate::types::{Attendance, Stage};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AeConversion {
    pub intros: usize,
    pub intros_with_poa: usize,
    pub intro_to_poa_rate: f64,
    pub poa_meetings: usize,
    pub poa_closed: usize,
    pub poa_to_close_rate: f64,
    pub attended: usize,
    pub no_show: usize,
    pub attendance_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingsAttended {
    /// Intros in the period with any attendance status.
    pub booked: usize,
    pub attended: usize,
    pub no_show: usize,
    /// Booked but not yet held.
    pub scheduled: usize,
    /// attended / (attended + no_show) * 100.
    pub attendance_rate: f64,

    pub intros: usize,
    pub intros_with_poa: usize,
    pub intro_to_poa_rate: f64,
    pub intro_target: f64,
    pub intro_on_track: bool,

    /// Records whose POA meeting falls in the period.
    pub poa_meetings: usize,
    pub poa_closed: usize,
    pub poa_to_close_rate: f64,
    pub poa_target: f64,
    pub poa_on_track: bool,

    pub by_ae: BTreeMap<String, AeConversion>,
    /// POA meetings in the period.
    pub details: Vec<DealRow>,
}

pub fn aggregate(input: &AggregationInput) -> MeetingsAttended {
    let mut result = MeetingsAttended {
        intro_target: input.targets.intro,
        poa_target: input.targets.poa,
        ..MeetingsAttended::default()
    };

    for annotated in input.in_period() {
        let record = annotated.record;
        let ae = result.by_ae.entry(breakdown_key(&record.owner)).or_default();
        result.intros += 1;
        ae.intros += 1;
        if record.poa_date.is_some() {
            result.intros_with_poa += 1;
            ae.intros_with_poa += 1;
        }
        match record.attendance {
            Some(Attendance::Show) => {
                result.attended += 1;
                ae.attended += 1;
            }
            Some(Attendance::NoShow) => {
                result.no_show += 1;
                ae.no_show += 1;
            }
            Some(Attendance::Scheduled) => result.scheduled += 1,
            None => continue,
        }
        result.booked += 1;
    }

    let period = input.period;
    for annotated in input.records {
        let record = annotated.record;
        let Some(poa_date) = record.poa_date else {
            continue;
        };
        if !period.contains(poa_date) {
            continue;
        }
        let ae = result.by_ae.entry(breakdown_key(&record.owner)).or_default();
        result.poa_meetings += 1;
        ae.poa_meetings += 1;
        if record.stage == Stage::Closed {
            result.poa_closed += 1;
            ae.poa_closed += 1;
        }
        result.details.push(DealRow::from(annotated));
    }

    result.attendance_rate = rate(result.attended as f64, (result.attended + result.no_show) as f64);
    result.intro_to_poa_rate = rate(result.intros_with_poa as f64, result.intros as f64);
    result.poa_to_close_rate = rate(result.poa_closed as f64, result.poa_meetings as f64);

    let threshold = input.targets.thresholds.intro_poa;
    result.intro_on_track = on_track(result.intros as f64, result.intro_target, threshold);
    result.poa_on_track = on_track(result.poa_meetings as f64, result.poa_target, threshold);

    for ae in result.by_ae.values_mut() {
        ae.intro_to_poa_rate = rate(ae.intros_with_poa as f64, ae.intros as f64);
        ae.poa_to_close_rate = rate(ae.poa_closed as f64, ae.poa_meetings as f64);
        ae.attendance_rate = rate(ae.attended as f64, (ae.attended + ae.no_show) as f64);
    }

    sort_rows(&mut result.details);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::PeriodRequest;
    use crate::test_support::{date, with_input, RecordBuilder};

    const OCTOBER: PeriodRequest = PeriodRequest::RelativeMonth { offset: 0 };

    #[test]
    fn test_attendance_and_conversion_rates() {
        let records = vec![
            RecordBuilder::new("1").owner("Dana").attendance(Attendance::Show).poa(2025, 10, 10).discovered(2025, 10, 1).build(),
            RecordBuilder::new("2").owner("Dana").attendance(Attendance::Show).discovered(2025, 10, 2).build(),
            RecordBuilder::new("3").owner("Lee").attendance(Attendance::NoShow).discovered(2025, 10, 3).build(),
            RecordBuilder::new("4").owner("Lee").attendance(Attendance::Scheduled).discovered(2025, 10, 25).build(),
            RecordBuilder::new("5").owner("Lee").discovered(2025, 10, 5).build(),
            // Intro in September, POA and close in October.
            RecordBuilder::new("6").owner("Lee").poa(2025, 10, 4).closed(2025, 10, 28).discovered(2025, 9, 20).build(),
        ];
        let result = with_input(&records, OCTOBER, date(2025, 10, 31), aggregate);
        assert_eq!(result.intros, 5);
        assert_eq!(result.booked, 4);
        assert_eq!(result.attended, 2);
        assert_eq!(result.no_show, 1);
        assert_eq!(result.scheduled, 1);
        assert!((result.attendance_rate - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(result.intros_with_poa, 1);
        assert_eq!(result.intro_to_poa_rate, 20.0);
        assert_eq!(result.poa_meetings, 2);
        assert_eq!(result.poa_closed, 1);
        assert_eq!(result.poa_to_close_rate, 50.0);

        let dana = &result.by_ae["Dana"];
        assert_eq!(dana.intros, 2);
        assert_eq!(dana.intro_to_poa_rate, 50.0);
        assert_eq!(dana.attendance_rate, 100.0);
        let lee = &result.by_ae["Lee"];
        assert_eq!(lee.poa_meetings, 1);
        assert_eq!(lee.poa_to_close_rate, 100.0);
        assert_eq!(result.details.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(), vec!["6", "1"]);
    }

    #[test]
    fn test_zero_denominators_report_zero() {
        let records = vec![RecordBuilder::new("1").owner("Dana").discovered(2025, 10, 1).build()];
        let result = with_input(&records, OCTOBER, date(2025, 10, 31), aggregate);
        assert_eq!(result.attendance_rate, 0.0);
        assert_eq!(result.poa_to_close_rate, 0.0);
        let dana = &result.by_ae["Dana"];
        assert_eq!(dana.poa_to_close_rate, 0.0);
        assert_eq!(dana.attendance_rate, 0.0);
        assert!(!dana.poa_to_close_rate.is_nan());
    }

    #[test]
    fn test_targets_and_empty_period() {
        let result = with_input(&[], OCTOBER, date(2025, 10, 31), aggregate);
        assert_eq!(result.intro_target, 40.0);
        assert_eq!(result.poa_target, 20.0);
        assert!(!result.intro_on_track);
        assert!(!result.poa_on_track);
        assert_eq!(result.intro_to_poa_rate, 0.0);
        assert!(result.by_ae.is_empty());
    }
}
