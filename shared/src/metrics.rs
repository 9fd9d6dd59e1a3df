//! Pollination performance metrics
//!
//! Reduces the observations of an evaluation visit into the score sheet
//! shown on the dashboard. Each deficiency metric starts at its maximum
//! point value and decreases linearly with the deficiency sum. Results are
//! neither clamped nor rounded.

use serde::{Deserialize, Serialize};

use crate::models::{observations_from_value, PollinationObservation};
use crate::types::{count_of, is_recorded};

/// Maximum points for antesis inflorescences left untreated
pub const ANTESIS_LEFT_POINTS: f64 = 15.0;
/// Maximum points for post-antesis inflorescences left untreated
pub const POST_ANTESIS_LEFT_POINTS: f64 = 10.0;
/// Maximum points for emasculation (espate)
pub const EMASCULATION_POINTS: f64 = 30.0;
/// Maximum points for application
pub const APPLICATION_POINTS: f64 = 30.0;
/// Maximum points for marking
pub const MARKING_POINTS: f64 = 5.0;
/// Maximum points for each follow-up pass (repaso)
pub const PASS_POINTS: f64 = 5.0;

/// Derived metrics over one list of observations
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub event_count: u64,
    pub valid_pass1_count: u64,
    pub valid_pass2_count: u64,

    pub sum_antesis: f64,
    pub sum_post_antesis: f64,
    pub sum_antesis_left: f64,
    pub sum_post_antesis_left: f64,
    /// Antesis plus post-antesis, treated and left
    pub sum_inflorescence: f64,
    pub sum_application: f64,
    pub sum_marking: f64,
    pub sum_emasculation: f64,
    pub sum_pass1: f64,
    pub sum_pass2: f64,

    pub antesis_left_pct: f64,
    pub post_antesis_left_pct: f64,
    pub emasculation_pct: f64,
    pub application_pct: f64,
    pub marking_pct: f64,
    pub pass1_pct: f64,
    pub pass2_pct: f64,

    pub antesis_proportion: f64,
    pub post_antesis_proportion: f64,

    pub total_score: f64,
}

impl MetricsSummary {
    /// Copy rounded to 2 decimals for display
    pub fn rounded(&self) -> Self {
        let r = |v: f64| (v * 100.0).round() / 100.0;
        Self {
            sum_antesis: r(self.sum_antesis),
            sum_post_antesis: r(self.sum_post_antesis),
            sum_antesis_left: r(self.sum_antesis_left),
            sum_post_antesis_left: r(self.sum_post_antesis_left),
            sum_inflorescence: r(self.sum_inflorescence),
            sum_application: r(self.sum_application),
            sum_marking: r(self.sum_marking),
            sum_emasculation: r(self.sum_emasculation),
            sum_pass1: r(self.sum_pass1),
            sum_pass2: r(self.sum_pass2),
            antesis_left_pct: r(self.antesis_left_pct),
            post_antesis_left_pct: r(self.post_antesis_left_pct),
            emasculation_pct: r(self.emasculation_pct),
            application_pct: r(self.application_pct),
            marking_pct: r(self.marking_pct),
            pass1_pct: r(self.pass1_pct),
            pass2_pct: r(self.pass2_pct),
            antesis_proportion: r(self.antesis_proportion),
            post_antesis_proportion: r(self.post_antesis_proportion),
            total_score: r(self.total_score),
            ..*self
        }
    }
}

#[derive(Default)]
struct Totals {
    events: u64,
    valid_pass1: u64,
    valid_pass2: u64,
    antesis: f64,
    post_antesis: f64,
    antesis_left: f64,
    post_antesis_left: f64,
    application: f64,
    marking: f64,
    emasculation: f64,
    pass1: f64,
    pass2: f64,
}

impl Totals {
    fn add(&mut self, obs: &PollinationObservation) {
        self.events += 1;
        self.antesis += count_of(&obs.antesis);
        self.post_antesis += count_of(&obs.post_antesis);
        self.antesis_left += count_of(&obs.antesis_left);
        self.post_antesis_left += count_of(&obs.post_antesis_left);
        self.application += count_of(&obs.application);
        self.marking += count_of(&obs.marking);
        self.emasculation += count_of(&obs.emasculation);
        self.pass1 += count_of(&obs.pass1);
        self.pass2 += count_of(&obs.pass2);
        if is_recorded(&obs.pass1) {
            self.valid_pass1 += 1;
        }
        if is_recorded(&obs.pass2) {
            self.valid_pass2 += 1;
        }
    }
}

/// `max_points` when nothing is deficient, decreasing linearly with the deficiency
fn deficiency_score(max_points: f64, denominator: f64, deficiency: f64) -> f64 {
    if denominator > 0.0 {
        max_points / denominator * (denominator - deficiency)
    } else {
        0.0
    }
}

/// Full points when every valid event counted exactly one unit, proportional otherwise.
///
/// Pass values above 1 fall through to the proportional branch and can
/// exceed `PASS_POINTS`.
fn pass_completion(valid_count: u64, sum: f64) -> f64 {
    if valid_count == 0 {
        0.0
    } else if valid_count as f64 == sum {
        PASS_POINTS
    } else {
        PASS_POINTS * sum / valid_count as f64
    }
}

fn proportion(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part * 100.0 / whole
    } else {
        0.0
    }
}

/// Compute the metrics summary of a list of observations
pub fn calculate_metrics<'a, I>(observations: I) -> MetricsSummary
where
    I: IntoIterator<Item = &'a PollinationObservation>,
{
    let mut totals = Totals::default();
    for obs in observations {
        totals.add(obs);
    }

    let events = totals.events as f64;
    let sum_inflorescence =
        totals.antesis + totals.post_antesis + totals.antesis_left + totals.post_antesis_left;

    let antesis_left_pct =
        deficiency_score(ANTESIS_LEFT_POINTS, sum_inflorescence, totals.antesis_left);
    let post_antesis_left_pct = deficiency_score(
        POST_ANTESIS_LEFT_POINTS,
        sum_inflorescence,
        totals.post_antesis_left,
    );
    let emasculation_pct = deficiency_score(EMASCULATION_POINTS, events, totals.emasculation);
    let application_pct = deficiency_score(APPLICATION_POINTS, events, totals.application);
    let marking_pct = deficiency_score(MARKING_POINTS, events, totals.marking);
    let pass1_pct = pass_completion(totals.valid_pass1, totals.pass1);
    let pass2_pct = pass_completion(totals.valid_pass2, totals.pass2);

    MetricsSummary {
        event_count: totals.events,
        valid_pass1_count: totals.valid_pass1,
        valid_pass2_count: totals.valid_pass2,
        sum_antesis: totals.antesis,
        sum_post_antesis: totals.post_antesis,
        sum_antesis_left: totals.antesis_left,
        sum_post_antesis_left: totals.post_antesis_left,
        sum_inflorescence,
        sum_application: totals.application,
        sum_marking: totals.marking,
        sum_emasculation: totals.emasculation,
        sum_pass1: totals.pass1,
        sum_pass2: totals.pass2,
        antesis_left_pct,
        post_antesis_left_pct,
        emasculation_pct,
        application_pct,
        marking_pct,
        pass1_pct,
        pass2_pct,
        antesis_proportion: proportion(totals.antesis + totals.antesis_left, sum_inflorescence),
        post_antesis_proportion: proportion(
            totals.post_antesis + totals.post_antesis_left,
            sum_inflorescence,
        ),
        total_score: antesis_left_pct
            + post_antesis_left_pct
            + emasculation_pct
            + application_pct
            + marking_pct
            + pass1_pct
            + pass2_pct,
    }
}

/// Compute metrics from untyped JSON; `null` or a non-array gives the zero summary
pub fn calculate_metrics_from_value(value: &serde_json::Value) -> MetricsSummary {
    calculate_metrics(&observations_from_value(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldValue;

    fn obs_with_pass1(value: Option<FieldValue>) -> PollinationObservation {
        PollinationObservation {
            pass1: value,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_and_null_are_zero() {
        let empty: Vec<PollinationObservation> = Vec::new();
        assert_eq!(calculate_metrics(&empty), MetricsSummary::default());
        assert_eq!(
            calculate_metrics_from_value(&serde_json::Value::Null),
            MetricsSummary::default()
        );
        assert_eq!(
            calculate_metrics_from_value(&serde_json::json!("not a list")),
            MetricsSummary::default()
        );
    }

    #[test]
    fn test_blank_pass_is_not_valid() {
        let list = vec![
            obs_with_pass1(Some(FieldValue::from(0))),
            obs_with_pass1(Some(FieldValue::from("  "))),
            obs_with_pass1(None),
        ];
        let m = calculate_metrics(&list);
        assert_eq!(m.event_count, 3);
        assert_eq!(m.valid_pass1_count, 1);
        // valid count 1, sum 0: proportional branch
        assert_eq!(m.pass1_pct, 0.0);
    }

    #[test]
    fn test_pass_value_above_one_is_not_capped() {
        let list = vec![obs_with_pass1(Some(FieldValue::from(3)))];
        let m = calculate_metrics(&list);
        assert_eq!(m.pass1_pct, 15.0);
    }

    #[test]
    fn test_percentages_go_negative_when_deficiency_exceeds_events() {
        let list = vec![PollinationObservation {
            emasculation: Some(FieldValue::from(3)),
            ..Default::default()
        }];
        let m = calculate_metrics(&list);
        assert_eq!(m.emasculation_pct, -60.0);
        assert_eq!(m.application_pct, 30.0);
    }

    #[test]
    fn test_rounded_keeps_counts() {
        let list = vec![PollinationObservation {
            antesis: Some(FieldValue::from(2)),
            antesis_left: Some(FieldValue::from(1)),
            ..Default::default()
        }];
        let m = calculate_metrics(&list).rounded();
        assert_eq!(m.event_count, 1);
        assert_eq!(m.antesis_left_pct, 10.0);
        assert_eq!(m.antesis_proportion, 100.0);
    }
}
