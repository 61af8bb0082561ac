//! Aggregate statistics over completed-session percentages.

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::marker::PhantomData;

use crate::model::{AnswerValue, Percentage, QuestionBank, QuestionId};

//
// ─── BANDS ─────────────────────────────────────────────────────────────────────
//

/// A fixed partition of 0..=100 into labelled, lower-inclusive intervals.
pub trait Band: Copy + PartialEq + 'static {
    /// Every band, lowest first.
    const ALL: &'static [Self];

    /// Index into `ALL` of the band holding `score`.
    fn index_of(score: Percentage) -> usize;

    fn label(self) -> &'static str;

    #[must_use]
    fn classify(score: Percentage) -> Self {
        Self::ALL[Self::index_of(score)]
    }
}

/// Ten-point histogram bucket; the last one also takes 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket(u8);

const BUCKET_LABELS: [&str; 10] = [
    "0-9%", "10-19%", "20-29%", "30-39%", "40-49%", "50-59%", "60-69%", "70-79%", "80-89%",
    "90-100%",
];

impl Band for Bucket {
    const ALL: &'static [Self] = &[
        Bucket(0),
        Bucket(1),
        Bucket(2),
        Bucket(3),
        Bucket(4),
        Bucket(5),
        Bucket(6),
        Bucket(7),
        Bucket(8),
        Bucket(9),
    ];

    fn index_of(score: Percentage) -> usize {
        usize::from((score.value() / 10).min(9))
    }

    fn label(self) -> &'static str {
        BUCKET_LABELS[usize::from(self.0)]
    }
}

/// Named alignment level, boundaries at 25, 40, 60, 75 and 90.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentLevel {
    Minimal,
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl AlignmentLevel {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            AlignmentLevel::Minimal => "Minimal",
            AlignmentLevel::VeryLow => "Very Low",
            AlignmentLevel::Low => "Low",
            AlignmentLevel::Moderate => "Moderate",
            AlignmentLevel::High => "High",
            AlignmentLevel::VeryHigh => "Very High",
        }
    }
}

impl Band for AlignmentLevel {
    const ALL: &'static [Self] = &[
        AlignmentLevel::Minimal,
        AlignmentLevel::VeryLow,
        AlignmentLevel::Low,
        AlignmentLevel::Moderate,
        AlignmentLevel::High,
        AlignmentLevel::VeryHigh,
    ];

    fn index_of(score: Percentage) -> usize {
        match score.value() {
            90.. => 5,
            75.. => 4,
            60.. => 3,
            40.. => 2,
            25.. => 1,
            _ => 0,
        }
    }

    fn label(self) -> &'static str {
        match self {
            AlignmentLevel::Minimal => "Minimal Alignment (0-24%)",
            AlignmentLevel::VeryLow => "Very Low Alignment (25-39%)",
            AlignmentLevel::Low => "Low Alignment (40-59%)",
            AlignmentLevel::Moderate => "Moderate Alignment (60-74%)",
            AlignmentLevel::High => "High Alignment (75-89%)",
            AlignmentLevel::VeryHigh => "Very High Alignment (90-100%)",
        }
    }
}

/// Coarser view over the same scores, boundaries at 25, 50, 75 and 90.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreRange {
    Under25,
    From25To49,
    From50To74,
    From75To89,
    From90,
}

impl Band for ScoreRange {
    const ALL: &'static [Self] = &[
        ScoreRange::Under25,
        ScoreRange::From25To49,
        ScoreRange::From50To74,
        ScoreRange::From75To89,
        ScoreRange::From90,
    ];

    fn index_of(score: Percentage) -> usize {
        match score.value() {
            90.. => 4,
            75.. => 3,
            50.. => 2,
            25.. => 1,
            _ => 0,
        }
    }

    fn label(self) -> &'static str {
        match self {
            ScoreRange::Under25 => "Under 25%",
            ScoreRange::From25To49 => "25-49%",
            ScoreRange::From50To74 => "50-74%",
            ScoreRange::From75To89 => "75-89%",
            ScoreRange::From90 => "90%+",
        }
    }
}

/// Per-band counts. Serializes as a `label -> count` object in band order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandCounts<B: Band> {
    counts: Vec<u32>,
    _band: PhantomData<B>,
}

impl<B: Band> BandCounts<B> {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            counts: vec![0; B::ALL.len()],
            _band: PhantomData,
        }
    }

    #[must_use]
    pub fn from_scores(scores: &[Percentage]) -> Self {
        let mut out = Self::empty();
        for score in scores {
            out.counts[B::index_of(*score)] += 1;
        }
        out
    }

    #[must_use]
    pub fn count(&self, band: B) -> u32 {
        B::ALL
            .iter()
            .position(|b| *b == band)
            .map_or(0, |i| self.counts[i])
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (B, u32)> + '_ {
        B::ALL.iter().copied().zip(self.counts.iter().copied())
    }
}

impl<B: Band> Serialize for BandCounts<B> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len()))?;
        for (band, count) in self.iter() {
            map.serialize_entry(band.label(), &count)?;
        }
        map.end()
    }
}

//
// ─── SUMMARY STATISTICS ────────────────────────────────────────────────────────
//

/// Full statistics bundle over a set of scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub count: u32,
    pub mean: Percentage,
    pub median: Percentage,
    pub standard_deviation: f64,
    pub highest: Percentage,
    pub lowest: Percentage,
    pub histogram: BandCounts<Bucket>,
    pub alignment_levels: BandCounts<AlignmentLevel>,
    pub score_ranges: BandCounts<ScoreRange>,
}

impl Statistics {
    /// All-zero statistics for an empty input.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            count: 0,
            mean: Percentage::ZERO,
            median: Percentage::ZERO,
            standard_deviation: 0.0,
            highest: Percentage::ZERO,
            lowest: Percentage::ZERO,
            histogram: BandCounts::empty(),
            alignment_levels: BandCounts::empty(),
            score_ranges: BandCounts::empty(),
        }
    }
}

/// Summarize completed-session percentages.
///
/// The standard deviation is measured against the rounded mean, not the
/// exact one, and is rounded to two decimals.
#[must_use]
pub fn summarize(scores: &[Percentage]) -> Statistics {
    let (Some(highest), Some(lowest)) = (scores.iter().max(), scores.iter().min()) else {
        return Statistics::empty();
    };

    let count = saturating_u32(scores.len());
    let mean = rounded_mean(scores);

    let mut sorted = scores.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        let pair = f64::from(sorted[mid - 1].value()) + f64::from(sorted[mid].value());
        to_percentage(round_half_up(pair / 2.0))
    } else {
        sorted[mid]
    };

    let center = f64::from(mean.value());
    let variance = scores
        .iter()
        .map(|s| (f64::from(s.value()) - center).powi(2))
        .sum::<f64>()
        / f64::from(count);
    let standard_deviation = round_half_up(variance.sqrt() * 100.0) / 100.0;

    Statistics {
        count,
        mean,
        median,
        standard_deviation,
        highest: *highest,
        lowest: *lowest,
        histogram: BandCounts::from_scores(scores),
        alignment_levels: BandCounts::from_scores(scores),
        score_ranges: BandCounts::from_scores(scores),
    }
}

/// `round(sum / count)`, or 0 for an empty slice.
#[must_use]
pub fn rounded_mean(scores: &[Percentage]) -> Percentage {
    if scores.is_empty() {
        return Percentage::ZERO;
    }
    let sum: u64 = scores.iter().map(|s| u64::from(s.value())).sum();
    #[allow(clippy::cast_precision_loss)]
    let mean = sum as f64 / scores.len() as f64;
    to_percentage(round_half_up(mean))
}

//
// ─── PUBLIC DISTRIBUTION ───────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketCount {
    pub bucket: &'static str,
    pub count: u32,
}

/// The participant-facing distribution view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    pub distribution: Vec<BucketCount>,
    pub total_responses: u32,
    pub average_score: Percentage,
    pub all_scores: Vec<Percentage>,
}

#[must_use]
pub fn distribution(scores: &[Percentage]) -> Distribution {
    let histogram = BandCounts::<Bucket>::from_scores(scores);
    Distribution {
        distribution: histogram
            .iter()
            .map(|(bucket, count)| BucketCount {
                bucket: bucket.label(),
                count,
            })
            .collect(),
        total_responses: saturating_u32(scores.len()),
        average_score: rounded_mean(scores),
        all_scores: scores.to_vec(),
    }
}

//
// ─── PER-QUESTION ANALYSIS ─────────────────────────────────────────────────────
//

/// How many completed sessions gave `answer` to `question_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerTally {
    pub question_id: QuestionId,
    pub answer: AnswerValue,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAnalysis {
    pub question_id: QuestionId,
    pub response_count: u64,
    pub average_response: f64,
    pub most_common_response: Option<AnswerValue>,
    pub response_distribution: BTreeMap<u8, u64>,
}

/// Per-question breakdown in bank order. Tallies for questions outside the
/// bank are ignored; ties for most common go to the lower answer.
#[must_use]
pub fn analyze_questions(bank: &QuestionBank, tallies: &[AnswerTally]) -> Vec<QuestionAnalysis> {
    bank.questions()
        .iter()
        .map(|question| {
            let mut response_distribution: BTreeMap<u8, u64> =
                (AnswerValue::MIN..=AnswerValue::MAX).map(|v| (v, 0)).collect();
            let mut most_common: Option<(AnswerValue, u64)> = None;
            let mut weighted = 0_u64;

            for tally in tallies.iter().filter(|t| t.question_id == question.id()) {
                *response_distribution
                    .entry(tally.answer.value())
                    .or_insert(0) += tally.count;
                weighted += u64::from(tally.answer.value()) * tally.count;
            }

            for (value, count) in &response_distribution {
                if *count == 0 {
                    continue;
                }
                if most_common.is_none_or(|(_, best)| *count > best) {
                    most_common = Some((AnswerValue::from_reference(*value), *count));
                }
            }

            let response_count: u64 = response_distribution.values().sum();
            #[allow(clippy::cast_precision_loss)]
            let average_response = if response_count == 0 {
                0.0
            } else {
                round_half_up(weighted as f64 / response_count as f64 * 100.0) / 100.0
            };

            QuestionAnalysis {
                question_id: question.id(),
                response_count,
                average_response,
                most_common_response: most_common.map(|(value, _)| value),
                response_distribution,
            }
        })
        .collect()
}

//
// ─── HELPERS ───────────────────────────────────────────────────────────────────
//

fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

#[allow(clippy::cast_possible_truncation)]
fn to_percentage(value: f64) -> Percentage {
    Percentage::new(value.clamp(0.0, 100.0) as i64).unwrap_or(Percentage::ZERO)
}

fn saturating_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pcts(values: &[i64]) -> Vec<Percentage> {
        values.iter().map(|v| Percentage::new(*v).unwrap()).collect()
    }

    #[test]
    fn empty_input_yields_zero_counts() {
        let stats = summarize(&[]);
        assert_eq!(stats, Statistics::empty());
        assert_eq!(stats.count, 0);
        assert_eq!(stats.histogram.total(), 0);
        assert_eq!(stats.alignment_levels.total(), 0);
        assert_eq!(stats.score_ranges.total(), 0);
    }

    #[test]
    fn summarizes_reference_sample() {
        let scores = pcts(&[25, 45, 88, 32, 67, 91, 23, 56]);
        let stats = summarize(&scores);

        assert_eq!(stats.count, 8);
        assert_eq!(stats.mean.value(), 53);
        assert_eq!(stats.highest.value(), 91);
        assert_eq!(stats.lowest.value(), 23);
        // (45 + 56) / 2 = 50.5
        assert_eq!(stats.median.value(), 51);
        // sqrt(5063 / 8) against the rounded mean 53
        assert!((stats.standard_deviation - 25.16).abs() < 1e-9);

        let levels: Vec<u32> = stats.alignment_levels.iter().map(|(_, c)| c).collect();
        assert_eq!(levels, vec![1, 2, 2, 1, 1, 1]);
        let ranges: Vec<u32> = stats.score_ranges.iter().map(|(_, c)| c).collect();
        assert_eq!(ranges, vec![1, 3, 2, 1, 1]);
        let buckets: Vec<u32> = stats.histogram.iter().map(|(_, c)| c).collect();
        assert_eq!(buckets, vec![0, 0, 2, 1, 1, 1, 1, 0, 1, 1]);
    }

    #[test]
    fn odd_count_median_is_middle_element() {
        let stats = summarize(&pcts(&[90, 10, 40]));
        assert_eq!(stats.median.value(), 40);
        assert_eq!(stats.mean.value(), 47);
    }

    #[test]
    fn single_score() {
        let stats = summarize(&pcts(&[100]));
        assert_eq!(stats.median.value(), 100);
        assert!(stats.standard_deviation.abs() < f64::EPSILON);
        assert_eq!(stats.histogram.count(Bucket::classify(Percentage::FULL)), 1);
        assert_eq!(Bucket::classify(Percentage::FULL).label(), "90-100%");
    }

    #[test]
    fn histogram_partitions_every_score() {
        let scores: Vec<Percentage> = (0..=100).map(|v| Percentage::new(v).unwrap()).collect();
        let histogram = BandCounts::<Bucket>::from_scores(&scores);
        assert_eq!(histogram.total() as usize, scores.len());
        let counts: Vec<u32> = histogram.iter().map(|(_, c)| c).collect();
        assert_eq!(counts, vec![10, 10, 10, 10, 10, 10, 10, 10, 10, 11]);
    }

    #[test]
    fn ninety_is_top_band_everywhere() {
        let ninety = Percentage::new(90).unwrap();
        assert_eq!(Bucket::classify(ninety).label(), "90-100%");
        assert_eq!(AlignmentLevel::classify(ninety), AlignmentLevel::VeryHigh);
        assert_eq!(AlignmentLevel::classify(ninety).name(), "Very High");
        assert_eq!(ScoreRange::classify(ninety).label(), "90%+");

        let eighty_nine = Percentage::new(89).unwrap();
        assert_eq!(Bucket::classify(eighty_nine).label(), "80-89%");
        assert_eq!(AlignmentLevel::classify(eighty_nine), AlignmentLevel::High);
    }

    #[test]
    fn band_boundaries_are_lower_inclusive() {
        let cases = [
            (24, AlignmentLevel::Minimal),
            (25, AlignmentLevel::VeryLow),
            (39, AlignmentLevel::VeryLow),
            (40, AlignmentLevel::Low),
            (60, AlignmentLevel::Moderate),
            (75, AlignmentLevel::High),
        ];
        for (score, level) in cases {
            assert_eq!(
                AlignmentLevel::classify(Percentage::new(score).unwrap()),
                level,
                "{score}"
            );
        }
        assert_eq!(
            ScoreRange::classify(Percentage::new(49).unwrap()),
            ScoreRange::From25To49
        );
        assert_eq!(
            ScoreRange::classify(Percentage::new(50).unwrap()),
            ScoreRange::From50To74
        );
    }

    #[test]
    fn band_counts_serialize_in_order() {
        let counts = BandCounts::<ScoreRange>::from_scores(&pcts(&[10, 95]));
        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(
            json,
            r#"{"Under 25%":1,"25-49%":0,"50-74%":0,"75-89%":0,"90%+":1}"#
        );
    }

    #[test]
    fn distribution_view() {
        let view = distribution(&pcts(&[75, 45, 88]));
        assert_eq!(view.total_responses, 3);
        assert_eq!(view.average_score.value(), 69);
        assert_eq!(view.distribution.len(), 10);
        assert_eq!(view.distribution[7].bucket, "70-79%");
        assert_eq!(view.distribution[7].count, 1);

        let empty = distribution(&[]);
        assert_eq!(empty.total_responses, 0);
        assert_eq!(empty.average_score, Percentage::ZERO);
        assert!(empty.distribution.iter().all(|b| b.count == 0));
    }

    #[test]
    fn question_analysis_from_tallies() {
        let bank = QuestionBank::standard();
        let q1 = QuestionId::new(1);
        let tally = |answer: i64, count| AnswerTally {
            question_id: q1,
            answer: AnswerValue::new(q1, answer).unwrap(),
            count,
        };
        let tallies = vec![tally(2, 3), tally(4, 3), tally(5, 1)];

        let analysis = analyze_questions(&bank, &tallies);
        assert_eq!(analysis.len(), 10);

        let first = &analysis[0];
        assert_eq!(first.response_count, 7);
        // (2*3 + 4*3 + 5) / 7 = 3.2857...
        assert!((first.average_response - 3.29).abs() < 1e-9);
        assert_eq!(first.most_common_response.map(AnswerValue::value), Some(2));
        assert_eq!(first.response_distribution.get(&4), Some(&3));
        assert_eq!(first.response_distribution.get(&1), Some(&0));

        let second = &analysis[1];
        assert_eq!(second.response_count, 0);
        assert_eq!(second.most_common_response, None);
        assert!(second.average_response.abs() < f64::EPSILON);
    }
}
