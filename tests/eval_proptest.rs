//! Property tests for the aggregation pass.
//!
//! Tests invariants that should hold for every combination of dataset,
//! detections and prediction log.

use proptest::prelude::*;
use vqa_eval::eval::{
    categorize_answer, classify, normalize_answer, AccuracyReport, AnswerCategory, DatasetIndex,
    EvalConfig, LabelLanguage, ObjectIndex, ObjectRecord, PredictionRecord, QuestionRecord,
    QuestionType, StatsAggregator,
};

const WORDS: &[&str] = &["con", "mèo", "chó", "xe", "người", "màu", "gì", "ở", "đâu", "có"];
const LABELS: &[&str] = &["mèo", "chó", "xe", "người", "cây"];
const ANSWERS: &[&str] = &["đen", "trắng", "có", "không", "2", "Đen "];

/// (question id, image id, question words, answer, prediction)
type Row = (u8, u8, Vec<usize>, usize, usize);

fn row_strategy() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec(
        (
            0u8..30,
            0u8..6,
            prop::collection::vec(0..WORDS.len(), 1..8),
            0..ANSWERS.len(),
            0..ANSWERS.len(),
        ),
        0..40,
    )
}

fn detection_strategy() -> impl Strategy<Value = Vec<(u8, Vec<usize>)>> {
    prop::collection::vec((0u8..6, prop::collection::vec(0..LABELS.len(), 0..4)), 0..6)
}

fn build(rows: &[Row], dets: &[(u8, Vec<usize>)]) -> (DatasetIndex, ObjectIndex, Vec<PredictionRecord>) {
    let dataset: DatasetIndex = rows
        .iter()
        .map(|(qid, img, words, ans, _)| {
            let question: Vec<&str> = words.iter().map(|w| WORDS[*w]).collect();
            QuestionRecord::new(qid.to_string(), &question.join(" "), img.to_string(), &[ANSWERS[*ans]])
        })
        .collect();

    let mut objects = ObjectIndex::new(LabelLanguage::Vietnamese);
    for (img, labels) in dets {
        objects.insert(
            format!("{:06}.jpg", img),
            ObjectRecord {
                english: Vec::new(),
                vietnamese: labels.iter().map(|l| LABELS[*l].to_string()).collect(),
            },
        );
    }

    // Ids 30.. never exist in the dataset.
    let predictions = rows
        .iter()
        .map(|(qid, _, _, _, pred)| PredictionRecord::new((qid * 2).to_string(), ANSWERS[*pred]))
        .collect();
    (dataset, objects, predictions)
}

proptest! {
    #[test]
    fn test_normalize_idempotent(s in "\\PC{0,20}") {
        let once = normalize_answer(&s);
        prop_assert_eq!(normalize_answer(&once), once);
    }

    #[test]
    fn test_mention_never_exceeds_co_occurrence(rows in row_strategy(), dets in detection_strategy()) {
        let (dataset, objects, predictions) = build(&rows, &dets);
        let result = StatsAggregator::new(&EvalConfig::default()).run(&predictions, &dataset, &objects);

        for (label, mentioned) in result.mentioned.iter() {
            let all = result.objects.get(label);
            prop_assert!(all.is_some(), "mentioned label {} missing from co-occurrence", label);
            let all = all.unwrap();
            prop_assert!(mentioned.tally.total <= all.tally.total);
            prop_assert!(mentioned.tally.correct <= all.tally.correct);
        }
    }

    #[test]
    fn test_image_buckets_match_their_questions(rows in row_strategy(), dets in detection_strategy()) {
        let (dataset, objects, predictions) = build(&rows, &dets);
        let result = StatsAggregator::new(&EvalConfig::default()).run(&predictions, &dataset, &objects);

        let mut image_total = 0;
        for (_, image) in result.images.iter() {
            prop_assert_eq!(image.tally.total, image.questions.len());
            prop_assert_eq!(
                image.tally.correct,
                image.questions.iter().filter(|q| q.correct).count()
            );
            image_total += image.tally.total;
        }
        prop_assert_eq!(image_total, result.overall.total);

        let c = &result.coverage;
        prop_assert_eq!(c.evaluated + c.missing_id + c.unresolved_id, c.predictions_seen);
        prop_assert_eq!(c.evaluated, result.overall.total);
    }

    #[test]
    fn test_question_type_buckets_partition_records(rows in row_strategy(), dets in detection_strategy()) {
        let (dataset, objects, predictions) = build(&rows, &dets);
        let result = StatsAggregator::new(&EvalConfig::default()).run(&predictions, &dataset, &objects);

        let by_type: usize = result.by_question_type.iter().map(|(_, t)| t.total).sum();
        let by_category: usize = result.by_answer_category.iter().map(|(_, t)| t.total).sum();
        prop_assert_eq!(by_type, result.overall.total);
        prop_assert_eq!(by_category, result.overall.total);
        prop_assert!(result.short_questions.total <= result.overall.total);
    }

    #[test]
    fn test_reports_are_deterministic(rows in row_strategy(), dets in detection_strategy()) {
        let config = EvalConfig::default();
        let (dataset, objects, predictions) = build(&rows, &dets);
        let render = || {
            let result = StatsAggregator::new(&config).run(&predictions, &dataset, &objects);
            AccuracyReport::from_result(&result, &config).to_json().unwrap()
        };
        prop_assert_eq!(render(), render());
    }

    #[test]
    fn test_accuracies_bounded(rows in row_strategy(), dets in detection_strategy()) {
        let config = EvalConfig::default();
        let (dataset, objects, predictions) = build(&rows, &dets);
        let result = StatsAggregator::new(&config).run(&predictions, &dataset, &objects);
        let report = AccuracyReport::from_result(&result, &config);

        prop_assert!((0.0..=1.0).contains(&report.overall.accuracy));
        for stats in report.object_stats.values() {
            prop_assert!((0.0..=1.0).contains(&stats.accuracy));
            prop_assert_eq!(stats.num_images, stats.images.len());
        }
        let share: f64 = report.by_question_type.values().map(|t| t.share).sum();
        if report.overall.total > 0 {
            prop_assert!((share - 100.0).abs() < 1e-6);
        }
        prop_assert!(report.top_objects_by_accuracy.len() <= config.top_n);
    }

    #[test]
    fn test_why_beats_what(prefix in "[a-z ]{0,10}", middle in "[a-z ]{0,10}") {
        let question = format!("{}tại sao{}gì", prefix, middle);
        prop_assert_eq!(classify(&question), QuestionType::Why);
    }

    #[test]
    fn test_digit_answers_are_numbers(n in 0u32..100_000) {
        prop_assert_eq!(categorize_answer(&n.to_string()), AnswerCategory::Number);
    }
}
