//! Question-type taxonomy (5W1H) and answer categories.
//!
//! Questions are Vietnamese free text. Types are assigned by ordered keyword
//! rules; the first rule that matches wins. The order keeps short, frequent
//! keywords like `gì` ("what") from shadowing longer phrases such as
//! `tại sao` ("why") or `bao nhiêu` ("how many").
//!
//! | Order | Type   | Keywords (substring match)                                   |
//! |-------|--------|--------------------------------------------------------------|
//! | 1     | Count  | `bao nhiêu`, `mấy`                                           |
//! | 2     | Color  | `màu gì`                                                     |
//! | 3     | Why    | `tại sao`, `vì sao`                                          |
//! | 4     | When   | `khi nào`, `bao giờ`, `lúc nào`                              |
//! | 5     | Where  | `ở đâu`, `chỗ nào`, `đâu`                                    |
//! | 6     | Who    | `ai`, unless `cái gì` is present                             |
//! | 7     | Yes/No | `có phải`, `có...không`, `không?`, `đúng không`, `phải không`, `chưa` |
//! | 8     | What   | `cái gì`, `là gì`, `gì`                                      |
//! | 9     | How    | `như thế nào`, `ra sao`                                      |
//! | -     | Other  | fallback                                                     |
//!
//! Changing the order changes class boundaries for ambiguous questions, which
//! breaks comparability with earlier reports.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Question type in the 5W1H taxonomy, declared in rule priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QuestionType {
    /// "How many" questions
    Count,
    /// "What color" questions
    Color,
    /// "Why" questions
    Why,
    /// "When" questions
    When,
    /// "Where" questions
    Where,
    /// "Who" questions
    Who,
    /// Yes/no questions
    #[serde(rename = "Yes/No")]
    YesNo,
    /// "What" questions
    What,
    /// "How" questions
    How,
    /// Anything unmatched
    Other,
}

impl QuestionType {
    /// All types in priority order.
    pub const ALL: [QuestionType; 10] = [
        QuestionType::Count,
        QuestionType::Color,
        QuestionType::Why,
        QuestionType::When,
        QuestionType::Where,
        QuestionType::Who,
        QuestionType::YesNo,
        QuestionType::What,
        QuestionType::How,
        QuestionType::Other,
    ];

    /// Display label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Count => "Count",
            QuestionType::Color => "Color",
            QuestionType::Why => "Why",
            QuestionType::When => "When",
            QuestionType::Where => "Where",
            QuestionType::Who => "Who",
            QuestionType::YesNo => "Yes/No",
            QuestionType::What => "What",
            QuestionType::How => "How",
            QuestionType::Other => "Other",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a question into the 5W1H taxonomy.
///
/// Matching is case-insensitive; empty text is [`QuestionType::Other`].
///
/// ```rust
/// use vqa_eval::eval::question_type::{classify, QuestionType};
///
/// assert_eq!(classify("Con mèo màu gì?"), QuestionType::Color);
/// assert_eq!(classify("tại sao cái gì cũng đổ?"), QuestionType::Why);
/// ```
#[must_use]
pub fn classify(question: &str) -> QuestionType {
    let q = question.trim().to_lowercase();
    if q.is_empty() {
        return QuestionType::Other;
    }
    let any = |keys: &[&str]| keys.iter().any(|k| q.contains(k));

    if any(&["bao nhiêu", "mấy"]) {
        QuestionType::Count
    } else if q.contains("màu gì") {
        QuestionType::Color
    } else if any(&["tại sao", "vì sao"]) {
        QuestionType::Why
    } else if any(&["khi nào", "bao giờ", "lúc nào"]) {
        QuestionType::When
    } else if any(&["ở đâu", "chỗ nào", "đâu"]) {
        QuestionType::Where
    } else if q.contains("ai") && !q.contains("cái gì") {
        QuestionType::Who
    } else if any(&[
        "có phải",
        "có...không",
        "không?",
        "đúng không",
        "phải không",
        "chưa",
    ]) {
        QuestionType::YesNo
    } else if any(&["cái gì", "là gì", "gì"]) {
        QuestionType::What
    } else if any(&["như thế nào", "ra sao"]) {
        QuestionType::How
    } else {
        QuestionType::Other
    }
}

// =============================================================================
// Answer Categories
// =============================================================================

/// Coarse category of an answer string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnswerCategory {
    /// Binary answer (yes/no, right/wrong, left/right)
    #[serde(rename = "Yes/No")]
    YesNo,
    /// Pure digit string
    Number,
    /// Everything else
    Other,
}

impl AnswerCategory {
    /// Display label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerCategory::YesNo => "Yes/No",
            AnswerCategory::Number => "Number",
            AnswerCategory::Other => "Other",
        }
    }
}

impl fmt::Display for AnswerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binary-choice answers: có/không (yes/no), phải/trái (right/left),
/// đúng/sai (right/wrong), plus English yes/no.
const YES_NO_LEXICON: &[&str] = &["có", "không", "phải", "trái", "yes", "no", "đúng", "sai"];

/// Categorize an answer.
///
/// ```rust
/// use vqa_eval::eval::question_type::{categorize_answer, AnswerCategory};
///
/// assert_eq!(categorize_answer("Không"), AnswerCategory::YesNo);
/// assert_eq!(categorize_answer("12"), AnswerCategory::Number);
/// assert_eq!(categorize_answer("đen"), AnswerCategory::Other);
/// ```
#[must_use]
pub fn categorize_answer(answer: &str) -> AnswerCategory {
    let a = answer.trim().to_lowercase();
    if YES_NO_LEXICON.contains(&a.as_str()) {
        AnswerCategory::YesNo
    } else if !a.is_empty() && a.chars().all(|c| c.is_ascii_digit()) {
        AnswerCategory::Number
    } else {
        AnswerCategory::Other
    }
}
