//! Weighted multiple-choice career assessment.
//!
//! Each answer option carries a weight per career category. Scoring sums the
//! weights of the chosen options per category and normalizes the totals to
//! percentages. Pure; no I/O.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use crate::error::{Error, Result};

/// A fixed set of questions and the categories they score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalogue {
    /// Category names in display order.
    pub categories: Vec<String>,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub options: Vec<AnswerOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: String,
    pub label: String,
    /// Category → weight. Categories not listed score zero.
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
}

/// The option a student picked for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerChoice {
    pub question_id: String,
    pub option_id: String,
}

/// Result for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: String,
    pub raw: f64,
    /// Share of the total, 0–100.
    pub percentage: f64,
}

impl Catalogue {
    /// Parse and validate a catalogue from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let catalogue: Catalogue = serde_json::from_str(json)?;
        catalogue.validate()?;
        Ok(catalogue)
    }

    /// Ids must be unique and weights may only name declared categories.
    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(Error::Assessment("catalogue declares no categories".into()));
        }

        let categories: HashSet<&str> = self.categories.iter().map(String::as_str).collect();
        if categories.len() != self.categories.len() {
            return Err(Error::Assessment("duplicate category name".into()));
        }

        let mut question_ids = HashSet::new();
        for question in &self.questions {
            if !question_ids.insert(question.id.as_str()) {
                return Err(Error::Assessment(format!("duplicate question id '{}'", question.id)));
            }
            let mut option_ids = HashSet::new();
            for option in &question.options {
                if !option_ids.insert(option.id.as_str()) {
                    return Err(Error::Assessment(format!(
                        "duplicate option id '{}' in question '{}'",
                        option.id, question.id
                    )));
                }
                if let Some(unknown) = option.weights.keys().find(|c| !categories.contains(c.as_str())) {
                    return Err(Error::Assessment(format!(
                        "option '{}' in question '{}' weights unknown category '{unknown}'",
                        option.id, question.id
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }
}

/// Parse answers from JSON: either a list of `{question_id, option_id}`
/// objects or a `{"question_id": "option_id"}` map.
pub fn parse_answers(json: &str) -> Result<Vec<AnswerChoice>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Answers {
        List(Vec<AnswerChoice>),
        Map(BTreeMap<String, String>),
    }

    match serde_json::from_str::<Answers>(json)? {
        Answers::List(list) => Ok(list),
        Answers::Map(map) => Ok(map
            .into_iter()
            .map(|(question_id, option_id)| AnswerChoice {
                question_id,
                option_id,
            })
            .collect()),
    }
}

/// Score a set of answers against a catalogue.
///
/// Results are sorted by percentage, highest first; ties keep catalogue
/// order. Unknown question or option ids and non-positive weights are
/// ignored. When nothing scores, every category reports 0%.
pub fn score(catalogue: &Catalogue, answers: &[AnswerChoice]) -> Vec<CategoryScore> {
    let mut totals: Vec<f64> = vec![0.0; catalogue.categories.len()];

    for answer in answers {
        let Some(question) = catalogue.question(&answer.question_id) else {
            debug!(question = %answer.question_id, "Skipping answer to unknown question");
            continue;
        };
        let Some(option) = question.options.iter().find(|o| o.id == answer.option_id) else {
            debug!(
                question = %answer.question_id,
                option = %answer.option_id,
                "Skipping unknown option"
            );
            continue;
        };
        for (category, weight) in &option.weights {
            if *weight <= 0.0 || !weight.is_finite() {
                continue;
            }
            if let Some(idx) = catalogue.categories.iter().position(|c| c == category) {
                totals[idx] += weight;
            }
        }
    }

    let sum: f64 = totals.iter().sum();
    let mut scores: Vec<CategoryScore> = catalogue
        .categories
        .iter()
        .zip(totals)
        .map(|(category, raw)| CategoryScore {
            category: category.clone(),
            raw,
            percentage: if sum > 0.0 { raw / sum * 100.0 } else { 0.0 },
        })
        .collect();

    // Stable sort keeps catalogue order on ties.
    scores.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));
    scores
}

/// A small built-in catalogue covering the categories the offline responder
/// knows about.
pub fn builtin_catalogue() -> Catalogue {
    fn option(id: &str, label: &str, weights: &[(&str, f64)]) -> AnswerOption {
        AnswerOption {
            id: id.into(),
            label: label.into(),
            weights: weights.iter().map(|(c, w)| ((*c).to_string(), *w)).collect(),
        }
    }

    Catalogue {
        categories: ["Medical", "Engineering", "Teaching", "Commerce", "Arts", "Government"]
            .iter()
            .map(|c| (*c).to_string())
            .collect(),
        questions: vec![
            Question {
                id: "favourite_subject".into(),
                text: "Which subject do you enjoy most?".into(),
                options: vec![
                    option("biology", "Biology", &[("Medical", 3.0), ("Teaching", 1.0)]),
                    option("maths", "Mathematics", &[("Engineering", 3.0), ("Commerce", 1.0)]),
                    option("accounts", "Accounts / Economics", &[("Commerce", 3.0), ("Government", 1.0)]),
                    option("history", "History / Languages", &[("Arts", 2.0), ("Government", 2.0), ("Teaching", 1.0)]),
                ],
            },
            Question {
                id: "free_time".into(),
                text: "What would you rather do on a free afternoon?".into(),
                options: vec![
                    option("build", "Build or fix something", &[("Engineering", 3.0)]),
                    option("help", "Help someone who is unwell", &[("Medical", 3.0)]),
                    option("explain", "Explain a topic to a friend", &[("Teaching", 3.0)]),
                    option("draw", "Draw, write or make music", &[("Arts", 3.0)]),
                    option("sell", "Run a small stall or trade", &[("Commerce", 3.0)]),
                ],
            },
            Question {
                id: "work_style".into(),
                text: "Which work setting sounds best?".into(),
                options: vec![
                    option("hospital", "A hospital or clinic", &[("Medical", 2.0)]),
                    option("lab", "A lab or workshop", &[("Engineering", 2.0), ("Medical", 1.0)]),
                    option("classroom", "A classroom", &[("Teaching", 2.0)]),
                    option("office", "An office with a clear career ladder", &[("Government", 2.0), ("Commerce", 1.0)]),
                    option("studio", "A studio or newsroom", &[("Arts", 2.0)]),
                ],
            },
            Question {
                id: "priority".into(),
                text: "What matters most to you in a career?".into(),
                options: vec![
                    option("security", "Job security", &[("Government", 3.0), ("Teaching", 1.0)]),
                    option("income", "High income", &[("Commerce", 2.0), ("Engineering", 1.0), ("Medical", 1.0)]),
                    option("impact", "Helping people", &[("Medical", 2.0), ("Teaching", 2.0)]),
                    option("expression", "Creative freedom", &[("Arts", 3.0)]),
                ],
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(q: &str, o: &str) -> AnswerChoice {
        AnswerChoice {
            question_id: q.into(),
            option_id: o.into(),
        }
    }

    #[test]
    fn medical_answers_rank_medical_first() {
        let catalogue = builtin_catalogue();
        let scores = score(
            &catalogue,
            &[
                answer("favourite_subject", "biology"),
                answer("free_time", "help"),
                answer("work_style", "hospital"),
            ],
        );
        assert_eq!(scores[0].category, "Medical");
        assert!((scores[0].raw - 8.0).abs() < 1e-9);
    }

    #[test]
    fn percentages_sum_to_hundred() {
        let catalogue = builtin_catalogue();
        let scores = score(
            &catalogue,
            &[answer("favourite_subject", "history"), answer("priority", "income")],
        );
        let total: f64 = scores.iter().map(|s| s.percentage).sum();
        assert!((total - 100.0).abs() < 1e-9);
        assert_eq!(scores.len(), catalogue.categories.len());
    }

    #[test]
    fn no_answers_scores_zero_everywhere() {
        let catalogue = builtin_catalogue();
        let scores = score(&catalogue, &[]);
        assert!(scores.iter().all(|s| s.percentage == 0.0));
        // Ties keep catalogue order.
        assert_eq!(scores[0].category, "Medical");
        assert_eq!(scores[5].category, "Government");
    }

    #[test]
    fn unknown_ids_are_skipped() {
        let catalogue = builtin_catalogue();
        let scores = score(
            &catalogue,
            &[answer("nope", "biology"), answer("free_time", "nope"), answer("free_time", "draw")],
        );
        assert_eq!(scores[0].category, "Arts");
        assert!((scores[0].percentage - 100.0).abs() < 1e-9);
    }

    #[test]
    fn catalogue_parses_from_json() {
        let json = r#"{
            "categories": ["A", "B"],
            "questions": [
                {"id": "q1", "text": "?", "options": [
                    {"id": "x", "label": "X", "weights": {"A": 1.0, "B": 3.0}}
                ]}
            ]
        }"#;
        let catalogue: Catalogue = serde_json::from_str(json).unwrap();
        let scores = score(&catalogue, &[answer("q1", "x")]);
        assert_eq!(scores[0].category, "B");
        assert!((scores[0].percentage - 75.0).abs() < 1e-9);
    }

    #[test]
    fn builtin_catalogue_is_valid() {
        builtin_catalogue().validate().unwrap();
    }

    #[test]
    fn from_json_rejects_unknown_category() {
        let json = r#"{
            "categories": ["A"],
            "questions": [
                {"id": "q1", "text": "?", "options": [
                    {"id": "x", "label": "X", "weights": {"Z": 1.0}}
                ]}
            ]
        }"#;
        let err = Catalogue::from_json(json).unwrap_err();
        assert!(matches!(err, Error::Assessment(_)));
        assert!(err.to_string().contains("'Z'"));
    }

    #[test]
    fn from_json_rejects_duplicate_questions() {
        let json = r#"{
            "categories": ["A"],
            "questions": [
                {"id": "q1", "text": "?", "options": []},
                {"id": "q1", "text": "again?", "options": []}
            ]
        }"#;
        assert!(Catalogue::from_json(json).is_err());
    }

    #[test]
    fn from_json_surfaces_syntax_errors() {
        assert!(matches!(
            Catalogue::from_json("{not json"),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn answers_parse_from_list_or_map() {
        let list = parse_answers(r#"[{"question_id": "free_time", "option_id": "draw"}]"#).unwrap();
        let map = parse_answers(r#"{"free_time": "draw"}"#).unwrap();
        assert_eq!(list, map);
        assert_eq!(list, vec![answer("free_time", "draw")]);
    }
}
