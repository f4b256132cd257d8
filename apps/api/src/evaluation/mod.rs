//! Evaluation Orchestrator — turns a rubric and extracted document text
//! into one or more external-service calls and a normalized result.
//!
//! Two modes, selected by rubric shape:
//! - `checklist` present → one free-text call per item, strictly
//!   sequential, replies split into per-line observations.
//! - no `checklist` → a single structured call asking for a strict
//!   JSON object of named issue categories.
//!
//! Failure anywhere aborts the whole evaluation. Per-item results
//! computed before a failure are discarded; the caller never sees a
//! partial result.

pub mod handlers;
pub mod prompts;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::llm_client::{strip_json_fences, LlmError, OutputMode, TextGenerator};
use crate::rubric::Rubric;

/// Character budget for the document text in single-call structured mode.
pub const STRUCTURED_TEXT_BUDGET: usize = 120_000;
/// Character budget per call in checklist mode, where the document is
/// re-sent once per item.
pub const CHECKLIST_TEXT_BUDGET: usize = 12_000;

/// Leading markers stripped from each observation line.
const BULLET_MARKERS: &[char] = &['-', '*', '•', '–', '—', '·'];

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("External service call failed: {0}")]
    Service(#[from] LlmError),

    #[error("External service returned a malformed response: {0}")]
    MalformedResponse(String),
}

/// One checklist item together with the observations the service made
/// about it. `points` may be empty; the record is never omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistFinding {
    pub item: String,
    pub points: Vec<String>,
}

/// The result returned to the caller. Serializes untagged: structured
/// mode is the category object itself, checklist mode is the array of
/// findings in checklist order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EvaluationResult {
    Structured(Map<String, Value>),
    Checklist(Vec<ChecklistFinding>),
}

/// Evaluates extracted document text against the rubric.
pub async fn evaluate(
    llm: &dyn TextGenerator,
    rubric: &Rubric,
    document_text: &str,
) -> Result<EvaluationResult, EvaluationError> {
    match &rubric.checklist {
        Some(items) => evaluate_checklist(llm, &rubric.system, items, document_text)
            .await
            .map(EvaluationResult::Checklist),
        None => evaluate_structured(llm, &rubric.system, document_text)
            .await
            .map(EvaluationResult::Structured),
    }
}

/// Single-call structured mode: one JSON-mode request embedding the
/// target object shape and the (truncated) document.
async fn evaluate_structured(
    llm: &dyn TextGenerator,
    system: &str,
    document_text: &str,
) -> Result<Map<String, Value>, EvaluationError> {
    let document = truncate_chars(document_text, STRUCTURED_TEXT_BUDGET);
    let user = prompts::structured_user_prompt(document);

    let reply = llm.generate(system, &user, OutputMode::JsonObject).await?;

    let parsed: Value = serde_json::from_str(strip_json_fences(&reply))
        .map_err(|e| EvaluationError::MalformedResponse(e.to_string()))?;

    match parsed {
        Value::Object(map) => Ok(map),
        other => Err(EvaluationError::MalformedResponse(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Per-item mode: one free-text request per checklist entry, issued
/// strictly sequentially so the external service sees at most one
/// in-flight call. Findings come back in checklist order by
/// construction.
async fn evaluate_checklist(
    llm: &dyn TextGenerator,
    system: &str,
    items: &[String],
    document_text: &str,
) -> Result<Vec<ChecklistFinding>, EvaluationError> {
    let document = truncate_chars(document_text, CHECKLIST_TEXT_BUDGET);

    let mut findings = Vec::with_capacity(items.len());
    for item in items {
        let user = prompts::checklist_user_prompt(item, document);
        let reply = llm.generate(system, &user, OutputMode::FreeText).await?;
        findings.push(ChecklistFinding {
            item: item.clone(),
            points: parse_observations(&reply),
        });
    }
    Ok(findings)
}

/// Splits a free-text reply into observation strings: one per non-empty
/// line, leading bullet markers and whitespace stripped.
fn parse_observations(reply: &str) -> Vec<String> {
    reply
        .lines()
        .map(|line| {
            line.trim_start_matches(|c: char| c.is_whitespace() || BULLET_MARKERS.contains(&c))
                .trim()
        })
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Truncates to at most `max` characters without splitting a UTF-8
/// scalar value.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted stand-in for the external service: pops canned replies
    /// in order and records every prompt it was given.
    struct ScriptedGenerator {
        replies: Mutex<VecDeque<Result<String, ()>>>,
        calls: Mutex<Vec<(String, String, OutputMode)>>,
    }

    impl ScriptedGenerator {
        fn new(replies: Vec<Result<&str, ()>>) -> Self {
            Self {
                replies: Mutex::new(
                    replies
                        .into_iter()
                        .map(|r| r.map(str::to_string))
                        .collect(),
                ),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(String, String, OutputMode)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(
            &self,
            system: &str,
            user: &str,
            mode: OutputMode,
        ) -> Result<String, LlmError> {
            self.calls
                .lock()
                .unwrap()
                .push((system.to_string(), user.to_string(), mode));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("scripted generator ran out of replies")
                .map_err(|_| LlmError::EmptyContent)
        }
    }

    fn rubric(system: &str, checklist: Option<Vec<&str>>) -> Rubric {
        Rubric {
            system: system.to_string(),
            checklist: checklist.map(|items| items.into_iter().map(str::to_string).collect()),
            extra: serde_json::Map::new(),
        }
    }

    #[tokio::test]
    async fn test_checklist_mode_one_call_per_item_in_order() {
        let llm = ScriptedGenerator::new(vec![
            Ok("- wording is clear\n- short sentences"),
            Ok("• too casual"),
        ]);
        let rubric = rubric("Check tone", Some(vec!["Clarity", "Formality"]));

        let result = evaluate(&llm, &rubric, "Hello there.\nThanks.")
            .await
            .unwrap();

        let calls = llm.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].1.contains("Clarity"));
        assert!(calls[1].1.contains("Formality"));
        assert!(calls.iter().all(|c| c.0 == "Check tone"));
        assert!(calls.iter().all(|c| c.2 == OutputMode::FreeText));
        assert!(calls.iter().all(|c| c.1.contains("Hello there.")));

        assert_eq!(
            result,
            EvaluationResult::Checklist(vec![
                ChecklistFinding {
                    item: "Clarity".to_string(),
                    points: vec![
                        "wording is clear".to_string(),
                        "short sentences".to_string()
                    ],
                },
                ChecklistFinding {
                    item: "Formality".to_string(),
                    points: vec!["too casual".to_string()],
                },
            ])
        );
    }

    #[tokio::test]
    async fn test_checklist_mode_keeps_empty_records() {
        let llm = ScriptedGenerator::new(vec![Ok(""), Ok("- one point")]);
        let rubric = rubric("sys", Some(vec!["A", "B"]));

        let result = evaluate(&llm, &rubric, "text").await.unwrap();
        let EvaluationResult::Checklist(findings) = result else {
            panic!("expected checklist result");
        };
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].item, "A");
        assert!(findings[0].points.is_empty());
        assert_eq!(findings[1].points, vec!["one point".to_string()]);
    }

    #[tokio::test]
    async fn test_nothing_to_report_reply_yields_empty_points_record() {
        // Mirrors `LlmClient`'s handling of an empty assistant message:
        // free-text mode passes it through, JSON mode rejects it. An
        // empty reply is what the checklist prompt asks for when an
        // item has no findings, so it must not abort the evaluation.
        struct NothingToReport;

        #[async_trait]
        impl TextGenerator for NothingToReport {
            async fn generate(
                &self,
                _system: &str,
                _user: &str,
                mode: OutputMode,
            ) -> Result<String, LlmError> {
                let content: Option<String> = Some(String::new());
                match mode {
                    OutputMode::FreeText => Ok(content.unwrap_or_default()),
                    OutputMode::JsonObject => content
                        .filter(|c| !c.is_empty())
                        .ok_or(LlmError::EmptyContent),
                }
            }
        }

        let rubric = rubric("Check tone", Some(vec!["Clarity"]));
        let result = evaluate(&NothingToReport, &rubric, "Hello there.")
            .await
            .unwrap();

        assert_eq!(
            result,
            EvaluationResult::Checklist(vec![ChecklistFinding {
                item: "Clarity".to_string(),
                points: vec![],
            }])
        );
    }

    #[tokio::test]
    async fn test_checklist_failure_discards_partial_results() {
        let llm = ScriptedGenerator::new(vec![Ok("- fine"), Err(())]);
        let rubric = rubric("sys", Some(vec!["A", "B", "C"]));

        let err = evaluate(&llm, &rubric, "text").await.unwrap_err();
        assert!(matches!(err, EvaluationError::Service(_)));
        // The third item was never attempted
        assert_eq!(llm.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_checklist_makes_no_calls() {
        let llm = ScriptedGenerator::new(vec![]);
        let rubric = rubric("sys", Some(vec![]));

        let result = evaluate(&llm, &rubric, "text").await.unwrap();
        assert_eq!(result, EvaluationResult::Checklist(vec![]));
        assert!(llm.calls().is_empty());
    }

    #[tokio::test]
    async fn test_structured_mode_single_json_call() {
        let llm = ScriptedGenerator::new(vec![Ok(
            r#"{"CLIENT_INFORMATION": [], "FIGURES_AND_VALUES": [{"issue": "stale figure", "details": "page 3"}], "TYPOGRAPHY_AND_LANGUAGE": []}"#,
        )]);
        let rubric = rubric("Check the SOA", None);

        let result = evaluate(&llm, &rubric, "document body").await.unwrap();

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].2, OutputMode::JsonObject);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["FIGURES_AND_VALUES"][0]["issue"], "stale figure");
        assert_eq!(json["CLIENT_INFORMATION"], json!([]));
    }

    #[tokio::test]
    async fn test_structured_mode_tolerates_code_fences() {
        let llm = ScriptedGenerator::new(vec![Ok("```json\n{\"ISSUES\": []}\n```")]);
        let rubric = rubric("sys", None);

        let result = evaluate(&llm, &rubric, "text").await.unwrap();
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"ISSUES": []})
        );
    }

    #[tokio::test]
    async fn test_structured_mode_invalid_json_fails() {
        let llm = ScriptedGenerator::new(vec![Ok("I could not produce JSON, sorry.")]);
        let rubric = rubric("sys", None);

        let err = evaluate(&llm, &rubric, "text").await.unwrap_err();
        assert!(matches!(err, EvaluationError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_structured_mode_non_object_json_fails() {
        let llm = ScriptedGenerator::new(vec![Ok(r#"["an", "array"]"#)]);
        let rubric = rubric("sys", None);

        let err = evaluate(&llm, &rubric, "text").await.unwrap_err();
        assert!(matches!(err, EvaluationError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_observations_strips_markers_and_blanks() {
        let reply = "- first point\n\n  * second point  \n•third\nplain line\n   \n";
        assert_eq!(
            parse_observations(reply),
            vec!["first point", "second point", "third", "plain line"]
        );
    }

    #[test]
    fn test_parse_observations_empty_reply() {
        assert!(parse_observations("").is_empty());
        assert!(parse_observations("\n\n  \n").is_empty());
    }

    #[test]
    fn test_truncate_chars_counts_chars_not_bytes() {
        let text = "héllo wörld";
        assert_eq!(truncate_chars(text, 5), "héllo");
        assert_eq!(truncate_chars(text, 100), text);
        assert_eq!(truncate_chars("", 10), "");
    }

    #[test]
    fn test_checklist_result_serializes_as_item_points_records() {
        let result = EvaluationResult::Checklist(vec![ChecklistFinding {
            item: "Clarity".to_string(),
            points: vec!["fine".to_string()],
        }]);
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!([{"item": "Clarity", "points": ["fine"]}])
        );
    }
}
