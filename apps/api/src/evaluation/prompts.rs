//! Prompt builders for the evaluation orchestrator.
//! Each feature module keeps its prompts next to the code that sends them.

/// Target shape for single-call structured mode. The category names are
/// part of the rubric contract with the client application.
pub const STRUCTURED_TARGET_SHAPE: &str = r#"{
  "CLIENT_INFORMATION": [],
  "FIGURES_AND_VALUES": [],
  "TYPOGRAPHY_AND_LANGUAGE": []
}"#;

/// User message for structured mode: the exact object shape to return,
/// then the document under analysis.
pub fn structured_user_prompt(document: &str) -> String {
    format!(
        "Return a JSON object EXACTLY like this:\n{STRUCTURED_TARGET_SHAPE}\n\n\
         - Each array element must be an object with \"issue\" and \"details\".\n\
         - If no issues in a category, leave the array empty.\n\n\
         Document to analyse:\n```txt\n{document}\n```"
    )
}

/// User message for per-item checklist mode: one topic per call, so the
/// reply stays small and on-subject.
pub fn checklist_user_prompt(item: &str, document: &str) -> String {
    format!(
        "Review the document below against this checklist item:\n\
         {item}\n\n\
         Report each observation on its own line, as a short bullet point. \
         If there is nothing to report for this item, respond with an empty message.\n\n\
         Document to analyse:\n```txt\n{document}\n```"
    )
}
