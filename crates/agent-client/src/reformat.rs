//! Reformats a turn's event stream into chat-friendly markdown fragments.
//!
//! Two rulesets exist. Regular mode passes inference text through verbatim
//! and only announces tool executions. ReAct mode buffers step text,
//! interprets completed inference steps as reasoning JSON, collects tool
//! results and summarizes them at end of turn when no final answer was
//! produced. All failures degrade to a visible fragment or a log line;
//! nothing in here returns an error.
//!
//! A payload-less event aborts a ReAct turn but not a Regular one. The
//! asymmetry is inherited behavior and deliberately kept.

use async_stream::stream;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt, pin_mut};
use serde_json::Value;

use crate::events::{
    AgentMode, ContentDelta, EventPayload, StepDetails, ToolResponse, TurnEvent,
};

/// Tool whose results carry a `top_k` hit list with title/content/url entries.
const WEB_SEARCH_TOOL: &str = "web_search";

/// Dict values and list fallbacks longer than this render as a placeholder.
const INLINE_VALUE_LIMIT: usize = 100;

/// Transform a turn's events into displayable text fragments.
///
/// The output stream is forward-only and single-consumer; dropping it stops
/// event consumption. State lives entirely in the call, so concurrent turns
/// never interact.
pub fn reformat_turn<S>(mode: AgentMode, events: S) -> BoxStream<'static, String>
where
    S: Stream<Item = TurnEvent> + Send + 'static,
{
    match mode {
        AgentMode::ReAct => react_stream(events),
        AgentMode::Regular => regular_stream(events),
    }
}

fn react_stream<S>(events: S) -> BoxStream<'static, String>
where
    S: Stream<Item = TurnEvent> + Send + 'static,
{
    Box::pin(stream! {
        pin_mut!(events);

        let mut current_step_text = String::new();
        let mut tool_results: Vec<(String, String)> = Vec::new();
        let mut final_answer: Option<String> = None;

        while let Some(event) = events.next().await {
            let TurnEvent { payload, raw } = event;

            let Some(payload) = payload else {
                yield format!(
                    "\n\n🚨 :red[_Agent runtime error:_]\n\
                     The response received is missing an expected `payload` field.\n\
                     This could indicate a malformed response or an internal issue within the runtime.\n\n\
                     Error details: {}",
                    event_detail(raw)
                );
                return;
            };

            match payload {
                EventPayload::StepProgress { delta } => {
                    if let Some(ContentDelta::Text { text }) = delta {
                        current_step_text.push_str(&text);
                    }
                }
                EventPayload::StepComplete { step_details } => {
                    match step_details {
                        Some(StepDetails::Inference {}) => {
                            if let Some(fragment) =
                                process_inference_step(&current_step_text, &mut final_answer)
                            {
                                yield fragment;
                            }
                        }
                        Some(StepDetails::ToolExecution { tool_responses, .. }) => {
                            record_tool_results(&tool_responses, &mut tool_results);
                        }
                        Some(StepDetails::Other) | None => {}
                    }
                    current_step_text.clear();
                }
                EventPayload::Unknown => {}
            }
        }

        // A recorded final answer suppresses the summary even when tool
        // results exist.
        if final_answer.is_none() && !tool_results.is_empty() {
            for fragment in format_tool_results_summary(&tool_results) {
                yield fragment;
            }
        }
    })
}

fn regular_stream<S>(events: S) -> BoxStream<'static, String>
where
    S: Stream<Item = TurnEvent> + Send + 'static,
{
    Box::pin(stream! {
        pin_mut!(events);

        while let Some(event) = events.next().await {
            let TurnEvent { payload, raw } = event;

            let Some(payload) = payload else {
                // Unlike ReAct, keep consuming the stream.
                yield format!("Error occurred in the agent runtime: {}", event_detail(raw));
                continue;
            };

            tracing::debug!(?payload, "turn event");
            match payload {
                EventPayload::StepProgress { delta } => {
                    if let Some(ContentDelta::Text { text }) = delta {
                        yield text;
                    }
                }
                EventPayload::StepComplete { step_details } => {
                    if let Some(StepDetails::ToolExecution { tool_calls, .. }) = step_details {
                        match tool_calls.first() {
                            Some(call) => {
                                yield format!(
                                    "\n\n🛠 :grey[_Using \"{}\" tool:_]\n\n",
                                    call.tool_name
                                );
                            }
                            None => {
                                yield "No tool_calls present in step_details".to_string();
                            }
                        }
                    }
                }
                EventPayload::Unknown => {}
            }
        }
    })
}

fn event_detail(raw: Option<String>) -> String {
    raw.unwrap_or_else(|| "<event carried no payload>".to_string())
}

/// Interpret one completed inference step's buffered text.
///
/// Returns at most one fragment; a usable answer is also recorded in
/// `final_answer` so the end-of-turn summary can be suppressed.
fn process_inference_step(raw: &str, final_answer: &mut Option<String>) -> Option<String> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(_) => {
            return Some(format!(
                "\n\nFailed to parse ReAct step content:\n```json\n{raw}\n```"
            ));
        }
    };

    let object = match value.as_object() {
        Some(object) => object,
        None => {
            return Some(format!(
                "\n\nFailed to process ReAct step: expected a reasoning object, got {value}\n```json\n{raw}\n```"
            ));
        }
    };

    if let Some(thought) = object.get("thought").and_then(Value::as_str) {
        tracing::debug!("ReAct thought: {}", thought);
    }

    match object.get("answer") {
        None | Some(Value::Null) => None,
        Some(Value::String(answer)) if answer == "null" => None,
        Some(answer) => {
            let text = value_text(answer);
            *final_answer = Some(text.clone());
            Some(format!("\n\n✅ **Final Answer:**\n{text}"))
        }
    }
}

fn record_tool_results(tool_responses: &[ToolResponse], tool_results: &mut Vec<(String, String)>) {
    if tool_responses.is_empty() {
        tracing::info!("Tool execution step completed, but no response data found");
        return;
    }

    for response in tool_responses {
        match serde_json::from_str::<Value>(&response.content) {
            Ok(parsed) => tracing::debug!("Tool {} returned: {}", response.tool_name, parsed),
            Err(_) => tracing::debug!("Tool {} returned non-JSON content", response.tool_name),
        }
        tool_results.push((response.tool_name.clone(), response.content.clone()));
    }
}

/// End-of-turn digest of every recorded tool result.
fn format_tool_results_summary(tool_results: &[(String, String)]) -> Vec<String> {
    let mut fragments = vec!["\n\n**Here's what I found:**\n".to_string()];

    for (tool_name, content) in tool_results {
        let parsed: Value = match serde_json::from_str(content) {
            Ok(value) => value,
            Err(_) => {
                fragments.push(format!(
                    "\n**{tool_name}** was used but returned complex data. Check the observation for details.\n"
                ));
                continue;
            }
        };

        if tool_name == WEB_SEARCH_TOOL
            && parsed.get("top_k").is_some_and(Value::is_array)
        {
            if let Some(hits) = parsed.get("top_k").and_then(Value::as_array) {
                fragments.extend(format_web_search_results(hits));
            }
        } else if let Some(results) = parsed.get("results").and_then(Value::as_array) {
            fragments.extend(format_results_list(results));
        } else if let Some(object) = parsed.as_object().filter(|o| !o.is_empty()) {
            fragments.extend(format_dict_results(object));
        } else if let Some(items) = parsed.as_array().filter(|a| !a.is_empty()) {
            fragments.extend(format_list_results(items));
        }
    }

    fragments
}

fn format_web_search_results(hits: &[Value]) -> Vec<String> {
    hits.iter()
        .take(3)
        .map(|hit| {
            let title = hit.get("title").and_then(Value::as_str).unwrap_or("Untitled");
            let url = hit.get("url").and_then(Value::as_str).unwrap_or("");
            let content = hit
                .get("content")
                .and_then(Value::as_str)
                .unwrap_or("")
                .trim();
            format!("\n- **{title}**\n  {content}\n  [Source]({url})\n")
        })
        .collect()
}

fn format_results_list(results: &[Value]) -> Vec<String> {
    results
        .iter()
        .take(3)
        .enumerate()
        .map(|(index, result)| match result.as_object() {
            Some(object) => {
                let name = object
                    .get("name")
                    .or_else(|| object.get("title"))
                    .filter(|v| !v.is_null())
                    .map(value_text)
                    .unwrap_or_else(|| format!("Result {}", index + 1));
                let description = object
                    .get("description")
                    .or_else(|| object.get("content"))
                    .or_else(|| object.get("summary"))
                    .filter(|v| !v.is_null())
                    .map(value_text)
                    .unwrap_or_default();
                format!("\n- **{name}**\n  {description}\n")
            }
            None => format!("\n- {}\n", value_text(result)),
        })
        .collect()
}

fn format_dict_results(object: &serde_json::Map<String, Value>) -> Vec<String> {
    let mut fragments = vec!["\n```\n".to_string()];

    for (key, value) in object.iter().take(5) {
        match value.as_str() {
            Some(text) if text.chars().count() < INLINE_VALUE_LIMIT => {
                fragments.push(format!("{key}: {text}\n"));
            }
            _ => fragments.push(format!("{key}: [Complex data]\n")),
        }
    }

    fragments.push("```\n".to_string());
    fragments
}

fn format_list_results(items: &[Value]) -> Vec<String> {
    let mut fragments = vec!["\n".to_string()];

    for item in items.iter().take(3) {
        if let Some(text) = item.as_str() {
            fragments.push(format!("- {text}\n"));
        } else if let Some(object) = item.as_object() {
            if let Some(text_value) = object.get("text") {
                fragments.push(format!("- {}\n", value_text(text_value)));
            } else if let Some(first_value) = object.values().next() {
                if let Some(text) = first_value.as_str() {
                    if text.chars().count() < INLINE_VALUE_LIMIT {
                        fragments.push(format!("- {text}\n"));
                    }
                }
            }
        }
        // Bare numbers/booleans contribute nothing.
    }

    fragments
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn progress(text: &str) -> TurnEvent {
        TurnEvent {
            payload: Some(EventPayload::StepProgress {
                delta: Some(ContentDelta::Text {
                    text: text.to_string(),
                }),
            }),
            raw: None,
        }
    }

    fn inference_complete() -> TurnEvent {
        TurnEvent {
            payload: Some(EventPayload::StepComplete {
                step_details: Some(StepDetails::Inference {}),
            }),
            raw: None,
        }
    }

    fn tool_complete(responses: &[(&str, &str)]) -> TurnEvent {
        TurnEvent {
            payload: Some(EventPayload::StepComplete {
                step_details: Some(StepDetails::ToolExecution {
                    tool_calls: Vec::new(),
                    tool_responses: responses
                        .iter()
                        .map(|(name, content)| ToolResponse {
                            tool_name: name.to_string(),
                            call_id: None,
                            content: content.to_string(),
                        })
                        .collect(),
                }),
            }),
            raw: None,
        }
    }

    fn tool_announcement(tool_names: &[&str]) -> TurnEvent {
        TurnEvent {
            payload: Some(EventPayload::StepComplete {
                step_details: Some(StepDetails::ToolExecution {
                    tool_calls: tool_names
                        .iter()
                        .map(|name| crate::events::ToolCall {
                            tool_name: name.to_string(),
                            call_id: None,
                            arguments: None,
                        })
                        .collect(),
                    tool_responses: Vec::new(),
                }),
            }),
            raw: None,
        }
    }

    fn malformed(raw: &str) -> TurnEvent {
        TurnEvent {
            payload: None,
            raw: Some(raw.to_string()),
        }
    }

    async fn collect(mode: AgentMode, events: Vec<TurnEvent>) -> Vec<String> {
        reformat_turn(mode, stream::iter(events)).collect().await
    }

    #[tokio::test]
    async fn regular_mode_passes_deltas_through_verbatim() {
        let fragments = collect(
            AgentMode::Regular,
            vec![progress("Hel"), progress("lo"), progress(" world")],
        )
        .await;

        assert_eq!(fragments, vec!["Hel", "lo", " world"]);
        assert_eq!(fragments.concat(), "Hello world");
    }

    #[tokio::test]
    async fn regular_mode_announces_the_first_tool_call() {
        let fragments = collect(
            AgentMode::Regular,
            vec![tool_announcement(&["web_search", "calculator"])],
        )
        .await;

        assert_eq!(
            fragments,
            vec!["\n\n🛠 :grey[_Using \"web_search\" tool:_]\n\n"]
        );
    }

    #[tokio::test]
    async fn regular_mode_reports_missing_tool_calls() {
        let fragments = collect(AgentMode::Regular, vec![tool_announcement(&[])]).await;
        assert_eq!(fragments, vec!["No tool_calls present in step_details"]);
    }

    #[tokio::test]
    async fn regular_mode_continues_after_a_malformed_event() {
        let fragments = collect(
            AgentMode::Regular,
            vec![malformed("{\"oops\": true}"), progress("still here")],
        )
        .await;

        assert_eq!(fragments.len(), 2);
        assert!(fragments[0].contains("Error occurred in the agent runtime"));
        assert!(fragments[0].contains("{\"oops\": true}"));
        assert_eq!(fragments[1], "still here");
    }

    #[tokio::test]
    async fn react_mode_stops_at_a_malformed_event() {
        let fragments = collect(
            AgentMode::ReAct,
            vec![
                malformed("server hiccup"),
                progress("{\"answer\": \"never seen\"}"),
                inference_complete(),
            ],
        )
        .await;

        assert_eq!(fragments.len(), 1);
        assert!(fragments[0].contains("🚨"));
        assert!(fragments[0].contains("server hiccup"));
    }

    #[tokio::test]
    async fn react_answer_emits_final_answer_and_suppresses_summary() {
        let fragments = collect(
            AgentMode::ReAct,
            vec![
                tool_complete(&[("calculator", r#"{"value": "6"}"#)]),
                progress(r#"{"thought": "easy", "action": null, "answer": "42"}"#),
                inference_complete(),
            ],
        )
        .await;

        assert_eq!(fragments.len(), 1);
        assert!(fragments[0].ends_with("42"));
        assert!(fragments[0].contains("✅ **Final Answer:**"));
    }

    #[tokio::test]
    async fn react_null_answers_are_not_answers() {
        let fragments = collect(
            AgentMode::ReAct,
            vec![
                progress(r#"{"thought": "hmm", "answer": null}"#),
                inference_complete(),
                progress(r#"{"thought": "hmm", "answer": "null"}"#),
                inference_complete(),
            ],
        )
        .await;

        assert!(fragments.is_empty());
    }

    #[tokio::test]
    async fn react_invalid_json_degrades_to_a_diagnostic() {
        let fragments = collect(
            AgentMode::ReAct,
            vec![progress("thought: no json here"), inference_complete()],
        )
        .await;

        assert_eq!(fragments.len(), 1);
        assert!(fragments[0].starts_with("\n\nFailed to parse ReAct step content:"));
        assert!(fragments[0].contains("thought: no json here"));
    }

    #[tokio::test]
    async fn react_non_object_step_is_a_processing_error() {
        let fragments = collect(
            AgentMode::ReAct,
            vec![progress(r#"["not", "an", "object"]"#), inference_complete()],
        )
        .await;

        assert_eq!(fragments.len(), 1);
        assert!(fragments[0].starts_with("\n\nFailed to process ReAct step:"));
    }

    #[tokio::test]
    async fn react_step_text_resets_between_steps() {
        // First step's buffer must not leak into the second parse.
        let fragments = collect(
            AgentMode::ReAct,
            vec![
                progress(r#"{"thought": "working", "answer": null}"#),
                inference_complete(),
                progress(r#"{"answer": "done"}"#),
                inference_complete(),
            ],
        )
        .await;

        assert_eq!(fragments.len(), 1);
        assert!(fragments[0].ends_with("done"));
    }

    #[tokio::test]
    async fn summary_covers_every_tool_even_unparseable_ones() {
        let fragments = collect(
            AgentMode::ReAct,
            vec![
                tool_complete(&[
                    ("lookup", r#"{"results": [{"name": "Widget", "description": "A part"}]}"#),
                    ("broken", "<<not json>>"),
                ]),
                progress(r#"{"answer": null}"#),
                inference_complete(),
            ],
        )
        .await;

        assert_eq!(fragments[0], "\n\n**Here's what I found:**\n");
        let body = fragments.concat();
        assert!(body.contains("- **Widget**\n  A part"));
        assert!(body.contains(
            "**broken** was used but returned complex data. Check the observation for details."
        ));
    }

    #[tokio::test]
    async fn web_search_results_render_with_defaults_and_cap() {
        let content = serde_json::json!({
            "top_k": [
                {"title": "First", "content": "  padded  ", "url": "https://a.example"},
                {"url": "https://b.example"},
                {"title": "Third", "content": "c", "url": "https://c.example"},
                {"title": "Fourth", "content": "never shown", "url": "https://d.example"}
            ]
        })
        .to_string();

        let fragments = collect(
            AgentMode::ReAct,
            vec![tool_complete(&[("web_search", content.as_str())])],
        )
        .await;

        let body = fragments.concat();
        assert!(body.contains("- **First**\n  padded\n  [Source](https://a.example)"));
        assert!(body.contains("- **Untitled**\n  \n  [Source](https://b.example)"));
        assert!(body.contains("- **Third**"));
        assert!(!body.contains("Fourth"));
    }

    #[tokio::test]
    async fn results_lists_cap_at_three_entries() {
        let content = serde_json::json!({
            "results": [
                {"title": "A", "summary": "sa"},
                "plain entry",
                {"description": "only description"},
                {"name": "D"}
            ]
        })
        .to_string();

        let fragments = collect(
            AgentMode::ReAct,
            vec![tool_complete(&[("catalog", content.as_str())])],
        )
        .await;

        let body = fragments.concat();
        assert!(body.contains("- **A**\n  sa"));
        assert!(body.contains("- plain entry"));
        assert!(body.contains("- **Result 3**\n  only description"));
        assert!(!body.contains("**D**"));
    }

    #[tokio::test]
    async fn dict_results_cap_at_five_keys_and_hide_long_values() {
        let long_value = "x".repeat(100);
        let content = format!(
            r#"{{"k1": "short", "k2": "{long_value}", "k3": 7, "k4": "ok", "k5": "fine", "k6": "dropped"}}"#
        );

        let fragments = collect(
            AgentMode::ReAct,
            vec![tool_complete(&[("info", content.as_str())])],
        )
        .await;

        let body = fragments.concat();
        assert!(body.contains("k1: short\n"));
        assert!(body.contains("k2: [Complex data]\n"));
        assert!(!body.contains(&long_value));
        assert!(body.contains("k3: [Complex data]\n"));
        assert!(body.contains("k5: fine\n"));
        assert!(!body.contains("k6"));
        // fenced block opens and closes
        assert_eq!(body.matches("```").count(), 2);
    }

    #[tokio::test]
    async fn bare_list_results_render_strings_and_text_objects() {
        let content = serde_json::json!([
            "first",
            {"text": "second"},
            {"other": "third"},
            "never shown"
        ])
        .to_string();

        let fragments = collect(
            AgentMode::ReAct,
            vec![tool_complete(&[("list_tool", content.as_str())])],
        )
        .await;

        let body = fragments.concat();
        assert!(body.contains("- first\n"));
        assert!(body.contains("- second\n"));
        assert!(body.contains("- third\n"));
        assert!(!body.contains("never shown"));
    }

    #[tokio::test]
    async fn empty_payload_shapes_are_silent() {
        let fragments = collect(
            AgentMode::ReAct,
            vec![tool_complete(&[("empty_obj", "{}"), ("empty_list", "[]")])],
        )
        .await;

        // Only the header shows up; neither tool has anything to say.
        assert_eq!(fragments, vec!["\n\n**Here's what I found:**\n"]);
    }

    #[tokio::test]
    async fn unknown_payloads_are_ignored_in_both_modes() {
        let unknown = TurnEvent {
            payload: Some(EventPayload::Unknown),
            raw: None,
        };

        assert!(collect(AgentMode::ReAct, vec![unknown.clone()]).await.is_empty());
        assert!(collect(AgentMode::Regular, vec![unknown]).await.is_empty());
    }

    #[tokio::test]
    async fn tool_execution_with_no_responses_records_nothing() {
        let fragments = collect(AgentMode::ReAct, vec![tool_announcement(&["noop"])]).await;
        assert!(fragments.is_empty());
    }
}
