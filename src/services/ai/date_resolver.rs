use chrono::{DateTime, Utc};

use crate::errors::AppError;
use crate::models::DateRange;
use crate::services::ai::{LlmProvider, Message};

const SYSTEM_PROMPT: &str = "You output only JSON.";

pub fn build_prompt(message: &str, timezone: &str, now: DateTime<Utc>) -> String {
    format!(
        "The current UTC datetime is {now}.\n\
         User input: \"{message}\"\n\
         Convert it to date range in the future including today if required (YYYY-MM-DD) in {timezone} timezone, respond ONLY in JSON:\n\
         {{\"start\": \"...\", \"end\": \"...\"}}",
        now = now.format("%Y-%m-%d %H:%M:%S %A"),
    )
}

/// Asks the model for the calendar range a free-text phrase refers to.
/// Single shot at temperature 0; a reply that is not a JSON date range is a
/// parse error, never a guessed range.
pub async fn resolve_date_range(
    llm: &dyn LlmProvider,
    message: &str,
    timezone: &str,
    now: DateTime<Utc>,
) -> Result<DateRange, AppError> {
    let messages = [Message {
        role: "user".to_string(),
        content: build_prompt(message, timezone, now),
    }];

    let reply = llm
        .chat(SYSTEM_PROMPT, &messages, 0.0)
        .await
        .map_err(|e| AppError::Upstream(format!("{e:#}")))?;

    let range = parse_date_range(&reply)?;
    tracing::debug!(input = message, timezone, start = %range.start, end = %range.end, "resolved date range");
    Ok(range)
}

pub fn parse_date_range(reply: &str) -> Result<DateRange, AppError> {
    serde_json::from_str(reply.trim()).map_err(|e| {
        tracing::warn!(reply, "model reply is not a JSON date range");
        AppError::Parse(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone};
    use std::sync::Mutex;

    struct CannedLlm {
        reply: String,
        seen: Mutex<Vec<(String, f32)>>,
    }

    #[async_trait]
    impl LlmProvider for CannedLlm {
        async fn chat(
            &self,
            system_prompt: &str,
            messages: &[Message],
            temperature: f32,
        ) -> anyhow::Result<String> {
            assert_eq!(system_prompt, SYSTEM_PROMPT);
            self.seen
                .lock()
                .unwrap()
                .push((messages[0].content.clone(), temperature));
            Ok(self.reply.clone())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 8, 15, 4, 5).unwrap()
    }

    #[test]
    fn test_prompt_embeds_inputs() {
        let prompt = build_prompt("next friday", "Asia/Kolkata", now());
        assert!(prompt.contains("The current UTC datetime is 2025-01-08 15:04:05 Wednesday."));
        assert!(prompt.contains("User input: \"next friday\""));
        assert!(prompt.contains("in Asia/Kolkata timezone"));
        assert!(prompt.ends_with("{\"start\": \"...\", \"end\": \"...\"}"));
    }

    #[test]
    fn test_parse_valid_reply() {
        let range = parse_date_range("  {\"start\": \"2025-01-10\", \"end\": \"2025-01-12\"}\n").unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2025, 1, 10).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2025, 1, 12).unwrap());
    }

    #[test]
    fn test_parse_rejects_prose() {
        let err = parse_date_range("Sure! Next Friday is 2025-01-10.").unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }

    #[test]
    fn test_parse_rejects_fenced_json() {
        let err = parse_date_range("```json\n{\"start\":\"2025-01-10\",\"end\":\"2025-01-10\"}\n```")
            .unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }

    #[tokio::test]
    async fn test_resolve_pins_temperature() {
        let llm = CannedLlm {
            reply: r#"{"start":"2025-01-10","end":"2025-01-10"}"#.to_string(),
            seen: Mutex::new(vec![]),
        };
        let range = resolve_date_range(&llm, "friday", "UTC", now()).await.unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2025, 1, 10).unwrap());

        let seen = llm.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].1, 0.0);
        assert!(seen[0].0.contains("friday"));
    }
}
