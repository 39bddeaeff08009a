use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};
use atlas_config::StructurerProviderConfig;

const MAX_ATTEMPTS: usize = 3;
const RETRY_DELAY: Duration = Duration::from_millis(100);

const SYSTEM_PROMPT: &str = "You turn document search requests into structured queries. \
Reply with a single JSON object and nothing else, using the keys: \
\"keywords\" (array of short search terms taken from the request, most specific first), \
\"title_must\" (array of terms the document title must contain, usually empty), \
\"content_must\" (array of terms the document body must contain, usually empty), \
\"intent\" (one short sentence describing what the user is looking for). \
Keep terms in the language of the request. Never invent terms that are not implied by it.";

/// Asks a chat-completion endpoint to structure a free-text search request.
///
/// Returns the JSON object produced by the model. Responses that do not parse as JSON are
/// retried a few times before giving up.
pub async fn structure(cfg: &StructurerProviderConfig, query: &str) -> Result<Value> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let messages = build_messages(query);

	for attempt in 0..MAX_ATTEMPTS {
		if attempt > 0 {
			tokio::time::sleep(RETRY_DELAY).await;
		}

		let body = serde_json::json!({
			"model": cfg.model,
			"temperature": cfg.temperature,
			"response_format": { "type": "json_object" },
			"messages": messages,
		});
		let res = client
			.post(&url)
			.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
			.json(&body)
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;

		if let Ok(parsed) = parse_structurer_json(json) {
			return Ok(parsed);
		}
	}

	Err(Error::InvalidResponse { message: "Structurer response is not valid JSON.".to_string() })
}

pub fn build_messages(query: &str) -> Vec<Value> {
	vec![
		serde_json::json!({ "role": "system", "content": SYSTEM_PROMPT }),
		serde_json::json!({ "role": "user", "content": query }),
	]
}

fn parse_structurer_json(json: Value) -> Result<Value> {
	if let Some(content) = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
	{
		let parsed: Value = serde_json::from_str(strip_code_fence(content)).map_err(|_| {
			Error::InvalidResponse { message: "Structurer content is not valid JSON.".to_string() }
		})?;

		if !parsed.is_object() {
			return Err(Error::InvalidResponse {
				message: "Structurer content must be a JSON object.".to_string(),
			});
		}

		return Ok(parsed);
	}

	if json.get("keywords").is_some() {
		return Ok(json);
	}

	Err(Error::InvalidResponse {
		message: "Structurer response is missing JSON content.".to_string(),
	})
}

// Models sometimes wrap JSON in a markdown fence despite the response format.
fn strip_code_fence(content: &str) -> &str {
	let trimmed = content.trim();
	let Some(rest) = trimmed.strip_prefix("```") else { return trimmed };
	let rest = rest.strip_prefix("json").unwrap_or(rest);

	rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_choice_content_json() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "{\"keywords\": [\"예산\", \"2024\"]}" } }
			]
		});
		let parsed = parse_structurer_json(json).expect("parse failed");

		assert_eq!(parsed["keywords"][1], "2024");
	}

	#[test]
	fn strips_markdown_fences() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "```json\n{\"keywords\": [\"roadmap\"]}\n```" } }
			]
		});
		let parsed = parse_structurer_json(json).expect("parse failed");

		assert_eq!(parsed["keywords"][0], "roadmap");
	}

	#[test]
	fn rejects_prose_content() {
		let json = serde_json::json!({
			"choices": [{ "message": { "content": "Sure! Here are some keywords." } }]
		});

		assert!(parse_structurer_json(json).is_err());
	}

	#[test]
	fn messages_carry_the_raw_query() {
		let messages = build_messages("find the Q3 roadmap");

		assert_eq!(messages.len(), 2);
		assert_eq!(messages[1]["content"], "find the Q3 roadmap");
	}
}
