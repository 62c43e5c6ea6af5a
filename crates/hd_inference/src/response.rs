use hd_core::{Error, ModelResponse, ResponseShape, Result};
use serde_json::Value;

/// Pull the text out of a model response, whatever shape the backend left it in.
pub fn extract_text(response: &ModelResponse) -> Result<String> {
    match response.shape() {
        ResponseShape::DirectText(text) => Ok(text),
        ResponseShape::Parts(parts) => Ok(parts.join("\n")),
        ResponseShape::Empty { finish_reasons } => {
            let reasons = if finish_reasons.is_empty() {
                "unknown".to_string()
            } else {
                finish_reasons.into_iter().collect::<Vec<_>>().join(", ")
            };
            Err(Error::Summarization(format!(
                "model returned no textual parts (finish_reason={})",
                reasons
            )))
        }
    }
}

/// Parse model output as JSON, falling back to the outermost `{...}` span when
/// the model wrapped its answer in prose or fences.
pub fn extract_json(raw: &str) -> Result<Value> {
    let raw = raw.trim();
    let direct_err = match serde_json::from_str::<Value>(raw) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    let span = raw
        .find('{')
        .zip(raw.rfind('}'))
        .filter(|(start, end)| start < end);
    let Some((start, end)) = span else {
        return Err(invalid_json(direct_err));
    };
    serde_json::from_str(&raw[start..=end]).map_err(invalid_json)
}

fn invalid_json(e: serde_json::Error) -> Error {
    Error::Summarization(format!("model output is not valid JSON: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hd_core::Candidate;
    use serde_json::json;

    #[test]
    fn test_extract_text_joins_parts_with_newlines() {
        let response = ModelResponse {
            text: None,
            candidates: vec![Candidate {
                parts: vec!["{\"a\":".to_string(), "1}".to_string()],
                finish_reason: Some("STOP".to_string()),
            }],
        };
        assert_eq!(extract_text(&response).unwrap(), "{\"a\":\n1}");
    }

    #[test]
    fn test_extract_text_reports_finish_reasons() {
        let response = ModelResponse {
            text: None,
            candidates: vec![
                Candidate { parts: vec![], finish_reason: Some("SAFETY".to_string()) },
                Candidate { parts: vec![], finish_reason: Some("RECITATION".to_string()) },
            ],
        };
        let err = extract_text(&response).unwrap_err().to_string();
        assert!(err.contains("finish_reason=RECITATION, SAFETY"), "{}", err);

        let err = extract_text(&ModelResponse::default()).unwrap_err().to_string();
        assert!(err.contains("finish_reason=unknown"), "{}", err);
    }

    #[test]
    fn test_extract_json_direct() {
        assert_eq!(extract_json("  {\"score\": 4}\n").unwrap(), json!({"score": 4}));
    }

    #[test]
    fn test_extract_json_from_prose() {
        let raw = "Sure! {\"summary_points\":[\"a\"],\"keywords\":[],\"one_liner\":\"x\",\"score\":7} Thanks.";
        let value = extract_json(raw).unwrap();
        assert_eq!(value["summary_points"], json!(["a"]));
        assert_eq!(value["score"], json!(7));
    }

    #[test]
    fn test_extract_json_from_fences() {
        let raw = "```json\n{\"one_liner\": \"x\"}\n```";
        assert_eq!(extract_json(raw).unwrap(), json!({"one_liner": "x"}));
    }

    #[test]
    fn test_extract_json_failure() {
        assert!(matches!(extract_json("no json here"), Err(Error::Summarization(_))));
        assert!(matches!(extract_json("} backwards {"), Err(Error::Summarization(_))));
        assert!(matches!(extract_json("{\"a\": [1, 2}"), Err(Error::Summarization(_))));
    }
}
