//! Generative model client.
//!
//! Thin wrapper over the generative-language REST API: send prompt parts,
//! get back free-form text expected to contain a JSON payload.

use color_eyre::{eyre::eyre, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

const GENERATE_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct ModelClient {
  http: reqwest::Client,
  api_key: String,
  model: String,
}

impl ModelClient {
  pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
    let http = reqwest::Client::builder()
      .user_agent(concat!("ecofridge/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

    Ok(Self {
      http,
      api_key: api_key.into(),
      model: model.into(),
    })
  }

  /// Text-only completion.
  pub async fn generate_text(&self, prompt: &str) -> Result<String> {
    self.generate(vec![Part::text(prompt)]).await
  }

  /// Completion over a prompt plus one inline image.
  pub async fn generate_with_image(
    &self,
    prompt: &str,
    mime_type: &str,
    base64_data: &str,
  ) -> Result<String> {
    self
      .generate(vec![
        Part::text(prompt),
        Part::inline_data(mime_type, base64_data),
      ])
      .await
  }

  async fn generate(&self, parts: Vec<Part>) -> Result<String> {
    let url = format!(
      "{}/{}:generateContent?key={}",
      GENERATE_ENDPOINT, self.model, self.api_key
    );
    let body = GenerateRequest {
      contents: vec![Content { parts }],
    };

    let response = self
      .http
      .post(&url)
      .json(&body)
      .send()
      .await
      .map_err(|e| eyre!("Model request failed: {}", e))?;

    let status = response.status();
    if !status.is_success() {
      let detail = response.text().await.unwrap_or_default();
      return Err(eyre!("Model API returned {}: {}", status, detail));
    }

    let payload: GenerateResponse = response
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse model response: {}", e))?;

    let text: String = payload
      .candidates
      .into_iter()
      .next()
      .map(|c| c.content.parts.into_iter().filter_map(|p| p.text).collect())
      .unwrap_or_default();

    if text.is_empty() {
      return Err(eyre!("Model response contained no text"));
    }
    Ok(text)
  }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
  contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
  parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
  #[serde(skip_serializing_if = "Option::is_none")]
  text: Option<String>,
  #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
  inline_data: Option<InlineData>,
}

impl Part {
  fn text(text: &str) -> Self {
    Self {
      text: Some(text.to_string()),
      inline_data: None,
    }
  }

  fn inline_data(mime_type: &str, data: &str) -> Self {
    Self {
      text: None,
      inline_data: Some(InlineData {
        mime_type: mime_type.to_string(),
        data: data.to_string(),
      }),
    }
  }
}

#[derive(Debug, Serialize)]
struct InlineData {
  #[serde(rename = "mimeType")]
  mime_type: String,
  data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
  content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
  #[serde(default)]
  parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
  #[serde(default)]
  text: Option<String>,
}

/// Which top-level JSON value the caller expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
  Array,
  Object,
}

/// Pull the JSON payload out of free-form model text.
///
/// A fenced ```json block wins; otherwise the outermost bracketed value of
/// the expected shape; otherwise the trimmed text is returned for the
/// parser to reject with context.
pub fn extract_json(text: &str, shape: JsonShape) -> &str {
  if let Ok(fence) = Regex::new(r"(?s)```json\s*(.*?)\s*```") {
    if let Some(caps) = fence.captures(text) {
      if let Some(payload) = caps.get(1) {
        return payload.as_str();
      }
    }
  }

  let (open, close) = match shape {
    JsonShape::Array => ('[', ']'),
    JsonShape::Object => ('{', '}'),
  };
  if let (Some(start), Some(end)) = (text.find(open), text.rfind(close)) {
    if start < end {
      return &text[start..=end];
    }
  }

  text.trim()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_fenced_block_wins() {
    let text = "noise [1] ```json\n[2, 3]\n``` trailing";
    assert_eq!(extract_json(text, JsonShape::Array), "[2, 3]");
  }

  #[test]
  fn test_outermost_array_extracted() {
    let text = "Sure! [{\"a\": [1]}] done";
    assert_eq!(extract_json(text, JsonShape::Array), "[{\"a\": [1]}]");
  }

  #[test]
  fn test_object_shape_skips_inner_arrays() {
    let text = "{\"items\": [1, 2]}";
    assert_eq!(extract_json(text, JsonShape::Object), "{\"items\": [1, 2]}");
  }

  #[test]
  fn test_plain_text_passes_through_trimmed() {
    assert_eq!(extract_json("  no json here  ", JsonShape::Array), "no json here");
  }
}
