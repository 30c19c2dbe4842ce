//! Typed model output: voice commands and scan results.

use chrono::NaiveDate;
use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};

use crate::inventory::StorageMethod;

use super::client::{extract_json, JsonShape};

/// Intent kinds the voice interpreter can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
  #[serde(rename = "ADD")]
  Add,
  #[serde(rename = "CONSUME")]
  Consume,
  #[serde(rename = "UPDATE")]
  Update,
  #[serde(rename = "DISCARD")]
  Discard,
}

impl ActionType {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Add => "ADD",
      Self::Consume => "CONSUME",
      Self::Update => "UPDATE",
      Self::Discard => "DISCARD",
    }
  }
}

/// Item payload of an ADD command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandItem {
  pub name: String,
  #[serde(default)]
  pub category: Option<String>,
  #[serde(default)]
  pub quantity: Option<i64>,
  #[serde(default)]
  pub storage_method: Option<StorageMethod>,
  #[serde(default)]
  pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsumeUpdates {
  #[serde(default)]
  pub consumed_quantity: Option<i64>,
  #[serde(default)]
  pub consume_all: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateFields {
  #[serde(default)]
  pub storage_method: Option<StorageMethod>,
  #[serde(default)]
  pub quantity: Option<i64>,
}

/// One parsed voice command, tagged by action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum VoiceCommand {
  #[serde(rename = "ADD")]
  Add { item: CommandItem },
  #[serde(rename = "CONSUME")]
  Consume {
    #[serde(default)]
    target_id: Option<String>,
    #[serde(default)]
    target_name: Option<String>,
    #[serde(default)]
    updates: ConsumeUpdates,
  },
  #[serde(rename = "UPDATE")]
  Update {
    #[serde(default)]
    target_id: Option<String>,
    #[serde(default)]
    target_name: Option<String>,
    #[serde(default)]
    updates: UpdateFields,
  },
  #[serde(rename = "DISCARD")]
  Discard {
    #[serde(default)]
    target_id: Option<String>,
    #[serde(default)]
    target_name: Option<String>,
  },
}

impl VoiceCommand {
  pub fn action(&self) -> ActionType {
    match self {
      Self::Add { .. } => ActionType::Add,
      Self::Consume { .. } => ActionType::Consume,
      Self::Update { .. } => ActionType::Update,
      Self::Discard { .. } => ActionType::Discard,
    }
  }

  /// Best-known item name, for result reporting.
  pub fn item_name(&self) -> Option<&str> {
    match self {
      Self::Add { item } => Some(item.name.as_str()),
      Self::Consume { target_name, .. }
      | Self::Update { target_name, .. }
      | Self::Discard { target_name, .. } => target_name.as_deref(),
    }
  }
}

/// Outcome of applying one command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandResult {
  pub action: ActionType,
  pub success: bool,
  pub item_name: Option<String>,
  pub error: Option<String>,
}

impl CommandResult {
  pub fn ok(action: ActionType, item_name: Option<String>) -> Self {
    Self {
      action,
      success: true,
      item_name,
      error: None,
    }
  }

  pub fn failed(action: ActionType, item_name: Option<String>, error: impl Into<String>) -> Self {
    Self {
      action,
      success: false,
      item_name,
      error: Some(error.into()),
    }
  }
}

/// One item recognized in a receipt or product photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannedItem {
  pub name: String,
  #[serde(default)]
  pub category: Option<String>,
  #[serde(default)]
  pub storage_method: Option<StorageMethod>,
  #[serde(default)]
  pub quantity: Option<i64>,
  #[serde(default)]
  pub expiry_date: Option<NaiveDate>,
  #[serde(default)]
  pub is_estimated: bool,
  #[serde(default)]
  pub confidence_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
  #[serde(default)]
  pub items: Vec<ScannedItem>,
}

/// Parse the voice interpreter's response text into commands.
pub fn parse_voice_commands(text: &str) -> Result<Vec<VoiceCommand>> {
  let payload = extract_json(text, JsonShape::Array);
  serde_json::from_str(payload)
    .map_err(|e| eyre!("Could not understand the command from model response: {}", e))
}

/// Parse the scanner's response text into a scan result.
pub fn parse_scan_result(text: &str) -> Result<ScanResult> {
  let payload = extract_json(text, JsonShape::Object);
  serde_json::from_str(payload)
    .map_err(|e| eyre!("Could not parse item data from model response: {}", e))
}
