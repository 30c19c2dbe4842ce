//! AI intent layer: prompts, model client and typed command output.

mod client;
mod command;
mod prompts;

pub use client::{extract_json, JsonShape, ModelClient};
pub use command::{
  parse_scan_result, parse_voice_commands, ActionType, CommandItem, CommandResult,
  ConsumeUpdates, ScanResult, ScannedItem, UpdateFields, VoiceCommand,
};
pub use prompts::{food_scanner_prompt, voice_command_prompt};

use base64::Engine;
use chrono::NaiveDate;
use color_eyre::Result;

use crate::expiry::ExpiryTable;
use crate::inventory::Item;

/// Interpret an utterance against the current inventory.
pub async fn interpret_voice_command(
  client: &ModelClient,
  today: NaiveDate,
  inventory: &[Item],
  utterance: &str,
) -> Result<Vec<VoiceCommand>> {
  let prompt = voice_command_prompt(today, inventory, utterance);
  let response = client.generate_text(&prompt).await?;
  parse_voice_commands(&response)
}

/// Extract items from a receipt or product photo.
pub async fn scan_image(
  client: &ModelClient,
  today: NaiveDate,
  table: &ExpiryTable,
  image: &[u8],
  mime_type: &str,
) -> Result<ScanResult> {
  let prompt = food_scanner_prompt(today, table);
  let encoded = base64::engine::general_purpose::STANDARD.encode(image);
  let response = client
    .generate_with_image(&prompt, mime_type, &encoded)
    .await?;
  parse_scan_result(&response)
}
