//! Inventory service: estimation, storage moves and command application.

use chrono::{Duration, NaiveDate};
use color_eyre::{eyre::eyre, Result};
use tracing::info;

use crate::ai::{CommandResult, ScanResult, VoiceCommand};
use crate::expiry::{
  default_shelf_life_days, rescale_expiry_on_storage_change, ExpiryTable, TransitionTable,
  FALLBACK_CATEGORY,
};
use crate::inventory::{Item, ItemPatch, ItemStatus, ItemStore, NewItem, StorageMethod};

/// Input for adding one item. A missing expiry date is estimated from the
/// shelf-life table and flagged as such.
#[derive(Debug, Clone)]
pub struct ItemDraft {
  pub name: String,
  pub category: Option<String>,
  pub storage_method: StorageMethod,
  pub quantity: i64,
  pub expiry_date: Option<NaiveDate>,
  pub is_estimated: bool,
  pub image_url: Option<String>,
  pub memo: Option<String>,
}

/// Domain operations over the inventory store, wired to the expiry engine.
pub struct ItemService {
  store: ItemStore,
  expiry_table: ExpiryTable,
  transitions: TransitionTable,
}

impl ItemService {
  pub fn new(store: ItemStore) -> Self {
    Self::with_tables(store, ExpiryTable::default(), TransitionTable::default())
  }

  pub fn with_tables(
    store: ItemStore,
    expiry_table: ExpiryTable,
    transitions: TransitionTable,
  ) -> Self {
    Self {
      store,
      expiry_table,
      transitions,
    }
  }

  pub fn list(&self, status: Option<ItemStatus>) -> Result<Vec<Item>> {
    self.store.list(status)
  }

  pub fn active_items(&self) -> Result<Vec<Item>> {
    self.store.list(Some(ItemStatus::Active))
  }

  /// Insert a new item, estimating the expiry date when none was given.
  pub fn add(&self, draft: ItemDraft, today: NaiveDate) -> Result<Item> {
    let (expiry_date, is_estimated) = match draft.expiry_date {
      Some(date) => (date, draft.is_estimated),
      None => {
        let category = draft.category.as_deref().unwrap_or(FALLBACK_CATEGORY);
        let days = default_shelf_life_days(&self.expiry_table, category, draft.storage_method);
        (today + Duration::days(i64::from(days)), true)
      }
    };

    let new = NewItem {
      name: draft.name,
      category: draft.category,
      storage_method: draft.storage_method,
      purchase_date: today,
      expiry_date,
      is_estimated,
      quantity: draft.quantity.max(1),
      image_url: draft.image_url,
      memo: draft.memo,
    };

    let item = self.store.insert(&new)?;
    info!(name = %item.name, expiry = %item.expiry_date, estimated = item.is_estimated, "item added");
    Ok(item)
  }

  /// Consume an item, entirely or by quantity. Quantity reaching zero
  /// marks the item consumed.
  pub fn consume(
    &self,
    id: &str,
    consumed_quantity: Option<i64>,
    consume_all: bool,
  ) -> Result<Item> {
    let item = self.require(id)?;

    let patch = if consume_all {
      ItemPatch {
        quantity: Some(0),
        status: Some(ItemStatus::Consumed),
        ..Default::default()
      }
    } else if let Some(consumed) = consumed_quantity {
      let remaining = item.quantity - consumed;
      ItemPatch {
        quantity: Some(remaining),
        status: (remaining <= 0).then_some(ItemStatus::Consumed),
        ..Default::default()
      }
    } else {
      return Err(eyre!("수행할 업데이트 작업이 없습니다."));
    };

    self.store.update(id, &patch)
  }

  pub fn discard(&self, id: &str) -> Result<Item> {
    self.store.update(
      id,
      &ItemPatch {
        status: Some(ItemStatus::Discarded),
        ..Default::default()
      },
    )
  }

  /// Move an item to another storage method, rescaling its expiry date
  /// through the transition table.
  pub fn relocate(&self, id: &str, to: StorageMethod, today: NaiveDate) -> Result<Item> {
    let item = self.require(id)?;
    let new_expiry = rescale_expiry_on_storage_change(
      &self.transitions,
      item.expiry_date,
      item.storage_method,
      to,
      today,
    );

    self.store.update(
      id,
      &ItemPatch {
        storage_method: Some(to),
        expiry_date: Some(new_expiry),
        ..Default::default()
      },
    )
  }

  pub fn set_quantity(&self, id: &str, quantity: i64) -> Result<Item> {
    self.store.update(
      id,
      &ItemPatch {
        quantity: Some(quantity),
        ..Default::default()
      },
    )
  }

  /// Insert every scanned item, estimating missing expiry dates.
  pub fn import_scanned(&self, scan: ScanResult, today: NaiveDate) -> Result<Vec<Item>> {
    let mut added = Vec::with_capacity(scan.items.len());

    for scanned in scan.items {
      let draft = ItemDraft {
        name: scanned.name,
        category: scanned
          .category
          .or_else(|| Some(FALLBACK_CATEGORY.to_string())),
        storage_method: scanned.storage_method.unwrap_or(StorageMethod::Fridge),
        quantity: scanned.quantity.unwrap_or(1),
        expiry_date: scanned.expiry_date,
        is_estimated: false,
        image_url: None,
        memo: None,
      };
      added.push(self.add(draft, today)?);
    }

    Ok(added)
  }

  /// Apply a parsed command batch in order. Individual failures produce a
  /// failed result without aborting the rest of the batch.
  pub fn apply_commands(&self, commands: &[VoiceCommand], today: NaiveDate) -> Vec<CommandResult> {
    commands
      .iter()
      .map(|command| self.apply_command(command, today))
      .collect()
  }

  fn apply_command(&self, command: &VoiceCommand, today: NaiveDate) -> CommandResult {
    let action = command.action();

    match command {
      VoiceCommand::Add { item } => {
        let draft = ItemDraft {
          name: item.name.clone(),
          category: item.category.clone(),
          storage_method: item.storage_method.unwrap_or(StorageMethod::Fridge),
          quantity: item.quantity.unwrap_or(1),
          expiry_date: item.expiry_date,
          // Voice dates are model-inferred, never observed.
          is_estimated: true,
          image_url: None,
          memo: None,
        };
        match self.add(draft, today) {
          Ok(added) => CommandResult::ok(action, Some(added.name)),
          Err(err) => CommandResult::failed(action, Some(item.name.clone()), err.to_string()),
        }
      }
      VoiceCommand::Consume {
        target_id,
        target_name,
        updates,
      } => match target_id {
        Some(id) => self.report(
          action,
          target_name,
          self.consume(id, updates.consumed_quantity, updates.consume_all.unwrap_or(false)),
        ),
        None => Self::not_found(action, target_name),
      },
      VoiceCommand::Update {
        target_id,
        target_name,
        updates,
      } => {
        let Some(id) = target_id else {
          return Self::not_found(action, target_name);
        };

        let outcome = (|| {
          let mut item = None;
          if let Some(method) = updates.storage_method {
            item = Some(self.relocate(id, method, today)?);
          }
          if let Some(quantity) = updates.quantity {
            item = Some(self.set_quantity(id, quantity)?);
          }
          item.ok_or_else(|| eyre!("수행할 업데이트 작업이 없습니다."))
        })();
        self.report(action, target_name, outcome)
      }
      VoiceCommand::Discard {
        target_id,
        target_name,
      } => match target_id {
        Some(id) => self.report(action, target_name, self.discard(id)),
        None => Self::not_found(action, target_name),
      },
    }
  }

  fn report(
    &self,
    action: crate::ai::ActionType,
    target_name: &Option<String>,
    outcome: Result<Item>,
  ) -> CommandResult {
    match outcome {
      Ok(item) => CommandResult::ok(action, Some(item.name)),
      Err(err) => CommandResult::failed(action, target_name.clone(), err.to_string()),
    }
  }

  fn not_found(action: crate::ai::ActionType, target_name: &Option<String>) -> CommandResult {
    CommandResult::failed(action, target_name.clone(), "해당 품목을 찾을 수 없습니다.")
  }

  /// Look an item up by exact id, else by case-insensitive name
  /// containment over active items.
  pub fn resolve(&self, id_or_name: &str) -> Result<Item> {
    if let Some(item) = self.store.get(id_or_name)? {
      return Ok(item);
    }

    let needle = id_or_name.to_lowercase();
    let mut matches: Vec<Item> = self
      .active_items()?
      .into_iter()
      .filter(|item| item.name.to_lowercase().contains(&needle))
      .collect();

    match matches.len() {
      0 => Err(eyre!("No item matching '{}'", id_or_name)),
      1 => Ok(matches.remove(0)),
      _ => {
        let names: Vec<String> = matches.iter().map(|i| i.name.clone()).collect();
        Err(eyre!(
          "'{}' is ambiguous, matches: {}",
          id_or_name,
          names.join(", ")
        ))
      }
    }
  }

  fn require(&self, id: &str) -> Result<Item> {
    self
      .store
      .get(id)?
      .ok_or_else(|| eyre!("Item {} not found", id))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ai::{CommandItem, ConsumeUpdates, ScannedItem, UpdateFields};

  fn service() -> ItemService {
    ItemService::new(ItemStore::open_in_memory().expect("in-memory store"))
  }

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn draft(name: &str, category: Option<&str>, method: StorageMethod) -> ItemDraft {
    ItemDraft {
      name: name.to_string(),
      category: category.map(String::from),
      storage_method: method,
      quantity: 1,
      expiry_date: None,
      is_estimated: false,
      image_url: None,
      memo: None,
    }
  }

  #[test]
  fn test_add_estimates_missing_expiry_from_table() {
    let svc = service();
    let today = date(2024, 1, 1);

    let item = svc
      .add(draft("우유", Some("유제품"), StorageMethod::Fridge), today)
      .unwrap();

    assert_eq!(item.expiry_date, date(2024, 1, 8));
    assert!(item.is_estimated);
    assert_eq!(item.purchase_date, today);
  }

  #[test]
  fn test_add_without_category_estimates_from_fallback_row() {
    let svc = service();
    let item = svc
      .add(draft("간장게장", None, StorageMethod::Pantry), date(2024, 1, 1))
      .unwrap();

    // 기타 row's pantry value is 14 days.
    assert_eq!(item.expiry_date, date(2024, 1, 15));
    assert!(item.is_estimated);
  }

  #[test]
  fn test_add_with_observed_expiry_is_not_estimated() {
    let svc = service();
    let mut d = draft("우유", Some("유제품"), StorageMethod::Fridge);
    d.expiry_date = Some(date(2024, 2, 1));

    let item = svc.add(d, date(2024, 1, 1)).unwrap();
    assert_eq!(item.expiry_date, date(2024, 2, 1));
    assert!(!item.is_estimated);
  }

  #[test]
  fn test_consume_decrements_and_flips_status_at_zero() {
    let svc = service();
    let mut d = draft("달걀", Some("달걀"), StorageMethod::Fridge);
    d.quantity = 3;
    let item = svc.add(d, date(2024, 1, 1)).unwrap();

    let partial = svc.consume(&item.id, Some(2), false).unwrap();
    assert_eq!(partial.quantity, 1);
    assert_eq!(partial.status, ItemStatus::Active);

    let done = svc.consume(&item.id, Some(1), false).unwrap();
    assert_eq!(done.quantity, 0);
    assert_eq!(done.status, ItemStatus::Consumed);
  }

  #[test]
  fn test_consume_all_zeroes_quantity() {
    let svc = service();
    let mut d = draft("콜라", Some("음료"), StorageMethod::Fridge);
    d.quantity = 6;
    let item = svc.add(d, date(2024, 1, 1)).unwrap();

    let consumed = svc.consume(&item.id, None, true).unwrap();
    assert_eq!(consumed.quantity, 0);
    assert_eq!(consumed.status, ItemStatus::Consumed);
  }

  #[test]
  fn test_consume_without_amount_errors() {
    let svc = service();
    let item = svc
      .add(draft("우유", Some("유제품"), StorageMethod::Fridge), date(2024, 1, 1))
      .unwrap();

    assert!(svc.consume(&item.id, None, false).is_err());
  }

  #[test]
  fn test_relocate_rescales_expiry_through_engine() {
    let svc = service();
    let today = date(2024, 1, 1);
    let mut d = draft("삼겹살", Some("육류"), StorageMethod::Fridge);
    d.expiry_date = Some(date(2024, 1, 11));
    let item = svc.add(d, today).unwrap();

    let moved = svc.relocate(&item.id, StorageMethod::Freezer, today).unwrap();

    assert_eq!(moved.storage_method, StorageMethod::Freezer);
    // 10 remaining days * 3 = 30 days from today.
    assert_eq!(moved.expiry_date, date(2024, 1, 31));
  }

  #[test]
  fn test_relocate_to_same_method_keeps_date() {
    let svc = service();
    let today = date(2024, 1, 1);
    let mut d = draft("삼겹살", Some("육류"), StorageMethod::Fridge);
    d.expiry_date = Some(date(2024, 1, 11));
    let item = svc.add(d, today).unwrap();

    let moved = svc.relocate(&item.id, StorageMethod::Fridge, today).unwrap();
    assert_eq!(moved.expiry_date, date(2024, 1, 11));
  }

  #[test]
  fn test_import_scanned_estimates_missing_dates() {
    let svc = service();
    let scan = ScanResult {
      items: vec![
        ScannedItem {
          name: "우유 (서울)".to_string(),
          category: Some("유제품".to_string()),
          storage_method: Some(StorageMethod::Fridge),
          quantity: Some(1),
          expiry_date: Some(date(2024, 2, 5)),
          is_estimated: false,
          confidence_reason: Some("OCR found expiry date".to_string()),
        },
        ScannedItem {
          name: "양파".to_string(),
          category: None,
          storage_method: None,
          quantity: None,
          expiry_date: None,
          is_estimated: false,
          confidence_reason: None,
        },
      ],
    };

    let added = svc.import_scanned(scan, date(2024, 1, 1)).unwrap();
    assert_eq!(added.len(), 2);

    assert_eq!(added[0].expiry_date, date(2024, 2, 5));
    assert!(!added[0].is_estimated);

    // Defaults: 기타 category, fridge storage, 7-day estimate.
    assert_eq!(added[1].category.as_deref(), Some("기타"));
    assert_eq!(added[1].storage_method, StorageMethod::Fridge);
    assert_eq!(added[1].expiry_date, date(2024, 1, 8));
    assert!(added[1].is_estimated);
  }

  #[test]
  fn test_apply_commands_continues_after_failures() {
    let svc = service();
    let today = date(2024, 1, 1);

    let commands = vec![
      VoiceCommand::Consume {
        target_id: None,
        target_name: Some("우유".to_string()),
        updates: ConsumeUpdates::default(),
      },
      VoiceCommand::Add {
        item: CommandItem {
          name: "귤".to_string(),
          category: Some("과일".to_string()),
          quantity: Some(10),
          storage_method: Some(StorageMethod::Pantry),
          expiry_date: None,
        },
      },
    ];

    let results = svc.apply_commands(&commands, today);
    assert_eq!(results.len(), 2);

    assert!(!results[0].success);
    assert_eq!(
      results[0].error.as_deref(),
      Some("해당 품목을 찾을 수 없습니다.")
    );

    assert!(results[1].success);
    assert_eq!(results[1].item_name.as_deref(), Some("귤"));
    assert_eq!(svc.active_items().unwrap().len(), 1);
  }

  #[test]
  fn test_apply_update_command_relocates_and_sets_quantity() {
    let svc = service();
    let today = date(2024, 1, 1);
    let mut d = draft("만두", Some("간편식/냉동식품"), StorageMethod::Fridge);
    d.expiry_date = Some(date(2024, 1, 11));
    let item = svc.add(d, today).unwrap();

    let commands = vec![VoiceCommand::Update {
      target_id: Some(item.id.clone()),
      target_name: None,
      updates: UpdateFields {
        storage_method: Some(StorageMethod::Freezer),
        quantity: Some(4),
      },
    }];

    let results = svc.apply_commands(&commands, today);
    assert!(results[0].success);

    let updated = svc.resolve(&item.id).unwrap();
    assert_eq!(updated.storage_method, StorageMethod::Freezer);
    assert_eq!(updated.quantity, 4);
    assert_eq!(updated.expiry_date, date(2024, 1, 31));
  }

  #[test]
  fn test_apply_discard_command() {
    let svc = service();
    let today = date(2024, 1, 1);
    let item = svc
      .add(draft("상한 우유", Some("유제품"), StorageMethod::Fridge), today)
      .unwrap();

    let commands = vec![VoiceCommand::Discard {
      target_id: Some(item.id.clone()),
      target_name: Some("우유".to_string()),
    }];

    let results = svc.apply_commands(&commands, today);
    assert!(results[0].success);
    assert!(svc.active_items().unwrap().is_empty());
  }

  #[test]
  fn test_resolve_by_id_and_name_fragment() {
    let svc = service();
    let today = date(2024, 1, 1);
    let item = svc
      .add(draft("서울우유", Some("유제품"), StorageMethod::Fridge), today)
      .unwrap();

    assert_eq!(svc.resolve(&item.id).unwrap().id, item.id);
    assert_eq!(svc.resolve("우유").unwrap().id, item.id);
    assert!(svc.resolve("치즈").is_err());
  }

  #[test]
  fn test_resolve_ambiguous_name_errors() {
    let svc = service();
    let today = date(2024, 1, 1);
    svc
      .add(draft("서울우유", Some("유제품"), StorageMethod::Fridge), today)
      .unwrap();
    svc
      .add(draft("저지방 우유", Some("유제품"), StorageMethod::Fridge), today)
      .unwrap();

    assert!(svc.resolve("우유").is_err());
  }
}
