//! Prompt builders for the voice interpreter and the food scanner.

use chrono::NaiveDate;
use serde::Serialize;

use crate::expiry::ExpiryTable;
use crate::inventory::Item;

/// Inventory projection embedded in the voice prompt.
#[derive(Debug, Serialize)]
struct InventoryContext<'a> {
  id: &'a str,
  name: &'a str,
  category: Option<&'a str>,
  storage_method: &'a str,
  quantity: i64,
}

impl<'a> From<&'a Item> for InventoryContext<'a> {
  fn from(item: &'a Item) -> Self {
    Self {
      id: &item.id,
      name: &item.name,
      category: item.category.as_deref(),
      storage_method: item.storage_method.as_str(),
      quantity: item.quantity,
    }
  }
}

/// Prompt for turning a natural-language utterance into structured
/// commands against the current inventory.
pub fn voice_command_prompt(today: NaiveDate, inventory: &[Item], utterance: &str) -> String {
  let context: Vec<InventoryContext<'_>> = inventory.iter().map(InventoryContext::from).collect();
  let inventory_json =
    serde_json::to_string_pretty(&context).unwrap_or_else(|_| "[]".to_string());

  format!(
    r#"당신은 '스마트 팬트리' 앱의 음성 명령 해석기입니다.
사용자의 자연어 명령을 분석하여 재고를 추가(ADD), 수정(UPDATE), 또는 상태변경(CONSUME/DISCARD) 하는 정형화된 JSON 데이터를 생성하세요.

# Input Data Context
1. **Current Date:** {today} (오늘 날짜)
2. **Current Inventory:** 사용자가 현재 보유 중인 아이템 리스트 (JSON 배열). 수정/삭제 시 이 리스트에서 가장 유사한 항목의 'id'를 찾아야 합니다.

# Current Inventory:
{inventory_json}

# Action Types (Intent)
1. **ADD:** 새로운 물건을 구매하거나 얻었을 때. 유통기한이 명시되지 않았다면 카테고리별 일반적인 소비기한을 추정하여 설정하세요.
2. **CONSUME:** 물건을 먹거나 사용했을 때. '전부' 먹었다고 하면 consume_all: true, 특정 수량을 언급하면 consumed_quantity로 차감합니다.
3. **DISCARD:** 물건이 상하거나 유통기한이 지나 버렸을 때.
4. **UPDATE:** 보관 장소를 옮기거나 남은 수량을 직접 지정할 때.

# Processing Rules
1. **Fuzzy Matching:** "우유 버렸어"라면 Inventory에서 가장 적절한 항목을 찾아 그 'id'를 반환하세요.
2. **Multi-intent:** 한 문장에 여러 명령이 섞여 있을 수 있습니다.
3. **Missing Info:** 수량이 없으면 1로, 보관장소가 없으면 품목에 맞는 장소(fridge/freezer/pantry)를 배정하세요.
4. **Not Found:** 대상 품목을 찾지 못하면 target_id를 null로, target_name에 검색한 품목명을 명시하세요.
5. **수량 처리 구분:** 'CONSUME'은 소비한 개수, 'UPDATE'는 남은 개수입니다.

# Output JSON Schema
응답은 오직 JSON 배열이어야 합니다. 다른 텍스트 없이 JSON만 출력하세요.

[
  {{"action": "ADD", "item": {{"name": "string", "category": "string", "quantity": 1, "storage_method": "fridge" | "freezer" | "pantry", "expiry_date": "YYYY-MM-DD"}}}},
  {{"action": "CONSUME", "target_id": "string 또는 null", "target_name": "string", "updates": {{"consumed_quantity": 1, "consume_all": false}}}},
  {{"action": "UPDATE", "target_id": "string 또는 null", "target_name": "string", "updates": {{"storage_method": "fridge", "quantity": 2}}}},
  {{"action": "DISCARD", "target_id": "string 또는 null", "target_name": "string", "updates": {{"status": "discarded"}}}}
]

# User Command:
{utterance}"#
  )
}

/// Prompt for extracting items from a receipt or product photo.
pub fn food_scanner_prompt(today: NaiveDate, table: &ExpiryTable) -> String {
  let category_list: Vec<&str> = table.categories().collect();
  let category_list = category_list.join(", ");

  format!(
    r#"# Role Definition
You are the "Smart Pantry AI," combining an expert nutritionist, a food safety inspector, and a precise data entry clerk.

# Objective
Analyze the provided image (a purchase receipt OR a physical product photo) and extract structured data for a household inventory application. Handle BOTH types of images.

# Critical Context & Logic Rules
1. **Current Date:** Assume the current date is **{today}**.
2. **Language:** Extract product names in Korean; translate English names to natural Korean.
3. Do NOT reject images for not matching one type; extract food items from whatever is shown.

# Data Extraction Logic
- `name`: simplified, without quantities, prices or marketing fluff.
- `category`: one of [{category_list}].
- `storage_method`: optimal location for the food type (fridge/freezer/pantry).
- `quantity`: from the receipt or product; default 1.
- `expiry_date`: prefer a visible date (유통기한/소비기한/EXP/Best Before, converted to YYYY-MM-DD, is_estimated false); else a manufacturing date plus typical shelf life (is_estimated true); else estimate from the current date by product type (is_estimated true). Always include expiry_date.
- `confidence_reason`: short explanation of how the date was derived.
- Exclude non-food lines (bags, discounts, promotions). Be conservative when uncertain.

# JSON Output Schema
Return ONLY a JSON object with this structure, no markdown code blocks:

{{
  "items": [
    {{
      "name": "string",
      "category": "string",
      "storage_method": "fridge" | "freezer" | "pantry",
      "quantity": 1,
      "expiry_date": "YYYY-MM-DD",
      "is_estimated": false,
      "confidence_reason": "string"
    }}
  ]
}}

Now analyze the image and return the JSON response."#
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_voice_prompt_embeds_date_inventory_and_utterance() {
    let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let prompt = voice_command_prompt(today, &[], "우유 한 팩 샀어");

    assert!(prompt.contains("2024-01-01"));
    assert!(prompt.contains("# Current Inventory:\n[]"));
    assert!(prompt.contains("우유 한 팩 샀어"));
  }

  #[test]
  fn test_scanner_prompt_lists_known_categories() {
    let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let prompt = food_scanner_prompt(today, &ExpiryTable::default());

    assert!(prompt.contains("유제품"));
    assert!(prompt.contains("기타"));
    assert!(prompt.contains("2024-01-01"));
  }
}
