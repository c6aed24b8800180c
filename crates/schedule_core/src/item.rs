use log::warn;
use serde_json::{Map, Value};

pub const DATA_TYPE_FIELD: &str = "DataType";

// Record kind extracted from the DataType tag of a decoded item string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Cash,
    Weed,
    Cocaine,
    Meth,
    Item,
    Clothing,
    Unknown,
}

impl ItemKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "CashData" => ItemKind::Cash,
            "WeedData" => ItemKind::Weed,
            "CocaineData" => ItemKind::Cocaine,
            "MethData" => ItemKind::Meth,
            "ItemData" => ItemKind::Item,
            "ClothingData" => ItemKind::Clothing,
            _ => ItemKind::Unknown,
        }
    }
}

/// One inventory/object entry, stored in the save as a JSON object encoded
/// into a string inside a TreeFile array. The full decoded field map is kept
/// as-is; typed accessors are views over it, so keys no known kind models
/// survive a decode/encode cycle untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRecord {
    kind: ItemKind,
    fields: Map<String, Value>,
}

impl ItemRecord {
    pub fn decode(encoded: &str) -> Result<Self, serde_json::Error> {
        let fields: Map<String, Value> = serde_json::from_str(encoded)?;
        let kind = fields
            .get(DATA_TYPE_FIELD)
            .and_then(Value::as_str)
            .map(ItemKind::from_tag)
            .unwrap_or(ItemKind::Unknown);
        Ok(Self { kind, fields })
    }

    pub fn encode(&self) -> String {
        serde_json::to_string(&self.fields).expect("field map serializes")
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn data_type(&self) -> Option<&str> {
        self.fields.get(DATA_TYPE_FIELD).and_then(Value::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.fields.insert(key.to_string(), value);
    }

    pub fn quantity(&self) -> Option<i64> {
        self.fields.get("Quantity").and_then(Value::as_i64)
    }

    pub fn set_quantity(&mut self, quantity: i64) {
        self.set("Quantity", Value::from(quantity));
    }

    pub fn quality(&self) -> Option<&str> {
        self.fields.get("Quality").and_then(Value::as_str)
    }

    pub fn set_quality(&mut self, quality: &str) {
        self.set("Quality", Value::from(quality));
    }

    pub fn packaging_id(&self) -> Option<&str> {
        self.fields.get("PackagingID").and_then(Value::as_str)
    }

    pub fn set_packaging_id(&mut self, packaging: &str) {
        self.set("PackagingID", Value::from(packaging));
    }

    pub fn cash_balance(&self) -> Option<i64> {
        let value = self.fields.get("CashBalance")?;
        value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))
    }

    pub fn set_cash_balance(&mut self, balance: i64) {
        self.set("CashBalance", Value::from(balance));
    }
}

/// Applies `patch` to every decodable string element of an `Items` array,
/// re-encoding only the elements the closure reports as changed. Elements
/// that fail to decode are skipped for this operation but left untouched in
/// the backing array. Returns the number of re-encoded elements.
pub fn patch_items<F>(items: &mut [Value], mut patch: F) -> usize
where
    F: FnMut(&mut ItemRecord) -> bool,
{
    let mut changed = 0;
    for slot in items.iter_mut() {
        let Some(encoded) = slot.as_str() else {
            continue;
        };
        let mut record = match ItemRecord::decode(encoded) {
            Ok(record) => record,
            Err(e) => {
                warn!("skipping undecodable item record: {e}");
                continue;
            }
        };
        if patch(&mut record) {
            *slot = Value::String(record.encode());
            changed += 1;
        }
    }
    changed
}
