use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::Path;

use log::warn;
use rand::Rng;
use rand::distr::Alphanumeric;
use rand::seq::IndexedRandom;
use serde_json::Value;

use crate::backup::{BackupManager, copy_tree};
use crate::item::{self, ItemKind};
use crate::store::{JsonMap, SaveStore};

use super::error::{CoreError, CoreErrorCode};
use super::product_catalog::{MIX_INGREDIENTS, PRODUCT_NAME_POOL, PROPERTY_POOL};
use super::rank_catalog;
use super::types::{
    CreationDate, ItemTarget, ItemUpdate, ProductGeneration, QuestCompletion, SaveInfo, SaveSlot,
};

const GAME_FILE: &str = "Game.json";
const MONEY_FILE: &str = "Money.json";
const RANK_FILE: &str = "Rank.json";
const TIME_FILE: &str = "Time.json";
const METADATA_FILE: &str = "Metadata.json";
const PRODUCTS_FILE: &str = "Products/Products.json";
const CREATED_PRODUCTS_DIR: &str = "Products/CreatedProducts";

const MAX_PLAYERS: usize = 10;

#[derive(Debug, Default, Clone, Copy)]
pub struct Engine;

impl Engine {
    pub fn new() -> Self {
        Self
    }

    /// Opens one save slot and creates the initial backup if this is the
    /// first time the slot is opened.
    pub fn open(&self, root: impl AsRef<Path>) -> Result<Session, CoreError> {
        let root = root.as_ref();
        let store = SaveStore::open(root).map_err(|e| {
            CoreError::new(CoreErrorCode::NoSaveLoaded, format!("cannot open save: {e}"))
        })?;
        let backups = BackupManager::new(root).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Io,
                format!("cannot derive backup location: {e}"),
            )
        })?;
        backups.ensure_initial_backup().map_err(|e| {
            CoreError::new(
                CoreErrorCode::Io,
                format!("failed to create initial backup: {e}"),
            )
        })?;
        Ok(Session { store, backups })
    }

    /// Enumerates `SaveGame_<1-9>` slots under a saves directory with each
    /// slot's organisation name. Locating the saves directory itself is the
    /// caller's job.
    pub fn list_save_slots(&self, saves_dir: impl AsRef<Path>) -> Result<Vec<SaveSlot>, CoreError> {
        let saves_dir = saves_dir.as_ref();
        if !saves_dir.is_dir() {
            return Err(CoreError::new(
                CoreErrorCode::NoSaveLoaded,
                format!("saves directory not found: {}", saves_dir.display()),
            ));
        }
        let entries = fs::read_dir(saves_dir)
            .map_err(|e| CoreError::new(CoreErrorCode::Io, format!("cannot list saves: {e}")))?;
        let mut slots = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|e| CoreError::new(CoreErrorCode::Io, format!("cannot list saves: {e}")))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !is_save_slot_name(&name) || !entry.path().is_dir() {
                continue;
            }
            let organisation_name = slot_organisation_name(&entry.path());
            slots.push(SaveSlot {
                name,
                path: entry.path(),
                organisation_name,
            });
        }
        slots.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(slots)
    }
}

fn is_save_slot_name(name: &str) -> bool {
    name.strip_prefix("SaveGame_")
        .is_some_and(|n| n.len() == 1 && n.chars().all(|c| ('1'..='9').contains(&c)))
}

fn slot_organisation_name(slot: &Path) -> String {
    let fallback = "Unknown Organisation";
    let Ok(text) = fs::read_to_string(slot.join(GAME_FILE)) else {
        return fallback.to_string();
    };
    serde_json::from_str::<Value>(&text)
        .ok()
        .as_ref()
        .and_then(|v| v.get("OrganisationName"))
        .and_then(Value::as_str)
        .unwrap_or(fallback)
        .to_string()
}

/// One open save slot. Owns the store and backup manager for its root; every
/// mutating operation snapshots the paths it touches before writing, and
/// reports what changed.
#[derive(Debug)]
pub struct Session {
    store: SaveStore,
    backups: BackupManager,
}

impl Session {
    pub fn root(&self) -> &Path {
        self.store.root()
    }

    pub fn store(&self) -> &SaveStore {
        &self.store
    }

    fn guard(&self) -> Result<(), CoreError> {
        if self.store.root().is_dir() {
            return Ok(());
        }
        Err(CoreError::new(
            CoreErrorCode::NoSaveLoaded,
            format!(
                "save directory no longer exists: {}",
                self.store.root().display()
            ),
        ))
    }

    fn read(&self, rel: impl AsRef<Path>) -> Result<JsonMap, CoreError> {
        self.store
            .read_json(rel)
            .map_err(|e| CoreError::new(store_error_code(&e), e.to_string()))
    }

    fn write(&self, rel: impl AsRef<Path>, data: &JsonMap) -> Result<(), CoreError> {
        self.store
            .write_json(rel, data)
            .map_err(|e| CoreError::new(CoreErrorCode::Io, e.to_string()))
    }

    fn snapshot(&self, feature: &str, rel_paths: &[&str]) -> Result<String, CoreError> {
        self.backups.snapshot_feature(feature, rel_paths).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Io,
                format!("failed to back up {feature}: {e}"),
            )
        })
    }

    // -----------------------------------------------------------------
    // Info projection
    // -----------------------------------------------------------------

    pub fn info(&self) -> Result<SaveInfo, CoreError> {
        self.guard()?;
        let game = self.read(GAME_FILE)?;
        let money = self.read(MONEY_FILE)?;
        let rank = self.read(RANK_FILE)?;
        let time = self.read(TIME_FILE)?;
        let metadata = self.read(METADATA_FILE)?;

        Ok(SaveInfo {
            game_version: str_field(&game, "GameVersion"),
            organisation_name: str_field(&game, "OrganisationName"),
            creation_date: creation_date(&metadata),
            playtime_seconds: int_field(&time, "Playtime").max(0) as u64,
            online_balance: int_field(&money, "OnlineBalance"),
            networth: int_field(&money, "Networth"),
            lifetime_earnings: int_field(&money, "LifetimeEarnings"),
            weekly_deposit_sum: int_field(&money, "WeeklyDepositSum"),
            current_rank: str_field(&rank, "CurrentRank"),
            rank: int_field(&rank, "Rank"),
            tier: int_field(&rank, "Tier"),
        })
    }

    // -----------------------------------------------------------------
    // Money and organisation
    // -----------------------------------------------------------------

    pub fn set_online_balance(&self, amount: i64) -> Result<(), CoreError> {
        self.set_money_field("OnlineBalance", amount)
    }

    pub fn set_networth(&self, amount: i64) -> Result<(), CoreError> {
        self.set_money_field("Networth", amount)
    }

    pub fn set_lifetime_earnings(&self, amount: i64) -> Result<(), CoreError> {
        self.set_money_field("LifetimeEarnings", amount)
    }

    pub fn set_weekly_deposit_sum(&self, amount: i64) -> Result<(), CoreError> {
        self.set_money_field("WeeklyDepositSum", amount)
    }

    fn set_money_field(&self, key: &str, amount: i64) -> Result<(), CoreError> {
        self.guard()?;
        self.snapshot("Money", &[MONEY_FILE])?;
        let mut money = self.read(MONEY_FILE)?;
        money.insert(key.to_string(), Value::from(amount));
        self.write(MONEY_FILE, &money)
    }

    pub fn set_organisation_name(&self, name: &str) -> Result<(), CoreError> {
        self.guard()?;
        self.snapshot("Game", &[GAME_FILE])?;
        let mut game = self.read(GAME_FILE)?;
        game.insert("OrganisationName".to_string(), Value::from(name));
        self.write(GAME_FILE, &game)
    }

    // -----------------------------------------------------------------
    // Rank
    // -----------------------------------------------------------------

    /// Sets rank and tier together, keeping `CurrentRank` and `TotalXP`
    /// consistent with the chosen tier.
    pub fn set_rank(&self, rank: i64, tier: i64) -> Result<(), CoreError> {
        self.guard()?;
        let name = rank_catalog::rank_name(rank).ok_or_else(|| {
            CoreError::new(
                CoreErrorCode::InvalidOperation,
                format!(
                    "rank {rank} out of range 0-{}",
                    rank_catalog::RANK_NAMES.len() - 1
                ),
            )
        })?;
        let total_xp = rank_catalog::total_xp(rank, tier).ok_or_else(|| {
            CoreError::new(
                CoreErrorCode::InvalidOperation,
                format!("tier {tier} out of range 1-{}", rank_catalog::TIERS_PER_RANK),
            )
        })?;
        self.snapshot("Rank", &[RANK_FILE])?;
        let mut data = self.read(RANK_FILE)?;
        data.insert("Rank".to_string(), Value::from(rank));
        data.insert("Tier".to_string(), Value::from(tier));
        data.insert("CurrentRank".to_string(), Value::from(name));
        data.insert("XP".to_string(), Value::from(0));
        data.insert("TotalXP".to_string(), Value::from(total_xp));
        self.write(RANK_FILE, &data)
    }

    pub fn set_total_xp(&self, xp: i64) -> Result<(), CoreError> {
        self.guard()?;
        self.snapshot("Rank", &[RANK_FILE])?;
        let mut data = self.read(RANK_FILE)?;
        data.insert("TotalXP".to_string(), Value::from(xp));
        self.write(RANK_FILE, &data)
    }

    /// Pushes rank and tier far past the catalog so every rank-gated item
    /// and weed unlocks in game.
    pub fn unlock_all_ranks(&self) -> Result<(), CoreError> {
        self.guard()?;
        self.snapshot("Rank", &[RANK_FILE])?;
        let mut data = self.read(RANK_FILE)?;
        data.insert("Rank".to_string(), Value::from(999));
        data.insert("Tier".to_string(), Value::from(999));
        self.write(RANK_FILE, &data)
    }

    // -----------------------------------------------------------------
    // Cash (item codec over player inventory)
    // -----------------------------------------------------------------

    pub fn set_cash_balance(&self, player: usize, amount: i64) -> Result<(), CoreError> {
        self.guard()?;
        let rel = format!("Players/Player_{player}/Inventory.json");
        if !self.store.exists(&rel) {
            return Err(CoreError::new(
                CoreErrorCode::InvalidOperation,
                format!("no inventory for player {player}"),
            ));
        }
        self.snapshot("Inventory", &["Players"])?;
        let mut inventory = self.read(&rel)?;
        let Some(items) = inventory.get_mut("Items").and_then(Value::as_array_mut) else {
            return Err(CoreError::new(
                CoreErrorCode::InvalidOperation,
                format!("player {player} inventory has no Items array"),
            ));
        };
        let changed = item::patch_items(items, |record| {
            if record.kind() == ItemKind::Cash {
                record.set_cash_balance(amount);
                true
            } else {
                false
            }
        });
        if changed == 0 {
            return Err(CoreError::new(
                CoreErrorCode::InvalidOperation,
                format!("no cash record in player {player} inventory"),
            ));
        }
        self.write(&rel, &inventory)
    }

    // -----------------------------------------------------------------
    // Bulk item updates across property storage
    // -----------------------------------------------------------------

    /// Rewrites item records inside `Properties/<type>/Objects/**/Data.json`.
    /// `property_type` of `None` covers every property. Returns the number
    /// of data files that changed.
    pub fn update_property_items(
        &self,
        property_type: Option<&str>,
        update: &ItemUpdate,
    ) -> Result<usize, CoreError> {
        self.guard()?;
        let types = match property_type {
            Some(t) => {
                if self.store.resolve(format!("Properties/{t}")).is_dir() {
                    vec![t.to_string()]
                } else {
                    Vec::new()
                }
            }
            None => self
                .store
                .list_dirs("Properties")
                .map_err(|e| CoreError::new(CoreErrorCode::Io, e.to_string()))?,
        };
        if types.is_empty() {
            return Ok(0);
        }
        self.snapshot("Properties", &["Properties"])?;

        let mut files_changed = 0;
        for t in &types {
            for rel in self
                .store
                .list_files(format!("Properties/{t}/Objects"), "Data.json", true)
            {
                let mut data = match self.store.read_json(&rel) {
                    Ok(data) => data,
                    Err(e) => {
                        warn!("skipping {}: {e}", rel.display());
                        continue;
                    }
                };
                let Some(items) = data
                    .get_mut("Contents")
                    .and_then(Value::as_object_mut)
                    .and_then(|contents| contents.get_mut("Items"))
                    .and_then(Value::as_array_mut)
                else {
                    continue;
                };
                let changed = item::patch_items(items, |record| {
                    let hit = match update.target {
                        ItemTarget::Both => true,
                        ItemTarget::Weed => record.kind() == ItemKind::Weed,
                        ItemTarget::Item => record.kind() == ItemKind::Item,
                    };
                    if !hit {
                        return false;
                    }
                    record.set_quantity(update.quantity);
                    if record.kind() == ItemKind::Weed {
                        if let Some(quality) = &update.quality {
                            record.set_quality(quality);
                        }
                        if let Some(packaging) = &update.packaging {
                            record.set_packaging_id(packaging);
                        }
                    }
                    true
                });
                if changed > 0 {
                    self.write(&rel, &data)?;
                    files_changed += 1;
                }
            }
        }
        Ok(files_changed)
    }

    // -----------------------------------------------------------------
    // Quests and variables
    // -----------------------------------------------------------------

    /// Marks every quest and objective entry with state 0 (not started) or
    /// 1 (in progress) as 2 (completed). Malformed quest files are skipped.
    pub fn complete_all_quests(&self) -> Result<QuestCompletion, CoreError> {
        self.guard()?;
        let mut completion = QuestCompletion {
            quests: 0,
            objectives: 0,
        };
        if !self.store.resolve("Quests").is_dir() {
            return Ok(completion);
        }
        self.snapshot("Quests", &["Quests"])?;

        for rel in self.store.list_files("Quests", "*.json", true) {
            let mut data = match self.store.read_json(&rel) {
                Ok(data) => data,
                Err(e) => {
                    warn!("skipping {}: {e}", rel.display());
                    continue;
                }
            };
            if data.get("DataType").and_then(Value::as_str) != Some("QuestData") {
                continue;
            }
            let mut modified = false;
            if matches!(data.get("State").and_then(Value::as_i64), Some(0 | 1)) {
                data.insert("State".to_string(), Value::from(2));
                completion.quests += 1;
                modified = true;
            }
            if let Some(entries) = data.get_mut("Entries").and_then(Value::as_array_mut) {
                for entry in entries {
                    let Some(entry) = entry.as_object_mut() else {
                        continue;
                    };
                    if matches!(entry.get("State").and_then(Value::as_i64), Some(0 | 1)) {
                        entry.insert("State".to_string(), Value::from(2));
                        completion.objectives += 1;
                        modified = true;
                    }
                }
            }
            if modified {
                self.write(&rel, &data)?;
            }
        }
        Ok(completion)
    }

    /// Maxes out every variable file in the root and per-player Variables
    /// folders: boolean "False" becomes "True", non-boolean values become
    /// "999999999". Returns the number of files changed.
    pub fn max_out_variables(&self) -> Result<usize, CoreError> {
        self.guard()?;
        let mut dirs = Vec::new();
        if self.store.resolve("Variables").is_dir() {
            dirs.push("Variables".to_string());
        }
        for player in 0..MAX_PLAYERS {
            let dir = format!("Players/Player_{player}/Variables");
            if self.store.resolve(&dir).is_dir() {
                dirs.push(dir);
            }
        }
        if dirs.is_empty() {
            return Ok(0);
        }
        self.snapshot("Variables", &["Variables", "Players"])?;

        let mut changed = 0;
        for dir in &dirs {
            for rel in self.store.list_files(dir, "*.json", false) {
                let mut data = match self.store.read_json(&rel) {
                    Ok(data) => data,
                    Err(e) => {
                        warn!("skipping {}: {e}", rel.display());
                        continue;
                    }
                };
                let Some(value) = data.get("Value").and_then(Value::as_str) else {
                    continue;
                };
                let updated = if value == "False" {
                    Some("True")
                } else if value != "True" {
                    Some("999999999")
                } else {
                    None
                };
                if let Some(updated) = updated {
                    data.insert("Value".to_string(), Value::from(updated));
                    self.write(&rel, &data)?;
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }

    // -----------------------------------------------------------------
    // Products
    // -----------------------------------------------------------------

    pub fn add_discovered_products(&self, ids: &[String]) -> Result<usize, CoreError> {
        self.guard()?;
        self.snapshot("Products", &["Products"])?;
        let mut data = self.read_products_manager()?;
        let discovered = ensure_array(&mut data, "DiscoveredProducts");
        let mut added = 0;
        for id in ids {
            if !discovered.iter().any(|v| v.as_str() == Some(id)) {
                discovered.push(Value::from(id.as_str()));
                added += 1;
            }
        }
        self.write(PRODUCTS_FILE, &data)?;
        Ok(added)
    }

    pub fn remove_discovered_products(&self, ids: &[String]) -> Result<Vec<String>, CoreError> {
        self.guard()?;
        if !self.store.exists(PRODUCTS_FILE) {
            return Ok(Vec::new());
        }
        self.snapshot("Products", &["Products"])?;
        let mut data = self.read(PRODUCTS_FILE)?;
        let discovered = ensure_array(&mut data, "DiscoveredProducts");
        let mut removed = Vec::new();
        for id in ids {
            let before = discovered.len();
            discovered.retain(|v| v.as_str() != Some(id));
            if discovered.len() != before {
                removed.push(id.clone());
            }
        }
        self.write(PRODUCTS_FILE, &data)?;
        Ok(removed)
    }

    /// Generates products with identifiers disjoint from every product
    /// already discovered or created, registering each in the product
    /// manager with a mix recipe, optional price and listing, and a
    /// `CreatedProducts/<id>.json` record with randomized appearance.
    /// Returns the new identifiers.
    pub fn generate_products(&self, opts: &ProductGeneration) -> Result<Vec<String>, CoreError> {
        self.guard()?;
        if opts.count == 0 {
            return Ok(Vec::new());
        }
        if opts.id_length == 0 {
            return Err(CoreError::new(
                CoreErrorCode::InvalidOperation,
                "product id length must be at least 1",
            ));
        }
        self.snapshot("Products", &["Products"])?;

        let mut data = self.read_products_manager()?;
        let mut existing = self.known_product_names(&data);

        let mut created = Vec::new();
        let mut recipes = Vec::new();
        let mut prices = Vec::new();
        for _ in 0..opts.count {
            let key = if opts.use_name_pool {
                next_pool_name(&existing)
            } else {
                loop {
                    let candidate = random_id(opts.id_length);
                    if !existing.contains(&candidate) {
                        break candidate;
                    }
                }
            };
            existing.insert(key.clone());

            let ingredient = MIX_INGREDIENTS
                .choose(&mut rand::rng())
                .copied()
                .unwrap_or("banana");
            let mut recipe = JsonMap::new();
            recipe.insert("Product".to_string(), Value::from(ingredient));
            recipe.insert("Mixer".to_string(), Value::from(key.as_str()));
            recipe.insert("Output".to_string(), Value::from(key.as_str()));
            recipes.push(Value::Object(recipe));

            if let Some(price) = opts.price {
                if price > 0 {
                    let mut entry = JsonMap::new();
                    entry.insert("String".to_string(), Value::from(key.as_str()));
                    entry.insert("Int".to_string(), Value::from(price));
                    prices.push(Value::Object(entry));
                }
            }

            let record = product_record(&key, opts);
            self.write(format!("{CREATED_PRODUCTS_DIR}/{key}.json"), &record)?;
            created.push(key);
        }

        let new_values: Vec<Value> = created.iter().map(|k| Value::from(k.as_str())).collect();
        ensure_array(&mut data, "DiscoveredProducts").extend(new_values.iter().cloned());
        ensure_array(&mut data, "MixRecipes").extend(recipes);
        ensure_array(&mut data, "ProductPrices").extend(prices);
        if opts.add_to_listed {
            ensure_array(&mut data, "ListedProducts").extend(new_values);
        }
        self.write(PRODUCTS_FILE, &data)?;
        Ok(created)
    }

    fn read_products_manager(&self) -> Result<JsonMap, CoreError> {
        let data = self.read(PRODUCTS_FILE)?;
        if data.is_empty() {
            Ok(products_manager_skeleton())
        } else {
            Ok(data)
        }
    }

    // Names already taken: everything discovered plus the Name of every
    // created-product record.
    fn known_product_names(&self, manager: &JsonMap) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        if let Some(discovered) = manager.get("DiscoveredProducts").and_then(Value::as_array) {
            for value in discovered {
                if let Some(name) = value.as_str() {
                    names.insert(name.to_string());
                }
            }
        }
        for rel in self.store.list_files(CREATED_PRODUCTS_DIR, "*.json", false) {
            match self.store.read_json(&rel) {
                Ok(record) => {
                    if let Some(name) = record.get("Name").and_then(Value::as_str) {
                        names.insert(name.to_string());
                    }
                }
                Err(e) => warn!("skipping {}: {e}", rel.display()),
            }
        }
        names
    }

    // -----------------------------------------------------------------
    // NPCs
    // -----------------------------------------------------------------

    pub fn dealers(&self) -> Result<Vec<String>, CoreError> {
        self.guard()?;
        let mut dealers = Vec::new();
        for npc in self
            .store
            .list_dirs("NPCs")
            .map_err(|e| CoreError::new(CoreErrorCode::Io, e.to_string()))?
        {
            let rel = format!("NPCs/{npc}/NPC.json");
            if !self.store.exists(&rel) {
                continue;
            }
            match self.store.read_json(&rel) {
                Ok(data) => {
                    if data.get("DataType").and_then(Value::as_str) == Some("DealerData") {
                        dealers.push(npc);
                    }
                }
                Err(e) => warn!("skipping {rel}: {e}"),
            }
        }
        dealers.sort();
        Ok(dealers)
    }

    /// Sets `Recruited` on every NPC whose record is tagged `DealerData` and
    /// carries the flag. Returns the number of dealers updated.
    pub fn recruit_all_dealers(&self) -> Result<usize, CoreError> {
        self.guard()?;
        let npcs = self
            .store
            .list_dirs("NPCs")
            .map_err(|e| CoreError::new(CoreErrorCode::Io, e.to_string()))?;
        if npcs.is_empty() {
            return Ok(0);
        }
        self.snapshot("NPCs", &["NPCs"])?;

        let mut recruited = 0;
        for npc in &npcs {
            let rel = format!("NPCs/{npc}/NPC.json");
            if !self.store.exists(&rel) {
                continue;
            }
            let mut data = match self.store.read_json(&rel) {
                Ok(data) => data,
                Err(e) => {
                    warn!("skipping {rel}: {e}");
                    continue;
                }
            };
            if data.get("DataType").and_then(Value::as_str) == Some("DealerData")
                && data.contains_key("Recruited")
            {
                data.insert("Recruited".to_string(), Value::from(true));
                self.write(&rel, &data)?;
                recruited += 1;
            }
        }
        Ok(recruited)
    }

    /// Creates an NPC folder with `NPC.json` and `Relationship.json` for
    /// each (name, id) pair, relationship already maxed.
    pub fn generate_npcs(&self, npcs: &[(String, String)]) -> Result<usize, CoreError> {
        self.guard()?;
        if npcs.is_empty() {
            return Ok(0);
        }
        self.snapshot("NPCs", &["NPCs"])?;
        for (name, id) in npcs {
            let mut npc = JsonMap::new();
            npc.insert("DataType".to_string(), Value::from("NPCData"));
            npc.insert("DataVersion".to_string(), Value::from(0));
            npc.insert("GameVersion".to_string(), Value::from("0.3.3f10"));
            npc.insert("ID".to_string(), Value::from(id.as_str()));
            self.write(format!("NPCs/{name}/NPC.json"), &npc)?;

            self.write(
                format!("NPCs/{name}/Relationship.json"),
                &maxed_relationship(),
            )?;
        }
        Ok(npcs.len())
    }

    /// Merges missing NPC folders from an optional local template tree,
    /// then maxes every relationship and recruits every dealer. Returns the
    /// number of relationships updated.
    pub fn update_npc_relationships(&self, template: Option<&Path>) -> Result<usize, CoreError> {
        self.guard()?;
        self.snapshot("NPCs", &["NPCs"])?;
        if let Some(template) = template {
            self.merge_template(template, "NPCs")?;
        }

        let mut updated = 0;
        for npc in self
            .store
            .list_dirs("NPCs")
            .map_err(|e| CoreError::new(CoreErrorCode::Io, e.to_string()))?
        {
            let relationship_rel = format!("NPCs/{npc}/Relationship.json");
            if self.store.exists(&relationship_rel) {
                let mut data = match self.store.read_json(&relationship_rel) {
                    Ok(data) => data,
                    Err(e) => {
                        warn!("skipping {relationship_rel}: {e}");
                        continue;
                    }
                };
                for (key, value) in maxed_relationship_fields() {
                    data.insert(key.to_string(), value);
                }
                self.write(&relationship_rel, &data)?;
                updated += 1;
            }

            let npc_rel = format!("NPCs/{npc}/NPC.json");
            if self.store.exists(&npc_rel) {
                let mut data = match self.store.read_json(&npc_rel) {
                    Ok(data) => data,
                    Err(e) => {
                        warn!("skipping {npc_rel}: {e}");
                        continue;
                    }
                };
                if data.get("DataType").and_then(Value::as_str) == Some("DealerData") {
                    data.insert("Recruited".to_string(), Value::from(true));
                    self.write(&npc_rel, &data)?;
                }
            }
        }
        Ok(updated)
    }

    // -----------------------------------------------------------------
    // Properties and businesses
    // -----------------------------------------------------------------

    /// Merges missing property types from an optional local template tree
    /// and forces ownership flags on every `Property.json`. Returns the
    /// number of property files written.
    pub fn unlock_all_properties(&self, template: Option<&Path>) -> Result<usize, CoreError> {
        self.unlock_estates("Properties", "Property.json", "PropertyData", template)
    }

    /// Same as property unlock, over `Businesses/<type>/Business.json`.
    pub fn unlock_all_businesses(&self, template: Option<&Path>) -> Result<usize, CoreError> {
        self.unlock_estates("Businesses", "Business.json", "BusinessData", template)
    }

    fn unlock_estates(
        &self,
        area: &str,
        file_name: &str,
        data_type: &str,
        template: Option<&Path>,
    ) -> Result<usize, CoreError> {
        self.guard()?;
        self.snapshot(area, &[area])?;
        if let Some(template) = template {
            self.merge_template(template, area)?;
        }

        let mut updated = 0;
        for estate in self
            .store
            .list_dirs(area)
            .map_err(|e| CoreError::new(CoreErrorCode::Io, e.to_string()))?
        {
            let rel = format!("{area}/{estate}/{file_name}");
            let mut data = match self.store.read_json(&rel) {
                Ok(data) => data,
                Err(e) => {
                    warn!("skipping {rel}: {e}");
                    continue;
                }
            };
            let defaults = estate_defaults(data_type, &estate.to_lowercase());
            if data.is_empty() {
                data = defaults;
            } else {
                for (key, value) in &defaults {
                    if !data.contains_key(key) {
                        data.insert(key.clone(), value.clone());
                    }
                }
                data.insert("IsOwned".to_string(), Value::from(true));
                data.insert(
                    "SwitchStates".to_string(),
                    Value::from(vec![true, true, true, true]),
                );
                data.insert(
                    "ToggleableStates".to_string(),
                    Value::from(vec![true, true]),
                );
            }
            self.write(&rel, &data)?;
            updated += 1;
        }
        Ok(updated)
    }

    // Copies template subtrees the live save does not have yet. The template
    // is a local directory whose immediate subdirectories mirror
    // `<SaveRoot>/<area>/<type>`.
    fn merge_template(&self, template: &Path, area: &str) -> Result<usize, CoreError> {
        if !template.is_dir() {
            return Err(CoreError::new(
                CoreErrorCode::InvalidOperation,
                format!("template directory not found: {}", template.display()),
            ));
        }
        let entries = fs::read_dir(template)
            .map_err(|e| CoreError::new(CoreErrorCode::Io, format!("cannot read template: {e}")))?;
        let mut merged = 0;
        for entry in entries {
            let entry = entry.map_err(|e| {
                CoreError::new(CoreErrorCode::Io, format!("cannot read template: {e}"))
            })?;
            if !entry.path().is_dir() {
                continue;
            }
            let dst = self.store.resolve(area).join(entry.file_name());
            if dst.exists() {
                continue;
            }
            copy_tree(&entry.path(), &dst, &[]).map_err(|e| {
                CoreError::new(
                    CoreErrorCode::Io,
                    format!("failed to merge template {}: {e}", entry.path().display()),
                )
            })?;
            merged += 1;
        }
        Ok(merged)
    }

    // -----------------------------------------------------------------
    // Backup surface
    // -----------------------------------------------------------------

    pub fn has_initial_backup(&self) -> bool {
        self.backups.has_initial_backup()
    }

    pub fn backup_root(&self) -> &Path {
        self.backups.backup_root()
    }

    pub fn snapshot_feature(&self, feature: &str, rel_paths: &[&str]) -> Result<String, CoreError> {
        self.guard()?;
        self.snapshot(feature, rel_paths)
    }

    pub fn list_feature_backups(&self) -> Result<BTreeMap<String, Vec<String>>, CoreError> {
        self.backups
            .list_feature_backups()
            .map_err(|e| CoreError::new(CoreErrorCode::Io, format!("cannot list backups: {e}")))
    }

    pub fn revert_feature(&self, feature: &str, stamp: &str) -> Result<(), CoreError> {
        self.guard()?;
        self.backups.revert_feature(feature, stamp).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                CoreError::new(CoreErrorCode::BackupNotFound, e.to_string())
            } else {
                CoreError::new(
                    CoreErrorCode::Io,
                    format!("failed to revert {feature}: {e}"),
                )
            }
        })
    }

    /// Reverts a feature to its most recent snapshot and returns the stamp
    /// that was restored.
    pub fn revert_feature_latest(&self, feature: &str) -> Result<String, CoreError> {
        let backups = self.list_feature_backups()?;
        let stamp = backups
            .get(feature)
            .and_then(|stamps| stamps.first())
            .cloned()
            .ok_or_else(|| {
                CoreError::new(
                    CoreErrorCode::BackupNotFound,
                    format!("no backups recorded for feature {feature}"),
                )
            })?;
        self.revert_feature(feature, &stamp)?;
        Ok(stamp)
    }

    pub fn revert_all(&self) -> Result<(), CoreError> {
        self.guard()?;
        self.backups.revert_all().map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                CoreError::new(CoreErrorCode::NoInitialBackup, e.to_string())
            } else {
                CoreError::new(CoreErrorCode::Io, format!("failed to revert save: {e}"))
            }
        })
    }

    pub fn delete_all_backups(&self) -> Result<bool, CoreError> {
        self.backups
            .delete_all_backups()
            .map_err(|e| CoreError::new(CoreErrorCode::Io, format!("cannot delete backups: {e}")))
    }
}

// ---------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------

fn store_error_code(e: &io::Error) -> CoreErrorCode {
    if e.kind() == io::ErrorKind::InvalidData {
        CoreErrorCode::MalformedFile
    } else {
        CoreErrorCode::Io
    }
}

fn str_field(map: &JsonMap, key: &str) -> String {
    map.get(key)
        .and_then(Value::as_str)
        .unwrap_or("Unknown")
        .to_string()
}

fn int_field(map: &JsonMap, key: &str) -> i64 {
    map.get(key)
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
        .unwrap_or(0)
}

fn creation_date(metadata: &JsonMap) -> Option<CreationDate> {
    let date = metadata.get("CreationDate")?.as_object()?;
    let part = |key: &str| date.get(key).and_then(Value::as_i64);
    Some(CreationDate {
        year: part("Year")?,
        month: part("Month")?,
        day: part("Day")?,
        hour: part("Hour")?,
        minute: part("Minute")?,
        second: part("Second")?,
    })
}

fn ensure_array<'a>(map: &'a mut JsonMap, key: &str) -> &'a mut Vec<Value> {
    let entry = map
        .entry(key.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if !entry.is_array() {
        *entry = Value::Array(Vec::new());
    }
    entry.as_array_mut().expect("entry was just made an array")
}

fn products_manager_skeleton() -> JsonMap {
    let mut mix = JsonMap::new();
    mix.insert("ProductID".to_string(), Value::from(""));
    mix.insert("IngredientID".to_string(), Value::from(""));

    let mut data = JsonMap::new();
    data.insert("DataType".to_string(), Value::from("ProductManagerData"));
    data.insert("DataVersion".to_string(), Value::from(0));
    data.insert("GameVersion".to_string(), Value::from("0.3.3f14"));
    data.insert("DiscoveredProducts".to_string(), Value::Array(Vec::new()));
    data.insert("ListedProducts".to_string(), Value::Array(Vec::new()));
    data.insert("ActiveMixOperation".to_string(), Value::Object(mix));
    data.insert("IsMixComplete".to_string(), Value::from(false));
    data.insert("MixRecipes".to_string(), Value::Array(Vec::new()));
    data.insert("ProductPrices".to_string(), Value::Array(Vec::new()));
    data.insert("FavouritedProducts".to_string(), Value::Array(Vec::new()));
    data
}

fn product_record(key: &str, opts: &ProductGeneration) -> JsonMap {
    let mut appearance = JsonMap::new();
    for channel in ["MainColor", "SecondaryColor", "LeafColor", "StemColor"] {
        appearance.insert(channel.to_string(), Value::Object(random_color()));
    }

    let mut record = JsonMap::new();
    record.insert("DataType".to_string(), Value::from("WeedProductData"));
    record.insert("DataVersion".to_string(), Value::from(0));
    record.insert("GameVersion".to_string(), Value::from("0.3.3f14"));
    record.insert("Name".to_string(), Value::from(key));
    record.insert("ID".to_string(), Value::from(key));
    record.insert("DrugType".to_string(), Value::from(0));
    record.insert(
        "Properties".to_string(),
        Value::Array(random_properties(opts)),
    );
    record.insert("AppearanceSettings".to_string(), Value::Object(appearance));
    record
}

fn random_properties(opts: &ProductGeneration) -> Vec<Value> {
    let max = opts.max_properties.min(PROPERTY_POOL.len()).max(1);
    let min = opts.min_properties.clamp(1, max);
    let count = rand::rng().random_range(min..=max);
    rand::seq::index::sample(&mut rand::rng(), PROPERTY_POOL.len(), count)
        .iter()
        .map(|index| Value::from(PROPERTY_POOL[index]))
        .collect()
}

fn random_color() -> JsonMap {
    let mut color = JsonMap::new();
    for channel in ["r", "g", "b"] {
        color.insert(
            channel.to_string(),
            Value::from(rand::rng().random_range(0..=255)),
        );
    }
    color.insert("a".to_string(), Value::from(255));
    color
}

fn random_id(length: usize) -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

fn next_pool_name(existing: &BTreeSet<String>) -> String {
    for name in PRODUCT_NAME_POOL {
        if !existing.contains(name) {
            return name.to_string();
        }
    }
    let base = PRODUCT_NAME_POOL[0];
    let mut counter = 1;
    loop {
        let candidate = format!("{base} {counter}");
        if !existing.contains(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

fn maxed_relationship_fields() -> [(&'static str, Value); 3] {
    [
        ("RelationDelta", Value::from(999)),
        ("Unlocked", Value::from(true)),
        ("UnlockType", Value::from(1)),
    ]
}

fn maxed_relationship() -> JsonMap {
    let mut data = JsonMap::new();
    data.insert("DataType".to_string(), Value::from("RelationshipData"));
    data.insert("DataVersion".to_string(), Value::from(0));
    data.insert("GameVersion".to_string(), Value::from("0.3.3f10"));
    for (key, value) in maxed_relationship_fields() {
        data.insert(key.to_string(), value);
    }
    data
}

fn estate_defaults(data_type: &str, code: &str) -> JsonMap {
    let mut data = JsonMap::new();
    data.insert("DataType".to_string(), Value::from(data_type));
    data.insert("DataVersion".to_string(), Value::from(0));
    data.insert("GameVersion".to_string(), Value::from("0.3.3f14"));
    data.insert("PropertyCode".to_string(), Value::from(code));
    data.insert("IsOwned".to_string(), Value::from(true));
    data.insert(
        "SwitchStates".to_string(),
        Value::from(vec![true, true, true, true]),
    );
    data.insert(
        "ToggleableStates".to_string(),
        Value::from(vec![true, true]),
    );
    data
}
