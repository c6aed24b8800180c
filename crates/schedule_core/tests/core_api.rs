use std::fs;
use std::path::{Path, PathBuf};

use schedule_core::core_api::{
    CoreErrorCode, Engine, ItemTarget, ItemUpdate, ProductGeneration,
};
use serde_json::{Value, json};
use tempfile::TempDir;
use walkdir::WalkDir;

fn write_json(root: &Path, rel: &str, value: Value) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("failed to create parent dirs");
    }
    let text = serde_json::to_string_pretty(&value).expect("failed to render fixture");
    fs::write(path, text).expect("failed to write fixture");
}

fn read_json(root: &Path, rel: &str) -> Value {
    let text = fs::read_to_string(root.join(rel)).expect("failed to read file");
    serde_json::from_str(&text).expect("failed to parse file")
}

fn item_string(value: Value) -> String {
    serde_json::to_string(&value).expect("failed to encode item fixture")
}

fn sample_save(tmp: &TempDir) -> PathBuf {
    let root = tmp.path().join("SaveGame_1");
    fs::create_dir(&root).expect("failed to create save root");

    write_json(
        &root,
        "Game.json",
        json!({"GameVersion": "0.3.3f14", "OrganisationName": "Los Hermanos"}),
    );
    write_json(
        &root,
        "Money.json",
        json!({
            "OnlineBalance": 100,
            "Networth": 1234,
            "LifetimeEarnings": 5000,
            "WeeklyDepositSum": 200
        }),
    );
    write_json(&root, "Rank.json", json!({"Rank": 2, "Tier": 3}));
    write_json(&root, "Time.json", json!({"Playtime": 93784}));
    write_json(
        &root,
        "Metadata.json",
        json!({"CreationDate": {
            "Year": 2025, "Month": 3, "Day": 28,
            "Hour": 14, "Minute": 2, "Second": 11
        }}),
    );
    write_json(
        &root,
        "Players/Player_0/Inventory.json",
        json!({"Items": [
            item_string(json!({"DataType": "CashData", "CashBalance": 500})),
            item_string(json!({"DataType": "ItemData", "ID": "jar", "Quantity": 3})),
        ]}),
    );
    write_json(
        &root,
        "Properties/Barn/Objects/plasticpot_1/Data.json",
        json!({"DataType": "PlasticPotData", "Contents": {"Items": [
            item_string(json!({
                "DataType": "WeedData", "ID": "ogkush", "Quantity": 2,
                "Quality": "Standard", "Foo": 42
            })),
        ]}}),
    );
    write_json(
        &root,
        "Quests/Quest_Deal.json",
        json!({"DataType": "QuestData", "State": 1, "Entries": [
            {"State": 0},
            {"State": 2},
        ]}),
    );
    write_json(&root, "Variables/IsCrimeSeen.json", json!({"Value": "False"}));
    write_json(&root, "Variables/CrimeCount.json", json!({"Value": "12"}));
    write_json(
        &root,
        "Players/Player_0/Variables/Energy.json",
        json!({"Value": "True"}),
    );
    write_json(
        &root,
        "NPCs/Benji/NPC.json",
        json!({"DataType": "DealerData", "Recruited": false}),
    );
    write_json(
        &root,
        "NPCs/Benji/Relationship.json",
        json!({"RelationDelta": 1, "Unlocked": false, "UnlockType": 0}),
    );
    write_json(
        &root,
        "NPCs/Kyle/NPC.json",
        json!({"DataType": "NPCData", "ID": "kyle"}),
    );
    write_json(
        &root,
        "Products/Products.json",
        json!({
            "DataType": "ProductManagerData",
            "DiscoveredProducts": ["ogkush"],
            "ListedProducts": [],
            "MixRecipes": [],
            "ProductPrices": []
        }),
    );

    root
}

#[test]
fn open_of_missing_directory_is_no_save_loaded() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let err = Engine::new()
        .open(tmp.path().join("nope"))
        .expect_err("expected open to fail");
    assert_eq!(err.code, CoreErrorCode::NoSaveLoaded);
}

#[test]
fn open_creates_the_initial_backup_exactly_once() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let root = sample_save(&tmp);
    let engine = Engine::new();

    let session = engine.open(&root).expect("failed to open save");
    assert!(session.has_initial_backup());
    let backup_money = read_json(session.backup_root(), "Money.json");

    session
        .set_online_balance(999)
        .expect("failed to set balance");
    drop(session);

    // Reopening must not refresh the origin checkpoint.
    let session = engine.open(&root).expect("failed to reopen save");
    assert_eq!(read_json(session.backup_root(), "Money.json"), backup_money);
}

#[test]
fn fresh_save_lists_no_feature_backups() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let root = sample_save(&tmp);
    let session = Engine::new().open(&root).expect("failed to open save");

    let backups = session
        .list_feature_backups()
        .expect("failed to list backups");
    assert!(backups.is_empty());
}

#[test]
fn set_online_balance_rewrites_money_file() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let root = sample_save(&tmp);
    let session = Engine::new().open(&root).expect("failed to open save");

    session
        .set_online_balance(500)
        .expect("failed to set balance");

    let money = read_json(&root, "Money.json");
    assert_eq!(money.get("OnlineBalance"), Some(&Value::from(500)));
    assert_eq!(money.get("Networth"), Some(&Value::from(1234)));

    let backups = session
        .list_feature_backups()
        .expect("failed to list backups");
    assert_eq!(backups.get("Money").map(Vec::len), Some(1));
}

#[test]
fn rank_snapshot_and_revert_restores_the_old_file() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let root = sample_save(&tmp);
    let session = Engine::new().open(&root).expect("failed to open save");
    let original = read_json(&root, "Rank.json");

    session.set_rank(5, 1).expect("failed to set rank");
    let mutated = read_json(&root, "Rank.json");
    assert_eq!(mutated.get("Rank"), Some(&Value::from(5)));
    assert_eq!(mutated.get("Tier"), Some(&Value::from(1)));
    assert_eq!(mutated.get("CurrentRank"), Some(&Value::from("Enforcer")));
    assert_eq!(mutated.get("TotalXP"), Some(&Value::from(15175)));

    let stamp = session
        .revert_feature_latest("Rank")
        .expect("failed to revert rank");
    assert!(!stamp.is_empty());
    assert_eq!(read_json(&root, "Rank.json"), original);
}

#[test]
fn set_rank_rejects_out_of_catalog_values() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let root = sample_save(&tmp);
    let session = Engine::new().open(&root).expect("failed to open save");
    let original = read_json(&root, "Rank.json");

    let err = session.set_rank(5, 9).expect_err("expected bad tier to fail");
    assert_eq!(err.code, CoreErrorCode::InvalidOperation);
    let err = session
        .set_rank(42, 1)
        .expect_err("expected bad rank to fail");
    assert_eq!(err.code, CoreErrorCode::InvalidOperation);

    assert_eq!(read_json(&root, "Rank.json"), original);
}

#[test]
fn unlock_all_ranks_writes_sentinel_values() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let root = sample_save(&tmp);
    let session = Engine::new().open(&root).expect("failed to open save");

    session.unlock_all_ranks().expect("failed to unlock ranks");
    let rank = read_json(&root, "Rank.json");
    assert_eq!(rank.get("Rank"), Some(&Value::from(999)));
    assert_eq!(rank.get("Tier"), Some(&Value::from(999)));
}

#[test]
fn set_cash_balance_touches_only_the_cash_record() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let root = sample_save(&tmp);
    let session = Engine::new().open(&root).expect("failed to open save");

    session
        .set_cash_balance(0, 9999)
        .expect("failed to set cash balance");

    let inventory = read_json(&root, "Players/Player_0/Inventory.json");
    let items = inventory
        .get("Items")
        .and_then(Value::as_array)
        .expect("inventory should keep its Items array");
    let cash: Value = serde_json::from_str(items[0].as_str().expect("cash slot should be a string"))
        .expect("cash slot should stay valid JSON");
    assert_eq!(cash.get("CashBalance"), Some(&Value::from(9999)));

    let other: Value =
        serde_json::from_str(items[1].as_str().expect("item slot should be a string"))
            .expect("item slot should stay valid JSON");
    assert_eq!(other.get("Quantity"), Some(&Value::from(3)));
}

#[test]
fn set_cash_balance_without_inventory_changes_nothing() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let root = sample_save(&tmp);
    let session = Engine::new().open(&root).expect("failed to open save");

    let err = session
        .set_cash_balance(5, 9999)
        .expect_err("expected missing inventory to fail");
    assert_eq!(err.code, CoreErrorCode::InvalidOperation);
}

#[test]
fn update_property_items_preserves_unknown_fields() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let root = sample_save(&tmp);
    let session = Engine::new().open(&root).expect("failed to open save");

    let update = ItemUpdate {
        target: ItemTarget::Weed,
        quantity: 64,
        quality: Some("Heavenly".to_string()),
        packaging: None,
    };
    let changed = session
        .update_property_items(None, &update)
        .expect("failed to update items");
    assert_eq!(changed, 1);

    let data = read_json(&root, "Properties/Barn/Objects/plasticpot_1/Data.json");
    let items = data
        .get("Contents")
        .and_then(|c| c.get("Items"))
        .and_then(Value::as_array)
        .expect("contents should keep the Items array");
    let weed: Value = serde_json::from_str(items[0].as_str().expect("slot should be a string"))
        .expect("slot should stay valid JSON");
    assert_eq!(weed.get("Quantity"), Some(&Value::from(64)));
    assert_eq!(weed.get("Quality"), Some(&Value::from("Heavenly")));
    assert_eq!(weed.get("Foo"), Some(&Value::from(42)));
    assert_eq!(weed.get("ID"), Some(&Value::from("ogkush")));
}

#[test]
fn update_property_items_with_unknown_type_is_a_no_op() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let root = sample_save(&tmp);
    let session = Engine::new().open(&root).expect("failed to open save");

    let update = ItemUpdate {
        target: ItemTarget::Both,
        quantity: 64,
        quality: None,
        packaging: None,
    };
    let changed = session
        .update_property_items(Some("Penthouse"), &update)
        .expect("failed to run update");
    assert_eq!(changed, 0);
}

#[test]
fn complete_all_quests_counts_quests_and_objectives() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let root = sample_save(&tmp);
    let session = Engine::new().open(&root).expect("failed to open save");

    let completion = session
        .complete_all_quests()
        .expect("failed to complete quests");
    assert_eq!(completion.quests, 1);
    assert_eq!(completion.objectives, 1);

    let quest = read_json(&root, "Quests/Quest_Deal.json");
    assert_eq!(quest.get("State"), Some(&Value::from(2)));
    let entries = quest
        .get("Entries")
        .and_then(Value::as_array)
        .expect("quest should keep its entries");
    assert_eq!(entries[0].get("State"), Some(&Value::from(2)));
    assert_eq!(entries[1].get("State"), Some(&Value::from(2)));

    // Second pass finds nothing left to complete.
    let completion = session
        .complete_all_quests()
        .expect("failed to re-complete quests");
    assert_eq!(completion.quests, 0);
    assert_eq!(completion.objectives, 0);
}

#[test]
fn max_out_variables_rewrites_booleans_and_numbers() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let root = sample_save(&tmp);
    let session = Engine::new().open(&root).expect("failed to open save");

    let changed = session
        .max_out_variables()
        .expect("failed to update variables");
    assert_eq!(changed, 2);

    let seen = read_json(&root, "Variables/IsCrimeSeen.json");
    assert_eq!(seen.get("Value"), Some(&Value::from("True")));
    let count = read_json(&root, "Variables/CrimeCount.json");
    assert_eq!(count.get("Value"), Some(&Value::from("999999999")));
    let energy = read_json(&root, "Players/Player_0/Variables/Energy.json");
    assert_eq!(energy.get("Value"), Some(&Value::from("True")));
}

#[test]
fn add_and_remove_discovered_products() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let root = sample_save(&tmp);
    let session = Engine::new().open(&root).expect("failed to open save");

    let added = session
        .add_discovered_products(&["ogkush".to_string(), "bluedream".to_string()])
        .expect("failed to add products");
    assert_eq!(added, 1);

    let removed = session
        .remove_discovered_products(&["bluedream".to_string(), "missing".to_string()])
        .expect("failed to remove products");
    assert_eq!(removed, vec!["bluedream".to_string()]);

    let manager = read_json(&root, "Products/Products.json");
    assert_eq!(
        manager.get("DiscoveredProducts"),
        Some(&json!(["ogkush"]))
    );
}

#[test]
fn generate_products_avoids_known_identifiers() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let root = sample_save(&tmp);
    let session = Engine::new().open(&root).expect("failed to open save");

    let opts = ProductGeneration {
        count: 3,
        id_length: 12,
        price: Some(1500),
        add_to_listed: true,
        ..ProductGeneration::default()
    };
    let created = session
        .generate_products(&opts)
        .expect("failed to generate products");
    assert_eq!(created.len(), 3);

    let manager = read_json(&root, "Products/Products.json");
    let discovered = manager
        .get("DiscoveredProducts")
        .and_then(Value::as_array)
        .expect("manager should keep DiscoveredProducts");
    assert_eq!(discovered.len(), 4);

    for id in &created {
        assert_ne!(id, "ogkush");
        assert_eq!(id.len(), 12);
        assert!(root.join(format!("Products/CreatedProducts/{id}.json")).is_file());
        assert!(discovered.iter().any(|v| v.as_str() == Some(id)));
    }

    let recipes = manager
        .get("MixRecipes")
        .and_then(Value::as_array)
        .expect("manager should keep MixRecipes");
    assert_eq!(recipes.len(), 3);
    let listed = manager
        .get("ListedProducts")
        .and_then(Value::as_array)
        .expect("manager should keep ListedProducts");
    assert_eq!(listed.len(), 3);
    let prices = manager
        .get("ProductPrices")
        .and_then(Value::as_array)
        .expect("manager should keep ProductPrices");
    assert_eq!(prices.len(), 3);
    assert_eq!(prices[0].get("Int"), Some(&Value::from(1500)));
}

#[test]
fn generate_products_from_name_pool_skips_used_names() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let root = sample_save(&tmp);
    write_json(
        &root,
        "Products/CreatedProducts/Abacavir.json",
        json!({"DataType": "WeedProductData", "Name": "Abacavir", "ID": "Abacavir"}),
    );
    let session = Engine::new().open(&root).expect("failed to open save");

    let opts = ProductGeneration {
        count: 1,
        use_name_pool: true,
        ..ProductGeneration::default()
    };
    let created = session
        .generate_products(&opts)
        .expect("failed to generate products");
    assert_eq!(created, vec!["Acetaminophen".to_string()]);
}

#[test]
fn recruit_all_dealers_flips_only_dealer_records() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let root = sample_save(&tmp);
    let session = Engine::new().open(&root).expect("failed to open save");

    assert_eq!(session.dealers().expect("failed to list dealers"), vec![
        "Benji".to_string()
    ]);

    let recruited = session
        .recruit_all_dealers()
        .expect("failed to recruit dealers");
    assert_eq!(recruited, 1);

    let benji = read_json(&root, "NPCs/Benji/NPC.json");
    assert_eq!(benji.get("Recruited"), Some(&Value::from(true)));
    let kyle = read_json(&root, "NPCs/Kyle/NPC.json");
    assert_eq!(kyle.get("Recruited"), None);
}

#[test]
fn update_npc_relationships_merges_a_local_template() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let root = sample_save(&tmp);
    let template = tmp.path().join("npc_template");
    write_json(
        &template,
        "Mick/NPC.json",
        json!({"DataType": "DealerData", "Recruited": false}),
    );
    write_json(
        &template,
        "Mick/Relationship.json",
        json!({"RelationDelta": 0, "Unlocked": false, "UnlockType": 0}),
    );
    let session = Engine::new().open(&root).expect("failed to open save");

    let updated = session
        .update_npc_relationships(Some(&template))
        .expect("failed to update relationships");
    assert_eq!(updated, 2);

    let mick = read_json(&root, "NPCs/Mick/Relationship.json");
    assert_eq!(mick.get("RelationDelta"), Some(&Value::from(999)));
    assert_eq!(mick.get("Unlocked"), Some(&Value::from(true)));
    let mick_npc = read_json(&root, "NPCs/Mick/NPC.json");
    assert_eq!(mick_npc.get("Recruited"), Some(&Value::from(true)));

    let benji = read_json(&root, "NPCs/Benji/Relationship.json");
    assert_eq!(benji.get("RelationDelta"), Some(&Value::from(999)));
}

#[test]
fn generate_npcs_writes_maxed_relationships() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let root = sample_save(&tmp);
    let session = Engine::new().open(&root).expect("failed to open save");

    let created = session
        .generate_npcs(&[("Molly".to_string(), "molly".to_string())])
        .expect("failed to generate NPCs");
    assert_eq!(created, 1);

    let npc = read_json(&root, "NPCs/Molly/NPC.json");
    assert_eq!(npc.get("ID"), Some(&Value::from("molly")));
    let relationship = read_json(&root, "NPCs/Molly/Relationship.json");
    assert_eq!(relationship.get("RelationDelta"), Some(&Value::from(999)));
}

#[test]
fn unlock_all_properties_fills_missing_files_and_forces_flags() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let root = sample_save(&tmp);
    write_json(
        &root,
        "Properties/Barn/Property.json",
        json!({"DataType": "PropertyData", "PropertyCode": "barn", "IsOwned": false}),
    );
    let template = tmp.path().join("property_template");
    write_json(
        &template,
        "Motel/Property.json",
        json!({"DataType": "PropertyData", "PropertyCode": "motel", "IsOwned": false}),
    );
    let session = Engine::new().open(&root).expect("failed to open save");

    let unlocked = session
        .unlock_all_properties(Some(&template))
        .expect("failed to unlock properties");
    assert_eq!(unlocked, 2);

    let barn = read_json(&root, "Properties/Barn/Property.json");
    assert_eq!(barn.get("IsOwned"), Some(&Value::from(true)));
    assert_eq!(
        barn.get("SwitchStates"),
        Some(&json!([true, true, true, true]))
    );
    let motel = read_json(&root, "Properties/Motel/Property.json");
    assert_eq!(motel.get("IsOwned"), Some(&Value::from(true)));
}

#[test]
fn revert_all_restores_the_whole_tree() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let root = sample_save(&tmp);
    let session = Engine::new().open(&root).expect("failed to open save");

    session
        .set_online_balance(999)
        .expect("failed to set balance");
    session.set_rank(5, 1).expect("failed to set rank");
    let opts = ProductGeneration {
        count: 2,
        ..ProductGeneration::default()
    };
    session
        .generate_products(&opts)
        .expect("failed to generate products");

    session.revert_all().expect("failed to revert all");

    // Every live file matches the initial backup byte for byte.
    let backup_root = session.backup_root().to_path_buf();
    for entry in WalkDir::new(&backup_root) {
        let entry = entry.expect("failed to walk backup");
        let rel = entry
            .path()
            .strip_prefix(&backup_root)
            .expect("backup entries live under the backup root");
        if rel.starts_with("feature_backups") || !entry.file_type().is_file() {
            continue;
        }
        let backup_bytes = fs::read(entry.path()).expect("failed to read backup file");
        let live_bytes = fs::read(root.join(rel)).expect("failed to read live file");
        assert_eq!(backup_bytes, live_bytes, "mismatch at {}", rel.display());
    }

    let money = read_json(&root, "Money.json");
    assert_eq!(money.get("OnlineBalance"), Some(&Value::from(100)));
    assert!(!root.join("Products/CreatedProducts").exists());
}

#[test]
fn revert_of_unknown_feature_is_backup_not_found() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let root = sample_save(&tmp);
    let session = Engine::new().open(&root).expect("failed to open save");

    let err = session
        .revert_feature("Money", "19700101000000")
        .expect_err("expected revert to fail");
    assert_eq!(err.code, CoreErrorCode::BackupNotFound);

    let err = session
        .revert_feature_latest("Money")
        .expect_err("expected revert to fail");
    assert_eq!(err.code, CoreErrorCode::BackupNotFound);
}

#[test]
fn delete_all_backups_discards_the_origin_checkpoint() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let root = sample_save(&tmp);
    let session = Engine::new().open(&root).expect("failed to open save");

    assert!(session.delete_all_backups().expect("failed to delete"));
    assert!(!session.has_initial_backup());

    let err = session.revert_all().expect_err("expected revert to fail");
    assert_eq!(err.code, CoreErrorCode::NoInitialBackup);
}

#[test]
fn info_projects_the_save_files() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let root = sample_save(&tmp);
    let session = Engine::new().open(&root).expect("failed to open save");

    let info = session.info().expect("failed to read info");
    assert_eq!(info.organisation_name, "Los Hermanos");
    assert_eq!(info.game_version, "0.3.3f14");
    assert_eq!(info.online_balance, 100);
    assert_eq!(info.networth, 1234);
    assert_eq!(info.lifetime_earnings, 5000);
    assert_eq!(info.weekly_deposit_sum, 200);
    assert_eq!(info.rank, 2);
    assert_eq!(info.tier, 3);
    assert_eq!(info.playtime_seconds, 93784);
    let date = info.creation_date.expect("creation date should parse");
    assert_eq!(date.year, 2025);
    assert_eq!(date.second, 11);
    // CurrentRank is absent from the fixture on purpose.
    assert_eq!(info.current_rank, "Unknown");
}

#[test]
fn list_save_slots_reads_organisation_names() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    sample_save(&tmp);
    fs::create_dir(tmp.path().join("SaveGame_3")).expect("failed to create empty slot");
    fs::create_dir(tmp.path().join("NotASave")).expect("failed to create decoy dir");

    let slots = Engine::new()
        .list_save_slots(tmp.path())
        .expect("failed to list slots");
    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0].name, "SaveGame_1");
    assert_eq!(slots[0].organisation_name, "Los Hermanos");
    assert_eq!(slots[1].name, "SaveGame_3");
    assert_eq!(slots[1].organisation_name, "Unknown Organisation");
}
