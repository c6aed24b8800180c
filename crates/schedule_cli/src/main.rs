use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use schedule_core::core_api::{
    Engine, ItemTarget, ItemUpdate, ProductGeneration, SaveInfo, Session, rank_catalog,
};
use serde_json::{Map as JsonMap, Value as JsonValue};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ItemTargetArg {
    Weed,
    Item,
    Both,
}

impl ItemTargetArg {
    fn to_core(self) -> ItemTarget {
        match self {
            ItemTargetArg::Weed => ItemTarget::Weed,
            ItemTargetArg::Item => ItemTarget::Item,
            ItemTargetArg::Both => ItemTarget::Both,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(value_name = "SAVE_DIR")]
    path: Option<PathBuf>,
    #[arg(long = "list-saves", value_name = "SAVES_DIR")]
    list_saves: Option<PathBuf>,

    #[arg(long)]
    organisation: bool,
    #[arg(long = "game-version")]
    game_version: bool,
    #[arg(long = "online-money")]
    online_money: bool,
    #[arg(long)]
    networth: bool,
    #[arg(long = "lifetime-earnings")]
    lifetime_earnings: bool,
    #[arg(long = "weekly-deposit-sum")]
    weekly_deposit_sum: bool,
    #[arg(long)]
    rank: bool,
    #[arg(long)]
    tier: bool,
    #[arg(long = "rank-name")]
    rank_name: bool,
    #[arg(long)]
    playtime: bool,
    #[arg(long)]
    json: bool,

    #[arg(long = "set-online-money", allow_hyphen_values = true)]
    set_online_money: Option<i64>,
    #[arg(long = "set-networth", allow_hyphen_values = true)]
    set_networth: Option<i64>,
    #[arg(long = "set-lifetime-earnings", allow_hyphen_values = true)]
    set_lifetime_earnings: Option<i64>,
    #[arg(long = "set-weekly-deposit-sum", allow_hyphen_values = true)]
    set_weekly_deposit_sum: Option<i64>,
    #[arg(long = "set-organisation-name", value_name = "NAME")]
    set_organisation_name: Option<String>,
    #[arg(long = "set-rank")]
    set_rank: Option<i64>,
    #[arg(long = "set-tier")]
    set_tier: Option<i64>,
    #[arg(long = "unlock-ranks")]
    unlock_ranks: bool,
    #[arg(long = "set-cash-balance")]
    set_cash_balance: Option<i64>,
    #[arg(long, default_value_t = 0)]
    player: usize,
    #[arg(long = "complete-quests")]
    complete_quests: bool,
    #[arg(long = "max-variables")]
    max_variables: bool,
    #[arg(long = "recruit-dealers")]
    recruit_dealers: bool,
    #[arg(long = "update-npc-relationships")]
    update_npc_relationships: bool,
    #[arg(long = "npc-template", value_name = "DIR")]
    npc_template: Option<PathBuf>,
    #[arg(long = "unlock-properties")]
    unlock_properties: bool,
    #[arg(long = "property-template", value_name = "DIR")]
    property_template: Option<PathBuf>,
    #[arg(long = "unlock-businesses")]
    unlock_businesses: bool,
    #[arg(long = "business-template", value_name = "DIR")]
    business_template: Option<PathBuf>,
    #[arg(long = "set-item-quantity")]
    set_item_quantity: Option<i64>,
    #[arg(long = "item-target", value_enum, default_value = "both")]
    item_target: ItemTargetArg,
    #[arg(long)]
    quality: Option<String>,
    #[arg(long)]
    packaging: Option<String>,
    #[arg(long = "property-type", value_name = "TYPE")]
    property_type: Option<String>,
    #[arg(long = "generate-products", value_name = "COUNT")]
    generate_products: Option<usize>,
    #[arg(long = "product-id-length", default_value_t = 10)]
    product_id_length: usize,
    #[arg(long = "product-price")]
    product_price: Option<i64>,
    #[arg(long = "list-products")]
    list_products: bool,
    #[arg(long = "name-pool")]
    name_pool: bool,

    #[arg(long)]
    backups: bool,
    #[arg(long = "revert-feature", value_name = "FEATURE")]
    revert_feature: Option<String>,
    #[arg(long, value_name = "STAMP")]
    timestamp: Option<String>,
    #[arg(long = "revert-all")]
    revert_all: bool,
    #[arg(long = "delete-backups")]
    delete_backups: bool,
}

#[derive(Debug, Default, Clone, Copy)]
struct FieldSelection {
    organisation: bool,
    game_version: bool,
    online_money: bool,
    networth: bool,
    lifetime_earnings: bool,
    weekly_deposit_sum: bool,
    rank: bool,
    tier: bool,
    rank_name: bool,
    playtime: bool,
}

impl FieldSelection {
    fn from_cli(cli: &Cli) -> Self {
        Self {
            organisation: cli.organisation,
            game_version: cli.game_version,
            online_money: cli.online_money,
            networth: cli.networth,
            lifetime_earnings: cli.lifetime_earnings,
            weekly_deposit_sum: cli.weekly_deposit_sum,
            rank: cli.rank,
            tier: cli.tier,
            rank_name: cli.rank_name,
            playtime: cli.playtime,
        }
    }

    fn is_field_mode(&self) -> bool {
        self.organisation
            || self.game_version
            || self.online_money
            || self.networth
            || self.lifetime_earnings
            || self.weekly_deposit_sum
            || self.rank
            || self.tier
            || self.rank_name
            || self.playtime
    }

    fn selected_pairs(&self, info: &SaveInfo) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        if self.organisation {
            out.push(("organisation", info.organisation_name.clone()));
        }
        if self.game_version {
            out.push(("game_version", info.game_version.clone()));
        }
        if self.online_money {
            out.push(("online_money", info.online_balance.to_string()));
        }
        if self.networth {
            out.push(("networth", info.networth.to_string()));
        }
        if self.lifetime_earnings {
            out.push(("lifetime_earnings", info.lifetime_earnings.to_string()));
        }
        if self.weekly_deposit_sum {
            out.push(("weekly_deposit_sum", info.weekly_deposit_sum.to_string()));
        }
        if self.rank {
            out.push(("rank", info.rank.to_string()));
        }
        if self.tier {
            out.push(("tier", info.tier.to_string()));
        }
        if self.rank_name {
            out.push(("rank_name", info.current_rank.clone()));
        }
        if self.playtime {
            out.push(("playtime", format_playtime(info.playtime_seconds)));
        }
        out
    }

    fn selected_json(&self, info: &SaveInfo) -> JsonMap<String, JsonValue> {
        let mut out = JsonMap::new();
        if self.organisation {
            out.insert(
                "organisation".to_string(),
                JsonValue::String(info.organisation_name.clone()),
            );
        }
        if self.game_version {
            out.insert(
                "game_version".to_string(),
                JsonValue::String(info.game_version.clone()),
            );
        }
        if self.online_money {
            out.insert(
                "online_money".to_string(),
                JsonValue::from(info.online_balance),
            );
        }
        if self.networth {
            out.insert("networth".to_string(), JsonValue::from(info.networth));
        }
        if self.lifetime_earnings {
            out.insert(
                "lifetime_earnings".to_string(),
                JsonValue::from(info.lifetime_earnings),
            );
        }
        if self.weekly_deposit_sum {
            out.insert(
                "weekly_deposit_sum".to_string(),
                JsonValue::from(info.weekly_deposit_sum),
            );
        }
        if self.rank {
            out.insert("rank".to_string(), JsonValue::from(info.rank));
        }
        if self.tier {
            out.insert("tier".to_string(), JsonValue::from(info.tier));
        }
        if self.rank_name {
            out.insert(
                "rank_name".to_string(),
                JsonValue::String(info.current_rank.clone()),
            );
        }
        if self.playtime {
            out.insert(
                "playtime".to_string(),
                JsonValue::String(format_playtime(info.playtime_seconds)),
            );
        }
        out
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let engine = Engine::new();

    if let Some(saves_dir) = &cli.list_saves {
        let slots = engine.list_save_slots(saves_dir).unwrap_or_else(|e| {
            eprintln!("Error listing saves: {e}");
            process::exit(1);
        });
        for slot in slots {
            println!(
                "{}\t{}\t{}",
                slot.name,
                slot.organisation_name,
                slot.path.display()
            );
        }
        return;
    }

    let Some(path) = cli.path.clone() else {
        eprintln!("Error: a save directory is required unless --list-saves is used");
        process::exit(2);
    };

    let session = engine.open(&path).unwrap_or_else(|e| {
        eprintln!("Error opening save {}:", path.display());
        eprintln!("  {e}");
        process::exit(1);
    });

    let edited = apply_edits(&cli, &session);
    let backup_action = apply_backup_ops(&cli, &session);

    let fields = FieldSelection::from_cli(&cli);
    if cli.json {
        let info = read_info(&session);
        let json = if fields.is_field_mode() {
            JsonValue::Object(fields.selected_json(&info))
        } else {
            serde_json::to_value(&info).unwrap_or_else(|e| {
                eprintln!("Error rendering JSON output: {e}");
                process::exit(1);
            })
        };
        let rendered = serde_json::to_string_pretty(&json).unwrap_or_else(|e| {
            eprintln!("Error rendering JSON output: {e}");
            process::exit(1);
        });
        println!("{rendered}");
        return;
    }

    if fields.is_field_mode() {
        let info = read_info(&session);
        for (key, value) in fields.selected_pairs(&info) {
            println!("{key}={value}");
        }
        return;
    }

    if !edited && !backup_action {
        print_info_sheet(&read_info(&session));
    }
}

fn read_info(session: &Session) -> SaveInfo {
    session.info().unwrap_or_else(|e| {
        eprintln!("Error reading save info: {e}");
        process::exit(1);
    })
}

fn apply_edits(cli: &Cli, session: &Session) -> bool {
    let mut edited = false;

    if let Some(amount) = cli.set_online_money {
        session.set_online_balance(amount).unwrap_or_else(|e| {
            eprintln!("Error setting online balance: {e}");
            process::exit(1);
        });
        println!("online balance set to {amount}");
        edited = true;
    }
    if let Some(amount) = cli.set_networth {
        session.set_networth(amount).unwrap_or_else(|e| {
            eprintln!("Error setting networth: {e}");
            process::exit(1);
        });
        println!("networth set to {amount}");
        edited = true;
    }
    if let Some(amount) = cli.set_lifetime_earnings {
        session.set_lifetime_earnings(amount).unwrap_or_else(|e| {
            eprintln!("Error setting lifetime earnings: {e}");
            process::exit(1);
        });
        println!("lifetime earnings set to {amount}");
        edited = true;
    }
    if let Some(amount) = cli.set_weekly_deposit_sum {
        session.set_weekly_deposit_sum(amount).unwrap_or_else(|e| {
            eprintln!("Error setting weekly deposit sum: {e}");
            process::exit(1);
        });
        println!("weekly deposit sum set to {amount}");
        edited = true;
    }
    if let Some(name) = &cli.set_organisation_name {
        session.set_organisation_name(name).unwrap_or_else(|e| {
            eprintln!("Error setting organisation name: {e}");
            process::exit(1);
        });
        println!("organisation name set to {name}");
        edited = true;
    }
    if cli.set_rank.is_some() || cli.set_tier.is_some() {
        let info = read_info(session);
        let rank = cli.set_rank.unwrap_or(info.rank);
        let tier = cli.set_tier.unwrap_or_else(|| {
            if rank_catalog::is_valid_tier(info.tier) {
                info.tier
            } else {
                1
            }
        });
        session.set_rank(rank, tier).unwrap_or_else(|e| {
            eprintln!("Error setting rank: {e}");
            process::exit(1);
        });
        println!("rank set to {rank}, tier {tier}");
        edited = true;
    }
    if cli.unlock_ranks {
        session.unlock_all_ranks().unwrap_or_else(|e| {
            eprintln!("Error unlocking ranks: {e}");
            process::exit(1);
        });
        println!("rank and tier unlocked");
        edited = true;
    }
    if let Some(amount) = cli.set_cash_balance {
        session
            .set_cash_balance(cli.player, amount)
            .unwrap_or_else(|e| {
                eprintln!("Error setting cash balance: {e}");
                process::exit(1);
            });
        println!("cash balance for player {} set to {amount}", cli.player);
        edited = true;
    }
    if cli.complete_quests {
        let completion = session.complete_all_quests().unwrap_or_else(|e| {
            eprintln!("Error completing quests: {e}");
            process::exit(1);
        });
        println!(
            "completed {} quests and {} objectives",
            completion.quests, completion.objectives
        );
        edited = true;
    }
    if cli.max_variables {
        let changed = session.max_out_variables().unwrap_or_else(|e| {
            eprintln!("Error updating variables: {e}");
            process::exit(1);
        });
        println!("updated {changed} variable files");
        edited = true;
    }
    if cli.recruit_dealers {
        let recruited = session.recruit_all_dealers().unwrap_or_else(|e| {
            eprintln!("Error recruiting dealers: {e}");
            process::exit(1);
        });
        println!("recruited {recruited} dealers");
        edited = true;
    }
    if cli.update_npc_relationships {
        let updated = session
            .update_npc_relationships(cli.npc_template.as_deref())
            .unwrap_or_else(|e| {
                eprintln!("Error updating NPC relationships: {e}");
                process::exit(1);
            });
        println!("updated {updated} NPC relationships");
        edited = true;
    }
    if cli.unlock_properties {
        let unlocked = session
            .unlock_all_properties(cli.property_template.as_deref())
            .unwrap_or_else(|e| {
                eprintln!("Error unlocking properties: {e}");
                process::exit(1);
            });
        println!("unlocked {unlocked} properties");
        edited = true;
    }
    if cli.unlock_businesses {
        let unlocked = session
            .unlock_all_businesses(cli.business_template.as_deref())
            .unwrap_or_else(|e| {
                eprintln!("Error unlocking businesses: {e}");
                process::exit(1);
            });
        println!("unlocked {unlocked} businesses");
        edited = true;
    }
    if let Some(quantity) = cli.set_item_quantity {
        let update = ItemUpdate {
            target: cli.item_target.to_core(),
            quantity,
            quality: cli.quality.clone(),
            packaging: cli.packaging.clone(),
        };
        let changed = session
            .update_property_items(cli.property_type.as_deref(), &update)
            .unwrap_or_else(|e| {
                eprintln!("Error updating item quantities: {e}");
                process::exit(1);
            });
        println!("updated {changed} storage files");
        edited = true;
    }
    if let Some(count) = cli.generate_products {
        let opts = ProductGeneration {
            count,
            id_length: cli.product_id_length,
            price: cli.product_price,
            add_to_listed: cli.list_products,
            use_name_pool: cli.name_pool,
            ..ProductGeneration::default()
        };
        let created = session.generate_products(&opts).unwrap_or_else(|e| {
            eprintln!("Error generating products: {e}");
            process::exit(1);
        });
        println!("generated {} products: {}", created.len(), created.join(", "));
        edited = true;
    }

    edited
}

fn apply_backup_ops(cli: &Cli, session: &Session) -> bool {
    let mut acted = false;

    if cli.backups {
        let backups = session.list_feature_backups().unwrap_or_else(|e| {
            eprintln!("Error listing backups: {e}");
            process::exit(1);
        });
        if backups.is_empty() {
            println!("no feature backups");
        } else {
            for (feature, stamps) in &backups {
                for stamp in stamps {
                    println!("{feature}\t{stamp}");
                }
            }
        }
        acted = true;
    }
    if let Some(feature) = &cli.revert_feature {
        let stamp = match &cli.timestamp {
            Some(stamp) => {
                session.revert_feature(feature, stamp).unwrap_or_else(|e| {
                    eprintln!("Error reverting {feature}: {e}");
                    process::exit(1);
                });
                stamp.clone()
            }
            None => session.revert_feature_latest(feature).unwrap_or_else(|e| {
                eprintln!("Error reverting {feature}: {e}");
                process::exit(1);
            }),
        };
        println!("reverted {feature} to {stamp}");
        acted = true;
    }
    if cli.revert_all {
        session.revert_all().unwrap_or_else(|e| {
            eprintln!("Error restoring initial backup: {e}");
            process::exit(1);
        });
        println!("restored initial backup");
        acted = true;
    }
    if cli.delete_backups {
        let deleted = session.delete_all_backups().unwrap_or_else(|e| {
            eprintln!("Error deleting backups: {e}");
            process::exit(1);
        });
        if deleted {
            println!("deleted all backups");
        } else {
            println!("no backups to delete");
        }
        acted = true;
    }

    acted
}

// ---------------------------------------------------------------------------
// Info sheet
// ---------------------------------------------------------------------------

fn print_info_sheet(info: &SaveInfo) {
    println!("::: Save :::");
    println!("Organisation: {}", info.organisation_name);
    println!("Game version: {}", info.game_version);
    match &info.creation_date {
        Some(date) => println!(
            "Created: {:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            date.year, date.month, date.day, date.hour, date.minute, date.second
        ),
        None => println!("Created: Unknown"),
    }
    println!("Playtime: {}", format_playtime(info.playtime_seconds));
    println!();
    println!("::: Money :::");
    println!("Online balance: {}", info.online_balance);
    println!("Networth: {}", info.networth);
    println!("Lifetime earnings: {}", info.lifetime_earnings);
    println!("Weekly deposit sum: {}", info.weekly_deposit_sum);
    println!();
    println!("::: Rank :::");
    println!(
        "Current rank: {} (rank {}, tier {})",
        info.current_rank, info.rank, info.tier
    );
}

fn format_playtime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = seconds % 86_400 / 3_600;
    let minutes = seconds % 3_600 / 60;
    let secs = seconds % 60;
    format!("{days}d, {hours}h, {minutes}m, {secs}s")
}
