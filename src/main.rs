//! EVE Industry Calculator
//!
//! Material requirements, ME comparison and shopping lists for EVE Online
//! manufacturing, backed by the Fuzzwork SQLite SDE.

use std::fmt::Display;
use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use eve_industry::report::SearchResults;
use eve_industry::{
    Activity, BlueprintMatch, InventorySnapshot, Lookup, MaterialPlan, Planner, PlannerConfig,
    Sde, ShoppingList,
};

#[derive(Parser)]
#[command(name = "eve-industry")]
#[command(about = "Manufacturing material calculator for EVE Online")]
struct Cli {
    /// Path to the SDE SQLite database
    #[arg(short, long, env = "EVE_SDE_PATH", default_value = "data/sqlite-latest.sqlite")]
    database: PathBuf,

    /// Structure material bonus in percent (e.g. 1 for a Raitaru, 4.2 with a T2 rig)
    #[arg(short, long, env = "STRUCTURE_BONUS", default_value = "0")]
    structure_bonus: Decimal,

    /// Print results as JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search items by name
    Search {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },

    /// Material requirements for a blueprint
    Materials {
        /// Product or blueprint name, or type id
        name: String,

        /// Blueprint material efficiency (0-10)
        #[arg(short, long, default_value_t = 10)]
        me: i64,

        /// Number of runs
        #[arg(short, long, default_value_t = 1)]
        runs: i64,
    },

    /// Every activity of a blueprint with times and materials
    Detail {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },

    /// ME 0-10 comparison table
    Mecomp {
        /// Product or blueprint name, or type id
        name: String,

        /// Number of runs
        #[arg(short, long, default_value_t = 1)]
        runs: i64,
    },

    /// Shopping list: materials needed versus materials on hand
    Shop {
        /// Product or blueprint name, or type id
        name: String,

        /// Blueprint material efficiency (0-10)
        #[arg(short, long, default_value_t = 10)]
        me: i64,

        /// Number of runs
        #[arg(short, long, default_value_t = 1)]
        runs: i64,

        /// Inventory snapshot: ESI asset JSON, {type_id: quantity} JSON,
        /// or rows copied from an in-game inventory window
        #[arg(short, long)]
        inventory: PathBuf,
    },

    /// Check that the SDE database is usable
    Verify,

    /// Initialize an empty database with the SDE schema
    Init,

    /// Load a small sample dataset for trying things out without the full SDE
    LoadSample,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let config = PlannerConfig::new(cli.structure_bonus)?;

    match cli.command {
        Commands::Init => {
            Sde::create(&cli.database)?;
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::LoadSample => {
            let sde = Sde::create(&cli.database)?;
            load_sample_data(&sde)?;
            println!("Sample data loaded into {}", cli.database.display());
        }

        Commands::Verify => {
            open_sde(&cli.database)?;
            println!("{} looks good.", cli.database.display());
        }

        Commands::Search { name } => {
            let sde = open_sde(&cli.database)?;
            let planner = Planner::new(&sde, config);
            let term = name.join(" ");
            let items = planner.catalog().search_items(&term)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else if items.is_empty() {
                println!("No items found matching '{term}'");
            } else {
                print!("{}", SearchResults { term: &term, items: &items });
            }
        }

        Commands::Materials { name, me, runs } => {
            let sde = open_sde(&cli.database)?;
            let planner = Planner::new(&sde, config);
            let blueprint = pick_blueprint(&planner, &name)?;
            let plan = planner.plan(&blueprint, me, runs)?;
            emit(&plan, cli.json)?;
            if !cli.json {
                let detail = planner.detail(&blueprint)?;
                if !detail.invention_outcomes.is_empty() {
                    println!("\n  --- Invention Outcomes ---");
                    for product in &detail.invention_outcomes {
                        println!("    -> {}", product.name);
                    }
                    if let Some(invention) = detail
                        .activities
                        .iter()
                        .find(|a| a.activity == Activity::Invention)
                    {
                        println!("\n  Invention materials:");
                        for line in &invention.materials {
                            println!("    {:>8}x  {}", line.quantity, line.name);
                        }
                    }
                }
            }
        }

        Commands::Detail { name } => {
            let sde = open_sde(&cli.database)?;
            let planner = Planner::new(&sde, config);
            let blueprint = pick_blueprint(&planner, &name.join(" "))?;
            emit(&planner.detail(&blueprint)?, cli.json)?;
        }

        Commands::Mecomp { name, runs } => {
            let sde = open_sde(&cli.database)?;
            let planner = Planner::new(&sde, config);
            let blueprint = pick_blueprint(&planner, &name)?;
            emit(&planner.compare(&blueprint, runs)?, cli.json)?;
        }

        Commands::Shop {
            name,
            me,
            runs,
            inventory,
        } => {
            let sde = open_sde(&cli.database)?;
            let planner = Planner::new(&sde, config);
            let blueprint = pick_blueprint(&planner, &name)?;
            let plan = planner.plan(&blueprint, me, runs)?;

            let text = std::fs::read_to_string(&inventory)
                .with_context(|| format!("Failed to read {}", inventory.display()))?;
            let load = InventorySnapshot::parse(&text, planner.catalog())?;
            if !load.unresolved.is_empty() {
                eprintln!(
                    "Ignored {} unknown item(s): {}",
                    load.unresolved.len(),
                    load.unresolved.join(", ")
                );
            }

            let shopping = planner.shopping_list(&plan.requirements, &load.snapshot)?;
            if cli.json {
                #[derive(Serialize)]
                struct ShopOutput<'a> {
                    plan: &'a MaterialPlan,
                    shopping: &'a ShoppingList,
                }
                let output = ShopOutput {
                    plan: &plan,
                    shopping: &shopping,
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print_shopping_header(&plan);
                print!("{shopping}");
            }
        }
    }

    Ok(())
}

/// Open the SDE read-only and check it has what the calculator needs
fn open_sde(path: &Path) -> Result<Sde> {
    let sde = Sde::open(path)?;
    sde.verify()
        .with_context(|| format!("{} is not a usable SDE", path.display()))?;
    Ok(sde)
}

fn init_tracing(verbose: u8) -> Result<()> {
    let directive = match verbose {
        0 => "eve_industry=warn",
        1 => "eve_industry=info",
        _ => "eve_industry=debug",
    };
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("warn").add_directive(directive.parse()?),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn emit<T: Serialize + Display>(value: &T, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{value}");
    }
    Ok(())
}

fn print_shopping_header(plan: &MaterialPlan) {
    println!("{}", "=".repeat(70));
    println!("SHOPPING LIST");
    println!("{}", "=".repeat(70));
    println!();
    println!(
        "  Building: {} x{} (ME {})",
        plan.blueprint.product_name, plan.runs, plan.material_efficiency
    );
    if plan.structure_bonus > Decimal::ZERO {
        println!("  Structure bonus: -{}%", plan.structure_bonus);
    }
    println!();
}

/// Resolve a blueprint, asking the user to choose when the name is ambiguous
fn pick_blueprint(planner: &Planner<'_>, query: &str) -> Result<BlueprintMatch> {
    let candidates = match planner.resolve(query)? {
        Lookup::Found(blueprint) => return Ok(blueprint),
        Lookup::Ambiguous(candidates) => candidates,
    };

    let mut stderr = std::io::stderr();
    writeln!(stderr, "\nMultiple blueprints match '{query}':")?;
    for (i, c) in candidates.iter().enumerate() {
        writeln!(stderr, "  {}. {} ({})", i + 1, c.product_name, c.blueprint_name)?;
    }

    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        bail!("'{query}' is ambiguous; use a more specific name or a type id");
    }

    write!(stderr, "\nSelect (number): ")?;
    stderr.flush()?;
    let mut answer = String::new();
    stdin.lock().read_line(&mut answer)?;

    match answer.trim().parse::<usize>() {
        Ok(n) if (1..=candidates.len()).contains(&n) => {
            let chosen = candidates[n - 1].clone();
            info!(blueprint = chosen.blueprint_type_id, "user picked blueprint");
            Ok(chosen)
        }
        _ => bail!("no valid selection made"),
    }
}

/// Load sample SDE data for testing without the full Fuzzwork dump
fn load_sample_data(sde: &Sde) -> Result<()> {
    sde.clear()?;

    let types: &[(i64, &str)] = &[
        (34, "Tritanium"),
        (35, "Pyerite"),
        (36, "Mexallon"),
        (37, "Isogen"),
        (38, "Nocxium"),
        (39, "Zydrine"),
        (40, "Megacyte"),
        (587, "Rifter"),
        (691, "Rifter Blueprint"),
        (11371, "Wolf"),
        (11372, "Wolf Blueprint"),
        (20172, "Datacore - Minmatar Starship Engineering"),
        (20424, "Datacore - Mechanical Engineering"),
        (2046, "Damage Control I"),
        (2047, "Damage Control I Blueprint"),
        (2048, "Damage Control II"),
        (2049, "Damage Control II Blueprint"),
        (24698, "Drake"),
        (24699, "Drake Blueprint"),
    ];
    for (id, name) in types {
        sde.upsert_type(*id, name, true)?;
    }

    // Rifter: T1 frigate, also the invention base for the Wolf
    sde.insert_activity(691, Activity::Manufacturing, 6000)?;
    sde.insert_product(691, Activity::Manufacturing, 587, 1)?;
    for (material, quantity) in [(34, 32000), (35, 6000), (36, 2500), (37, 500)] {
        sde.insert_material(691, Activity::Manufacturing, material, quantity)?;
    }
    sde.insert_activity(691, Activity::ResearchingMaterialEfficiency, 2100)?;
    sde.insert_activity(691, Activity::ResearchingTimeEfficiency, 2100)?;
    sde.insert_activity(691, Activity::Copying, 4800)?;
    sde.insert_activity(691, Activity::Invention, 63900)?;
    sde.insert_material(691, Activity::Invention, 20172, 2)?;
    sde.insert_material(691, Activity::Invention, 20424, 2)?;
    sde.insert_product(691, Activity::Invention, 11372, 1)?;

    sde.insert_activity(11372, Activity::Manufacturing, 60000)?;
    sde.insert_product(11372, Activity::Manufacturing, 11371, 1)?;
    for (material, quantity) in [(587, 1), (38, 140), (39, 50), (40, 18)] {
        sde.insert_material(11372, Activity::Manufacturing, material, quantity)?;
    }

    // Damage controls: two blueprints matching the same search
    for (blueprint, product, time) in [(2047, 2046, 600), (2049, 2048, 6000)] {
        sde.insert_activity(blueprint, Activity::Manufacturing, time)?;
        sde.insert_product(blueprint, Activity::Manufacturing, product, 1)?;
    }
    for (material, quantity) in [(34, 800), (35, 150), (36, 60)] {
        sde.insert_material(2047, Activity::Manufacturing, material, quantity)?;
    }
    for (material, quantity) in [(2046, 1), (38, 12), (39, 4)] {
        sde.insert_material(2049, Activity::Manufacturing, material, quantity)?;
    }

    sde.insert_activity(24699, Activity::Manufacturing, 36000)?;
    sde.insert_product(24699, Activity::Manufacturing, 24698, 1)?;
    for (material, quantity) in [
        (34, 3_100_000),
        (35, 650_000),
        (36, 210_000),
        (37, 48_000),
        (38, 11_000),
        (39, 2_600),
        (40, 1_000),
    ] {
        sde.insert_material(24699, Activity::Manufacturing, material, quantity)?;
    }

    sde.verify()?;
    println!("Loaded {} sample types", types.len());
    Ok(())
}
