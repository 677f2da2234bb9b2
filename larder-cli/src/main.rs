//! larder - command-line access to the household inventory
//!
//! Works directly on `ingredients.txt` and `singredients.txt` in the root
//! folder, under the same file lock as the web server. The web server can be
//! configured to delegate its adds to this binary.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use larder_common::config::{resolve_root_folder, ConfigFile};
use larder_common::model::format_quantity;
use larder_common::pantry::{AddOutcome, ConsumeOutcome, StandardOutcome};
use larder_common::time::{format_date, today};
use larder_common::{NewIngredient, Pantry};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod report;

#[derive(Parser, Debug)]
#[command(name = "larder")]
#[command(about = "Household inventory from the command line")]
#[command(version)]
struct Cli {
    /// TOML config file (default: <config dir>/larder/config.toml)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Folder holding ingredients.txt and singredients.txt
    #[arg(short, long, value_name = "DIR", global = true)]
    root_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add an ingredient to the inventory
    Add {
        name: String,
        quantity: f64,
        unit: String,
        /// Days until it expires, counted from today
        #[arg(allow_negative_numbers = true)]
        expires_in: i64,
    },
    /// Take an amount out of stock; taking everything removes the record
    Take {
        name: String,
        #[arg(default_value_t = 1.0)]
        quantity: f64,
    },
    /// Print the shopping list
    Shopping {
        /// Also write the list as an HTML page
        #[arg(long, value_name = "FILE")]
        html: Option<PathBuf>,
    },
    /// Print the inventory with days remaining
    List,
    /// Manage the standard (always wanted) items
    Standard {
        #[command(subcommand)]
        action: StandardAction,
    },
}

#[derive(Subcommand, Debug)]
enum StandardAction {
    /// Add a standard item
    Add { name: String },
    /// Remove a standard item
    Remove { name: String },
}

fn open_pantry(cli: &Cli) -> Result<Pantry> {
    let file = ConfigFile::read(cli.config.as_deref())?;
    file.report();
    let root = resolve_root_folder(cli.root_folder.as_deref(), &file.toml);
    debug!("Root folder: {}", root.display());
    Ok(Pantry::open(&root))
}

fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    let pantry = open_pantry(&cli)?;

    match cli.command {
        Command::Add {
            name,
            quantity,
            unit,
            expires_in,
        } => {
            let item = NewIngredient::new(&name, quantity, &unit, expires_in)?;
            match pantry.add_ingredient(item, today())? {
                AddOutcome::Added(record) => writeln!(
                    out,
                    "Added: {} ({}), expires in {} days",
                    record.name,
                    record.amount(),
                    record.expires_in
                )?,
                AddOutcome::Duplicate(existing) => {
                    bail!("Ingredient exists: {}", existing.name)
                }
            }
        }
        Command::Take { name, quantity } => match pantry.consume(&name, quantity)? {
            ConsumeOutcome::Removed(record) => writeln!(out, "Removed: {}", record.name)?,
            ConsumeOutcome::Decremented { taken, remaining } => writeln!(
                out,
                "Took {} {} of {} (remaining: {})",
                format_quantity(taken),
                remaining.unit,
                remaining.name,
                format_quantity(remaining.quantity)
            )?,
            ConsumeOutcome::NotFound => bail!("Not found: {}", name.trim()),
        },
        Command::Shopping { html } => {
            let today = today();
            let list = pantry.shopping_list(today)?;
            if list.is_empty() {
                writeln!(out, "Nothing to buy.")?;
            }
            for item in &list {
                writeln!(
                    out,
                    "[{}] {} {} - {}",
                    item.priority, item.name, item.details, item.reason
                )?;
            }
            if let Some(path) = html {
                std::fs::write(&path, report::shopping_page(&list, today))
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                writeln!(out, "Shopping list generated: {}", path.display())?;
            }
        }
        Command::List => {
            let today = today();
            let inventory = pantry.inventory()?;
            if inventory.is_empty() {
                writeln!(out, "The larder is empty.")?;
            }
            for item in &inventory {
                writeln!(
                    out,
                    "{} | {} | added {} | expires {} | {} days left",
                    item.name,
                    item.amount(),
                    format_date(item.added_date),
                    format_date(item.expiry_date()),
                    item.days_remaining(today)
                )?;
            }
        }
        Command::Standard { action } => match action {
            StandardAction::Add { name } => match pantry.add_standard(&name, today())? {
                StandardOutcome::Added(record) => {
                    writeln!(out, "Added {} to standard ingredients", record.name)?
                }
                StandardOutcome::AlreadyPresent => {
                    writeln!(out, "{} is already a standard ingredient", name.trim())?
                }
            },
            StandardAction::Remove { name } => {
                if !pantry.remove_standard(&name)? {
                    bail!("{} not found in standard ingredients", name.trim());
                }
                writeln!(out, "Removed {} from standard ingredients", name.trim())?;
            }
        },
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let stdout = std::io::stdout();
    run(cli, &mut stdout.lock())
}
