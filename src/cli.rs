use std::{
    io,
    path::{Path, PathBuf},
};

use chrono::{Local, NaiveDate};
use clap::{CommandFactory, Parser, Subcommand};

use front_counter::{
    Category, CategoryId, Color, EntryId, FrontCounter, UndoOutcome,
    constants::DELETED_CATEGORY_LABEL,
    storage::{self, FileStore},
    time::{self, SystemClock},
    undo::PendingUndo,
};

type LocalCounter = FrontCounter<FileStore, SystemClock, Local>;

#[derive(Parser, Debug)]
#[command(name = "front-counter")]
#[command(about = "One-tap front desk tally counter", long_about = None)]
pub struct Cli {
    #[arg(long, global = true, help = "Directory holding the stored collections")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(about = "Record one event for a category")]
    Tap {
        #[arg(help = "Category name or ID")]
        category: String,
    },

    #[command(about = "Revert the most recent tap (within 30 seconds)")]
    Undo,

    #[command(about = "Show today's count for every category")]
    Counts,

    #[command(about = "List the entries recorded on a day, newest first")]
    Timeline {
        #[arg(long, help = "Day to show (YYYY-MM-DD), defaults to today")]
        date: Option<NaiveDate>,
    },

    #[command(about = "Show per-category counts for a day")]
    Summary {
        #[arg(long, help = "Day to show (YYYY-MM-DD), defaults to today")]
        date: Option<NaiveDate>,
    },

    #[command(about = "Manage categories")]
    Category {
        #[command(subcommand)]
        action: CategoryCommand,
    },

    #[command(about = "Manage individual entries")]
    Entry {
        #[command(subcommand)]
        action: EntryCommand,
    },

    #[command(about = "Export every entry as CSV")]
    Export {
        #[arg(long, short, help = "Output path")]
        out: Option<PathBuf>,
    },

    #[command(about = "Delete all data and restore the default categories")]
    Reset {
        #[arg(long, help = "Confirm the deletion")]
        yes: bool,
    },

    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(help = "Shell type (bash, zsh, fish)")]
        shell: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommand {
    #[command(about = "List categories in display order")]
    List,

    #[command(about = "Add a category")]
    Add {
        name: String,

        #[arg(long, short, default_value = "green", help = "Palette color name or hex")]
        color: Color,
    },

    #[command(about = "Rename or recolor a category")]
    Edit {
        id: String,

        name: String,

        #[arg(long, short, help = "Palette color name or hex")]
        color: Option<Color>,
    },

    #[command(about = "Delete a category (its entries are kept)")]
    Rm { id: String },
}

#[derive(Subcommand, Debug)]
pub enum EntryCommand {
    #[command(about = "Delete one entry by ID")]
    Rm { id: String },
}

fn pending_undo_path(data_dir: &Path) -> PathBuf {
    data_dir.join("pending_undo.json")
}

fn open_counter(data_dir: Option<&Path>) -> Result<LocalCounter, String> {
    let dir = data_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(storage::get_data_dir);
    let backend = FileStore::open(dir).map_err(|e| e.to_string())?;
    let mut counter = FrontCounter::open(backend, SystemClock, Local).map_err(|e| e.to_string())?;

    let path = pending_undo_path(counter.store().backend().dir());
    if let Some(pending) = storage::read_json::<PendingUndo>(&path) {
        counter.restore_pending_undo(pending);
    }
    Ok(counter)
}

fn save_pending_undo(counter: &LocalCounter) -> Result<(), String> {
    let path = pending_undo_path(counter.store().backend().dir());
    let result = match counter.pending_undo() {
        Some(pending) => storage::write_json_atomic(&path, &pending),
        None => storage::delete_file_if_exists(&path),
    };
    result.map_err(|e| e.to_string())
}

fn find_category(categories: &[Category], wanted: &str) -> Result<Category, String> {
    categories
        .iter()
        .find(|c| c.id.as_str() == wanted)
        .or_else(|| categories.iter().find(|c| c.name == wanted))
        .cloned()
        .ok_or_else(|| format!("Category '{}' not found", wanted))
}

pub fn tap(data_dir: Option<&Path>, category: &str) -> Result<(), String> {
    let mut counter = open_counter(data_dir)?;
    let categories = counter.categories().list();
    let category = find_category(&categories, category)?;

    let entry = counter.tap(&category.id).map_err(|e| e.to_string())?;
    save_pending_undo(&counter)?;

    let count = counter
        .today_counts()
        .get(&category.id)
        .copied()
        .unwrap_or(0);
    println!(
        "Recorded '{}' at {} (today: {})",
        category.name,
        time::format_timestamp(entry.timestamp, &Local, "%H:%M"),
        count
    );
    Ok(())
}

pub fn undo(data_dir: Option<&Path>) -> Result<(), String> {
    let mut counter = open_counter(data_dir)?;
    let outcome = counter.undo().map_err(|e| e.to_string())?;
    save_pending_undo(&counter)?;

    match outcome {
        UndoOutcome::Undone(entry) => {
            let name = counter.categories().resolve_name(&entry.category_id);
            println!(
                "Undid '{}' recorded at {}",
                name,
                time::format_timestamp(entry.timestamp, &Local, "%H:%M")
            );
        }
        UndoOutcome::NothingToUndo => println!("Nothing to undo"),
    }
    Ok(())
}

pub fn counts(data_dir: Option<&Path>) -> Result<(), String> {
    let mut counter = open_counter(data_dir)?;
    let categories = counter.categories().list();
    let counts = counter.today_counts();
    let total: usize = counts.values().sum();

    println!("{} | total {}", counter.today().format("%Y/%m/%d (%a)"), total);
    println!("{}", "-".repeat(40));
    for category in &categories {
        let count = counts.get(&category.id).copied().unwrap_or(0);
        println!("{:20} {:>5}", category.name, count);
    }
    Ok(())
}

pub fn timeline(data_dir: Option<&Path>, date: Option<NaiveDate>) -> Result<(), String> {
    let mut counter = open_counter(data_dir)?;
    if let Some(date) = date {
        counter.show_day(date);
    }

    let day = counter.cursor_date();
    let rows = counter.timeline();

    println!("{} ({} entries)", day.format("%Y/%m/%d (%a)"), rows.len());
    println!("{}", "-".repeat(40));
    if rows.is_empty() {
        println!("No entries");
    }
    for row in &rows {
        let name = row
            .category
            .as_ref()
            .map(|c| c.name.as_str())
            .unwrap_or(DELETED_CATEGORY_LABEL);
        println!(
            "{}  {:20} {}",
            time::format_timestamp(row.entry.timestamp, &Local, "%H:%M"),
            name,
            row.entry.id
        );
    }
    Ok(())
}

pub fn summary(data_dir: Option<&Path>, date: Option<NaiveDate>) -> Result<(), String> {
    let mut counter = open_counter(data_dir)?;
    if let Some(date) = date {
        counter.show_day(date);
    }

    let day = counter.cursor_date();
    let rows = counter.summary();
    let total: usize = rows.iter().map(|r| r.count).sum();

    println!("{} | total {}", day.format("%Y/%m/%d (%a)"), total);
    println!("{}", "-".repeat(40));
    for row in &rows {
        let name = row
            .category
            .as_ref()
            .map(|c| c.name.as_str())
            .unwrap_or(DELETED_CATEGORY_LABEL);
        println!("{:20} {:>5}", name, row.count);
    }
    Ok(())
}

pub fn category(data_dir: Option<&Path>, action: CategoryCommand) -> Result<(), String> {
    let mut counter = open_counter(data_dir)?;
    let mut registry = counter.categories();

    match action {
        CategoryCommand::List => {
            for category in registry.list() {
                println!(
                    "{:>3}  {:20} {} ({})",
                    category.order,
                    category.name,
                    category.id,
                    category.color.name()
                );
            }
        }
        CategoryCommand::Add { name, color } => {
            let category = registry.add(&name, color).map_err(|e| e.to_string())?;
            println!("Added category '{}' ({})", category.name, category.id);
        }
        CategoryCommand::Edit { id, name, color } => {
            let id = CategoryId::new(id);
            let Some(existing) = registry.get(&id) else {
                return Err(format!("Category '{}' not found", id));
            };
            let color = color.unwrap_or(existing.color);
            registry
                .update(&id, &name, color)
                .map_err(|e| e.to_string())?;
            println!("Updated category {}", id);
        }
        CategoryCommand::Rm { id } => {
            let id = CategoryId::new(id);
            if registry.delete(&id).map_err(|e| e.to_string())? {
                println!("Deleted category {}; its entries are kept", id);
            } else {
                println!("No category with id {}", id);
            }
        }
    }
    Ok(())
}

pub fn entry(data_dir: Option<&Path>, action: EntryCommand) -> Result<(), String> {
    let mut counter = open_counter(data_dir)?;

    match action {
        EntryCommand::Rm { id } => {
            let id = EntryId::new(id);
            if counter.entries().delete(&id).map_err(|e| e.to_string())? {
                println!("Deleted entry {}", id);
            } else {
                println!("No entry with id {}", id);
            }
        }
    }
    Ok(())
}

pub fn export(data_dir: Option<&Path>, out_path: Option<PathBuf>) -> Result<(), String> {
    let counter = open_counter(data_dir)?;
    let csv = counter.export().map_err(|e| e.to_string())?;

    let path = out_path.unwrap_or_else(|| PathBuf::from(counter.export_file_name()));
    storage::write_bytes_file(&path, csv.as_bytes()).map_err(|e| e.to_string())?;
    println!("Exported to {}", path.display());
    Ok(())
}

pub fn reset(data_dir: Option<&Path>, confirmed: bool) -> Result<(), String> {
    if !confirmed {
        return Err("This deletes every category and entry. Re-run with --yes to confirm.".to_string());
    }

    let mut counter = open_counter(data_dir)?;
    counter.reset().map_err(|e| e.to_string())?;
    save_pending_undo(&counter)?;
    println!("All data deleted; default categories restored");
    Ok(())
}

pub fn print_completions(shell: &str) -> Result<(), String> {
    use clap_complete::Shell;
    let shell = match shell {
        "bash" => Shell::Bash,
        "zsh" => Shell::Zsh,
        "fish" => Shell::Fish,
        _ => {
            return Err(format!(
                "Unsupported shell: {}. Use bash, zsh, or fish.",
                shell
            ));
        }
    };
    clap_complete::generate(shell, &mut Cli::command(), "front-counter", &mut io::stdout());
    Ok(())
}

pub fn run_cli() {
    let cli = Cli::parse();
    let data_dir = cli.data_dir.as_deref();

    let result = match cli.command {
        Command::Tap { category } => tap(data_dir, &category),
        Command::Undo => undo(data_dir),
        Command::Counts => counts(data_dir),
        Command::Timeline { date } => timeline(data_dir, date),
        Command::Summary { date } => summary(data_dir, date),
        Command::Category { action } => category(data_dir, action),
        Command::Entry { action } => entry(data_dir, action),
        Command::Export { out } => export(data_dir, out),
        Command::Reset { yes } => reset(data_dir, yes),
        Command::Completions { shell } => print_completions(&shell),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: &str, name: &str) -> Category {
        Category {
            id: CategoryId::new(id),
            name: name.to_string(),
            color: Color::Green,
            order: 0,
        }
    }

    #[test]
    fn test_find_category_prefers_id_then_name() {
        let categories = vec![category("cat_1", "予約"), category("予約", "other")];

        assert_eq!(find_category(&categories, "cat_1").unwrap().name, "予約");
        assert_eq!(find_category(&categories, "予約").unwrap().id.as_str(), "予約");
        assert!(find_category(&categories, "missing").is_err());
    }

    #[test]
    fn test_cli_parses_category_add() {
        let cli = Cli::parse_from(["front-counter", "category", "add", "受付", "--color", "cyan"]);
        match cli.command {
            Command::Category {
                action: CategoryCommand::Add { name, color },
            } => {
                assert_eq!(name, "受付");
                assert_eq!(color, Color::Cyan);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_parses_entry_rm_and_counts() {
        let cli = Cli::parse_from(["front-counter", "entry", "rm", "ent_1_00ff"]);
        match cli.command {
            Command::Entry {
                action: EntryCommand::Rm { id },
            } => assert_eq!(id, "ent_1_00ff"),
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::parse_from(["front-counter", "counts"]);
        assert!(matches!(cli.command, Command::Counts));
    }

    #[test]
    fn test_pending_undo_lives_beside_resolved_data_dir() {
        let dir = std::env::temp_dir().join(format!("fc_cli_undo_{}", std::process::id()));
        let backend = FileStore::open(&dir).unwrap();
        let counter = FrontCounter::open(backend, SystemClock, Local).unwrap();

        let path = pending_undo_path(counter.store().backend().dir());

        assert_eq!(path, dir.join("pending_undo.json"));
        std::fs::remove_dir_all(&dir).ok();
    }
}
