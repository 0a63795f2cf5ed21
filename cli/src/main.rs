use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use roomplan::catalog::Catalog;
use roomplan::consts::{DEFAULT_ROOM_HEIGHT, DEFAULT_ROOM_NAME, DEFAULT_ROOM_WIDTH};
use roomplan::doc::{EditError, Room};
use roomplan::engine::{Action, Planner};
use roomplan::prefs::{FilePrefsStore, PlannerPrefs, PrefsError, SettingChange};
use roomplan::serialize::{self, DocumentError};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("room document error: {0}")]
    Document(#[from] DocumentError),
    #[error("preferences error: {0}")]
    Prefs(#[from] PrefsError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("catalog has no item `{0}`")]
    UnknownItem(String),
    #[error("invalid room: {0}")]
    Edit(#[from] EditError),
}

#[derive(Parser, Debug)]
#[command(name = "roomplan", about = "Room planner document tool")]
struct Cli {
    /// Directory holding the planner preferences file.
    #[arg(long, env = "ROOMPLAN_PREFS", default_value = ".roomplan")]
    prefs_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a fresh, empty room document.
    New(NewArgs),
    /// Summarize a room document.
    Info { path: PathBuf },
    /// Add a catalog item to a room document, centered in the room.
    Add(AddArgs),
    /// Import a room document and report whether it is valid.
    Validate { path: PathBuf },
    /// Print the file name the room would be exported under.
    ExportName { path: PathBuf },
    /// Show or change planner preferences.
    Prefs(PrefsArgs),
}

#[derive(Args, Debug)]
struct NewArgs {
    path: PathBuf,
    #[arg(long, default_value = DEFAULT_ROOM_NAME)]
    name: String,
    #[arg(long, default_value_t = DEFAULT_ROOM_WIDTH)]
    width: f64,
    #[arg(long, default_value_t = DEFAULT_ROOM_HEIGHT)]
    height: f64,
}

#[derive(Args, Debug)]
struct AddArgs {
    path: PathBuf,
    /// Catalog JSON file (an array of furniture items).
    #[arg(long)]
    catalog: PathBuf,
    /// Catalog item id to place.
    #[arg(long)]
    item: String,
}

#[derive(Args, Debug)]
struct PrefsArgs {
    #[arg(long)]
    grid_size: Option<f64>,
    #[arg(long)]
    snap: Option<bool>,
    #[arg(long)]
    show_grid: Option<bool>,
}

fn main() -> Result<(), CliError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let store = FilePrefsStore::new(cli.prefs_dir);

    match cli.command {
        Command::New(args) => run_new(args),
        Command::Info { path } => run_info(&path),
        Command::Add(args) => run_add(&store, args),
        Command::Validate { path } => run_validate(&path),
        Command::ExportName { path } => run_export_name(&path),
        Command::Prefs(args) => run_prefs(store, args),
    }
}

fn run_new(args: NewArgs) -> Result<(), CliError> {
    let room = Room::try_new(args.name, args.width, args.height)?;
    serialize::save_to_file(&args.path, &room)?;
    println!("{}", args.path.display());
    Ok(())
}

fn run_info(path: &Path) -> Result<(), CliError> {
    let room = serialize::load_from_file(path)?;
    let objects: Vec<Value> = room
        .paint_order()
        .iter()
        .map(|obj| {
            json!({
                "id": obj.id,
                "name": obj.name,
                "x": obj.x,
                "y": obj.y,
                "width": obj.width,
                "height": obj.height,
                "rotation": obj.rotation,
                "locked": obj.locked,
                "visible": obj.visible,
            })
        })
        .collect();
    print_json(&json!({
        "id": room.id,
        "name": room.name,
        "width": room.width,
        "height": room.height,
        "backgroundColor": room.background_color,
        "objectCount": room.len(),
        "estimatedTotal": room.estimated_total(),
        "objects": objects,
    }))
}

fn run_add(store: &FilePrefsStore, args: AddArgs) -> Result<(), CliError> {
    let room = serialize::load_from_file(&args.path)?;
    let catalog = Catalog::from_json(&fs::read_to_string(&args.catalog)?)?;
    let Some(item) = catalog.get(&args.item) else {
        return Err(CliError::UnknownItem(args.item));
    };

    let mut planner = Planner::new(room, PlannerPrefs::load(store));
    let actions = planner.add_furniture(item);
    serialize::save_to_file(&args.path, planner.room())?;

    for action in actions {
        if let Action::ObjectAdded(id) = action {
            println!("{id}");
        }
    }
    Ok(())
}

fn run_validate(path: &Path) -> Result<(), CliError> {
    let room = serialize::import_json(&fs::read_to_string(path)?)?;
    println!("ok: {} ({} objects)", room.name, room.len());
    Ok(())
}

fn run_export_name(path: &Path) -> Result<(), CliError> {
    let room = serialize::load_from_file(path)?;
    println!("{}", serialize::export_file_name(&room));
    Ok(())
}

fn run_prefs(mut store: FilePrefsStore, args: PrefsArgs) -> Result<(), CliError> {
    let mut prefs = PlannerPrefs::load(&store);
    let changes = [
        args.grid_size.map(SettingChange::GridSize),
        args.snap.map(SettingChange::SnapToGrid),
        args.show_grid.map(SettingChange::ShowGrid),
    ];
    let mut changed = false;
    for change in changes.into_iter().flatten() {
        prefs.apply(change)?;
        changed = true;
    }
    if changed {
        prefs.save(&mut store)?;
        tracing::info!(?prefs, "preferences saved");
    }
    print_json(&serde_json::to_value(prefs)?)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
