use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use geonote::config::ensure_database_directory;
use geonote::query::{self, Summary};
use geonote::{
    AggregationKind, Category, Clock, Config, ConfigError, Database, DateFilter, Location,
    LogNotifier, NewNote, Note, NoteEdit, NoteError, NoteId, NoteScope, NoteStore, QueryError,
    QuerySpec, SearchScope, SortOption, run_memory_check,
};
use time::OffsetDateTime;
use time::macros::format_description;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// geonote - location-based notes from the command line
#[derive(Parser)]
#[command(name = "geonote")]
#[command(about = "Query and summarize location-based notes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Add a new note at a location
    Add(AddCommand),
    /// List notes with search, filters and sorting
    List(ListCommand),
    /// Show a single note
    Show(ShowCommand),
    /// Edit title, content, category or photos of a note
    Edit(EditCommand),
    /// Toggle a note's favorite flag
    Favorite(IdCommand),
    /// Delete a note
    Delete(IdCommand),
    /// Summarize notes (cities, categories, shares, activity[:DAYS], top-city, memory, overview)
    Stats(StatsCommand),
    /// Notes from the last N days
    Recent(RecentCommand),
    /// Notes placed in one city
    City(CityCommand),
    /// Every photo attached to your notes
    Photos(ScopeArgs),
    /// Resurface a note written on this date in an earlier year
    Memory,
}

#[derive(Parser)]
struct AddCommand {
    /// Title of the note
    #[arg(value_name = "TITLE")]
    title: String,

    /// Body text
    #[arg(short, long, default_value = "")]
    content: String,

    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    lat: f64,

    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    lon: f64,

    /// Place name or address
    #[arg(long)]
    place: Option<String>,

    #[arg(long)]
    city: Option<String>,

    #[arg(long)]
    country: Option<String>,

    /// Personal, Work, Travel, Food, Shopping or Other
    #[arg(long)]
    category: Option<String>,

    /// Photo path; repeat for several (at most 5)
    #[arg(long = "photo", value_name = "PATH")]
    photos: Vec<String>,

    #[arg(long)]
    favorite: bool,
}

#[derive(Parser, Default)]
struct ScopeArgs {
    /// Include every user's notes
    #[arg(long)]
    all_users: bool,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Default)]
struct ListCommand {
    /// Case-insensitive text to search for
    #[arg(short, long, default_value = "")]
    search: String,

    /// Search the country as well as title, content and city
    #[arg(long)]
    all_fields: bool,

    /// Only favorites
    #[arg(short, long)]
    favorites: bool,

    /// all, today, week, month or year
    #[arg(short, long)]
    date: Option<String>,

    /// newest, oldest, az, za or favorites
    #[arg(long)]
    sort: Option<String>,

    #[command(flatten)]
    scope: ScopeArgs,
}

#[derive(Parser)]
struct ShowCommand {
    id: i64,

    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct IdCommand {
    id: i64,
}

#[derive(Parser, Default)]
struct EditCommand {
    id: i64,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    content: Option<String>,

    #[arg(long)]
    category: Option<String>,

    /// Replacement photo list; repeat for several
    #[arg(long = "photo", value_name = "PATH")]
    photos: Vec<String>,

    /// Remove all photos
    #[arg(long, conflicts_with = "photos")]
    clear_photos: bool,
}

#[derive(Parser)]
struct StatsCommand {
    /// Which summary to compute
    #[arg(default_value = "overview")]
    kind: String,

    #[command(flatten)]
    scope: ScopeArgs,
}

#[derive(Parser)]
struct RecentCommand {
    #[arg(long, default_value_t = query::DEFAULT_ACTIVITY_DAYS)]
    days: u32,

    #[command(flatten)]
    scope: ScopeArgs,
}

#[derive(Parser)]
struct CityCommand {
    city: String,

    #[command(flatten)]
    scope: ScopeArgs,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = Config::from_env().and_then(|config| {
        ensure_database_directory(&config.database_path)?;
        let db = Database::open(&config.database_path).context("Failed to open database")?;
        let store = NoteStore::new(db)?;
        run(&cli.command, &store, &config, &mut io::stdout().lock())
    });

    if let Err(e) = result {
        // Determine exit code based on error type
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        tracing::debug!("command failed: {e:?}");
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "geonote=info".into()))
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors are validation failures, unknown options, bad configuration
/// and references to notes that do not exist.
fn is_user_error(error: &anyhow::Error) -> bool {
    let typed = error.chain().any(|cause| {
        cause.downcast_ref::<NoteError>().is_some()
            || cause.downcast_ref::<QueryError>().is_some()
            || cause.downcast_ref::<ConfigError>().is_some()
    });
    typed || error.to_string().contains("does not exist")
}

/// Executes one command against `store`, writing results to `out`.
///
/// Separated from `main` so commands can run against in-memory databases.
fn run(command: &Commands, store: &NoteStore, config: &Config, out: &mut impl Write) -> Result<()> {
    let now = config.clock().now();

    match command {
        Commands::Add(cmd) => execute_add(cmd, store, config, out),
        Commands::List(cmd) => execute_list(cmd, store, config, now, out),
        Commands::Show(cmd) => {
            let id = NoteId::new(cmd.id);
            let Some(note) = store.get_note(id)? else {
                anyhow::bail!("Note with id {} does not exist", id);
            };
            if cmd.json {
                writeln!(out, "{}", serde_json::to_string_pretty(&note)?)?;
            } else {
                write_note(out, &note, now, true)?;
            }
            Ok(())
        }
        Commands::Edit(cmd) => execute_edit(cmd, store, out),
        Commands::Favorite(cmd) => {
            let id = NoteId::new(cmd.id);
            let is_favorite = store.toggle_favorite(id)?;
            let state = if is_favorite { "added to" } else { "removed from" };
            writeln!(out, "Note {id} {state} favorites")?;
            Ok(())
        }
        Commands::Delete(cmd) => {
            let id = NoteId::new(cmd.id);
            store.delete_note(id)?;
            writeln!(out, "Note {id} deleted")?;
            Ok(())
        }
        Commands::Stats(cmd) => execute_stats(cmd, store, config, now, out),
        Commands::Recent(cmd) => {
            let notes = scoped_notes(store, config, &cmd.scope)?;
            let recent = query::recent_notes(&notes, cmd.days, now);
            write_notes(out, &recent, now, cmd.scope.json)
        }
        Commands::City(cmd) => {
            let notes = scoped_notes(store, config, &cmd.scope)?;
            let in_city = query::notes_in_city(&notes, &cmd.city);
            write_notes(out, &in_city, now, cmd.scope.json)
        }
        Commands::Photos(scope) => {
            let notes = scoped_notes(store, config, scope)?;
            let photos = query::photo_gallery(&notes);
            if scope.json {
                writeln!(out, "{}", serde_json::to_string_pretty(&photos)?)?;
            } else {
                for path in photos {
                    writeln!(out, "{path}")?;
                }
            }
            Ok(())
        }
        Commands::Memory => {
            let clock = config.clock();
            match run_memory_check(store, &config.user_id, &clock, &LogNotifier)? {
                Some(notice) => writeln!(
                    out,
                    "On this day: \"{}\" in {} (note {})",
                    notice.title, notice.city, notice.note_id
                )?,
                None => writeln!(out, "No memories for today")?,
            }
            Ok(())
        }
    }
}

fn execute_add(cmd: &AddCommand, store: &NoteStore, config: &Config, out: &mut impl Write) -> Result<()> {
    let mut location = Location::at(cmd.lat, cmd.lon);
    if let Some(place) = &cmd.place {
        location = location.named(place);
    }
    if cmd.city.is_some() || cmd.country.is_some() {
        let city = cmd.city.as_deref().unwrap_or(geonote::models::UNKNOWN_CITY);
        let country = cmd.country.as_deref().unwrap_or(geonote::models::UNKNOWN_COUNTRY);
        location = location.in_city(city, country);
    }

    let category = match &cmd.category {
        Some(c) => c.parse::<Category>()?,
        None => Category::default(),
    };

    let note = store
        .insert_note(NewNote {
            content: cmd.content.clone(),
            category,
            photos: cmd.photos.clone(),
            is_favorite: cmd.favorite,
            ..NewNote::new(config.user_id.clone(), cmd.title.clone(), location)
        })
        .context("Failed to create note")?;

    writeln!(out, "Note created (id: {})", note.id())?;
    Ok(())
}

fn execute_list(
    cmd: &ListCommand,
    store: &NoteStore,
    config: &Config,
    now: OffsetDateTime,
    out: &mut impl Write,
) -> Result<()> {
    let spec = QuerySpec {
        search: cmd.search.clone(),
        search_scope: if cmd.all_fields {
            SearchScope::IncludeCountry
        } else {
            config.search_scope
        },
        favorites_only: cmd.favorites,
        date_filter: cmd
            .date
            .as_deref()
            .map(str::parse::<DateFilter>)
            .transpose()?
            .unwrap_or_default(),
        sort: cmd
            .sort
            .as_deref()
            .map(str::parse::<SortOption>)
            .transpose()?
            .unwrap_or_default(),
        week_start: config.week_start,
    };

    let notes = scoped_notes(store, config, &cmd.scope)?;
    let result = query::execute(&notes, &spec, now);
    write_notes(out, &result, now, cmd.scope.json)
}

fn execute_edit(cmd: &EditCommand, store: &NoteStore, out: &mut impl Write) -> Result<()> {
    let photos = if cmd.clear_photos {
        Some(Vec::new())
    } else if cmd.photos.is_empty() {
        None
    } else {
        Some(cmd.photos.clone())
    };

    let edit = NoteEdit {
        title: cmd.title.clone(),
        content: cmd.content.clone(),
        category: cmd
            .category
            .as_deref()
            .map(str::parse::<Category>)
            .transpose()?,
        photos,
    };

    let note = store.update_note(NoteId::new(cmd.id), edit)?;
    writeln!(out, "Note {} updated", note.id())?;
    Ok(())
}

fn execute_stats(
    cmd: &StatsCommand,
    store: &NoteStore,
    config: &Config,
    now: OffsetDateTime,
    out: &mut impl Write,
) -> Result<()> {
    let kind: AggregationKind = cmd.kind.parse()?;
    let notes = scoped_notes(store, config, &cmd.scope)?;
    let summary = query::aggregate(&notes, kind, now);

    if cmd.scope.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&summary)?)?;
        return Ok(());
    }

    match summary {
        Summary::CityCounts(cities) => {
            for c in cities {
                writeln!(out, "{:<24} {}", c.city, c.count)?;
            }
        }
        Summary::CategoryCounts(categories) => {
            for c in categories {
                writeln!(out, "{:<24} {}", c.category, c.count)?;
            }
        }
        Summary::CategoryShares(shares) => {
            for s in shares {
                writeln!(out, "{:<24} {:>4} {:>3}%", s.category, s.count, s.percent)?;
            }
        }
        Summary::DailyActivity(days) => {
            for d in days {
                writeln!(out, "{} {:>3} {}", d.date, d.count, "#".repeat(d.count))?;
            }
        }
        Summary::TopCity(Some(top)) => writeln!(out, "{} ({} notes)", top.city, top.count)?,
        Summary::TopCity(None) => writeln!(out, "No data")?,
        Summary::OnThisDay(Some(memory)) => {
            writeln!(out, "{} year(s) ago:", memory.years_ago)?;
            write_note(out, memory.note, now, false)?;
        }
        Summary::OnThisDay(None) => writeln!(out, "No memories for today")?,
        Summary::Overview(o) => {
            writeln!(out, "Notes:     {}", o.total_notes)?;
            writeln!(out, "Favorites: {}", o.favorite_notes)?;
            writeln!(out, "Photos:    {}", o.total_photos)?;
            writeln!(out, "Users:     {}", o.users)?;
        }
    }
    Ok(())
}

fn scoped_notes(store: &NoteStore, config: &Config, scope: &ScopeArgs) -> Result<Vec<Note>> {
    let scope = if scope.all_users {
        NoteScope::All
    } else {
        NoteScope::User(config.user_id.clone())
    };
    store.notes_in_scope(&scope)
}

fn write_notes(out: &mut impl Write, notes: &[&Note], now: OffsetDateTime, json: bool) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(notes)?)?;
        return Ok(());
    }
    if notes.is_empty() {
        writeln!(out, "No notes found")?;
    }
    for note in notes {
        write_note(out, note, now, false)?;
    }
    Ok(())
}

/// Writes a note as one summary line, plus body and photos when `detailed`.
///
/// Times are shown in `now`'s offset.
fn write_note(out: &mut impl Write, note: &Note, now: OffsetDateTime, detailed: bool) -> Result<()> {
    let when = note
        .timestamp()
        .to_offset(now.offset())
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]"))?;
    let star = if note.is_favorite() { "*" } else { " " };
    let location = note.location();
    let place = if location.has_known_city() && location.has_known_country() {
        format!("{}, {}", note.city(), note.country())
    } else if location.has_known_city() {
        note.city().to_string()
    } else {
        format!("{:.4}, {:.4}", location.latitude, location.longitude)
    };

    writeln!(
        out,
        "{star} [{}] {} | {} | {} | {when}",
        note.id(),
        note.title(),
        note.category(),
        place
    )?;

    if detailed {
        if !note.content().is_empty() {
            writeln!(out, "\n{}\n", note.content())?;
        }
        for photo in note.photos() {
            writeln!(out, "  photo: {photo}")?;
        }
    }
    Ok(())
}
