use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use time::OffsetDateTime;
use tokio::sync::watch;

use crate::clock::{Clock, SystemClock};
use crate::models::{
    Category, Location, Note, NoteBuilder, NoteId, UserId, from_millis, to_millis,
    validate_photos, validate_title,
};
use crate::Database;

/// Immutable view of every stored note, newest first.
pub type Snapshot = Arc<[Note]>;

/// Input for creating a note.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNote {
    pub user_id: UserId,
    pub title: String,
    pub content: String,
    pub location: Location,
    pub category: Category,
    pub photos: Vec<String>,
    pub is_favorite: bool,
    /// Creation time. `None` stamps the note with the store's clock.
    pub timestamp: Option<OffsetDateTime>,
}

impl NewNote {
    /// Starts a note with the required fields; everything else defaults.
    pub fn new(user_id: impl Into<UserId>, title: impl Into<String>, location: Location) -> Self {
        Self {
            user_id: user_id.into(),
            title: title.into(),
            content: String::new(),
            location,
            category: Category::default(),
            photos: Vec::new(),
            is_favorite: false,
            timestamp: None,
        }
    }
}

/// Changes applied by [`NoteStore::update_note`]. `None` leaves a field as is.
///
/// Timestamps and favorite status are not editable here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteEdit {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<Category>,
    pub photos: Option<Vec<String>>,
}

/// Which notes a consumer sees: one user's, or everyone's for admin views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteScope {
    User(UserId),
    All,
}

impl NoteScope {
    pub fn includes(&self, note: &Note) -> bool {
        match self {
            Self::User(user_id) => note.user_id() == user_id,
            Self::All => true,
        }
    }

    /// Notes of `snapshot` inside this scope, in snapshot order.
    pub fn select<'a>(&'a self, snapshot: &'a [Note]) -> impl Iterator<Item = &'a Note> + 'a {
        snapshot.iter().filter(move |n| self.includes(n))
    }
}

/// Persistent note store backed by SQLite.
///
/// Owns the database and publishes a fresh [`Snapshot`] of all notes after
/// every successful mutation. Query code never writes through the store; it
/// reads snapshots.
///
/// # Examples
///
/// ```
/// use geonote::{Database, Location, NewNote, NoteStore};
///
/// # fn main() -> anyhow::Result<()> {
/// let store = NoteStore::new(Database::in_memory()?)?;
/// let note = store.insert_note(NewNote::new("alice", "Coffee", Location::at(48.85, 2.35)))?;
/// assert!(note.id().is_persisted());
/// assert_eq!(store.snapshot().len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct NoteStore {
    db: Database,
    clock: Arc<dyn Clock + Send + Sync>,
    changes: watch::Sender<Snapshot>,
}

impl NoteStore {
    /// Creates a store stamping new notes with the local wall clock.
    pub fn new(db: Database) -> Result<Self> {
        Self::with_clock(db, Arc::new(SystemClock::local()))
    }

    /// Creates a store using `clock` for creation timestamps.
    pub fn with_clock(db: Database, clock: Arc<dyn Clock + Send + Sync>) -> Result<Self> {
        let (changes, _) = watch::channel(Snapshot::from(Vec::new()));
        let store = Self { db, clock, changes };
        store.publish()?;
        Ok(store)
    }

    /// Returns a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Returns the latest published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.changes.borrow().clone()
    }

    /// Subscribes to snapshots published after each mutation.
    ///
    /// The receiver starts out holding the current snapshot, marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.changes.subscribe()
    }

    /// Validates and inserts a note along with its photos.
    ///
    /// Fails if the title is blank or more than five photos are attached.
    pub fn insert_note(&self, new: NewNote) -> Result<Note> {
        validate_title(&new.title)?;
        validate_photos(&new.photos)?;

        let timestamp = new.timestamp.unwrap_or_else(|| self.clock.now());

        let id = self.in_transaction(|conn| {
            conn.execute(
                "INSERT INTO notes (user_id, title, content, latitude, longitude, location_name,
                                    city, country, timestamp, is_favorite, category)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    new.user_id.as_str(),
                    new.title,
                    new.content,
                    new.location.latitude,
                    new.location.longitude,
                    new.location.name,
                    new.location.city,
                    new.location.country,
                    to_millis(timestamp),
                    new.is_favorite,
                    new.category.as_str(),
                ],
            )?;
            let id = conn.last_insert_rowid();
            insert_photos(conn, id, &new.photos)?;
            Ok(NoteId::new(id))
        })?;

        tracing::info!(note_id = %id, user_id = %new.user_id, "note created");
        self.publish()?;

        self.get_note(id)?
            .with_context(|| format!("Note with id {id} vanished after insert"))
    }

    /// Retrieves a note by its ID.
    ///
    /// Returns `None` if no note exists with the given ID.
    pub fn get_note(&self, id: NoteId) -> Result<Option<Note>> {
        let mut notes = self.load_notes("WHERE n.id = ?1", params![id.get()])?;
        Ok(notes.pop())
    }

    /// Applies `edit` to an existing note and returns the updated note.
    ///
    /// Photo order is kept unless `edit.photos` replaces the list.
    pub fn update_note(&self, id: NoteId, edit: NoteEdit) -> Result<Note> {
        let Some(current) = self.get_note(id)? else {
            anyhow::bail!("Note with id {} does not exist", id);
        };

        let title = edit.title.unwrap_or_else(|| current.title().to_string());
        validate_title(&title)?;
        if let Some(photos) = &edit.photos {
            validate_photos(photos)?;
        }

        let content = edit.content.unwrap_or_else(|| current.content().to_string());
        let category = edit
            .category
            .map(|c| c.as_str().to_string())
            .unwrap_or_else(|| current.category().to_string());

        self.in_transaction(|conn| {
            conn.execute(
                "UPDATE notes SET title = ?1, content = ?2, category = ?3 WHERE id = ?4",
                params![title, content, category, id.get()],
            )?;
            if let Some(photos) = &edit.photos {
                conn.execute("DELETE FROM photos WHERE note_id = ?1", [id.get()])?;
                insert_photos(conn, id.get(), photos)?;
            }
            Ok(())
        })?;

        tracing::info!(note_id = %id, "note updated");
        self.publish()?;

        self.get_note(id)?
            .with_context(|| format!("Note with id {id} vanished after update"))
    }

    /// Sets the favorite flag without touching anything else.
    pub fn set_favorite(&self, id: NoteId, is_favorite: bool) -> Result<()> {
        let changed = self.db.connection().execute(
            "UPDATE notes SET is_favorite = ?1 WHERE id = ?2",
            params![is_favorite, id.get()],
        )?;
        if changed == 0 {
            anyhow::bail!("Note with id {} does not exist", id);
        }

        tracing::info!(note_id = %id, is_favorite, "favorite flag set");
        self.publish()
    }

    /// Flips the favorite flag and returns the new value.
    pub fn toggle_favorite(&self, id: NoteId) -> Result<bool> {
        let current: Option<bool> = self
            .db
            .connection()
            .query_row(
                "SELECT is_favorite FROM notes WHERE id = ?1",
                [id.get()],
                |row| row.get(0),
            )
            .optional()?;

        let Some(current) = current else {
            anyhow::bail!("Note with id {} does not exist", id);
        };
        self.set_favorite(id, !current)?;
        Ok(!current)
    }

    /// Deletes a note and its photos.
    ///
    /// This operation is idempotent: deleting a non-existent note returns
    /// `Ok(())` without error.
    pub fn delete_note(&self, id: NoteId) -> Result<()> {
        let deleted = self
            .db
            .connection()
            .execute("DELETE FROM notes WHERE id = ?1", [id.get()])?;

        if deleted > 0 {
            tracing::info!(note_id = %id, "note deleted");
            self.publish()?;
        }
        Ok(())
    }

    /// All notes owned by `user_id`, newest first.
    pub fn notes_for_user(&self, user_id: &UserId) -> Result<Vec<Note>> {
        self.load_notes("WHERE n.user_id = ?1", params![user_id.as_str()])
    }

    /// Every note in the store, newest first.
    pub fn all_notes(&self) -> Result<Vec<Note>> {
        self.load_notes("", params![])
    }

    /// Notes in `scope`, newest first.
    pub fn notes_in_scope(&self, scope: &NoteScope) -> Result<Vec<Note>> {
        match scope {
            NoteScope::User(user_id) => self.notes_for_user(user_id),
            NoteScope::All => self.all_notes(),
        }
    }

    fn publish(&self) -> Result<()> {
        let notes = self.all_notes().context("Failed to load note snapshot")?;
        tracing::debug!(notes = notes.len(), "publishing note snapshot");
        self.changes.send_replace(Snapshot::from(notes));
        Ok(())
    }

    fn in_transaction<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.db.connection();
        conn.execute("BEGIN TRANSACTION", [])?;

        match f(conn) {
            Ok(value) => {
                conn.execute("COMMIT", [])?;
                Ok(value)
            }
            Err(e) => {
                conn.execute("ROLLBACK", []).ok();
                Err(e)
            }
        }
    }

    fn load_notes(&self, where_clause: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<Note>> {
        let conn = self.db.connection();

        let query = format!(
            "SELECT n.id, n.user_id, n.title, n.content, n.latitude, n.longitude,
                    n.location_name, n.city, n.country, n.timestamp, n.is_favorite, n.category
             FROM notes n {where_clause}
             ORDER BY n.timestamp DESC, n.id DESC"
        );
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map(args, |row| {
            Ok(NoteRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                title: row.get(2)?,
                content: row.get(3)?,
                location: Location {
                    latitude: row.get(4)?,
                    longitude: row.get(5)?,
                    name: row.get(6)?,
                    city: row.get(7)?,
                    country: row.get(8)?,
                },
                timestamp: row.get(9)?,
                is_favorite: row.get(10)?,
                category: row.get(11)?,
            })
        })?;

        let mut note_rows = Vec::new();
        for row_result in rows {
            note_rows.push(row_result?);
        }

        let mut photos = load_photos(conn, where_clause, args)?;
        note_rows
            .into_iter()
            .map(|row| {
                let photos = photos.remove(&row.id).unwrap_or_default();
                row.into_note(photos)
            })
            .collect()
    }
}

struct NoteRow {
    id: i64,
    user_id: String,
    title: String,
    content: String,
    location: Location,
    timestamp: i64,
    is_favorite: bool,
    category: String,
}

impl NoteRow {
    fn into_note(self, photos: Vec<String>) -> Result<Note> {
        Ok(NoteBuilder::new()
            .id(NoteId::new(self.id))
            .user_id(self.user_id)
            .title(self.title)
            .content(self.content)
            .location(self.location)
            .timestamp(from_millis(self.timestamp)?)
            .favorite(self.is_favorite)
            .category(self.category)
            .photos(photos)
            .build())
    }
}

fn insert_photos(conn: &Connection, note_id: i64, photos: &[String]) -> Result<()> {
    let mut stmt =
        conn.prepare("INSERT INTO photos (note_id, position, path) VALUES (?1, ?2, ?3)")?;
    for (position, path) in photos.iter().enumerate() {
        stmt.execute(params![note_id, position as i64, path])?;
    }
    Ok(())
}

/// Loads photo paths for the notes matched by `where_clause`, keyed by note id.
fn load_photos(
    conn: &Connection,
    where_clause: &str,
    args: &[&dyn rusqlite::ToSql],
) -> Result<HashMap<i64, Vec<String>>> {
    let query = format!(
        "SELECT p.note_id, p.path
         FROM photos p
         JOIN notes n ON n.id = p.note_id
         {where_clause}
         ORDER BY p.note_id, p.position"
    );
    let mut stmt = conn.prepare(&query)?;
    let rows = stmt.query_map(args, |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?;

    let mut photos: HashMap<i64, Vec<String>> = HashMap::new();
    for row_result in rows {
        let (note_id, path) = row_result?;
        photos.entry(note_id).or_default().push(path);
    }
    Ok(photos)
}
