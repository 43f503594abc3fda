/// Complete database schema for the notes store.
///
/// Uses CREATE TABLE/INDEX IF NOT EXISTS for idempotent execution.
/// AUTOINCREMENT keeps note ids monotonic even after deletes.
pub const INITIAL_SCHEMA: &str = r#"
-- Notes table: one geotagged entry per row, owned by a user
CREATE TABLE IF NOT EXISTS notes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    title TEXT NOT NULL,
    content TEXT NOT NULL DEFAULT '',
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    location_name TEXT NOT NULL DEFAULT '',
    city TEXT NOT NULL DEFAULT '',
    country TEXT NOT NULL DEFAULT '',
    timestamp INTEGER NOT NULL,
    is_favorite INTEGER NOT NULL DEFAULT 0,
    category TEXT NOT NULL DEFAULT 'Personal'
);

-- Photos table: ordered photo paths, removed together with their note
CREATE TABLE IF NOT EXISTS photos (
    id INTEGER PRIMARY KEY,
    note_id INTEGER NOT NULL,
    position INTEGER NOT NULL,
    path TEXT NOT NULL,
    UNIQUE (note_id, position),
    FOREIGN KEY (note_id) REFERENCES notes(id) ON DELETE CASCADE
);

-- Per-user snapshots and newest-first listing
CREATE INDEX IF NOT EXISTS idx_notes_user ON notes(user_id);
CREATE INDEX IF NOT EXISTS idx_notes_timestamp ON notes(timestamp);

CREATE INDEX IF NOT EXISTS idx_photos_note ON photos(note_id);
"#;
