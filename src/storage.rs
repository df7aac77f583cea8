//! Durable preferences. The only thing persisted across sessions is the
//! theme choice.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

use crate::render::theme::Theme;

pub struct PrefStore {
    conn: Connection,
}

impl PrefStore {
    pub fn new(path: &str) -> Result<Self> {
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    pub fn init(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "BEGIN;
            CREATE TABLE IF NOT EXISTS preferences (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            COMMIT;",
        )?;
        Ok(())
    }

    pub fn load_theme(&self) -> Result<Option<Theme>> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM preferences WHERE key = 'theme'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.as_deref().and_then(Theme::parse))
    }

    pub fn save_theme(&mut self, theme: Theme) -> Result<()> {
        self.conn.execute(
            "INSERT INTO preferences (key, value) VALUES ('theme', ?1)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![theme.as_str()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.db");
        let mut store = PrefStore::new(path.to_str().unwrap()).unwrap();
        store.init().unwrap();

        assert_eq!(store.load_theme().unwrap(), None, "fresh store has no theme");
        store.save_theme(Theme::Dark).unwrap();
        assert_eq!(store.load_theme().unwrap(), Some(Theme::Dark));
        store.save_theme(Theme::Light).unwrap();
        assert_eq!(store.load_theme().unwrap(), Some(Theme::Light), "upsert overwrites");
    }

    #[test]
    fn unknown_stored_value_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.db");
        let mut store = PrefStore::new(path.to_str().unwrap()).unwrap();
        store.init().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO preferences (key, value) VALUES ('theme', 'sepia')",
                [],
            )
            .unwrap();
        assert_eq!(store.load_theme().unwrap(), None);
    }
}
