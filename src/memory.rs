use crate::types::Message;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::Mutex;

/// The contract every history backend must fulfill.
///
/// # Contract
/// - `add_message` appends; nothing may reorder or drop previously added
///   messages except `clear`.
/// - `get_history` returns a snapshot — callers must not assume it reflects
///   later mutations.
/// - The store is a single-writer resource: only the owning agent mutates
///   it during a turn.
pub trait HistoryStore: Send + Sync {
    fn add_message(&mut self, message: Message);

    fn get_history(&self) -> Vec<Message>;

    fn clear(&mut self);
}

/// In-memory history backend. The history is lost when the value is
/// dropped — ideal for development, testing, and the simulator.
#[derive(Debug, Default)]
pub struct VolatileMemory {
    history: Vec<Message>,
}

impl VolatileMemory {
    pub fn new() -> Self {
        Self { history: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

impl HistoryStore for VolatileMemory {
    fn add_message(&mut self, message: Message) {
        self.history.push(message);
    }

    fn get_history(&self) -> Vec<Message> {
        self.history.clone()
    }

    fn clear(&mut self) {
        self.history.clear();
    }
}

/// SQLite-backed history store. Each message is one JSON row, keyed by a
/// session id so several conversations can share a database file.
///
/// Rows carry an insertion sequence rather than relying on rowid ordering,
/// and a timestamp for offline inspection. `clear` deletes only this
/// session's rows.
pub struct SqliteMemory {
    path:       PathBuf,
    session_id: String,
    conn:       Mutex<Connection>,
}

impl SqliteMemory {
    pub fn open(
        path: impl Into<PathBuf>,
        session_id: impl Into<String>,
    ) -> Result<Self, rusqlite::Error> {
        let path = path.into();
        let conn = Connection::open(&path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS messages (
                session_id TEXT NOT NULL,
                seq        INTEGER NOT NULL,
                message    TEXT NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (session_id, seq)
            )",
            [],
        )?;
        Ok(Self {
            path,
            session_id: session_id.into(),
            conn: Mutex::new(conn),
        })
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn next_seq(conn: &Connection, session_id: &str) -> Result<i64, rusqlite::Error> {
        conn.query_row(
            "SELECT COALESCE(MAX(seq), -1) + 1 FROM messages WHERE session_id = ?1",
            rusqlite::params![session_id],
            |row| row.get(0),
        )
    }
}

impl HistoryStore for SqliteMemory {
    fn add_message(&mut self, message: Message) {
        let json = match serde_json::to_string(&message) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize message, dropping");
                return;
            }
        };
        let conn = self.conn.lock().unwrap();
        let res = Self::next_seq(&conn, &self.session_id).and_then(|seq| {
            conn.execute(
                "INSERT INTO messages (session_id, seq, message, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    self.session_id,
                    seq,
                    json,
                    chrono::Utc::now().to_rfc3339()
                ],
            )
        });
        if let Err(e) = res {
            tracing::error!(error = %e, session = %self.session_id, "history insert failed");
        }
    }

    fn get_history(&self) -> Vec<Message> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = match conn.prepare(
            "SELECT message FROM messages WHERE session_id = ?1 ORDER BY seq ASC",
        ) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "history query failed");
                return Vec::new();
            }
        };
        let rows = stmt.query_map(rusqlite::params![self.session_id], |row| {
            row.get::<_, String>(0)
        });
        let mut history = Vec::new();
        if let Ok(rows) = rows {
            for row in rows.flatten() {
                match serde_json::from_str(&row) {
                    Ok(msg) => history.push(msg),
                    Err(e) => tracing::error!(error = %e, "skipping unreadable history row"),
                }
            }
        }
        history
    }

    fn clear(&mut self) {
        let conn = self.conn.lock().unwrap();
        if let Err(e) = conn.execute(
            "DELETE FROM messages WHERE session_id = ?1",
            rusqlite::params![self.session_id],
        ) {
            tracing::error!(error = %e, session = %self.session_id, "history clear failed");
        }
    }
}
