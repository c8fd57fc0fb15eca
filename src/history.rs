use std::path::PathBuf;

use rusqlite::{params, Connection};

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct StoredMessage {
    pub role: String,
    pub content: String,
}

fn db_path() -> PathBuf {
    Config::get_config_dir().join("chat.sqlite")
}

fn open() -> anyhow::Result<Connection> {
    std::fs::create_dir_all(Config::get_config_dir())?;
    Ok(Connection::open(db_path())?)
}

fn now_epoch() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS conversations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            conversation_id INTEGER NOT NULL REFERENCES conversations(id),
            role TEXT NOT NULL,
            content TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )",
        [],
    )?;
    Ok(())
}

fn insert_conversation(conn: &Connection, title: &str) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO conversations (title, created_at) VALUES (?1, ?2)",
        params![title, now_epoch()],
    )?;
    Ok(conn.last_insert_rowid())
}

fn insert_message(
    conn: &Connection,
    conversation_id: i64,
    role: &str,
    content: &str,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO messages (conversation_id, role, content, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![conversation_id, role, content, now_epoch()],
    )?;
    Ok(())
}

fn select_latest_conversation(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let mut stmt = conn.prepare("SELECT id FROM conversations ORDER BY id DESC LIMIT 1")?;
    let mut rows = stmt.query([])?;
    if let Some(row) = rows.next()? {
        Ok(Some(row.get(0)?))
    } else {
        Ok(None)
    }
}

fn select_messages(conn: &Connection, conversation_id: i64) -> rusqlite::Result<Vec<StoredMessage>> {
    let mut stmt = conn.prepare(
        "SELECT role, content FROM messages WHERE conversation_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([conversation_id], |row| {
        Ok(StoredMessage {
            role: row.get(0)?,
            content: row.get(1)?,
        })
    })?;

    let mut messages = Vec::new();
    for r in rows {
        messages.push(r?);
    }
    Ok(messages)
}

pub fn init() -> anyhow::Result<()> {
    let conn = open()?;
    init_schema(&conn)?;
    Ok(())
}

pub fn start_conversation(title: &str) -> anyhow::Result<i64> {
    let conn = open()?;
    Ok(insert_conversation(&conn, title)?)
}

pub fn add_message(conversation_id: i64, role: &str, content: &str) -> anyhow::Result<()> {
    let conn = open()?;
    insert_message(&conn, conversation_id, role, content)?;
    Ok(())
}

pub fn latest_conversation() -> anyhow::Result<Option<i64>> {
    let conn = open()?;
    init_schema(&conn)?;
    Ok(select_latest_conversation(&conn)?)
}

pub fn messages(conversation_id: i64) -> anyhow::Result<Vec<StoredMessage>> {
    let conn = open()?;
    Ok(select_messages(&conn, conversation_id)?)
}

pub fn delete_conversation(conversation_id: i64) -> anyhow::Result<()> {
    let conn = open()?;
    delete_conversation_rows(&conn, conversation_id)?;
    Ok(())
}

fn delete_conversation_rows(conn: &Connection, conversation_id: i64) -> rusqlite::Result<()> {
    conn.execute(
        "DELETE FROM messages WHERE conversation_id = ?1",
        params![conversation_id],
    )?;
    conn.execute(
        "DELETE FROM conversations WHERE id = ?1",
        params![conversation_id],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_in_insertion_order() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let id = insert_conversation(&conn, "translate a note").unwrap();
        insert_message(&conn, id, "user", "hello").unwrap();
        insert_message(&conn, id, "assistant", "bonjour").unwrap();
        insert_message(&conn, id, "user", "thanks").unwrap();

        let messages = select_messages(&conn, id).unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[0].content, "hello");
        assert_eq!(messages[1].role, "assistant");
        assert_eq!(messages[2].content, "thanks");
    }

    #[test]
    fn test_latest_conversation_is_most_recent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        assert_eq!(select_latest_conversation(&conn).unwrap(), None);
        insert_conversation(&conn, "first").unwrap();
        let second = insert_conversation(&conn, "second").unwrap();
        assert_eq!(select_latest_conversation(&conn).unwrap(), Some(second));
    }

    #[test]
    fn test_delete_conversation_removes_messages() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let first = insert_conversation(&conn, "first").unwrap();
        let second = insert_conversation(&conn, "second").unwrap();
        insert_message(&conn, first, "user", "hello").unwrap();
        insert_message(&conn, second, "user", "kept").unwrap();

        delete_conversation_rows(&conn, first).unwrap();
        assert!(select_messages(&conn, first).unwrap().is_empty());
        assert_eq!(select_messages(&conn, second).unwrap().len(), 1);
        assert_eq!(select_latest_conversation(&conn).unwrap(), Some(second));
    }
}
