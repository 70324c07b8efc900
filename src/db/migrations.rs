use anyhow::Context;
use rusqlite::Connection;

/// Ordered schema migrations, applied once each.
const MIGRATIONS: &[(&str, &str)] = &[(
    "001_users.sql",
    "CREATE TABLE IF NOT EXISTS users (
        phone_number TEXT PRIMARY KEY,
        is_new_number TEXT NOT NULL DEFAULT 'FALSE',
        timezone TEXT NOT NULL,
        first_session_status TEXT NOT NULL DEFAULT 'not_scheduled',
        recurring_session_status TEXT NOT NULL DEFAULT 'not_scheduled',
        recurring_session_count INTEGER NOT NULL DEFAULT 0,
        insurance_status TEXT NOT NULL DEFAULT 'not_submitted',
        name TEXT NOT NULL DEFAULT '',
        email TEXT NOT NULL DEFAULT ''
    );",
)];

pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .context("failed to create migrations table")?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _migrations WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .context("failed to check migration status")?;

        if already_applied {
            continue;
        }

        conn.execute_batch(sql)
            .with_context(|| format!("failed to apply migration: {name}"))?;

        conn.execute("INSERT INTO _migrations (name) VALUES (?1)", [name])
            .with_context(|| format!("failed to record migration: {name}"))?;

        tracing::info!("applied migration: {name}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let applied: i64 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(applied, MIGRATIONS.len() as i64);
    }
}
