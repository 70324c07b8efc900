use anyhow::Context;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Type, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};

use crate::models::user::flag;
use crate::models::{InsuranceStatus, SessionStatus, UserRecord, UserUpdate};

use super::{migrations, RegistryError, UserRegistry};

const SELECT_USER: &str = "SELECT is_new_number, timezone, first_session_status, recurring_session_status,
        recurring_session_count, insurance_status, name, email, phone_number
     FROM users WHERE phone_number = ?1";

/// Registry stored in a SQLite table; each mutation is its own transaction.
pub struct SqliteRegistry {
    conn: Connection,
    default_timezone: String,
}

impl SqliteRegistry {
    pub fn open(path: &str, default_timezone: &str) -> anyhow::Result<Self> {
        let conn = Connection::open(path).context("failed to open database")?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("failed to set database pragmas")?;

        migrations::run_migrations(&conn)?;

        Ok(Self {
            conn,
            default_timezone: default_timezone.to_string(),
        })
    }
}

impl ToSql for SessionStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for SessionStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        SessionStatus::parse(s)
            .ok_or_else(|| FromSqlError::Other(format!("invalid session status: {s}").into()))
    }
}

fn row_to_user(row: &Row) -> rusqlite::Result<UserRecord> {
    let flag_str: String = row.get(0)?;
    let is_new_number = flag::parse(&flag_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            Type::Text,
            format!("invalid flag: {flag_str}").into(),
        )
    })?;

    Ok(UserRecord {
        is_new_number,
        timezone: row.get(1)?,
        first_session_status: row.get(2)?,
        recurring_session_status: row.get(3)?,
        recurring_session_count: row.get(4)?,
        insurance_status: InsuranceStatus::from(row.get::<_, String>(5)?),
        name: row.get(6)?,
        email: row.get(7)?,
        phone_number: row.get(8)?,
    })
}

fn select_user(conn: &Connection, phone: &str) -> rusqlite::Result<Option<UserRecord>> {
    conn.query_row(SELECT_USER, [phone], row_to_user).optional()
}

impl UserRegistry for SqliteRegistry {
    fn get(&self, phone: &str) -> Result<Option<UserRecord>, RegistryError> {
        Ok(select_user(&self.conn, phone)?)
    }

    fn lookup_or_create(&mut self, phone: &str) -> Result<UserRecord, RegistryError> {
        let tx = self.conn.transaction()?;
        let created = insert_default(&tx, phone, &self.default_timezone)?;
        let user = select_user(&tx, phone)?.ok_or_else(|| RegistryError::NotFound(phone.to_string()))?;
        tx.commit()?;

        if created {
            tracing::info!(phone, "created user record");
        }
        Ok(user)
    }

    fn update(&mut self, phone: &str, changes: &UserUpdate) -> Result<UserRecord, RegistryError> {
        let tx = self.conn.transaction()?;

        let mut user =
            select_user(&tx, phone)?.ok_or_else(|| RegistryError::NotFound(phone.to_string()))?;
        changes.apply(&mut user);
        write_user(&tx, &user)?;
        tx.commit()?;

        Ok(user)
    }

    fn upsert_with(
        &mut self,
        phone: &str,
        change: &dyn Fn(&UserRecord) -> UserUpdate,
    ) -> Result<UserRecord, RegistryError> {
        let tx = self.conn.transaction()?;
        let created = insert_default(&tx, phone, &self.default_timezone)?;

        let mut user =
            select_user(&tx, phone)?.ok_or_else(|| RegistryError::NotFound(phone.to_string()))?;
        change(&user).apply(&mut user);
        write_user(&tx, &user)?;
        tx.commit()?;

        if created {
            tracing::info!(phone, "created user record");
        }
        Ok(user)
    }
}

/// Inserts the default record unless `phone` exists. Returns whether it did.
fn insert_default(conn: &Connection, phone: &str, timezone: &str) -> rusqlite::Result<bool> {
    let default = UserRecord::new_default(phone, timezone);
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO users (phone_number, is_new_number, timezone, first_session_status,
            recurring_session_status, recurring_session_count, insurance_status, name, email)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            default.phone_number,
            flag::as_str(default.is_new_number),
            default.timezone,
            default.first_session_status,
            default.recurring_session_status,
            default.recurring_session_count,
            default.insurance_status.as_str(),
            default.name,
            default.email,
        ],
    )?;
    Ok(inserted > 0)
}

fn write_user(conn: &Connection, user: &UserRecord) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE users SET is_new_number = ?2, timezone = ?3, first_session_status = ?4,
            recurring_session_status = ?5, recurring_session_count = ?6,
            insurance_status = ?7, name = ?8, email = ?9
         WHERE phone_number = ?1",
        params![
            user.phone_number,
            flag::as_str(user.is_new_number),
            user.timezone,
            user.first_session_status,
            user.recurring_session_status,
            user.recurring_session_count,
            user.insurance_status.as_str(),
            user.name,
            user.email,
        ],
    )?;
    Ok(())
}
