//! DuckDB repository implementation

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use chrono::{NaiveDateTime, SubsecRound, Utc};
use duckdb::{params, Connection};
use rust_decimal::Decimal;

use crate::domain::result::{Error, Result, EMAIL_IN_USE, USERNAME_IN_USE};
use crate::domain::{Account, NewUser, Role, Transaction, TransactionType, User};
use crate::ports::CredentialStore;
use crate::services::{MigrationResult, MigrationService};

/// Main database file inside the data directory
pub const DB_FILENAME: &str = "bankhub.duckdb";

/// Maximum number of attempts when the database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Format used to write timestamps and to read back `::VARCHAR` casts
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const ACCOUNT_NUMBER_IN_USE: &str = "Account number is already in use";

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
        || lower.contains("could not set lock on file")
}

/// DuckDB reports UNIQUE and PRIMARY KEY violations as
/// `Duplicate key "column: value" violates unique constraint`
fn is_unique_violation(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    lower.contains("duplicate key") || lower.contains("violates unique constraint")
}

fn is_foreign_key_violation(err_msg: &str) -> bool {
    err_msg.to_lowercase().contains("foreign key")
}

/// Translate a failed user insert into the matching conflict
fn map_user_insert_error(e: duckdb::Error) -> Error {
    let msg = e.to_string();
    if !is_unique_violation(&msg) {
        return Error::database(msg);
    }
    match violated_column(&msg) {
        Some("email") => Error::conflict(EMAIL_IN_USE),
        Some(_) => Error::conflict(USERNAME_IN_USE),
        None if msg.contains("email") && !msg.contains("username") => {
            Error::conflict(EMAIL_IN_USE)
        }
        None => Error::conflict(USERNAME_IN_USE),
    }
}

/// Column named by the first `Duplicate key "column: value"` in the message
///
/// Only the text right after the marker is read; the value that follows may
/// contain anything the client submitted.
fn violated_column(err_msg: &str) -> Option<&str> {
    const MARKER: &str = "duplicate key \"";
    let start = err_msg.to_ascii_lowercase().find(MARKER)? + MARKER.len();
    let rest = &err_msg[start..];
    rest.split_once(':').map(|(column, _)| column.trim())
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .map_err(|e| Error::database(format!("Invalid timestamp '{}': {}", s, e)))
}

fn parse_decimal(s: &str) -> Result<Decimal> {
    Decimal::from_str(s).map_err(|e| Error::database(format!("Invalid decimal '{}': {}", s, e)))
}

/// Money columns are DECIMAL(19,2)
fn check_money_scale(field: &str, value: Decimal) -> Result<()> {
    if value.normalize().scale() > 2 {
        return Err(Error::validation_field(
            field,
            "cannot have more than two decimal places",
        ));
    }
    Ok(())
}

/// Raw user columns, converted once the connection is released
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password: String,
    first_name: String,
    last_name: String,
    role: String,
    created_at: String,
}

impl UserRow {
    fn into_user(self) -> Result<User> {
        Ok(User {
            id: self.id,
            role: Role::from_str(&self.role).map_err(Error::database)?,
            created_at: parse_timestamp(&self.created_at)?,
            username: self.username,
            email: self.email,
            password: self.password,
            first_name: self.first_name,
            last_name: self.last_name,
        })
    }
}

/// Users per role, as reported by the status summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleCount {
    pub role: Role,
    pub count: i64,
}

/// DuckDB repository implementation
///
/// One connection behind a mutex; every method takes the lock for the
/// duration of its statements.
pub struct DuckDbRepository {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl DuckDbRepository {
    /// Open (or create) the database file
    ///
    /// Retries with exponential backoff when the file is locked by another
    /// process, e.g. a running server while the CLI starts.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut attempt = 0;

        loop {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: db_path.to_path_buf(),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        tracing::warn!(
                            attempt = attempt + 1,
                            max_attempts = MAX_RETRIES,
                            delay_ms = delay.as_millis() as u64,
                            error = %err_msg,
                            "database busy, retrying"
                        );
                        thread::sleep(delay);
                        attempt += 1;
                        continue;
                    }
                    return Err(Error::database(format!(
                        "Failed to open {}: {}",
                        db_path.display(),
                        err_msg
                    )));
                }
            }
        }
    }

    /// Open a private in-memory database
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            conn: Mutex::new(Connection::open_in_memory()?),
            db_path: PathBuf::from(":memory:"),
        })
    }

    fn try_open_connection(db_path: &Path) -> duckdb::Result<Connection> {
        // Extensions are never needed; skip autoloading from ~/.duckdb
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Connection::open_with_flags(db_path, config)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::database(format!("Connection lock poisoned: {}", e)))
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Run pending schema migrations
    pub fn run_migrations(&self) -> anyhow::Result<MigrationResult> {
        let conn = self.lock()?;
        MigrationService::new(&conn).run_pending()
    }

    /// List migrations not yet applied, without applying them
    pub fn pending_migrations(&self) -> anyhow::Result<Vec<String>> {
        let conn = self.lock()?;
        MigrationService::new(&conn).get_pending()
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> anyhow::Result<()> {
        self.run_migrations()?;
        Ok(())
    }

    // === User operations ===

    fn find_user(&self, column: &'static str, value: &str) -> Result<Option<User>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT id, username, email, password, first_name, last_name, role, created_at::VARCHAR
             FROM users WHERE {} = ?",
            column
        );

        let row = conn.query_row(&sql, [value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                password: row.get(3)?,
                first_name: row.get(4)?,
                last_name: row.get(5)?,
                role: row.get(6)?,
                created_at: row.get(7)?,
            })
        });

        match row {
            Ok(row) => row.into_user().map(Some),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_user_count(&self) -> Result<i64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Count of users for every role, including roles with none
    pub fn count_users_by_role(&self) -> Result<Vec<RoleCount>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT role, COUNT(*) FROM users GROUP BY role")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<duckdb::Result<Vec<_>>>()?;

        let mut counts: Vec<RoleCount> = Role::ALL
            .iter()
            .map(|&role| RoleCount { role, count: 0 })
            .collect();
        for (role, count) in rows {
            let role = Role::from_str(&role).map_err(Error::database)?;
            if let Some(entry) = counts.iter_mut().find(|c| c.role == role) {
                entry.count = count;
            }
        }
        Ok(counts)
    }

    // === Account operations ===

    /// Insert a new account, returning it with its assigned id
    pub fn save_account(&self, account: &Account) -> Result<Account> {
        account
            .validate()
            .map_err(|reason| Error::validation_field("account", reason))?;

        let conn = self.lock()?;
        let id: i64 = conn.query_row("SELECT nextval('seq_accounts_id')", [], |row| row.get(0))?;
        conn.execute(
            "INSERT INTO accounts (id, account_number, balance) VALUES (?, ?, ?::DECIMAL(19, 2))",
            params![id, &account.account_number, account.balance.to_string()],
        )
        .map_err(|e| {
            let msg = e.to_string();
            if is_unique_violation(&msg) {
                Error::conflict(ACCOUNT_NUMBER_IN_USE)
            } else {
                Error::database(msg)
            }
        })?;

        Ok(Account {
            id: Some(id),
            ..account.clone()
        })
    }

    pub fn get_accounts(&self) -> Result<Vec<Account>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT id, account_number, balance::VARCHAR FROM accounts ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<duckdb::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(id, account_number, balance)| {
                Ok(Account {
                    id: Some(id),
                    account_number,
                    balance: parse_decimal(&balance)?,
                })
            })
            .collect()
    }

    pub fn get_account_count(&self) -> Result<i64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Sum of all account balances, exact
    pub fn get_total_balance(&self) -> Result<Decimal> {
        let conn = self.lock()?;
        let total: String = conn.query_row(
            "SELECT COALESCE(SUM(balance), 0)::VARCHAR FROM accounts",
            [],
            |row| row.get(0),
        )?;
        parse_decimal(&total)
    }

    // === Transaction operations ===

    /// Insert a new transaction, returning it with its assigned id
    pub fn save_transaction(&self, tx: &Transaction) -> Result<Transaction> {
        check_money_scale("amount", tx.amount)?;

        let conn = self.lock()?;
        let id: i64 =
            conn.query_row("SELECT nextval('seq_transactions_id')", [], |row| row.get(0))?;
        conn.execute(
            r#"INSERT INTO transactions (id, "type", amount, "date", account_id)
               VALUES (?, ?, ?::DECIMAL(19, 2), ?::TIMESTAMP, ?)"#,
            params![
                id,
                tx.kind.as_str(),
                tx.amount.to_string(),
                tx.date.format(TIMESTAMP_FORMAT).to_string(),
                tx.account_id,
            ],
        )
        .map_err(|e| {
            let msg = e.to_string();
            if is_foreign_key_violation(&msg) {
                Error::validation_field("accountId", "does not reference an existing account")
            } else {
                Error::database(msg)
            }
        })?;

        Ok(Transaction {
            id: Some(id),
            ..tx.clone()
        })
    }

    /// Transactions of one account, newest first
    pub fn get_transactions_by_account(&self, account_id: i64) -> Result<Vec<Transaction>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"SELECT id, "type", amount::VARCHAR, "date"::VARCHAR, account_id
               FROM transactions
               WHERE account_id = ?
               ORDER BY "date" DESC, id DESC"#,
        )?;
        let rows = stmt
            .query_map([account_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            })?
            .collect::<duckdb::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(id, kind, amount, date, account_id)| {
                Ok(Transaction {
                    id: Some(id),
                    kind: TransactionType::from_str(&kind).map_err(Error::database)?,
                    amount: parse_decimal(&amount)?,
                    date: parse_timestamp(&date)?,
                    account_id,
                })
            })
            .collect()
    }

    pub fn get_transaction_count(&self) -> Result<i64> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        Ok(count)
    }
}

impl CredentialStore for DuckDbRepository {
    fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.find_user("username", username)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find_user("email", email)
    }

    fn save(&self, user: NewUser) -> Result<User> {
        let created_at = Utc::now().naive_utc().trunc_subsecs(6);

        let conn = self.lock()?;
        let id: i64 = conn.query_row("SELECT nextval('seq_users_id')", [], |row| row.get(0))?;
        conn.execute(
            "INSERT INTO users (id, username, email, password, first_name, last_name, role, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?::TIMESTAMP)",
            params![
                id,
                &user.username,
                &user.email,
                &user.password,
                &user.first_name,
                &user.last_name,
                user.role.as_str(),
                created_at.format(TIMESTAMP_FORMAT).to_string(),
            ],
        )
        .map_err(map_user_insert_error)?;

        Ok(user.into_user(id, created_at))
    }
}
