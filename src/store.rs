use rust_decimal::Decimal;
use sqlx::{Connection, FromRow, SqliteConnection};
use thiserror::Error;
use tracing::debug;

/// A bank account record, keyed by account number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub acc_no: String,
    pub name: String,
    pub acc_type: String,
    pub balance: Decimal,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Could not reach the account database: {0}")]
    Connection(#[source] sqlx::Error),
    #[error("Account number already exists!")]
    DuplicateKey,
    #[error("Insufficient balance!")]
    InsufficientFunds,
    #[error("Account {0} does not exist!")]
    NotFound(String),
    #[error("Stored balance for account {0} is not a number")]
    MalformedBalance(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

// SQLite has no exact decimal column type; balances are kept as canonical
// Decimal text so the scale round-trips (500.00 + 50 lists as 550.00).
#[derive(FromRow)]
struct AccountRow {
    acc_no: String,
    name: String,
    acc_type: String,
    balance: String,
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, StoreError> {
        let balance = row
            .balance
            .parse()
            .map_err(|_| StoreError::MalformedBalance(row.acc_no.clone()))?;
        Ok(Account {
            acc_no: row.acc_no,
            name: row.name,
            acc_type: row.acc_type,
            balance,
        })
    }
}

/// Issues SQL against the accounts table, one fresh connection per
/// operation. The connection is dropped when the operation returns,
/// error paths included.
pub struct Gateway {
    url: String,
}

impl Gateway {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    async fn connect(&self) -> Result<SqliteConnection, StoreError> {
        SqliteConnection::connect(&self.url)
            .await
            .map_err(StoreError::Connection)
    }

    pub async fn init_schema(&self) -> Result<(), StoreError> {
        let mut conn = self.connect().await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS accounts (
                acc_no TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                acc_type TEXT NOT NULL,
                balance TEXT NOT NULL
            )",
        )
        .execute(&mut conn)
        .await?;
        Ok(())
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let mut conn = self.connect().await?;
        let rows: Vec<AccountRow> =
            sqlx::query_as("SELECT acc_no, name, acc_type, balance FROM accounts")
                .fetch_all(&mut conn)
                .await?;
        rows.into_iter().map(Account::try_from).collect()
    }

    pub async fn create_account(&self, account: &Account) -> Result<(), StoreError> {
        let mut conn = self.connect().await?;
        debug!(acc_no = %account.acc_no, "inserting account");
        sqlx::query("INSERT INTO accounts (acc_no, name, acc_type, balance) VALUES (?, ?, ?, ?)")
            .bind(&account.acc_no)
            .bind(&account.name)
            .bind(&account.acc_type)
            .bind(account.balance.to_string())
            .execute(&mut conn)
            .await
            .map_err(map_insert_err)?;
        Ok(())
    }

    /// Overwrites name, type and balance for the given account number.
    /// A missing row is a silent no-op; callers guard by requiring a
    /// table selection first.
    pub async fn update_account(&self, account: &Account) -> Result<(), StoreError> {
        let mut conn = self.connect().await?;
        debug!(acc_no = %account.acc_no, "updating account");
        sqlx::query("UPDATE accounts SET name = ?, acc_type = ?, balance = ? WHERE acc_no = ?")
            .bind(&account.name)
            .bind(&account.acc_type)
            .bind(account.balance.to_string())
            .bind(&account.acc_no)
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    pub async fn delete_account(&self, acc_no: &str) -> Result<(), StoreError> {
        let mut conn = self.connect().await?;
        debug!(acc_no, "deleting account");
        sqlx::query("DELETE FROM accounts WHERE acc_no = ?")
            .bind(acc_no)
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    pub async fn deposit(&self, acc_no: &str, amount: Decimal) -> Result<(), StoreError> {
        let mut conn = self.connect().await?;
        let balance = fetch_balance(&mut conn, acc_no).await?;
        store_balance(&mut conn, acc_no, balance + amount).await
    }

    // Read-then-write in two statements with no transaction; concurrent
    // withdrawals from the same account can race.
    pub async fn withdraw(&self, acc_no: &str, amount: Decimal) -> Result<(), StoreError> {
        let mut conn = self.connect().await?;
        let balance = fetch_balance(&mut conn, acc_no).await?;
        if balance < amount {
            return Err(StoreError::InsufficientFunds);
        }
        store_balance(&mut conn, acc_no, balance - amount).await
    }

    pub async fn get_balance(&self, acc_no: &str) -> Result<(String, Decimal), StoreError> {
        let mut conn = self.connect().await?;
        let row: Option<(String, String)> =
            sqlx::query_as("SELECT name, balance FROM accounts WHERE acc_no = ?")
                .bind(acc_no)
                .fetch_optional(&mut conn)
                .await?;
        let (name, stored) = row.ok_or_else(|| StoreError::NotFound(acc_no.to_owned()))?;
        let balance = stored
            .parse()
            .map_err(|_| StoreError::MalformedBalance(acc_no.to_owned()))?;
        Ok((name, balance))
    }
}

fn map_insert_err(e: sqlx::Error) -> StoreError {
    if e.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
    {
        StoreError::DuplicateKey
    } else {
        StoreError::Database(e)
    }
}

async fn fetch_balance(conn: &mut SqliteConnection, acc_no: &str) -> Result<Decimal, StoreError> {
    let stored: Option<String> = sqlx::query_scalar("SELECT balance FROM accounts WHERE acc_no = ?")
        .bind(acc_no)
        .fetch_optional(&mut *conn)
        .await?;
    let stored = stored.ok_or_else(|| StoreError::NotFound(acc_no.to_owned()))?;
    stored
        .parse()
        .map_err(|_| StoreError::MalformedBalance(acc_no.to_owned()))
}

async fn store_balance(
    conn: &mut SqliteConnection,
    acc_no: &str,
    balance: Decimal,
) -> Result<(), StoreError> {
    sqlx::query("UPDATE accounts SET balance = ? WHERE acc_no = ?")
        .bind(balance.to_string())
        .bind(acc_no)
        .execute(conn)
        .await?;
    Ok(())
}
