use crate::config::Config;
use crate::error::DBError;
use crate::schema;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Connection, PgConnection, PgPool, Postgres, Transaction};
use tracing::{error, info, warn};

#[cfg(test)]
mod test;

/// Outcome of an idempotent ensure step.
#[derive(Debug, PartialEq, Eq)]
pub enum Ensure {
    Created,
    AlreadyExists,
}

/// Ensures the target database exists on the server.
///
/// Connects to the maintenance database as the admin role, probes
/// `pg_database` and only issues CREATE DATABASE when the probe comes up
/// empty. Safe to call on every startup; errors are reported, not raised.
pub async fn create_database(config: &Config) {
    match ensure_database(config).await {
        Ok(Ensure::Created) => info!("Database '{}' created", config.database()),
        Ok(Ensure::AlreadyExists) => info!("Database '{}' already exists", config.database()),
        Err(e) => error!("Failed creating database '{}': {}", config.database(), e),
    }
}

async fn ensure_database(config: &Config) -> Result<Ensure, DBError> {
    let name = config.database();
    if !valid_identifier(name) {
        return Err(DBError::InvalidIdentifier(name.to_owned()));
    }

    // No transaction here, CREATE DATABASE cannot run inside one.
    let mut conn = PgConnection::connect_with(&config.admin_connect_options()).await?;
    let outcome = ensure_database_stmnt(&mut conn, name).await;
    if outcome.is_ok() {
        conn.close().await?;
    }
    // on the error path drop releases the connection
    outcome
}

async fn ensure_database_stmnt(conn: &mut PgConnection, name: &str) -> Result<Ensure, DBError> {
    let exists = sqlx::query("SELECT 1 FROM pg_database WHERE datname = $1")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;
    if exists.is_some() {
        return Ok(Ensure::AlreadyExists);
    }

    // identifier got allowlisted by the caller
    sqlx::query(&format!("CREATE DATABASE {}", name))
        .execute(&mut *conn)
        .await?;
    Ok(Ensure::Created)
}

/// Connects to the target database as the application role.
/// The handle the presentation layer queries through as well.
pub async fn establish_db_connection(config: &Config) -> Option<PgPool> {
    match PgPoolOptions::new()
        .connect_with(config.connect_options())
        .await
    {
        Ok(pool) => Some(pool),
        Err(e) => {
            error!(
                "Failed connecting to database '{}': {}",
                config.database(),
                e
            );
            None
        }
    }
}

/// Brings the live schema up to the shape in [`crate::schema`].
///
/// All statements run in one transaction with a single commit at the end, a
/// failing statement aborts the remaining steps and rolls everything back.
/// Two provisioners racing each other are not coordinated; the duplicate
/// object error one of them may hit is reported like any other.
pub async fn create_tables(config: &Config) {
    let pool = match establish_db_connection(config).await {
        Some(pool) => pool,
        None => {
            warn!("Aborting table creation without a database connection");
            return;
        }
    };

    match provision_schema(&pool, config.user()).await {
        Ok(()) => match check_schema(&pool).await {
            Ok(()) => info!("Database tables created (if they did not exist yet)"),
            Err(e) => warn!("Schema verification failed: {}", e),
        },
        Err(e) => error!("Failed creating tables: {}", e),
    }
    pool.close().await;
}

async fn provision_schema(pool: &PgPool, owner: &str) -> Result<(), DBError> {
    if !valid_identifier(owner) {
        return Err(DBError::InvalidIdentifier(owner.to_owned()));
    }

    let mut tx = pool.begin().await?;

    // Tables first, in dependency-free order.
    for stmnt in schema::CREATE_TABLES.iter() {
        sqlx::query(stmnt).execute(&mut *tx).await?;
    }

    // Sequence wiring needs the owning tables from the step above.
    for stmnt in schema::CREATE_SEQUENCES.iter() {
        sqlx::query(stmnt).execute(&mut *tx).await?;
    }

    // Re-assigning the same owner is a no-op.
    for table in schema::TABLES.iter() {
        sqlx::query(&format!("ALTER TABLE public.{} OWNER TO {}", table, owner))
            .execute(&mut *tx)
            .await?;
    }

    for fk in schema::FOREIGN_KEYS.iter() {
        match ensure_constraint(&mut tx, fk).await? {
            Ensure::Created => info!("Constraint '{}' added", fk.name),
            Ensure::AlreadyExists => info!("Constraint '{}' already exists", fk.name),
        }
    }

    tx.commit().await?;
    Ok(())
}

async fn ensure_constraint(
    tx: &mut Transaction<'_, Postgres>,
    fk: &schema::ForeignKey,
) -> Result<Ensure, DBError> {
    let exists = sqlx::query(
        "SELECT 1 FROM pg_constraint c
            JOIN pg_class r ON r.oid = c.conrelid
            WHERE c.conname = $1 AND r.relname = $2",
    )
    .bind(fk.name)
    .bind(fk.table)
    .fetch_optional(&mut **tx)
    .await?;
    if exists.is_some() {
        return Ok(Ensure::AlreadyExists);
    }

    sqlx::query(fk.ddl).execute(&mut **tx).await?;
    Ok(Ensure::Created)
}

/// One trivial probe per provisioned table.
pub async fn check_schema(conn: &PgPool) -> Result<(), DBError> {
    for table in schema::TABLES.iter() {
        sqlx::query(&format!("SELECT count(*) FROM public.{}", table))
            .fetch_one(conn)
            .await?;
    }
    Ok(())
}

/// Conservative allowlist for the two identifiers that cannot be bound as
/// statement parameters (database name, owner role).
pub fn valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
