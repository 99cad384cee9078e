//! Embedded SQL migrations
//!
//! Each set is a list of (name, sql) pairs compiled in with include_str!
//! and applied in list order. The first entry of every set must be
//! `000_migrations.sql`, which creates the `sys_migrations` tracking table.
//!
//! To add a migration, create `NNN_description.sql` next to the others and
//! append it to the matching list.

/// Schema of the main database (bankhub.duckdb)
pub const MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    ("001_initial_schema.sql", include_str!("001_initial_schema.sql")),
];

/// Schema of the event log database (logs.duckdb)
pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("logs/000_migrations.sql")),
    ("001_initial_schema.sql", include_str!("logs/001_initial_schema.sql")),
];

/// Name of the bootstrap migration shared by every set
pub const BOOTSTRAP_MIGRATION: &str = "000_migrations.sql";
