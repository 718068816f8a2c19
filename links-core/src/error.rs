use thiserror::Error;

/// PostgreSQL SQLSTATE for `unique_violation`.
const PG_UNIQUE_VIOLATION: &str = "23505";

#[derive(Error, Debug)]
pub enum LinksError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Link type not found: {0}")]
    LinkTypeNotFound(String),

    #[error("Property not found: {0}")]
    PropertyNotFound(String),

    #[error("Property filter by slug requires a configured properties resolver")]
    PropertiesNotConfigured,

    #[error("Unique constraint failed: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("Invalid SQL identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<sqlx::Error> for LinksError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(PG_UNIQUE_VIOLATION) {
                return LinksError::UniqueViolation {
                    constraint: db_err.constraint().unwrap_or("unknown").to_string(),
                };
            }
        }
        LinksError::Database(err)
    }
}

impl LinksError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, LinksError::UniqueViolation { .. })
    }
}
