use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] tickforge_core::ValidationError),

    #[error(transparent)]
    Fetch(#[from] tickforge_core::FetchError),

    #[error(transparent)]
    Clean(#[from] tickforge_core::CleanError),

    #[error(transparent)]
    Warehouse(#[from] tickforge_warehouse::WarehouseError),

    #[error(transparent)]
    Modeling(#[from] tickforge_ml::ModelingError),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error("csv export failed: {0}")]
    Export(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) | Self::Config(_) => 2,
            Self::Fetch(_) => 3,
            Self::Clean(_) => 4,
            Self::Warehouse(_) => 5,
            Self::Modeling(_) => 6,
            Self::Export(_) | Self::Io(_) => 10,
        }
    }
}
