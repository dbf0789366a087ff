use clap::{Parser, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Entity store backend.
    #[arg(long, value_enum, default_value_t = StoreBackend::Postgres)]
    pub store: StoreBackend,
    /// Cache store backend.
    #[arg(long, value_enum, default_value_t = CacheBackend::Memory)]
    pub cache: CacheBackend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheBackend {
    Redis,
    Memory,
    Disabled,
}

impl StoreBackend {
    pub fn name(self) -> &'static str {
        match self {
            StoreBackend::Postgres => "postgres",
            StoreBackend::Memory => "memory",
        }
    }
}

impl CacheBackend {
    pub fn name(self) -> &'static str {
        match self {
            CacheBackend::Redis => "redis",
            CacheBackend::Memory => "memory",
            CacheBackend::Disabled => "disabled",
        }
    }
}
