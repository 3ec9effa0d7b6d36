pub mod directory;
pub mod ledger;
pub mod manager;
pub mod schema;
pub mod seed;

pub use directory::PgDirectory;
pub use ledger::PgLedger;
pub use manager::{DatabaseError, DatabaseManager};
pub use seed::{seed, SeedError, SeedReport};
