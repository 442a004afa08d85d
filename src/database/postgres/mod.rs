//! PostgreSQL-backed gateways sharing one pool.

mod accounts;
mod articles;
mod publishers;

pub use accounts::PgAccounts;
pub use articles::PgArticles;
pub use publishers::PgPublishers;
