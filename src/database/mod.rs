pub mod gateway;
pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;

pub use gateway::{
    AccountGateway, ArticleGateway, DeleteResult, InsertResult, PageRequest, Paged,
    PublisherGateway, ReplaceOutcome, SubmitOutcome, UpdateResult,
};
pub use manager::{DatabaseError, DatabaseManager};
