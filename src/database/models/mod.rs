pub mod account;
pub mod article;
pub mod publisher;

pub use account::{Account, AccountPatch, AccountStats, NewAccount, PremiumActivation, Role};
pub use article::{Article, ArticleStatus, ArticleUpdate, DeclineRequest, NewArticle, PublishedFilter};
pub use publisher::{NewPublisher, Publisher};
