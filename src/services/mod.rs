pub mod articles;
pub mod catalog;
pub mod content;
pub mod error;
pub mod files;
pub mod ledger;
pub mod ownership;
pub mod paging;
pub mod posts;
pub mod qa;
pub mod resources;
pub mod toggles;
pub mod users;
pub mod views;

pub use articles::ArticleService;
pub use catalog::CatalogService;
pub use error::ForumError;
pub use files::{FileStore, LocalFileStore, StoredFile};
pub use posts::PostService;
pub use qa::QaService;
pub use resources::ResourceService;
pub use toggles::Toggled;
pub use users::UserService;
