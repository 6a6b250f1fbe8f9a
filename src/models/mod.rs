pub mod article;
pub mod catalog;
pub mod post;
pub mod question;
pub mod resource;
pub mod user;

pub use article::TechArticle;
pub use catalog::{Category, Tag};
pub use post::{Post, PostDetail, Reply};
pub use question::{Answer, Question, QuestionDetail, QuestionSort, QuestionStats};
pub use resource::LearningResource;
pub use user::{User, UserProfile, UserSummary};
