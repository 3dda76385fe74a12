mod catalog;
mod daily;
mod ids;
mod progress;
mod question;

pub use catalog::{Catalog, CatalogDocument, CatalogError};
pub use daily::DailyCounter;
pub use ids::QuestionId;
pub use progress::{Bucket, ProgressEntry};
pub use question::{AnswerOption, Question, QuestionDraft, QuestionError};
