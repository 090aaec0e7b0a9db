mod choice;
pub mod forms;
mod id;
mod question;
mod user;

pub use choice::Choice;
pub use id::{ChoiceId, QuestionId, UserId};
pub use question::{Question, QuestionWithChoices};
pub use user::User;
