use serde::Serialize;
use super::id::{ChoiceId, QuestionId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub id: ChoiceId,
    #[serde(skip)]
    pub question_id: QuestionId,
    pub choice_text: String,
    pub votes: u64,
}

impl Choice {
    /// "vote" or "votes", for the results page.
    pub fn votes_label(&self) -> &'static str {
        if self.votes == 1 { "vote" } else { "votes" }
    }
}
