use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use super::choice::Choice;
use super::id::{QuestionId, UserId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Question {
    pub id: QuestionId,
    pub question_text: String,
    pub pub_date: DateTime<Utc>,
    #[serde(skip)]
    pub author_id: Option<UserId>,
}

impl Question {
    /// True when `pub_date` lies within the day ending at `now`, both ends inclusive.
    pub fn was_published_recently(&self, now: DateTime<Utc>) -> bool {
        now - TimeDelta::days(1) <= self.pub_date && self.pub_date <= now
    }
}

/// A question together with its choices, ordered by choice id.
#[derive(Clone, Debug, Serialize)]
pub struct QuestionWithChoices {
    #[serde(flatten)]
    pub question: Question,
    pub choices: Vec<Choice>,
}

impl QuestionWithChoices {
    pub fn total_votes(&self) -> u64 {
        self.choices.iter().fold(0u64, |total, c| total.saturating_add(c.votes))
    }
}
