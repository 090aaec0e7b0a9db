use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::polls;
use super::schema;

#[derive(Debug, Identifiable, Queryable, Selectable)]
#[diesel(table_name = schema::questions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Question {
    pub id: i32,
    pub question_text: String,
    pub pub_date: NaiveDateTime,
    pub author_id: Option<i32>,
}

impl From<Question> for polls::Question {
    fn from(Question { id, question_text, pub_date, author_id }: Question) -> Self {
        polls::Question {
            id: polls::QuestionId(id),
            question_text,
            pub_date: pub_date.and_utc(),
            author_id: author_id.map(polls::UserId),
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = schema::questions)]
pub struct NewQuestion<'a> {
    pub question_text: &'a str,
    pub pub_date: NaiveDateTime,
    pub author_id: Option<i32>,
}

#[derive(Debug, Associations, Identifiable, Queryable, Selectable)]
#[diesel(table_name = schema::choices)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(belongs_to(Question))]
pub struct Choice {
    pub id: i32,
    pub question_id: i32,
    pub choice_text: String,
    pub votes: i64,
}

impl From<Choice> for polls::Choice {
    fn from(Choice { id, question_id, choice_text, votes }: Choice) -> Self {
        polls::Choice {
            id: polls::ChoiceId(id),
            question_id: polls::QuestionId(question_id),
            choice_text,
            // the table's CHECK constraint keeps this non-negative
            votes: u64::try_from(votes).unwrap_or_default(),
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = schema::choices)]
pub struct NewChoice<'a> {
    pub question_id: i32,
    pub choice_text: &'a str,
    pub votes: i64,
}

#[derive(Debug, Identifiable, Queryable, Selectable)]
#[diesel(table_name = schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: i32,
    pub username: String,
}

impl From<User> for polls::User {
    fn from(User { id, username }: User) -> Self {
        polls::User::new(polls::UserId(id), username)
    }
}

#[derive(Insertable)]
#[diesel(table_name = schema::users)]
pub struct NewUser<'a> {
    pub username: &'a str,
}
