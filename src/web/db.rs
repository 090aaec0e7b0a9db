pub mod models;
pub mod schema;

use std::time::Duration;

use chrono::{DateTime, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection, Pool};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::{debug, info};

use crate::error::AppError;
use crate::polls::forms::CreateQuestion;
use crate::polls::{ChoiceId, Question, QuestionId, QuestionWithChoices, User, UserId};
use schema::{choices, questions, users};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// How many questions the index page lists.
pub const LATEST_LIMIT: i64 = 5;

const IN_MEMORY: &str = ":memory:";

#[derive(Debug)]
struct ConnectionOptions;

impl CustomizeConnection<SqliteConnection, r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        // cascades are only honoured with foreign keys switched on per connection
        conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
            .map_err(r2d2::Error::QueryError)
    }
}

/// Handle to the poll database, shared by every request.
#[derive(Clone)]
pub struct Store {
    pool: Pool<ConnectionManager<SqliteConnection>>,
}

impl Store {
    /// Opens the database and applies any pending migrations.
    ///
    /// An in-memory database lives and dies with its connection, so it is
    /// always served from a single, never recycled connection.
    pub fn open(database_url: &str, pool_size: u32) -> Result<Store, AppError> {
        let manager = ConnectionManager::<SqliteConnection>::new(database_url);
        let builder = Pool::builder()
            .connection_customizer(Box::new(ConnectionOptions))
            .connection_timeout(Duration::from_secs(10));
        let builder = if database_url == IN_MEMORY {
            builder.max_size(1).max_lifetime(None).idle_timeout(None)
        } else {
            builder.max_size(pool_size.max(1))
        };
        let pool = builder.build(manager)?;

        let mut conn = pool.get()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|err| AppError::Migration(err.to_string()))?;
        info!(database_url, migrations = applied.len(), "Database ready");
        drop(conn);

        Ok(Store { pool })
    }

    /// Runs blocking diesel work on tokio's blocking pool.
    pub(crate) async fn run<F, T>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, AppError> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut conn)
        })
        .await?
    }

    /// The most recently published questions, newest first.
    pub async fn latest_published(&self, now: DateTime<Utc>) -> Result<Vec<Question>, AppError> {
        self.run(move |conn| {
            let rows: Vec<models::Question> = questions::table
                .filter(questions::pub_date.le(now.naive_utc()))
                .order((questions::pub_date.desc(), questions::id.desc()))
                .limit(LATEST_LIMIT)
                .select(models::Question::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
        .await
    }

    /// Fetches a question and its choices, unless it is missing or not yet published.
    pub async fn published_question(
        &self,
        id: QuestionId,
        now: DateTime<Utc>,
    ) -> Result<Option<QuestionWithChoices>, AppError> {
        self.run(move |conn| {
            let question = questions::table
                .find(id.0)
                .filter(questions::pub_date.le(now.naive_utc()))
                .select(models::Question::as_select())
                .first::<models::Question>(conn)
                .optional()?;
            let Some(question) = question else {
                return Ok(None);
            };

            let choices: Vec<models::Choice> = models::Choice::belonging_to(&question)
                .order(choices::id.asc())
                .select(models::Choice::as_select())
                .load(conn)?;

            Ok(Some(QuestionWithChoices {
                question: question.into(),
                choices: choices.into_iter().map(Into::into).collect(),
            }))
        })
        .await
    }

    /// Adds one vote to the choice, in a single statement so concurrent votes
    /// are never lost. Returns false when the choice does not belong to the question.
    pub async fn cast_vote(&self, question_id: QuestionId, choice_id: ChoiceId) -> Result<bool, AppError> {
        self.run(move |conn| {
            let updated = diesel::update(
                choices::table
                    .filter(choices::id.eq(choice_id.0))
                    .filter(choices::question_id.eq(question_id.0)),
            )
            .set(choices::votes.eq(choices::votes + 1))
            .execute(conn)?;
            Ok(updated == 1)
        })
        .await
    }

    /// Inserts a question and all of its choices in one transaction.
    pub async fn create_question(
        &self,
        create: CreateQuestion,
        author: Option<UserId>,
        pub_date: DateTime<Utc>,
    ) -> Result<QuestionId, AppError> {
        self.run(move |conn| {
            conn.transaction::<_, AppError, _>(|conn| {
                let id = diesel::insert_into(questions::table)
                    .values(&models::NewQuestion {
                        question_text: &create.question_text,
                        pub_date: pub_date.naive_utc(),
                        author_id: author.map(|a| a.0),
                    })
                    .returning(questions::id)
                    .get_result::<i32>(conn)?;

                let new_choices: Vec<models::NewChoice> = create
                    .choices
                    .iter()
                    .map(|text| models::NewChoice {
                        question_id: id,
                        choice_text: text,
                        votes: 0,
                    })
                    .collect();
                if !new_choices.is_empty() {
                    diesel::insert_into(choices::table)
                        .values(&new_choices)
                        .execute(conn)?;
                }
                debug!(question_id = id, choices = new_choices.len(), "Inserted question");

                Ok(QuestionId(id))
            })
        })
        .await
    }

    /// Every question the user authored, newest first, future-dated ones included.
    pub async fn questions_by_author(&self, author: UserId) -> Result<Vec<Question>, AppError> {
        self.run(move |conn| {
            let rows: Vec<models::Question> = questions::table
                .filter(questions::author_id.eq(author.0))
                .order((questions::pub_date.desc(), questions::id.desc()))
                .select(models::Question::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
        .await
    }

    /// Resolves a username to its account, creating the account on first sight.
    pub async fn find_or_create_user(&self, username: String) -> Result<User, AppError> {
        self.run(move |conn| {
            diesel::insert_or_ignore_into(users::table)
                .values(&models::NewUser { username: &username })
                .execute(conn)?;
            let user: models::User = users::table
                .filter(users::username.eq(&username))
                .select(models::User::as_select())
                .first(conn)?;
            Ok(user.into())
        })
        .await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::TimeDelta;
    use pretty_assertions::assert_eq;

    use super::*;

    pub(crate) fn memory_store() -> Store {
        Store::open(IN_MEMORY, 1).expect("in-memory database")
    }

    pub(crate) async fn create(store: &Store, text: &str, choices: &[&str], days: i64) -> QuestionId {
        let create = CreateQuestion {
            question_text: text.to_string(),
            choices: choices.iter().map(|c| c.to_string()).collect(),
        };
        store
            .create_question(create, None, Utc::now() + TimeDelta::days(days))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn latest_is_newest_first_and_limited() {
        let store = memory_store();
        for days in [-30, -5, -1, -10, -20, -2, -40] {
            create(&store, &format!("{days} days"), &[], days).await;
        }
        create(&store, "future", &[], 3).await;

        let latest = store.latest_published(Utc::now()).await.unwrap();
        let texts: Vec<&str> = latest.iter().map(|q| q.question_text.as_str()).collect();
        assert_eq!(texts, vec!["-1 days", "-2 days", "-5 days", "-10 days", "-20 days"]);
    }

    #[tokio::test]
    async fn published_question_hides_future_and_missing() {
        let store = memory_store();
        let past = create(&store, "past", &["a", "b"], -1).await;
        let future = create(&store, "future", &["a", "b"], 5).await;
        let now = Utc::now();

        let found = store.published_question(past, now).await.unwrap().unwrap();
        assert_eq!(found.question.question_text, "past");
        let texts: Vec<&str> = found.choices.iter().map(|c| c.choice_text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b"]);
        assert!(found.choices.iter().all(|c| c.votes == 0 && c.question_id == past));

        assert!(store.published_question(future, now).await.unwrap().is_none());
        assert!(store.published_question(QuestionId(999), now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn vote_only_counts_choices_of_the_question() {
        let store = memory_store();
        let first = create(&store, "first", &["a", "b"], -1).await;
        let second = create(&store, "second", &["c"], -1).await;
        let now = Utc::now();

        let first_choices = store.published_question(first, now).await.unwrap().unwrap().choices;
        let other_choice = store.published_question(second, now).await.unwrap().unwrap().choices[0].id;

        assert!(store.cast_vote(first, first_choices[1].id).await.unwrap());
        assert!(store.cast_vote(first, first_choices[1].id).await.unwrap());
        assert!(!store.cast_vote(first, other_choice).await.unwrap());
        assert!(!store.cast_vote(first, ChoiceId(12345)).await.unwrap());

        let votes: Vec<u64> = store
            .published_question(first, now)
            .await
            .unwrap()
            .unwrap()
            .choices
            .iter()
            .map(|c| c.votes)
            .collect();
        assert_eq!(votes, vec![0, 2]);
        let other = store.published_question(second, now).await.unwrap().unwrap();
        assert_eq!(other.total_votes(), 0);
    }

    #[tokio::test]
    async fn vote_counter_grows_past_32_bits() {
        let store = memory_store();
        let id = create(&store, "popular", &["a"], -1).await;
        let choice = store.published_question(id, Utc::now()).await.unwrap().unwrap().choices[0].id;
        store
            .run(move |conn| {
                diesel::update(choices::table.find(choice.0))
                    .set(choices::votes.eq(i64::from(i32::MAX)))
                    .execute(conn)?;
                Ok(())
            })
            .await
            .unwrap();

        assert!(store.cast_vote(id, choice).await.unwrap());
        let poll = store.published_question(id, Utc::now()).await.unwrap().unwrap();
        assert_eq!(poll.choices[0].votes, 2_147_483_648);
        assert_eq!(poll.total_votes(), 2_147_483_648);
    }

    #[tokio::test]
    async fn users_are_created_once() {
        let store = memory_store();
        let alice = store.find_or_create_user(String::from("alice")).await.unwrap();
        let again = store.find_or_create_user(String::from("alice")).await.unwrap();
        let bob = store.find_or_create_user(String::from("bob")).await.unwrap();

        assert_eq!(alice, again);
        assert_ne!(alice.id, bob.id);
        assert_eq!(bob.username, "bob");
    }

    #[tokio::test]
    async fn questions_by_author_filters_and_orders() {
        let store = memory_store();
        let alice = store.find_or_create_user(String::from("alice")).await.unwrap();
        let bob = store.find_or_create_user(String::from("bob")).await.unwrap();
        let now = Utc::now();
        let older = CreateQuestion { question_text: String::from("older"), choices: vec![] };
        let newer = CreateQuestion { question_text: String::from("newer"), choices: vec![] };
        let bobs = CreateQuestion { question_text: String::from("bob's"), choices: vec![] };

        store.create_question(older, Some(alice.id), now - TimeDelta::days(2)).await.unwrap();
        store.create_question(newer, Some(alice.id), now).await.unwrap();
        store.create_question(bobs, Some(bob.id), now).await.unwrap();

        let mine = store.questions_by_author(alice.id).await.unwrap();
        let texts: Vec<&str> = mine.iter().map(|q| q.question_text.as_str()).collect();
        assert_eq!(texts, vec!["newer", "older"]);
        assert!(mine.iter().all(|q| q.author_id == Some(alice.id)));
    }

    #[tokio::test]
    async fn deleting_a_question_removes_its_choices() {
        let store = memory_store();
        let id = create(&store, "doomed", &["a", "b", "c"], -1).await;
        create(&store, "kept", &["d"], -1).await;

        let remaining = store
            .run(move |conn| {
                diesel::delete(questions::table.find(id.0)).execute(conn)?;
                Ok(choices::table.count().get_result::<i64>(conn)?)
            })
            .await
            .unwrap();
        assert_eq!(remaining, 1);
    }
}
