#![allow(dead_code)]

use parking_lot::Mutex;
use ripple_core::descriptor::{DeleteQuery, InsertQuery, Query, UpdateQuery};
use ripple_database::{
    ContentValues, Database, DefaultDeleteResolver, DefaultGetResolver, DefaultPutResolver,
    Error, LiveQuery, Result, Row, SchedulerConfig, Subscription, TypeMapping,
};
use ripple_storage::SqliteStore;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const USERS: &str = "users";
pub const TWEETS: &str = "tweets";

const SCHEMA: &str = "
    CREATE TABLE users (
        id INTEGER PRIMARY KEY,
        email TEXT NOT NULL UNIQUE
    );
    CREATE TABLE tweets (
        id INTEGER PRIMARY KEY,
        author_id INTEGER NOT NULL,
        content TEXT NOT NULL
    );
";

#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub id: Option<i64>,
    pub email: String,
}

impl User {
    pub fn new(id: Option<i64>, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
        }
    }

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.get_opt_i64("id")?,
            email: row.get_str("email")?.to_string(),
        })
    }
}

/// `id = ?` selection; an unsaved user selects nothing.
fn by_id(user: &User) -> i64 {
    user.id.unwrap_or(-1)
}

pub fn user_mapping() -> TypeMapping<User> {
    TypeMapping::builder()
        .get_resolver(DefaultGetResolver::new(User::from_row))
        .put_resolver(DefaultPutResolver::new(
            |_: &User| InsertQuery::builder().table(USERS).build(),
            |u: &User| {
                UpdateQuery::builder()
                    .table(USERS)
                    .where_clause("id = ?")
                    .where_args([by_id(u)])
                    .build()
            },
            |u: &User| {
                let mut values = ContentValues::new().with("email", u.email.as_str());
                if let Some(id) = u.id {
                    values.put("id", id);
                }
                values
            },
        ))
        .delete_resolver(DefaultDeleteResolver::new(|u: &User| {
            DeleteQuery::builder()
                .table(USERS)
                .where_clause("id = ?")
                .where_args([by_id(u)])
                .build()
        }))
        .build()
        .unwrap()
}

pub fn store() -> SqliteStore {
    let store = SqliteStore::open_in_memory().unwrap();
    store.execute_batch(SCHEMA).unwrap();
    store
}

pub fn database() -> Database {
    database_with(SchedulerConfig::Immediate)
}

pub fn database_with(scheduler: SchedulerConfig) -> Database {
    Database::builder()
        .store(store())
        .scheduler(scheduler)
        .add_type_mapping(user_mapping())
        .build()
        .unwrap()
}

pub fn users(count: usize, offset: usize) -> Vec<User> {
    (offset..offset + count)
        .map(|i| User::new(Some(i as i64 + 1), format!("user{}@example.com", i)))
        .collect()
}

pub fn all_users() -> Query {
    Query::builder().table(USERS).order_by("id").build().unwrap()
}

pub fn put_users(db: &Database, users: Vec<User>) {
    db.put().objects(users).prepare().execute_blocking().unwrap();
}

pub fn get_users(db: &Database) -> Vec<User> {
    db.get()
        .list_of_objects::<User>()
        .with_query(all_users())
        .prepare()
        .unwrap()
        .execute_blocking()
        .unwrap()
}

/// Everything a live query emitted, in order.
pub struct Recorder<R> {
    pub values: Arc<Mutex<Vec<R>>>,
    pub errors: Arc<Mutex<Vec<Error>>>,
    pub subscription: Subscription,
}

impl<R: Clone + Send + 'static> Recorder<R> {
    pub fn subscribe(query: &LiveQuery<R>) -> Self {
        let values = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(Vec::new()));
        let (v, e) = (values.clone(), errors.clone());
        let subscription = query.subscribe(
            move |value| v.lock().push(value),
            move |err| e.lock().push(err),
        );
        Self {
            values,
            errors,
            subscription,
        }
    }

    pub fn values(&self) -> Vec<R> {
        self.values.lock().clone()
    }

    pub fn wait_for(&self, count: usize) -> bool {
        wait_until(|| self.values.lock().len() >= count)
    }
}

pub fn wait_until(mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    done()
}
