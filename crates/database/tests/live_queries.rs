mod common;

use common::*;
use ripple_core::descriptor::{DeleteQuery, Query, RawQuery};
use ripple_core::table_set;
use ripple_database::{Changes, Error, SchedulerConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

fn observe_users(db: &ripple_database::Database) -> Recorder<Vec<User>> {
    let prepared = db
        .get()
        .list_of_objects::<User>()
        .with_query(all_users())
        .prepare()
        .unwrap();
    Recorder::subscribe(&prepared.observe())
}

#[test]
fn insert_emission() {
    let db = database();
    let first = users(10, 0);
    let second = users(10, 10);
    put_users(&db, first.clone());

    let recorder = observe_users(&db);
    put_users(&db, second.clone());

    let mut all = first.clone();
    all.extend(second);
    assert_eq!(recorder.values(), vec![first, all]);
    assert!(recorder.errors.lock().is_empty());
}

#[test]
fn update_emission() {
    let db = database();
    let original = users(10, 0);
    put_users(&db, original.clone());

    let recorder = observe_users(&db);
    let updated: Vec<User> = original
        .iter()
        .map(|u| User::new(u.id, format!("new+{}", u.email)))
        .collect();
    let results = db
        .put()
        .objects(updated.clone())
        .prepare()
        .execute_blocking()
        .unwrap();

    assert_eq!(results.number_of_updates(), 10);
    assert_eq!(results.number_of_inserts(), 0);
    assert_eq!(recorder.values(), vec![original, updated]);
}

#[test]
fn delete_emission() {
    let db = database();
    let all = users(20, 0);
    put_users(&db, all.clone());

    let recorder = observe_users(&db);
    let (to_delete, to_keep) = all.split_at(10);
    let results = db
        .delete()
        .objects(to_delete.to_vec())
        .prepare()
        .execute_blocking()
        .unwrap();

    assert_eq!(results.number_of_deletes(), 10);
    assert_eq!(recorder.values(), vec![all.clone(), to_keep.to_vec()]);
}

#[test]
fn batch_publishes_once() {
    let db = database();
    let notifications = Arc::new(AtomicUsize::new(0));
    let counter = notifications.clone();
    let _sub = db.observe_changes_in_tables(table_set([USERS]), move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    put_users(&db, users(50, 0));
    assert_eq!(notifications.load(Ordering::SeqCst), 1);

    db.put()
        .objects(users(5, 50))
        .use_transaction(false)
        .prepare()
        .execute_blocking()
        .unwrap();
    assert_eq!(notifications.load(Ordering::SeqCst), 2);
}

#[test]
fn disjoint_tables_not_notified() {
    let db = database();
    let recorder = observe_users(&db);

    db.execute_sql()
        .with_query(
            RawQuery::builder()
                .query("INSERT INTO tweets (author_id, content) VALUES (?, ?)")
                .args([ripple_database::Value::from(1), "hello".into()])
                .affects_tables([TWEETS])
                .build()
                .unwrap(),
        )
        .prepare()
        .unwrap()
        .execute_blocking()
        .unwrap();

    assert_eq!(recorder.values().len(), 1);
}

#[test]
fn unchanged_put_and_empty_delete_do_not_emit() {
    let db = database();
    put_users(&db, users(3, 0));
    let recorder = observe_users(&db);

    let nothing = DeleteQuery::builder()
        .table(USERS)
        .where_clause("id > ?")
        .where_args([100])
        .build()
        .unwrap();
    let result = db.delete().by_query(nothing).prepare().execute_blocking().unwrap();
    assert_eq!(result.rows_deleted(), 0);
    assert_eq!(recorder.values().len(), 1);

    let ghost = User::new(Some(99), "ghost@example.com");
    let deleted = db.delete().object(ghost).prepare().execute_blocking().unwrap();
    assert_eq!(deleted.rows_deleted(), 0);
    assert_eq!(recorder.values().len(), 1);
}

#[test]
fn unsubscribe_stops_emissions() {
    let db = database();
    let recorder = observe_users(&db);
    put_users(&db, users(1, 0));
    assert_eq!(recorder.values().len(), 2);

    recorder.subscription.unsubscribe();
    assert!(!recorder.subscription.is_active());
    put_users(&db, users(1, 1));
    assert_eq!(recorder.values().len(), 2);
    assert_eq!(db.change_bus().subscriber_count(), 0);
}

#[test]
fn failing_query_terminates_stream() {
    let db = database();
    let bad = Query::builder()
        .table(USERS)
        .where_clause("no_such_column = ?")
        .where_args([1])
        .build()
        .unwrap();
    let recorder = Recorder::subscribe(
        &db.get()
            .number_of_results()
            .with_query(bad)
            .prepare()
            .unwrap()
            .observe(),
    );

    assert!(recorder.values().is_empty());
    assert_eq!(recorder.errors.lock().len(), 1);
    assert!(recorder.errors.lock()[0].is_query_execution());
    assert!(!recorder.subscription.is_active());

    put_users(&db, users(1, 0));
    assert_eq!(recorder.errors.lock().len(), 1);
}

#[test]
fn missing_mapping_errors_on_subscribe() {
    #[derive(Clone, Debug)]
    struct Unmapped;

    let db = database();
    let recorder = Recorder::subscribe(
        &db.get()
            .list_of_objects::<Unmapped>()
            .with_query(all_users())
            .prepare()
            .unwrap()
            .observe(),
    );

    let errors = recorder.errors.lock();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], Error::ResolverNotFound { .. }));
}

#[test]
fn raw_query_observes_declared_tables() {
    let db = database();
    put_users(&db, users(2, 0));

    let raw = RawQuery::builder()
        .query("SELECT COUNT(*) AS n FROM users u JOIN tweets t ON t.author_id = u.id")
        .observes_tables([USERS, TWEETS])
        .build()
        .unwrap();
    let rows = db.get().row_set().with_raw_query(raw).prepare().unwrap();
    let recorder = Recorder::subscribe(&rows.observe());

    db.notify_about_changes(Changes::from_table(TWEETS));
    assert_eq!(recorder.values().len(), 2);
    assert_eq!(
        recorder.values()[1].first().unwrap().get_i64("n").unwrap(),
        0
    );
}

#[test]
fn raw_query_without_observed_tables_emits_once() {
    let db = database();
    let raw = RawQuery::builder().query("SELECT email FROM users").build().unwrap();
    let recorder = Recorder::subscribe(
        &db.get()
            .list_of_objects::<String>()
            .with_raw_query(raw)
            .with_get_resolver(ripple_database::DefaultGetResolver::new(|row| {
                row.get_str("email").map(str::to_string)
            }))
            .prepare()
            .unwrap()
            .observe(),
    );

    put_users(&db, users(3, 0));
    assert_eq!(recorder.values(), vec![Vec::<String>::new()]);
}

#[test]
fn object_and_count_track_changes() {
    let db = database();
    let first = Query::builder()
        .table(USERS)
        .order_by("id")
        .limit(1)
        .build()
        .unwrap();
    let object = Recorder::subscribe(
        &db.get()
            .object::<User>()
            .with_query(first)
            .prepare()
            .unwrap()
            .observe(),
    );
    let count = Recorder::subscribe(
        &db.get()
            .number_of_results()
            .with_query(all_users())
            .prepare()
            .unwrap()
            .observe(),
    );

    let batch = users(4, 0);
    put_users(&db, batch.clone());

    assert_eq!(object.values(), vec![None, Some(batch[0].clone())]);
    assert_eq!(count.values(), vec![0, 4]);
}

#[test]
fn transaction_emits_after_commit() {
    let db = database();
    let recorder = observe_users(&db);

    db.transaction(|db| {
        db.put().object(User::new(None, "a@x.io")).prepare().execute_blocking()?;
        db.put().object(User::new(None, "b@x.io")).prepare().execute_blocking()?;
        Ok(())
    })
    .unwrap();

    let values = recorder.values();
    assert_eq!(values.len(), 2);
    assert_eq!(values[1].len(), 2);
}

#[test]
fn live_query_on_worker_pool_reaches_latest_state() {
    let db = database_with(SchedulerConfig::WorkerPool { threads: Some(2) });
    let recorder = observe_users(&db);
    assert_eq!(recorder.values().len(), 1);

    for i in 0..20 {
        put_users(&db, users(1, i));
    }

    assert!(wait_until(|| recorder
        .values()
        .last()
        .map_or(false, |list| list.len() == 20)));
    let values = recorder.values();
    assert!(values.len() >= 2);
    assert!(values.windows(2).all(|w| w[0].len() <= w[1].len()));
}

#[test]
fn live_query_after_database_dropped() {
    let db = database();
    let prepared = db
        .get()
        .number_of_results()
        .with_query(all_users())
        .prepare()
        .unwrap();
    let live = prepared.observe();
    drop(prepared);
    drop(db);

    let err = live.execute().unwrap_err();
    assert!(err.is_query_execution());
}

#[test]
fn reads_from_other_threads_wait_for_open_transaction() {
    let db = database();
    let (tx, rx) = mpsc::channel();
    let mut reader = None;

    let outcome: Result<(), Error> = db.transaction(|db| {
        put_users(db, users(1, 0));

        let db = db.clone();
        reader = Some(std::thread::spawn(move || {
            let count = db
                .get()
                .number_of_results()
                .with_query(all_users())
                .prepare()
                .unwrap();
            let read = count.execute_blocking().unwrap();
            let recorder = Recorder::subscribe(&count.observe());
            recorder.subscription.unsubscribe();
            let _ = tx.send((read, recorder.values()));
        }));

        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        Err(Error::illegal_argument("abandon transaction"))
    });
    assert!(outcome.is_err());

    let (read, emitted) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    reader.unwrap().join().unwrap();
    assert_eq!(read, 0);
    assert_eq!(emitted, vec![0]);
}

#[test]
fn unsubscribe_in_transaction_while_emission_writes() {
    let db = database_with(SchedulerConfig::WorkerPool { threads: Some(1) });
    let (entered_tx, entered_rx) = mpsc::channel();
    let entered_tx = parking_lot::Mutex::new(entered_tx);
    let calls = Arc::new(AtomicUsize::new(0));

    let subscription = {
        let writer = db.clone();
        let calls = calls.clone();
        let prepared = db
            .get()
            .number_of_results()
            .with_query(all_users())
            .prepare()
            .unwrap();
        prepared.observe().subscribe(
            move |_| {
                if calls.fetch_add(1, Ordering::SeqCst) == 1 {
                    let _ = entered_tx.lock().send(());
                    std::thread::sleep(Duration::from_millis(200));
                    writer.notify_about_changes(Changes::from_table(TWEETS));
                }
            },
            |_| {},
        )
    };
    let subscription = Arc::new(subscription);

    put_users(&db, users(1, 0));
    entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();

    let (done_tx, done_rx) = mpsc::channel();
    let unsubscriber = {
        let db = db.clone();
        let subscription = subscription.clone();
        std::thread::spawn(move || {
            let outcome = db.transaction(|_| {
                subscription.unsubscribe();
                Ok(())
            });
            let _ = done_tx.send(outcome.is_ok());
        })
    };

    assert!(done_rx.recv_timeout(Duration::from_secs(5)).unwrap());
    unsubscriber.join().unwrap();
    assert!(!subscription.is_active());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
