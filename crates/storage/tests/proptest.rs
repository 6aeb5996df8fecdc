//! Property tests for nested transactions on the SQLite store.

use proptest::prelude::*;
use ripple_core::descriptor::Query;
use ripple_core::ContentValues;
use ripple_storage::{SqliteStore, Store};

#[derive(Clone, Debug)]
enum Op {
    Insert,
    Begin,
    Commit,
    Rollback,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Insert),
        2 => Just(Op::Begin),
        1 => Just(Op::Commit),
        1 => Just(Op::Rollback),
    ]
}

fn row_count(store: &SqliteStore) -> usize {
    let query = Query::builder().table("items").build().unwrap();
    store.count(&query).unwrap()
}

proptest! {
    /// Row counts follow a stack model where each level holds its own
    /// inserts; commit folds a level into its parent and rollback drops it.
    #[test]
    fn nested_levels_match_model(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let store = SqliteStore::open_in_memory().unwrap();
        store.execute_batch("CREATE TABLE items (id INTEGER PRIMARY KEY, n INTEGER)").unwrap();

        let mut committed = 0usize;
        let mut levels: Vec<usize> = Vec::new();

        for (i, op) in ops.iter().enumerate() {
            match op {
                Op::Insert => {
                    store.insert("items", &ContentValues::new().with("n", i as i64)).unwrap();
                    match levels.last_mut() {
                        Some(level) => *level += 1,
                        None => committed += 1,
                    }
                }
                Op::Begin => {
                    store.begin_transaction().unwrap();
                    levels.push(0);
                }
                Op::Commit => match levels.pop() {
                    Some(n) => {
                        store.commit_transaction().unwrap();
                        match levels.last_mut() {
                            Some(parent) => *parent += n,
                            None => committed += n,
                        }
                    }
                    None => prop_assert!(store.commit_transaction().is_err()),
                },
                Op::Rollback => match levels.pop() {
                    Some(_) => store.rollback_transaction().unwrap(),
                    None => prop_assert!(store.rollback_transaction().is_err()),
                },
            }

            let visible = committed + levels.iter().sum::<usize>();
            prop_assert_eq!(row_count(&store), visible);
            prop_assert_eq!(store.transaction_depth(), levels.len());
        }
    }
}
