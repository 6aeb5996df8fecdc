//! Ripple Reactive - Change notification and live queries for Ripple.
//!
//! This crate implements the reactive half of Ripple. Writers publish the set
//! of tables they changed; every live query observing one of those tables
//! re-executes and pushes its new result downstream.
//!
//! # Core Concepts
//!
//! - `Changes`: The immutable set of table names changed by one write
//! - `ChangeBus`: Routes changes to subscribers with intersecting interests,
//!   coalescing bursts into one pending delivery per subscriber
//! - `Scheduler`: Runs deliveries inline or on a worker pool
//! - `LiveQuery`: Emits an initial result, then a fresh one per relevant change
//! - `Subscription`: Handle used to stop a bus subscription or a live query
//!
//! # Example
//!
//! ```rust
//! use ripple_core::table_set;
//! use ripple_reactive::{ChangeBus, Changes, LiveQuery};
//! use std::sync::atomic::{AtomicI64, Ordering};
//! use std::sync::Arc;
//!
//! let bus = ChangeBus::immediate();
//! let counter = Arc::new(AtomicI64::new(0));
//!
//! let source = counter.clone();
//! let live = LiveQuery::new(bus.clone(), table_set(["users"]), move || {
//!     Ok(source.load(Ordering::SeqCst))
//! });
//! let (subscription, results) = live.subscribe_channel();
//!
//! counter.store(10, Ordering::SeqCst);
//! bus.publish(Changes::from_table("users"));
//! subscription.unsubscribe();
//!
//! let seen: Vec<i64> = results.try_iter().map(|r| r.unwrap()).collect();
//! assert_eq!(seen, vec![0, 10]);
//! ```

pub mod changes;
pub mod notify;
pub mod observable;
pub mod scheduler;
pub mod subscription;

pub use changes::Changes;
pub use notify::{ChangeBus, ChangeCallback, ErrorCallback};
pub use observable::{LiveQuery, QueryFn};
pub use scheduler::{Job, Scheduler, SchedulerConfig, WorkerPool};
pub use subscription::{CancellationToken, Subscription, SubscriptionId};
