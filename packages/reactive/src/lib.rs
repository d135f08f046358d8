//! # Markwright Reactive
//!
//! Synchronous reactive graph used by the editor core and its plugins.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Realm: one graph per editor instance         │
//! │  - Cell<T>       current value               │
//! │  - Signal<T>     transient events            │
//! │  - Aggregate<T>  append-only shared list     │
//! └──────────────────────────────────────────────┘
//!                     ↓
//! ┌──────────────────────────────────────────────┐
//! │ Pipelines: map / filter / with_latest_from / │
//! │ combine / link, evaluated in topological     │
//! │ order, once per node per pass                │
//! └──────────────────────────────────────────────┘
//!                     ↓
//! ┌──────────────────────────────────────────────┐
//! │ Subscriptions: side effects, failures are    │
//! │ isolated and surfaced to the publisher       │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use markwright_reactive::Realm;
//!
//! let realm = Realm::new();
//! let language = realm.cell("rust".to_string());
//! let insert = realm.signal::<String>();
//! let labelled = realm
//!     .with_latest_from(insert, language)
//!     .unwrap();
//!
//! realm
//!     .subscribe(labelled, |_, (code, lang): &(String, String)| {
//!         assert_eq!(lang, "rust");
//!         assert_eq!(code, "fn main() {}");
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! realm.publish(insert, "fn main() {}".to_string()).unwrap();
//! ```
//!
//! The graph is single-threaded (`Rc`/`RefCell`). A `publish` runs every
//! transitive effect before returning; publishes made by subscribers are queued
//! and drained in FIFO order.

mod error;
mod node;
mod operators;
mod realm;
mod subscription;

pub use error::{FailureStage, PropagationFailure, RealmError};
pub use node::{Aggregate, Cell, Key, NodeHandle, NodeId, NodeKind, Signal, Sink, Source};
pub use realm::{Batch, LinkId, NodeInfo, Realm};
pub use subscription::Subscription;
