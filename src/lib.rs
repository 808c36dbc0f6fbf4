pub mod db;
pub mod error;
pub mod model;
pub mod ops;
pub mod output;
pub mod paths;
pub mod store;
pub mod validate;
pub mod view;
pub mod watch;

pub use error::{Collection, StoreError, StoreResult};
pub use model::{Log, Task, TaskKind, TaskStatus};
pub use store::{SqliteStore, TaskStore};
