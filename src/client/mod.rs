//! Client Synchronization Core
//!
//! The local mirror of server-owned board and task state: caches,
//! permission resolution, drag-and-drop translation, and the transport
//! seam they all talk through.

pub mod board_cache;
pub mod config;
pub mod engine;
pub mod http;
pub mod mutation;
pub mod permissions;
pub mod reorder;
pub mod task_cache;
pub mod transport;

pub use board_cache::BoardCache;
pub use config::{Config, SelectionStore};
pub use engine::SyncEngine;
pub use http::HttpTransport;
pub use mutation::{MutationLog, MutationPhase, MutationRecord};
pub use permissions::{resolve, BoardAccess};
pub use reorder::{LanePlan, MovePlan, ReorderEngine};
pub use task_cache::TaskCache;
pub use transport::Transport;
