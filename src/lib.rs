//! # laneboard
//!
//! Client-side state synchronization core for a collaborative task board.
//!
//! Users organize boards, each holding tasks in three lanes (TODO /
//! IN_PROGRESS / DONE), share boards with role-scoped collaborators, and
//! reorder or move tasks by drag-and-drop. This crate maintains the local
//! mirror of the server-owned state: it applies user mutations
//! optimistically where immediate feedback matters, reconciles with the
//! authoritative backend, resolves effective permissions per user per
//! board, and keeps concurrent local edits from desynchronizing the UI
//! from what the server will eventually confirm.
//!
//! Rendering, session bootstrap forms and toast presentation are the
//! embedding application's concern; the backend is reached only through
//! the [`client::Transport`] seam.

pub mod client;
pub mod shared;

pub use client::{
    BoardAccess, BoardCache, Config, HttpTransport, MutationPhase, ReorderEngine, SelectionStore,
    SyncEngine, TaskCache, Transport,
};
pub use shared::{
    Board, BoardMember, BoardRole, CoreError, CoreResult, Task, TaskPatch, TaskStatus, UserProfile,
};
