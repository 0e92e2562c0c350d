//! Shared Types Module
//!
//! Data model and wire types shared with the task-board REST contract,
//! plus the core error taxonomy.

pub mod board;
pub mod error;
pub mod task;
pub mod user;

pub use board::{
    hydrate_boards, merge_members, Board, BoardDto, BoardMember, BoardRole, RawMember,
};
pub use error::{CoreError, CoreResult};
pub use task::{deadline_patch, deadline_patch_in, FieldPatch, Task, TaskPatch, TaskStatus};
pub use user::UserProfile;
