//! # Domain Models
//!
//! These structs represent the core entities of Innovate. Derived values
//! (counts, `is_following`, `is_owner`) appear only on read-side shapes and
//! are never persisted.

pub mod community;
pub mod live;
pub mod message;
pub mod notification;
pub mod post;
pub mod user;

pub use community::*;
pub use live::*;
pub use message::*;
pub use notification::*;
pub use post::*;
pub use user::*;
