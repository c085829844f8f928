//! Data models for the question review workbench.
//!
//! Field names follow the JSON contract of the review frontend (camelCase,
//! `_id` / `_createTime` style system fields).

mod comment;
mod document;
mod params;
mod question;
mod search;
mod tag;
mod user;

pub use comment::*;
pub use document::*;
pub use params::*;
pub use question::*;
pub use search::*;
pub use tag::*;
pub use user::*;
