//! # Domain Models
//!
//! Shared team model every tracker is normalized into.
//!
//! ## Models
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Team`] | Team projection with members, current sprint and metrics |
//! | [`Member`] | Team member with a role from a closed set |
//! | [`Sprint`] | Current sprint with planned and completed points |
//! | [`TeamMetrics`] | Velocity, active stories, cycle time, sprint progress |
//! | [`WorkItem`] | Tracker work item used for metric computation |
//! | [`WorkItemStates`] | State names counted as completed or active |
//!
//! Values are recreated on every fetch and never persisted by this crate;
//! the tracker remains the system of record.

mod member;
mod sprint;
mod team;
mod work_item;

pub use member::{Member, MemberRole};
pub use sprint::{parse_sprint_date, Sprint, SprintStatus};
pub use team::{Team, TeamMetrics};
pub use work_item::{WorkItem, WorkItemStates};
