pub mod activity;
pub mod contributors;
pub mod interactions;
pub mod latency;

pub use crate::activity::{author_activity, weekly_commit_activity, AuthorCount, WeekBucket};
pub use crate::contributors::{contributors, Contributor};
pub use crate::interactions::{interaction_matrix, InteractionMatrix};
pub use crate::latency::{time_to_merge, MergeLatency};
