//! Database backed operations.
//!
//! Every mutating operation takes a role guard from `crate::auth` (or the acting user)
//! so permission checks happen before anything touches the database.

pub mod attendance;
pub mod compensation;
pub mod leave;
pub mod payroll;
pub mod setting;
pub mod user;

use chrono::{DateTime, FixedOffset, Local};

pub(crate) fn now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}
