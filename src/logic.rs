//! Business rules that need no database access.
//!
//! Everything here is a pure function over entity models, the services fetch the
//! rows and persist whatever comes out.

pub mod attendance;
pub mod payroll;
