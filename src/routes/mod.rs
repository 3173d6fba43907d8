//! Route compilation and dispatch.
//!
//! [`wildcard`] extracts `{name}` placeholders, [`table`] compiles route
//! definitions into a [`RouteTable`] with specificity-based lookup, and
//! [`dispatch`] holds the active table behind an atomic swap.

pub mod dispatch;
pub mod table;
pub mod wildcard;

pub use dispatch::DispatchTable;
pub use table::{CompiledRoute, PathParams, Resolution, RouteTable};
