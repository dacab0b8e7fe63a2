//! Domain layer - pure logic with no runtime dependencies.
//!
//! This layer contains the core concepts of the throttle:
//! - The rolling admission window and its decisions
//! - Deferred work items
//! - The document payload schema
//!
//! Nothing here reads a clock or takes a lock; callers supply the current
//! instant, which keeps every type deterministic under test.

pub mod document;
pub mod window;
pub mod work_item;
