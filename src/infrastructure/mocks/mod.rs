//! Mock implementations for testing.
//!
//! This module provides test doubles for infrastructure adapters,
//! enabling controlled testing of admission and redelivery.

pub mod clock;
pub mod layer;
pub mod transport;

pub use clock::MockClock;
pub use layer::MockCaptureLayer;
pub use transport::{Delivery, RecordingTransport};
