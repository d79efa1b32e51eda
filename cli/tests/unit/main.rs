//! Unit tests for the slotup CLI library
//!
//! These tests use in-memory partitions, fake payload sources and mocked
//! hardware, and run fast without touching real devices.

mod architecture;
mod mocks;
mod pipeline;
mod property_tests;
mod update_flow;
