//! Almanac Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Almanac layout
//! engine and its hosts. It includes:
//!
//! - **Identifiers**: String-interned identifiers for tasks and categories ([`identifier::Id`])
//! - **Spans**: Inclusive day ranges and their interval algebra ([`span::DaySpan`])
//! - **Tasks**: The validated task record consumed by the engine ([`task::Task`])
//! - **Calendar**: The month-page skeleton and cell geometry ([`calendar`] module)
//! - **Geometry**: Basic geometric types ([`geometry`] module)
//! - **Colors**: CSS color handling ([`color::Color`])

pub mod calendar;
pub mod color;
pub mod geometry;
pub mod identifier;
pub mod span;
pub mod task;
