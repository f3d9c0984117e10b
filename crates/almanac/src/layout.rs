//! Layout stages that turn scheduled tasks into positioned bars.
//!
//! # Pipeline Position
//!
//! ```text
//! Tasks + CalendarGrid
//!     ↓ structure
//! TaskSet + DependencyGraph
//!     ↓ grouping → overlap → conflict → priority
//! ranked overlap groups
//!     ↓ tracks → boundary → positioning
//! LayoutResult
//! ```
//!
//! # Submodules
//!
//! - [`grouping`] - Connected components of date-overlapping tasks
//! - [`overlap`] - Pairwise overlap classification and severity
//! - [`conflict`] - Rule-based conflict categories and resolutions
//! - [`priority`] - Composite priority scores and prominence tiers
//! - [`tracks`] - Per-day track assignment with overflow
//! - [`boundary`] - Splitting track runs at month-page boundaries
//! - [`positioning`] - Coordinates, alignment, grid snap and collision nudge
//! - [`result`] - The layout result and its statistics

pub mod boundary;
pub mod conflict;
pub mod grouping;
pub mod overlap;
pub mod positioning;
pub mod priority;
pub mod result;
pub mod tracks;
