//! Port definitions for tip selection.

pub mod outbound;
