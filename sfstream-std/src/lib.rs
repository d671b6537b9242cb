//! # sfstream-std
//!
//! Standard building blocks on top of [`sfstream_core`].
//!
//! This crate provides:
//! - **Table filters**: [`promote_first_row`], [`header_wrapper`], [`HeaderRow`]
//! - **XML filters**: [`xml_region`], [`xml_collector`]
//! - **Observation**: [`LoggingStage`]
//! - **Testing**: fixtures and recording handlers in [`testing`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core
pub use sfstream_core;

// Modules
pub mod filters;
pub mod inspect;
pub mod testing;

pub use filters::{
    HeaderRow, element_end, header_wrapper, promote_first_row, xml_collector, xml_region,
};
pub use inspect::LoggingStage;
