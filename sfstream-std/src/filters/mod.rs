//! Ready-made filters for the common stream shapes.
//!
//! - [`column_headers`]: promote the first row of every table to headers
//! - [`xml`]: extract the region of one XML element

pub mod column_headers;
pub mod xml;

pub use column_headers::{HeaderRow, header_wrapper, promote_first_row};
pub use xml::{element_end, xml_collector, xml_region};
