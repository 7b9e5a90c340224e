//! Printable practice worksheets.
//!
//! [`layout`] computes cell and guide geometry, [`page`] writes grid primitives and images into
//! PDF content streams, [`font`] handles the footer font and [`worksheet`] assembles documents.

pub mod font;
pub mod layout;
pub mod page;
pub mod worksheet;
