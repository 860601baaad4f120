//! Common utilities for the railway-tiles toolkit

pub mod error;
pub mod tag_lookup;
pub mod tags;

pub use error::{Error, Result};
pub use tag_lookup::TagLookup;
pub use tags::{TagMap, Tags};
