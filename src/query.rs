//! Query construction.
//!
//! Free-text queries go through [`parser::QueryParser`]; structured filters
//! through [`filter::build_filter`]. Both produce engine
//! [`Predicate`](crate::engine::Predicate)s.

pub mod filter;
pub mod flags;
pub mod parser;
pub mod range;

pub use filter::build_filter;
pub use flags::QueryFlags;
pub use parser::{DefaultOp, ParsedQuery, QueryParser, StemStrategy};
pub use range::RangeBounds;
