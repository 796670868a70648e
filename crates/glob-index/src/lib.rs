//! Wildcard index over short string keys.
//!
//! Keys live in a compressed trie whose node labels are split on shared
//! prefixes as keys arrive and merged back as they leave. Queries take glob
//! patterns:
//!
//! | token | matches                     |
//! |-------|-----------------------------|
//! | `*`   | any sequence, including none |
//! | `?`   | any single character        |
//! | `%`   | a single ASCII digit        |
//! | `%*`  | zero or more ASCII digits   |
//! | `\c`  | the character `c` literally |
//!
//! Every other character matches itself. A pattern that ends in `*%*`
//! needs at least one digit at the end of the key.

pub mod error;
pub mod index;
pub mod pattern;

pub use error::GlobIndexError;
pub use index::GlobIndex;
pub use pattern::{parse_pattern, Token};
