//! # Tube Selection
//!
//! Turns the ordered `--tube` selectors into the concrete set of tubes a run
//! will probe.
//!
//! - [`selector`] - Parsing of `!`/`~` prefixed selector tokens
//! - [`resolver`] - Ordered fold of selectors over the server's tube listing

pub mod resolver;
pub mod selector;

pub use resolver::{resolve, TubeSetResolver};
pub use selector::SelectorToken;
