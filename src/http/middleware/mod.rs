//! Concrete middlewares built on the handler contract.

pub mod cors;

pub use cors::{Cors, CorsOptions, HeaderList};
