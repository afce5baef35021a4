pub mod http;
pub mod resolver;
pub mod s3;

pub use resolver::{Resolver, ResolveError};
