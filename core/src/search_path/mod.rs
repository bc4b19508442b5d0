pub mod resolver;

pub use resolver::{PATH_SEPARATOR, PathResolver};
