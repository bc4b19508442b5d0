pub mod matrix;

pub use matrix::{StatusActionMatrix, SvAction, SvStatus};
