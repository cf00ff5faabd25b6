pub(crate) mod common;

mod board;
mod routing;
