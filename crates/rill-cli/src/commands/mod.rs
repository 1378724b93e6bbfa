pub mod common;
pub mod dump;
pub mod eval;
pub mod tokens;
pub mod trace;
pub mod tree;

#[cfg(test)]
mod common_tests;
