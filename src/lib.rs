pub mod catalog;
pub mod checker;
pub mod config;
pub mod error;
pub mod kernel;
pub mod session;
pub mod unify;
pub mod worksheet;

#[cfg(test)]
mod tests;
