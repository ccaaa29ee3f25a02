pub mod endpoint;
pub mod locator;
pub mod outcome;
pub mod parse;
pub mod paths;
pub mod runner;

#[cfg(test)]
pub mod testing;
