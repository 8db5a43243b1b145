pub mod memory;
pub mod remote;
pub mod traits;

#[cfg(test)]
pub(crate) mod fake;
