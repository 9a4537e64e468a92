//! Cross-crate integration tests.

pub mod fixtures;

#[cfg(test)]
mod failure_modes;
#[cfg(test)]
mod flows;
#[cfg(test)]
mod sqlite_flows;
