//! Test harnesses for the portcullis CLI.
//!
//! CLI tests run the built `portcullis` binary against the shared fixtures
//! in `tests/fixtures/`.

#[cfg(test)]
pub mod cli;
