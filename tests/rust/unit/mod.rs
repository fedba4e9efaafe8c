//! Unit tests - public API checks that need no input files
//!
//! These tests exercise the library through its public surface only.

mod configuration_source_tests;
mod display_name_tests;
mod translator_chain_tests;
