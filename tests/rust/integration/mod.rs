//! Integration tests - definition files through to rendered SQL
//!
//! These tests load YAML from disk, build and finalize models, and translate
//! spatial member paths end to end.

mod definition_pipeline_tests;
mod owned_types_tests;
