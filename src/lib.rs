//! relmodel - relational metadata model with SQL Server spatial translation
//!
//! This crate provides:
//! - An entity type registry (`Model`) with weak (owned) entity types,
//!   an ignore list, annotations and convention hooks
//! - YAML model definitions that drive the registry
//! - Member translators rewriting spatial member access (polygons, points)
//!   into SQL Server function calls

pub mod config;
pub mod metadata;
pub mod query;
