//! Sweepline keeps field-service records for chimney-inspection companies and
//! reminds customers when a legally required re-inspection is coming due.
//!
//! The CRUD surfaces (customers, jobs, report forms, document generation) live
//! behind external collaborators; this crate implements the renewal-notification
//! pipeline plus the configuration, telemetry, and error plumbing shared with
//! the `sweepline-api` service binary.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
