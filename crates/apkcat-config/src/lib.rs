//! Configuration for apkcat.
//!
//! The configuration names the architectures to collect, the repositories to fetch for each
//! of them, the repository priority used to reconcile duplicate package names, and where the
//! generated catalog is written.

pub mod annotations;
pub mod config;
pub mod error;
pub mod repository;
