//! Minimal ECMAScript-style object runtime backing an `Object.entries`
//! conformance suite.
//!
//! The runtime provides a managed object heap with property descriptors,
//! prototype chains, symbol keys, and native accessors, plus the
//! `Object.keys` / `Object.values` / `Object.entries` built-ins with
//! snapshot enumeration semantics. The conformance suite itself lives in
//! `tests/entries_conformance.rs`.

#![forbid(unsafe_code)]

pub mod capabilities;
pub mod object_model;
pub mod realm;
