//! Small shared utilities for the `mo_*` crates.
//!
//! Currently this is the hashing layer: map and set aliases over
//! *hashbrown* with a deterministic *foldhash* state, plus a pass-through
//! hasher for keys that already are unique integers.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// Modules

pub mod hash;
