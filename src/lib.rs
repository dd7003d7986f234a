//! ordtree: ordered tree and sequence manager
//!
//! A self-referential node tree whose parent changes can never create a
//! cycle, and ordered collections whose items carry unique numbers that can
//! be swapped and renumbered without tripping the uniqueness check.
//!
//! Layers, innermost first: `domain` (entities and ordering rules),
//! `application` (transactional services), `infrastructure` (stores and
//! wiring), `cli`.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
