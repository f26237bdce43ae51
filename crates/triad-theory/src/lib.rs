//! Triad theory for inversion training.
//!
//! Pure, stateless building blocks: pitch classes with name parsing, the
//! three-note chord qualities, the inversion catalog (every root × quality ×
//! inversion kind), and voicing verification against a target inversion.
//! No I/O and no mutable global state; a [`Catalog`] is built once at startup
//! and shared read-only from then on.

pub mod catalog;
pub mod notes;
pub mod types;
pub mod voicing;

pub use catalog::{generate_all, Catalog, Selection};
pub use notes::{PitchClass, TheoryError};
pub use types::{ChordQuality, Inversion, InversionKind};
pub use voicing::check_voicing;
