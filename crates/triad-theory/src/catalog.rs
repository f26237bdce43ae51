use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::notes::PitchClass;
use crate::types::{ChordQuality, Inversion, InversionKind};

/// Generate every inversion: 12 roots × 4 qualities × 3 kinds = 432 entries.
///
/// Deterministic and pure; ids are stable across calls.
pub fn generate_all() -> Vec<Inversion> {
    let mut inversions = Vec::with_capacity(12 * 4 * 3);
    for root in PitchClass::all() {
        for quality in ChordQuality::ALL {
            for kind in InversionKind::ALL {
                inversions.push(Inversion::new(root, quality, kind));
            }
        }
    }
    inversions
}

/// Multi-select filter over the catalog. An empty component means "all",
/// matching the host UI convention of nothing-checked = everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Selection {
    pub roots: Vec<PitchClass>,
    pub qualities: Vec<ChordQuality>,
    pub kinds: Vec<InversionKind>,
}

impl Selection {
    pub fn admits(&self, inversion: &Inversion) -> bool {
        (self.roots.is_empty() || self.roots.contains(&inversion.root))
            && (self.qualities.is_empty() || self.qualities.contains(&inversion.quality))
            && (self.kinds.is_empty() || self.kinds.contains(&inversion.kind))
    }
}

/// The full inversion universe with a lookup index.
///
/// Built once at startup and shared read-only; entries are handed out as
/// `Arc` so sessions reference rather than copy them.
pub struct Catalog {
    inversions: Vec<Arc<Inversion>>,
    index: HashMap<(PitchClass, ChordQuality, InversionKind), usize>,
}

impl Catalog {
    pub fn new() -> Self {
        let inversions: Vec<Arc<Inversion>> =
            generate_all().into_iter().map(Arc::new).collect();
        let index = inversions
            .iter()
            .enumerate()
            .map(|(i, inv)| ((inv.root, inv.quality, inv.kind), i))
            .collect();
        Self { inversions, index }
    }

    pub fn all(&self) -> &[Arc<Inversion>] {
        &self.inversions
    }

    pub fn len(&self) -> usize {
        self.inversions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inversions.is_empty()
    }

    /// Find the single inversion for this exact combination.
    pub fn lookup(
        &self,
        root: PitchClass,
        quality: ChordQuality,
        kind: InversionKind,
    ) -> Option<&Arc<Inversion>> {
        self.index
            .get(&(root, quality, kind))
            .map(|&i| &self.inversions[i])
    }

    /// Narrow the universe to a user selection.
    pub fn filter(&self, selection: &Selection) -> Vec<Arc<Inversion>> {
        self.inversions
            .iter()
            .filter(|inv| selection.admits(inv))
            .cloned()
            .collect()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
