use std::collections::BTreeMap;
use std::num::NonZeroU32;

use super::domain::ProgramId;

/// Offered programs and the seat limit of each.
///
/// Programs without an explicit entry fall back to the default capacity. An empty
/// catalogue accepts any program name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramCatalog {
    default_capacity: NonZeroU32,
    programs: BTreeMap<ProgramId, NonZeroU32>,
}

impl ProgramCatalog {
    pub fn new(default_capacity: NonZeroU32) -> Self {
        Self {
            default_capacity,
            programs: BTreeMap::new(),
        }
    }

    pub fn with_program(mut self, program: ProgramId, capacity: NonZeroU32) -> Self {
        self.programs.insert(program, capacity);
        self
    }

    pub fn default_capacity(&self) -> NonZeroU32 {
        self.default_capacity
    }

    pub fn capacity_for(&self, program: &ProgramId) -> NonZeroU32 {
        self.programs
            .get(program)
            .copied()
            .unwrap_or(self.default_capacity)
    }

    pub fn offers(&self, program: &ProgramId) -> bool {
        self.programs.is_empty() || self.programs.contains_key(program)
    }

    pub fn programs(&self) -> impl Iterator<Item = (&ProgramId, NonZeroU32)> {
        self.programs
            .iter()
            .map(|(program, capacity)| (program, *capacity))
    }
}

impl Default for ProgramCatalog {
    fn default() -> Self {
        Self::new(NonZeroU32::MIN)
    }
}
