//! Births and deaths recorded during a tick and committed after it.

use crate::organism::Organism;
use eco_core::OrganismId;

/// Two-phase population changes: organisms mark births and deaths while the tick
/// iterates, and the simulation applies them once the pass is over.
#[derive(Debug, Default)]
pub struct PendingChanges {
    births: Vec<Organism>,
    deaths: Vec<OrganismId>,
}

impl PendingChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_birth(&mut self, organism: Organism) {
        self.births.push(organism);
    }

    pub fn schedule_death(&mut self, id: OrganismId) {
        self.deaths.push(id);
    }

    pub fn births(&self) -> &[Organism] {
        &self.births
    }

    pub fn deaths(&self) -> &[OrganismId] {
        &self.deaths
    }

    pub fn is_empty(&self) -> bool {
        self.births.is_empty() && self.deaths.is_empty()
    }

    /// Drain both buffers, leaving them empty.
    pub fn take(&mut self) -> (Vec<Organism>, Vec<OrganismId>) {
        (
            std::mem::take(&mut self.births),
            std::mem::take(&mut self.deaths),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_empties_buffers() {
        let mut pending = PendingChanges::new();
        assert!(pending.is_empty());

        pending.schedule_death(OrganismId(3));
        pending.schedule_death(OrganismId(4));
        assert!(!pending.is_empty());

        let (births, deaths) = pending.take();
        assert!(births.is_empty());
        assert_eq!(deaths, vec![OrganismId(3), OrganismId(4)]);
        assert!(pending.is_empty());
    }
}
