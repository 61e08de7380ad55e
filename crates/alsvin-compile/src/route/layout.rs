//! Logical-to-physical qubit mappings.

use rustc_hash::FxHashMap;

/// A bidirectional mapping from logical qubits to physical positions.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    logical_to_physical: FxHashMap<usize, usize>,
    physical_to_logical: FxHashMap<usize, usize>,
}

impl Layout {
    /// Create a new empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a trivial layout (logical qubit i -> physical qubit i).
    pub fn trivial(num_qubits: usize) -> Self {
        let mut layout = Self::new();
        for i in 0..num_qubits {
            layout.add(i, i);
        }
        layout
    }

    /// Create a layout from an explicit physical position per logical qubit.
    pub fn from_positions(positions: &[usize]) -> Self {
        let mut layout = Self::new();
        for (logical, &physical) in positions.iter().enumerate() {
            layout.add(logical, physical);
        }
        layout
    }

    /// Add a mapping, displacing any conflicting pair to keep both maps
    /// consistent.
    pub fn add(&mut self, logical: usize, physical: usize) {
        if let Some(&old_logical) = self.physical_to_logical.get(&physical) {
            if old_logical != logical {
                self.logical_to_physical.remove(&old_logical);
            }
        }
        if let Some(&old_physical) = self.logical_to_physical.get(&logical) {
            if old_physical != physical {
                self.physical_to_logical.remove(&old_physical);
            }
        }
        self.logical_to_physical.insert(logical, physical);
        self.physical_to_logical.insert(physical, logical);
    }

    /// Get the physical position of a logical qubit.
    pub fn get_physical(&self, logical: usize) -> Option<usize> {
        self.logical_to_physical.get(&logical).copied()
    }

    /// Get the logical qubit at a physical position.
    pub fn get_logical(&self, physical: usize) -> Option<usize> {
        self.physical_to_logical.get(&physical).copied()
    }

    /// Swap the logical occupants of two physical positions.
    pub fn swap(&mut self, p1: usize, p2: usize) {
        let l1 = self.physical_to_logical.get(&p1).copied();
        let l2 = self.physical_to_logical.get(&p2).copied();

        if let Some(l1) = l1 {
            self.logical_to_physical.insert(l1, p2);
            self.physical_to_logical.insert(p2, l1);
        } else {
            self.physical_to_logical.remove(&p2);
        }

        if let Some(l2) = l2 {
            self.logical_to_physical.insert(l2, p1);
            self.physical_to_logical.insert(p1, l2);
        } else {
            self.physical_to_logical.remove(&p1);
        }
    }

    /// Number of mapped qubits.
    pub fn len(&self) -> usize {
        self.logical_to_physical.len()
    }

    /// Check if the layout is empty.
    pub fn is_empty(&self) -> bool {
        self.logical_to_physical.is_empty()
    }

    /// Iterate over (logical, physical) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.logical_to_physical.iter().map(|(&l, &p)| (l, p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trivial() {
        let layout = Layout::trivial(4);
        assert_eq!(layout.get_physical(2), Some(2));
        assert_eq!(layout.get_logical(3), Some(3));
        assert_eq!(layout.len(), 4);
    }

    #[test]
    fn test_swap() {
        let mut layout = Layout::trivial(3);
        layout.swap(0, 2);
        assert_eq!(layout.get_physical(0), Some(2));
        assert_eq!(layout.get_physical(2), Some(0));
        assert_eq!(layout.get_logical(0), Some(2));
    }

    #[test]
    fn test_swap_with_empty_slot() {
        let mut layout = Layout::new();
        layout.add(0, 0);
        // Physical 1 is unoccupied.
        layout.swap(0, 1);
        assert_eq!(layout.get_physical(0), Some(1));
        assert_eq!(layout.get_logical(0), None);
    }

    #[test]
    fn test_add_displaces_conflicts() {
        let mut layout = Layout::trivial(2);
        layout.add(0, 1);
        assert_eq!(layout.get_physical(0), Some(1));
        // Logical 1 lost its slot; physical 0 is unmapped now.
        assert_eq!(layout.get_physical(1), None);
        assert_eq!(layout.get_logical(0), None);
    }
}
