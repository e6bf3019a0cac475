//! Per-node cut pool.
//!
//! Holds the cuts active in a node's relaxation. Children receive a copy of
//! their parent's pool, rows themselves are shared through `Arc` so copying
//! a pool never copies coefficients.

use std::sync::Arc;

use crate::master::Cut;

/// Cuts active at a search node.
#[derive(Debug, Clone, Default)]
pub struct CutPool {
    /// Active cuts in installation order.
    cuts: Vec<Arc<Cut>>,
}

impl CutPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cut to the pool.
    ///
    /// Returns the cut position and whether it's a duplicate. Duplicates are
    /// not stored a second time.
    pub fn add(&mut self, cut: Cut) -> (usize, bool) {
        if let Some(pos) = self.position(&cut) {
            return (pos, true);
        }
        self.cuts.push(Arc::new(cut));
        (self.cuts.len() - 1, false)
    }

    /// Position of a cut describing the same row, if present.
    pub fn position(&self, cut: &Cut) -> Option<usize> {
        self.cuts.iter().position(|c| c.same_row(cut))
    }

    /// Check if the pool already holds the same row.
    pub fn contains(&self, cut: &Cut) -> bool {
        self.position(cut).is_some()
    }

    /// Iterate over the active cuts.
    pub fn iter(&self) -> impl Iterator<Item = &Cut> {
        self.cuts.iter().map(|c| c.as_ref())
    }

    /// Check if some pooled row is at least as tight as `cut`.
    pub fn implies(&self, cut: &Cut) -> bool {
        self.iter().any(|c| c.implies(cut))
    }

    /// Number of cuts in pool.
    pub fn len(&self) -> usize {
        self.cuts.len()
    }

    /// Check if pool is empty.
    pub fn is_empty(&self) -> bool {
        self.cuts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::master::CutSource;

    fn make_cut(coeffs: &[f64], ub: f64) -> Cut {
        Cut::from_dense(coeffs, f64::NEG_INFINITY, ub, CutSource::User)
    }

    #[test]
    fn test_pool_add_and_get() {
        let mut pool = CutPool::new();

        let (id1, dup1) = pool.add(make_cut(&[1.0, 2.0], 3.0));
        let (id2, dup2) = pool.add(make_cut(&[4.0, 5.0], 6.0));

        assert!(!dup1);
        assert!(!dup2);
        assert_ne!(id1, id2);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_duplicate_detection() {
        let mut pool = CutPool::new();

        let (id1, _) = pool.add(make_cut(&[1.0, 2.0], 3.0));
        let (id2, dup2) = pool.add(make_cut(&[1.0, 2.0], 3.0));
        let (_, dup3) = pool.add(make_cut(&[1.0, 2.0], 4.0));

        assert!(dup2);
        assert_eq!(id1, id2);
        assert!(!dup3);
        assert_eq!(pool.len(), 2);
        assert!(pool.contains(&make_cut(&[1.0, 2.0], 4.0)));
    }

    #[test]
    fn test_child_copy_is_independent() {
        let mut parent = CutPool::new();
        parent.add(make_cut(&[1.0, 1.0], 1.0));

        let mut child = parent.clone();
        child.add(make_cut(&[1.0, 0.0], 0.0));

        assert_eq!(parent.len(), 1);
        assert_eq!(child.len(), 2);
    }

    #[test]
    fn test_implied_row() {
        let mut pool = CutPool::new();
        pool.add(Cut::from_dense(&[1.0, 1.0, 1.0], 3.0, 3.0, CutSource::User));

        assert!(pool.implies(&Cut::from_dense(&[1.0, 1.0, 1.0], 2.0, 3.0, CutSource::User)));
        assert!(!pool.implies(&make_cut(&[1.0, 1.0, 1.0], 2.0)));
        assert!(!pool.contains(&Cut::from_dense(&[1.0, 1.0, 1.0], 2.0, 3.0, CutSource::User)));
    }
}
