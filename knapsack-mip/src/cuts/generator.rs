//! Cut generator interface and the registry the search loop separates through.

use crate::master::Cut;

/// Where in the search a separation round runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeparationContext {
    /// The node is below the root.
    pub in_tree: bool,

    /// Separation pass index at this node (0 for the first round).
    pub pass: usize,

    /// The relaxation point is integral and about to become an incumbent
    /// candidate. Rounds at a solution are never suppressed.
    pub at_solution: bool,
}

impl SeparationContext {
    /// Context for the first pass at the root.
    pub fn root() -> Self {
        Self::default()
    }
}

/// Scratch buffers owned by the search loop and lent to a generator for the
/// duration of one call.
#[derive(Debug, Clone, Default)]
pub struct SeparationScratch {
    /// Indices of variables a generator considers selected.
    pub selected: Vec<usize>,

    /// Dense coefficient workspace.
    pub coefs: Vec<f64>,
}

impl SeparationScratch {
    /// Create scratch buffers sized for `num_vars` variables.
    pub fn new(num_vars: usize) -> Self {
        Self {
            selected: Vec::with_capacity(num_vars),
            coefs: Vec::with_capacity(num_vars),
        }
    }
}

/// A family of cutting planes.
///
/// Generators are stateless with respect to the search: the same point and
/// context always yield the same cuts, and concurrent calls on unrelated
/// points are allowed.
pub trait CutGenerator: Send + Sync {
    /// Human-readable family name.
    fn name(&self) -> &str;

    /// Inspect a relaxation point and return the cuts it violates.
    ///
    /// Cuts returned together form a batch and are installed together.
    fn generate(
        &self,
        x: &[f64],
        ctx: &SeparationContext,
        scratch: &mut SeparationScratch,
    ) -> Vec<Cut>;

    /// Row describing the part of the search region removed by `cuts` that
    /// may still contain feasible points, if any.
    ///
    /// The search explores it as a separate node so the batch never removes
    /// a feasible solution from the tree.
    fn complement(&self, _cuts: &[Cut]) -> Option<Cut> {
        None
    }
}

/// Cuts returned by one family in one round.
#[derive(Debug, Clone)]
pub struct CutBatch {
    /// Registry index of the family.
    pub family: usize,

    /// The cuts, in the order the family produced them.
    pub cuts: Vec<Cut>,
}

/// Registered cut families, queried in registration order.
#[derive(Default)]
pub struct CutRegistry {
    generators: Vec<Box<dyn CutGenerator>>,
}

impl CutRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cut family.
    pub fn register(&mut self, generator: impl CutGenerator + 'static) -> &mut Self {
        self.generators.push(Box::new(generator));
        self
    }

    /// Builder-style registration.
    pub fn with(mut self, generator: impl CutGenerator + 'static) -> Self {
        self.register(generator);
        self
    }

    /// Number of registered families.
    pub fn len(&self) -> usize {
        self.generators.len()
    }

    /// Check if no family is registered.
    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    /// Names of the registered families.
    pub fn names(&self) -> Vec<&str> {
        self.generators.iter().map(|g| g.name()).collect()
    }

    /// Run one separation round over every family.
    pub fn separate(
        &self,
        x: &[f64],
        ctx: &SeparationContext,
        scratch: &mut SeparationScratch,
    ) -> Vec<CutBatch> {
        self.generators
            .iter()
            .enumerate()
            .filter_map(|(family, generator)| {
                let cuts = generator.generate(x, ctx, scratch);
                (!cuts.is_empty()).then_some(CutBatch { family, cuts })
            })
            .collect()
    }

    /// Complement row for a batch, delegated to the family that produced it.
    pub fn complement(&self, batch: &CutBatch) -> Option<Cut> {
        self.generators
            .get(batch.family)
            .and_then(|generator| generator.complement(&batch.cuts))
    }
}

impl std::fmt::Debug for CutRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CutRegistry")
            .field("generators", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::master::CutSource;

    /// Emits `x0 <= 0` whenever x0 is positive.
    struct FixFirst;

    impl CutGenerator for FixFirst {
        fn name(&self) -> &str {
            "fix-first"
        }

        fn generate(
            &self,
            x: &[f64],
            _ctx: &SeparationContext,
            scratch: &mut SeparationScratch,
        ) -> Vec<Cut> {
            if x[0] <= 0.0 {
                return Vec::new();
            }
            scratch.coefs.clear();
            scratch.coefs.resize(x.len(), 0.0);
            scratch.coefs[0] = 1.0;
            vec![Cut::from_dense(&scratch.coefs, f64::NEG_INFINITY, 0.0, CutSource::User)]
        }
    }

    #[test]
    fn test_registry_collects_batches() {
        let registry = CutRegistry::new().with(FixFirst);
        let mut scratch = SeparationScratch::new(2);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.names(), vec!["fix-first"]);

        let batches = registry.separate(&[0.5, 0.0], &SeparationContext::root(), &mut scratch);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].family, 0);
        assert_eq!(batches[0].cuts.len(), 1);

        // Default complement is none
        assert!(registry.complement(&batches[0]).is_none());

        let batches = registry.separate(&[0.0, 1.0], &SeparationContext::root(), &mut scratch);
        assert!(batches.is_empty());
    }
}
