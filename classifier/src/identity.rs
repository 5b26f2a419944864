//! The closed identity set and probability distributions over it.

/// Number of enrolled identities.
pub const IDENTITY_COUNT: usize = 5;

/// The closed set of identity labels, in ascending order.
///
/// Every argmax in the pipeline iterates this array front to back, so ties
/// always resolve to the smallest label.
pub const IDENTITY_LABELS: [u32; IDENTITY_COUNT] = [1, 2, 3, 4, 5];

/// Returns the dense index of a label, or `None` for labels outside the set.
pub fn label_index(label: u32) -> Option<usize> {
    IDENTITY_LABELS.iter().position(|&l| l == label)
}

/// A probability distribution over the identity set.
///
/// Stored densely in ascending label order. Labels outside the set carry
/// zero mass by construction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IdentityDistribution {
    probs: [f32; IDENTITY_COUNT],
}

impl IdentityDistribution {
    /// A distribution with all mass at zero.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Builds a distribution from `(label, probability)` pairs.
    /// Pairs with labels outside the set are ignored.
    pub fn from_pairs(pairs: &[(u32, f32)]) -> Self {
        let mut dist = Self::default();
        for &(label, p) in pairs {
            if let Some(i) = label_index(label) {
                dist.probs[i] = p;
            }
        }
        dist
    }

    /// The probability mass at `label` (0 for labels outside the set).
    pub fn get(&self, label: u32) -> f32 {
        label_index(label).map(|i| self.probs[i]).unwrap_or(0.0)
    }

    /// Sets the mass at `label`; labels outside the set are ignored.
    pub fn set(&mut self, label: u32, p: f32) {
        if let Some(i) = label_index(label) {
            self.probs[i] = p;
        }
    }

    /// Total mass.
    pub fn sum(&self) -> f32 {
        self.probs.iter().sum()
    }

    /// Rescales the distribution to sum to 1. A zero distribution is left
    /// untouched.
    pub fn normalize(&mut self) {
        let total = self.sum();
        if total > 0.0 {
            for p in &mut self.probs {
                *p /= total;
            }
        }
    }

    /// The label with the highest mass; ties resolve to the smallest label.
    pub fn argmax(&self) -> u32 {
        let mut best = 0usize;
        for i in 1..IDENTITY_COUNT {
            if self.probs[i] > self.probs[best] {
                best = i;
            }
        }
        IDENTITY_LABELS[best]
    }

    /// Iterates `(label, probability)` in ascending label order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        IDENTITY_LABELS.iter().zip(self.probs.iter()).map(|(&l, &p)| (l, p))
    }
}
