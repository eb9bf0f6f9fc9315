//! Per-detector pixel ownership masks.

/// One flag per pixel, row-major, marking pixels claimed by a detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureMask {
    width: usize,
    height: usize,
    bits: Vec<bool>,
}

impl FeatureMask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    #[inline]
    pub fn get(&self, idx: usize) -> bool {
        self.bits[idx]
    }

    #[inline]
    pub fn set(&mut self, idx: usize) {
        self.bits[idx] = true;
    }

    /// Number of claimed pixels.
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }

    /// True if no pixel is claimed by both masks.
    pub fn is_disjoint(&self, other: &FeatureMask) -> bool {
        debug_assert_eq!(self.len(), other.len());
        !self.bits.iter().zip(&other.bits).any(|(&a, &b)| a && b)
    }

    /// Pixels claimed by either mask.
    pub fn union(&self, other: &FeatureMask) -> FeatureMask {
        debug_assert_eq!(self.len(), other.len());
        FeatureMask {
            width: self.width,
            height: self.height,
            bits: self
                .bits
                .iter()
                .zip(&other.bits)
                .map(|(&a, &b)| a || b)
                .collect(),
        }
    }
}

/// Output of a single detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionResult {
    pub count: usize,
    pub mask: FeatureMask,
}

impl DetectionResult {
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            count: 0,
            mask: FeatureMask::new(width, height),
        }
    }
}
