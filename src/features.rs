use anyhow::{Result, bail};

/// Sparse feature vector with a fixed dimension and ascending indices.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseVector {
    dim: usize,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl SparseVector {
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Builds a vector from unordered `(index, value)` pairs, rejecting
    /// duplicates and out-of-range indices.
    pub fn new(dim: usize, indices: Vec<usize>, values: Vec<f64>) -> Result<Self> {
        if indices.len() != values.len() {
            bail!(
                "Sparse vector has {} indices but {} values",
                indices.len(),
                values.len()
            );
        }

        let mut entries: Vec<(usize, f64)> = indices.into_iter().zip(values).collect();
        entries.sort_by_key(|(index, _)| *index);

        for pair in entries.windows(2) {
            if pair[0].0 == pair[1].0 {
                bail!("Sparse vector repeats index {}", pair[0].0);
            }
        }
        if let Some((index, _)) = entries.last() {
            if *index >= dim {
                bail!("Sparse vector index {index} out of range for dimension {dim}");
            }
        }

        let (indices, values) = entries.into_iter().unzip();
        Ok(Self {
            dim,
            indices,
            values,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn dot_dense(&self, dense: &[f64]) -> f64 {
        self.iter()
            .map(|(index, value)| value * dense.get(index).copied().unwrap_or(0.0))
            .sum()
    }

    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    pub fn squared_norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum()
    }

    pub fn squared_distance(&self, other: &SparseVector) -> f64 {
        // Rounding can push the expansion slightly below zero.
        (self.squared_norm() + other.squared_norm() - 2.0 * self.dot(other)).max(0.0)
    }
}
