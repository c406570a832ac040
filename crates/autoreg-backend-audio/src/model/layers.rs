//! Dense, embedding, and GRU building blocks.
//!
//! Weights are stored row-major (`rows` outputs × `cols` inputs) so they
//! serialize as flat arrays.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{ModelError, ModelResult};

/// Fully connected layer `y = W x + b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dense {
    /// Output width.
    pub rows: usize,
    /// Input width.
    pub cols: usize,
    /// Row-major `rows × cols` weight matrix.
    pub weight: Vec<f32>,
    /// Bias of length `rows`.
    pub bias: Vec<f32>,
}

impl Dense {
    /// Uniform `±1/sqrt(cols)` initialization with zero bias.
    pub fn random<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Self {
        let bound = 1.0 / (cols.max(1) as f32).sqrt();
        let weight = (0..rows * cols)
            .map(|_| rng.gen_range(-bound..=bound))
            .collect();
        Self {
            rows,
            cols,
            weight,
            bias: vec![0.0; rows],
        }
    }

    /// Checks the stored buffers against the declared shape.
    pub fn check(&self, name: &str, rows: usize, cols: usize) -> ModelResult<()> {
        if self.rows != rows {
            return Err(ModelError::shape(format!("{} rows", name), rows, self.rows));
        }
        if self.cols != cols {
            return Err(ModelError::shape(format!("{} cols", name), cols, self.cols));
        }
        if self.weight.len() != rows * cols {
            return Err(ModelError::shape(
                format!("{} weight", name),
                rows * cols,
                self.weight.len(),
            ));
        }
        if self.bias.len() != rows {
            return Err(ModelError::shape(
                format!("{} bias", name),
                rows,
                self.bias.len(),
            ));
        }
        Ok(())
    }

    /// Computes `W x + b`.
    pub fn forward(&self, x: &[f32]) -> Vec<f32> {
        debug_assert_eq!(x.len(), self.cols);
        if self.cols == 0 {
            return self.bias.clone();
        }
        self.weight
            .chunks_exact(self.cols)
            .zip(&self.bias)
            .map(|(row, b)| row.iter().zip(x).map(|(w, v)| w * v).sum::<f32>() + b)
            .collect()
    }
}

/// Lookup table mapping a class index to a vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Embedding {
    /// Number of classes.
    pub rows: usize,
    /// Vector width.
    pub cols: usize,
    /// Row-major `rows × cols` table.
    pub weight: Vec<f32>,
}

impl Embedding {
    /// Uniform `±1` initialization.
    pub fn random<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Self {
        Self {
            rows,
            cols,
            weight: (0..rows * cols).map(|_| rng.gen_range(-1.0..=1.0)).collect(),
        }
    }

    /// Checks the table against the declared shape.
    pub fn check(&self, rows: usize, cols: usize) -> ModelResult<()> {
        if self.rows != rows || self.cols != cols || self.weight.len() != rows * cols {
            return Err(ModelError::shape("embedding", rows * cols, self.weight.len()));
        }
        Ok(())
    }

    /// Row for `index`.
    pub fn lookup(&self, index: usize) -> ModelResult<&[f32]> {
        if index >= self.rows {
            return Err(ModelError::forward(format!(
                "class {} out of range for embedding with {} rows",
                index, self.rows
            )));
        }
        Ok(&self.weight[index * self.cols..(index + 1) * self.cols])
    }
}

/// Gated recurrent unit cell.
///
/// Gate rows are stacked `[reset; update; candidate]` in both matrices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GruCell {
    /// Input projection, `3H × I`.
    pub w_ih: Dense,
    /// Recurrent projection, `3H × H`.
    pub w_hh: Dense,
}

impl GruCell {
    /// Random cell for `input_size → hidden_size`.
    pub fn random<R: Rng + ?Sized>(input_size: usize, hidden_size: usize, rng: &mut R) -> Self {
        Self {
            w_ih: Dense::random(3 * hidden_size, input_size, rng),
            w_hh: Dense::random(3 * hidden_size, hidden_size, rng),
        }
    }

    /// Checks both projections.
    pub fn check(&self, input_size: usize, hidden_size: usize) -> ModelResult<()> {
        self.w_ih.check("gru.w_ih", 3 * hidden_size, input_size)?;
        self.w_hh.check("gru.w_hh", 3 * hidden_size, hidden_size)
    }

    /// Hidden width.
    pub fn hidden_size(&self) -> usize {
        self.w_hh.cols
    }

    /// One recurrent update; returns the new hidden vector.
    pub fn step(&self, x: &[f32], h: &[f32]) -> Vec<f32> {
        let hs = self.hidden_size();
        let gi = self.w_ih.forward(x);
        let gh = self.w_hh.forward(h);

        (0..hs)
            .map(|j| {
                let r = sigmoid(gi[j] + gh[j]);
                let z = sigmoid(gi[hs + j] + gh[hs + j]);
                let n = (gi[2 * hs + j] + r * gh[2 * hs + j]).tanh();
                (1.0 - z) * n + z * h[j]
            })
            .collect()
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::create_rng;

    #[test]
    fn test_dense_forward() {
        let dense = Dense {
            rows: 2,
            cols: 3,
            weight: vec![1.0, 0.0, -1.0, 0.5, 0.5, 0.5],
            bias: vec![0.1, -0.1],
        };
        let y = dense.forward(&[1.0, 2.0, 3.0]);
        assert!((y[0] - (-2.0 + 0.1)).abs() < 1e-6);
        assert!((y[1] - (3.0 - 0.1)).abs() < 1e-6);
    }

    #[test]
    fn test_dense_check_reports_mismatch() {
        let mut rng = create_rng(1);
        let mut dense = Dense::random(4, 3, &mut rng);
        assert!(dense.check("o1", 4, 3).is_ok());
        assert!(dense.check("o1", 5, 3).is_err());
        dense.bias.pop();
        let err = dense.check("o1", 4, 3).unwrap_err();
        assert!(err.to_string().contains("o1 bias"));
    }

    #[test]
    fn test_embedding_lookup_bounds() {
        let mut rng = create_rng(2);
        let embedding = Embedding::random(8, 4, &mut rng);
        assert_eq!(embedding.lookup(7).unwrap().len(), 4);
        assert!(embedding.lookup(8).is_err());
    }

    #[test]
    fn test_gru_zero_weights_decay_toward_candidate() {
        // With all-zero weights: r = z = 0.5, n = 0, so h' = 0.5 h.
        let cell = GruCell {
            w_ih: Dense {
                rows: 6,
                cols: 1,
                weight: vec![0.0; 6],
                bias: vec![0.0; 6],
            },
            w_hh: Dense {
                rows: 6,
                cols: 2,
                weight: vec![0.0; 12],
                bias: vec![0.0; 6],
            },
        };
        let h = cell.step(&[1.0], &[0.8, -0.4]);
        assert!((h[0] - 0.4).abs() < 1e-6);
        assert!((h[1] + 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_gru_output_bounded() {
        let mut rng = create_rng(3);
        let cell = GruCell::random(5, 7, &mut rng);
        assert!(cell.check(5, 7).is_ok());
        let mut h = vec![0.0; 7];
        for _ in 0..50 {
            h = cell.step(&[1.0, -1.0, 0.5, 0.0, 2.0], &h);
        }
        assert!(h.iter().all(|v| v.abs() <= 1.0));
    }
}
