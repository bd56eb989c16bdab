//! Small dense square matrices for per-mobilizer systems (at most 6x6).

use crate::config::PIVOT_TOLERANCE;

/// Row-major `n x n` matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMat {
    n: usize,
    data: Vec<f64>,
}

impl DenseMat {
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n);
        for i in 0..n {
            m.set(i, i, 1.0);
        }
        m
    }

    pub fn dim(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.n + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.n + col] = value;
    }

    pub fn mul_vec(&self, x: &[f64]) -> Vec<f64> {
        (0..self.n)
            .map(|i| (0..self.n).map(|j| self.get(i, j) * x[j]).sum())
            .collect()
    }

    /// Gauss-Jordan inversion with partial pivoting. Returns `None` when a
    /// pivot falls below tolerance relative to the largest entry.
    pub fn inverse(&self) -> Option<DenseMat> {
        let n = self.n;
        let scale = self.data.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()));
        if n == 0 {
            return Some(Self::zeros(0));
        }
        if !(scale.is_finite() && scale > 0.0) {
            return None;
        }
        let mut a = self.clone();
        let mut inv = Self::identity(n);
        for col in 0..n {
            let pivot_row = (col..n).max_by(|&r1, &r2| {
                a.get(r1, col)
                    .abs()
                    .partial_cmp(&a.get(r2, col).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })?;
            let pivot = a.get(pivot_row, col);
            if pivot.abs() <= PIVOT_TOLERANCE * scale {
                return None;
            }
            if pivot_row != col {
                a.swap_rows(pivot_row, col);
                inv.swap_rows(pivot_row, col);
            }
            let recip = 1.0 / pivot;
            for j in 0..n {
                a.set(col, j, a.get(col, j) * recip);
                inv.set(col, j, inv.get(col, j) * recip);
            }
            for row in 0..n {
                if row == col {
                    continue;
                }
                let factor = a.get(row, col);
                if factor == 0.0 {
                    continue;
                }
                for j in 0..n {
                    a.set(row, j, a.get(row, j) - factor * a.get(col, j));
                    inv.set(row, j, inv.get(row, j) - factor * inv.get(col, j));
                }
            }
        }
        Some(inv)
    }

    fn swap_rows(&mut self, r1: usize, r2: usize) {
        for j in 0..self.n {
            self.data.swap(r1 * self.n + j, r2 * self.n + j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_times_matrix_is_identity() {
        let mut m = DenseMat::zeros(3);
        let vals = [[4.0, 1.0, 0.5], [1.0, 3.0, 0.0], [0.5, 0.0, 2.0]];
        for (i, row) in vals.iter().enumerate() {
            for (j, v) in row.iter().enumerate() {
                m.set(i, j, *v);
            }
        }
        let inv = m.inverse().unwrap();
        for i in 0..3 {
            let col: Vec<f64> = (0..3).map(|r| inv.get(r, i)).collect();
            let e = m.mul_vec(&col);
            for (r, x) in e.iter().enumerate() {
                let expected = if r == i { 1.0 } else { 0.0 };
                assert!((x - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        let mut m = DenseMat::zeros(2);
        m.set(0, 0, 1.0);
        m.set(0, 1, 2.0);
        m.set(1, 0, 2.0);
        m.set(1, 1, 4.0);
        assert!(m.inverse().is_none());
        assert!(DenseMat::zeros(1).inverse().is_none());
    }

    #[test]
    fn pivoting_handles_zero_leading_entry() {
        let mut m = DenseMat::zeros(2);
        m.set(0, 1, 1.0);
        m.set(1, 0, 1.0);
        let inv = m.inverse().unwrap();
        assert_eq!(inv, m);
    }
}
