use rand::prelude::*;

/// Dense row-major matrix of f64 values.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows],
        }
    }

    /// Uniform random entries in (-0.5, 0.5], the initial state of a freshly
    /// constructed weight matrix.
    pub fn random_uniform(rows: usize, cols: usize) -> Matrix {
        let mut rng = rand::thread_rng();
        let mut res = Matrix::zeros(rows, cols);

        for i in 0..rows {
            for j in 0..cols {
                res.data[i][j] = 0.5 - rng.gen::<f64>();
            }
        }

        res
    }

    pub fn from_data(data: Vec<Vec<f64>>) -> Matrix {
        Matrix {
            rows: data.len(),
            cols: data.first().map_or(0, |row| row.len()),
            data,
        }
    }

    /// Sets every entry back to zero, keeping the allocation.
    pub fn clear(&mut self) {
        for row in &mut self.data {
            for value in row {
                *value = 0.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Matrix;

    #[test]
    fn zeros_has_requested_shape() {
        let m = Matrix::zeros(3, 2);
        assert_eq!(m.rows, 3);
        assert_eq!(m.cols, 2);
        assert!(m.data.iter().flatten().all(|&v| v == 0.0));
    }

    #[test]
    fn random_uniform_stays_in_range() {
        let m = Matrix::random_uniform(10, 10);
        assert!(m.data.iter().flatten().all(|&v| v > -0.5 && v <= 0.5));
    }

    #[test]
    fn clear_zeroes_without_reshaping() {
        let mut m = Matrix::from_data(vec![vec![1.0, -2.0], vec![3.5, 0.25]]);
        m.clear();
        assert_eq!(m, Matrix::zeros(2, 2));
    }
}
