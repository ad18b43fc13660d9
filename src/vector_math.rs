use std::cmp::Ordering;

use ndarray::{Array1, Array2, ArrayView2, Axis};

use crate::core::errors::RagError;

/// Scales a vector to unit length in place. Zero vectors are left untouched.
pub fn l2_normalize(mut vector: Array1<f32>) -> Array1<f32> {
    let norm = vector.dot(&vector).sqrt();
    if norm > f32::EPSILON {
        vector.mapv_inplace(|v| v / norm);
    }
    vector
}

/// Normalises every row of the matrix.
pub fn normalize_rows(matrix: &mut Array2<f32>) {
    for mut row in matrix.axis_iter_mut(Axis(0)) {
        let norm = row.dot(&row).sqrt();
        if norm > f32::EPSILON {
            row.mapv_inplace(|v| v / norm);
        }
    }
}

/// Scores every row of `normalized_rows` against `query` and returns the best `k`
/// as `(row, score)`, highest first. Ties keep row order.
pub fn top_k_by_cosine(
    normalized_rows: ArrayView2<'_, f32>,
    query: &[f32],
    k: usize,
) -> Result<Vec<(usize, f32)>, RagError> {
    let dims = normalized_rows.ncols();
    if query.len() != dims {
        return Err(RagError::Index(format!(
            "Query dimension mismatch: expected {}, got {}",
            dims,
            query.len()
        )));
    }
    if k == 0 || normalized_rows.nrows() == 0 {
        return Ok(Vec::new());
    }

    let query = l2_normalize(Array1::from(query.to_vec()));
    let scores = normalized_rows.dot(&query);

    let mut ranked: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    ranked.sort_by(|left, right| {
        right
            .1
            .partial_cmp(&left.1)
            .unwrap_or(Ordering::Equal)
            .then(left.0.cmp(&right.0))
    });
    ranked.truncate(k);
    Ok(ranked)
}
