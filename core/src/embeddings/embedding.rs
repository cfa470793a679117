use super::EmbeddingServiceError;

/// Vectors for one run, row `i` belonging to input text `i`.
///
/// All rows share one non-zero dimension, fixed by the first vector pushed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmbeddingMatrix {
    dimension: Option<usize>,
    rows: Vec<Vec<f64>>,
}

impl EmbeddingMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            dimension: None,
            rows: Vec::with_capacity(capacity),
        }
    }

    /// Build a matrix from already validated rows, rejecting ragged or empty vectors.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, EmbeddingServiceError> {
        let mut matrix = Self::with_capacity(rows.len());
        matrix.append_batch(0, rows)?;
        Ok(matrix)
    }

    /// Append the vectors of batch `batch_index`, checking each against the matrix dimension.
    pub(crate) fn append_batch(
        &mut self,
        batch_index: usize,
        vectors: Vec<Vec<f64>>,
    ) -> Result<(), EmbeddingServiceError> {
        let mut dimension = self.dimension;
        for (item_index, vector) in vectors.iter().enumerate() {
            if vector.is_empty() {
                return Err(EmbeddingServiceError::EmptyVector {
                    batch_index,
                    item_index,
                });
            }
            match dimension {
                Some(expected) if expected != vector.len() => {
                    return Err(EmbeddingServiceError::DimensionMismatch {
                        batch_index,
                        item_index,
                        expected,
                        actual: vector.len(),
                    });
                }
                Some(_) => {}
                None => dimension = Some(vector.len()),
            }
        }
        self.dimension = dimension;
        self.rows.extend(vectors);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Vector dimension, `None` while the matrix is empty
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.rows.iter().map(Vec::as_slice)
    }
}

impl std::ops::Index<usize> for EmbeddingMatrix {
    type Output = [f64];

    fn index(&self, index: usize) -> &Self::Output {
        &self.rows[index]
    }
}
