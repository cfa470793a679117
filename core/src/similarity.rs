/// Cosine similarity between two vectors.
///
/// Returns `0.0` when either vector has zero norm, so a degenerate vector is
/// never similar to anything. Vectors of different lengths also score `0.0`.
/// The result is clamped to `[-1.0, 1.0]` against rounding error.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        (dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }
}
