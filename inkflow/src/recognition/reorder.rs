/// Reorders ranked candidates for a centre-weighted suggestion row: the top candidate
/// goes to the middle slot, so `[c0, c1, c2, ..]` becomes `[c1, c0, c2, ..]`.
pub fn reorder<T>(mut candidates: Vec<T>) -> Vec<T> {
    if candidates.len() >= 2 {
        candidates.swap(0, 1);
    }
    candidates
}
