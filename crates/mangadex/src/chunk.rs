//! Splitting id lists into request-sized batches.
//!
//! Batch endpoints take ids as repeated query parameters, so long lists
//! have to be split to avoid HTTP 414 responses.

/// Split `ids` into consecutive batches of at most `size` elements
///
/// Order is preserved and only the last batch may be shorter. A `size` of
/// zero is treated as one.
pub fn id_chunks<T>(ids: &[T], size: usize) -> std::slice::Chunks<'_, T> {
    ids.chunks(size.max(1))
}
