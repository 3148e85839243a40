//! Batching for collection requests.

/// Split `items` into consecutive batches of at most `size` items.
///
/// A `size` of 0 is treated as 1.
pub fn chunked<T>(items: &[T], size: usize) -> std::slice::Chunks<'_, T> {
    items.chunks(size.max(1))
}
