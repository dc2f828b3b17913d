//! Queue arithmetic for previous/next and relative seeks.

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum PreviousTarget {
    /// Seek the current item back to its start.
    Restart,
    /// Move to another item.
    Item(usize),
}

/// Where "previous" goes from `index` at `position_ms`.
///
/// Past `restart_threshold_ms`, or on the first item, the current item
/// restarts.
pub(crate) fn previous_target(
    index: usize,
    position_ms: u64,
    restart_threshold_ms: u64,
) -> PreviousTarget {
    if index == 0 || position_ms > restart_threshold_ms {
        PreviousTarget::Restart
    } else {
        PreviousTarget::Item(index - 1)
    }
}

/// The item after `index`, if any.
pub(crate) fn next_index(index: usize, len: usize) -> Option<usize> {
    let next = index + 1;
    (next < len).then_some(next)
}

/// `position_ms + delta_ms`, kept inside the item.
pub(crate) fn relative_target(position_ms: u64, delta_ms: i64, duration_ms: Option<u64>) -> u64 {
    let target = position_ms.saturating_add_signed(delta_ms);
    match duration_ms {
        Some(d) => target.min(d),
        None => target,
    }
}
