//! Reconciliation of tracked state against host reports
//!
//! Both functions here are pure: they look at the tracked sequences and
//! decide what should happen, and the caller applies the result.

use tracing::debug;

/// What a host report means for a tracked sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Tracked state already matches the host
    Unchanged,
    /// Keep only the first `n` tracked entries
    Truncate(usize),
    /// Drop the tracked entries at these ascending indices
    Remove(Vec<usize>),
    /// The flow has nothing left on screen and must finish
    Finish,
}

impl Reconciliation {
    /// Apply to a tracked sequence, returning whether the flow must finish
    pub fn apply<T>(self, tracked: &mut Vec<T>) -> bool {
        match self {
            Self::Unchanged => false,
            Self::Truncate(len) => {
                tracked.truncate(len);
                false
            }
            Self::Remove(indices) => {
                for index in indices.into_iter().rev() {
                    if index < tracked.len() {
                        tracked.remove(index);
                    }
                }
                false
            }
            Self::Finish => true,
        }
    }

    // Suffix removals collapse to a truncation.
    fn removing(indices: Vec<usize>, len: usize) -> Self {
        match indices.first() {
            Some(&first) if indices.len() == len - first => Self::Truncate(first),
            _ => Self::Remove(indices),
        }
    }
}

/// Reconcile a back-navigation to `destination` that took `popped` off the host
///
/// `popped` is what the host removed when it produced the report, so a report
/// delivered late still names the right screens.
///
/// - nothing tracked: the last screen left through some other path, finish
/// - `destination` is already the last tracked screen: unchanged
/// - none of `popped` is tracked: the report is about other screens, unchanged
/// - `destination` is not tracked, or was popped itself: navigation left this
///   flow, finish
/// - otherwise drop the popped screens
pub fn reconcile_pop<T: PartialEq>(tracked: &[T], destination: &T, popped: &[T]) -> Reconciliation {
    let Some(last) = tracked.last() else {
        debug!("reconcile_pop: nothing tracked");
        return Reconciliation::Finish;
    };

    if last == destination {
        return Reconciliation::Unchanged;
    }

    let removed: Vec<usize> = tracked
        .iter()
        .enumerate()
        .filter(|(_, s)| popped.contains(*s))
        .map(|(index, _)| index)
        .collect();
    if removed.is_empty() {
        debug!("reconcile_pop: no tracked screen was popped");
        return Reconciliation::Unchanged;
    }

    let kept = tracked
        .iter()
        .enumerate()
        .any(|(index, s)| s == destination && !removed.contains(&index));
    if !kept {
        debug!("reconcile_pop: destination outside tracked stack");
        return Reconciliation::Finish;
    }

    debug!(removed = removed.len(), tracked = tracked.len(), "reconcile_pop: dropping popped screens");
    Reconciliation::removing(removed, tracked.len())
}

/// Reconcile a user-driven dismissal of the presented screen `screen`
///
/// The result applies to the tracked modals. It finishes only when the
/// dismissal empties both tracked sequences. A screen this flow does not
/// track leaves it unchanged.
pub fn reconcile_dismissal<T: PartialEq>(modals: &[T], screen: &T, stack: usize) -> Reconciliation {
    let Some(index) = modals.iter().position(|m| m == screen) else {
        return Reconciliation::Unchanged;
    };
    if modals.len() == 1 && stack == 0 {
        return Reconciliation::Finish;
    }
    Reconciliation::removing(vec![index], modals.len())
}
