//! Priority-ranked selection shared by visitors and editor descriptors.
//!
//! Tie-break rule: among matching items of equal priority, the one registered
//! first wins. Registration order is plugin activation order, which the host
//! fixes; ambiguous same-priority claims are rejected at construction time by
//! [`Composer::validate`](crate::Composer::validate).

/// Something ranked against its peers
pub trait Prioritized {
    /// Higher runs first
    fn priority(&self) -> i32;
}

/// Highest-priority item satisfying `matches`; first registered wins ties
pub fn select_by_priority<'a, T, F>(items: &'a [T], matches: F) -> Option<&'a T>
where
    T: Prioritized,
    F: Fn(&T) -> bool,
{
    let mut best: Option<&'a T> = None;
    for item in items.iter().filter(|item| matches(item)) {
        match best {
            Some(current) if current.priority() >= item.priority() => {}
            _ => best = Some(item),
        }
    }
    best
}

/// Stable sort by descending priority, preserving registration order on ties
pub fn sort_by_priority<T: Prioritized>(items: &mut [T]) {
    items.sort_by_key(|item| std::cmp::Reverse(item.priority()));
}
