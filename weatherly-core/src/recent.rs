use crate::model::RecentSearchEntry;

pub const MAX_RECENT_SEARCHES: usize = 5;

/// Puts `entry` at the front, dropping any older entry with the same name and
/// anything past [`MAX_RECENT_SEARCHES`].
pub fn record(recent: &[RecentSearchEntry], entry: RecentSearchEntry) -> Vec<RecentSearchEntry> {
    let mut next = Vec::with_capacity(MAX_RECENT_SEARCHES);
    next.extend(recent.iter().filter(|e| !e.name.eq_ignore_ascii_case(&entry.name)).cloned());
    next.insert(0, entry);
    next.truncate(MAX_RECENT_SEARCHES);
    next
}
