//! Url-keyed duplicate handling shared by the reconciler and the read path.
//!
//! Both expect their input newest first: the first record seen for a url is
//! the one that survives.

use std::collections::{HashMap, HashSet};
use crate::types::{ArticleView, StoreRecord};

pub trait Identified {
    /// Identity key; an empty key means the item takes no part in dedup.
    fn identity_key(&self) -> &str;
}

impl Identified for StoreRecord {
    fn identity_key(&self) -> &str {
        self.url.trim()
    }
}

impl Identified for ArticleView {
    fn identity_key(&self) -> &str {
        self.url.trim()
    }
}

/// Keep the first item for every non-empty key, drop keyless items, preserve order.
pub fn dedupe<T: Identified>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| {
            let key = item.identity_key();
            !key.is_empty() && seen.insert(key.to_string())
        })
        .collect()
}

/// Group items by key in first-seen order. Keyless items are left out entirely.
pub fn group_by_key<T: Identified>(items: &[T]) -> Vec<Vec<&T>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Vec<&T>> = Vec::new();
    for item in items {
        let key = item.identity_key();
        if key.is_empty() {
            continue;
        }
        match index.get(key) {
            Some(&i) => groups[i].push(item),
            None => {
                index.insert(key, groups.len());
                groups.push(vec![item]);
            }
        }
    }
    groups
}

/// Every item that is not the first of its group.
pub fn redundant<T: Identified>(items: &[T]) -> Vec<&T> {
    group_by_key(items)
        .into_iter()
        .filter(|group| group.len() > 1)
        .flat_map(|group| group.into_iter().skip(1))
        .collect()
}
