//! 集合扩展工具模块
//!
//! 提供计划分析中常用的集合辅助函数

use std::collections::{BTreeSet, HashSet};
use std::hash::Hash;

/// 去重并保持顺序
///
/// # Example
/// ```ignore
/// let cols = vec!["a", "b", "a"];
/// let unique = unique_ordered(cols); // ["a", "b"]
/// ```
#[inline]
pub fn unique_ordered<T: Eq + Hash + Clone>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// 按 key 分组，分组顺序与 key 首次出现的顺序一致
///
/// # Example
/// ```ignore
/// let pairs = vec![("o", "a"), ("c", "b"), ("o", "c")];
/// let grouped = group_by_ordered(pairs, |p| p.0);
/// // [("o", [("o","a"), ("o","c")]), ("c", [("c","b")])]
/// ```
pub fn group_by_ordered<T, K, F>(items: Vec<T>, key_fn: F) -> Vec<(K, Vec<T>)>
where
    K: Eq + Clone,
    F: Fn(&T) -> K,
{
    let mut groups: Vec<(K, Vec<T>)> = Vec::new();
    for item in items {
        let key = key_fn(&item);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, bucket)) => bucket.push(item),
            None => groups.push((key, vec![item])),
        }
    }
    groups
}

/// 集合差集，结果有序
///
/// # Example
/// ```ignore
/// let before = vec!["Seq Scan", "Hash Join"];
/// let after = vec!["Index Scan", "Hash Join"];
/// let (added, removed) = diff_sets(&before, &after);
/// // added: ["Index Scan"], removed: ["Seq Scan"]
/// ```
pub fn diff_sets<T: Ord + Clone>(current: &[T], new_items: &[T]) -> (Vec<T>, Vec<T>) {
    let current_set: BTreeSet<_> = current.iter().cloned().collect();
    let new_set: BTreeSet<_> = new_items.iter().cloned().collect();

    let to_add: Vec<T> = new_set.difference(&current_set).cloned().collect();
    let to_remove: Vec<T> = current_set.difference(&new_set).cloned().collect();

    (to_add, to_remove)
}
