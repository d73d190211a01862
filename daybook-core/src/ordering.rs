//! Order keys within a date bucket.
//!
//! A bucket is every task sharing the same `date` (the inbox is the `None`
//! bucket). Keys are plain `f64`s: inserting between two neighbours takes the
//! midpoint, and every move renumbers the destination bucket to `0..n-1`
//! first, which keeps fractional keys from piling up.

use crate::task::{Task, bucket_cmp};

/// Outcome of planning a move: the mover's new key plus every other task in
/// the destination bucket whose key changed during normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct MovePlan {
    pub order: f64,
    pub renumbered: Vec<(String, f64)>,
}

/// Tasks in `date`'s bucket, sorted by `(order, created_at)`, minus `exclude`.
pub fn sorted_bucket<'a>(tasks: &'a [Task], date: Option<&str>, exclude: Option<&str>) -> Vec<&'a Task> {
    let mut bucket: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.in_bucket(date) && Some(t.id.as_str()) != exclude)
        .collect();
    bucket.sort_by(|a, b| bucket_cmp(a, b));
    bucket
}

/// Order key for a new task appended to the tail of `date`'s bucket.
pub fn next_order(tasks: &[Task], date: Option<&str>) -> f64 {
    tasks
        .iter()
        .filter(|t| t.in_bucket(date))
        .map(|t| t.order)
        .fold(None, |max: Option<f64>, o| Some(max.map_or(o, |m| m.max(o))))
        .map_or(0.0, |m| m + 1.0)
}

/// Sequential keys for an already sorted bucket. Only entries whose key
/// actually changes are returned, so a normalized bucket yields nothing.
pub fn normalize(bucket: &[&Task]) -> Vec<(String, f64)> {
    bucket
        .iter()
        .enumerate()
        .filter_map(|(i, t)| {
            let key = i as f64;
            (t.order != key).then(|| (t.id.clone(), key))
        })
        .collect()
}

/// Key for inserting at `dest_index` into a bucket holding `keys` (sorted,
/// normalized). `None` means the end of the list.
pub fn insertion_key(keys: &[f64], dest_index: Option<usize>) -> f64 {
    let n = keys.len();
    let Some((first, last)) = keys.first().zip(keys.last()) else {
        return 0.0;
    };

    match dest_index {
        Some(0) => first - 1.0,
        Some(i) if i < n => (keys[i - 1] + keys[i]) / 2.0,
        _ => last + 1.0,
    }
}

/// Plan moving task `id` into `new_date` at `dest_index`.
///
/// Returns `None` when the task does not exist.
pub fn plan_move(
    tasks: &[Task],
    id: &str,
    new_date: Option<&str>,
    dest_index: Option<usize>,
) -> Option<MovePlan> {
    if !tasks.iter().any(|t| t.id == id) {
        return None;
    }

    let bucket = sorted_bucket(tasks, new_date, Some(id));
    let renumbered = normalize(&bucket);
    let keys: Vec<f64> = (0..bucket.len()).map(|i| i as f64).collect();

    Some(MovePlan {
        order: insertion_key(&keys, dest_index),
        renumbered,
    })
}
