//! Stable merge sort with a fallible comparator.
//!
//! `slice::sort_by` cannot propagate an error out of the comparator, and
//! sort keys that come from user expressions can fail. Equal elements keep
//! their input order.

use std::cmp::Ordering;
use std::convert::Infallible;

/// Runs shorter than this are finished with insertion sort.
pub const INSERTION_THRESHOLD: usize = 16;

pub fn merge_sort_by<T, F>(items: &mut [T], mut compare: F)
where
    T: Clone,
    F: FnMut(&T, &T) -> Ordering,
{
    let result: Result<(), Infallible> = try_merge_sort_by(items, |a, b| Ok(compare(a, b)));
    match result {
        Ok(()) => {}
        Err(never) => match never {},
    }
}

/// Sorts `items` in place. The first comparator error aborts the sort and
/// leaves `items` in an unspecified order.
pub fn try_merge_sort_by<T, E, F>(items: &mut [T], mut compare: F) -> Result<(), E>
where
    T: Clone,
    F: FnMut(&T, &T) -> Result<Ordering, E>,
{
    if items.len() < 2 {
        return Ok(());
    }
    let mut scratch = Vec::with_capacity(items.len() / 2 + 1);
    sort_run(items, &mut scratch, &mut compare)
}

fn sort_run<T, E, F>(items: &mut [T], scratch: &mut Vec<T>, compare: &mut F) -> Result<(), E>
where
    T: Clone,
    F: FnMut(&T, &T) -> Result<Ordering, E>,
{
    let len = items.len();
    if len < INSERTION_THRESHOLD {
        return insertion_sort_by(items, compare);
    }

    let mid = len / 2;
    sort_run(&mut items[..mid], scratch, compare)?;
    sort_run(&mut items[mid..], scratch, compare)?;

    if compare(&items[mid - 1], &items[mid])? != Ordering::Greater {
        return Ok(());
    }
    merge(items, mid, scratch, compare)
}

/// Merges the sorted halves `items[..mid]` and `items[mid..]`. The left half
/// is moved to `scratch`; the write cursor never overtakes the right cursor.
fn merge<T, E, F>(
    items: &mut [T],
    mid: usize,
    scratch: &mut Vec<T>,
    compare: &mut F,
) -> Result<(), E>
where
    T: Clone,
    F: FnMut(&T, &T) -> Result<Ordering, E>,
{
    scratch.clear();
    scratch.extend_from_slice(&items[..mid]);

    let (mut left, mut right, mut out) = (0, mid, 0);
    while left < scratch.len() && right < items.len() {
        // Ties take from the left run.
        if compare(&scratch[left], &items[right])? == Ordering::Greater {
            items.swap(out, right);
            right += 1;
        } else {
            items[out] = scratch[left].clone();
            left += 1;
        }
        out += 1;
    }
    while left < scratch.len() {
        items[out] = scratch[left].clone();
        left += 1;
        out += 1;
    }
    Ok(())
}

fn insertion_sort_by<T, E, F>(items: &mut [T], compare: &mut F) -> Result<(), E>
where
    F: FnMut(&T, &T) -> Result<Ordering, E>,
{
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && compare(&items[j - 1], &items[j])? == Ordering::Greater {
            items.swap(j - 1, j);
            j -= 1;
        }
    }
    Ok(())
}
