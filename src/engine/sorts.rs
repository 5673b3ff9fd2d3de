//! The six sorting algorithms, written against `Stepper`.
//!
//! Counting convention: every value comparison is one comparison; every
//! exchange and every overwrite that relocates a value is one swap.

use super::stepper::{StepResult, Stepper};
use std::cmp::Ordering;

pub fn bubble_sort(st: &mut Stepper<'_>) -> StepResult {
    let n = st.len();
    for pass in 0..n.saturating_sub(1) {
        for j in 0..n - pass - 1 {
            if st.compare(j, j + 1)? == Ordering::Greater {
                st.exchange(j, j + 1)?;
            }
        }
    }
    Ok(())
}

pub fn selection_sort(st: &mut Stepper<'_>) -> StepResult {
    let n = st.len();
    for i in 0..n.saturating_sub(1) {
        let mut min = i;
        for j in i + 1..n {
            if st.compare(j, min)? == Ordering::Less {
                min = j;
            }
        }
        st.exchange(i, min)?;
    }
    Ok(())
}

pub fn insertion_sort(st: &mut Stepper<'_>) -> StepResult {
    for i in 1..st.len() {
        let key = st.value(i);
        let mut j = i;
        while j > 0 {
            if st.compare_value(j - 1, key, Some(j))? != Ordering::Greater {
                break;
            }
            let shifted = st.value(j - 1);
            st.place(j, shifted)?;
            j -= 1;
        }
        if j != i {
            st.highlight(Some(j), None);
            st.place(j, key)?;
        }
    }
    Ok(())
}

pub fn quick_sort(st: &mut Stepper<'_>) -> StepResult {
    let n = st.len();
    if n > 1 {
        quick_range(st, 0, n - 1)?;
    }
    Ok(())
}

fn quick_range(st: &mut Stepper<'_>, low: usize, high: usize) -> StepResult {
    st.ensure_running()?;
    if low >= high {
        return Ok(());
    }
    let pivot = partition(st, low, high)?;
    if pivot > low {
        quick_range(st, low, pivot - 1)?;
    }
    quick_range(st, pivot + 1, high)
}

/// Lomuto partition around `values[high]`; returns the pivot's final slot.
fn partition(st: &mut Stepper<'_>, low: usize, high: usize) -> StepResult<usize> {
    let pivot = st.value(high);
    let mut store = low;
    for j in low..high {
        if st.compare_value(j, pivot, Some(high))? == Ordering::Less {
            st.exchange(store, j)?;
            store += 1;
        }
    }
    st.exchange(store, high)?;
    Ok(store)
}

pub fn merge_sort(st: &mut Stepper<'_>) -> StepResult {
    let n = st.len();
    let mut aux = vec![0u32; n];
    if n > 1 {
        merge_range(st, &mut aux, 0, n - 1)?;
    }
    Ok(())
}

fn merge_range(st: &mut Stepper<'_>, aux: &mut [u32], left: usize, right: usize) -> StepResult {
    st.ensure_running()?;
    if left >= right {
        return Ok(());
    }
    let mid = left + (right - left) / 2;
    merge_range(st, aux, left, mid)?;
    merge_range(st, aux, mid + 1, right)?;
    merge(st, aux, left, mid, right)
}

fn merge(
    st: &mut Stepper<'_>,
    aux: &mut [u32],
    left: usize,
    mid: usize,
    right: usize,
) -> StepResult {
    aux[left..=right].copy_from_slice(&st.values()[left..=right]);

    let (mut i, mut j, mut k) = (left, mid + 1, left);
    while i <= mid && j <= right {
        st.note_comparison(Some(i), Some(j))?;
        // ties take the left run, which keeps the sort stable
        if aux[i] <= aux[j] {
            st.place(k, aux[i])?;
            i += 1;
        } else {
            st.place(k, aux[j])?;
            j += 1;
        }
        k += 1;
    }
    while i <= mid {
        st.highlight(Some(i), None);
        st.place(k, aux[i])?;
        i += 1;
        k += 1;
    }
    while j <= right {
        st.highlight(None, Some(j));
        st.place(k, aux[j])?;
        j += 1;
        k += 1;
    }
    Ok(())
}

pub fn heap_sort(st: &mut Stepper<'_>) -> StepResult {
    let n = st.len();
    for root in (0..n / 2).rev() {
        sift_down(st, root, n)?;
    }
    for end in (1..n).rev() {
        st.exchange(0, end)?;
        sift_down(st, 0, end)?;
    }
    Ok(())
}

/// Restore the max-heap property for the subtree at `root` within `values[..len]`.
fn sift_down(st: &mut Stepper<'_>, mut root: usize, len: usize) -> StepResult {
    loop {
        let left = 2 * root + 1;
        if left >= len {
            return Ok(());
        }
        let mut largest = root;
        if st.compare(left, largest)? == Ordering::Greater {
            largest = left;
        }
        let right = left + 1;
        if right < len && st.compare(right, largest)? == Ordering::Greater {
            largest = right;
        }
        if largest == root {
            return Ok(());
        }
        st.exchange(root, largest)?;
        root = largest;
    }
}
