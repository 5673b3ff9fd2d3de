use super::stepper::{StepResult, Stepper};
use std::cmp::Ordering;

/// Probe left to right; returns the first index holding `target`.
pub fn linear_search(st: &mut Stepper<'_>, target: u32) -> StepResult<Option<usize>> {
    for i in 0..st.len() {
        if st.compare_value(i, target, None)? == Ordering::Equal {
            st.highlight(Some(i), None);
            return Ok(Some(i));
        }
    }
    Ok(None)
}

/// Midpoint search over an already sorted sequence.
pub fn binary_search(st: &mut Stepper<'_>, target: u32) -> StepResult<Option<usize>> {
    if st.len() == 0 {
        return Ok(None);
    }
    let (mut left, mut right) = (0usize, st.len() - 1);
    while left <= right {
        let mid = left + (right - left) / 2;
        match st.compare_value(mid, target, None)? {
            Ordering::Equal => {
                st.highlight(Some(mid), None);
                return Ok(Some(mid));
            }
            Ordering::Less => left = mid + 1,
            Ordering::Greater => {
                if mid == 0 {
                    break;
                }
                right = mid - 1;
            }
        }
    }
    Ok(None)
}
