//! Property tests for NA tracking, recycling and coercion.

use proptest::prelude::*;
use subset_r_vm_runtime::convert::Coercer;
use subset_r_vm_runtime::na::{is_double_na, Element, DOUBLE_NA, INT_NA};
use subset_r_vm_runtime::recycle::{recycle, rep_int};
use subset_r_vm_runtime::{NaCheck, Value, Vector};

fn int_with_na() -> impl Strategy<Value = i32> {
    prop_oneof![9 => -1000i32..1000, 1 => Just(INT_NA)]
}

fn double_with_na() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => -1e6f64..1e6,
        1 => Just(DOUBLE_NA),
        1 => Just(f64::NAN),
    ]
}

// ==================== NaCheck soundness ====================

proptest! {
    #[test]
    fn tracker_never_claims_complete_with_na(data in prop::collection::vec(int_with_na(), 0..50)) {
        let input = Vector::from_vec(data);
        let mut na = NaCheck::new();
        na.enable_vector(&input);
        let out: Vec<f64> = input
            .iter()
            .map(|x| if na.check(x) { DOUBLE_NA } else { *x as f64 * 2.0 })
            .collect();
        let has_na = out.iter().any(|x| x.is_na());
        let result = Vector::new(out, na.never_seen_na());
        prop_assert!(!(result.is_complete() && has_na));
        prop_assert_eq!(result.is_complete(), input.is_complete());
    }

    #[test]
    fn coercion_to_double_keeps_na_positions(data in prop::collection::vec(int_with_na(), 0..50)) {
        let v = Coercer::strict().double(&Value::int_vec(data.clone())).unwrap();
        for (i, x) in data.iter().enumerate() {
            prop_assert_eq!(*x == INT_NA, is_double_na(v.as_slice()[i]));
        }
        prop_assert_eq!(v.is_complete(), !data.contains(&INT_NA));
    }

    #[test]
    fn coercion_to_character_is_sound(data in prop::collection::vec(double_with_na(), 0..30)) {
        let v = Coercer::strict().character(&Value::double_vec(data.clone())).unwrap();
        for (i, x) in data.iter().enumerate() {
            prop_assert_eq!(is_double_na(*x), v.as_slice()[i].is_na());
        }
        if v.is_complete() {
            prop_assert!(v.iter().all(|s| !s.is_na()));
        }
    }
}

// ==================== Recycling ====================

proptest! {
    #[test]
    fn recycled_length_is_max_or_zero(lengths in prop::collection::vec(0usize..20, 1..5)) {
        let r = recycle(&lengths);
        if lengths.contains(&0) {
            prop_assert_eq!(r.len(), 0);
        } else {
            prop_assert_eq!(r.len(), *lengths.iter().max().unwrap());
            for (k, n) in lengths.iter().enumerate() {
                for i in 0..r.len() {
                    prop_assert!(r.index(k, i) < *n);
                    prop_assert_eq!(r.index(k, i), i % n);
                }
            }
        }
    }

    #[test]
    fn rep_int_whole_vector_length(data in prop::collection::vec(-5i32..5, 0..10), times in 0i32..5) {
        let x = Vector::from_vec(data.clone());
        let out = rep_int(&x, &[times]).unwrap();
        prop_assert_eq!(out.len(), data.len() * times as usize);
        prop_assert_eq!(out.is_complete(), x.is_complete());
    }

    #[test]
    fn rep_int_per_element_sum(times in prop::collection::vec(0i32..4, 1..8)) {
        let x = Vector::from_vec((0..times.len() as i32).collect::<Vec<_>>());
        let out = rep_int(&x, &times).unwrap();
        let total: i32 = times.iter().sum();
        prop_assert_eq!(out.len(), total as usize);
        // each element appears consecutively
        let mut expected = Vec::new();
        for (i, t) in times.iter().enumerate() {
            expected.extend(std::iter::repeat(i as i32).take(*t as usize));
        }
        prop_assert_eq!(out.as_slice(), expected.as_slice());
    }
}

#[test]
fn test_rep_int_other_lengths_fail() {
    let x = Vector::from_vec(vec![1, 2, 3]);
    let err = rep_int(&x, &[1, 2]).unwrap_err();
    assert_eq!(err.to_string(), "invalid 'times' value");
}
