//! NA propagation through the elementwise math, arithmetic and reduction
//! builtins.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use subset_r_vm::prelude::*;
use subset_r_vm_runtime::na::is_double_na;

fn double_with_na() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => -1e6f64..1e6,
        1 => Just(DOUBLE_NA),
        1 => Just(f64::NAN),
    ]
}

fn doubles_of(v: &Value) -> Vec<f64> {
    v.as_doubles().expect("double result")
}

// ==================== Scalar NA ====================

#[test]
fn test_na_scalars_give_typed_na() {
    let cases = [
        ("abs", Value::na_integer(), RType::Integer),
        ("abs", Value::na_logical(), RType::Integer),
        ("abs", Value::na_double(), RType::Double),
        ("sqrt", Value::na_integer(), RType::Double),
        ("floor", Value::na_integer(), RType::Double),
        ("round", Value::na_integer(), RType::Integer),
        ("round", Value::na_double(), RType::Double),
        ("signif", Value::na_integer(), RType::Integer),
        ("signif", Value::na_double(), RType::Double),
    ];
    for (name, x, rtype) in cases {
        let v = eval(name, vec![x.clone()]);
        assert_eq!(v.rtype(), rtype, "{}({:?})", name, x);
        assert!(!v.is_complete(), "{}({:?}) should be NA", name, x);
        assert_eq!(v.len(), 1);
    }
}

#[test]
fn test_nan_is_not_na() {
    let v = eval("sqrt", vec![Value::Double(f64::NAN)]);
    match v {
        Value::Double(d) => {
            assert!(d.is_nan());
            assert!(!is_double_na(d));
        }
        other => panic!("unexpected {:?}", other),
    }
    let inf = eval("exp", vec![Value::Double(f64::INFINITY)]);
    assert_eq!(inf, Value::Double(f64::INFINITY));
}

#[test]
fn test_sqrt_of_negative_warns_not_na() {
    let mut vm = Vm::new();
    let v = call(&mut vm, "sqrt", vec![Value::double_vec(vec![4.0, -1.0])]);
    let d = doubles_of(&v);
    assert_eq!(d[0], 2.0);
    assert!(d[1].is_nan() && !is_double_na(d[1]));
    assert_eq!(warning_messages(&vm), vec!["NaNs produced".to_string()]);
}

// ==================== Reductions ====================

#[test]
fn test_sum_with_na() {
    let x = Value::int_vec(vec![1, INT_NA, 3]);
    assert_eq!(eval("sum", vec![x.clone()]), Value::na_integer());
    let mut vm = Vm::new();
    let v = vm
        .call_builtin("sum", vec![Arg::positional(x), Arg::named("na.rm", true)])
        .unwrap();
    assert_eq!(v, Value::Integer(4));
}

#[test]
fn test_max_of_nothing_warns() {
    let mut vm = Vm::new();
    let v = call(&mut vm, "max", vec![]);
    assert_eq!(v, Value::Double(f64::NEG_INFINITY));
    assert_eq!(
        warning_messages(&vm),
        vec!["no non-missing arguments to max; returning -Inf".to_string()]
    );
}

#[test]
fn test_any_na_skips_non_applicable() {
    let env = Value::Environment(Vm::new().session().global_env().clone());
    assert_eq!(eval("anyNA", vec![env]), Value::from(false));
    assert_eq!(
        eval("anyNA", vec![Value::double_vec(vec![1.0, f64::NAN])]),
        Value::from(true)
    );
}

#[test]
fn test_pmax_nan_then_na() {
    let v = eval(
        "pmax",
        vec![
            Value::double_vec(vec![f64::NAN, DOUBLE_NA, 1.0]),
            Value::double_vec(vec![DOUBLE_NA, f64::NAN, f64::NAN]),
        ],
    );
    let out = doubles_of(&v);
    assert!(is_double_na(out[0]));
    assert!(is_double_na(out[1]));
    assert!(out[2].is_nan() && !is_double_na(out[2]));
}

fn logical_with_na() -> impl Strategy<Value = Logical> {
    prop_oneof![Just(Logical::True), Just(Logical::False), Just(Logical::NA)]
}

// ==================== Properties ====================

proptest! {
    #[test]
    fn abs_keeps_na_positions(data in prop::collection::vec(double_with_na(), 0..40)) {
        let v = eval("abs", vec![Value::double_vec(data.clone())]);
        let out = doubles_of(&v);
        prop_assert_eq!(out.len(), data.len());
        for (x, y) in data.iter().zip(&out) {
            prop_assert_eq!(is_double_na(*x), is_double_na(*y));
            if x.is_nan() && !is_double_na(*x) {
                prop_assert!(y.is_nan() && !is_double_na(*y));
            }
        }
    }

    #[test]
    fn complete_input_gives_complete_output(data in prop::collection::vec(0.0f64..1e6, 1..40)) {
        for name in ["abs", "sqrt", "floor", "round", "signif"] {
            let v = eval(name, vec![Value::double_vec(data.clone())]);
            prop_assert!(v.is_complete(), "{} lost completeness", name);
        }
    }

    #[test]
    fn complete_flag_is_never_wrong(data in prop::collection::vec(double_with_na(), 1..40)) {
        let v = eval("round", vec![Value::double_vec(data)]);
        if v.is_complete() {
            prop_assert!(doubles_of(&v).iter().all(|x| !is_double_na(*x)));
        }
    }

    #[test]
    fn round_is_idempotent(x in -1e9f64..1e9) {
        let once = eval("round", vec![Value::Double(x)]);
        let twice = eval("round", vec![once.clone()]);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn addition_propagates_na(
        data in prop::collection::vec(-1000i32..1000, 1..30),
        na_at in 0usize..30,
    ) {
        let mut data = data;
        let i = na_at % data.len();
        data[i] = INT_NA;
        let v = eval("+", vec![Value::int_vec(data.clone()), Value::Integer(1)]);
        let out = v.as_ints().expect("integer result");
        prop_assert_eq!(out[i], INT_NA);
        for (j, x) in data.iter().enumerate() {
            if j != i {
                prop_assert_eq!(out[j], x + 1);
            }
        }
    }

    #[test]
    fn sum_na_rm_ignores_na(data in prop::collection::vec(double_with_na(), 0..40)) {
        let mut vm = Vm::new();
        let v = vm
            .call_builtin(
                "sum",
                vec![Arg::positional(Value::double_vec(data.clone())), Arg::named("na.rm", true)],
            )
            .unwrap();
        let expected: f64 = data.iter().filter(|x| !x.is_nan()).sum();
        match v {
            Value::Double(d) => prop_assert!((d - expected).abs() <= 1e-6 * expected.abs().max(1.0)),
            other => prop_assert!(false, "unexpected {:?}", other),
        }
    }

    #[test]
    fn pmax_is_na_where_an_operand_is_na(
        data in prop::collection::vec(double_with_na(), 1..30),
        other in double_with_na(),
    ) {
        let v = eval("pmax", vec![Value::double_vec(data.clone()), Value::Double(other)]);
        let out = doubles_of(&v);
        prop_assert_eq!(out.len(), data.len());
        for (x, y) in data.iter().zip(&out) {
            if is_double_na(*x) || is_double_na(other) {
                prop_assert!(is_double_na(*y));
            } else if x.is_nan() || other.is_nan() {
                prop_assert!(y.is_nan() && !is_double_na(*y));
            } else {
                prop_assert_eq!(*y, x.max(other));
            }
        }
    }

    #[test]
    fn all_and_any_use_three_valued_logic(
        data in prop::collection::vec(logical_with_na(), 0..20),
    ) {
        let x = Value::logical_vec(data.clone());
        let all = eval("all", vec![x.clone()]);
        let any = eval("any", vec![x]);
        let expected_all = if data.contains(&Logical::False) {
            Logical::False
        } else if data.contains(&Logical::NA) {
            Logical::NA
        } else {
            Logical::True
        };
        let expected_any = if data.contains(&Logical::True) {
            Logical::True
        } else if data.contains(&Logical::NA) {
            Logical::NA
        } else {
            Logical::False
        };
        prop_assert_eq!(all, Value::Logical(expected_all));
        prop_assert_eq!(any, Value::Logical(expected_any));
    }

    #[test]
    fn is_na_matches_elements(data in prop::collection::vec(double_with_na(), 0..40)) {
        let v = eval("is.na", vec![Value::double_vec(data.clone())]);
        let flags = v.as_logicals().unwrap_or_default();
        prop_assert_eq!(flags.len(), data.len());
        for (x, f) in data.iter().zip(&flags) {
            prop_assert_eq!(x.is_nan(), *f == Logical::True);
        }
    }
}
