//! Which attributes survive elementwise ops, binary ops and reductions.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use subset_r_vm::prelude::*;

fn with_note(mut v: Value) -> Value {
    v.attributes_mut()
        .expect("vector attributes")
        .set_regular("note", Some(Value::from("kept")));
    v
}

// ==================== Unary ====================

#[test]
fn test_sqrt_keeps_dim_sum_drops_it() {
    let m = matrix(vec![1.0, 4.0, 9.0, 16.0, 25.0, 36.0], 2, 3);
    let root = eval("sqrt", vec![m.clone()]);
    assert_eq!(root.dim(), Some(&[2, 3][..]));
    assert_eq!(
        root.as_doubles().unwrap(),
        vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
    );

    let total = eval("sum", vec![m]);
    assert_eq!(total, Value::Double(91.0));
    assert!(total.dim().is_none());
    assert!(total.is_scalar());
}

#[test]
fn test_regular_attributes_follow_elementwise_ops() {
    let x = with_note(Value::double_vec(vec![-1.0, 2.0]));
    let v = eval("abs", vec![x.clone()]);
    assert_eq!(v.get_attr("note"), Some(Value::from("kept")));
    let total = eval("max", vec![x]);
    assert_eq!(total, Value::Double(2.0));
    assert!(!total.has_attributes());
}

#[test]
fn test_is_na_keeps_only_shape_attributes() {
    let x = with_note(named_ints(vec![1, INT_NA], &["a", "b"]));
    let v = eval("is.na", vec![x]);
    assert_eq!(
        v.as_logicals().unwrap(),
        vec![Logical::False, Logical::True]
    );
    assert_eq!(string_elements(&eval("names", vec![v.clone()])), vec![
        Some("a".to_string()),
        Some("b".to_string())
    ]);
    assert_eq!(v.get_attr("note"), None);
}

// ==================== Binary ====================

#[test]
fn test_binary_names_from_longer_operand() {
    let x = named_ints(vec![1, 2, 3, 4], &["a", "b", "c", "d"]);
    let v = eval("*", vec![Value::int_vec(vec![10, 20]), x]);
    assert_eq!(v.as_ints().unwrap(), vec![10, 40, 30, 80]);
    assert_eq!(v.names().map(|n| n.len()), Some(4));
}

#[test]
fn test_binary_names_from_right_operand_of_equal_length() {
    let x = named_ints(vec![1, 2], &["a", "b"]);
    let v = eval("+", vec![Value::double_vec(vec![10.0, 20.0]), x]);
    assert_eq!(v.as_doubles().unwrap(), vec![11.0, 22.0]);
    assert_eq!(
        string_elements(&eval("names", vec![v])),
        vec![Some("a".to_string()), Some("b".to_string())]
    );
}

#[test]
fn test_binary_names_dropped_under_recycling() {
    let x = named_ints(vec![1, 2], &["a", "b"]);
    let v = eval("+", vec![x, Value::int_vec(vec![1, 2, 3, 4])]);
    assert!(v.names().is_none());
}

#[test]
fn test_binary_dims_must_conform() {
    let a = matrix(vec![1.0; 6], 2, 3);
    let b = matrix(vec![1.0; 6], 3, 2);
    let sum = eval("+", vec![a.clone(), Value::Double(1.0)]);
    assert_eq!(sum.dim(), Some(&[2, 3][..]));

    let err = call_err(&mut Vm::new(), "+", vec![a, b]);
    assert_eq!(err.kind(), ErrorKind::Value);
    assert_eq!(err.message(), "non-conformable arrays");
}

#[test]
fn test_ragged_recycling_warns() {
    let mut vm = Vm::new();
    let v = call(
        &mut vm,
        "+",
        vec![Value::int_vec(vec![1, 2, 3]), Value::int_vec(vec![1, 2])],
    );
    assert_eq!(v, Value::int_vec(vec![2, 4, 4]));
    assert_eq!(
        warning_messages(&vm),
        vec!["longer object length is not a multiple of shorter object length".to_string()]
    );
}

// ==================== Replacement functions ====================

#[test]
fn test_dim_then_arithmetic() {
    let mut vm = Vm::new();
    let x = call(
        &mut vm,
        "dim<-",
        vec![Value::double_vec(vec![1.0, 2.0, 3.0, 4.0]), Value::int_vec(vec![2, 2])],
    );
    let y = call(&mut vm, "-", vec![x]);
    assert_eq!(call(&mut vm, "dim", vec![y]), Value::int_vec(vec![2, 2]));
}

#[test]
fn test_dim_assign_with_overflowing_product() {
    let big = 1 << 30;
    let err = call_err(
        &mut Vm::new(),
        "dim<-",
        vec![Value::int_vec(vec![1, 2]), Value::int_vec(vec![big, big, big, 4])],
    );
    assert_eq!(err.kind(), ErrorKind::Value);
    assert!(err.message().starts_with("dims [product "));
}

#[test]
fn test_factor_class_survives_attr_copy() {
    let mut vm = Vm::new();
    let f = Value::factor(vec![1, 2, 1], &["lo", "hi"]);
    assert_eq!(
        call(&mut vm, "class", vec![f.clone()]),
        Value::from("factor")
    );
    let labels = call(&mut vm, "as.character", vec![f]);
    assert_eq!(labels, strings(&["lo", "hi", "lo"]));
}
