//! String and vector builtins: substr, charmatch, nchar, tabulate, rep.int,
//! c and friends.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use subset_r_vm::prelude::*;

fn some(s: &str) -> Option<String> {
    Some(s.to_string())
}

// ==================== substr ====================

#[test]
fn test_substr_recycles_start_and_stop() {
    let v = eval(
        "substr",
        vec![strings(&["hello", "world"]), Value::Integer(1), Value::Integer(3)],
    );
    assert_eq!(string_elements(&v), vec![some("hel"), some("wor")]);
}

#[test]
fn test_substr_output_length_is_longest_argument() {
    let v = eval(
        "substr",
        vec![
            Value::from("abcde"),
            Value::int_vec(vec![1, 2]),
            Value::int_vec(vec![3, 4, 5]),
        ],
    );
    assert_eq!(string_elements(&v), vec![some("abc"), some("bcd"), some("abcde")]);
}

#[test]
fn test_substr_clips_and_empties() {
    let v = eval(
        "substr",
        vec![
            strings(&["abc", "abc", "abc"]),
            Value::int_vec(vec![0, 3, 5]),
            Value::int_vec(vec![2, 1, 9]),
        ],
    );
    assert_eq!(string_elements(&v), vec![some("ab"), some(""), some("")]);
}

#[test]
fn test_substr_na_and_empty_input() {
    let v = eval(
        "substr",
        vec![
            Value::string_vec_from(vec![RString::from("abc"), RString::na()]),
            Value::int_vec(vec![1, 1]),
            Value::int_vec(vec![INT_NA, 2]),
        ],
    );
    assert_eq!(string_elements(&v), vec![None, None]);

    let empty = eval(
        "substr",
        vec![strings(&[]), Value::int_vec(vec![1, 2]), Value::Integer(3)],
    );
    assert_eq!(empty.len(), 0);
    assert_eq!(empty.rtype(), RType::Character);
}

#[test]
fn test_substr_of_number_is_type_error() {
    let err = call_err(
        &mut Vm::new(),
        "substr",
        vec![Value::Double(12345.0), Value::Integer(1), Value::Integer(2)],
    );
    assert_eq!(err.kind(), ErrorKind::Type);
    assert_eq!(
        err.message(),
        "extracting substrings from a non-character object"
    );
}

// ==================== charmatch ====================

#[test]
fn test_charmatch_cases() {
    let table = strings(&["mean", "median"]);
    let v = eval(
        "charmatch",
        vec![strings(&["m", "me", "xyz"]), table.clone(), Value::Integer(0)],
    );
    assert_eq!(v, Value::int_vec(vec![0, 0, 0]));

    let v = eval("charmatch", vec![Value::from("me"), table, Value::Integer(0)]);
    assert_eq!(v, Value::Integer(0));

    let v = eval(
        "charmatch",
        vec![Value::from("mea"), strings(&["mean", "zzz"]), Value::Integer(0)],
    );
    assert_eq!(v, Value::Integer(1));
}

#[test]
fn test_charmatch_exact_beats_prefix() {
    let v = eval(
        "charmatch",
        vec![Value::from("mean"), strings(&["mean", "meanest"])],
    );
    assert_eq!(v, Value::Integer(1));
    let v = eval(
        "charmatch",
        vec![Value::from("mean"), strings(&["mean", "mean"])],
    );
    assert_eq!(v, Value::Integer(0));
    let v = eval("charmatch", vec![Value::from("q"), strings(&["mean"])]);
    assert_eq!(v, Value::na_integer());
}

// ==================== nchar / case ====================

#[test]
fn test_nchar_types() {
    let x = strings(&["héllo", ""]);
    assert_eq!(eval("nchar", vec![x.clone()]), Value::int_vec(vec![5, 0]));
    assert_eq!(
        eval("nchar", vec![x, Value::from("bytes")]),
        Value::int_vec(vec![6, 0])
    );
    let err = call_err(
        &mut Vm::new(),
        "nchar",
        vec![Value::from("a"), Value::from("letters")],
    );
    assert_eq!(err.message(), "invalid 'type' argument");
}

#[test]
fn test_case_mapping_keeps_names_and_na() {
    let mut x = Value::string_vec_from(vec![RString::from("Ab"), RString::na()]);
    x.attributes_mut()
        .unwrap()
        .set_names(Some(vec![RString::from("p"), RString::from("q")]));
    let up = eval("toupper", vec![x.clone()]);
    assert_eq!(string_elements(&up), vec![some("AB"), None]);
    assert_eq!(up.names().map(|n| n.len()), Some(2));
    let low = eval("tolower", vec![x]);
    assert_eq!(string_elements(&low), vec![some("ab"), None]);
}

// ==================== tabulate ====================

#[test]
fn test_tabulate_ignores_na_and_out_of_range() {
    let bin = Value::int_vec(vec![1, 2, 2, INT_NA, 5]);
    let v = eval("tabulate", vec![bin, Value::Integer(3)]);
    assert_eq!(v, Value::int_vec(vec![1, 2, 0]));
}

#[test]
fn test_tabulate_default_nbins() {
    let v = eval("tabulate", vec![Value::int_vec(vec![2, 3, 3, -1])]);
    assert_eq!(v, Value::int_vec(vec![0, 1, 2]));
    let err = call_err(
        &mut Vm::new(),
        "tabulate",
        vec![Value::Integer(1), Value::Integer(-2)],
    );
    assert_eq!(err.kind(), ErrorKind::Value);
}

// ==================== rep.int / rep_len ====================

#[test]
fn test_rep_int_whole_and_per_element() {
    let x = Value::int_vec(vec![1, 2]);
    assert_eq!(
        eval("rep.int", vec![x.clone(), Value::Integer(2)]),
        Value::int_vec(vec![1, 2, 1, 2])
    );
    assert_eq!(
        eval("rep.int", vec![x.clone(), Value::int_vec(vec![3, 1])]),
        Value::int_vec(vec![1, 1, 1, 2])
    );
    let err = call_err(
        &mut Vm::new(),
        "rep.int",
        vec![x, Value::int_vec(vec![1, 2, 3])],
    );
    assert_eq!(err.kind(), ErrorKind::Value);
    assert_eq!(err.message(), "invalid 'times' value");
}

#[test]
fn test_rep_int_huge_times_is_an_error() {
    let err = call_err(
        &mut Vm::new(),
        "rep.int",
        vec![Value::int_vec(vec![1, 2, 3]), Value::Integer(i32::MAX)],
    );
    assert_eq!(err.kind(), ErrorKind::Value);
}

#[test]
fn test_rep_len() {
    assert_eq!(
        eval("rep_len", vec![strings(&["a", "b"]), Value::Integer(3)]),
        strings(&["a", "b", "a"])
    );
}

// ==================== c / which / length ====================

#[test]
fn test_combine_coerces_and_names() {
    let v = eval(
        "c",
        vec![Value::Integer(1), Value::Double(2.5), Value::from(true)],
    );
    assert_eq!(v, Value::double_vec(vec![1.0, 2.5, 1.0]));

    let mut vm = Vm::new();
    let v = vm
        .call_builtin(
            "c",
            vec![
                Arg::named("a", 1),
                Arg::named("b", Value::int_vec(vec![2, 3])),
                Arg::positional(4),
            ],
        )
        .unwrap();
    assert_eq!(
        string_elements(&call(&mut vm, "names", vec![v])),
        vec![some("a"), some("b1"), some("b2"), some("")]
    );
}

#[test]
fn test_which_family() {
    let x = Value::logical_vec(vec![Logical::False, Logical::True, Logical::NA, Logical::True]);
    assert_eq!(eval("which", vec![x]), Value::int_vec(vec![2, 4]));
    let d = Value::double_vec(vec![3.0, f64::NAN, 7.0, 7.0]);
    assert_eq!(eval("which.max", vec![d.clone()]), Value::Integer(3));
    assert_eq!(eval("which.min", vec![d]), Value::Integer(1));
}

#[test]
fn test_length() {
    assert_eq!(eval("length", vec![Value::Null]), Value::Integer(0));
    assert_eq!(eval("length", vec![strings(&["a", "b"])]), Value::Integer(2));
}

#[test]
fn test_row_and_col_means() {
    let x = Value::double_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, DOUBLE_NA]);
    let mut vm = Vm::new();
    let rows = call(
        &mut vm,
        "rowMeans",
        vec![x.clone(), Value::Integer(2), Value::Integer(3), Value::from(true)],
    );
    assert_eq!(rows, Value::double_vec(vec![3.0, 3.0]));
    let cols = call(
        &mut vm,
        "colMeans",
        vec![x, Value::Integer(2), Value::Integer(3), Value::from(false)],
    );
    let cols = cols.as_doubles().unwrap();
    assert_eq!(&cols[..2], &[1.5, 3.5]);
    assert!(subset_r_vm_runtime::na::is_double_na(cols[2]));
}
