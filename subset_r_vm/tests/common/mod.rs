//! Shared helpers for integration tests
// Each test target uses a different subset of these helpers.
#![allow(dead_code)]

use subset_r_vm::prelude::*;

/// Call `name` with positional arguments, panicking on error.
pub fn call(vm: &mut Vm, name: &str, args: Vec<Value>) -> Value {
    vm.call_builtin(name, args.into_iter().map(Arg::positional).collect())
        .unwrap_or_else(|e| panic!("{}: {}", name, e))
}

/// Call `name` with positional arguments, expecting an error.
pub fn call_err(vm: &mut Vm, name: &str, args: Vec<Value>) -> EvalError {
    match vm.call_builtin(name, args.into_iter().map(Arg::positional).collect()) {
        Ok(v) => panic!("{} returned {:?}, expected an error", name, v),
        Err(e) => e,
    }
}

/// Call once with no session state carried over.
pub fn eval(name: &str, args: Vec<Value>) -> Value {
    call(&mut Vm::new(), name, args)
}

pub fn strings(values: &[&str]) -> Value {
    Value::string_vec(values)
}

/// Element strings of a character result; NA is `None`.
pub fn string_elements(v: &Value) -> Vec<Option<String>> {
    v.as_strings()
        .unwrap_or_default()
        .iter()
        .map(|s| s.as_str().map(str::to_string))
        .collect()
}

/// Double vector with a `dim` attribute.
pub fn matrix(data: Vec<f64>, nrow: i32, ncol: i32) -> Value {
    let mut v = Value::double_vec(data);
    v.attributes_mut()
        .expect("vector attributes")
        .set_dim_unchecked(Some(vec![nrow, ncol]));
    v
}

/// Integer vector with names.
pub fn named_ints(data: Vec<i32>, names: &[&str]) -> Value {
    let mut v = Value::int_vec(data);
    v.attributes_mut()
        .expect("vector attributes")
        .set_names(Some(names.iter().map(|s| RString::from(*s)).collect()));
    v
}

pub fn warning_messages(vm: &Vm) -> Vec<String> {
    vm.session()
        .warnings()
        .iter()
        .map(|w| w.message.clone())
        .collect()
}
