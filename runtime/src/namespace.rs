//! Runtime values of kernel variables.

use std::collections::BTreeMap;

use cinder_ir::{
    ArrayInScalarContextSnafu, ConstValue, IndexOutOfBoundsSnafu, InvalidSizeSnafu, MissingValueSnafu, Store,
    Variable, VectorIndex,
};
use snafu::OptionExt;

/// Value bound to a variable name.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(ConstValue),
    Array(Vec<ConstValue>),
}

/// Name-to-value mapping a kernel runs against.
///
/// Compile-time constants never need a binding; every other variable the
/// kernel reads does.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Namespace {
    values: BTreeMap<String, Value>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scalar(mut self, name: impl Into<String>, value: impl Into<ConstValue>) -> Self {
        self.set_scalar(name, value);
        self
    }

    pub fn with_array<V: Into<ConstValue>>(mut self, name: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        self.set_array(name, values);
        self
    }

    pub fn set_scalar(&mut self, name: impl Into<String>, value: impl Into<ConstValue>) {
        self.values.insert(name.into(), Value::Scalar(value.into()));
    }

    pub fn set_array<V: Into<ConstValue>>(&mut self, name: impl Into<String>, values: impl IntoIterator<Item = V>) {
        self.values.insert(name.into(), Value::Array(values.into_iter().map(Into::into).collect()));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn scalar(&self, name: &str) -> Option<ConstValue> {
        match self.values.get(name)? {
            Value::Scalar(value) => Some(*value),
            Value::Array(_) => None,
        }
    }

    pub fn array(&self, name: &str) -> Option<&[ConstValue]> {
        match self.values.get(name)? {
            Value::Array(values) => Some(values),
            Value::Scalar(_) => None,
        }
    }
}

impl Store for Namespace {
    fn load(&self, var: &Variable, index: VectorIndex) -> cinder_ir::Result<ConstValue> {
        let value = self.values.get(&var.name).context(MissingValueSnafu { name: var.name.as_str() })?;
        match (value, index) {
            (Value::Scalar(value), _) if !var.is_array() => Ok(*value),
            (Value::Array(values), VectorIndex::Element(i)) if var.is_array() => values
                .get(i)
                .copied()
                .context(IndexOutOfBoundsSnafu { name: var.name.as_str(), index: i, len: values.len() }),
            (Value::Array(_), VectorIndex::Scalar) if var.is_array() => {
                ArrayInScalarContextSnafu { name: var.name.as_str() }.fail()
            }
            _ => InvalidSizeSnafu { name: var.name.as_str(), reason: "bound value does not match the declaration" }.fail(),
        }
    }

    fn store(&mut self, var: &Variable, index: VectorIndex, value: ConstValue) -> cinder_ir::Result<()> {
        if !var.is_array() {
            self.values.insert(var.name.clone(), Value::Scalar(value));
            return Ok(());
        }
        let i = index.element().context(ArrayInScalarContextSnafu { name: var.name.as_str() })?;
        match self.values.get_mut(&var.name) {
            Some(Value::Array(values)) => {
                let len = values.len();
                let slot = values.get_mut(i).context(IndexOutOfBoundsSnafu { name: var.name.as_str(), index: i, len })?;
                *slot = value;
                Ok(())
            }
            Some(Value::Scalar(_)) => {
                InvalidSizeSnafu { name: var.name.as_str(), reason: "bound value does not match the declaration" }.fail()
            }
            None => MissingValueSnafu { name: var.name.as_str() }.fail(),
        }
    }
}
