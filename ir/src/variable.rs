//! Variable table of a kernel.

use std::collections::BTreeMap;

use cinder_dtype::DType;
use snafu::{OptionExt, ensure};

use crate::{ConstValue, InvalidSizeSnafu, Result, UnknownVariableSnafu};

/// Length of an array variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Size {
    /// Known when the kernel is generated.
    Fixed(usize),
    /// Read from a scalar integer variable.
    Ref(String),
}

impl From<usize> for Size {
    fn from(n: usize) -> Self {
        Size::Fixed(n)
    }
}

impl From<&str> for Size {
    fn from(name: &str) -> Self {
        Size::Ref(name.to_string())
    }
}

/// A variable declared for a kernel.
#[derive(Debug, Clone, PartialEq, Hash)]
pub struct Variable {
    pub name: String,
    pub dtype: DType,
    /// Scalar (one value per kernel) or array (one value per element).
    pub scalar: bool,
    /// Value of a compile-time constant.
    pub constant: Option<ConstValue>,
    /// Length of an array variable.
    pub size: Option<Size>,
}

impl Variable {
    /// Scalar whose value is read at run time.
    pub fn scalar(name: impl Into<String>, dtype: DType) -> Self {
        Self { name: name.into(), dtype, scalar: true, constant: None, size: None }
    }

    /// Scalar whose value is fixed when the kernel is generated.
    pub fn constant(name: impl Into<String>, dtype: DType, value: impl Into<ConstValue>) -> Self {
        Self { name: name.into(), dtype, scalar: true, constant: Some(value.into().cast(dtype)), size: None }
    }

    /// Per-element variable of the given length.
    pub fn array(name: impl Into<String>, dtype: DType, size: impl Into<Size>) -> Self {
        Self { name: name.into(), dtype, scalar: false, constant: None, size: Some(size.into()) }
    }

    pub fn is_constant(&self) -> bool {
        self.constant.is_some()
    }

    pub fn is_array(&self) -> bool {
        !self.scalar
    }
}

/// Variables of a kernel, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Hash)]
pub struct Variables {
    vars: BTreeMap<String, Variable>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable, replacing one of the same name.
    pub fn insert(&mut self, var: Variable) -> &mut Self {
        self.vars.insert(var.name.clone(), var);
        self
    }

    pub fn with(mut self, var: Variable) -> Self {
        self.insert(var);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.vars.get(name)
    }

    /// Look a variable up, failing with `UnknownVariable`.
    pub fn lookup(&self, name: &str) -> Result<&Variable> {
        self.vars.get(name).context(UnknownVariableSnafu { name })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.vars.values()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Check that every array length resolves to a non-negative integer.
    ///
    /// A `Size::Ref` must name a scalar integer variable; a constant one must
    /// hold a non-negative value.
    pub fn validate(&self) -> Result<()> {
        for var in self.iter() {
            if var.scalar {
                ensure!(
                    var.size.is_none(),
                    InvalidSizeSnafu { name: var.name.as_str(), reason: "scalar variables have no length" }
                );
                continue;
            }
            ensure!(
                !var.is_constant(),
                InvalidSizeSnafu { name: var.name.as_str(), reason: "array variables cannot be constants" }
            );
            match &var.size {
                None => return InvalidSizeSnafu { name: var.name.as_str(), reason: "missing length" }.fail(),
                Some(Size::Fixed(_)) => {}
                Some(Size::Ref(len)) => self.validate_length_ref(len)?,
            }
        }
        Ok(())
    }

    /// Check that `name` can serve as an element count.
    pub fn validate_length_ref(&self, name: &str) -> Result<()> {
        let len = self.lookup(name)?;
        ensure!(len.scalar, InvalidSizeSnafu { name, reason: "length must be a scalar" });
        ensure!(len.dtype.is_int(), InvalidSizeSnafu { name, reason: format!("length has kind {}", len.dtype) });
        if let Some(value) = len.constant {
            ensure!(value.as_size().is_some(), InvalidSizeSnafu { name, reason: format!("{value:?} is negative") });
        }
        Ok(())
    }
}

impl FromIterator<Variable> for Variables {
    fn from_iter<I: IntoIterator<Item = Variable>>(iter: I) -> Self {
        let mut vars = Self::new();
        for var in iter {
            vars.insert(var);
        }
        vars
    }
}
