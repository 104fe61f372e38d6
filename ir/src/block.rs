//! Statements and abstract code blocks.

use std::collections::{BTreeSet, HashMap};

use cinder_dtype::DType;
use snafu::{OptionExt, ensure};

use crate::{
    ArrayInScalarContextSnafu, AssignToConstantSnafu, Expr, IndexInScalarContextSnafu, NonBooleanConditionSnafu,
    RedeclarationSnafu, Result, UnknownVariableSnafu, Variables,
};

/// A single statement of abstract code.
#[derive(Debug, Clone, PartialEq, Hash)]
pub enum Statement {
    /// Introduce a kernel-local value.
    Declare { name: String, dtype: DType, value: Expr, constant: bool },
    /// Write a declared variable or a non-constant local.
    Assign { target: String, value: Expr },
}

impl Statement {
    pub fn declare(name: impl Into<String>, dtype: DType, value: Expr) -> Self {
        Statement::Declare { name: name.into(), dtype, value, constant: true }
    }

    pub fn declare_mut(name: impl Into<String>, dtype: DType, value: Expr) -> Self {
        Statement::Declare { name: name.into(), dtype, value, constant: false }
    }

    pub fn assign(target: impl Into<String>, value: Expr) -> Self {
        Statement::Assign { target: target.into(), value }
    }

    pub fn value(&self) -> &Expr {
        match self {
            Statement::Declare { value, .. } | Statement::Assign { value, .. } => value,
        }
    }
}

/// Which pass a statement list runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    Scalar,
    Vector,
}

/// Backend-independent description of a per-element computation.
#[derive(Debug, Clone, Default, PartialEq, Hash)]
pub struct AbstractCodeBlock {
    /// Runs once per invocation, outside element context.
    pub scalar: Vec<Statement>,
    /// Runs once per element, in ascending order.
    pub vector: Vec<Statement>,
    /// Selection condition; absent means every element is selected.
    pub condition: Option<Expr>,
}

/// Variables read and written by a block, excluding locals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependencies {
    pub read: BTreeSet<String>,
    pub write: BTreeSet<String>,
}

impl Dependencies {
    /// Every variable the block touches.
    pub fn all(&self) -> BTreeSet<&str> {
        self.read.iter().chain(self.write.iter()).map(String::as_str).collect()
    }
}

/// Local declared by a statement.
#[derive(Debug, Clone, Copy)]
struct Local {
    dtype: DType,
    constant: bool,
}

impl AbstractCodeBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scalar(mut self, statement: Statement) -> Self {
        self.scalar.push(statement);
        self
    }

    pub fn with_vector(mut self, statement: Statement) -> Self {
        self.vector.push(statement);
        self
    }

    pub fn with_condition(mut self, condition: Expr) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn statements(&self, pass: Pass) -> &[Statement] {
        match pass {
            Pass::Scalar => &self.scalar,
            Pass::Vector => &self.vector,
        }
    }

    /// Type-check the block against its variable table.
    ///
    /// Scalar statements may not touch array variables or the index. Locals
    /// declared in the scalar pass stay visible in the vector pass and the
    /// condition. The condition must be boolean.
    pub fn validate(&self, variables: &Variables) -> Result<()> {
        variables.validate()?;
        let mut locals = HashMap::new();
        for statement in &self.scalar {
            check_statement(statement, Pass::Scalar, variables, &mut locals)?;
        }
        for statement in &self.vector {
            check_statement(statement, Pass::Vector, variables, &mut locals)?;
        }
        if let Some(condition) = &self.condition {
            let actual = condition.dtype(&|name| lookup(name, Pass::Vector, variables, &locals))?;
            ensure!(actual.is_bool(), NonBooleanConditionSnafu { actual });
        }
        Ok(())
    }

    /// Kind of a local declared anywhere in the block.
    pub fn local_dtype(&self, name: &str) -> Option<DType> {
        self.scalar.iter().chain(self.vector.iter()).find_map(|statement| match statement {
            Statement::Declare { name: declared, dtype, .. } if declared == name => Some(*dtype),
            _ => None,
        })
    }

    /// Names of locals declared in a pass, in declaration order.
    pub fn locals(&self, pass: Pass) -> Vec<&str> {
        self.statements(pass)
            .iter()
            .filter_map(|statement| match statement {
                Statement::Declare { name, .. } => Some(name.as_str()),
                Statement::Assign { .. } => None,
            })
            .collect()
    }

    /// Variables of the table read and written by this block.
    pub fn dependencies(&self, variables: &Variables) -> Dependencies {
        let mut deps = Dependencies::default();
        let statements = self.scalar.iter().chain(self.vector.iter());
        let reads = statements
            .clone()
            .map(Statement::value)
            .chain(self.condition.iter())
            .flat_map(|expr| expr.identifiers());
        for name in reads {
            if variables.contains(name) {
                deps.read.insert(name.to_string());
            }
        }
        for statement in statements {
            if let Statement::Assign { target, .. } = statement
                && variables.contains(target)
            {
                deps.write.insert(target.clone());
            }
        }
        deps
    }
}

fn lookup(name: &str, pass: Pass, variables: &Variables, locals: &HashMap<String, Local>) -> Result<DType> {
    if let Some(local) = locals.get(name) {
        return Ok(local.dtype);
    }
    let var = variables.get(name).context(UnknownVariableSnafu { name })?;
    ensure!(pass == Pass::Vector || var.scalar, ArrayInScalarContextSnafu { name });
    Ok(var.dtype)
}

fn check_statement(
    statement: &Statement,
    pass: Pass,
    variables: &Variables,
    locals: &mut HashMap<String, Local>,
) -> Result<()> {
    let value = statement.value();
    ensure!(pass == Pass::Vector || !value.uses_index(), IndexInScalarContextSnafu);
    value.dtype(&|name| lookup(name, pass, variables, &*locals))?;

    match statement {
        Statement::Declare { name, dtype, constant, .. } => {
            ensure!(!variables.contains(name) && !locals.contains_key(name), RedeclarationSnafu { name });
            locals.insert(name.clone(), Local { dtype: *dtype, constant: *constant });
        }
        Statement::Assign { target, .. } => {
            if let Some(local) = locals.get(target) {
                ensure!(!local.constant, AssignToConstantSnafu { name: target });
            } else {
                let var = variables.lookup(target)?;
                ensure!(!var.is_constant(), AssignToConstantSnafu { name: target });
                ensure!(pass == Pass::Vector || var.scalar, ArrayInScalarContextSnafu { name: target });
            }
        }
    }
    Ok(())
}
