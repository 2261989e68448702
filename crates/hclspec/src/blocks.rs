//! stock block definitions
//!
//! ```hcl
//! variables {
//!   region = "eu-west-1"
//! }
//!
//! locals {
//!   bucket = "logs-${var.region}"
//! }
//! ```
//!
//! [Variables] exposes its attributes as `var.<name>`, [Locals] as `local.<name>`. Locals are evaluated in one
//! pass, so a local can use variables but not other locals.
use crate::definition::{
    BlockDefinition, InjectableVariables, NamedBlockDefinition, NamedBlockDefinitions,
    VariableInjector,
};
use crate::grammar::Grammar;
use crate::value::Type;
use hcl::Value;

#[derive(Debug, Default, Clone, Copy)]
pub struct Variables;

#[derive(Debug, Default, Clone, Copy)]
pub struct Locals;

/// [Variables] followed by [Locals]
pub fn stock() -> NamedBlockDefinitions {
    vec![Box::new(Variables), Box::new(Locals)]
}

/// A missing block still defines the root object, so `var.x` reports a missing attribute, not a missing variable
fn attributes_as(root: &str, value: &Value) -> InjectableVariables {
    let object = match value {
        Value::Object(_) => value.clone(),
        _ => Value::Object(Default::default()),
    };

    InjectableVariables::from([(root.to_owned(), object)])
}

impl BlockDefinition for Variables {
    fn grammar(&self) -> Grammar {
        Grammar::block_attrs("variables", Type::Any, false)
    }

    fn as_variable_injector(&self) -> Option<&dyn VariableInjector> {
        Some(self)
    }
}

impl VariableInjector for Variables {
    fn variables(&self, value: &Value) -> InjectableVariables {
        attributes_as("var", value)
    }
}

impl NamedBlockDefinition for Variables {
    fn name(&self) -> &str {
        "variables"
    }
}

impl BlockDefinition for Locals {
    fn grammar(&self) -> Grammar {
        Grammar::block_attrs("locals", Type::Any, false)
    }

    fn as_variable_injector(&self) -> Option<&dyn VariableInjector> {
        Some(self)
    }
}

impl VariableInjector for Locals {
    fn variables(&self, value: &Value) -> InjectableVariables {
        attributes_as("local", value)
    }
}

impl NamedBlockDefinition for Locals {
    fn name(&self) -> &str {
        "locals"
    }
}
