//! block definitions
//!
//! A block definition always provides a [Grammar]. It may additionally contribute variables and/or functions to
//! every block decoded after it. Those two capabilities are independent: a definition advertises them by
//! overriding [BlockDefinition::as_variable_injector] / [BlockDefinition::as_function_injector].
//!
//! ```
//! use hclspec::definition::{BlockDefinition, InjectableVariables, NamedBlockDefinition, VariableInjector};
//! use hclspec::grammar::Grammar;
//! use hclspec::value::Type;
//!
//! struct Region;
//!
//! impl BlockDefinition for Region {
//!     fn grammar(&self) -> Grammar {
//!         Grammar::attr("region", Type::String, true)
//!     }
//!
//!     fn as_variable_injector(&self) -> Option<&dyn VariableInjector> {
//!         Some(self)
//!     }
//! }
//!
//! impl VariableInjector for Region {
//!     fn variables(&self, value: &hcl::Value) -> InjectableVariables {
//!         InjectableVariables::from([("region".to_string(), value.clone())])
//!     }
//! }
//!
//! impl NamedBlockDefinition for Region {
//!     fn name(&self) -> &str {
//!         "region"
//!     }
//! }
//! ```
use crate::grammar::Grammar;
use hcl::eval::FuncDef;
use hcl::Value;
use indexmap::IndexMap;

/// Variables injected into the evaluation context after a block was decoded
pub type InjectableVariables = IndexMap<String, Value>;

/// Functions injected into the evaluation context after a block was decoded
pub type InjectableFunctions = IndexMap<String, FuncDef>;

/// Named definitions, in the order they are decoded
pub type NamedBlockDefinitions = Vec<Box<dyn NamedBlockDefinition>>;

pub trait BlockDefinition {
    /// What this block consumes from the root body
    fn grammar(&self) -> Grammar;

    fn as_variable_injector(&self) -> Option<&dyn VariableInjector> {
        None
    }

    fn as_function_injector(&self) -> Option<&dyn FunctionInjector> {
        None
    }
}

/// A definition that knows the name it is registered under
pub trait NamedBlockDefinition: BlockDefinition {
    fn name(&self) -> &str;
}

pub trait VariableInjector: BlockDefinition {
    /// Variables for all following blocks, given this block's decoded value
    fn variables(&self, value: &Value) -> InjectableVariables;
}

pub trait FunctionInjector: BlockDefinition {
    /// Functions for all following blocks, given this block's decoded value
    fn functions(&self, value: &Value) -> InjectableFunctions;
}

impl BlockDefinition for Box<dyn NamedBlockDefinition> {
    fn grammar(&self) -> Grammar {
        (**self).grammar()
    }

    fn as_variable_injector(&self) -> Option<&dyn VariableInjector> {
        (**self).as_variable_injector()
    }

    fn as_function_injector(&self) -> Option<&dyn FunctionInjector> {
        (**self).as_function_injector()
    }
}
