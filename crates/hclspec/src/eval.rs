//! evaluation context
//!
//! [EvalContext] is the variable and function scope threaded through an ordered decode. It is plain data (two
//! ordered maps) so callers can pre-populate it and inspect it after [crate::registrar::Registrar::parse].
//! Expressions are evaluated by [hcl::eval] against a [hcl::eval::Context] built from it.
use crate::diagnostic::{Diagnostic, Diagnostics, SourceRange};
use hcl::eval::{Context, ErrorKind, Evaluate, FuncDef};
use hcl::Value;
use indexmap::IndexMap;

#[derive(Clone, Default)]
pub struct EvalContext {
    pub variables: IndexMap<String, Value>,
    pub functions: IndexMap<String, FuncDef>,
}

impl EvalContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a variable, replacing any previous value of the same name
    pub fn declare_var(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        tracing::trace!(%name, ?value, "declare variable");
        if self.variables.insert(name, value).is_some() {
            tracing::trace!("variable replaced");
        }
    }

    /// Declares a function, replacing any previous function of the same name
    pub fn declare_func(&mut self, name: impl Into<String>, func: FuncDef) {
        let name = name.into();
        tracing::trace!(%name, "declare function");
        if self.functions.insert(name, func).is_some() {
            tracing::trace!("function replaced");
        }
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn function(&self, name: &str) -> Option<&FuncDef> {
        self.functions.get(name)
    }

    /// Snapshot for the expression engine. Later changes to `self` are not reflected.
    pub(crate) fn engine(&self) -> Context<'static> {
        let mut context = Context::new();

        for (name, value) in &self.variables {
            context.declare_var(name.clone(), value.clone());
        }

        for (name, func) in &self.functions {
            context.declare_func(name.clone(), func.clone());
        }

        context
    }
}

impl std::fmt::Debug for EvalContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvalContext")
            .field("variables", &self.variables)
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Evaluates one expression. Failures yield `null` and one diagnostic per engine error.
pub(crate) fn evaluate(
    expr: &hcl::Expression,
    context: &Context,
    range: Option<&SourceRange>,
) -> (Value, Diagnostics) {
    let mut expr = expr.clone();
    let Err(errors) = expr.evaluate_in_place(context) else {
        return (expr.into(), Diagnostics::new());
    };

    let diagnostics = errors
        .iter()
        .map(|err| {
            let summary = match err.kind() {
                ErrorKind::UndefinedVar(_) => "Unknown variable",
                ErrorKind::UndefinedFunc(_) => "Call to unknown function",
                _ => "Invalid expression",
            };

            Diagnostic::error(summary, err.to_string()).with_range(range.cloned())
        })
        .collect();

    (Value::Null, diagnostics)
}

#[cfg(test)]
mod test {
    use super::*;
    use hcl::eval::FuncArgs;
    use pretty_assertions::assert_eq;

    fn parse_expression(src: &str) -> hcl::Expression {
        let expr: hcl_edit::expr::Expression = src.parse().expect("valid expression");
        expr.into()
    }

    fn shout(args: FuncArgs) -> Result<Value, String> {
        let text = args[0].as_str().ok_or("string argument required")?;
        Ok(Value::String(format!("{}!", text.to_uppercase())))
    }

    #[test]
    fn resolves_variables_and_functions() {
        let mut context = EvalContext::new();
        context.declare_var("name", "world");
        context.declare_func(
            "shout",
            FuncDef::builder()
                .param(hcl::eval::ParamType::String)
                .build(shout),
        );

        let (value, diagnostics) = evaluate(
            &parse_expression("shout(\"hello ${name}\")"),
            &context.engine(),
            None,
        );

        assert!(diagnostics.is_empty(), "{diagnostics}");
        assert_eq!(value, Value::String("HELLO WORLD!".into()));
    }

    #[test]
    fn last_declaration_wins() {
        let mut context = EvalContext::new();
        context.declare_var("one", 1);
        context.declare_var("one", 2);

        assert_eq!(context.variables.len(), 1);
        assert_eq!(context.variable("one"), Some(&Value::from(2)));
    }

    #[test]
    fn unknown_names_are_diagnostics() {
        let engine = EvalContext::new().engine();

        let (value, diagnostics) = evaluate(&parse_expression("missing + 1"), &engine, None);
        assert_eq!(value, Value::Null);
        assert_eq!(diagnostics.as_slice()[0].summary, "Unknown variable");

        let (_value, diagnostics) = evaluate(&parse_expression("nope()"), &engine, None);
        assert_eq!(diagnostics.as_slice()[0].summary, "Call to unknown function");
    }

    #[test]
    fn every_unknown_name_is_reported() {
        let engine = EvalContext::new().engine();

        let (value, diagnostics) = evaluate(&parse_expression("[x, y, z]"), &engine, None);

        assert_eq!(value, Value::Null);
        let summaries: Vec<_> = diagnostics.iter().map(|d| d.summary.as_str()).collect();
        assert_eq!(
            summaries,
            vec!["Unknown variable", "Unknown variable", "Unknown variable"]
        );
    }
}
