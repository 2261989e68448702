use super::Visit;
use hcl::{
    template::{Directive, Element},
    Expression, Identifier, Operation, Template, Traversal, TraversalOperator,
};

/// Recursively visit all [hcl::Traversal]s that refer to the evaluation context
///
/// A standalone variable is visited as a traversal without operators. Traversals rooted at a `for` expression's
/// own key/value variables are local and skipped.
pub trait VisitTraversals {
    fn visit_traversals(&self, visitor: &mut dyn Visit<Traversal>);
}

impl VisitTraversals for Expression {
    fn visit_traversals(&self, visitor: &mut dyn Visit<Traversal>) {
        match self {
            Expression::Variable(variable) => {
                let traversal = Traversal::new(
                    Expression::Variable(variable.clone()),
                    Vec::<TraversalOperator>::new(),
                );
                visitor.visit(&traversal);
            }
            Expression::Traversal(traversal) => {
                if let Expression::Variable(_) = &traversal.expr {
                    visitor.visit(traversal);
                } else {
                    traversal.expr.visit_traversals(visitor);
                }

                for operator in &traversal.operators {
                    if let TraversalOperator::Index(index) = operator {
                        index.visit_traversals(visitor);
                    }
                }
            }
            Expression::Array(array) => {
                for expr in array {
                    expr.visit_traversals(visitor);
                }
            }
            Expression::Object(object) => {
                for value in object.values() {
                    value.visit_traversals(visitor);
                }
            }
            Expression::TemplateExpr(template_expr) => {
                if let Ok(template) = Template::from_expr(template_expr) {
                    template.visit_traversals(visitor);
                }
            }
            Expression::FuncCall(func_call) => {
                for arg in &func_call.args {
                    arg.visit_traversals(visitor);
                }
            }
            Expression::Parenthesis(expr) => {
                expr.visit_traversals(visitor);
            }
            Expression::Conditional(cond) => {
                cond.cond_expr.visit_traversals(visitor);
                cond.true_expr.visit_traversals(visitor);
                cond.false_expr.visit_traversals(visitor);
            }
            Expression::Operation(operation) => match operation.as_ref() {
                Operation::Binary(binop) => {
                    binop.lhs_expr.visit_traversals(visitor);
                    binop.rhs_expr.visit_traversals(visitor);
                }
                Operation::Unary(unop) => {
                    unop.expr.visit_traversals(visitor);
                }
            },
            Expression::ForExpr(forexpr) => {
                forexpr.collection_expr.visit_traversals(visitor);

                let locals = locals(forexpr.key_var.as_ref(), &forexpr.value_var);
                let mut scoped = skip_locals(&locals, visitor);
                forexpr
                    .key_expr
                    .iter()
                    .for_each(|e| e.visit_traversals(&mut scoped));
                forexpr.value_expr.visit_traversals(&mut scoped);
                forexpr
                    .cond_expr
                    .iter()
                    .for_each(|e| e.visit_traversals(&mut scoped));
            }
            _ => {}
        }
    }
}

impl VisitTraversals for Template {
    fn visit_traversals(&self, visitor: &mut dyn Visit<Traversal>) {
        for element in self.elements() {
            match element {
                Element::Interpolation(interpolation) => {
                    interpolation.expr.visit_traversals(visitor);
                }
                Element::Directive(directive) => match directive {
                    Directive::If(ifdir) => {
                        ifdir.cond_expr.visit_traversals(visitor);
                        ifdir.true_template.visit_traversals(visitor);
                        ifdir
                            .false_template
                            .iter()
                            .for_each(|t| t.visit_traversals(visitor));
                    }
                    Directive::For(fordir) => {
                        fordir.collection_expr.visit_traversals(visitor);

                        let locals = locals(fordir.key_var.as_ref(), &fordir.value_var);
                        let mut scoped = skip_locals(&locals, visitor);
                        fordir.template.visit_traversals(&mut scoped);
                    }
                },
                Element::Literal(_) => {}
            }
        }
    }
}

fn locals(key_var: Option<&Identifier>, value_var: &Identifier) -> Vec<String> {
    key_var
        .into_iter()
        .chain(std::iter::once(value_var))
        .map(|ident| ident.as_str().to_owned())
        .collect()
}

fn skip_locals<'a>(
    locals: &'a [String],
    visitor: &'a mut dyn Visit<Traversal>,
) -> impl FnMut(&Traversal) + 'a {
    move |traversal: &Traversal| {
        if let Expression::Variable(var) = &traversal.expr {
            if locals.iter().any(|local| local == var.as_str()) {
                return;
            }
        }

        visitor.visit(traversal);
    }
}

/// Name of the variable a traversal starts at
#[cfg(test)]
pub(crate) fn root_name(traversal: &Traversal) -> Option<&str> {
    match &traversal.expr {
        Expression::Variable(var) => Some(var.as_str()),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn roots(src: &str) -> Vec<String> {
        let expr: hcl_edit::expr::Expression = src.parse().expect("valid expression");
        let expr: Expression = expr.into();

        let mut roots = vec![];
        expr.visit_traversals(&mut |traversal: &Traversal| {
            roots.extend(root_name(traversal).map(str::to_owned));
        });
        roots
    }

    #[test]
    fn collects_root_variables() {
        assert_eq!(
            roots("a.b + upper(c[d]) ? \"${e.f}\" : [g]"),
            vec!["a", "c", "d", "e", "g"]
        );
    }

    #[test]
    fn skips_for_expression_locals() {
        assert_eq!(
            roots("[for k, v in items : \"${k}=${v.name}${suffix}\"]"),
            vec!["items", "suffix"]
        );
    }
}
