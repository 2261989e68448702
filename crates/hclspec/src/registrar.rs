//! Registration table and ordered decoder
//!
//! [Registrar::parse] decodes one body in several passes, one per [Registration], lowest order first:
//!
//! 1. partially decode the remaining body against the registration's grammar and the current context
//! 2. keep the diagnostics (decoding never stops early)
//! 3. continue with the residual body
//! 4. merge injected functions, then injected variables into the context
//!
//! So anything injected by a registration is visible to all later registrations and never to earlier ones.
//! A reference to something a later block would inject is reported by the expression engine as unknown.
//! Registrations with the same order keep their insertion order.
use crate::body::Body;
use crate::decode::partial_decode;
use crate::definition::BlockDefinition;
use crate::diagnostic::Diagnostics;
use crate::eval::EvalContext;
use crate::grammar::Grammar;

/// One block definition registered for a root block name
#[derive(derive_new::new)]
pub struct Registration {
    pub block_name: String,
    pub order: i64,
    pub definition: Box<dyn BlockDefinition>,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("block_name", &self.block_name)
            .field("order", &self.order)
            .field("variables", &self.definition.as_variable_injector().is_some())
            .field("functions", &self.definition.as_function_injector().is_some())
            .finish()
    }
}

#[derive(Debug)]
pub struct Registrar {
    /// order assigned by the next [Registrar::register_block]
    pub next_order: i64,
    pub increase_next_order_by: i64,
    registrations: Vec<Registration>,
}

impl Default for Registrar {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Registrar {
    pub fn new(increase_next_order_by: i64) -> Self {
        Self {
            next_order: 0,
            increase_next_order_by,
            registrations: vec![],
        }
    }

    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    /// Live access, e.g. to change orders before [Registrar::parse]
    pub fn registrations_mut(&mut self) -> &mut Vec<Registration> {
        &mut self.registrations
    }

    /// Registers `definition` at [Registrar::next_order], then advances it
    pub fn register_block(
        &mut self,
        block_name: impl Into<String>,
        definition: impl BlockDefinition + 'static,
    ) {
        let registration = Registration::new(
            block_name.into(),
            self.next_order,
            Box::new(definition),
        );

        self.next_order += self.increase_next_order_by;
        self.add_registration(registration);
    }

    /// Adds a registration as is
    ///
    /// The caller is responsible for its order. A block placed before the block that injects the variables it
    /// uses will see those variables as unknown.
    pub fn add_registration(&mut self, registration: Registration) {
        tracing::trace!(?registration, "registered");
        self.registrations.push(registration);
    }

    /// All grammars as one object keyed by block name
    ///
    /// This is a structural view only: it ignores order, so it can not resolve anything injected between blocks.
    /// A block name registered twice keeps the last grammar.
    pub fn build(&self) -> Grammar {
        Grammar::object(
            self.registrations
                .iter()
                .map(|registration| {
                    (
                        registration.block_name.clone(),
                        registration.definition.grammar(),
                    )
                })
                .collect::<Vec<_>>(),
        )
    }

    /// Decodes `body` registration by registration, growing `context` along the way
    pub fn parse(&self, body: &Body, context: &mut EvalContext) -> Diagnostics {
        let mut ordered: Vec<&Registration> = self.registrations.iter().collect();
        ordered.sort_by_key(|registration| registration.order);

        let mut remaining = body.clone();
        let mut diagnostics = Diagnostics::new();

        for registration in ordered {
            let _span = tracing::debug_span!(
                "decode",
                block = %registration.block_name,
                order = registration.order
            )
            .entered();

            let grammar = registration.definition.grammar();
            let (value, residual, pass_diagnostics) = partial_decode(&remaining, &grammar, context);
            tracing::debug!(
                diagnostics = pass_diagnostics.len(),
                remaining = residual.items().len(),
                "decoded"
            );

            diagnostics.extend(pass_diagnostics);
            remaining = residual;

            if let Some(injector) = registration.definition.as_function_injector() {
                for (name, func) in injector.functions(&value) {
                    context.declare_func(name, func);
                }
            }

            if let Some(injector) = registration.definition.as_variable_injector() {
                for (name, variable) in injector.variables(&value) {
                    context.declare_var(name, variable);
                }
            }
        }

        diagnostics
    }
}
