//! Scripted filter: a Rhai boolean expression evaluated per record.
//!
//! ```text
//! status >= 500 && _name == "heroku router"
//! ```
//!
//! The expression sees `_time` (unix seconds), `_time_ms` (unix millis),
//! `_name`, and one constant per entry. Dots in entry keys become `_`, so
//! `response.time` is read as `response_time`.

use crate::filter::{Filter, FilterError};
use crate::record::Record;
use rhai::{Dynamic, Engine, Scope, AST};

const MAX_OPERATIONS: u64 = 10_000;
const MAX_EXPR_DEPTH: usize = 32;

pub struct Script {
    source: String,
    engine: Engine,
    ast: AST,
}

impl Script {
    /// Compile `source` once. A syntax error surfaces here, before any record
    /// flows.
    pub fn new(source: impl Into<String>) -> Result<Self, FilterError> {
        let source = source.into();

        let mut engine = Engine::new();
        engine.set_max_operations(MAX_OPERATIONS);
        engine.set_max_expr_depths(MAX_EXPR_DEPTH, MAX_EXPR_DEPTH);
        engine.disable_symbol("eval");

        let ast = engine
            .compile_expression(&source)
            .map_err(|e| FilterError::Script {
                script: source.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            source,
            engine,
            ast,
        })
    }

    fn scope_for(record: &Record) -> Scope<'static> {
        let mut scope = Scope::new();
        scope.push_constant("_time", record.time.timestamp());
        scope.push_constant("_time_ms", record.unix_millis());
        scope.push_constant("_name", record.name.clone());

        for (key, value) in &record.entries {
            scope.push_constant_dynamic(key.replace('.', "_"), script_value(value));
        }
        scope
    }
}

/// Integers first, then floats, everything else as a string.
fn script_value(value: &str) -> Dynamic {
    if let Ok(int) = value.parse::<i64>() {
        return Dynamic::from(int);
    }

    let float_like = value.chars().any(|c| c.is_ascii_digit())
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
    if float_like {
        if let Ok(float) = value.parse::<f64>() {
            return Dynamic::from(float);
        }
    }

    Dynamic::from(value.to_string())
}

impl Filter for Script {
    fn apply(&self, record: Record) -> Option<Record> {
        let mut scope = Self::scope_for(&record);

        match self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, &self.ast)
        {
            Ok(result) => match result.as_bool() {
                Ok(true) => Some(record),
                Ok(false) => None,
                Err(kind) => {
                    tracing::error!(
                        script = %self.source,
                        result = kind,
                        "script did not return a boolean, dropping record"
                    );
                    None
                }
            },
            Err(e) => {
                tracing::error!(script = %self.source, error = %e, "script failed, dropping record");
                None
            }
        }
    }
}

impl std::fmt::Debug for Script {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Script").field("source", &self.source).finish()
    }
}
