//! Query template rendering.
//!
//! Asset SQL is a Jinja template: `{{ ... }}` expressions plus `{% set %}`,
//! `{% if %}` and `{% for %}` blocks. It is rendered before the statement is
//! handed to the analyzer. For lineage purposes the concrete values don't
//! matter, so the default context describes "yesterday" in UTC.
//!
//! Undefined values are errors, including in `if` conditions, so a template
//! that references a variable nobody provides fails loudly instead of
//! producing SQL with holes in it.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use minijinja::{Environment, ErrorKind, UndefinedBehavior, Value};

/// Names the template engine provides itself.
const ENGINE_NAMES: &[&str] = &["range", "dict", "namespace", "loop"];

/// Errors raised while rendering a query template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),

    #[error("syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("{0}")]
    Failed(String),
}

impl RenderError {
    fn from_engine(err: &minijinja::Error) -> Self {
        let message = err
            .detail()
            .map(str::to_string)
            .unwrap_or_else(|| err.kind().to_string());
        match err.kind() {
            ErrorKind::SyntaxError => Self::Syntax {
                line: err.line().unwrap_or(1),
                message,
            },
            _ => Self::Failed(message),
        }
    }
}

/// Expands template placeholders in raw asset SQL.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, query: &str) -> Result<String, RenderError>;
}

/// Default renderer with a fixed variable context.
#[derive(Debug, Clone)]
pub struct QueryRenderer {
    context: BTreeMap<String, String>,
    variables: BTreeMap<String, String>,
    full_refresh: bool,
}

impl QueryRenderer {
    /// Renderer whose date window covers all of yesterday (UTC).
    pub fn with_yesterday(pipeline: &str, run_id: &str) -> Self {
        Self::for_day(Utc::now() - Duration::days(1), pipeline, run_id)
    }

    /// Renderer whose date window covers the day of `day`.
    pub fn for_day(day: DateTime<Utc>, pipeline: &str, run_id: &str) -> Self {
        let date = day.date_naive();
        let start = date.and_time(NaiveTime::MIN).and_utc();
        let end = start + Duration::days(1) - Duration::microseconds(1);

        let mut context = BTreeMap::new();
        for (prefix, at) in [("start", start), ("end", end)] {
            context.insert(format!("{prefix}_date"), at.format("%Y-%m-%d").to_string());
            context.insert(format!("{prefix}_date_nodash"), at.format("%Y%m%d").to_string());
            context.insert(
                format!("{prefix}_datetime"),
                at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            );
            context.insert(
                format!("{prefix}_timestamp"),
                at.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
            );
        }
        context.insert("pipeline".to_string(), pipeline.to_string());
        context.insert("run_id".to_string(), run_id.to_string());

        Self {
            context,
            variables: BTreeMap::new(),
            full_refresh: false,
        }
    }

    /// Register a pipeline variable, referenced as `{{ var.<name> }}`.
    pub fn with_variable(mut self, name: &str, value: impl Into<String>) -> Self {
        self.variables.insert(name.to_string(), value.into());
        self
    }

    /// Look up a string value by template name (`start_date`, `var.region`).
    pub fn variable(&self, name: &str) -> Option<&str> {
        match name.strip_prefix("var.") {
            Some(var) => self.variables.get(var),
            None => self.context.get(name),
        }
        .map(String::as_str)
    }

    fn values(&self) -> BTreeMap<&str, Value> {
        let mut values: BTreeMap<&str, Value> = self
            .context
            .iter()
            .map(|(name, value)| (name.as_str(), Value::from(value.as_str())))
            .collect();
        values.insert("full_refresh", Value::from(self.full_refresh));
        values.insert("var", Value::from_serialize(&self.variables));
        values
    }

    /// Whether a name reported by the engine resolves in this context.
    fn resolves(&self, path: &str) -> bool {
        let mut parts = path.split('.');
        match (parts.next(), parts.next()) {
            (Some("var"), Some(var)) => self.variables.contains_key(var),
            (Some(top), _) => {
                top == "var" || top == "full_refresh" || self.context.contains_key(top)
            }
            (None, _) => true,
        }
    }
}

impl TemplateRenderer for QueryRenderer {
    fn render(&self, query: &str) -> Result<String, RenderError> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);

        let template = env
            .template_from_str(query)
            .map_err(|e| RenderError::from_engine(&e))?;

        template.render(self.values()).map_err(|e| {
            if e.kind() != ErrorKind::UndefinedError {
                return RenderError::from_engine(&e);
            }
            let mut missing: Vec<String> = template
                .undeclared_variables(true)
                .into_iter()
                .filter(|name| !ENGINE_NAMES.contains(&name.as_str()) && !self.resolves(name))
                .collect();
            missing.sort();
            match missing.into_iter().next() {
                Some(name) => RenderError::UndefinedVariable(name),
                None => RenderError::from_engine(&e),
            }
        })
    }
}
