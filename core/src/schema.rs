//! Typed entity schema and its validation.
//!
//! # Design
//! A [`Schema`] is an ordered list of entity declarations. It can be built
//! programmatically or parsed from the JSON declaration shape:
//!
//! ```json
//! {
//!   "users": {
//!     "onMember": { "GET": "notes" },
//!     "onCollection": { "POST": "check" },
//!     "nested": { "books": { "onMember": { "PUT": "mark_read" } } }
//!   }
//! }
//! ```
//!
//! Both paths end in [`Schema::validate`], which the endpoint factory runs
//! before producing any accessor. Declarations are never mutated after that.

use serde_json::{Map, Value};

use crate::error::SchemaError;
use crate::http::HttpMethod;

/// A declared non-CRUD operation: verb plus the name appended to the scope URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub method: HttpMethod,
    pub name: String,
}

/// Custom actions of one scope (member or collection), keyed by verb.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Actions {
    entries: Vec<Action>,
}

impl Actions {
    /// Declare `name` for `method`. A second declaration for the same verb
    /// replaces the first.
    pub fn insert(&mut self, method: HttpMethod, name: impl Into<String>) {
        let name = name.into();
        match self.entries.iter_mut().find(|a| a.method == method) {
            Some(existing) => existing.name = name,
            None => self.entries.push(Action { method, name }),
        }
    }

    /// Look up an action by name. When two verbs declare the same name the
    /// later declaration wins.
    pub fn find(&self, name: &str) -> Option<&Action> {
        self.entries.iter().rev().find(|a| a.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Static description of one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declaration {
    pub on_member: Actions,
    pub on_collection: Actions,
    pub nested: Schema,
}

impl Declaration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_member(mut self, method: HttpMethod, name: impl Into<String>) -> Self {
        self.on_member.insert(method, name);
        self
    }

    pub fn on_collection(mut self, method: HttpMethod, name: impl Into<String>) -> Self {
        self.on_collection.insert(method, name);
        self
    }

    /// Declare a sub-entity reachable under each member of this entity.
    pub fn nested(mut self, name: impl Into<String>, declaration: Declaration) -> Self {
        self.nested.insert(name, declaration);
        self
    }
}

/// Ordered mapping from entity name to its declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    entities: Vec<(String, Declaration)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Schema::insert`].
    pub fn entity(mut self, name: impl Into<String>, declaration: Declaration) -> Self {
        self.insert(name, declaration);
        self
    }

    /// Add an entity. Re-declaring a name replaces the earlier declaration
    /// but keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, declaration: Declaration) {
        let name = name.into();
        match self.entities.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = declaration,
            None => self.entities.push((name, declaration)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Declaration> {
        self.entities.iter().find(|(n, _)| n == name).map(|(_, d)| d)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Declaration)> {
        self.entities.iter().map(|(n, d)| (n.as_str(), d))
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Parse a schema from its JSON declaration shape.
    pub fn from_json(value: &Value) -> Result<Self, SchemaError> {
        let schema = parse_entities(value, "")?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn from_json_str(s: &str) -> Result<Self, SchemaError> {
        let value: Value =
            serde_json::from_str(s).map_err(|e| SchemaError::new("", format!("not valid JSON: {e}")))?;
        Self::from_json(&value)
    }

    /// Reject names that cannot form a URL segment, recursively.
    pub fn validate(&self) -> Result<(), SchemaError> {
        self.validate_at("")
    }

    fn validate_at(&self, prefix: &str) -> Result<(), SchemaError> {
        for (name, declaration) in self.iter() {
            let path = join(prefix, name);
            check_segment(&path, name, "entity name")?;
            for (scope, actions) in [
                ("onMember", &declaration.on_member),
                ("onCollection", &declaration.on_collection),
            ] {
                for action in actions.iter() {
                    let action_path = join(&join(&path, scope), action.method.as_str());
                    check_segment(&action_path, &action.name, "action name")?;
                }
            }
            declaration.nested.validate_at(&join(&path, "nested"))?;
        }
        Ok(())
    }
}

fn join(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}.{segment}")
    }
}

fn check_segment(path: &str, segment: &str, what: &str) -> Result<(), SchemaError> {
    if segment.is_empty() {
        return Err(SchemaError::new(path, format!("{what} must not be empty")));
    }
    if let Some(c) = segment.chars().find(|c| matches!(*c, '/' | '?' | '#') || c.is_whitespace()) {
        return Err(SchemaError::new(
            path,
            format!("{what} `{segment}` contains reserved character {c:?}"),
        ));
    }
    Ok(())
}

fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, SchemaError> {
    value
        .as_object()
        .ok_or_else(|| SchemaError::new(path, format!("expected an object, got {}", kind(value))))
}

fn parse_entities(value: &Value, prefix: &str) -> Result<Schema, SchemaError> {
    let mut schema = Schema::new();
    for (name, declaration) in as_object(value, prefix)? {
        let path = join(prefix, name);
        schema.insert(name.clone(), parse_declaration(declaration, &path)?);
    }
    Ok(schema)
}

fn parse_declaration(value: &Value, path: &str) -> Result<Declaration, SchemaError> {
    let mut declaration = Declaration::new();
    for (key, inner) in as_object(value, path)? {
        let inner_path = join(path, key);
        match key.as_str() {
            "onMember" => declaration.on_member = parse_actions(inner, &inner_path)?,
            "onCollection" => declaration.on_collection = parse_actions(inner, &inner_path)?,
            "nested" => declaration.nested = parse_entities(inner, &inner_path)?,
            other => {
                return Err(SchemaError::new(
                    inner_path.as_str(),
                    format!("unknown declaration key `{other}`"),
                ))
            }
        }
    }
    Ok(declaration)
}

fn parse_actions(value: &Value, path: &str) -> Result<Actions, SchemaError> {
    let mut actions = Actions::default();
    for (verb, name) in as_object(value, path)? {
        let action_path = join(path, verb);
        let method: HttpMethod = verb.parse().map_err(|e| SchemaError::new(action_path.as_str(), e))?;
        match name {
            // An explicit null leaves the verb undeclared.
            Value::Null => {}
            Value::String(name) => actions.insert(method, name.clone()),
            other => {
                return Err(SchemaError::new(
                    action_path,
                    format!("action name must be a string, got {}", kind(other)),
                ))
            }
        }
    }
    Ok(actions)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
