//! Declarative entity descriptors.
//!
//! An [`EntitySchema`] lists the fields an entity accepts, how each is cast
//! and validated, who may write it, and which relations are expanded on
//! read. The observer pipeline and the resource handler are driven entirely
//! by these descriptors.

use serde_json::{json, Value};

use crate::filter::{Filter, Projection};
use crate::store::Collection;
use crate::types::{format_instant, parse_instant, Document, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    Bool,
    Date,
    /// UUID reference to another entity
    Id,
    Object,
    StringList,
    DateList,
    IdList,
    ObjectList,
}

/// Who may write a field through the public API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Writable {
    Anyone,
    Roles(&'static [Role]),
    /// Accepted when the entity is created, ignored on update
    CreateOnly,
    /// Only trusted server-side flows
    Internal,
}

#[derive(Debug, Clone)]
pub enum Rule {
    Required(&'static str),
    MinLength(usize, &'static str),
    MaxLength(usize, &'static str),
    Min(f64, &'static str),
    Max(f64, &'static str),
    OneOf(&'static [&'static str], &'static str),
    Email(&'static str),
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    pub rules: Vec<Rule>,
    pub default: Option<Value>,
    pub trim: bool,
    pub lowercase: bool,
    pub writable: Writable,
    /// Accepted as input but never stored
    pub transient: bool,
}

impl FieldDef {
    pub fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            rules: Vec::new(),
            default: None,
            trim: false,
            lowercase: false,
            writable: Writable::Anyone,
            transient: false,
        }
    }

    pub fn required(mut self, message: &'static str) -> Self {
        self.rules.push(Rule::Required(message));
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn trim(mut self) -> Self {
        self.trim = true;
        self
    }

    pub fn lowercase(mut self) -> Self {
        self.lowercase = true;
        self
    }

    pub fn writable(mut self, writable: Writable) -> Self {
        self.writable = writable;
        self
    }

    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    /// Cast an incoming value to the field's kind
    pub fn cast(&self, value: &Value) -> Result<Value, String> {
        let invalid = || format!("Invalid {}: {}", self.name, value);
        match self.kind {
            FieldKind::String => match value {
                Value::String(_) => Ok(value.clone()),
                Value::Number(n) => Ok(json!(n.to_string())),
                Value::Bool(b) => Ok(json!(b.to_string())),
                _ => Err(invalid()),
            },
            FieldKind::Number => match value {
                Value::Number(_) => Ok(value.clone()),
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .map(number)
                    .ok_or_else(invalid),
                _ => Err(invalid()),
            },
            FieldKind::Bool => match value {
                Value::Bool(_) => Ok(value.clone()),
                Value::String(s) => s.parse::<bool>().map(Value::Bool).map_err(|_| invalid()),
                _ => Err(invalid()),
            },
            FieldKind::Date => cast_date(value).ok_or_else(invalid),
            FieldKind::Id => cast_id(value).ok_or_else(invalid),
            FieldKind::Object => value.is_object().then(|| value.clone()).ok_or_else(invalid),
            FieldKind::StringList => cast_list(value, |v| v.as_str().map(|_| v.clone())).ok_or_else(invalid),
            FieldKind::DateList => cast_list(value, cast_date).ok_or_else(invalid),
            FieldKind::IdList => cast_list(value, cast_id).ok_or_else(invalid),
            FieldKind::ObjectList => cast_list(value, |v| v.is_object().then(|| v.clone())).ok_or_else(invalid),
        }
    }

    /// Check rules other than `Required` against a cast value
    pub fn check(&self, value: &Value, errors: &mut Vec<String>) {
        for rule in &self.rules {
            let failed = match rule {
                Rule::Required(_) => false,
                Rule::MinLength(n, _) => value.as_str().map(|s| s.chars().count() < *n).unwrap_or(false),
                Rule::MaxLength(n, _) => value.as_str().map(|s| s.chars().count() > *n).unwrap_or(false),
                Rule::Min(n, _) => value.as_f64().map(|v| v < *n).unwrap_or(false),
                Rule::Max(n, _) => value.as_f64().map(|v| v > *n).unwrap_or(false),
                Rule::OneOf(values, _) => value.as_str().map(|s| !values.contains(&s)).unwrap_or(true),
                Rule::Email(_) => value.as_str().map(|s| !is_valid_email(s)).unwrap_or(true),
            };
            if failed {
                errors.push(rule.message().to_string());
            }
        }
    }

    pub fn required_message(&self) -> Option<&'static str> {
        self.rules.iter().find_map(|r| match r {
            Rule::Required(message) => Some(*message),
            _ => None,
        })
    }
}

impl Rule {
    pub fn message(&self) -> &'static str {
        match self {
            Rule::Required(m)
            | Rule::MinLength(_, m)
            | Rule::MaxLength(_, m)
            | Rule::Min(_, m)
            | Rule::Max(_, m)
            | Rule::OneOf(_, m)
            | Rule::Email(m) => m,
        }
    }
}

/// Rule spanning several fields, run when any trigger field is written
#[derive(Clone)]
pub struct CrossCheck {
    pub triggers: &'static [&'static str],
    /// Returns an error message when the merged document is invalid
    pub check: fn(&Document) -> Option<String>,
}

/// How a relation is expanded on read
#[derive(Clone)]
pub enum Relation {
    /// Replace the id (or ids) stored in `field` with the referenced documents
    Reference {
        field: &'static str,
        target: fn() -> &'static EntitySchema,
        projection: Projection,
    },
    /// Attach documents of `target` whose `foreign_field` holds this document's id
    Virtual {
        name: &'static str,
        target: fn() -> &'static EntitySchema,
        foreign_field: &'static str,
        projection: Projection,
    },
}

/// Output-only field computed from the stored document
#[derive(Clone)]
pub struct VirtualField {
    pub name: &'static str,
    pub compute: fn(&Document) -> Option<Value>,
}

pub struct EntitySchema {
    pub collection: Collection,
    /// Singular name used in messages ("tour")
    pub entity: &'static str,
    pub fields: Vec<FieldDef>,
    pub checks: Vec<CrossCheck>,
    /// Never returned to clients
    pub hidden: &'static [&'static str],
    /// Always applied to finds
    pub scope: Filter,
    /// Expanded on every read
    pub expand: Vec<Relation>,
    pub virtuals: Vec<VirtualField>,
}

impl EntitySchema {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn transient_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().filter(|f| f.transient).map(|f| f.name)
    }

    /// Remove hidden fields in place
    pub fn strip_hidden(&self, doc: &mut Document) {
        for field in self.hidden {
            doc.remove(*field);
        }
    }

    pub fn not_found(&self, id: &str) -> String {
        format!("No {} found with id: {}", self.entity, id)
    }
}

impl std::fmt::Debug for EntitySchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntitySchema")
            .field("collection", &self.collection.name)
            .field("fields", &self.fields.len())
            .finish()
    }
}

/// JSON number from f64, keeping integers integral
pub fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        json!(n as i64)
    } else {
        json!(n)
    }
}

pub fn round2(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}

fn cast_date(value: &Value) -> Option<Value> {
    match value {
        Value::String(s) => parse_instant(s.trim()).map(|at| json!(format_instant(at))),
        Value::Number(n) => chrono::DateTime::from_timestamp_millis(n.as_i64()?).map(|at| json!(format_instant(at))),
        _ => None,
    }
}

fn cast_id(value: &Value) -> Option<Value> {
    let s = value.as_str()?;
    uuid::Uuid::parse_str(s.trim()).ok().map(|id| json!(id.to_string()))
}

/// Lists accept a single element as a one-element list
fn cast_list(value: &Value, cast: impl Fn(&Value) -> Option<Value>) -> Option<Value> {
    match value {
        Value::Array(items) => items.iter().map(&cast).collect::<Option<Vec<_>>>().map(Value::Array),
        other => cast(other).map(|v| Value::Array(vec![v])),
    }
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_cast_accepts_numeric_strings() {
        let field = FieldDef::new("price", FieldKind::Number);
        assert_eq!(field.cast(&json!("497")), Ok(json!(497)));
        assert_eq!(field.cast(&json!("4.7")), Ok(json!(4.7)));
        assert_eq!(field.cast(&json!("cheap")), Err("Invalid price: \"cheap\"".to_string()));
    }

    #[test]
    fn test_date_and_id_casts() {
        let field = FieldDef::new("startDates", FieldKind::DateList);
        assert_eq!(field.cast(&json!(["2021-06-19"])), Ok(json!(["2021-06-19T00:00:00.000Z"])));
        assert!(field.cast(&json!(["someday"])).is_err());

        let field = FieldDef::new("tour", FieldKind::Id);
        assert!(field.cast(&json!("5c88fa8cf4afda39709c2955")).is_err());
        assert!(field.cast(&json!(uuid::Uuid::new_v4().to_string())).is_ok());
    }

    #[test]
    fn test_rules() {
        let field = FieldDef::new("name", FieldKind::String)
            .rule(Rule::MinLength(10, "too short"))
            .rule(Rule::MaxLength(40, "too long"));
        let mut errors = Vec::new();
        field.check(&json!("Short"), &mut errors);
        assert_eq!(errors, vec!["too short"]);

        let field = FieldDef::new("difficulty", FieldKind::String).rule(Rule::OneOf(&["easy", "medium"], "bad"));
        let mut errors = Vec::new();
        field.check(&json!("extreme"), &mut errors);
        assert_eq!(errors, vec!["bad"]);
    }

    #[test]
    fn test_email_format() {
        assert!(is_valid_email("jonas@example.com"));
        assert!(!is_valid_email("jonas.example.com"));
        assert!(!is_valid_email("jonas@example"));
        assert!(!is_valid_email("jo nas@example.com"));
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(4.666666), 4.67);
        assert_eq!(number(5.0), json!(5));
    }
}
