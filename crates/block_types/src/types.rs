// Block Types - Shape definitions for the visual block editor
//
// These types describe what a block type looks like: which fields it carries,
// which value and statement inputs it exposes, and how it connects to its
// neighbours. The editor builds its palette from them and the shape checker
// uses them to validate documents.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Field Values
// ─────────────────────────────────────────────────────────────────────────────

/// A literal value authored directly on a block (not a connection)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Checkbox-style fields
    Bool(bool),
    /// Number fields (kept as a JSON number so integers stay integers)
    Number(serde_json::Number),
    /// Text fields and dropdown choices
    Text(String),
}

impl FieldValue {
    /// Create a text value
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// Create an integer value
    pub fn integer(value: i64) -> Self {
        FieldValue::Number(value.into())
    }

    /// Create a real value (non-finite values collapse to zero)
    pub fn real(value: f64) -> Self {
        serde_json::Number::from_f64(value)
            .map(FieldValue::Number)
            .unwrap_or_else(|| FieldValue::integer(0))
    }

    /// Get the value as a string slice if it is text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as f64 if it is numeric (numeric text is accepted too)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => n.as_f64(),
            FieldValue::Text(s) => s.trim().parse().ok(),
            FieldValue::Bool(_) => None,
        }
    }

    /// Get the value as bool if it is a checkbox value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            FieldValue::Text(s) if s.eq_ignore_ascii_case("true") => Some(true),
            FieldValue::Text(s) if s.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::text(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::integer(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::real(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Field Definitions
// ─────────────────────────────────────────────────────────────────────────────

/// Kind of an authored field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// Free text input
    Text,
    /// Numeric input
    Number,
    /// Checkbox
    Checkbox,
    /// Fixed set of (label, value) choices
    Dropdown { options: Vec<(String, String)> },
    /// Serializable label (shown, not edited)
    Label,
}

/// Definition of a field on a block type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name (key in `BlockInstance::fields`)
    pub name: String,
    /// What kind of editor the field uses
    #[serde(flatten)]
    pub kind: FieldKind,
    /// Value a freshly created block starts with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<FieldValue>,
}

impl FieldDef {
    /// Create a text field
    pub fn text(name: &str, default: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Text,
            default: Some(FieldValue::text(default)),
        }
    }

    /// Create a number field
    pub fn number(name: &str, default: i64) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Number,
            default: Some(FieldValue::integer(default)),
        }
    }

    /// Create a dropdown field from (label, value) pairs; the first option is the default
    pub fn dropdown(name: &str, options: &[(&str, &str)]) -> Self {
        let options: Vec<(String, String)> = options
            .iter()
            .map(|(label, value)| (label.to_string(), value.to_string()))
            .collect();
        let default = options.first().map(|(_, value)| FieldValue::text(value.clone()));
        Self {
            name: name.to_string(),
            kind: FieldKind::Dropdown { options },
            default,
        }
    }

    /// Create a serializable label field
    pub fn label(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Label,
            default: Some(FieldValue::text("")),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Input Definitions
// ─────────────────────────────────────────────────────────────────────────────

/// Kind of a connection slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    /// Accepts one expression-producing block
    Value,
    /// Accepts a chain of statement blocks
    Statement,
}

/// Default block pre-filled into a value slot by the palette
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowDef {
    /// Block type of the shadow
    #[serde(rename = "type")]
    pub block_type: String,
    /// Field overrides for the shadow
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, FieldValue>,
}

impl ShadowDef {
    /// Create a shadow of the given type
    pub fn new(block_type: &str) -> Self {
        Self {
            block_type: block_type.to_string(),
            fields: BTreeMap::new(),
        }
    }

    /// Set a field on the shadow
    pub fn with_field(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }
}

/// Definition of an input slot on a block type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputDef {
    /// Slot name
    pub name: String,
    /// Value or statement slot
    pub kind: InputKind,
    /// Optional type check (None accepts anything)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<String>,
    /// Palette default for value slots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<ShadowDef>,
}

impl InputDef {
    /// Create a value input
    pub fn value(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: InputKind::Value,
            check: None,
            shadow: None,
        }
    }

    /// Create a statement input
    pub fn statement(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: InputKind::Statement,
            check: None,
            shadow: None,
        }
    }

    /// Attach a palette shadow to a value input
    pub fn with_shadow(mut self, shadow: ShadowDef) -> Self {
        self.shadow = Some(shadow);
        self
    }

    /// Restrict the accepted output type
    pub fn with_check(mut self, check: &str) -> Self {
        self.check = Some(check.to_string());
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Block Definitions
// ─────────────────────────────────────────────────────────────────────────────

/// Definition of a block type (registered in the BlockRegistry)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockDef {
    /// Block type name (e.g., "data_set_value")
    #[serde(rename = "type")]
    pub block_type: String,
    /// Palette category (e.g., "Data")
    pub category: String,
    /// Display colour
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colour: Option<String>,
    /// Authored fields
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    /// Value and statement inputs, in display order
    #[serde(default)]
    pub inputs: Vec<InputDef>,
    /// Can be chained below another statement
    #[serde(default)]
    pub previous: bool,
    /// Can have a statement chained below it
    #[serde(default)]
    pub next: bool,
    /// Output connection (Some("") means untyped output)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Render inputs on one line
    #[serde(default)]
    pub inputs_inline: bool,
}

impl BlockDef {
    /// Create a statement block (previous + next connections)
    pub fn statement(block_type: &str, category: &str) -> Self {
        Self {
            block_type: block_type.to_string(),
            category: category.to_string(),
            colour: None,
            fields: Vec::new(),
            inputs: Vec::new(),
            previous: true,
            next: true,
            output: None,
            inputs_inline: true,
        }
    }

    /// Create an expression block (untyped output connection)
    pub fn expression(block_type: &str, category: &str) -> Self {
        Self {
            block_type: block_type.to_string(),
            category: category.to_string(),
            colour: None,
            fields: Vec::new(),
            inputs: Vec::new(),
            previous: false,
            next: false,
            output: Some(String::new()),
            inputs_inline: true,
        }
    }

    /// Set the display colour
    pub fn colour(mut self, colour: &str) -> Self {
        self.colour = Some(colour.to_string());
        self
    }

    /// Add a field
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Add an input
    pub fn input(mut self, input: InputDef) -> Self {
        self.inputs.push(input);
        self
    }

    /// Whether blocks of this type produce an expression
    pub fn is_expression(&self) -> bool {
        self.output.is_some()
    }

    /// Whether blocks of this type can sit in a statement chain
    pub fn is_statement(&self) -> bool {
        self.previous || self.next
    }

    /// Get a field by name
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Get an input by name
    pub fn get_input(&self, name: &str) -> Option<&InputDef> {
        self.inputs.iter().find(|i| i.name == name)
    }

    /// Get all value inputs
    pub fn value_inputs(&self) -> impl Iterator<Item = &InputDef> {
        self.inputs.iter().filter(|i| i.kind == InputKind::Value)
    }

    /// Get all statement inputs
    pub fn statement_inputs(&self) -> impl Iterator<Item = &InputDef> {
        self.inputs.iter().filter(|i| i.kind == InputKind::Statement)
    }
}
