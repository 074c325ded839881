//! Fixed-schema definitions for resource input
//!
//! A [`Schema`] is declared once as a list of [`Property`] values. It renders
//! the JSON Schema document a provider prints, and that same document is
//! compiled with `jsonschema` (draft 2020-12) to validate input.

use crate::error::{Error, Result};
use jsonschema::Draft;
use serde_json::{Map, Value, json};

/// JSON Schema draft used for rendered documents
pub const DRAFT: &str = "https://json-schema.org/draft/2020-12/schema";

/// Primitive JSON types a property may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    String,
    Integer,
    Boolean,
    Array,
    Null,
}

impl JsonType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Null => "null",
        }
    }
}

/// One declared property
#[derive(Debug, Clone)]
pub struct Property {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub types: &'static [JsonType],
    pub one_of: Option<&'static [&'static str]>,
    pub minimum: Option<i64>,
    pub maximum: Option<i64>,
    pub default: Option<Value>,
    pub read_only: bool,
    pub write_only: bool,
    /// Element type when `types` contains [`JsonType::Array`]
    pub items: Option<JsonType>,
}

impl Property {
    pub fn new(name: &'static str, types: &'static [JsonType]) -> Self {
        Self {
            name,
            title: "",
            description: "",
            types,
            one_of: None,
            minimum: None,
            maximum: None,
            default: None,
            read_only: false,
            write_only: false,
            items: None,
        }
    }

    pub fn titled(mut self, title: &'static str, description: &'static str) -> Self {
        self.title = title;
        self.description = description;
        self
    }

    pub fn one_of(mut self, values: &'static [&'static str]) -> Self {
        self.one_of = Some(values);
        self
    }

    pub fn range(mut self, minimum: i64, maximum: i64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn items(mut self, items: JsonType) -> Self {
        self.items = Some(items);
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn write_only(mut self) -> Self {
        self.write_only = true;
        self
    }

    fn document(&self) -> Value {
        let mut doc = Map::new();
        if !self.title.is_empty() {
            doc.insert("title".into(), json!(self.title));
        }
        if !self.description.is_empty() {
            doc.insert("description".into(), json!(self.description));
        }
        doc.insert(
            "type".into(),
            match self.types {
                [single] => json!(single.name()),
                many => json!(many.iter().map(JsonType::name).collect::<Vec<_>>()),
            },
        );
        if let Some(values) = self.one_of {
            doc.insert("enum".into(), json!(values));
        }
        if let Some(min) = self.minimum {
            doc.insert("minimum".into(), json!(min));
        }
        if let Some(max) = self.maximum {
            doc.insert("maximum".into(), json!(max));
        }
        if let Some(items) = self.items {
            doc.insert("items".into(), json!({ "type": items.name() }));
        }
        if let Some(default) = &self.default {
            doc.insert("default".into(), default.clone());
        }
        if self.read_only {
            doc.insert("readOnly".into(), json!(true));
        }
        if self.write_only {
            doc.insert("writeOnly".into(), json!(true));
        }
        Value::Object(doc)
    }
}


/// A fixed object schema
#[derive(Debug, Clone)]
pub struct Schema {
    pub title: &'static str,
    pub required: &'static [&'static str],
    pub properties: Vec<Property>,
}

impl Schema {
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Render the JSON Schema document
    pub fn document(&self) -> Value {
        let properties: Map<String, Value> = self
            .properties
            .iter()
            .map(|p| (p.name.to_string(), p.document()))
            .collect();

        json!({
            "$schema": DRAFT,
            "title": self.title,
            "type": "object",
            "required": self.required,
            "additionalProperties": false,
            "properties": properties,
        })
    }

    /// Compile the rendered document into a validator
    pub fn compile(&self) -> Result<Validator> {
        let inner = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(&self.document())
            .map_err(|e| Error::Unexpected(format!("invalid schema '{}': {e}", self.title)))?;

        let names = |keep: fn(&Property) -> bool| {
            self.properties
                .iter()
                .filter(|p| keep(p))
                .map(|p| p.name)
                .collect::<Vec<_>>()
        };

        Ok(Validator {
            title: self.title,
            inner,
            write_only: names(|p| p.write_only),
            integers: names(|p| p.types.contains(&JsonType::Integer)),
        })
    }

    /// Compile and validate in one step; see [`Validator::validate`]
    pub fn validate(&self, input: &Map<String, Value>) -> Result<Map<String, Value>> {
        self.compile()?.validate(input)
    }
}

/// A compiled [`Schema`]
pub struct Validator {
    title: &'static str,
    inner: jsonschema::Validator,
    write_only: Vec<&'static str>,
    integers: Vec<&'static str>,
}

impl Validator {
    /// Validate a candidate input object, reporting the first violation
    ///
    /// Returns the input with integral numbers written as floats (`30.0`)
    /// normalized to integers for integer properties.
    pub fn validate(&self, input: &Map<String, Value>) -> Result<Map<String, Value>> {
        let instance = Value::Object(input.clone());
        self.inner
            .validate(&instance)
            .map_err(|error| Error::Validation(self.describe(&error)))?;

        log::debug!(
            target: "schema",
            "Input satisfies schema '{}' ({} properties)",
            self.title,
            input.len()
        );
        Ok(self.normalize(input))
    }

    /// Name the offending property; never echo a write-only value
    fn describe(&self, error: &jsonschema::ValidationError<'_>) -> String {
        let path = error.instance_path().to_string();
        let Some(name) = path
            .strip_prefix('/')
            .and_then(|p| p.split('/').next())
            .filter(|p| !p.is_empty())
        else {
            return error.to_string();
        };

        if self.write_only.iter().any(|w| *w == name) {
            return format!("property '{name}': value does not satisfy the schema (value hidden)");
        }
        if path.len() == name.len() + 1 {
            format!("property '{name}': {error}")
        } else {
            format!("property '{name}' at {path}: {error}")
        }
    }

    fn normalize(&self, input: &Map<String, Value>) -> Map<String, Value> {
        let mut output = input.clone();
        for name in &self.integers {
            if let Some(value) = output.get_mut(*name)
                && value.is_f64()
                && let Some(n) = value.as_f64().filter(|n| n.fract() == 0.0)
            {
                #[allow(clippy::cast_possible_truncation)]
                let integer = n as i64;
                *value = Value::from(integer);
            }
        }
        output
    }
}
