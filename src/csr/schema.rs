use std::fmt;

use serde_json::Value;

/// JSON types the CSR schema distinguishes (draft-04 semantics).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Object,
    Array,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Object => "object",
            FieldType::Array => "array",
        }
    }

    /// `Number` accepts integers and floats alike; `null` matches nothing.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Object => value.is_object(),
            FieldType::Array => value.is_array(),
        }
    }
}

/// A schema node: the expected type of a value and, for containers, the
/// shape of its members.
#[derive(Debug, Clone)]
pub struct Schema {
    pub field_type: FieldType,
    pub properties: Vec<(&'static str, Schema)>,
    pub required: Vec<&'static str>,
    pub items: Option<Box<Schema>>,
    /// Fragments declared alongside the node but not enforced by validation.
    pub inert: Vec<(&'static str, Schema)>,
}

impl Schema {
    pub fn of(field_type: FieldType) -> Self {
        Self {
            field_type,
            properties: Vec::new(),
            required: Vec::new(),
            items: None,
            inert: Vec::new(),
        }
    }

    pub fn property(mut self, name: &'static str, schema: Schema) -> Self {
        self.properties.push((name, schema));
        self
    }

    pub fn required(mut self, names: &[&'static str]) -> Self {
        self.required.extend_from_slice(names);
        self
    }

    pub fn items(mut self, schema: Schema) -> Self {
        self.items = Some(Box::new(schema));
        self
    }

    pub fn inert(mut self, name: &'static str, schema: Schema) -> Self {
        self.inert.push((name, schema));
        self
    }

    pub fn property_schema(&self, name: &str) -> Option<&Schema> {
        self.properties
            .iter()
            .find(|(prop, _)| *prop == name)
            .map(|(_, schema)| schema)
    }

    /// Walks `value` and returns every violation in declaration order.
    /// Keys the schema does not declare are accepted.
    pub fn check(&self, value: &Value) -> Vec<SchemaViolation> {
        let mut violations = Vec::new();
        self.check_at("", value, &mut violations);
        violations
    }

    fn check_at(&self, path: &str, value: &Value, out: &mut Vec<SchemaViolation>) {
        if !self.field_type.matches(value) {
            out.push(SchemaViolation::new(
                path,
                self.field_type.as_str(),
                json_kind(value),
            ));
            return;
        }

        if let Value::Object(map) = value {
            for name in &self.required {
                if !map.contains_key(*name) {
                    out.push(SchemaViolation::new(
                        &join_key(path, name),
                        "present",
                        "missing",
                    ));
                }
            }
            for (name, schema) in &self.properties {
                if let Some(member) = map.get(*name) {
                    schema.check_at(&join_key(path, name), member, out);
                }
            }
        }

        if let (Value::Array(elements), Some(items)) = (value, self.items.as_deref()) {
            for (index, element) in elements.iter().enumerate() {
                items.check_at(&format!("{path}[{index}]"), element, out);
            }
        }
    }
}

/// The CSR descriptor schema.
///
/// `hosts` is declared a second time inside the `names` node, next to
/// `items`. That fragment is carried as inert data: only the top-level
/// `required` list and top-level `properties` govern the document.
pub fn csr_schema() -> Schema {
    let name_entry = Schema::of(FieldType::Object)
        .property("C", Schema::of(FieldType::String))
        .property("L", Schema::of(FieldType::String))
        .property("ST", Schema::of(FieldType::String))
        .property("O", Schema::of(FieldType::String))
        .property("OU", Schema::of(FieldType::String));

    let key = Schema::of(FieldType::Object)
        .property("algo", Schema::of(FieldType::String))
        .property("size", Schema::of(FieldType::Number));

    let names = Schema::of(FieldType::Array).items(name_entry).inert(
        "hosts",
        Schema::of(FieldType::Array).items(Schema::of(FieldType::String)),
    );

    let hosts = Schema::of(FieldType::Array).items(Schema::of(FieldType::String));

    Schema::of(FieldType::Object)
        .property("CN", Schema::of(FieldType::String))
        .property("key", key)
        .property("names", names)
        .property("hosts", hosts)
        .required(&["CN", "key", "names", "hosts"])
}

/// One schema failure: where it happened, what was expected, what was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub path: String,
    pub expected: &'static str,
    pub found: &'static str,
}

impl SchemaViolation {
    fn new(path: &str, expected: &'static str, found: &'static str) -> Self {
        let path = if path.is_empty() {
            "<document>".to_string()
        } else {
            path.to_string()
        };
        Self {
            path,
            expected,
            found,
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.found == "missing" {
            write!(f, "{} is required", self.path)
        } else {
            write!(
                f,
                "{}: expected {}, found {}",
                self.path, self.expected, self.found
            )
        }
    }
}

fn join_key(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
