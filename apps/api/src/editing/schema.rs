//! Static shape description of `ResumeDocument`.
//!
//! The typed structs in `models::resume` are the source of truth for the document;
//! this table mirrors them so that untyped JSON (model output, mutation values) can be
//! checked against the schema before it is allowed anywhere near the typed document.

use serde_json::{Map, Value};

/// The shape of one node in the resume schema.
#[derive(Debug)]
pub enum Shape {
    /// A scalar string.
    Text,
    /// An ordered sequence of elements of one shape.
    List(&'static Shape),
    /// A closed record: only the listed fields exist.
    Record(&'static [(&'static str, Shape)]),
    /// An open string-keyed map (new keys may be created).
    Map(&'static Shape),
}

static WORK_EXPERIENCE: Shape = Shape::Record(&[
    ("title", Shape::Text),
    ("company", Shape::Text),
    ("duration", Shape::Text),
    ("location", Shape::Text),
    ("description", Shape::List(&Shape::Text)),
]);

static PROJECT: Shape = Shape::Record(&[
    ("name", Shape::Text),
    ("duration", Shape::Text),
    ("description", Shape::List(&Shape::Text)),
    ("technologies", Shape::List(&Shape::Text)),
    ("links", Shape::List(&Shape::Text)),
]);

static EDUCATION: Shape = Shape::Record(&[
    ("degree", Shape::Text),
    ("institution", Shape::Text),
    ("duration", Shape::Text),
]);

static CERTIFICATION: Shape = Shape::Record(&[
    ("name", Shape::Text),
    ("issuer", Shape::Text),
    ("date", Shape::Text),
    ("credential_id", Shape::Text),
]);

/// Root shape of a resume document.
pub static RESUME_SHAPE: Shape = Shape::Record(&[
    (
        "overview",
        Shape::Record(&[
            ("name", Shape::Text),
            ("current_role", Shape::Text),
            ("company", Shape::Text),
            ("professional_summary", Shape::Text),
        ]),
    ),
    (
        "contact_info",
        Shape::Record(&[
            ("phone", Shape::Text),
            ("email", Shape::Text),
            ("location", Shape::Text),
            ("profile_links", Shape::Map(&Shape::Text)),
        ]),
    ),
    ("skills", Shape::List(&Shape::Text)),
    ("work_experience", Shape::List(&WORK_EXPERIENCE)),
    ("projects", Shape::List(&PROJECT)),
    ("education", Shape::List(&EDUCATION)),
    ("certifications", Shape::List(&CERTIFICATION)),
    ("achievements", Shape::List(&Shape::Text)),
]);

impl Shape {
    /// Shape of a named child. Records only know their declared fields; maps accept any key.
    pub fn field(&self, key: &str) -> Option<&Shape> {
        match self {
            Shape::Record(fields) => fields
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, shape)| shape),
            Shape::Map(value) => Some(value),
            _ => None,
        }
    }

    /// Element shape of a list.
    pub fn element(&self) -> Option<&Shape> {
        match self {
            Shape::List(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_open_map(&self) -> bool {
        matches!(self, Shape::Map(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Text => "text",
            Shape::List(_) => "list",
            Shape::Record(_) => "record",
            Shape::Map(_) => "map",
        }
    }

    /// True if `value` can stand at a node of this shape.
    ///
    /// Records may omit fields (they are filled with defaults afterwards) but may not
    /// introduce fields the schema does not declare.
    pub fn conforms(&self, value: &Value) -> bool {
        match (self, value) {
            (Shape::Text, Value::String(_)) => true,
            (Shape::List(element), Value::Array(items)) => {
                items.iter().all(|item| element.conforms(item))
            }
            (Shape::Record(fields), Value::Object(map)) => map.iter().all(|(key, child)| {
                fields
                    .iter()
                    .find(|(name, _)| name == key)
                    .is_some_and(|(_, shape)| shape.conforms(child))
            }),
            (Shape::Map(inner), Value::Object(map)) => map.values().all(|v| inner.conforms(v)),
            _ => false,
        }
    }

    /// The empty value of this shape.
    pub fn default_value(&self) -> Value {
        match self {
            Shape::Text => Value::String(String::new()),
            Shape::List(_) => Value::Array(Vec::new()),
            Shape::Record(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(name, shape)| (name.to_string(), shape.default_value()))
                    .collect(),
            ),
            Shape::Map(_) => Value::Object(Map::new()),
        }
    }

    /// Inserts defaults for record fields that are absent, recursively.
    /// Assumes `value` already conforms.
    pub fn fill_defaults(&self, value: &mut Value) {
        match (self, value) {
            (Shape::List(element), Value::Array(items)) => {
                for item in items.iter_mut() {
                    element.fill_defaults(item);
                }
            }
            (Shape::Record(fields), Value::Object(map)) => {
                for (name, shape) in fields.iter() {
                    match map.get_mut(*name) {
                        Some(child) => shape.fill_defaults(child),
                        None => {
                            map.insert(name.to_string(), shape.default_value());
                        }
                    }
                }
            }
            _ => {}
        }
    }

    /// Coerces loosely structured JSON (typically model output) into this shape.
    ///
    /// - nulls become the empty value
    /// - numbers and booleans in text positions become their string form
    /// - a lone string in a list position becomes a one-element list
    /// - unknown record fields are dropped
    /// - anything else that cannot be coerced becomes the empty value
    pub fn sanitize(&self, value: Value) -> Value {
        match self {
            Shape::Text => match value {
                Value::String(s) => Value::String(s),
                Value::Number(n) => Value::String(n.to_string()),
                Value::Bool(b) => Value::String(b.to_string()),
                _ => Value::String(String::new()),
            },
            Shape::List(element) => match value {
                Value::Array(items) => Value::Array(
                    items
                        .into_iter()
                        .filter(|item| !item.is_null())
                        .map(|item| element.sanitize(item))
                        .collect(),
                ),
                Value::String(s) if matches!(element, Shape::Text) && !s.trim().is_empty() => {
                    Value::Array(vec![Value::String(s)])
                }
                _ => Value::Array(Vec::new()),
            },
            Shape::Record(fields) => {
                let mut source = match value {
                    Value::Object(map) => map,
                    _ => Map::new(),
                };
                Value::Object(
                    fields
                        .iter()
                        .map(|(name, shape)| {
                            let child = source.remove(*name).unwrap_or(Value::Null);
                            (name.to_string(), shape.sanitize(child))
                        })
                        .collect(),
                )
            }
            Shape::Map(inner) => match value {
                Value::Object(map) => Value::Object(
                    map.into_iter()
                        .filter(|(_, v)| !v.is_null())
                        .map(|(k, v)| (k, inner.sanitize(v)))
                        .collect(),
                ),
                _ => Value::Object(Map::new()),
            },
        }
    }
}
