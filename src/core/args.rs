//! Arguments passed from one task to the next.
//!
//! Plain data travels as [`serde_json::Value`]. A join built with
//! `all()` hands the next task one [`Slot`] per registered token, each slot
//! carrying the arguments its token fired with and the token's optional key.

use serde::Serialize;
use serde_json::Value;

/// A single argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Arg {
    /// Plain data.
    Value(Value),
    /// Arguments recorded by one join token.
    Slot(Slot),
}

/// Arguments recorded for one join token, tagged with the token's key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Slot {
    /// Key given when the token was registered, if any.
    pub key: Option<Value>,
    /// Arguments the token fired with.
    pub args: Args,
}

/// Ordered argument vector handed to a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Args(Vec<Arg>);

impl Args {
    /// An empty argument list.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// A list holding a single value.
    pub fn one(value: impl Into<Value>) -> Self {
        Self(vec![Arg::Value(value.into())])
    }

    /// Append a plain value.
    pub fn push(&mut self, value: impl Into<Value>) {
        self.0.push(Arg::Value(value.into()));
    }

    /// Append an argument as-is.
    pub fn push_arg(&mut self, arg: Arg) {
        self.0.push(arg);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arg> {
        self.0.get(index)
    }

    /// Get the plain value at `index`, or `None` if it is missing or a slot.
    pub fn value(&self, index: usize) -> Option<&Value> {
        match self.0.get(index)? {
            Arg::Value(v) => Some(v),
            Arg::Slot(_) => None,
        }
    }

    /// Get the join slot at `index`, or `None` if it is missing or plain data.
    pub fn slot(&self, index: usize) -> Option<&Slot> {
        match self.0.get(index)? {
            Arg::Slot(s) => Some(s),
            Arg::Value(_) => None,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arg> {
        self.0.iter()
    }

    /// Plain values in order, skipping slots.
    pub fn values(&self) -> Vec<&Value> {
        self.0
            .iter()
            .filter_map(|arg| match arg {
                Arg::Value(v) => Some(v),
                Arg::Slot(_) => None,
            })
            .collect()
    }

    /// Render as JSON, slots becoming `{"key": .., "args": [..]}` objects.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl From<Vec<Value>> for Args {
    fn from(values: Vec<Value>) -> Self {
        values.into_iter().collect()
    }
}

impl From<Vec<Arg>> for Args {
    fn from(args: Vec<Arg>) -> Self {
        Self(args)
    }
}

impl FromIterator<Value> for Args {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self(iter.into_iter().map(Arg::Value).collect())
    }
}

impl IntoIterator for Args {
    type Item = Arg;
    type IntoIter = std::vec::IntoIter<Arg>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Args {
    type Item = &'a Arg;
    type IntoIter = std::slice::Iter<'a, Arg>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Slot {
    /// Plain values this token fired with.
    pub fn values(&self) -> Vec<&Value> {
        self.args.values()
    }
}
