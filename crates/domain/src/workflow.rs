//! Workflow document model and the `uses` tree walker

use regex::Regex;
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::LazyLock;

/// Matches `uses: <value>` in block or flow style, keeping the key, quotes
/// and value apart so only the value is replaced. The value may sit on the
/// line after the key.
static USES_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)(?P<key>(?:^|[\s{,])["']?uses["']?[ \t]*:(?:[ \t]*\r?\n)?[ \t]*)(?P<open>["']?)(?P<value>[^\s"'#,{}\[\]]+)(?P<close>["']?)"#,
    )
    .expect("Valid regex")
});

/// Placeholder spliced into a candidate span to find out where it lands
const SPAN_MARKER: &str = "musikant-span-marker";

/// Walk the tree depth-first and pass every scalar found under a `uses` key
/// through `transform`.
///
/// Values are replaced in place when the transform returns something
/// different. Keys are never visited as values. Returns whether anything
/// changed.
pub fn process_tree(node: &mut Value, transform: &mut dyn FnMut(&str) -> String) -> bool {
    match node {
        Value::Mapping(mapping) => {
            let mut modified = false;
            for (key, value) in mapping.iter_mut() {
                if key.as_str() == Some("uses") {
                    if let Value::String(current) = value {
                        let replacement = transform(current.as_str());
                        if replacement != *current {
                            *current = replacement;
                            modified = true;
                        }
                        continue;
                    }
                }
                modified |= process_tree(value, transform);
            }
            modified
        }
        Value::Sequence(items) => {
            let mut modified = false;
            for item in items.iter_mut() {
                modified |= process_tree(item, transform);
            }
            modified
        }
        Value::Tagged(tagged) => process_tree(&mut tagged.value, transform),
        _ => false,
    }
}

/// A parsed workflow file that remembers its source text
///
/// Rendering patches the recorded `uses` edits into the original text, so
/// comments, quoting and key order survive the rewrite.
#[derive(Debug, Clone)]
pub struct WorkflowDocument {
    source: String,
    root: Value,
    edits: Vec<(String, String)>,
}

impl WorkflowDocument {
    pub fn parse(source: impl Into<String>) -> Result<Self, serde_yaml::Error> {
        let source = source.into();
        let root = first_document(&source)?;
        Ok(Self {
            source,
            root,
            edits: Vec::new(),
        })
    }

    /// All `uses` values in document order
    pub fn uses_values(&mut self) -> Vec<String> {
        let mut found = Vec::new();
        process_tree(&mut self.root, &mut |value| {
            found.push(value.to_string());
            value.to_string()
        });
        found
    }

    /// Rewrite `uses` values in place; returns whether any value changed
    pub fn rewrite_uses(&mut self, transform: &mut dyn FnMut(&str) -> String) -> bool {
        let edits = &mut self.edits;
        process_tree(&mut self.root, &mut |value| {
            let replacement = transform(value);
            if replacement != value {
                edits.push((value.to_string(), replacement.clone()));
            }
            replacement
        })
    }

    pub fn is_modified(&self) -> bool {
        !self.edits.is_empty()
    }

    /// Serialize the document with all recorded edits applied.
    ///
    /// Edits are spliced into the source at spans that parse as a value
    /// directly under a `uses` key. The patched text must parse back to the
    /// rewritten tree; otherwise the tree is re-serialized, losing comments.
    pub fn render(&self) -> Result<String, serde_yaml::Error> {
        if self.edits.is_empty() {
            return Ok(self.source.clone());
        }

        let replacements: HashMap<&str, &str> = self
            .edits
            .iter()
            .map(|(from, to)| (from.as_str(), to.as_str()))
            .collect();

        let mut patched = String::with_capacity(self.source.len());
        let mut copied = 0;

        for caps in USES_ENTRY.captures_iter(&self.source) {
            let Some(value) = caps.name("value") else {
                continue;
            };
            if caps["open"] != caps["close"] {
                continue;
            }
            let Some(to) = replacements.get(value.as_str()) else {
                continue;
            };
            if !self.is_uses_value(value.range()) {
                continue;
            }

            patched.push_str(&self.source[copied..value.start()]);
            patched.push_str(to);
            copied = value.end();
        }
        patched.push_str(&self.source[copied..]);

        if first_document(&patched).is_ok_and(|tree| tree == self.root) {
            return Ok(patched);
        }

        tracing::warn!(
            edits = self.edits.len(),
            "Could not patch every uses value in place, re-serializing document"
        );
        serde_yaml::to_string(&self.root)
    }

    /// Whether `span` of the source holds a scalar sitting directly under a
    /// `uses` key, as opposed to comment, script or key text
    fn is_uses_value(&self, span: Range<usize>) -> bool {
        let marked = format!(
            "{}{}{}",
            &self.source[..span.start],
            SPAN_MARKER,
            &self.source[span.end..]
        );
        let Ok(mut tree) = first_document(&marked) else {
            return false;
        };

        let mut found = false;
        process_tree(&mut tree, &mut |value| {
            found |= value == SPAN_MARKER;
            value.to_string()
        });
        found
    }
}

/// Parse the first YAML document of `source`; later documents are ignored
fn first_document(source: &str) -> Result<Value, serde_yaml::Error> {
    match serde_yaml::Deserializer::from_str(source).next() {
        Some(document) => Value::deserialize(document),
        None => Ok(Value::Null),
    }
}
