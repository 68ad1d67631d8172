//! Static request definitions and placeholder substitution.
//!
//! A definition is a `'static` table of `(tag, template)` entries describing the
//! XML shape of one API command. Definitions are never mutated: [`substitute`]
//! always allocates a fresh [`Tree`], so one table serves every call.

use crate::value::{Args, Tree, Value};

/// One `(tag, template)` entry of a definition.
pub type Entry = (&'static str, Template);

/// Right-hand side of a definition entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    /// Replaced by the argument bound to this label.
    Placeholder(&'static str),
    /// A nested definition; becomes child elements of the tag.
    Nested(&'static [Entry]),
}

/// Binds `args` into `definition`.
///
/// A placeholder whose argument is absent or falsy drops its tag. A nested
/// definition whose substitution comes back empty drops its tag as well.
/// Surviving entries keep their declaration order.
pub fn substitute(definition: &[Entry], args: &Args) -> Tree {
    let mut tree = Tree::with_capacity(definition.len());

    for (tag, template) in definition {
        match template {
            Template::Nested(children) => {
                let subtree = substitute(children, args);
                if !subtree.is_empty() {
                    tree.push((tag.to_string(), Value::Tree(subtree)));
                }
            }
            Template::Placeholder(label) => {
                if let Some(value) = args.get(label).filter(|v| v.is_truthy()) {
                    tree.push((tag.to_string(), value.clone()));
                }
            }
        }
    }

    tree
}

/// Every placeholder label referenced by `definition`, depth first.
pub fn placeholders(definition: &[Entry]) -> Vec<&'static str> {
    let mut labels = Vec::new();
    collect_placeholders(definition, &mut labels);
    labels
}

fn collect_placeholders(definition: &[Entry], labels: &mut Vec<&'static str>) {
    for (_, template) in definition {
        match template {
            Template::Placeholder(label) => labels.push(label),
            Template::Nested(children) => collect_placeholders(children, labels),
        }
    }
}
