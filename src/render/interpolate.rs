//! `{{ }}` interpolation.
//!
//! The template text is kept as written. Every render substitutes all
//! placeholders in one left-to-right pass over that original text, so a
//! value that itself contains `{{x}}` is never expanded again.

use tracing::trace;

use super::engine::RenderEngine;
use super::resolve::PropertySource;
use crate::dom::Node;
use crate::error::Result;
use crate::model::protocol;
use crate::template::expr::placeholders;
use crate::types::{Value, to_text};

/// Property name that targets a node's text instead of an attribute.
pub(crate) const TEXT_CONTENT: &str = "textContent";

/// Replace every occurrence of each `(raw, value)` pair in `text`.
///
/// ```
/// use spark_elements::render::substitute;
///
/// let out = substitute("{{a}}-{{b}}-{{a}}", &[("{{a}}".into(), "1".into()), ("{{b}}".into(), "2".into())]);
/// assert_eq!(out, "1-2-1");
/// ```
pub fn substitute(text: &str, values: &[(String, String)]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    'scan: while !rest.is_empty() {
        if rest.starts_with("{{") {
            for (raw, value) in values {
                if let Some(tail) = rest.strip_prefix(raw.as_str()) {
                    out.push_str(value);
                    rest = tail;
                    continue 'scan;
                }
            }
        }
        let Some(ch) = rest.chars().next() else { break };
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    out
}

impl RenderEngine {
    /// Bind every placeholder in `text` into `attribute` of `node`.
    ///
    /// `attribute` is [`TEXT_CONTENT`] for text nodes. Returns the number of
    /// placeholders bound; zero means `text` was static.
    pub(crate) fn interpolate(&self, node: &Node, attribute: &str, text: &str) -> Result<usize> {
        let found = placeholders(text);
        if found.is_empty() {
            return Ok(0);
        }

        let mut sources: Vec<(String, PropertySource)> = Vec::with_capacity(found.len());
        for placeholder in found {
            let source = self.resolve_property(&placeholder.expression)?;
            sources.push((placeholder.raw, source));
        }

        let render = {
            let node = node.downgrade();
            let attribute = attribute.to_string();
            let template = text.to_string();
            let sources = sources.clone();
            move || {
                let Some(node) = node.upgrade() else { return };
                let values: Vec<(String, String)> = sources
                    .iter()
                    .map(|(raw, source)| {
                        let value = source.evaluate().map(|v| to_text(&v)).unwrap_or_default();
                        (raw.clone(), value)
                    })
                    .collect();
                let rendered = substitute(&template, &values);
                trace!(attribute = attribute.as_str(), rendered = rendered.as_str(), "interpolated");
                node.set_property(&attribute, Value::String(rendered));
            }
        };

        let render = std::rc::Rc::new(render);
        for (_, source) in &sources {
            self.watch_source(source, node);
            let render = render.clone();
            protocol::subscribe_one_way(&source.owner, &source.path, node, attribute, move || render());
        }
        render();
        Ok(sources.len())
    }
}
