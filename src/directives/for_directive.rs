//! `*for` - render the owner template once per array element.
//!
//! Accepted argument forms:
//!
//! ```text
//! item of items
//! let item of items
//! let item of items; index as i
//! let item of items; let i = index
//! ```
//!
//! Each row renders in its own directive scope holding the item (and the
//! index, if named). Rows are reused by position: when the array changes,
//! existing rows get the new values through their scope, surplus rows are
//! torn down and missing rows are appended.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use crate::dom::Node;
use crate::error::{Error, Result};
use crate::model::{Hooks, Lifecycle, ModelCell, ModelObject, ModelRef, Subscription};
use crate::render::{Directive, DirectiveContext, PropertySource, RenderEngine};
use crate::types::Value;

/// Parsed `*for` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForArgument {
    pub item: String,
    pub index: Option<String>,
    pub expression: String,
}

impl ForArgument {
    pub fn parse(argument: &str) -> Option<Self> {
        let mut clauses = argument.split(';').map(str::trim);
        let head = clauses.next()?;
        let head = head.strip_prefix("let ").unwrap_or(head).trim_start();
        let (item, expression) = head.split_once(" of ")?;
        let (item, expression) = (item.trim(), expression.trim());
        if !is_identifier(item) || expression.is_empty() {
            return None;
        }

        let mut index = None;
        for clause in clauses.filter(|c| !c.is_empty()) {
            let name = if let Some(name) = clause.strip_prefix("index as ") {
                name.trim()
            } else {
                let binding = clause.strip_prefix("let ")?;
                let (name, value) = binding.split_once('=')?;
                if value.trim() != "index" {
                    return None;
                }
                name.trim()
            };
            if !is_identifier(name) {
                return None;
            }
            index = Some(name.to_string());
        }

        Some(Self {
            item: item.to_string(),
            index,
            expression: expression.to_string(),
        })
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

// =============================================================================
// Directive
// =============================================================================

pub struct ForDirective {
    state: Rc<ForState>,
}

struct Row {
    locals: ModelRef,
    engine: RenderEngine,
    nodes: Vec<Node>,
}

struct ForState {
    context: DirectiveContext,
    argument: ForArgument,
    source: PropertySource,
    rows: RefCell<Vec<Row>>,
    subscription: RefCell<Option<Subscription>>,
}

impl ForDirective {
    pub fn new(context: DirectiveContext) -> Result<Self> {
        let argument = ForArgument::parse(&context.argument).ok_or_else(|| Error::InvalidDirectiveArgument {
            selector: context.selector.clone(),
            argument: context.argument.clone(),
        })?;
        let source = context.engine.resolve_property(&argument.expression)?;
        Ok(Self {
            state: Rc::new(ForState {
                context,
                argument,
                source,
                rows: RefCell::new(Vec::new()),
                subscription: RefCell::new(None),
            }),
        })
    }

    pub fn row_count(&self) -> usize {
        self.state.rows.borrow().len()
    }
}

impl ForState {
    fn start(self: &Rc<Self>) {
        self.update();
        let weak: Weak<ForState> = Rc::downgrade(self);
        let subscription = self.source.subscribe(move || {
            if let Some(state) = weak.upgrade() {
                state.update();
            }
        });
        *self.subscription.borrow_mut() = Some(subscription);
    }

    fn items(&self) -> Vec<Value> {
        match self.source.evaluate() {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                debug!(expression = self.argument.expression.as_str(), value = %other, "*for source is not an array");
                Vec::new()
            }
        }
    }

    fn update(&self) {
        let items = self.items();
        let existing = self.rows.borrow().len();
        trace!(expression = self.argument.expression.as_str(), rows = items.len(), "*for update");

        let surplus = {
            let mut rows = self.rows.borrow_mut();
            rows.split_off(items.len().min(existing))
        };
        for row in surplus {
            row.engine.teardown();
        }

        let reused: Vec<ModelRef> = self.rows.borrow().iter().map(|r| r.locals.clone()).collect();
        for (index, locals) in reused.iter().enumerate() {
            locals.set(&self.argument.item, items[index].clone());
            if let Some(name) = &self.argument.index {
                locals.set(name, Value::from(index));
            }
        }

        for (index, item) in items.into_iter().enumerate().skip(existing) {
            match self.render_row(index, item) {
                Some(row) => self.rows.borrow_mut().push(row),
                None => break,
            }
        }
    }

    fn render_row(&self, index: usize, item: Value) -> Option<Row> {
        let owner = self.context.owner.as_ref()?;
        let anchor = &self.context.anchor;
        let parent = anchor.parent()?;

        let mut scope = ModelObject::new().with(&self.argument.item, item);
        if let Some(name) = &self.argument.index {
            scope = scope.with(name, Value::from(index));
        }
        let locals = ModelCell::new(scope);
        let engine = self.context.engine.scoped(locals.clone());

        let after = self
            .rows
            .borrow()
            .last()
            .and_then(|row| row.nodes.last().cloned())
            .unwrap_or_else(|| anchor.clone());
        let reference = after.next_sibling();
        match engine.render_into(owner, &parent, reference.as_ref()) {
            Ok(nodes) => Some(Row { locals, engine, nodes }),
            Err(err) => {
                debug!(error = %err, "*for row skipped");
                None
            }
        }
    }
}

impl Lifecycle for ForDirective {
    fn hooks(&self) -> Hooks {
        Hooks::ON_INIT | Hooks::ON_DESTROY
    }

    fn on_init(&mut self) {
        let state = Rc::downgrade(&self.state);
        self.state.context.anchor.on_parented(move || {
            if let Some(state) = state.upgrade() {
                state.start();
            }
        });
    }

    fn on_destroy(&mut self) {
        self.state.subscription.borrow_mut().take();
        let rows = self.state.rows.take();
        for row in rows {
            row.engine.teardown();
        }
    }
}

impl Directive for ForDirective {}
