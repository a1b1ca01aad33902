//! `*if` - render the owner template while an expression is truthy.
//!
//! ```text
//! <p *if="user.active">        renders while user.active is truthy
//! <p *if="!items.length">      renders while items is empty
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::model::{Hooks, Lifecycle, ModelCell, ModelObject, Subscription};
use crate::render::{Directive, DirectiveContext, PropertySource, RenderEngine};
use crate::types::is_truthy;

pub struct IfDirective {
    state: Rc<IfState>,
}

struct IfState {
    context: DirectiveContext,
    source: PropertySource,
    negate: bool,
    scope: RefCell<Option<RenderEngine>>,
    subscription: RefCell<Option<Subscription>>,
}

impl IfDirective {
    pub fn new(context: DirectiveContext) -> Result<Self> {
        let argument = context.argument.trim();
        let (negate, expression) = match argument.strip_prefix('!') {
            Some(rest) => (true, rest.trim()),
            None => (false, argument),
        };
        if expression.is_empty() {
            return Err(Error::InvalidDirectiveArgument {
                selector: context.selector.clone(),
                argument: context.argument.clone(),
            });
        }
        let source = context.engine.resolve_property(expression)?;
        Ok(Self {
            state: Rc::new(IfState {
                context,
                source,
                negate,
                scope: RefCell::new(None),
                subscription: RefCell::new(None),
            }),
        })
    }

    /// Whether the owner template is currently rendered.
    pub fn is_rendered(&self) -> bool {
        self.state.scope.borrow().is_some()
    }
}

impl IfState {
    fn start(self: &Rc<Self>) {
        self.update();
        let weak: Weak<IfState> = Rc::downgrade(self);
        let subscription = self.source.subscribe(move || {
            if let Some(state) = weak.upgrade() {
                state.update();
            }
        });
        *self.subscription.borrow_mut() = Some(subscription);
    }

    fn update(&self) {
        let value = self.source.evaluate().unwrap_or_default();
        let show = is_truthy(&value) != self.negate;
        let shown = self.scope.borrow().is_some();
        trace!(argument = self.context.argument.as_str(), show, "*if update");
        match (show, shown) {
            (true, false) => self.render(),
            (false, true) => {
                if let Some(scope) = self.scope.borrow_mut().take() {
                    scope.teardown();
                }
            }
            _ => {}
        }
    }

    fn render(&self) {
        let Some(owner) = &self.context.owner else {
            debug!("*if has no template to render");
            return;
        };
        let anchor = &self.context.anchor;
        let Some(parent) = anchor.parent() else { return };
        let scope = self.context.engine.scoped(ModelCell::new(ModelObject::new()));
        if let Err(err) = scope.render_into(owner, &parent, anchor.next_sibling().as_ref()) {
            debug!(error = %err, "*if render skipped");
            return;
        }
        *self.scope.borrow_mut() = Some(scope);
    }
}

impl Lifecycle for IfDirective {
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
        if let Some(scope) = self.state.scope.borrow_mut().take() {
            scope.teardown();
        }
    }
}

impl Directive for IfDirective {}
