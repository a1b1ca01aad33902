//! Lifecycle hooks.
//!
//! A model opts into lifecycle callbacks by overriding the matching
//! [`Lifecycle`] method *and* declaring it in [`Lifecycle::hooks`]. The view
//! only invokes hooks that are declared, so an undeclared hook is skipped
//! silently and never costs a call.
//!
//! ```ignore
//! struct Clock { ticks: u32 }
//!
//! impl Lifecycle for Clock {
//!     fn hooks(&self) -> Hooks {
//!         Hooks::ON_INIT | Hooks::ON_DESTROY
//!     }
//!     fn on_init(&mut self) { self.ticks = 0; }
//!     fn on_destroy(&mut self) { /* release timers */ }
//! }
//! ```

// =============================================================================
// Capability set
// =============================================================================

bitflags::bitflags! {
    /// Hooks a model declares. Combine with bitwise OR.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Hooks: u8 {
        const ON_CHANGES = 1 << 0;
        const ON_INIT = 1 << 1;
        const DO_CHECK = 1 << 2;
        const AFTER_CONTENT_INIT = 1 << 3;
        const AFTER_CONTENT_CHECKED = 1 << 4;
        const AFTER_VIEW_INIT = 1 << 5;
        const AFTER_VIEW_CHECKED = 1 << 6;
        const ON_DESTROY = 1 << 7;
    }
}

/// A single lifecycle hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    OnChanges,
    OnInit,
    DoCheck,
    AfterContentInit,
    AfterContentChecked,
    AfterViewInit,
    AfterViewChecked,
    OnDestroy,
}

impl Hook {
    /// Hooks run on attachment, in order. Rendering sits between
    /// `AfterContentChecked` and `AfterViewInit`.
    pub const ATTACH_BEFORE_RENDER: [Hook; 5] = [
        Hook::OnChanges,
        Hook::OnInit,
        Hook::DoCheck,
        Hook::AfterContentInit,
        Hook::AfterContentChecked,
    ];

    pub const ATTACH_AFTER_RENDER: [Hook; 2] = [Hook::AfterViewInit, Hook::AfterViewChecked];

    /// Hooks run for an attribute change once the view is attached.
    pub const RECHECK: [Hook; 3] = [Hook::DoCheck, Hook::AfterContentChecked, Hook::AfterViewChecked];

    pub fn flag(self) -> Hooks {
        match self {
            Hook::OnChanges => Hooks::ON_CHANGES,
            Hook::OnInit => Hooks::ON_INIT,
            Hook::DoCheck => Hooks::DO_CHECK,
            Hook::AfterContentInit => Hooks::AFTER_CONTENT_INIT,
            Hook::AfterContentChecked => Hooks::AFTER_CONTENT_CHECKED,
            Hook::AfterViewInit => Hooks::AFTER_VIEW_INIT,
            Hook::AfterViewChecked => Hooks::AFTER_VIEW_CHECKED,
            Hook::OnDestroy => Hooks::ON_DESTROY,
        }
    }

    /// Conventional camel-case name, as used in manifests and logs.
    pub fn name(self) -> &'static str {
        match self {
            Hook::OnChanges => "onChanges",
            Hook::OnInit => "onInit",
            Hook::DoCheck => "doCheck",
            Hook::AfterContentInit => "afterContentInit",
            Hook::AfterContentChecked => "afterContentChecked",
            Hook::AfterViewInit => "afterViewInit",
            Hook::AfterViewChecked => "afterViewChecked",
            Hook::OnDestroy => "onDestroy",
        }
    }
}

// =============================================================================
// Lifecycle trait
// =============================================================================

/// Optional lifecycle callbacks. Every method defaults to a no-op.
pub trait Lifecycle {
    /// Declared capability set. Only hooks listed here are invoked.
    fn hooks(&self) -> Hooks {
        Hooks::empty()
    }

    fn on_changes(&mut self) {}
    fn on_init(&mut self) {}
    fn do_check(&mut self) {}
    fn after_content_init(&mut self) {}
    fn after_content_checked(&mut self) {}
    fn after_view_init(&mut self) {}
    fn after_view_checked(&mut self) {}
    fn on_destroy(&mut self) {}
}

/// Run `hook` on `target` if declared. Returns whether it ran.
pub fn dispatch(target: &mut (impl Lifecycle + ?Sized), hook: Hook) -> bool {
    if !target.hooks().contains(hook.flag()) {
        return false;
    }
    match hook {
        Hook::OnChanges => target.on_changes(),
        Hook::OnInit => target.on_init(),
        Hook::DoCheck => target.do_check(),
        Hook::AfterContentInit => target.after_content_init(),
        Hook::AfterContentChecked => target.after_content_checked(),
        Hook::AfterViewInit => target.after_view_init(),
        Hook::AfterViewChecked => target.after_view_checked(),
        Hook::OnDestroy => target.on_destroy(),
    }
    true
}
