//! Result actions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Hotkey given to a default action that has none
pub const DEFAULT_ACTION_HOTKEY: &str = "Enter";

/// Callback bound to an action; returns whether the window should hide afterwards
pub type ActionHandler = Arc<dyn Fn(&ActionContext) -> bool + Send + Sync>;

/// Modifier key state at the time an action is invoked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn none() -> Self {
        Self::default()
    }
}

/// Context passed to an action callback
#[derive(Debug, Clone, Default)]
pub struct ActionContext {
    pub modifiers: Modifiers,
    pub context_data: Option<String>,
}

/// Outcome of invoking an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionOutcome {
    pub hide_window: bool,
}

/// An executable action attached to a result
#[derive(Clone)]
pub struct ResultAction {
    pub id: String,
    pub name: String,
    pub is_default: bool,
    pub hotkey: Option<String>,
    /// Keep the window open even if the handler asks to hide it
    pub prevent_hide: bool,
    pub handler: ActionHandler,
}

impl ResultAction {
    /// Create a new action
    pub fn new<S, F>(name: S, handler: F) -> Self
    where
        S: Into<String>,
        F: Fn(&ActionContext) -> bool + Send + Sync + 'static,
    {
        Self {
            id: String::new(),
            name: name.into(),
            is_default: false,
            hotkey: None,
            prevent_hide: false,
            handler: Arc::new(handler),
        }
    }

    /// Set the action id
    pub fn with_id<S: Into<String>>(mut self, id: S) -> Self {
        self.id = id.into();
        self
    }

    /// Mark the action as the default one
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Set the hotkey
    pub fn with_hotkey<S: Into<String>>(mut self, hotkey: S) -> Self {
        self.hotkey = Some(hotkey.into());
        self
    }

    /// Keep the window visible after the action runs
    pub fn preventing_hide(mut self) -> Self {
        self.prevent_hide = true;
        self
    }

    /// Run the handler
    pub fn invoke(&self, context: &ActionContext) -> ActionOutcome {
        let wants_hide = (self.handler)(context);
        ActionOutcome {
            hide_window: wants_hide && !self.prevent_hide,
        }
    }
}

impl fmt::Debug for ResultAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultAction")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("is_default", &self.is_default)
            .field("hotkey", &self.hotkey)
            .field("prevent_hide", &self.prevent_hide)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_invoke_passes_context() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let action = ResultAction::new("Open", move |ctx| {
            if ctx.modifiers.ctrl {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            true
        });

        let ctx = ActionContext {
            modifiers: Modifiers {
                ctrl: true,
                ..Default::default()
            },
            context_data: None,
        };
        assert!(action.invoke(&ctx).hide_window);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_prevent_hide_wins() {
        let action = ResultAction::new("Copy", |_| true).preventing_hide();
        assert!(!action.invoke(&ActionContext::default()).hide_window);
    }
}
