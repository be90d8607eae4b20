//! Structured arguments for the store's public operations.
//!
//! Every request starts from its required fields and is refined with
//! chained setters:
//!
//! ```ignore
//! store.publish(
//!     Publish::new("GET /users", json!([{"id": 1}]))
//!         .param_tag(json!({"page": 1}))
//!         .durable(),
//! )?;
//! ```

use crate::subscriptions::Listener;
use crate::types::Scope;
use serde_json::Value;

/// Set the latest value of an event and notify matching listeners.
#[derive(Clone, Debug)]
pub struct Publish {
    pub event_name: String,
    pub data: Value,
    pub param_tag: Option<Value>,
    pub scope: Scope,
    /// Deliver without storing.
    pub one_shot: bool,
    /// Store without delivering.
    pub silent: bool,
}

impl Publish {
    pub fn new(event_name: impl Into<String>, data: Value) -> Self {
        Self {
            event_name: event_name.into(),
            data,
            param_tag: None,
            scope: Scope::Transient,
            one_shot: false,
            silent: false,
        }
    }

    pub fn param_tag(mut self, tag: Value) -> Self {
        self.param_tag = Some(tag);
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn durable(self) -> Self {
        self.scope(Scope::Durable)
    }

    pub fn one_shot(mut self) -> Self {
        self.one_shot = true;
        self
    }

    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }
}

/// Remove the stored value of an event.
#[derive(Clone, Debug)]
pub struct Erase {
    pub event_name: String,
    pub scope: Scope,
}

impl Erase {
    pub fn new(event_name: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            scope: Scope::Transient,
        }
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn durable(self) -> Self {
        self.scope(Scope::Durable)
    }
}

/// Register a listener, receiving the stored value immediately if present.
#[derive(Clone, Debug)]
pub struct Subscribe {
    pub event_name: String,
    pub listener: Listener,
    pub extra_args: Option<Value>,
    pub param_tag: Option<Value>,
    pub scope: Scope,
    /// Remove after the first delivery.
    pub one_shot: bool,
}

impl Subscribe {
    pub fn new(event_name: impl Into<String>, listener: Listener) -> Self {
        Self {
            event_name: event_name.into(),
            listener,
            extra_args: None,
            param_tag: None,
            scope: Scope::Transient,
            one_shot: false,
        }
    }

    pub fn extra_args(mut self, args: Value) -> Self {
        self.extra_args = Some(args);
        self
    }

    pub fn param_tag(mut self, tag: Value) -> Self {
        self.param_tag = Some(tag);
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn durable(self) -> Self {
        self.scope(Scope::Durable)
    }

    pub fn one_shot(mut self) -> Self {
        self.one_shot = true;
        self
    }
}

/// Remove a listener registered under the same tag.
#[derive(Clone, Debug)]
pub struct Unsubscribe {
    pub event_name: String,
    pub listener: Listener,
    pub param_tag: Option<Value>,
    pub scope: Scope,
}

impl Unsubscribe {
    pub fn new(event_name: impl Into<String>, listener: Listener) -> Self {
        Self {
            event_name: event_name.into(),
            listener,
            param_tag: None,
            scope: Scope::Transient,
        }
    }

    pub fn param_tag(mut self, tag: Value) -> Self {
        self.param_tag = Some(tag);
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn durable(self) -> Self {
        self.scope(Scope::Durable)
    }
}

/// Check whether a value is stored for an event under a given tag.
#[derive(Clone, Debug)]
pub struct Exists {
    pub event_name: String,
    pub param_tag: Option<Value>,
    pub scope: Scope,
}

impl Exists {
    pub fn new(event_name: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            param_tag: None,
            scope: Scope::Transient,
        }
    }

    pub fn param_tag(mut self, tag: Value) -> Self {
        self.param_tag = Some(tag);
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn durable(self) -> Self {
        self.scope(Scope::Durable)
    }
}

impl From<Subscribe> for Unsubscribe {
    fn from(request: Subscribe) -> Self {
        Self {
            event_name: request.event_name,
            listener: request.listener,
            param_tag: request.param_tag,
            scope: request.scope,
        }
    }
}
