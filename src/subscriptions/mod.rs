//! Listener registration for named events.
//!
//! Each registry keeps, per event name, an ordered list of subscriptions.
//! A subscription is identified by its listener together with its parameter
//! tag, so one callback can follow the same event under several tags:
//!
//! ```ignore
//! let on_page = Listener::new(|data, delivery| println!("{}: {}", delivery.event_name, data));
//!
//! store.subscribe(Subscribe::new("GET /items", on_page.clone()).param_tag(json!({"page": 1})))?;
//! store.subscribe(Subscribe::new("GET /items", on_page.clone()).param_tag(json!({"page": 2})))?;
//!
//! // Same listener, same tag: replaces the first entry in place.
//! store.subscribe(Subscribe::new("GET /items", on_page).param_tag(json!({"page": 1})))?;
//! ```

mod manager;
mod types;

pub use manager::{Registration, SubscriptionManager};
pub use types::{Listener, Subscription};
