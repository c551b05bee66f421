// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! supervisord: the process supervisor binary. Wires the registry,
//! lifecycle controller, event bus, and gateway crates together behind
//! one `main`.

pub mod config;
pub mod event_bus;
pub mod gateway;
pub mod lifecycle;

pub use config::Config;
pub use event_bus::{EventBus, SubscriptionHandle};
pub use gateway::{install_event_forwarding, router, AppState};
pub use lifecycle::{LifecycleController, LifecycleError, StartProcessArgs};
