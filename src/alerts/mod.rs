//! Alert types, deduplicating bus and listeners
//!
//! Rules produce [`Alert`] values; the [`AlertBus`] keeps one copy per
//! occurrence and fans new ones out to listeners.

mod bus;
mod factory;
mod notifier;
mod repeat;
mod types;

pub use bus::{AlertBus, AlertListener, CallbackListener, ListenerId};
pub use factory::AlertFactory;
pub use notifier::{FilteredListener, TerminalNotifier};
pub use repeat::{Reminder, RepeatConfig, RepeatScheduler};
pub use types::{Alert, AlertKey, AlertSeverity, PatientFilter};
