pub mod action;
pub mod bus;
pub mod command;
pub mod context;
pub mod module;
pub mod signal;

pub use action::{Action, NotifyLevel};
pub use bus::{EventBus, Subscription};
pub use command::{parse_command, Command};
pub use context::{Context, Identity};
pub use module::Module;
pub use signal::{Signal, SignalKind};
