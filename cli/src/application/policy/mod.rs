//! Policy inputs: typed variables grouped into providers.
//!
//! A provider is only obtainable through a successful `init`, so holding one
//! means every accessor returns a usable variable. Variables borrow from
//! their provider and cannot outlive it.

pub mod config_provider;
pub mod system_provider;
pub mod variable;

pub use config_provider::{ConfigProvider, RealConfigProvider};
pub use system_provider::{RealSystemProvider, SystemProvider};
pub use variable::{
    CachedVariable, CallVariable, ConstVariable, DEFAULT_POLL_INTERVAL, Variable, VariableMode,
};
