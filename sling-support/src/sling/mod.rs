pub mod factory;
pub mod manager;
pub mod support;

pub use factory::{DefaultSlingSupportFactory, SlingSupportFactory};
pub use manager::SlingSupportManager;
pub use support::SlingSupport;
