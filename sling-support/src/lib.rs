pub mod config;
pub mod errors;
pub mod sling;

// Re-export commonly used types and functions, but avoid conflicts
pub use config::{
    AppConfig, Protocol, SlingManagerConfig, SlingServerConfiguration,
};
pub use errors::SlingError;
pub use sling::{
    DefaultSlingSupportFactory, SlingSupport, SlingSupportFactory,
    SlingSupportManager,
};
