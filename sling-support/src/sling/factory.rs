use crate::{config::SlingServerConfiguration, errors::SlingError};

use super::SlingSupport;

/// Factory for creating new instances of [`SlingSupport`].
///
/// Each call to [`create`](SlingSupportFactory::create) yields a fresh
/// handle bound to exactly the given configuration; implementations
/// must not hand out a partially-constructed handle, and must be safe
/// to call concurrently from multiple threads. Caching or reuse is a
/// property of compositions built on top (see
/// [`super::SlingSupportManager`]), never of the factory itself unless
/// a concrete implementation documents otherwise.
pub trait SlingSupportFactory: Send + Sync {
    /// Creates a new [`SlingSupport`] associated with the given server.
    fn create(
        &self,
        server_configuration: &SlingServerConfiguration,
    ) -> Result<SlingSupport, SlingError>;
}

/// The stock factory: straight delegation to [`SlingSupport::new`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSlingSupportFactory;

impl SlingSupportFactory for DefaultSlingSupportFactory {
    fn create(
        &self,
        server_configuration: &SlingServerConfiguration,
    ) -> Result<SlingSupport, SlingError> {
        SlingSupport::new(server_configuration.clone())
    }
}
