//! Fallback strategies.

use std::fmt;
use std::sync::Arc;

use crate::RestClientError;

/// Builds a fallback tailored to the failure that triggered it.
pub trait FallbackFactory<T: ?Sized>: Send + Sync {
    /// Create the fallback that answers the failed call.
    fn create(&self, cause: &RestClientError) -> Arc<T>;
}

impl<T, F> FallbackFactory<T> for F
where
    T: ?Sized,
    F: Fn(&RestClientError) -> Arc<T> + Send + Sync,
{
    fn create(&self, cause: &RestClientError) -> Arc<T> {
        self(cause)
    }
}

/// How a client answers calls that fail or time out.
///
/// The variant picks the construction strategy when the client is built.
pub enum Fallback<T: ?Sized> {
    /// Errors propagate to the caller; no command wrapper is installed.
    None,
    /// The same instance answers every failed call.
    Instance(Arc<T>),
    /// A factory receives the failure and produces the answering instance.
    Factory(Arc<dyn FallbackFactory<T>>),
}

impl<T: ?Sized> Fallback<T> {
    /// Fallback answered by a fixed instance.
    pub fn instance(fallback: Arc<T>) -> Self {
        Self::Instance(fallback)
    }

    /// Fallback produced per failure.
    pub fn factory(factory: impl FallbackFactory<T> + 'static) -> Self {
        Self::Factory(Arc::new(factory))
    }

    /// Strategy name used in logs.
    pub fn strategy(&self) -> &'static str {
        match self {
            Self::None => "plain",
            Self::Instance(_) => "fallback",
            Self::Factory(_) => "fallback-factory",
        }
    }

    /// Whether calls go through the command runtime.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Resolve the fallback for `cause`, or hand the cause back.
    pub(crate) fn resolve(&self, cause: RestClientError) -> Result<Arc<T>, RestClientError> {
        match self {
            Self::None => Err(cause),
            Self::Instance(fallback) => Ok(Arc::clone(fallback)),
            Self::Factory(factory) => Ok(factory.create(&cause)),
        }
    }
}

impl<T: ?Sized> Clone for Fallback<T> {
    fn clone(&self) -> Self {
        match self {
            Self::None => Self::None,
            Self::Instance(fallback) => Self::Instance(Arc::clone(fallback)),
            Self::Factory(factory) => Self::Factory(Arc::clone(factory)),
        }
    }
}

impl<T: ?Sized> Default for Fallback<T> {
    fn default() -> Self {
        Self::None
    }
}

impl<T: ?Sized> fmt::Debug for Fallback<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Fallback").field(&self.strategy()).finish()
    }
}
