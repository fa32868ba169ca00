//! Service collection for non-visual background controls

use std::sync::Arc;

use crate::domain::platform::Platform;

/// Host context handed to a service when it is mounted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceContext {
    pub platform: Platform,
}

/// A non-visual control living in a [`ServiceCollection`]
pub trait Service: Send + Sync {
    /// Service name, used in logs and listings
    fn name(&self) -> &str;

    /// Called when the service joins a collection
    fn did_mount(&self, context: &ServiceContext);

    /// Called when the service leaves its collection
    fn will_unmount(&self);
}

/// The embedding application's registry of non-visual services.
pub struct ServiceCollection {
    context: ServiceContext,
    services: Vec<Arc<dyn Service>>,
}

impl ServiceCollection {
    /// Create an empty collection for `platform`
    pub fn new(platform: Platform) -> Self {
        Self {
            context: ServiceContext { platform },
            services: Vec::new(),
        }
    }

    pub fn platform(&self) -> Platform {
        self.context.platform
    }

    /// Register and mount a service.
    ///
    /// Registering the same instance twice is a no-op and returns `false`.
    pub fn register<S: Service + 'static>(&mut self, service: Arc<S>) -> bool {
        let service: Arc<dyn Service> = service;
        if self.contains(&service) {
            return false;
        }
        service.did_mount(&self.context);
        tracing::debug!(service = service.name(), platform = %self.context.platform, "service mounted");
        self.services.push(service);
        true
    }

    /// Unmount and remove a service. Returns `false` if it was not registered.
    pub fn unregister<S: Service + 'static>(&mut self, service: &Arc<S>) -> bool {
        let service: Arc<dyn Service> = Arc::clone(service) as Arc<dyn Service>;
        let Some(index) = self
            .services
            .iter()
            .position(|s| Arc::ptr_eq(s, &service))
        else {
            return false;
        };
        let removed = self.services.remove(index);
        removed.will_unmount();
        tracing::debug!(service = removed.name(), "service unmounted");
        true
    }

    fn contains(&self, service: &Arc<dyn Service>) -> bool {
        self.services.iter().any(|s| Arc::ptr_eq(s, service))
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Names of the registered services, in registration order
    pub fn names(&self) -> Vec<String> {
        self.services.iter().map(|s| s.name().to_string()).collect()
    }
}

impl Drop for ServiceCollection {
    fn drop(&mut self) {
        for service in self.services.drain(..) {
            service.will_unmount();
        }
    }
}
