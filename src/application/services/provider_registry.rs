use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::{AllowList, ProviderCategory, ProviderDescriptor};

/// Catalog of configured providers; reads take an `Arc` snapshot, mutations swap it.
pub struct ProviderRegistry {
    table: RwLock<Arc<ProviderTable>>,
}

#[derive(Debug, Default)]
pub struct ProviderTable {
    providers: HashMap<String, ProviderDescriptor>,
}

impl ProviderTable {
    pub fn get(&self, name: &str) -> Option<&ProviderDescriptor> {
        self.providers.get(name)
    }

    pub fn all(&self) -> Vec<&ProviderDescriptor> {
        let mut descriptors: Vec<&ProviderDescriptor> = self.providers.values().collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    pub fn authorize(
        &self,
        name: &str,
        user: &str,
        category: ProviderCategory,
    ) -> Result<&ProviderDescriptor, AccessError> {
        let descriptor = self
            .providers
            .get(name)
            .ok_or_else(|| AccessError::UnknownProvider(name.to_string()))?;

        if descriptor.category() != category {
            return Err(AccessError::WrongCategory {
                provider: name.to_string(),
                expected: category,
            });
        }
        if !descriptor.enabled {
            return Err(AccessError::ProviderDisabled(name.to_string()));
        }
        if !descriptor.access.permits(user) {
            return Err(AccessError::PermissionDenied(name.to_string()));
        }

        Ok(descriptor)
    }
}

impl ProviderRegistry {
    pub fn new(descriptors: Vec<ProviderDescriptor>) -> Self {
        let providers = descriptors
            .into_iter()
            .map(|d| (d.name.clone(), d))
            .collect();
        Self {
            table: RwLock::new(Arc::new(ProviderTable { providers })),
        }
    }

    pub async fn snapshot(&self) -> Arc<ProviderTable> {
        self.table.read().await.clone()
    }

    pub async fn grant(&self, provider: &str, user: &str) -> Result<(), RegistryError> {
        self.mutate(provider, |descriptor| match &mut descriptor.access {
            AllowList::All => Ok(()),
            AllowList::Members(members) => {
                members.insert(user.to_string());
                Ok(())
            }
        })
        .await
    }

    pub async fn revoke(&self, provider: &str, user: &str) -> Result<(), RegistryError> {
        self.mutate(provider, |descriptor| match &mut descriptor.access {
            AllowList::All => Err(RegistryError::OpenAccess(descriptor.name.clone())),
            AllowList::Members(members) => {
                members.remove(user);
                Ok(())
            }
        })
        .await
    }

    pub async fn set_enabled(&self, provider: &str, enabled: bool) -> Result<(), RegistryError> {
        self.mutate(provider, |descriptor| {
            descriptor.enabled = enabled;
            Ok(())
        })
        .await
    }

    async fn mutate<F>(&self, provider: &str, apply: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&mut ProviderDescriptor) -> Result<(), RegistryError>,
    {
        let mut guard = self.table.write().await;
        let mut next = ProviderTable {
            providers: guard.providers.clone(),
        };
        let descriptor = next
            .providers
            .get_mut(provider)
            .ok_or_else(|| RegistryError::UnknownProvider(provider.to_string()))?;
        apply(descriptor)?;
        *guard = Arc::new(next);
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("provider {0} is disabled")]
    ProviderDisabled(String),
    #[error("provider {provider} is not a {expected} provider")]
    WrongCategory {
        provider: String,
        expected: ProviderCategory,
    },
    #[error("user is not allowed to use provider {0}")]
    PermissionDenied(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("provider {0} allows all users; revoke is not applicable")]
    OpenAccess(String),
}
