use std::sync::Arc;

use crate::{
    permission::{
        error::LookupError,
        ports::DirectoryPort,
        types::{LrnOwnershipKey, PermissionPolicy, PermissionSet},
    },
    types::{Caller, CustomerId, ServiceType},
};

pub struct PermissionGate {
    directory: Arc<dyn DirectoryPort>,
    policy: PermissionPolicy,
}

impl PermissionGate {
    pub fn new(directory: Arc<dyn DirectoryPort>, policy: PermissionPolicy) -> Self {
        Self { directory, policy }
    }

    pub fn policy(&self) -> &PermissionPolicy {
        &self.policy
    }

    /// Resolves the caller's codes; any lookup failure fails closed to an empty set.
    pub async fn permissions_for(&self, caller: &Caller) -> PermissionSet {
        match self.lookup_codes(caller).await {
            Ok(codes) => {
                let permissions = PermissionSet::from_codes(codes);
                tracing::debug!(
                    target: "permission",
                    user_id = %caller.user_id,
                    customer_id = %caller.customer_id,
                    codes = permissions.len(),
                    "permissions_resolved"
                );
                permissions
            }
            Err(err) => {
                tracing::warn!(
                    target: "permission",
                    user_id = %caller.user_id,
                    customer_id = %caller.customer_id,
                    error = %err,
                    "permission_lookup_failed"
                );
                PermissionSet::default()
            }
        }
    }

    async fn lookup_codes(&self, caller: &Caller) -> Result<Vec<String>, LookupError> {
        let mut connection = self.directory.acquire().await?;
        connection
            .permission_codes(&caller.user_id, &caller.customer_id)
            .await
    }

    /// Customer owning the LRN; the connection is released before returning.
    pub async fn lrn_owner(
        &self,
        key: &LrnOwnershipKey,
    ) -> Result<Option<CustomerId>, LookupError> {
        let mut connection = self.directory.acquire().await?;
        connection.lrn_owner(key).await
    }

    /// Whether rule evaluation may run at all for `service_type`.
    pub fn may_evaluate(&self, service_type: ServiceType, permissions: &PermissionSet) -> bool {
        if service_type.uses_status_matrix() {
            return false;
        }
        if self.has_universal_access(permissions) {
            return true;
        }
        match service_type {
            ServiceType::Audit => permissions.contains(&self.policy.audit_code),
            _ => {
                permissions.contains(&self.policy.rule_primary_code)
                    && permissions.contains(&self.policy.rule_secondary_code)
            }
        }
    }

    pub fn may_use_status_matrix(&self, permissions: &PermissionSet) -> bool {
        permissions.contains(&self.policy.port_code) || self.has_universal_access(permissions)
    }

    fn has_universal_access(&self, permissions: &PermissionSet) -> bool {
        permissions.contains(&self.policy.universal_code)
            || permissions.contains(&self.policy.secondary_universal_code)
    }
}
