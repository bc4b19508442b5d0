use async_trait::async_trait;

use crate::{
    permission::{error::LookupError, types::LrnOwnershipKey},
    types::CustomerId,
};

/// One checked-out directory (database) connection; dropping it releases it.
#[async_trait]
pub trait DirectoryConnection: Send {
    async fn permission_codes(
        &mut self,
        user_id: &str,
        customer_id: &str,
    ) -> Result<Vec<String>, LookupError>;

    async fn lrn_owner(
        &mut self,
        key: &LrnOwnershipKey,
    ) -> Result<Option<CustomerId>, LookupError>;
}

#[async_trait]
pub trait DirectoryPort: Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn DirectoryConnection>, LookupError>;
}
