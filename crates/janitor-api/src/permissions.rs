use tracing::debug;

use janitor_store::PolicyStore;
use janitor_types::models::{CommunityId, UserId};
use janitor_types::platform::ChatPlatform;

use crate::error::ApiError;

/// Gate for every operator command.
///
/// Until a moderator role has been chosen anyone may run commands, which is
/// what lets the first operator complete the wizard. After that the caller
/// must hold the configured role.
pub async fn authorize(
    store: &PolicyStore,
    platform: &dyn ChatPlatform,
    community: CommunityId,
    operator: UserId,
) -> Result<(), ApiError> {
    let Some(role) = store.get(community)?.and_then(|r| r.moderator_role_id) else {
        debug!(%community, %operator, "No moderator role configured, allowing");
        return Ok(());
    };

    let roles = platform.member_roles(community, operator).await?;
    if roles.contains(&role) {
        Ok(())
    } else {
        debug!(%community, %operator, %role, "Operator lacks moderator role");
        Err(ApiError::PermissionDenied)
    }
}
