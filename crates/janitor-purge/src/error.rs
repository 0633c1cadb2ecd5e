use thiserror::Error;

use janitor_store::StoreError;
use janitor_types::models::CommunityId;
use janitor_types::platform::PlatformError;

#[derive(Debug, Error)]
pub enum PurgeError {
    /// The community has never been configured.
    #[error("community {0} has no policy")]
    PolicyAbsent(CommunityId),
    /// The wizard was abandoned before the age limit was set.
    #[error("community {0} has no message age limit configured")]
    PolicyIncomplete(CommunityId),
    #[error("community {0} has no log channel configured")]
    NoLogChannel(CommunityId),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Platform(#[from] PlatformError),
}
