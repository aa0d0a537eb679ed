//! Favorite toggle: precondition checks around the favorite-set arithmetic.
//!
//! Both operations resolve the current user first, then validate the listing
//! id, and only then persist the full resulting sequence. A failed
//! precondition returns [`FavoriteError`] wrapped in `anyhow` and writes
//! nothing.

use anyhow::{Context, Result};
use tracing::info;

use crate::core::error::FavoriteError;
use crate::core::favorites::{is_valid_listing_id, with_favorite, without_favorite};
use crate::core::types::User;
use crate::io::store::UserStore;

/// Resolve the current user from an optional session identity.
///
/// An absent id and an id that does not resolve are both unauthenticated.
pub async fn resolve_current_user<S: UserStore>(store: &S, user_id: Option<&str>) -> Result<User> {
    let Some(user_id) = user_id else {
        return Err(FavoriteError::Unauthenticated.into());
    };
    store
        .find_user(user_id)
        .await
        .context("resolve current user")?
        .ok_or_else(|| FavoriteError::Unauthenticated.into())
}

pub async fn add_favorite<S: UserStore>(
    store: &S,
    user_id: Option<&str>,
    listing_id: &str,
) -> Result<User> {
    let user = resolve_current_user(store, user_id).await?;
    check_listing_id(listing_id)?;
    let next = with_favorite(&user.favorite_ids, listing_id);
    let updated = store
        .update_favorites(&user.id, next)
        .await
        .context("persist favorites")?;
    info!(user_id = %user.id, listing_id, "favorite added");
    Ok(updated)
}

pub async fn remove_favorite<S: UserStore>(
    store: &S,
    user_id: Option<&str>,
    listing_id: &str,
) -> Result<User> {
    let user = resolve_current_user(store, user_id).await?;
    check_listing_id(listing_id)?;
    let next = without_favorite(&user.favorite_ids, listing_id);
    let updated = store
        .update_favorites(&user.id, next)
        .await
        .context("persist favorites")?;
    info!(user_id = %user.id, listing_id, "favorite removed");
    Ok(updated)
}

fn check_listing_id(listing_id: &str) -> Result<(), FavoriteError> {
    if is_valid_listing_id(listing_id) {
        Ok(())
    } else {
        Err(FavoriteError::InvalidListingId(listing_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestProject;

    fn favorite_error(err: &anyhow::Error) -> Option<&FavoriteError> {
        err.downcast_ref::<FavoriteError>()
    }

    #[tokio::test]
    async fn missing_identity_is_unauthenticated() {
        let project = TestProject::new();
        let store = project.store();
        let err = add_favorite(&store, None, "abc").await.unwrap_err();
        assert_eq!(favorite_error(&err), Some(&FavoriteError::Unauthenticated));

        let err = remove_favorite(&store, Some("nobody"), "abc")
            .await
            .unwrap_err();
        assert_eq!(favorite_error(&err), Some(&FavoriteError::Unauthenticated));
    }

    #[tokio::test]
    async fn malformed_listing_id_writes_nothing() {
        let project = TestProject::new();
        let store = project.store();
        let before = store.snapshot().expect("snapshot");

        let err = add_favorite(&store, Some(&project.user.id), "../etc")
            .await
            .unwrap_err();
        assert_eq!(
            favorite_error(&err),
            Some(&FavoriteError::InvalidListingId("../etc".to_string()))
        );
        assert_eq!(store.snapshot().expect("snapshot"), before);
    }

    #[tokio::test]
    async fn add_and_remove_persist_sequence() {
        let project = TestProject::new();
        let store = project.store();
        let user_id = project.user.id.as_str();

        add_favorite(&store, Some(user_id), "a").await.expect("add a");
        let user = add_favorite(&store, Some(user_id), "b").await.expect("add b");
        assert_eq!(user.favorite_ids, vec!["a", "b"]);

        let user = add_favorite(&store, Some(user_id), "a").await.expect("add a again");
        assert_eq!(user.favorite_ids, vec!["a", "b"]);

        let user = remove_favorite(&store, Some(user_id), "a").await.expect("remove");
        assert_eq!(user.favorite_ids, vec!["b"]);

        let reopened = project.store();
        let persisted = reopened.find_user(user_id).await.expect("find").expect("user");
        assert_eq!(persisted.favorite_ids, vec!["b"]);
    }
}
