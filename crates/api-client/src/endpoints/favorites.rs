//! Favorite-membership endpoints
//!
//! Favorites are per-user rows in a membership table. Reads degrade to an
//! empty set on failure so a favorites outage never blanks the listing
//! page; writes require a signed-in session.

use crate::client::FindixiClient;
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

/// Favorite-membership API
#[derive(Clone)]
pub struct FavoritesApi {
    client: FindixiClient,
}

impl FavoritesApi {
    /// Create a new favorites API interface
    pub(crate) fn new(client: FindixiClient) -> Self {
        Self { client }
    }

    /// Listing ids the user has favorited.
    ///
    /// Returns an empty set on any failure; favorite markers are decoration,
    /// not data the page depends on.
    pub async fn ids_for_user(&self, user_id: &str) -> HashSet<i64> {
        #[derive(Deserialize)]
        struct FavoriteRow {
            listing_id: Option<i64>,
        }

        let path = format!(
            "favorites?select=listing_id&user_id=eq.{}",
            user_id
        );

        match self.client.get::<Vec<FavoriteRow>>(&path).await {
            Ok(rows) => rows.into_iter().filter_map(|r| r.listing_id).collect(),
            Err(e) => {
                warn!(error = %e, "Could not load user favorites");
                HashSet::new()
            }
        }
    }

    /// Add a listing to the user's favorites
    pub async fn add(&self, user_id: &str, listing_id: i64) -> ApiResult<()> {
        self.require_session("save favorites")?;

        #[derive(Serialize)]
        struct NewFavorite<'a> {
            user_id: &'a str,
            listing_id: i64,
        }

        let _: serde_json::Value = self
            .client
            .post(
                "favorites",
                &NewFavorite {
                    user_id,
                    listing_id,
                },
            )
            .await?;
        Ok(())
    }

    /// Remove a listing from the user's favorites
    pub async fn remove(&self, user_id: &str, listing_id: i64) -> ApiResult<()> {
        self.require_session("remove favorites")?;

        let path = format!(
            "favorites?user_id=eq.{}&listing_id=eq.{}",
            user_id, listing_id
        );
        self.client.delete(&path).await
    }

    fn require_session(&self, action: &str) -> ApiResult<()> {
        if self.client.config().access_token.is_none() {
            return Err(ApiError::AuthRequired(action.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    #[test]
    fn test_writes_require_session() {
        let mut config = ClientConfig::development();
        config.access_token = None;
        let client = FindixiClient::with_config(config).unwrap();
        let api = client.favorites();

        let err = api.require_session("save favorites").unwrap_err();
        assert!(matches!(err, ApiError::AuthRequired(_)));
    }

    #[test]
    fn test_session_present_allows_writes() {
        let config = ClientConfig::development().with_access_token("jwt-token");
        let client = FindixiClient::with_config(config).unwrap();
        let api = client.favorites();

        assert!(api.require_session("save favorites").is_ok());
    }
}
