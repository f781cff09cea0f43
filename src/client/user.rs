//! User endpoints: public and private details about accounts.

use crate::client::{optional, Client};
use crate::error::Error;
use crate::types::{
    AccountDetails, Badge, BadgesEnvelope, Collection, CollectionResponse, CollectionsEnvelope,
    ItemShort, ItemsBySite, ItemsBySiteEnvelope, MarketName, NewItemsEnvelope, UserEnvelope,
};
use crate::util::url;

/// Accessor for the user endpoint group; obtained from [`Client::user`].
pub struct UserEndpoints<'a> {
    client: &'a Client,
}

impl<'a> UserEndpoints<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        UserEndpoints { client }
    }

    /// Lists all of the current user's private and public collections.
    pub async fn collections(&self) -> Result<Vec<Collection>, Error> {
        let envelope: CollectionsEnvelope =
            self.client.get("/v3/market/user/collections").await?;
        Ok(envelope.collections)
    }

    /// Returns details and items for one of the current user's collections
    /// (public or private). Returns `None` if the collection is not found.
    pub async fn private_collection(
        &self,
        id: u64,
    ) -> Result<Option<CollectionResponse>, Error> {
        optional(
            self.client
                .get(&url::build(
                    "/v3/market/user/collection",
                    &[("id", Some(id.to_string()))],
                ))
                .await,
        )
    }

    /// Shows username, country, number of sales, number of followers,
    /// location and image for a user.
    pub async fn account_details(&self, username: &str) -> Result<AccountDetails, Error> {
        let envelope: UserEnvelope = self
            .client
            .get(&format!("/v1/market/user:{}.json", url::escape(username)))
            .await?;
        Ok(envelope.user)
    }

    /// Shows a list of badges for the given user.
    pub async fn badges(&self, username: &str) -> Result<Vec<Badge>, Error> {
        let envelope: BadgesEnvelope = self
            .client
            .get(&format!(
                "/v1/market/user-badges:{}.json",
                url::escape(username)
            ))
            .await?;
        Ok(envelope.badges)
    }

    /// Shows the number of items an author has for sale on each site.
    pub async fn items_by_site(&self, username: &str) -> Result<Vec<ItemsBySite>, Error> {
        let envelope: ItemsBySiteEnvelope = self
            .client
            .get(&format!(
                "/v1/market/user-items-by-site:{}.json",
                url::escape(username)
            ))
            .await?;
        Ok(envelope.sites)
    }

    /// Shows up to 1000 newest files uploaded by a user to a particular
    /// site.
    pub async fn new_items(
        &self,
        username: &str,
        site: MarketName,
    ) -> Result<Vec<ItemShort>, Error> {
        let envelope: NewItemsEnvelope = self
            .client
            .get(&format!(
                "/v1/market/new-files-from-user:{},{site}.json",
                url::escape(username)
            ))
            .await?;
        Ok(envelope.items)
    }
}
