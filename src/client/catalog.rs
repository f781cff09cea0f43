//! Catalog endpoints: public details about items and marketplaces.

use crate::client::{optional, Client};
use crate::error::Error;
use crate::types::{
    CategoriesEnvelope, Category, CollectionResponse, Featured, FeaturedEnvelope, Item, ItemPrice,
    ItemPricesEnvelope, ItemShort, ItemVersion, MarketName, NewFilesEnvelope, PopularItems,
    PopularItemsEnvelope, RandomNewFilesEnvelope, SearchCommentsResponse, SearchItemsResponse,
};
use crate::util::url::{self, Param};

/// Options for searching items on the marketplaces. All fields are
/// optional; unset fields are omitted from the query.
#[derive(Debug, Clone, Default)]
pub struct ItemSearchOptions {
    /// The string to search for.
    pub term: Option<String>,
    /// The site to match, as a domain such as `"themeforest.net"`.
    pub site: Option<String>,
    /// Comma-separated list of tags to match.
    pub tags: Option<String>,
    /// Category code to search in.
    pub category: Option<String>,
    /// Page number.
    pub page: Option<u32>,
    /// Number of results per page.
    pub page_size: Option<u32>,
    /// Field to sort by.
    pub sort_by: Option<String>,
    /// Sort direction, `"asc"` or `"desc"`.
    pub sort_direction: Option<String>,
    /// Minimum rating to include.
    pub rating_min: Option<f64>,
    /// Minimum price to include, in whole dollars.
    pub price_min: Option<u32>,
    /// Maximum price to include, in whole dollars.
    pub price_max: Option<u32>,
}

impl ItemSearchOptions {
    fn params(&self) -> Vec<(&'static str, Param)> {
        vec![
            ("term", self.term.clone()),
            ("site", self.site.clone()),
            ("tags", self.tags.clone()),
            ("category", self.category.clone()),
            ("page", self.page.map(|v| v.to_string())),
            ("page_size", self.page_size.map(|v| v.to_string())),
            ("sort_by", self.sort_by.clone()),
            ("sort_direction", self.sort_direction.clone()),
            ("rating_min", self.rating_min.map(|v| v.to_string())),
            ("price_min", self.price_min.map(|v| v.to_string())),
            ("price_max", self.price_max.map(|v| v.to_string())),
        ]
    }
}

/// Accessor for the catalog endpoint group; obtained from
/// [`Client::catalog`].
pub struct CatalogEndpoints<'a> {
    client: &'a Client,
}

impl<'a> CatalogEndpoints<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        CatalogEndpoints { client }
    }

    /// Returns details of, and items contained within, a public collection.
    /// Returns `None` if the collection is not found.
    pub async fn collection(
        &self,
        id: u64,
        page: Option<u32>,
    ) -> Result<Option<CollectionResponse>, Error> {
        optional(
            self.client
                .get(&url::build(
                    "/v3/market/catalog/collection",
                    &[
                        ("id", Some(id.to_string())),
                        ("page", page.map(|p| p.to_string())),
                    ],
                ))
                .await,
        )
    }

    /// Returns all details of a particular item. Returns `None` if the item
    /// is not found.
    pub async fn item(&self, id: u64) -> Result<Option<Item>, Error> {
        optional(
            self.client
                .get(&url::build(
                    "/v3/market/catalog/item",
                    &[("id", Some(id.to_string()))],
                ))
                .await,
        )
    }

    /// Returns the latest available version of a WordPress theme or plugin
    /// item. Returns `None` if the item is not found.
    pub async fn item_version(&self, id: u64) -> Result<Option<ItemVersion>, Error> {
        optional(
            self.client
                .get(&url::build(
                    "/v3/market/catalog/item-version",
                    &[("id", Some(id.to_string()))],
                ))
                .await,
        )
    }

    /// Searches for items across the marketplaces.
    pub async fn search_items(
        &self,
        options: &ItemSearchOptions,
    ) -> Result<SearchItemsResponse, Error> {
        self.client
            .get(&url::build(
                "/v1/discovery/search/search/item",
                &options.params(),
            ))
            .await
    }

    /// Searches comments on an item.
    pub async fn search_comments(
        &self,
        item_id: u64,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<SearchCommentsResponse, Error> {
        self.client
            .get(&url::build(
                "/v1/discovery/search/search/comment",
                &[
                    ("item_id", Some(item_id.to_string())),
                    ("page", page.map(|v| v.to_string())),
                    ("page_size", page_size.map(|v| v.to_string())),
                ],
            ))
            .await
    }

    /// Returns the popular files for a particular site.
    pub async fn popular_items(&self, site: MarketName) -> Result<PopularItems, Error> {
        let envelope: PopularItemsEnvelope = self
            .client
            .get(&format!("/v1/market/popular:{site}.json"))
            .await?;
        Ok(envelope.popular)
    }

    /// Lists the categories of a particular site.
    pub async fn categories(&self, site: MarketName) -> Result<Vec<Category>, Error> {
        let envelope: CategoriesEnvelope = self
            .client
            .get(&format!("/v1/market/categories:{site}.json"))
            .await?;
        Ok(envelope.categories)
    }

    /// Returns the prices for a particular item.
    pub async fn item_prices(&self, id: u64) -> Result<Vec<ItemPrice>, Error> {
        let envelope: ItemPricesEnvelope = self
            .client
            .get(&format!("/v1/market/item-prices:{id}.json"))
            .await?;
        Ok(envelope.prices)
    }

    /// Returns the newest files in a category of a particular site.
    pub async fn new_files(
        &self,
        site: MarketName,
        category: &str,
    ) -> Result<Vec<ItemShort>, Error> {
        let envelope: NewFilesEnvelope = self
            .client
            .get(&format!(
                "/v1/market/new-files:{site},{}.json",
                url::escape(category)
            ))
            .await?;
        Ok(envelope.files)
    }

    /// Returns the featured file, author, and free file of the month for a
    /// particular site.
    pub async fn featured(&self, site: MarketName) -> Result<Featured, Error> {
        let envelope: FeaturedEnvelope = self
            .client
            .get(&format!("/v1/market/features:{site}.json"))
            .await?;
        Ok(envelope.featured)
    }

    /// Returns a random selection of new files from a particular site.
    pub async fn random_new_files(&self, site: MarketName) -> Result<Vec<ItemShort>, Error> {
        let envelope: RandomNewFilesEnvelope = self
            .client
            .get(&format!("/v1/market/random-new-files:{site}.json"))
            .await?;
        Ok(envelope.files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_options_params_skip_unset() {
        let options = ItemSearchOptions {
            term: Some("admin template".to_string()),
            page: Some(2),
            ..ItemSearchOptions::default()
        };

        let built = url::build("/v1/discovery/search/search/item", &options.params());
        assert_eq!(
            built,
            "/v1/discovery/search/search/item?term=admin+template&page=2"
        );
    }
}
