//! Typed API response models.
//!
//! Only the fields the API documents as stable are typed here; timestamp
//! fields use the tolerant parsers in [`crate::util::date`] because the API
//! mixes several date formats across endpoints.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::util::date;

/// Names of the marketplaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketName {
    /// themeforest.net
    Themeforest,
    /// codecanyon.net
    Codecanyon,
    /// videohive.net
    Videohive,
    /// audiojungle.net
    Audiojungle,
    /// graphicriver.net
    Graphicriver,
    /// photodune.net
    Photodune,
    /// 3docean.net
    #[serde(rename = "3docean")]
    ThreeDOcean,
}

impl MarketName {
    /// The marketplace name as it appears in API paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketName::Themeforest => "themeforest",
            MarketName::Codecanyon => "codecanyon",
            MarketName::Videohive => "videohive",
            MarketName::Audiojungle => "audiojungle",
            MarketName::Graphicriver => "graphicriver",
            MarketName::Photodune => "photodune",
            MarketName::ThreeDOcean => "3docean",
        }
    }

    /// The marketplace's domain name, as used in search filters.
    pub fn domain(&self) -> String {
        format!("{}.net", self.as_str())
    }
}

impl fmt::Display for MarketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A collection of items.
#[derive(Debug, Clone, Deserialize)]
pub struct Collection {
    /// Collection id.
    pub id: u64,
    /// Collection name.
    pub name: String,
    /// Collection description.
    pub description: String,
    /// Whether the collection is private.
    pub private: bool,
    /// Number of items in the collection.
    pub item_count: u64,
    /// Special role of the collection, such as `"favorites"`.
    #[serde(default)]
    pub special_role: Option<String>,
    /// Collection image URL.
    #[serde(default)]
    pub image: Option<String>,
}

/// A short list of details about a marketplace item, as returned by the
/// legacy v1 listing endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemShort {
    /// Item id.
    pub id: u64,
    /// Item name.
    pub item: String,
    /// Item page URL.
    pub url: String,
    /// Author username.
    pub user: String,
    /// Thumbnail URL.
    pub thumbnail: String,
    /// Number of sales, as an unformatted integer in a string.
    pub sales: String,
    /// Rating, as a string.
    pub rating: String,
    /// Item cost in dollars, as a string.
    pub cost: String,
}

/// Full details about a marketplace item.
#[derive(Debug, Clone, Deserialize)]
pub struct Item {
    /// Item id.
    pub id: u64,
    /// Item name.
    pub name: String,
    /// Total number of sales.
    pub number_of_sales: u64,
    /// Author username.
    pub author_username: String,
    /// Author profile URL.
    pub author_url: String,
    /// Item page URL.
    pub url: String,
    /// When the item was last updated.
    #[serde(deserialize_with = "date::deserialize")]
    pub updated_at: DateTime<Utc>,
    /// When the item was published.
    #[serde(deserialize_with = "date::deserialize")]
    pub published_at: DateTime<Utc>,
    /// Marketplace domain the item is sold on.
    pub site: String,
    /// Classification path, such as `"site-templates/admin-templates"`.
    #[serde(default)]
    pub classification: Option<String>,
    /// Price in cents.
    pub price_cents: u64,
    /// Plain-text item summary.
    #[serde(default)]
    pub summary: Option<String>,
    /// Average rating.
    #[serde(default)]
    pub rating: f64,
    /// Number of ratings.
    #[serde(default)]
    pub rating_count: u64,
    /// Whether the item is trending.
    #[serde(default)]
    pub trending: bool,
    /// Item tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// The latest available versions of a WordPress theme or plugin item.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemVersion {
    /// Latest theme version, if the item is a theme.
    #[serde(default)]
    pub wordpress_theme_latest_version: Option<String>,
    /// Latest plugin version, if the item is a plugin.
    #[serde(default)]
    pub wordpress_plugin_latest_version: Option<String>,
}

/// A comment on an item.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemComment {
    /// Comment id, as a string.
    pub id: String,
    /// The id of the item the comment is on, as a string.
    #[serde(default)]
    pub item_id: Option<String>,
    /// The commenting username.
    #[serde(default)]
    pub username: Option<String>,
    /// The comment text.
    #[serde(default)]
    pub content: Option<String>,
    /// When the comment was posted.
    #[serde(default, with = "date::optional")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A comment search result page from the discovery endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchCommentsResponse {
    /// Time the search took, in milliseconds.
    #[serde(default)]
    pub took: u64,
    /// Matching comments.
    pub matches: Vec<ItemComment>,
    /// Total number of hits across all pages.
    #[serde(default)]
    pub total_hits: u64,
}

/// A search result page from the discovery endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchItemsResponse {
    /// Time the search took, in milliseconds.
    #[serde(default)]
    pub took: u64,
    /// Matching items.
    pub matches: Vec<Item>,
    /// Total number of hits across all pages.
    #[serde(default)]
    pub total_hits: u64,
}

/// A category on a marketplace.
#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    /// Category display name.
    pub name: String,
    /// Category path.
    pub path: String,
}

/// A licensing option and its price for an item.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemPrice {
    /// License name.
    pub license: String,
    /// Price in dollars, as a string.
    pub price: String,
}

/// The identity behind the current token.
#[derive(Debug, Clone, Deserialize)]
pub struct Identity {
    /// The account id.
    #[serde(rename = "userId")]
    pub user_id: u64,
    /// Permissions granted to the token.
    pub scopes: Vec<String>,
    /// Seconds until the token expires.
    pub ttl: u64,
}

/// A sale of one of the current user's items.
#[derive(Debug, Clone, Deserialize)]
pub struct Sale {
    /// Sale amount, as a string dollar value.
    pub amount: String,
    /// When the sale occurred.
    #[serde(deserialize_with = "date::deserialize")]
    pub sold_at: DateTime<Utc>,
    /// License the item was sold under.
    pub license: String,
    /// Support amount included in the sale, as a string dollar value.
    #[serde(default)]
    pub support_amount: Option<String>,
    /// When item support expires for this sale.
    #[serde(default, with = "date::optional")]
    pub supported_until: Option<DateTime<Utc>>,
    /// The purchase code, present on purchase lookups.
    #[serde(default)]
    pub code: Option<String>,
    /// The buyer's username. `None` for guest checkout.
    #[serde(default)]
    pub buyer: Option<String>,
    /// The item that was sold.
    #[serde(default)]
    pub item: Option<Item>,
}

/// Private details about the current user's account.
#[derive(Debug, Clone, Deserialize)]
pub struct PrivateAccountDetails {
    /// Avatar image URL.
    pub image: String,
    /// First name.
    pub firstname: String,
    /// Surname.
    pub surname: String,
    /// Earnings available for withdrawal, as a string dollar value.
    pub available_earnings: String,
    /// Total deposits, as a string dollar value.
    pub total_deposits: String,
    /// Account balance, as a string dollar value.
    pub balance: String,
    /// Country.
    pub country: String,
}

/// One month of earnings and sales.
#[derive(Debug, Clone, Deserialize)]
pub struct MonthlySales {
    /// The month, delivered in a ctime-style format.
    #[serde(deserialize_with = "date::deserialize")]
    pub month: DateTime<Utc>,
    /// Number of sales this month, as an unformatted integer in a string.
    pub sales: String,
    /// Total earnings this month, as a string double.
    pub earnings: String,
}

/// One entry from the user's statement page.
#[derive(Debug, Clone, Deserialize)]
pub struct StatementEntry {
    /// Unique transaction id.
    pub unique_id: String,
    /// When the transaction occurred.
    #[serde(deserialize_with = "date::deserialize")]
    pub date: DateTime<Utc>,
    /// Order id, if any.
    #[serde(default)]
    pub order_id: Option<u64>,
    /// Transaction type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Transaction detail text.
    pub detail: String,
    /// Related item id, if any.
    #[serde(default)]
    pub item_id: Option<u64>,
    /// Transaction amount, if any.
    #[serde(default)]
    pub price: Option<f64>,
}

/// A page of statement entries.
#[derive(Debug, Clone, Deserialize)]
pub struct Statement {
    /// Total number of entries.
    pub count: u64,
    /// The entries on this page.
    pub results: Vec<StatementEntry>,
}

/// Public details about a user.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountDetails {
    /// Username.
    pub username: String,
    /// Country.
    pub country: String,
    /// Number of sales, as a string.
    pub sales: String,
    /// Location, if shared.
    #[serde(default)]
    pub location: Option<String>,
    /// Number of followers, as a string.
    #[serde(default)]
    pub followers: Option<String>,
    /// Avatar image URL.
    #[serde(default)]
    pub image: Option<String>,
}

/// A badge on a user's profile.
#[derive(Debug, Clone, Deserialize)]
pub struct Badge {
    /// Badge identifier.
    pub name: String,
    /// Human-readable badge label.
    pub label: String,
    /// Badge image URL.
    pub image: String,
}

/// Number of items a user has for sale on one site.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemsBySite {
    /// The marketplace name.
    pub site: String,
    /// Number of items for sale there, as a string.
    pub items: String,
}

/// Number of files in one category of a marketplace.
#[derive(Debug, Clone, Deserialize)]
pub struct FilesPerCategory {
    /// Category name.
    pub category: String,
    /// Number of files in it, as a string.
    pub number_of_files: String,
    /// Category URL.
    pub url: String,
}

// Envelope shapes. Most v1 endpoints wrap their payload in a single-key
// object; these exist so endpoint methods can unwrap them in one line.

#[derive(Debug, Deserialize)]
pub(crate) struct CollectionsEnvelope {
    pub collections: Vec<Collection>,
}

/// A collection along with the items it contains.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionResponse {
    /// The collection's details.
    pub collection: Collection,
    /// The items in the collection.
    pub items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserEnvelope {
    pub user: AccountDetails,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BadgesEnvelope {
    #[serde(rename = "user-badges")]
    pub badges: Vec<Badge>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ItemsBySiteEnvelope {
    #[serde(rename = "user-items-by-site")]
    pub sites: Vec<ItemsBySite>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NewItemsEnvelope {
    #[serde(rename = "new-files-from-user")]
    pub items: Vec<ItemShort>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PopularItemsEnvelope {
    #[serde(rename = "popular")]
    pub popular: PopularItems,
}

/// The current popular items on a marketplace.
#[derive(Debug, Clone, Deserialize)]
pub struct PopularItems {
    /// Most popular items this week.
    #[serde(default)]
    pub items_last_week: Vec<ItemShort>,
    /// Most popular items in the last three months.
    #[serde(default)]
    pub items_last_three_months: Vec<ItemShort>,
    /// Highest-rated authors this week.
    #[serde(default)]
    pub authors_last_month: Vec<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoriesEnvelope {
    pub categories: Vec<Category>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ItemPricesEnvelope {
    #[serde(rename = "item-prices")]
    pub prices: Vec<ItemPrice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NewFilesEnvelope {
    #[serde(rename = "new-files")]
    pub files: Vec<ItemShort>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RandomNewFilesEnvelope {
    #[serde(rename = "random-new-files")]
    pub files: Vec<ItemShort>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeaturedEnvelope {
    pub featured: Featured,
}

/// The featured item, file, and author on a marketplace.
#[derive(Debug, Clone, Deserialize)]
pub struct Featured {
    /// The featured file details, keyed by field name.
    #[serde(default)]
    pub featured_file: Option<HashMap<String, serde_json::Value>>,
    /// The featured author details, keyed by field name.
    #[serde(default)]
    pub featured_author: Option<HashMap<String, serde_json::Value>>,
    /// The free file of the month, keyed by field name.
    #[serde(default)]
    pub free_file: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccountEnvelope {
    pub account: PrivateAccountDetails,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UsernameEnvelope {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmailEnvelope {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MonthlySalesEnvelope {
    #[serde(rename = "earnings-and-sales-by-month")]
    pub months: Vec<MonthlySales>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DownloadLinkEnvelope {
    pub download_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TotalUsersEnvelope {
    #[serde(rename = "total-users")]
    pub inner: TotalUsers,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TotalUsers {
    pub total_users: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TotalItemsEnvelope {
    #[serde(rename = "total-items")]
    pub inner: TotalItems,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TotalItems {
    pub total_items: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FilesPerCategoryEnvelope {
    #[serde(rename = "number-of-files")]
    pub categories: Vec<FilesPerCategory>,
}

/// A page of the current user's sales.
#[derive(Debug, Clone, Deserialize)]
pub struct Purchases {
    /// Total number of purchases.
    pub count: u64,
    /// The purchases on this page.
    pub results: Vec<Sale>,
}

/// A reference to an account, as returned in purchase listings.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountRef {
    /// The account id.
    pub id: u64,
    /// The account's username.
    pub username: String,
}

/// Purchases the current user has made of the app creator's listed items.
#[derive(Debug, Clone, Deserialize)]
pub struct AppCreatorPurchases {
    /// The buyer behind the current session.
    pub buyer: AccountRef,
    /// The app creator whose items were purchased.
    pub author: AccountRef,
    /// The purchases, each carrying its purchase code.
    pub purchases: Vec<Sale>,
}
