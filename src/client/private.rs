//! Private endpoints: details about the current user, their sales, and
//! their purchases.

use crate::client::{optional, Client};
use crate::error::Error;
use crate::types::{
    AccountEnvelope, AppCreatorPurchases, DownloadLinkEnvelope, EmailEnvelope, MonthlySales,
    MonthlySalesEnvelope, PrivateAccountDetails, Purchases, Sale, Statement, UsernameEnvelope,
};
use crate::util::url::{self, Param};

/// Selects which purchased item to produce a download link for. Exactly one
/// of `item_id` and `purchase_code` should be set.
#[derive(Debug, Clone, Default)]
pub struct DownloadLinkOptions {
    /// The id of the purchased item.
    pub item_id: Option<u64>,
    /// The purchase code.
    pub purchase_code: Option<String>,
    /// Whether to return a shortened download URL.
    pub shorten_url: Option<bool>,
}

/// Accessor for the private endpoint group; obtained from
/// [`Client::private`].
pub struct PrivateEndpoints<'a> {
    client: &'a Client,
}

impl<'a> PrivateEndpoints<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        PrivateEndpoints { client }
    }

    /// Lists all unrefunded sales of the current user's items. Returns 100
    /// sales per page.
    pub async fn sales(&self, page: Option<u32>) -> Result<Vec<Sale>, Error> {
        self.client
            .get(&url::build(
                "/v3/market/author/sales",
                &[("page", page.map(|p| p.to_string()))],
            ))
            .await
    }

    /// Returns the details of a sale identified by its purchase code.
    /// Returns `None` if the code does not match a sale.
    pub async fn sale(&self, code: &str) -> Result<Option<Sale>, Error> {
        optional(
            self.client
                .get(&url::build(
                    "/v3/market/author/sale",
                    &[("code", Some(code.to_string()))],
                ))
                .await,
        )
    }

    /// Lists the current user's purchases.
    pub async fn purchases(&self, page: Option<u32>) -> Result<Purchases, Error> {
        self.client
            .get(&url::build(
                "/v3/market/buyer/list-purchases",
                &[("page", page.map(|p| p.to_string()))],
            ))
            .await
    }

    /// Lists all purchases the current user has made of the app creator's
    /// listed items. Only works with OAuth tokens.
    pub async fn purchases_from_app_creator(
        &self,
        page: Option<u32>,
    ) -> Result<AppCreatorPurchases, Error> {
        self.client
            .get(&url::build(
                "/v3/market/buyer/purchases",
                &[("page", page.map(|p| p.to_string()))],
            ))
            .await
    }

    /// Returns the details of a purchase identified by its purchase code.
    /// Returns `None` if the code does not match a purchase.
    pub async fn purchase(&self, code: &str) -> Result<Option<Sale>, Error> {
        optional(
            self.client
                .get(&url::build(
                    "/v3/market/buyer/purchase",
                    &[("code", Some(code.to_string()))],
                ))
                .await,
        )
    }

    /// Returns the first name, surname, earnings, balance, and country of
    /// the current user.
    pub async fn account_details(&self) -> Result<PrivateAccountDetails, Error> {
        let envelope: AccountEnvelope = self
            .client
            .get("/v1/market/private/user/account.json")
            .await?;
        Ok(envelope.account)
    }

    /// Returns the current user's username.
    pub async fn username(&self) -> Result<String, Error> {
        let envelope: UsernameEnvelope = self
            .client
            .get("/v1/market/private/user/username.json")
            .await?;
        Ok(envelope.username)
    }

    /// Returns the current user's email address.
    pub async fn email(&self) -> Result<String, Error> {
        let envelope: EmailEnvelope = self
            .client
            .get("/v1/market/private/user/email.json")
            .await?;
        Ok(envelope.email)
    }

    /// Returns the monthly sales data, as displayed on the user's earnings
    /// page.
    pub async fn monthly_sales(&self) -> Result<Vec<MonthlySales>, Error> {
        let envelope: MonthlySalesEnvelope = self
            .client
            .get("/v1/market/private/user/earnings-and-sales-by-month.json")
            .await?;
        Ok(envelope.months)
    }

    /// Lists transactions from the current user's statement page.
    pub async fn statement(
        &self,
        page: Option<u32>,
        kind: Option<&str>,
    ) -> Result<Statement, Error> {
        let params: [(&str, Param); 2] = [
            ("page", page.map(|p| p.to_string())),
            ("type", kind.map(|k| k.to_string())),
        ];
        self.client
            .get(&url::build("/v3/market/user/statement", &params))
            .await
    }

    /// Produces a download link for a purchased item. Each invocation
    /// counts against the item's daily download limit.
    pub async fn download_link(&self, options: &DownloadLinkOptions) -> Result<String, Error> {
        let envelope: DownloadLinkEnvelope = self
            .client
            .get(&url::build(
                "/v3/market/buyer/download",
                &[
                    ("item_id", options.item_id.map(|id| id.to_string())),
                    ("purchase_code", options.purchase_code.clone()),
                    ("shorten_url", url::bool_param(options.shorten_url)),
                ],
            ))
            .await?;
        Ok(envelope.download_url)
    }
}
