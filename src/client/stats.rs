//! Statistics endpoints: marketplace-wide totals.

use crate::client::Client;
use crate::error::Error;
use crate::types::{
    FilesPerCategory, FilesPerCategoryEnvelope, MarketName, TotalItemsEnvelope, TotalUsersEnvelope,
};

/// Accessor for the statistics endpoint group; obtained from
/// [`Client::stats`].
pub struct StatsEndpoints<'a> {
    client: &'a Client,
}

impl<'a> StatsEndpoints<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        StatsEndpoints { client }
    }

    /// Shows the total number of subscribed users to Envato Market.
    pub async fn total_users(&self) -> Result<u64, Error> {
        let envelope: TotalUsersEnvelope =
            self.client.get("/v1/market/total-users.json").await?;
        parse_total(&envelope.inner.total_users)
    }

    /// Shows the total number of items available on Envato Market.
    pub async fn total_items(&self) -> Result<u64, Error> {
        let envelope: TotalItemsEnvelope =
            self.client.get("/v1/market/total-items.json").await?;
        parse_total(&envelope.inner.total_items)
    }

    /// Shows the number of files in each category of a particular site.
    pub async fn files_per_category(
        &self,
        site: MarketName,
    ) -> Result<Vec<FilesPerCategory>, Error> {
        let envelope: FilesPerCategoryEnvelope = self
            .client
            .get(&format!("/v1/market/number-of-files:{site}.json"))
            .await?;
        Ok(envelope.categories)
    }
}

/// The totals come back as unformatted integers in strings.
fn parse_total(raw: &str) -> Result<u64, Error> {
    raw.parse()
        .map_err(|_| Error::UnexpectedResponse(format!("non-numeric total: {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_total() {
        assert_eq!(parse_total("8104480").unwrap(), 8104480);
        assert!(parse_total("a lot").is_err());
    }
}
