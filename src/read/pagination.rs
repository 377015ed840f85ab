use crate::error::Result;
use crate::{common, read, store};

use futures::{Stream, TryStreamExt, stream};

/// One page together with how it was read.
#[derive(Clone, Debug, PartialEq)]
pub struct PageOutput {
    /// Items and continuation token.
    pub page: read::common::Page,
    /// The access path chosen for the request.
    pub access_path: read::access_path::AccessPath,
    /// Filter terms compared as strings instead of their declared type.
    pub fallbacks: Vec<common::attribute::CoercionFallback>,
}

/// Build the request for the current filters and fetch one page.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        name = "dynamodb_browser.fetch_page",
        skip_all,
        fields(table_name = context.table_name),
        err
    )
)]
pub async fn fetch_page(
    store: &dyn store::Store,
    context: &read::access_path::ReadContext<'_>,
    exclusive_start_key: Option<common::Item>,
) -> Result<PageOutput> {
    let request = read::access_path::build_request(context, exclusive_start_key)?;
    let page = match request.access_path {
        read::access_path::AccessPath::Scan => store.scan(request.input).await?,
        _ => store.query(request.input).await?,
    };
    #[cfg(feature = "tracing")]
    tracing::debug!(
        items = page.items.len(),
        last = page.is_last(),
        access_path = %request.access_path,
        "fetched page"
    );
    let output = PageOutput {
        page,
        access_path: request.access_path,
        fallbacks: request.fallbacks,
    };
    Ok(output)
}

/// Every page from the first one, following the continuation token.
///
/// The stream ends after the page without a continuation token, or after the first error.
pub fn pages<'a>(
    store: &'a dyn store::Store,
    context: read::access_path::ReadContext<'a>,
) -> impl Stream<Item = Result<PageOutput>> + Send + 'a {
    stream::try_unfold(Some(None), move |state: Option<Option<common::Item>>| async move {
        let Some(exclusive_start_key) = state else {
            return Ok(None);
        };
        let output = fetch_page(store, &context, exclusive_start_key).await?;
        let next = output.page.last_evaluated_key.clone().map(Some);
        Ok(Some((output, next)))
    })
}

/// Read every item, page after page, until the continuation token is absent.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_browser::{common, filter, read, store::Store};
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let description = Store::describe_table(client, "users").await?;
/// let filters = filter::AttributeFilterMap::from([("age".to_string(), Some("!=30".to_string()))]);
/// let attribute_types = common::attribute::AttributeTypeMap::new();
/// let context = read::access_path::ReadContext {
///     table_name: "users",
///     description: Some(&description),
///     filters: &filters,
///     attribute_types: &attribute_types,
///     page_size: 100,
/// };
/// let items = read::pagination::fetch_all(client, context).await?;
/// println!("{} items", items.len());
/// # Ok(())
/// # }
/// ```
pub async fn fetch_all(
    store: &dyn store::Store,
    context: read::access_path::ReadContext<'_>,
) -> Result<Vec<common::Item>> {
    pages(store, context)
        .try_fold(Vec::new(), |mut items, output| async move {
            items.extend(output.page.items);
            Ok(items)
        })
        .await
}
