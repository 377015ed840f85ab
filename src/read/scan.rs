use crate::error::Result;
use crate::{read, store};

/// Scan operation.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_browser::read;
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let scan = read::scan::Scan {
///     read_args: read::common::ReadArgs {
///         limit: Some(100),
///         table_name: "users".to_string(),
///         ..Default::default()
///     },
/// };
/// let page = scan.send(client).await?;
/// println!("{} items", page.items.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scan {
    /// Table or index, filter, page size and start key.
    pub read_args: read::common::ReadArgs,
}

impl From<Scan> for read::common::ReadInput {
    fn from(scan: Scan) -> Self {
        scan.read_args.into()
    }
}

impl Scan {
    /// Execute one page of the scan.
    pub async fn send(self, store: &dyn store::Store) -> Result<read::common::Page> {
        store.scan(self.into()).await
    }
}
