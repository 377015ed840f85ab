//! Store clients per connection profile.
//!
//! Building an SDK client loads configuration and credentials, so one client is
//! kept per [`Profile`] and reused until it is evicted.

use crate::error::Result;

use aws_runtime::env_config::file::EnvConfigFiles;
use aws_sdk_dynamodb::{Client, config};
use aws_types::os_shim_internal::{Env, Fs};
use parking_lot::Mutex;
use std::{collections, fmt};

const CREDENTIALS_PROVIDER: &str = "dynamodb-browser";
const LOCAL_REGION: &str = "us-east-1";

/// How to reach a DynamoDB endpoint.
#[derive(Clone, Eq, Hash, PartialEq)]
pub enum Profile {
    /// A named profile from the shared AWS config files.
    Preconfigured {
        /// The profile name.
        name: String,
        /// The region to connect to.
        region: String,
    },
    /// A local endpoint such as DynamoDB Local.
    Local {
        /// The endpoint URL.
        endpoint: String,
    },
    /// Static access keys.
    Remote {
        /// The access key id.
        access_key_id: String,
        /// The secret access key.
        secret_access_key: String,
        /// The region to connect to.
        region: String,
    },
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preconfigured { name, region } => f
                .debug_struct("Preconfigured")
                .field("name", name)
                .field("region", region)
                .finish(),
            Self::Local { endpoint } => f.debug_struct("Local").field("endpoint", endpoint).finish(),
            Self::Remote {
                access_key_id,
                region,
                ..
            } => f
                .debug_struct("Remote")
                .field("access_key_id", access_key_id)
                .field("secret_access_key", &"** redacted **")
                .field("region", region)
                .finish(),
        }
    }
}

/// Names of the profiles in the shared AWS config and credentials files, sorted.
///
/// Missing files give no profiles. The files are the ones the SDK reads, so
/// `AWS_CONFIG_FILE` and `AWS_SHARED_CREDENTIALS_FILE` are honoured.
///
/// ```rust,no_run
/// use dynamodb_browser::registry;
///
/// # async fn example() -> dynamodb_browser::error::Result<()> {
/// for name in registry::available_profiles().await? {
///     println!("{name}");
/// }
/// # Ok(())
/// # }
/// ```
pub async fn available_profiles() -> Result<Vec<String>> {
    profiles_in(&EnvConfigFiles::default()).await
}

async fn profiles_in(files: &EnvConfigFiles) -> Result<Vec<String>> {
    let profile_set = aws_config::profile::load(&Fs::real(), &Env::real(), files, None).await?;
    let mut names: Vec<String> = profile_set.profiles().map(str::to_string).collect();
    names.sort();
    #[cfg(feature = "tracing")]
    tracing::debug!(profiles = names.len(), "loaded shared config profiles");
    Ok(names)
}

/// Build a client for `profile`.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "dynamodb_browser.connect")
)]
pub async fn connect(profile: &Profile) -> Client {
    match profile {
        Profile::Preconfigured { name, region } => {
            let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                .profile_name(name)
                .region(aws_config::Region::new(region.clone()))
                .load()
                .await;
            Client::new(&sdk_config)
        }
        Profile::Local { endpoint } => {
            let credentials =
                config::Credentials::new("local", "local", None, None, CREDENTIALS_PROVIDER);
            let config = config::Builder::new()
                .behavior_version(config::BehaviorVersion::latest())
                .region(config::Region::new(LOCAL_REGION))
                .credentials_provider(credentials)
                .endpoint_url(endpoint)
                .build();
            Client::from_conf(config)
        }
        Profile::Remote {
            access_key_id,
            secret_access_key,
            region,
        } => {
            let credentials = config::Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                CREDENTIALS_PROVIDER,
            );
            let config = config::Builder::new()
                .behavior_version(config::BehaviorVersion::latest())
                .region(config::Region::new(region.clone()))
                .credentials_provider(credentials)
                .build();
            Client::from_conf(config)
        }
    }
}

/// Clients keyed by profile.
///
/// ```rust,no_run
/// use dynamodb_browser::registry;
///
/// # async fn example() {
/// let registry = registry::ClientRegistry::new();
/// let profile = registry::Profile::Local {
///     endpoint: "http://localhost:8000".to_string(),
/// };
/// let client = registry.get_or_connect(&profile).await;
/// # let _ = client;
/// registry.remove(&profile);
/// # }
/// ```
pub struct ClientRegistry<C = Client> {
    clients: Mutex<collections::HashMap<Profile, C>>,
}

impl<C> Default for ClientRegistry<C> {
    fn default() -> Self {
        Self {
            clients: Mutex::new(collections::HashMap::new()),
        }
    }
}

impl<C: Clone> ClientRegistry<C> {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The client of `profile`, if one was built.
    pub fn get(&self, profile: &Profile) -> Option<C> {
        self.clients.lock().get(profile).cloned()
    }

    /// Keep `client` for `profile` unless one is already kept, and return the kept one.
    pub fn insert(&self, profile: Profile, client: C) -> C {
        self.clients.lock().entry(profile).or_insert(client).clone()
    }

    /// The client of `profile`, built with `create` on first use.
    pub fn get_or_insert_with(&self, profile: &Profile, create: impl FnOnce(&Profile) -> C) -> C {
        self.clients
            .lock()
            .entry(profile.clone())
            .or_insert_with(|| create(profile))
            .clone()
    }

    /// Evict the client of `profile`.
    pub fn remove(&self, profile: &Profile) -> Option<C> {
        self.clients.lock().remove(profile)
    }

    /// Evict every client.
    pub fn clear(&self) {
        self.clients.lock().clear();
    }

    /// Number of kept clients.
    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }

    /// Whether no client is kept.
    pub fn is_empty(&self) -> bool {
        self.clients.lock().is_empty()
    }
}

impl ClientRegistry<Client> {
    /// The client of `profile`, connecting on first use.
    ///
    /// Two concurrent first uses may both connect; the first one stored is kept.
    pub async fn get_or_connect(&self, profile: &Profile) -> Client {
        if let Some(client) = self.get(profile) {
            return client;
        }
        let client = connect(profile).await;
        self.insert(profile.clone(), client)
    }
}
