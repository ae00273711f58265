//! Bootstrap command - provisions the first root key
//!
//! Creates an internal workspace holding the root key, a tenant workspace
//! with a key-authenticated Api, and a root key scoped to the tenant
//! workspace. The plaintext root key is printed once and never stored.

use clap::Args;
use tracing::info;

use crate::domain::{Api, DomainError, Key, KeyAuth, Storage, Workspace};
use crate::infrastructure::key::{KeyGenerator, DEFAULT_BYTE_LENGTH};
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::storage::StorageFactory;

#[derive(Debug, Clone, Args)]
pub struct BootstrapArgs {
    /// Name of the tenant workspace
    #[arg(long, default_value = "Default")]
    pub workspace_name: String,

    #[arg(long, default_value = "default")]
    pub workspace_slug: String,

    /// External tenant reference of the workspace
    #[arg(long, default_value = "tenant_default")]
    pub tenant_id: String,

    #[arg(long, default_value = "default-api")]
    pub api_name: String,

    /// Prefix of the generated root key
    #[arg(long, default_value = "root")]
    pub prefix: String,
}

impl Default for BootstrapArgs {
    fn default() -> Self {
        Self {
            workspace_name: "Default".to_string(),
            workspace_slug: "default".to_string(),
            tenant_id: "tenant_default".to_string(),
            api_name: "default-api".to_string(),
            prefix: "root".to_string(),
        }
    }
}

/// Entities created by [`provision`]
pub struct Provisioned {
    /// Plaintext root key; shown once
    pub root_key: String,
    pub root_key_id: String,
    pub workspace_id: String,
    pub api_id: String,
}

impl std::fmt::Debug for Provisioned {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provisioned")
            .field("root_key_id", &self.root_key_id)
            .field("workspace_id", &self.workspace_id)
            .field("api_id", &self.api_id)
            .finish_non_exhaustive()
    }
}

pub async fn run(args: BootstrapArgs) -> anyhow::Result<()> {
    let config = super::load_config()?;
    init_logging(&config.logging)?;

    let storage = StorageFactory::create(&config.storage.storage_config()?).await?;
    let provisioned = provision(storage.as_ref(), &args).await?;
    print(&provisioned);

    Ok(())
}

pub async fn provision(storage: &dyn Storage, args: &BootstrapArgs) -> Result<Provisioned, DomainError> {
    let internal = Workspace::new("Keyhub", "keyhub-internal", "keyhub").internal();
    let root_namespace = KeyAuth::new(&internal.id);

    let tenant = Workspace::new(&args.workspace_name, &args.workspace_slug, &args.tenant_id);
    let key_auth = KeyAuth::new(&tenant.id);
    let api = Api::with_key_auth(&args.api_name, &tenant.id, &key_auth.id);

    let generated = KeyGenerator::new().generate(Some(args.prefix.as_str()), DEFAULT_BYTE_LENGTH)?;
    let root = Key::new(&root_namespace.id, &internal.id, generated.hash.as_str(), generated.start.as_str())
        .with_name("bootstrap root key")
        .for_workspace(&tenant.id);

    let provisioned = Provisioned {
        root_key: generated.key,
        root_key_id: root.id.clone(),
        workspace_id: tenant.id.clone(),
        api_id: api.id.clone(),
    };

    storage.create_workspace(internal).await?;
    storage.create_key_auth(root_namespace).await?;
    storage.create_workspace(tenant).await?;
    storage.create_key_auth(key_auth).await?;
    storage.create_api(api).await?;
    storage.create_key(root).await?;

    info!(
        workspace_id = %provisioned.workspace_id,
        api_id = %provisioned.api_id,
        key_id = %provisioned.root_key_id,
        "Bootstrap complete"
    );

    Ok(provisioned)
}

/// Write the provisioned identifiers and the root key to stdout
pub fn print(provisioned: &Provisioned) {
    println!("workspace_id: {}", provisioned.workspace_id);
    println!("api_id:       {}", provisioned.api_id);
    println!("root_key_id:  {}", provisioned.root_key_id);
    println!("root_key:     {}", provisioned.root_key);
    println!("Store the root key now; it cannot be shown again.");
}
