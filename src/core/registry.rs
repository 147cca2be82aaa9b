//! Pass-through persistence for dispatch servers and settings.
//!
//! Undifferentiated document CRUD. No permission verdicts beyond the
//! CLI's admin gate, and no audit entries; the trail records key
//! lifecycle actions only.

use crate::core::lock::StoreLock;
use crate::core::paths::PanelPaths;
use crate::core::store::{self, Collection};
use crate::error::StoreError;
use crate::models::registry::{DispatchSettings, ServerTemplate};

fn servers(paths: &PanelPaths) -> Collection<ServerTemplate> {
    Collection::open(paths.servers_file.clone())
}

pub fn list_servers(paths: &PanelPaths) -> Result<Vec<ServerTemplate>, StoreError> {
    let _lock = StoreLock::shared(&paths.store_lock)?;
    servers(paths).read()
}

pub fn add_server(
    paths: &PanelPaths,
    server_name: &str,
    command_format: &str,
) -> Result<ServerTemplate, StoreError> {
    let _lock = StoreLock::exclusive(&paths.store_lock)?;
    let coll = servers(paths);
    let mut records = coll.read()?;
    let server = ServerTemplate {
        id: store::new_doc_id(),
        server_name: server_name.to_string(),
        command_format: command_format.to_string(),
    };
    records.push(server.clone());
    coll.write(&records)?;
    Ok(server)
}

/// Remove by id. Returns false if nothing matched.
pub fn remove_server(paths: &PanelPaths, id: &str) -> Result<bool, StoreError> {
    let _lock = StoreLock::exclusive(&paths.store_lock)?;
    let coll = servers(paths);
    let mut records = coll.read()?;
    let before = records.len();
    records.retain(|s| s.id != id);
    if records.len() == before {
        return Ok(false);
    }
    coll.write(&records)?;
    Ok(true)
}

/// Load dispatch settings; a never-written file is the default.
pub fn load_settings(paths: &PanelPaths) -> Result<DispatchSettings, StoreError> {
    let _lock = StoreLock::shared(&paths.store_lock)?;
    Ok(store::read_json_file(&paths.settings_file)?.unwrap_or_default())
}

pub fn save_settings(paths: &PanelPaths, settings: &DispatchSettings) -> Result<(), StoreError> {
    let _lock = StoreLock::exclusive(&paths.store_lock)?;
    store::write_json_file(&paths.settings_file, settings)
}
