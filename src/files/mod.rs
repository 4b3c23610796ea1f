/// File and folder operations over the flat object store.
///
/// Every operation takes the caller's [`Principal`] explicitly. Writes are
/// checked against the access gate before anything reaches the store, and
/// each operation issues at most two store calls with no retries.
pub mod listing;
pub mod path;

use std::sync::Arc;

use tracing::{error, info};

use crate::access::{AccessGate, Capability, Principal};
use crate::error::{AdminError, Result};
use crate::storage::ObjectStore;
use listing::FolderListing;
use path::{Category, DELIMITER};

/// Content type written on folder marker objects.
pub const FOLDER_CONTENT_TYPE: &str = "application/x-directory";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedFolder {
    /// Marker key, trailing delimiter included.
    pub folder_path: String,
    /// Sanitized folder name.
    pub folder_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub key: String,
    pub url: String,
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamedFile {
    pub new_key: String,
    pub new_url: String,
    pub new_name: String,
}

/// Bucket operations bound to one store handle and one CDN domain.
pub struct FileManager {
    store: Arc<dyn ObjectStore>,
    gate: AccessGate,
    cdn_domain: String,
}

impl FileManager {
    pub fn new(store: Arc<dyn ObjectStore>, gate: AccessGate, cdn_domain: impl Into<String>) -> Self {
        Self {
            store,
            gate,
            cdn_domain: cdn_domain.into(),
        }
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    pub fn public_url(&self, category: Category, relative_path: &str) -> String {
        path::public_url(&self.cdn_domain, category, relative_path)
    }

    /// List one level of `folder_path`. Open to everyone.
    pub async fn list(
        &self,
        principal: &Principal,
        category: Category,
        folder_path: &str,
    ) -> Result<FolderListing> {
        self.gate.check(principal, Capability::Read)?;

        let full_prefix = path::folder_prefix(category, folder_path);
        let raw = self.store.list(&full_prefix, DELIMITER).await?;

        Ok(listing::project(raw, category, &full_prefix, &self.cdn_domain))
    }

    /// Write an empty marker object so the folder shows up before it has
    /// any contents. Repeating the call rewrites the same marker.
    pub async fn create_folder(
        &self,
        principal: &Principal,
        category: Category,
        folder_name: &str,
    ) -> Result<CreatedFolder> {
        self.gate.check(principal, Capability::Write)?;

        if folder_name.trim().is_empty() {
            return Err(AdminError::Validation("Folder name is required".into()));
        }

        let clean = path::sanitize_folder_name(folder_name);
        let key = format!("{}{DELIMITER}{clean}{DELIMITER}", category.namespace());

        self.store.put(&key, Vec::new(), FOLDER_CONTENT_TYPE).await?;
        info!(key = %key, "Created folder");

        Ok(CreatedFolder {
            folder_path: key,
            folder_name: clean,
        })
    }

    /// Store `body` under `folder_path/file_name`, overwriting whatever
    /// was there. The file name is used as given.
    pub async fn upload(
        &self,
        principal: &Principal,
        category: Category,
        folder_path: &str,
        body: Vec<u8>,
        file_name: &str,
        content_type: &str,
    ) -> Result<UploadedFile> {
        self.gate.check(principal, Capability::Write)?;

        if file_name.is_empty() {
            return Err(AdminError::Validation("No file provided".into()));
        }

        let relative = path::relative_path(folder_path, file_name);
        let key = path::to_key(category, folder_path, file_name);
        let size = body.len();

        self.store.put(&key, body, content_type).await?;
        info!(key = %key, size, content_type, "Uploaded file");

        Ok(UploadedFile {
            url: self.public_url(category, &relative),
            key,
            file_name: file_name.to_string(),
        })
    }

    /// Copy `old_key` to a sibling key named `new_name`, then delete the
    /// original.
    ///
    /// Not atomic: if the delete fails after a successful copy, both keys
    /// exist and the error is returned without undoing the copy.
    pub async fn rename(
        &self,
        principal: &Principal,
        old_key: &str,
        new_name: &str,
        category: Category,
    ) -> Result<RenamedFile> {
        self.gate.check(principal, Capability::Write)?;

        if old_key.is_empty() || new_name.is_empty() {
            return Err(AdminError::Validation(
                "Old key and new name are required".into(),
            ));
        }

        let new_key = format!("{}{DELIMITER}{new_name}", path::parent_of(old_key));
        let new_url = self.public_url(category, &path::strip_namespace(&new_key, category));

        // Copy-then-delete onto the same key would remove the object.
        if new_key == old_key {
            info!(old_key, "Rename to the current name, nothing to do");
            return Ok(RenamedFile {
                new_key,
                new_url,
                new_name: new_name.to_string(),
            });
        }

        self.store.copy(old_key, &new_key).await?;
        if let Err(e) = self.store.delete(old_key).await {
            error!(
                old_key,
                new_key = %new_key,
                error = %e,
                "Rename copied the object but could not delete the original"
            );
            return Err(e);
        }
        info!(old_key, new_key = %new_key, "Renamed file");

        Ok(RenamedFile {
            new_url,
            new_key,
            new_name: new_name.to_string(),
        })
    }

    /// Delete exactly `key`. Missing keys are not an error, and deleting a
    /// folder marker leaves the folder's contents in place.
    pub async fn delete(&self, principal: &Principal, key: &str) -> Result<()> {
        self.gate.check(principal, Capability::Write)?;

        if key.is_empty() {
            return Err(AdminError::Validation("File key is required".into()));
        }

        self.store.delete(key).await?;
        info!(key, "Deleted object");
        Ok(())
    }
}
