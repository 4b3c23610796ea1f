/// Projects a flat delimited key listing into one folder level:
/// immediate subfolders plus immediate files.
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::path::{public_url, strip_namespace, Category, DELIMITER};
use crate::storage::PrefixListing;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Full key prefix of the folder, trailing delimiter included.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub url: String,
    pub key: String,
}

/// One level of a folder. Entry order is whatever the store returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FolderListing {
    pub folders: Vec<FolderEntry>,
    pub files: Vec<FileEntry>,
}

/// Build the view of `full_prefix` from the store's raw listing.
///
/// Marker objects (the folder's own key, or any key ending in the
/// delimiter) never show up as files, and entries whose derived name is
/// empty are dropped.
pub fn project(
    raw: PrefixListing,
    category: Category,
    full_prefix: &str,
    cdn_domain: &str,
) -> FolderListing {
    let folders = raw
        .common_prefixes
        .into_iter()
        .filter_map(|path| {
            let name = path
                .replacen(full_prefix, "", 1)
                .trim_end_matches(DELIMITER)
                .to_string();
            (!name.is_empty()).then_some(FolderEntry {
                name,
                kind: "folder",
                path,
            })
        })
        .collect();

    let files = raw
        .objects
        .into_iter()
        .filter(|obj| obj.key != full_prefix && !obj.key.ends_with(DELIMITER))
        .filter_map(|obj| {
            let name = obj.key.replacen(full_prefix, "", 1);
            if name.is_empty() {
                return None;
            }
            let url = public_url(cdn_domain, category, &strip_namespace(&obj.key, category));
            Some(FileEntry {
                name,
                kind: "file",
                size: obj.size,
                last_modified: obj.last_modified,
                url,
                key: obj.key,
            })
        })
        .collect();

    FolderListing { folders, files }
}
