/// Mapping between user-facing folder/file names and storage keys.
///
/// Keys always start with the namespace of their category:
/// `images/<folder>/<name>` or `files/<folder>/<name>`. A key ending in
/// `/` is a folder marker.
pub const DELIMITER: &str = "/";

/// Content category. Chosen by the caller on every request and never
/// stored on the object itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Image,
    File,
}

impl Category {
    /// Parse the `type` request parameter. Anything other than `image`
    /// selects generic files.
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("image") => Category::Image,
            _ => Category::File,
        }
    }

    pub fn namespace(self) -> &'static str {
        match self {
            Category::Image => "images",
            Category::File => "files",
        }
    }

    fn root(self) -> String {
        format!("{}{DELIMITER}", self.namespace())
    }
}

fn trim_slashes(path: &str) -> &str {
    path.trim().trim_matches('/')
}

/// Replace every character outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize_folder_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Path relative to the namespace root: `folder/name`, or just `name` for
/// an empty folder. File names are not sanitized.
pub fn relative_path(folder_path: &str, file_name: &str) -> String {
    match trim_slashes(folder_path) {
        "" => file_name.to_string(),
        folder => format!("{folder}{DELIMITER}{file_name}"),
    }
}

pub fn to_key(category: Category, folder_path: &str, file_name: &str) -> String {
    format!(
        "{}{}",
        category.root(),
        relative_path(folder_path, file_name)
    )
}

/// Inverse of [`to_key`]: `(folder_path, file_name)`, or `None` if the key
/// is not under the category's namespace.
pub fn from_key(key: &str, category: Category) -> Option<(String, String)> {
    let rest = key.strip_prefix(&category.root())?;
    Some(match rest.rsplit_once(DELIMITER) {
        Some((folder, name)) => (folder.to_string(), name.to_string()),
        None => (String::new(), rest.to_string()),
    })
}

/// Key prefix addressing the contents of a folder, always ending in the
/// delimiter.
pub fn folder_prefix(category: Category, folder_path: &str) -> String {
    match trim_slashes(folder_path) {
        "" => category.root(),
        folder => format!("{}{folder}{DELIMITER}", category.root()),
    }
}

/// Strip the namespace from a key, leaving the path the CDN URL is built
/// from. Keys outside the namespace are returned unchanged.
pub fn strip_namespace(key: &str, category: Category) -> String {
    key.replacen(&category.root(), "", 1)
}

/// Everything in `key` before its last delimiter.
pub fn parent_of(key: &str) -> &str {
    key.rsplit_once(DELIMITER).map(|(dir, _)| dir).unwrap_or("")
}

/// `https://<cdn>/<namespace>/<relative_path>`. No signing, no I/O.
pub fn public_url(cdn_domain: &str, category: Category, relative_path: &str) -> String {
    let relative = relative_path.strip_prefix('/').unwrap_or(relative_path);
    format!("https://{cdn_domain}/{}/{relative}", category.namespace())
}
