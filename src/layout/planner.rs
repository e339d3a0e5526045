//! On-disk layout of a mirrored creator.
//!
//! ```text
//! root/creator/category[/baseModel]/<7-digit id> - <item name>/<version>/
//!     <model files>
//!     preview.jpg
//!     <item name>.civitai.info
//!     description.txt, triggerWords.txt, details.txt
//!     examples/<image id>.jpg
//! ```
//!
//! The zero-padded id keeps item folders unique and sorted even when two items
//! share a display name.

use super::sanitize::{NameSanitizer, SanitizeContext};
use crate::catalog::{CatalogItem, Category, ImageEntry, ModelVersion};
use std::path::{Path, PathBuf};

/// Folder used when a version has no name.
pub const UNKNOWN_VERSION: &str = "Version Unknown";
/// Sub-folder holding every image but the first.
pub const EXAMPLES_DIR: &str = "examples";
/// File name of a version's first image, before extension correction.
pub const PREVIEW_FILE: &str = "preview.jpeg";
pub const DESCRIPTION_FILE: &str = "description.txt";
pub const TRIGGER_WORDS_FILE: &str = "triggerWords.txt";
pub const DETAILS_FILE: &str = "details.txt";

const ITEM_ID_WIDTH: usize = 7;

/// Folders of one item version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionLayout {
    pub model_folder: PathBuf,
    pub version_folder: PathBuf,
}

impl VersionLayout {
    pub fn examples_folder(&self) -> PathBuf {
        self.version_folder.join(EXAMPLES_DIR)
    }
}

/// Derives every destination path below the output root.
#[derive(Debug, Clone)]
pub struct PathPlanner {
    root: PathBuf,
    sanitizer: NameSanitizer,
}

impl PathPlanner {
    pub fn new(root: impl Into<PathBuf>, sanitizer: NameSanitizer) -> Self {
        Self {
            root: root.into(),
            sanitizer,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sanitizer(&self) -> &NameSanitizer {
        &self.sanitizer
    }

    pub fn creator_folder(&self, creator: &str) -> PathBuf {
        self.root.join(self.sanitizer.sanitize(creator))
    }

    pub fn category_folder(&self, creator: &str, category: Category) -> PathBuf {
        self.creator_folder(creator).join(category.as_str())
    }

    /// Folders for `version` of `item`, stored under `category`.
    pub fn plan_layout(
        &self,
        creator: &str,
        item: &CatalogItem,
        version: &ModelVersion,
        category: Category,
    ) -> VersionLayout {
        let mut parent = self.category_folder(creator, category);
        if let Some(base_model) = version.base_model.as_deref().filter(|b| !b.trim().is_empty()) {
            parent.push(self.sanitizer.sanitize(base_model));
        }

        let id_prefix = format!("{:0width$} - ", item.id, width = ITEM_ID_WIDTH);
        let context = SanitizeContext::default().parent(&parent).prefix(&id_prefix);
        let label = self.sanitizer.sanitize_with(&item.name, context);
        let model_folder = parent.join(label);

        let version_name = match version.name.trim() {
            "" => UNKNOWN_VERSION,
            name => name,
        };
        let version_folder =
            model_folder.join(self.sanitizer.sanitize_in(version_name, &model_folder));

        VersionLayout {
            model_folder,
            version_folder,
        }
    }

    /// Destination of a model file. The item name is stripped from the file name.
    pub fn file_path(&self, layout: &VersionLayout, item: &CatalogItem, file_name: &str) -> PathBuf {
        let parent = &layout.version_folder;
        let context = SanitizeContext::folder(&item.name).parent(parent);
        parent.join(self.sanitizer.sanitize_with(file_name, context))
    }

    pub fn preview_path(&self, layout: &VersionLayout, image: &ImageEntry) -> PathBuf {
        layout
            .version_folder
            .join(PREVIEW_FILE)
            .with_extension(planned_image_extension(image))
    }

    /// Destination of an example image, or `None` for an entry without id.
    pub fn example_path(
        &self,
        layout: &VersionLayout,
        item: &CatalogItem,
        image: &ImageEntry,
    ) -> Option<PathBuf> {
        let id = image.id?;
        let parent = layout.examples_folder();
        let raw = format!("{}_{}.{}", item.name, id, planned_image_extension(image));
        let context = SanitizeContext::folder(&item.name).parent(&parent);
        let name = self.sanitizer.sanitize_with(&raw, context);
        Some(parent.join(name))
    }

    /// Raw JSON dump of the item.
    pub fn metadata_path(&self, layout: &VersionLayout, item: &CatalogItem) -> PathBuf {
        let parent = &layout.version_folder;
        let name = format!("{}.civitai.info", item.name);
        parent.join(self.sanitizer.sanitize_in(&name, parent))
    }

    pub fn description_path(&self, layout: &VersionLayout) -> PathBuf {
        layout.version_folder.join(DESCRIPTION_FILE)
    }

    pub fn trigger_words_path(&self, layout: &VersionLayout) -> PathBuf {
        layout.version_folder.join(TRIGGER_WORDS_FILE)
    }

    pub fn details_path(&self, layout: &VersionLayout) -> PathBuf {
        layout.version_folder.join(DETAILS_FILE)
    }
}

fn planned_image_extension(image: &ImageEntry) -> &'static str {
    if image.is_video() {
        "mp4"
    } else {
        "jpeg"
    }
}

/// Whether a directory name looks like an item folder (`0000042 - Name`).
pub fn is_item_label(name: &str) -> bool {
    let Some((id, rest)) = name.split_once(" - ") else {
        return false;
    };
    id.len() >= ITEM_ID_WIDTH && id.bytes().all(|b| b.is_ascii_digit()) && !rest.is_empty()
}
