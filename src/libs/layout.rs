//! The two storage layouts the demo compares.
//!
//! Both layouts live in the same store file under separate tables.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Every parent owns its own copies of the child record.
    Duplicated,
    /// One keyed child record shared by every parent.
    Normalized,
}

impl Layout {
    pub const ALL: [Layout; 2] = [Layout::Duplicated, Layout::Normalized];

    pub fn task_table(self) -> &'static str {
        match self {
            Layout::Duplicated => "task_storage",
            Layout::Normalized => "task_storage_with_key",
        }
    }

    pub fn image_titles_table(self) -> &'static str {
        match self {
            Layout::Duplicated => "image_titles_storage",
            Layout::Normalized => "image_titles_storage_with_key",
        }
    }

    pub fn link_table(self) -> &'static str {
        match self {
            Layout::Duplicated => "task_storage_image_titles",
            Layout::Normalized => "task_storage_with_key_image_titles",
        }
    }

    /// Record type names as they appear in the log output.
    pub fn task_type_name(self) -> &'static str {
        match self {
            Layout::Duplicated => "TaskStorage",
            Layout::Normalized => "TaskStorageWithKey",
        }
    }

    pub fn image_titles_type_name(self) -> &'static str {
        match self {
            Layout::Duplicated => "ImageTitlesStorage",
            Layout::Normalized => "ImageTitlesStorageWithKey",
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Duplicated => write!(f, "duplicate"),
            Layout::Normalized => write!(f, "normalized"),
        }
    }
}
