//! Domain projection of stored records.
//!
//! `Task` and `TaskImageTitles` own copies of every field; nothing here
//! borrows from the store session, so a retrieval pass can drop the session
//! and the stored records independently of the projected objects.

use crate::db::task_storage::TaskStorage;
use crate::db::task_storage_with_key::TaskStorageWithKey;
use crate::libs::error::Result;
use std::sync::Arc;

/// Read access to the three descriptive fields of a child record.
pub trait ImageTitlesFields {
    fn title(&self) -> &str;
    fn category(&self) -> &str;
    fn portal_category(&self) -> &str;
}

impl<T: ImageTitlesFields> ImageTitlesFields for Arc<T> {
    fn title(&self) -> &str {
        (**self).title()
    }

    fn category(&self) -> &str {
        (**self).category()
    }

    fn portal_category(&self) -> &str {
        (**self).portal_category()
    }
}

/// A parent record loaded from either layout.
#[derive(Debug, Clone)]
pub enum StoredTask {
    Duplicated(TaskStorage),
    Normalized(TaskStorageWithKey),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskImageTitles {
    pub title: String,
    pub category: String,
    pub portal_category: String,
}

impl TaskImageTitles {
    pub fn new(title: &str, category: &str, portal_category: &str) -> Self {
        TaskImageTitles {
            title: title.to_string(),
            category: category.to_string(),
            portal_category: portal_category.to_string(),
        }
    }

    pub fn from_fields(fields: &impl ImageTitlesFields) -> Self {
        Self::new(fields.title(), fields.category(), fields.portal_category())
    }
}

impl ImageTitlesFields for TaskImageTitles {
    fn title(&self) -> &str {
        &self.title
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn portal_category(&self) -> &str {
        &self.portal_category
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: i64,
    pub image_titles: Vec<TaskImageTitles>,
}

impl Task {
    /// Copies a stored parent and all of its children into domain objects.
    ///
    /// Fails with `OutOfMemory` when the child list cannot be reserved.
    pub fn try_from_stored(stored: &StoredTask) -> Result<Task> {
        match stored {
            StoredTask::Duplicated(task) => Self::project(task.id, &task.image_titles),
            StoredTask::Normalized(task) => Self::project(task.id, &task.image_titles),
        }
    }

    fn project<C: ImageTitlesFields>(id: i64, children: &[C]) -> Result<Task> {
        let mut image_titles = Vec::new();
        image_titles.try_reserve_exact(children.len())?;
        image_titles.extend(children.iter().map(TaskImageTitles::from_fields));
        Ok(Task { id, image_titles })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::task_storage::ImageTitlesStorage;
    use crate::db::task_storage_with_key::ImageTitlesStorageWithKey;

    #[test]
    fn both_layouts_project_to_equal_tasks() {
        let copies = (0..3)
            .map(|id| ImageTitlesStorage {
                id,
                title: "リビング".into(),
                category: "Inside".into(),
                portal_category: "LivingDining".into(),
            })
            .collect();
        let shared = Arc::new(ImageTitlesStorageWithKey {
            id: "living_inside_1".into(),
            title: "リビング".into(),
            category: "Inside".into(),
            portal_category: "LivingDining".into(),
        });

        let duplicated = StoredTask::Duplicated(TaskStorage { id: 7, image_titles: copies });
        let normalized = StoredTask::Normalized(TaskStorageWithKey {
            id: 7,
            image_titles: vec![Arc::clone(&shared); 3],
        });

        let a = Task::try_from_stored(&duplicated).unwrap();
        let b = Task::try_from_stored(&normalized).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.image_titles.len(), 3);
    }
}
