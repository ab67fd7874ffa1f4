//! Confirmation descriptors for destructive actions.

use strum::{Display, IntoStaticStr};

use cloudshelf_core::{Container, FileEntry, FolderEntry, InstanceAction, format_size};

/// Discriminant of a [`PendingAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum ActionKind {
    File,
    Folder,
    Bucket,
    InstanceStart,
    InstanceStop,
    InstanceTerminate,
}

/// An action waiting for the user's confirmation.
///
/// Each variant carries exactly what its execute path needs.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    /// Delete a single object.
    DeleteFile { container: String, file: FileEntry },
    /// Delete an (empty) folder prefix.
    DeleteFolder {
        container: String,
        folder: FolderEntry,
    },
    /// Delete an (empty) container.
    DeleteBucket { container: Container },
    /// Start, stop or terminate a compute instance.
    Instance {
        instance_id: String,
        name: String,
        action: InstanceAction,
    },
}

impl PendingAction {
    /// Create a file deletion.
    pub fn delete_file(container: impl Into<String>, file: FileEntry) -> Self {
        Self::DeleteFile {
            container: container.into(),
            file,
        }
    }

    /// Create a folder deletion.
    pub fn delete_folder(container: impl Into<String>, folder: FolderEntry) -> Self {
        Self::DeleteFolder {
            container: container.into(),
            folder,
        }
    }

    /// Create a container deletion.
    pub fn delete_bucket(container: Container) -> Self {
        Self::DeleteBucket { container }
    }

    /// Create an instance action.
    pub fn instance(
        instance_id: impl Into<String>,
        name: impl Into<String>,
        action: InstanceAction,
    ) -> Self {
        Self::Instance {
            instance_id: instance_id.into(),
            name: name.into(),
            action,
        }
    }

    /// Kind of the action.
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::DeleteFile { .. } => ActionKind::File,
            Self::DeleteFolder { .. } => ActionKind::Folder,
            Self::DeleteBucket { .. } => ActionKind::Bucket,
            Self::Instance { action, .. } => match action {
                InstanceAction::Start => ActionKind::InstanceStart,
                InstanceAction::Stop => ActionKind::InstanceStop,
                InstanceAction::Terminate => ActionKind::InstanceTerminate,
            },
        }
    }

    /// Check if this is a deletion (as opposed to an instance action).
    pub fn is_deletion(&self) -> bool {
        !matches!(self, Self::Instance { .. })
    }

    /// Name of the target entity.
    pub fn target_name(&self) -> &str {
        match self {
            Self::DeleteFile { file, .. } => &file.name,
            Self::DeleteFolder { folder, .. } => &folder.name,
            Self::DeleteBucket { container } => &container.name,
            Self::Instance {
                name, instance_id, ..
            } => {
                if name.is_empty() {
                    instance_id
                } else {
                    name
                }
            }
        }
    }

    /// Dialog title.
    pub fn title(&self) -> String {
        match self {
            Self::DeleteFile { .. } => "Delete File".to_string(),
            Self::DeleteFolder { .. } => "Delete Folder".to_string(),
            Self::DeleteBucket { .. } => "Delete Bucket".to_string(),
            Self::Instance { action, .. } => match action {
                InstanceAction::Start => "Start Instance".to_string(),
                InstanceAction::Stop => "Stop Instance".to_string(),
                InstanceAction::Terminate => "Terminate Instance".to_string(),
            },
        }
    }

    /// Human-readable confirmation message.
    pub fn message(&self) -> String {
        let name = self.target_name();
        match self {
            Self::DeleteFile { .. } => {
                format!("Are you sure you want to delete \"{name}\"? This action cannot be undone.")
            }
            Self::DeleteFolder { .. } => format!(
                "Are you sure you want to delete the folder \"{name}\"? This action cannot be \
                 undone. The folder must be empty to be deleted."
            ),
            Self::DeleteBucket { .. } => format!(
                "Are you sure you want to delete the bucket \"{name}\"? This action cannot be \
                 undone and the bucket must be empty."
            ),
            Self::Instance {
                instance_id,
                action,
                ..
            } => format!("Are you sure you want to {action} instance \"{name}\" ({instance_id})?"),
        }
    }

    /// Extra detail line shown under the message.
    pub fn details(&self) -> Option<String> {
        match self {
            Self::DeleteFile { file, .. } => Some(format!(
                "Path: {} | Size: {} | Last modified: {}",
                file.full_path,
                format_size(file.size),
                file.last_modified.format("%Y-%m-%d %H:%M:%S UTC")
            )),
            Self::DeleteFolder { folder, .. } => Some(format!("Path: {}", folder.full_path)),
            Self::DeleteBucket { container } => Some(format!("Region: {}", container.region)),
            Self::Instance { .. } => None,
        }
    }

    /// Warning shown for actions with remote preconditions or no way back.
    pub fn warning(&self) -> Option<&'static str> {
        match self {
            Self::DeleteBucket { .. } => Some(
                "Bucket deletion is permanent and cannot be undone. The bucket must be \
                 completely empty before deletion.",
            ),
            Self::DeleteFolder { .. } => Some(
                "Only empty folders can be deleted. Make sure all files and subfolders are \
                 removed first.",
            ),
            Self::Instance {
                action: InstanceAction::Terminate,
                ..
            } => Some("Terminated instances cannot be restarted."),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn test_kind_strings() {
        let action = PendingAction::instance("i-1", "web", InstanceAction::Terminate);
        assert_eq!(action.kind().to_string(), "instance-terminate");
        assert!(!action.is_deletion());

        let action = PendingAction::delete_folder("logs", FolderEntry::new("2024/"));
        assert_eq!(action.kind().to_string(), "folder");
        assert!(action.is_deletion());
    }

    #[test]
    fn test_messages_name_the_target() {
        let file = FileEntry::new("2024/readme.txt", 2048, Utc::now());
        let action = PendingAction::delete_file("logs", file);
        assert!(action.message().contains("\"readme.txt\""));
        let details = action.details().unwrap();
        assert!(details.starts_with("Path: 2024/readme.txt | Size: 2 KiB"));
        assert!(action.warning().is_none());

        let action = PendingAction::delete_bucket(Container::new("b1", "eu-west-1", Utc::now()));
        assert!(action.message().contains("bucket \"b1\""));
        assert!(action.warning().unwrap().contains("empty"));
    }

    #[test]
    fn test_instance_target_falls_back_to_id() {
        let action = PendingAction::instance("i-9", "", InstanceAction::Stop);
        assert_eq!(action.target_name(), "i-9");
        assert_eq!(action.title(), "Stop Instance");
    }
}
