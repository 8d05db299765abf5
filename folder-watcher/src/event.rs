//! Classification of raw filesystem events.

/// Kind of raw file event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    /// File was created.
    Created,

    /// File was modified.
    Modified,

    /// File was deleted.
    Deleted,

    /// File was renamed (old path).
    RenamedFrom,

    /// File was renamed (new path).
    RenamedTo,

    /// File metadata changed.
    MetadataChanged,

    /// Access time changed.
    Accessed,

    /// Unknown event type.
    Unknown,
}

impl FileEventKind {
    /// Whether this event should count as a change to the watched folders.
    ///
    /// Access notifications never do. Unknown events do, since some
    /// backends report rescans that way.
    pub fn is_change(self) -> bool {
        !matches!(self, Self::Accessed)
    }
}

impl From<notify::EventKind> for FileEventKind {
    fn from(kind: notify::EventKind) -> Self {
        use notify::EventKind;
        use notify::event::{ModifyKind, RenameMode};

        match kind {
            EventKind::Create(_) => Self::Created,
            EventKind::Remove(_) => Self::Deleted,
            EventKind::Access(_) => Self::Accessed,
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Self::RenamedFrom,
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Self::RenamedTo,
            EventKind::Modify(ModifyKind::Metadata(_)) => Self::MetadataChanged,
            EventKind::Modify(_) => Self::Modified,
            _ => Self::Unknown,
        }
    }
}
