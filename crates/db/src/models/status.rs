//! Status helper enums mapping to SMALLSERIAL/SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding `*_statuses` database table.

use serde::{Serialize, Serializer};

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Map a database status ID back to its variant.
            pub fn from_id(id: StatusId) -> Option<Self> {
                [$(Self::$variant),+].into_iter().find(|s| s.id() == id)
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Optimization task lifecycle status.
    ///
    /// `Pending -> Running -> {Finished, Failed, Stopped}`; the last three
    /// are terminal.
    TaskStatus {
        /// Row created, no correlation id yet.
        Pending = 1,
        /// Remote job accepted; correlation id recorded.
        Running = 2,
        Finished = 3,
        Failed = 4,
        Stopped = 5,
    }
}

/// Statuses from which no further remote polling happens.
pub const TERMINAL_TASK_STATUSES: [StatusId; 3] = [
    TaskStatus::Finished as StatusId,
    TaskStatus::Failed as StatusId,
    TaskStatus::Stopped as StatusId,
];

/// Statuses a terminal transition may start from.
pub const ACTIVE_TASK_STATUSES: [StatusId; 2] = [
    TaskStatus::Pending as StatusId,
    TaskStatus::Running as StatusId,
];

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        TERMINAL_TASK_STATUSES.contains(&self.id())
    }

    /// Client-facing name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Finished => "FINISHED",
            Self::Failed => "FAILED",
            Self::Stopped => "STOPPED",
        }
    }
}

impl Serialize for TaskStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}
