//! Declared ownership of user data.
//!
//! Every table holding rows that belong to a user is registered here, in the
//! order the account purge visits them. Children precede their parents. A new
//! user-owned table needs exactly one entry in [`USER_OWNED_TABLES`].

/// How rows of a table are tied to their owning user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// `table.column = user_id`
    Direct { column: &'static str },
    /// `table.foreign_column IN (SELECT parent.id FROM parent WHERE parent.owner_column = user_id)`
    ViaParent {
        foreign_column: &'static str,
        parent_table: &'static str,
        parent_owner_column: &'static str,
    },
}

/// One entry of the ownership schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnedTable {
    pub table: &'static str,
    pub ownership: Ownership,
}

impl OwnedTable {
    pub const fn direct(table: &'static str, column: &'static str) -> Self {
        Self {
            table,
            ownership: Ownership::Direct { column },
        }
    }

    pub const fn via_parent(
        table: &'static str,
        foreign_column: &'static str,
        parent_table: &'static str,
        parent_owner_column: &'static str,
    ) -> Self {
        Self {
            table,
            ownership: Ownership::ViaParent {
                foreign_column,
                parent_table,
                parent_owner_column,
            },
        }
    }

    /// Column of this table that the purge filters on
    pub fn column(&self) -> &'static str {
        match self.ownership {
            Ownership::Direct { column } => column,
            Ownership::ViaParent { foreign_column, .. } => foreign_column,
        }
    }

    /// `table.column`, used in logs and reports
    pub fn label(&self) -> String {
        format!("{}.{}", self.table, self.column())
    }
}

/// Primary key column shared by every parent table in the schema
pub const PARENT_KEY_COLUMN: &str = "id";

/// Profile table, purged after every owned table
pub const PROFILES_TABLE: &str = "profiles";

/// Cascade order for account deletion
pub const USER_OWNED_TABLES: &[OwnedTable] = &[
    OwnedTable::direct("messages", "sender_id"),
    OwnedTable::direct("messages", "receiver_id"),
    OwnedTable::direct("products", "seller_id"),
    OwnedTable::direct("news", "author_id"),
    OwnedTable::direct("poll_votes", "user_id"),
    OwnedTable::via_parent("poll_options", "poll_id", "polls", "created_by"),
    OwnedTable::direct("polls", "created_by"),
    OwnedTable::direct("support_tickets", "user_id"),
    OwnedTable::direct("activity_logs", "user_id"),
    OwnedTable::direct("notifications", "user_id"),
    OwnedTable::direct("saved_items", "user_id"),
    OwnedTable::direct("seller_applications", "user_id"),
    OwnedTable::direct("scheduled_sms", "created_by"),
    OwnedTable::direct("sms_topups", "seller_id"),
    OwnedTable::direct("subscription_payments", "seller_id"),
    OwnedTable::direct("seller_profiles", "user_id"),
];

/// Identifier safe to splice into SQL: lowercase ASCII, digits, underscores
pub fn is_plain_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit())
}
