//! Shared domain vocabulary used across the route table and handlers

/// Role values stored on a user's `role` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Instructor,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Instructor => "instructor",
        }
    }
}

/// Review outcome stored on a submitted class's `status` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassStatus {
    Approved,
    Denied,
}

impl ClassStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ClassStatus::Approved => "approved",
            ClassStatus::Denied => "denied",
        }
    }
}
