//! Role normalization. The API reports roles as free-form strings, including
//! Arabic synonyms for instructor, so raw strings are folded into a closed
//! set at the boundary and never compared directly anywhere else.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Instructor,
    Admin,
    Unknown,
}

impl Role {
    /// Normalize a raw role tag. Trims, lowercases, and folds locale
    /// synonyms (`teacher`, `مدرس`, `معلم`) into `Instructor`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "student" => Role::Student,
            "instructor" | "teacher" | "مدرس" | "معلم" => Role::Instructor,
            "admin" => Role::Admin,
            _ => Role::Unknown,
        }
    }

    /// Instructor-privilege: instructors and admins may manage content and
    /// access any grade.
    #[must_use]
    pub fn is_privileged(self) -> bool {
        matches!(self, Role::Instructor | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Role::Student => "student",
            Role::Instructor => "instructor",
            Role::Admin => "admin",
            Role::Unknown => "unknown",
        };
        write!(f, "{tag}")
    }
}
