//! Status and confirmation message types for operation feedback.

use std::fmt;

/// A one-line confirmation for operations that have no resource to show.
pub struct OperationStatus {
    pub message: String,
    pub success: bool,
}

impl OperationStatus {
    pub fn success(message: String) -> Self {
        Self {
            message,
            success: true,
        }
    }

    /// A non-error outcome that still deserves attention, such as a
    /// no-op.
    pub fn failure(message: String) -> Self {
        Self {
            message,
            success: false,
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {}",
            if self.success { "Success:" } else { "Notice:" },
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_status_display() {
        let success = OperationStatus::success("Tagged v1".to_string());
        assert_eq!(format!("{success}"), "Success: Tagged v1\n");

        let notice = OperationStatus::failure("Tag already present".to_string());
        assert!(format!("{notice}").starts_with("Notice:"));
    }
}
