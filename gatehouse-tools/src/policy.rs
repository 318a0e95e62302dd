//! Launch-target safety filter for device actions.

use crate::error::ToolError;

/// Package identifiers that must never be launched autonomously.
const DENYLISTED_PACKAGES: &[&str] = &["com.bank", "com.android.bankapp"];

/// Substrings that mark a package as financial.
const DENYLISTED_SUBSTRINGS: &[&str] = &["bank"];

/// Hard allow/deny gate applied before any app launch. Case-insensitive,
/// and runs no matter how trusted the calling agent is: the threat model
/// is a wrong action taken autonomously, not a malicious caller.
pub fn check_launch_target(package: &str) -> Result<(), ToolError> {
    let lower = package.to_lowercase();
    let denied = DENYLISTED_PACKAGES.iter().any(|p| lower == *p)
        || DENYLISTED_SUBSTRINGS.iter().any(|s| lower.contains(s));
    if denied {
        return Err(ToolError::PolicyViolation(format!(
            "launching financial apps is blocked: {package}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_denylisted_packages() {
        assert!(matches!(
            check_launch_target("com.bank"),
            Err(ToolError::PolicyViolation(_))
        ));
        assert!(matches!(
            check_launch_target("com.android.bankapp"),
            Err(ToolError::PolicyViolation(_))
        ));
    }

    #[test]
    fn blocks_bank_substring_case_insensitively() {
        assert!(check_launch_target("com.MyBank.mobile").is_err());
        assert!(check_launch_target("COM.BANKING.APP").is_err());
    }

    #[test]
    fn allows_ordinary_packages() {
        assert!(check_launch_target("org.mozilla.firefox").is_ok());
        assert!(check_launch_target("com.termux").is_ok());
    }
}
