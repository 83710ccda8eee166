use tracing::{debug, info, warn};

use crate::core::models::permission::{
    Availability, AuthorizationState, DenialReason, PermissionRequirement,
};
use crate::core::providers::HealthProvider;

/// Steps the user has to take in the provider app when access is denied.
pub const REMEDIATION_STEPS: &str = "Please grant Nutrition permissions in Health Connect:\n\n\
1. Open Health Connect\n\
2. Go to Data & Access\n\
3. Find this app and enable nutrition access\n\
4. Also connect Cronometer and enable its data sharing";

/// How to act on a denial from the `watch` prompt.
pub const SETTINGS_HINT: &str =
    "Type 'open' to jump to the settings screen, then 'retry' once access is granted.";

/// Detect whether the provider currently grants every required permission.
///
/// This never asks the provider for permissions; it only reports. Errors from
/// the provider are folded into `Denied(Error(..))` and never returned.
pub async fn check_authorization(
    provider: &dyn HealthProvider,
    requirement: &PermissionRequirement,
) -> AuthorizationState {
    if let Err(e) = provider.initialize().await {
        warn!(error = %e, "provider initialization failed");
        return AuthorizationState::Denied(DenialReason::Error(e.to_string()));
    }

    let availability = match provider.availability().await {
        Ok(a) => a,
        Err(e) => return AuthorizationState::Denied(DenialReason::Error(e.to_string())),
    };
    debug!(?availability, "provider availability");
    if let Availability::Unavailable { reason } = availability {
        info!(reason = reason.as_deref().unwrap_or("unknown"), "provider unavailable");
        return AuthorizationState::Denied(DenialReason::Unavailable(reason));
    }

    let granted = match provider.granted_permissions().await {
        Ok(g) => g,
        Err(e) => return AuthorizationState::Denied(DenialReason::Error(e.to_string())),
    };
    debug!(count = granted.len(), "granted permissions");

    let missing = requirement.missing(&granted);
    if missing.is_empty() {
        info!("all required permissions granted");
        AuthorizationState::Granted
    } else {
        info!(missing = missing.len(), "required permissions not granted");
        AuthorizationState::Denied(DenialReason::Missing(missing))
    }
}

/// Title and body of the notice shown for a denial.
pub fn denial_notice(reason: &DenialReason) -> (&'static str, String) {
    match reason {
        DenialReason::Unavailable(_) => (
            "Unavailable",
            format!(
                "Health Connect is not available on this device.\n\n{}",
                SETTINGS_HINT
            ),
        ),
        DenialReason::Missing(_) => (
            "Permission Required",
            format!("{}\n\n{}", REMEDIATION_STEPS, SETTINGS_HINT),
        ),
        DenialReason::Error(msg) => ("Permission Error", format!("Error: {}", msg)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::permission::{Permission, RecordType};
    use crate::core::providers::scripted::ScriptedProvider;
    use std::sync::atomic::Ordering;

    fn full_grant() -> Vec<Permission> {
        vec![
            Permission::read(RecordType::Nutrition),
            Permission::read(RecordType::Hydration),
        ]
    }

    #[tokio::test]
    async fn granted_when_superset() {
        let mut perms = full_grant();
        perms.push(Permission::read(RecordType::Weight));
        let provider = ScriptedProvider::granting(perms);
        let state = check_authorization(&provider, &PermissionRequirement::default()).await;
        assert_eq!(state, AuthorizationState::Granted);
        assert_eq!(provider.init_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_permissions_are_listed() {
        let provider = ScriptedProvider::granting(vec![Permission::read(RecordType::Nutrition)]);
        let state = check_authorization(&provider, &PermissionRequirement::default()).await;
        assert_eq!(
            state,
            AuthorizationState::Denied(DenialReason::Missing(vec![Permission::read(
                RecordType::Hydration
            )]))
        );
        assert_eq!(state.to_string(), "denied (missing: Hydration:read)");
    }

    #[tokio::test]
    async fn unavailable_provider_is_denied_without_reads() {
        let provider = ScriptedProvider::unavailable();
        let state = check_authorization(&provider, &PermissionRequirement::default()).await;
        assert!(matches!(
            state,
            AuthorizationState::Denied(DenialReason::Unavailable(_))
        ));
        assert_eq!(state.to_string(), "denied (unavailable)");
        assert_eq!(provider.reads(), 0);
    }

    #[tokio::test]
    async fn provider_errors_become_denials() {
        let provider = ScriptedProvider::granting(full_grant());
        *provider.fail_permissions.lock().unwrap() = true;
        let state = check_authorization(&provider, &PermissionRequirement::default()).await;
        match state {
            AuthorizationState::Denied(DenialReason::Error(msg)) => {
                assert!(msg.contains("permission query failed"))
            }
            other => panic!("unexpected state: {:?}", other),
        }
    }

    #[tokio::test]
    async fn repeated_checks_are_safe() {
        let provider = ScriptedProvider::granting(full_grant());
        let req = PermissionRequirement::default();
        assert!(check_authorization(&provider, &req).await.is_granted());
        assert!(check_authorization(&provider, &req).await.is_granted());
        assert_eq!(provider.init_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn denial_notice_titles() {
        assert_eq!(denial_notice(&DenialReason::Unavailable(None)).0, "Unavailable");
        let (title, body) = denial_notice(&DenialReason::Missing(vec![]));
        assert_eq!(title, "Permission Required");
        assert!(body.contains("Data & Access"));
    }

    #[test]
    fn denial_notices_point_at_open_and_retry() {
        for reason in [DenialReason::Unavailable(None), DenialReason::Missing(vec![])] {
            let (_, body) = denial_notice(&reason);
            assert!(body.contains("'open'"), "{}", body);
            assert!(body.contains("'retry'"), "{}", body);
        }
        let (_, body) = denial_notice(&DenialReason::Error("boom".into()));
        assert_eq!(body, "Error: boom");
    }

    #[tokio::test]
    async fn export_granting_other_types_is_still_granted() {
        use crate::core::providers::file::ExportFileProvider;
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"{
                "grantedPermissions": [
                    { "recordType": "Nutrition", "accessType": "read" },
                    { "recordType": "Hydration", "accessType": "read" },
                    { "recordType": "Steps", "accessType": "read" }
                ],
                "records": []
            }"#,
        )
        .unwrap();
        let provider = ExportFileProvider::new(file.path().to_path_buf());
        let state = check_authorization(&provider, &PermissionRequirement::default()).await;
        assert_eq!(state, AuthorizationState::Granted);
    }
}
