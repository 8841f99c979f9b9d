use tracing::{debug, info};

use chirpy_types::api::UpgradeEvent;

use crate::auth::AppStateInner;
use crate::error::ApiError;
use crate::guard::require_service_key;

pub const UPGRADE_EVENT: &str = "user.upgraded";

/// Billing webhook: marks a user as upgraded. Other event names are
/// acknowledged and ignored.
pub fn handle_upgrade(
    state: &AppStateInner,
    header: Option<&str>,
    event: UpgradeEvent,
) -> Result<(), ApiError> {
    require_service_key(header, &state.polka_key)?;

    if event.event != UPGRADE_EVENT {
        debug!("Ignoring webhook event {}", event.event);
        return Ok(());
    }

    let user_id = event.data.user_id;
    state.db.update_user(user_id, |u| u.upgraded = true)?;
    info!("User {} upgraded", user_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use chirpy_types::api::UpgradeEventData;

    use super::*;
    use crate::AuthError;
    use crate::testing::{self, POLKA_KEY};

    fn event(name: &str, user_id: u64) -> UpgradeEvent {
        UpgradeEvent {
            event: name.to_string(),
            data: UpgradeEventData { user_id },
        }
    }

    fn key_header() -> String {
        format!("ApiKey {POLKA_KEY}")
    }

    #[test]
    fn upgrade_sets_flag() {
        let (_dir, state) = testing::state();
        let user = state.db.create_user("a@x.com", "hash").unwrap();

        handle_upgrade(&state, Some(&key_header()), event(UPGRADE_EVENT, user.id)).unwrap();
        assert!(state.db.get_user(user.id).unwrap().upgraded);
    }

    #[test]
    fn other_events_are_ignored() {
        let (_dir, state) = testing::state();
        let user = state.db.create_user("a@x.com", "hash").unwrap();

        handle_upgrade(&state, Some(&key_header()), event("user.payment_failed", user.id))
            .unwrap();
        assert!(!state.db.get_user(user.id).unwrap().upgraded);
    }

    #[test]
    fn wrong_key_is_rejected_before_any_change() {
        let (_dir, state) = testing::state();
        let user = state.db.create_user("a@x.com", "hash").unwrap();

        assert!(matches!(
            handle_upgrade(&state, Some("ApiKey nope"), event(UPGRADE_EVENT, user.id)),
            Err(ApiError::Unauthorized(AuthError::BadServiceKey))
        ));
        assert!(!state.db.get_user(user.id).unwrap().upgraded);
    }

    #[test]
    fn unknown_user_is_not_found() {
        let (_dir, state) = testing::state();
        assert!(matches!(
            handle_upgrade(&state, Some(&key_header()), event(UPGRADE_EVENT, 9)),
            Err(ApiError::NotFound(_))
        ));
    }
}
