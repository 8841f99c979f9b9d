use tracing::info;

use chirpy_db::StoreError;
use chirpy_types::api::{CreateChirpRequest, ListChirpsQuery};
use chirpy_types::models::Chirp;

use crate::auth::AppStateInner;
use crate::error::{ApiError, AuthError};
use crate::guard::{authenticate, check_owner};

pub const MAX_CHIRP_CHARS: usize = 140;

const PROFANE_WORDS: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];
const MASK: &str = "****";

/// Replace profane words with a mask. Words are split on single spaces so
/// the input spacing survives.
pub fn clean_body(body: &str) -> String {
    body.split(' ')
        .map(|word| {
            if PROFANE_WORDS.iter().any(|bad| word.eq_ignore_ascii_case(bad)) {
                MASK
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_body(body: &str) -> Result<String, ApiError> {
    if body.trim().is_empty() {
        return Err(ApiError::validation("chirp is empty"));
    }
    if body.chars().count() > MAX_CHIRP_CHARS {
        return Err(ApiError::validation("chirp is too long"));
    }
    Ok(clean_body(body))
}

pub fn create_chirp(
    state: &AppStateInner,
    header: Option<&str>,
    req: CreateChirpRequest,
) -> Result<Chirp, ApiError> {
    let author_id = authenticate(&state.tokens, header)?;
    let body = validate_body(&req.body)?;

    let chirp = state
        .db
        .create_chirp(&body, author_id)
        .map_err(|e| match e {
            StoreError::NotFound { .. } => ApiError::Unauthorized(AuthError::UnknownToken),
            other => other.into(),
        })?;

    info!("User {} posted chirp {}", author_id, chirp.id);
    Ok(chirp)
}

pub fn list_chirps(state: &AppStateInner, query: ListChirpsQuery) -> Result<Vec<Chirp>, ApiError> {
    let order = query.sort.unwrap_or_default();
    Ok(state.db.list_chirps(query.author_id, order)?)
}

pub fn get_chirp(state: &AppStateInner, id: u64) -> Result<Chirp, ApiError> {
    Ok(state.db.get_chirp(id)?)
}

/// Delete a chirp as its author. The store re-checks ownership under its
/// write lock.
pub fn delete_chirp(state: &AppStateInner, header: Option<&str>, id: u64) -> Result<(), ApiError> {
    let user_id = authenticate(&state.tokens, header)?;
    let chirp = state.db.get_chirp(id)?;
    check_owner(user_id, chirp.author_id)?;

    state.db.delete_chirp(id, user_id)?;
    info!("User {} deleted chirp {}", user_id, id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use chirpy_types::api::{LoginRequest, SignupRequest};
    use chirpy_types::models::SortOrder;

    use super::*;
    use crate::auth::{login, signup};
    use crate::testing::{self, bearer};

    fn session(state: &AppStateInner, email: &str) -> (u64, String) {
        let user = signup(
            state,
            SignupRequest {
                email: email.to_string(),
                password: "pw1".to_string(),
            },
        )
        .unwrap();
        let session = login(
            state,
            LoginRequest {
                email: email.to_string(),
                password: "pw1".to_string(),
                expires_in_seconds: None,
            },
        )
        .unwrap();
        (user.id, bearer(&session.token))
    }

    fn post(body: &str) -> CreateChirpRequest {
        CreateChirpRequest {
            body: body.to_string(),
        }
    }

    #[test]
    fn create_list_delete_scenario() {
        let (_dir, state) = testing::state();
        let (author, header) = session(&state, "a@x.com");
        let (_, other_header) = session(&state, "b@x.com");

        let chirp = create_chirp(&state, Some(&header), post("hello world")).unwrap();

        let listed = list_chirps(&state, ListChirpsQuery::default()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, 1);
        assert_eq!(listed[0].author_id, author);

        assert!(matches!(
            delete_chirp(&state, Some(&other_header), chirp.id),
            Err(ApiError::Forbidden)
        ));
        assert_eq!(get_chirp(&state, chirp.id).unwrap(), chirp);

        delete_chirp(&state, Some(&header), chirp.id).unwrap();
        assert!(list_chirps(&state, ListChirpsQuery::default())
            .unwrap()
            .is_empty());
        assert!(matches!(
            delete_chirp(&state, Some(&header), chirp.id),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn create_requires_session() {
        let (_dir, state) = testing::state();
        assert!(matches!(
            create_chirp(&state, None, post("hi")),
            Err(ApiError::Unauthorized(AuthError::Missing))
        ));
        assert!(matches!(
            create_chirp(&state, Some("Bearer forged"), post("hi")),
            Err(ApiError::Unauthorized(AuthError::Malformed))
        ));
    }

    #[test]
    fn token_for_missing_user_is_rejected() {
        let (_dir, state) = testing::state();
        let header = bearer(&state.tokens.issue(99, None).unwrap());

        assert!(matches!(
            create_chirp(&state, Some(&header), post("hi")),
            Err(ApiError::Unauthorized(AuthError::UnknownToken))
        ));
    }

    #[test]
    fn body_length_counts_characters() {
        assert!(validate_body(&"a".repeat(MAX_CHIRP_CHARS)).is_ok());
        assert!(validate_body(&"é".repeat(MAX_CHIRP_CHARS)).is_ok());
        assert!(matches!(
            validate_body(&"a".repeat(MAX_CHIRP_CHARS + 1)),
            Err(ApiError::Validation(_))
        ));
        assert!(validate_body("   ").is_err());
    }

    #[test]
    fn profanity_is_masked() {
        assert_eq!(
            clean_body("This is a Kerfuffle opinion I need to share with the world"),
            "This is a **** opinion I need to share with the world"
        );
        assert_eq!(clean_body("sharbert! fornax"), "sharbert! ****");
    }

    #[test]
    fn list_filters_by_author_and_sorts() {
        let (_dir, state) = testing::state();
        let (a, a_header) = session(&state, "a@x.com");
        let (_, b_header) = session(&state, "b@x.com");
        create_chirp(&state, Some(&a_header), post("a1")).unwrap();
        create_chirp(&state, Some(&b_header), post("b1")).unwrap();
        create_chirp(&state, Some(&a_header), post("a2")).unwrap();

        let default_order: Vec<u64> = list_chirps(&state, ListChirpsQuery::default())
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(default_order, vec![3, 2, 1]);

        let query = ListChirpsQuery {
            author_id: Some(a),
            sort: Some(SortOrder::Asc),
        };
        let bodies: Vec<String> = list_chirps(&state, query)
            .unwrap()
            .into_iter()
            .map(|c| c.body)
            .collect();
        assert_eq!(bodies, vec!["a1", "a2"]);
    }
}
