use chrono::{Duration, Utc};
use rand::Rng;

use crate::auth::{self, AuthenticatedUser};
use crate::domain::types::{ImageUrl, UserId, VerificationMethod};
use crate::domain::user::User;
use crate::forms::auth::{
    ForgotPasswordFormPayload, LoginFormPayload, ProfileUpdateFormPayload, RegisterFormPayload,
    ResetPasswordFormPayload,
};
use crate::repository::{UserReader, UserWriter};

use super::{ServiceError, ServiceResult};

/// Validity window for password-reset tokens.
const RESET_TOKEN_HOURS: i64 = 2;

/// Result of a successful registration: the stored user plus the verification
/// code that must reach the chosen contact.
#[derive(Debug, Clone)]
pub struct RegistrationOutcome {
    pub user: User,
    pub code: String,
    pub contact: String,
    pub method: VerificationMethod,
}

/// Six-digit verification code.
pub fn generate_verification_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

fn generate_reset_token() -> String {
    let mut rng = rand::thread_rng();
    (0..32)
        .map(|_| format!("{:x}", rng.gen_range(0..16)))
        .collect()
}

/// Simple arithmetic challenge presented on the login form; the expected
/// answer lives in the visitor's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MathChallenge {
    pub a: i32,
    pub b: i32,
}

impl MathChallenge {
    pub fn question(&self) -> String {
        format!("What is {} + {}?", self.a, self.b)
    }

    pub fn answer(&self) -> i32 {
        self.a + self.b
    }
}

/// Fresh login challenge.
pub fn new_login_challenge() -> MathChallenge {
    let mut rng = rand::thread_rng();
    MathChallenge {
        a: rng.gen_range(1..=9),
        b: rng.gen_range(1..=9),
    }
}

pub fn register_user<R>(payload: RegisterFormPayload, repo: &R) -> ServiceResult<RegistrationOutcome>
where
    R: UserReader + UserWriter,
{
    match repo.get_user_by_email(&payload.email) {
        Ok(Some(_)) => {
            return Err(ServiceError::Form(
                "An account with this email already exists.".to_string(),
            ));
        }
        Ok(None) => {}
        Err(e) => {
            log::error!("Failed to check for existing user: {e}");
            return Err(ServiceError::Internal);
        }
    }

    let password_hash = auth::hash_password(&payload.password).map_err(|e| {
        log::error!("Failed to hash password: {e}");
        ServiceError::Internal
    })?;

    let contact = payload.verification_contact();
    let method = payload.verification_method;
    let new_user = payload.into_new_user(password_hash);

    let user = match repo.create_user(&new_user) {
        Ok(user) => user,
        Err(e) => {
            log::error!("Failed to create user: {e}");
            return Err(ServiceError::Internal);
        }
    };

    Ok(RegistrationOutcome {
        user,
        code: generate_verification_code(),
        contact,
        method,
    })
}

pub fn login<R>(payload: &LoginFormPayload, repo: &R) -> ServiceResult<AuthenticatedUser>
where
    R: UserReader,
{
    let user = match repo.get_user_by_email(&payload.email) {
        Ok(Some(user)) => user,
        Ok(None) => {
            return Err(ServiceError::Form(
                "Invalid email or password.".to_string(),
            ));
        }
        Err(e) => {
            log::error!("Failed to look up user: {e}");
            return Err(ServiceError::Internal);
        }
    };

    if !user.is_active {
        return Err(ServiceError::Form(
            "This account has been deactivated.".to_string(),
        ));
    }

    if !auth::verify_password(&payload.password, &user.password_hash) {
        return Err(ServiceError::Form(
            "Invalid email or password.".to_string(),
        ));
    }

    Ok(AuthenticatedUser::from_user(&user))
}

/// Compare the submitted code with the session's expected code and mark the
/// user verified on match.
pub fn verify_registration<R>(
    user_id: UserId,
    submitted: &str,
    expected: &str,
    repo: &R,
) -> ServiceResult<bool>
where
    R: UserReader + UserWriter,
{
    if submitted != expected {
        return Ok(false);
    }

    match repo.get_user_by_id(user_id) {
        Ok(Some(_)) => {}
        Ok(None) => return Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get user: {e}");
            return Err(ServiceError::Internal);
        }
    }

    match repo.set_user_verified(user_id, true) {
        Ok(_) => Ok(true),
        Err(e) => {
            log::error!("Failed to mark user verified: {e}");
            Err(ServiceError::Internal)
        }
    }
}

/// Issue a password-reset token.
///
/// Returns `None` for unknown emails so routes can answer identically either
/// way and avoid account enumeration.
pub fn start_password_reset<R>(
    payload: ForgotPasswordFormPayload,
    repo: &R,
) -> ServiceResult<Option<(User, String)>>
where
    R: UserReader + UserWriter,
{
    let user = match repo.get_user_by_email(&payload.email) {
        Ok(Some(user)) => user,
        Ok(None) => return Ok(None),
        Err(e) => {
            log::error!("Failed to look up user: {e}");
            return Err(ServiceError::Internal);
        }
    };

    let token = generate_reset_token();
    let expires = Utc::now().naive_utc() + Duration::hours(RESET_TOKEN_HOURS);

    match repo.set_reset_token(user.id, Some((&token, expires))) {
        Ok(_) => Ok(Some((user, token))),
        Err(e) => {
            log::error!("Failed to store reset token: {e}");
            Err(ServiceError::Internal)
        }
    }
}

/// Consume a reset token and store the new password hash.
pub fn reset_password<R>(
    token: &str,
    payload: ResetPasswordFormPayload,
    repo: &R,
) -> ServiceResult<bool>
where
    R: UserReader + UserWriter,
{
    let user = match repo.get_user_by_reset_token(token) {
        Ok(Some(user)) => user,
        Ok(None) => return Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to look up reset token: {e}");
            return Err(ServiceError::Internal);
        }
    };

    let expired = user
        .reset_token_expires
        .map(|expires| expires < Utc::now().naive_utc())
        .unwrap_or(true);
    if expired {
        return Err(ServiceError::Form(
            "This password reset link has expired.".to_string(),
        ));
    }

    let password_hash = auth::hash_password(&payload.password).map_err(|e| {
        log::error!("Failed to hash password: {e}");
        ServiceError::Internal
    })?;

    // set_user_password also clears the token, making the link single-use.
    match repo.set_user_password(user.id, &password_hash) {
        Ok(_) => Ok(true),
        Err(e) => {
            log::error!("Failed to update password: {e}");
            Err(ServiceError::Internal)
        }
    }
}

/// Apply profile edits; `new_pic` replaces the stored picture when present.
pub fn update_profile<R>(
    payload: ProfileUpdateFormPayload,
    user: &AuthenticatedUser,
    new_pic: Option<ImageUrl>,
    repo: &R,
) -> ServiceResult<bool>
where
    R: UserReader + UserWriter,
{
    let user_id = user.user_id().map_err(|e| {
        log::error!("Invalid user id in session claims: {e}");
        ServiceError::Internal
    })?;

    let stored = match repo.get_user_by_id(user_id) {
        Ok(Some(stored)) => stored,
        Ok(None) => return Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get user: {e}");
            return Err(ServiceError::Internal);
        }
    };

    let profile_pic = new_pic.or(stored.profile_pic_url);
    match repo.update_user_profile(user_id, &payload.into_profile_update(profile_pic)) {
        Ok(_) => Ok(true),
        Err(e) => {
            log::error!("Failed to update profile: {e}");
            Ok(false)
        }
    }
}

/// Load the full profile of the signed-in user.
pub fn current_profile<R>(user: &AuthenticatedUser, repo: &R) -> ServiceResult<User>
where
    R: UserReader,
{
    let user_id = user.user_id().map_err(|e| {
        log::error!("Invalid user id in session claims: {e}");
        ServiceError::Internal
    })?;

    match repo.get_user_by_id(user_id) {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get user: {e}");
            Err(ServiceError::Internal)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{
        CityName, DistrictName, EmailAddress, PhoneNumber, StreetAddress, UserName, UserRole,
    };
    use crate::repository::test::TestRepository;
    use chrono::DateTime;

    fn sample_user(password: &str) -> User {
        let at = DateTime::from_timestamp(0, 0).unwrap().naive_utc();
        User {
            id: UserId::new(1).unwrap(),
            name: UserName::new("Alice").unwrap(),
            email: EmailAddress::new("alice@example.com").unwrap(),
            phone: Some(PhoneNumber::new("555-1234").unwrap()),
            password_hash: auth::hash_password(password).unwrap(),
            street_house: StreetAddress::new("1 Main St").unwrap(),
            city: CityName::new("Springfield").unwrap(),
            district: DistrictName::new("Center").unwrap(),
            profile_pic_url: None,
            role: UserRole::Customer,
            is_verified: true,
            is_active: true,
            reset_token: None,
            reset_token_expires: None,
            created_at: at,
            updated_at: at,
        }
    }

    fn register_payload() -> RegisterFormPayload {
        RegisterFormPayload {
            name: UserName::new("Bob").unwrap(),
            email: EmailAddress::new("bob@example.com").unwrap(),
            phone: None,
            password: "hunter2hunter2".to_string(),
            street_house: StreetAddress::new("2 Side St").unwrap(),
            city: CityName::new("Springfield").unwrap(),
            district: DistrictName::new("South").unwrap(),
            role: UserRole::Customer,
            verification_method: VerificationMethod::Email,
        }
    }

    #[test]
    fn registration_rejects_duplicate_email() {
        let repo = TestRepository::new().with_users(vec![sample_user("pw")]);
        let mut payload = register_payload();
        payload.email = EmailAddress::new("alice@example.com").unwrap();

        let err = register_user(payload, &repo).unwrap_err();
        assert!(matches!(err, ServiceError::Form(_)));
    }

    #[test]
    fn registration_returns_code_for_email_contact() {
        let repo = TestRepository::new();
        let outcome = register_user(register_payload(), &repo).unwrap();
        assert_eq!(outcome.contact, "bob@example.com");
        assert_eq!(outcome.code.len(), 6);
        assert!(outcome.code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn login_rejects_wrong_password() {
        let repo = TestRepository::new().with_users(vec![sample_user("right-password")]);
        let payload = LoginFormPayload {
            email: EmailAddress::new("alice@example.com").unwrap(),
            password: "wrong-password".to_string(),
            captcha_answer: 0,
        };

        let err = login(&payload, &repo).unwrap_err();
        assert!(matches!(err, ServiceError::Form(_)));
    }

    #[test]
    fn login_rejects_deactivated_accounts() {
        let mut user = sample_user("right-password");
        user.is_active = false;
        let repo = TestRepository::new().with_users(vec![user]);
        let payload = LoginFormPayload {
            email: EmailAddress::new("alice@example.com").unwrap(),
            password: "right-password".to_string(),
            captcha_answer: 0,
        };

        let err = login(&payload, &repo).unwrap_err();
        assert_eq!(
            err,
            ServiceError::Form("This account has been deactivated.".to_string())
        );
    }

    #[test]
    fn login_returns_claims_for_valid_credentials() {
        let repo = TestRepository::new().with_users(vec![sample_user("right-password")]);
        let payload = LoginFormPayload {
            email: EmailAddress::new("alice@example.com").unwrap(),
            password: "right-password".to_string(),
            captcha_answer: 0,
        };

        let claims = login(&payload, &repo).unwrap();
        assert_eq!(claims.sub, 1);
        assert_eq!(claims.role, "customer");
    }

    #[test]
    fn verification_compares_codes() {
        let repo = TestRepository::new().with_users(vec![sample_user("pw")]);
        let id = UserId::new(1).unwrap();
        assert!(verify_registration(id, "123456", "123456", &repo).unwrap());
        assert!(!verify_registration(id, "000000", "123456", &repo).unwrap());
    }

    #[test]
    fn expired_reset_tokens_are_rejected() {
        let mut user = sample_user("pw");
        user.reset_token = Some("token".to_string());
        user.reset_token_expires =
            Some(Utc::now().naive_utc() - Duration::hours(1));
        let repo = TestRepository::new().with_users(vec![user]);

        let err = reset_password(
            "token",
            ResetPasswordFormPayload {
                password: "new-password".to_string(),
            },
            &repo,
        )
        .unwrap_err();
        assert!(matches!(err, ServiceError::Form(_)));
    }

    #[test]
    fn unknown_reset_tokens_are_not_found() {
        let repo = TestRepository::new();
        let err = reset_password(
            "missing",
            ResetPasswordFormPayload {
                password: "new-password".to_string(),
            },
            &repo,
        )
        .unwrap_err();
        assert_eq!(err, ServiceError::NotFound);
    }

    #[test]
    fn math_challenge_answer_matches_question() {
        let challenge = new_login_challenge();
        assert_eq!(challenge.answer(), challenge.a + challenge.b);
        assert!(challenge.question().contains('+'));
    }

    #[test]
    fn password_reset_is_silent_for_unknown_emails() {
        let repo = TestRepository::new();
        let outcome = start_password_reset(
            ForgotPasswordFormPayload {
                email: EmailAddress::new("nobody@example.com").unwrap(),
            },
            &repo,
        )
        .unwrap();
        assert!(outcome.is_none());
    }
}
