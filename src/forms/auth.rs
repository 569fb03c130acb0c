use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::types::{
    CityName, DistrictName, EmailAddress, ImageUrl, PhoneNumber, StreetAddress,
    TypeConstraintError, UserName, UserRole, VerificationMethod,
};
use crate::domain::user::{NewUser, UserProfileUpdate};
use crate::forms::normalize_optional;

#[derive(Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(length(min = 1))]
    pub street_house: String,
    #[validate(length(min = 1))]
    pub city: String,
    #[validate(length(min = 1))]
    pub district: String,
    pub role: Option<String>,
    pub verification_method: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegisterFormPayload {
    pub name: UserName,
    pub email: EmailAddress,
    pub phone: Option<PhoneNumber>,
    pub password: String,
    pub street_house: StreetAddress,
    pub city: CityName,
    pub district: DistrictName,
    pub role: UserRole,
    pub verification_method: VerificationMethod,
}

impl RegisterFormPayload {
    /// The contact the verification code must be delivered to.
    pub fn verification_contact(&self) -> String {
        match self.verification_method {
            VerificationMethod::Email => self.email.as_str().to_string(),
            VerificationMethod::Phone => self
                .phone
                .as_ref()
                .map(|p| p.as_str().to_string())
                .unwrap_or_default(),
        }
    }

    pub fn into_new_user(self, password_hash: String) -> NewUser {
        let now = Utc::now().naive_utc();
        NewUser {
            name: self.name,
            email: self.email,
            phone: self.phone,
            password_hash,
            street_house: self.street_house,
            city: self.city,
            district: self.district,
            role: self.role,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Error)]
pub enum RegisterFormError {
    #[error("Registration form validation failed: {0}")]
    Validation(String),
    #[error("Registration form contains invalid data: {0}")]
    TypeConstraint(String),
    #[error("Administrator accounts cannot be self-registered")]
    AdminRoleForbidden,
    #[error("Phone verification requires a phone number")]
    MissingPhone,
}

impl From<ValidationErrors> for RegisterFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<TypeConstraintError> for RegisterFormError {
    fn from(value: TypeConstraintError) -> Self {
        Self::TypeConstraint(value.to_string())
    }
}

impl TryFrom<RegisterForm> for RegisterFormPayload {
    type Error = RegisterFormError;

    fn try_from(value: RegisterForm) -> Result<Self, Self::Error> {
        value.validate()?;

        let role = match value.role.as_deref() {
            None | Some("") => UserRole::Customer,
            Some(raw) => {
                let role = UserRole::try_from(raw)?;
                if role == UserRole::Admin {
                    return Err(RegisterFormError::AdminRoleForbidden);
                }
                role
            }
        };

        let verification_method = match value.verification_method.as_deref() {
            None | Some("") => VerificationMethod::Email,
            Some(raw) => VerificationMethod::try_from(raw)?,
        };

        let phone = normalize_optional(value.phone)
            .map(PhoneNumber::new)
            .transpose()?;
        if verification_method == VerificationMethod::Phone && phone.is_none() {
            return Err(RegisterFormError::MissingPhone);
        }

        Ok(Self {
            name: UserName::new(value.name)?,
            email: EmailAddress::new(value.email)?,
            phone,
            password: value.password,
            street_house: StreetAddress::new(value.street_house)?,
            city: CityName::new(value.city)?,
            district: DistrictName::new(value.district)?,
            role,
            verification_method,
        })
    }
}

#[derive(Deserialize, Validate)]
pub struct LoginForm {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
    pub captcha_answer: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoginFormPayload {
    pub email: EmailAddress,
    pub password: String,
    pub captcha_answer: i32,
}

#[derive(Debug, Error)]
pub enum LoginFormError {
    #[error("Login form validation failed: {0}")]
    Validation(String),
    #[error("Login form contains invalid data: {0}")]
    TypeConstraint(String),
}

impl From<ValidationErrors> for LoginFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<TypeConstraintError> for LoginFormError {
    fn from(value: TypeConstraintError) -> Self {
        Self::TypeConstraint(value.to_string())
    }
}

impl TryFrom<LoginForm> for LoginFormPayload {
    type Error = LoginFormError;

    fn try_from(value: LoginForm) -> Result<Self, Self::Error> {
        value.validate()?;
        Ok(Self {
            email: EmailAddress::new(value.email)?,
            password: value.password,
            captcha_answer: value.captcha_answer,
        })
    }
}

#[derive(Deserialize, Validate)]
pub struct VerifyForm {
    #[validate(length(min = 1))]
    pub code: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerifyFormPayload {
    pub code: String,
}

#[derive(Debug, Error)]
pub enum VerifyFormError {
    #[error("Verification form validation failed: {0}")]
    Validation(String),
}

impl From<ValidationErrors> for VerifyFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl TryFrom<VerifyForm> for VerifyFormPayload {
    type Error = VerifyFormError;

    fn try_from(value: VerifyForm) -> Result<Self, Self::Error> {
        value.validate()?;
        Ok(Self {
            code: value.code.trim().to_string(),
        })
    }
}

#[derive(Deserialize, Validate)]
pub struct ForgotPasswordForm {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForgotPasswordFormPayload {
    pub email: EmailAddress,
}

#[derive(Debug, Error)]
pub enum ForgotPasswordFormError {
    #[error("Forgot password form validation failed: {0}")]
    Validation(String),
    #[error("Forgot password form contains invalid data: {0}")]
    TypeConstraint(String),
}

impl From<ValidationErrors> for ForgotPasswordFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<TypeConstraintError> for ForgotPasswordFormError {
    fn from(value: TypeConstraintError) -> Self {
        Self::TypeConstraint(value.to_string())
    }
}

impl TryFrom<ForgotPasswordForm> for ForgotPasswordFormPayload {
    type Error = ForgotPasswordFormError;

    fn try_from(value: ForgotPasswordForm) -> Result<Self, Self::Error> {
        value.validate()?;
        Ok(Self {
            email: EmailAddress::new(value.email)?,
        })
    }
}

#[derive(Deserialize, Validate)]
pub struct ResetPasswordForm {
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(length(min = 8))]
    pub password_confirm: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResetPasswordFormPayload {
    pub password: String,
}

#[derive(Debug, Error)]
pub enum ResetPasswordFormError {
    #[error("Reset password form validation failed: {0}")]
    Validation(String),
    #[error("Passwords do not match")]
    Mismatch,
}

impl From<ValidationErrors> for ResetPasswordFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl TryFrom<ResetPasswordForm> for ResetPasswordFormPayload {
    type Error = ResetPasswordFormError;

    fn try_from(value: ResetPasswordForm) -> Result<Self, Self::Error> {
        value.validate()?;
        if value.password != value.password_confirm {
            return Err(ResetPasswordFormError::Mismatch);
        }
        Ok(Self {
            password: value.password,
        })
    }
}

#[derive(Deserialize, Validate)]
pub struct ProfileUpdateForm {
    #[validate(length(min = 1))]
    pub name: String,
    pub phone: Option<String>,
    #[validate(length(min = 1))]
    pub street_house: String,
    #[validate(length(min = 1))]
    pub city: String,
    #[validate(length(min = 1))]
    pub district: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileUpdateFormPayload {
    pub name: UserName,
    pub phone: Option<PhoneNumber>,
    pub street_house: StreetAddress,
    pub city: CityName,
    pub district: DistrictName,
}

impl ProfileUpdateFormPayload {
    pub fn into_profile_update(self, profile_pic_url: Option<ImageUrl>) -> UserProfileUpdate {
        UserProfileUpdate {
            name: self.name,
            phone: self.phone,
            street_house: self.street_house,
            city: self.city,
            district: self.district,
            profile_pic_url,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProfileUpdateFormError {
    #[error("Profile form validation failed: {0}")]
    Validation(String),
    #[error("Profile form contains invalid data: {0}")]
    TypeConstraint(String),
}

impl From<ValidationErrors> for ProfileUpdateFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<TypeConstraintError> for ProfileUpdateFormError {
    fn from(value: TypeConstraintError) -> Self {
        Self::TypeConstraint(value.to_string())
    }
}

impl TryFrom<ProfileUpdateForm> for ProfileUpdateFormPayload {
    type Error = ProfileUpdateFormError;

    fn try_from(value: ProfileUpdateForm) -> Result<Self, Self::Error> {
        value.validate()?;
        Ok(Self {
            name: UserName::new(value.name)?,
            phone: normalize_optional(value.phone)
                .map(PhoneNumber::new)
                .transpose()?,
            street_house: StreetAddress::new(value.street_house)?,
            city: CityName::new(value.city)?,
            district: DistrictName::new(value.district)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_form() -> RegisterForm {
        RegisterForm {
            name: "Alice".to_string(),
            email: "Alice@Example.com".to_string(),
            phone: Some("".to_string()),
            password: "hunter2hunter2".to_string(),
            street_house: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            district: "Center".to_string(),
            role: None,
            verification_method: None,
        }
    }

    #[test]
    fn register_defaults_to_customer_with_email_verification() {
        let payload: RegisterFormPayload = register_form().try_into().unwrap();
        assert_eq!(payload.role, UserRole::Customer);
        assert_eq!(payload.verification_method, VerificationMethod::Email);
        assert_eq!(payload.email.as_str(), "alice@example.com");
        assert!(payload.phone.is_none());
    }

    #[test]
    fn register_rejects_admin_role() {
        let mut form = register_form();
        form.role = Some("admin".to_string());
        let err = RegisterFormPayload::try_from(form).unwrap_err();
        assert!(matches!(err, RegisterFormError::AdminRoleForbidden));
    }

    #[test]
    fn phone_verification_requires_phone() {
        let mut form = register_form();
        form.verification_method = Some("phone".to_string());
        let err = RegisterFormPayload::try_from(form).unwrap_err();
        assert!(matches!(err, RegisterFormError::MissingPhone));
    }

    #[test]
    fn short_passwords_fail_validation() {
        let mut form = register_form();
        form.password = "short".to_string();
        assert!(RegisterFormPayload::try_from(form).is_err());
    }

    #[test]
    fn reset_password_requires_matching_confirmation() {
        let form = ResetPasswordForm {
            password: "new-password".to_string(),
            password_confirm: "other-password".to_string(),
        };
        let err = ResetPasswordFormPayload::try_from(form).unwrap_err();
        assert!(matches!(err, ResetPasswordFormError::Mismatch));
    }
}
