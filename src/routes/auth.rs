use actix_identity::Identity;
use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use actix_session::Session;
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use tera::Tera;

use crate::auth::AuthenticatedUser;
use crate::domain::types::UserRole;
use crate::forms::auth::{
    ForgotPasswordForm, ForgotPasswordFormPayload, LoginForm, LoginFormPayload, ProfileUpdateForm,
    ProfileUpdateFormPayload, RegisterForm, RegisterFormPayload, ResetPasswordForm,
    ResetPasswordFormPayload, VerifyForm, VerifyFormPayload,
};
use crate::media::MediaClient;
use crate::repository::DieselRepository;
use crate::routes::{base_context, is_ajax, read_temp_file, redirect, render_template};
use crate::services::auth::{
    current_profile as current_profile_service, login as login_service, new_login_challenge,
    register_user as register_user_service, reset_password as reset_password_service,
    start_password_reset as start_password_reset_service,
    update_profile as update_profile_service, verify_registration as verify_registration_service,
};
use crate::services::ServiceError;

const SESSION_CAPTCHA_ANSWER: &str = "captcha_answer";
const SESSION_REG_USER_ID: &str = "reg_user_id";
const SESSION_REG_CODE: &str = "reg_code";
const SESSION_REG_CONTACT: &str = "reg_contact";
const SESSION_REG_METHOD: &str = "reg_method";

fn post_login_target(user: &AuthenticatedUser) -> &'static str {
    match user.parsed_role() {
        Some(UserRole::Admin) => "/admin/dashboard",
        Some(UserRole::BusinessOwner) => "/owner/dashboard",
        _ => "/",
    }
}

#[get("/register")]
pub async fn register_page(
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let context = base_context(&flash_messages, None, "register");
    render_template(&tera, "auth/register.html", &context)
}

#[post("/register")]
pub async fn register(
    session: Session,
    repo: web::Data<DieselRepository>,
    web::Form(form): web::Form<RegisterForm>,
) -> impl Responder {
    let payload: RegisterFormPayload = match form.try_into() {
        Ok(payload) => payload,
        Err(e) => {
            FlashMessage::error(e.to_string()).send();
            return redirect("/register");
        }
    };

    match register_user_service(payload, repo.get_ref()) {
        Ok(outcome) => {
            let stored = session
                .insert(SESSION_REG_USER_ID, outcome.user.id.get())
                .and_then(|_| session.insert(SESSION_REG_CODE, outcome.code.clone()))
                .and_then(|_| session.insert(SESSION_REG_CONTACT, outcome.contact.clone()))
                .and_then(|_| session.insert(SESSION_REG_METHOD, outcome.method.as_str()));
            if stored.is_err() {
                log::error!("Failed to store verification state in session");
                return HttpResponse::InternalServerError().finish();
            }

            log::info!(
                "[VERIFICATION] To: {}, Code: {}",
                outcome.contact,
                outcome.code
            );
            FlashMessage::success(format!(
                "Registration successful! Verification code sent to your {}: {}",
                outcome.method, outcome.code
            ))
            .send();
            redirect("/verify")
        }
        Err(ServiceError::Form(message)) => {
            FlashMessage::error(message).send();
            redirect("/register")
        }
        Err(err) => {
            log::error!("Failed to register user: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/verify")]
pub async fn verify_page(
    session: Session,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let contact = session
        .get::<String>(SESSION_REG_CONTACT)
        .ok()
        .flatten();
    let Some(contact) = contact else {
        FlashMessage::warning("No verification pending.").send();
        return redirect("/register");
    };

    let mut context = base_context(&flash_messages, None, "verify");
    context.insert("contact", &contact);
    render_template(&tera, "auth/verify.html", &context)
}

#[post("/verify")]
pub async fn verify(
    session: Session,
    repo: web::Data<DieselRepository>,
    web::Form(form): web::Form<VerifyForm>,
) -> impl Responder {
    let payload: VerifyFormPayload = match form.try_into() {
        Ok(payload) => payload,
        Err(e) => {
            FlashMessage::error(e.to_string()).send();
            return redirect("/verify");
        }
    };

    let user_id = session.get::<i32>(SESSION_REG_USER_ID).ok().flatten();
    let expected = session.get::<String>(SESSION_REG_CODE).ok().flatten();
    let (Some(user_id), Some(expected)) = (user_id, expected) else {
        FlashMessage::warning("No verification pending.").send();
        return redirect("/register");
    };
    let user_id = match user_id.try_into() {
        Ok(user_id) => user_id,
        Err(_) => {
            FlashMessage::warning("No verification pending.").send();
            return redirect("/register");
        }
    };

    match verify_registration_service(user_id, &payload.code, &expected, repo.get_ref()) {
        Ok(true) => {
            session.remove(SESSION_REG_USER_ID);
            session.remove(SESSION_REG_CODE);
            session.remove(SESSION_REG_CONTACT);
            session.remove(SESSION_REG_METHOD);
            FlashMessage::success("Your account is verified. You can log in now.").send();
            redirect("/login")
        }
        Ok(false) => {
            FlashMessage::error("Incorrect verification code.").send();
            redirect("/verify")
        }
        Err(ServiceError::NotFound) => {
            FlashMessage::error("Account not found.").send();
            redirect("/register")
        }
        Err(err) => {
            log::error!("Failed to verify registration: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/login")]
pub async fn login_page(
    session: Session,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let challenge = new_login_challenge();
    if session
        .insert(SESSION_CAPTCHA_ANSWER, challenge.answer())
        .is_err()
    {
        log::error!("Failed to store captcha answer in session");
        return HttpResponse::InternalServerError().finish();
    }

    let mut context = base_context(&flash_messages, None, "login");
    context.insert("captcha_question", &challenge.question());
    render_template(&tera, "auth/login.html", &context)
}

#[post("/login")]
pub async fn login(
    request: HttpRequest,
    session: Session,
    repo: web::Data<DieselRepository>,
    web::Form(form): web::Form<LoginForm>,
) -> impl Responder {
    let payload: LoginFormPayload = match form.try_into() {
        Ok(payload) => payload,
        Err(e) => {
            FlashMessage::error(e.to_string()).send();
            return redirect("/login");
        }
    };

    let expected = session.get::<i32>(SESSION_CAPTCHA_ANSWER).ok().flatten();
    session.remove(SESSION_CAPTCHA_ANSWER);
    if expected != Some(payload.captcha_answer) {
        FlashMessage::error("Captcha answer is incorrect.").send();
        return redirect("/login");
    }

    match login_service(&payload, repo.get_ref()) {
        Ok(claims) => {
            if let Err(e) = claims.login(&request) {
                log::error!("Failed to establish session: {e}");
                return HttpResponse::InternalServerError().finish();
            }
            FlashMessage::success(format!("Welcome back, {}!", claims.name)).send();
            redirect(post_login_target(&claims))
        }
        Err(ServiceError::Form(message)) => {
            FlashMessage::error(message).send();
            redirect("/login")
        }
        Err(err) => {
            log::error!("Failed to log user in: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[post("/logout")]
pub async fn logout(identity: Option<Identity>) -> impl Responder {
    if let Some(identity) = identity {
        identity.logout();
    }
    FlashMessage::info("You have been logged out.").send();
    redirect("/")
}

#[get("/forgot")]
pub async fn forgot_page(
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let context = base_context(&flash_messages, None, "forgot");
    render_template(&tera, "auth/forgot.html", &context)
}

#[post("/forgot")]
pub async fn forgot(
    repo: web::Data<DieselRepository>,
    web::Form(form): web::Form<ForgotPasswordForm>,
) -> impl Responder {
    let payload: ForgotPasswordFormPayload = match form.try_into() {
        Ok(payload) => payload,
        Err(e) => {
            FlashMessage::error(e.to_string()).send();
            return redirect("/forgot");
        }
    };

    match start_password_reset_service(payload, repo.get_ref()) {
        Ok(outcome) => {
            if let Some((user, token)) = outcome {
                log::info!("[PASSWORD RESET] To: {}, Link: /reset/{}", user.email, token);
            }
            // Identical flash either way so addresses cannot be probed.
            FlashMessage::info(
                "If an account exists for this email, a reset link has been sent.",
            )
            .send();
            redirect("/login")
        }
        Err(err) => {
            log::error!("Failed to start password reset: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/reset/{token}")]
pub async fn reset_page(
    token: web::Path<String>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let mut context = base_context(&flash_messages, None, "reset");
    context.insert("token", &token.into_inner());
    render_template(&tera, "auth/reset.html", &context)
}

#[post("/reset/{token}")]
pub async fn reset(
    token: web::Path<String>,
    repo: web::Data<DieselRepository>,
    web::Form(form): web::Form<ResetPasswordForm>,
) -> impl Responder {
    let token = token.into_inner();
    let payload: ResetPasswordFormPayload = match form.try_into() {
        Ok(payload) => payload,
        Err(e) => {
            FlashMessage::error(e.to_string()).send();
            return redirect(&format!("/reset/{token}"));
        }
    };

    match reset_password_service(&token, payload, repo.get_ref()) {
        Ok(true) => {
            FlashMessage::success("Password updated. You can log in now.").send();
            redirect("/login")
        }
        Ok(false) => {
            FlashMessage::error("Could not update the password.").send();
            redirect(&format!("/reset/{token}"))
        }
        Err(ServiceError::NotFound) => {
            FlashMessage::error("This reset link is invalid.").send();
            redirect("/forgot")
        }
        Err(ServiceError::Form(message)) => {
            FlashMessage::error(message).send();
            redirect("/forgot")
        }
        Err(err) => {
            log::error!("Failed to reset password: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/profile")]
pub async fn profile_page(
    user: AuthenticatedUser,
    flash_messages: IncomingFlashMessages,
    repo: web::Data<DieselRepository>,
    tera: web::Data<Tera>,
) -> impl Responder {
    match current_profile_service(&user, repo.get_ref()) {
        Ok(profile) => {
            let mut context = base_context(&flash_messages, Some(&user), "profile");
            context.insert("profile", &profile);
            render_template(&tera, "auth/profile.html", &context)
        }
        Err(ServiceError::NotFound) => HttpResponse::NotFound().finish(),
        Err(err) => {
            log::error!("Failed to render profile page: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[derive(MultipartForm)]
pub struct ProfileUpdateMultipartForm {
    pub name: Text<String>,
    pub phone: Option<Text<String>>,
    pub street_house: Text<String>,
    pub city: Text<String>,
    pub district: Text<String>,
    #[multipart(limit = "5MB")]
    pub photo: Option<TempFile>,
}

#[post("/profile/update")]
pub async fn profile_update(
    request: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    media: web::Data<MediaClient>,
    MultipartForm(mut form): MultipartForm<ProfileUpdateMultipartForm>,
) -> impl Responder {
    let plain_form = ProfileUpdateForm {
        name: form.name.to_string(),
        phone: form.phone.as_ref().map(|p| p.to_string()),
        street_house: form.street_house.to_string(),
        city: form.city.to_string(),
        district: form.district.to_string(),
    };
    let payload: ProfileUpdateFormPayload = match plain_form.try_into() {
        Ok(payload) => payload,
        Err(e) => {
            if is_ajax(&request) {
                return HttpResponse::BadRequest()
                    .json(serde_json::json!({ "success": false, "error": e.to_string() }));
            }
            FlashMessage::error(e.to_string()).send();
            return redirect("/profile");
        }
    };

    let mut new_pic = None;
    if let Some(photo) = form.photo.as_mut() {
        if photo.size > 0 {
            let file_name = photo.file_name.clone().unwrap_or_else(|| "photo".to_string());
            let bytes = match read_temp_file(photo) {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::error!("Failed to read uploaded photo: {e}");
                    FlashMessage::error("Could not read the uploaded photo.").send();
                    return redirect("/profile");
                }
            };
            match media.upload_image(bytes, &file_name, "profiles").await {
                Ok(url) => new_pic = Some(url),
                Err(e) => {
                    log::error!("Failed to upload profile photo: {e}");
                    FlashMessage::error("Photo upload failed.").send();
                    return redirect("/profile");
                }
            }
        }
    }

    match update_profile_service(payload, &user, new_pic, repo.get_ref()) {
        Ok(true) => {
            if is_ajax(&request) {
                return HttpResponse::Ok().json(serde_json::json!({ "success": true }));
            }
            FlashMessage::success("Profile updated.").send();
            redirect("/profile")
        }
        Ok(false) => {
            FlashMessage::error("Could not update the profile.").send();
            redirect("/profile")
        }
        Err(ServiceError::NotFound) => HttpResponse::NotFound().finish(),
        Err(err) => {
            log::error!("Failed to update profile: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}
