//! Login, signup, logout and password change
//!
//! Credential failures are reported with one generic message so a visitor
//! cannot tell an unknown account from a wrong password.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use larder_common::Error;
use serde::Deserialize;
use tracing::info;

use super::render;
use crate::session::{session_cookie, CurrentUser, FlashLevel, SessionId};
use crate::{ApiResult, AppState};

pub const LOGIN_OK: &str = "Login successful!";
pub const LOGIN_FAILED: &str = "Invalid email or password.";
pub const EMAIL_TAKEN: &str = "Email already exists.";
pub const SIGNUP_OK: &str = "Signup successful! Please log in.";
pub const LOGGED_OUT: &str = "You have been logged out.";

#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordChange {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

fn credentials_form(action: &str, button: &str) -> String {
    format!(
        r#"<form method="post" action="{action}" class="card">
    <label>Email <input type="email" name="email" required></label>
    <label>Password <input type="password" name="password" required></label>
    <button type="submit">{button}</button>
</form>"#
    )
}

/// GET /
pub async fn login_page(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> Response {
    if state.sessions.user(&session).await.is_some() {
        return Redirect::to("/home").into_response();
    }
    let body = format!(
        r#"<h2>Log in</h2>
{}
<p>No account yet? <a href="/signup">Sign up</a></p>"#,
        credentials_form("/", "Log in")
    );
    render(&state, &session, None, "Log in", &body)
        .await
        .into_response()
}

/// POST /
pub async fn login(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Form(form): Form<Credentials>,
) -> ApiResult<Response> {
    if state.sessions.user(&session).await.is_some() {
        return Ok(Redirect::to("/home").into_response());
    }

    let verified = match state.users.verify(&form.email, &form.password).await {
        Ok(verified) => verified,
        Err(Error::InvalidInput(_)) => false,
        Err(e) => return Err(e.into()),
    };
    if !verified {
        info!("Failed login attempt");
        state
            .sessions
            .flash(&session, FlashLevel::Error, LOGIN_FAILED)
            .await;
        return Ok(Redirect::to("/").into_response());
    }

    let email = larder_common::db::users::normalize_email(&form.email)?;
    let session = state.sessions.login(&session, &email).await;
    state
        .sessions
        .flash(&session, FlashLevel::Success, LOGIN_OK)
        .await;
    info!(email = %email, "Logged in");

    Ok((
        [(header::SET_COOKIE, session_cookie(&session))],
        Redirect::to("/home"),
    )
        .into_response())
}

/// GET /signup
pub async fn signup_page(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> Response {
    let body = format!(
        r#"<h2>Sign up</h2>
{}
<p>Already registered? <a href="/">Log in</a></p>"#,
        credentials_form("/signup", "Create account")
    );
    render(&state, &session, None, "Sign up", &body)
        .await
        .into_response()
}

/// POST /signup
pub async fn signup(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Form(form): Form<Credentials>,
) -> ApiResult<Redirect> {
    match state.users.put(&form.email, &form.password).await {
        Ok(_) => {
            state
                .sessions
                .flash(&session, FlashLevel::Success, SIGNUP_OK)
                .await;
            Ok(Redirect::to("/"))
        }
        Err(Error::Conflict(_)) => {
            state
                .sessions
                .flash(&session, FlashLevel::Error, EMAIL_TAKEN)
                .await;
            Ok(Redirect::to("/signup"))
        }
        Err(Error::InvalidInput(message)) => {
            state
                .sessions
                .flash(&session, FlashLevel::Error, message)
                .await;
            Ok(Redirect::to("/signup"))
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> Redirect {
    state.sessions.logout(&session).await;
    state
        .sessions
        .flash(&session, FlashLevel::Success, LOGGED_OUT)
        .await;
    Redirect::to("/")
}

/// GET /change
pub async fn change_page(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Response {
    let body = r#"<h2>Change password</h2>
<form method="post" action="/change" class="card">
    <label>Current password <input type="password" name="current_password" required></label>
    <label>New password <input type="password" name="new_password" required></label>
    <label>Confirm new password <input type="password" name="confirm_password" required></label>
    <button type="submit">Change password</button>
</form>"#;
    render(&state, &session, Some(&user), "Change password", body)
        .await
        .into_response()
}

/// POST /change
pub async fn change_password(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Form(form): Form<PasswordChange>,
) -> ApiResult<Redirect> {
    let (level, message) = if !state.users.verify(&user, &form.current_password).await? {
        (FlashLevel::Error, "Current password is incorrect.")
    } else if form.new_password.is_empty() {
        (FlashLevel::Error, "New password must not be empty.")
    } else if form.new_password != form.confirm_password {
        (FlashLevel::Error, "New passwords do not match.")
    } else {
        state.users.set_password(&user, &form.new_password).await?;
        (FlashLevel::Success, "Password changed successfully.")
    };

    state.sessions.flash(&session, level, message).await;
    Ok(Redirect::to("/change"))
}
