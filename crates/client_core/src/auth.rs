//! Login, signup and logout flows. A successful flow leaves a persisted
//! [`Session`]; failures never touch the stored session.

use shared::protocol::Credentials;
use tracing::{info, warn};

use crate::{
    error::{AuthError, AuthFlow, GatewayError},
    gateway::ChatGateway,
    session::{Session, SessionStore},
    validation::{validate_login, SignupForm},
};

const CONFLICT: u16 = 409;

fn map_gateway_error(flow: AuthFlow, err: GatewayError) -> AuthError {
    match (flow, err.status()) {
        (AuthFlow::Signup, Some(CONFLICT)) => AuthError::UsernameTaken,
        (AuthFlow::Login, Some(_)) if err.is_client_error() => AuthError::InvalidCredentials,
        (flow, Some(status)) => AuthError::Rejected { flow, status },
        (_, None) => AuthError::Unavailable(err),
    }
}

pub async fn login(
    gateway: &dyn ChatGateway,
    sessions: &dyn SessionStore,
    credentials: Credentials,
) -> Result<Session, AuthError> {
    validate_login(&credentials)?;
    let response = gateway.login(&credentials).await.map_err(|err| {
        warn!(username = %credentials.username, "auth: login failed: {err}");
        map_gateway_error(AuthFlow::Login, err)
    })?;

    let session = Session::from(response);
    sessions.save(&session).map_err(AuthError::Persist)?;
    info!(username = %session.username, "auth: logged in");
    Ok(session)
}

pub async fn signup(
    gateway: &dyn ChatGateway,
    sessions: &dyn SessionStore,
    form: &SignupForm,
) -> Result<Session, AuthError> {
    let credentials = form.validate()?;
    let response = gateway.signup(&credentials).await.map_err(|err| {
        warn!(username = %credentials.username, "auth: signup failed: {err}");
        map_gateway_error(AuthFlow::Signup, err)
    })?;

    let session = Session::from(response);
    sessions.save(&session).map_err(AuthError::Persist)?;
    info!(username = %session.username, "auth: signed up");
    Ok(session)
}

pub fn logout(sessions: &dyn SessionStore) -> anyhow::Result<()> {
    sessions.clear()?;
    info!("auth: logged out");
    Ok(())
}

/// The persisted session, if any. `None` routes the view to login.
pub fn restore(sessions: &dyn SessionStore) -> anyhow::Result<Option<Session>> {
    sessions.load()
}
