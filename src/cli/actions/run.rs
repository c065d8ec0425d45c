use crate::api::lessons::LessonQuery;
use crate::api::types::{LoginRequest, RegisterRequest};
use crate::api::ApiClient;
use crate::cli::actions::{Action, LessonsAction};
use crate::cli::globals::GlobalArgs;
use crate::session::{FileStore, MemoryStore, SessionAuthority, SessionStore};
use anyhow::{bail, Result};
use secrecy::ExposeSecret;

/// Session backend for the run: the configured file, or memory when no file
/// is set.
fn session_store(globals: &GlobalArgs) -> Box<dyn SessionStore> {
    match &globals.session_file {
        Some(path) => Box::new(FileStore::new(path)),
        None => Box::new(MemoryStore::new()),
    }
}

/// Handle the parsed action against the configured API.
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    let session = SessionAuthority::with_defaults(session_store(globals));
    let client = ApiClient::new(&globals.api_url, session)?;

    match action {
        Action::Register {
            name,
            email,
            password,
            phone,
            grade,
        } => {
            let response = client
                .register(&RegisterRequest {
                    name,
                    email,
                    password,
                    phone,
                    grade,
                })
                .await?;
            let email = response.user.email.as_deref().unwrap_or_default();
            println!("Registered {email}. Check your inbox and run: madrasa verify-otp <OTP>");
        }
        Action::Login { email, password } => {
            client.login(&LoginRequest { email, password }).await?;
            println!("Logged in as {}", client.session().display_name());
        }
        Action::VerifyOtp { otp } => {
            let response = client.verify_otp(&otp).await?;
            println!("{}", response.message);
        }
        Action::ResendOtp { email } => {
            let Some(email) = email.or_else(|| client.session().pending_email()) else {
                bail!("no pending email; pass --email or register first");
            };
            let response = client.resend_otp(&email).await?;
            println!("{}", response.message);
        }
        Action::ForgotPassword { email } => {
            let response = client.forgot_password(&email).await?;
            println!("{}", response.message);
        }
        Action::ResetPassword { token, password } => {
            // A fresh token is persisted before the attempt, so a failed or
            // interrupted reset can be retried later without re-passing it.
            let token = match token {
                Some(token) => {
                    client.session().begin_password_reset(&token)?;
                    token
                }
                None => match client.session().reset_token() {
                    Some(stored) => stored.expose_secret().to_string(),
                    None => bail!("no reset token; pass --token from the reset email"),
                },
            };
            let response = client.reset_password(&token, &password).await?;
            println!("{}", response.message);
        }
        Action::Logout => {
            client.logout()?;
            println!("Logged out");
        }
        Action::Whoami => {
            if !client.session().is_active() {
                println!("Not logged in");
                return Ok(());
            }
            let user = client.session().user().unwrap_or_default();
            println!("name:   {}", client.session().display_name());
            println!("email:  {}", user.email.as_deref().unwrap_or("-"));
            println!("role:   {}", user.role());
            println!("grade:  {}", user.grade.as_deref().unwrap_or("-"));
            println!("avatar: {}", client.session().avatar_url());
        }
        Action::Lessons(action) => handle_lessons(&client, action).await?,
    }

    Ok(())
}

async fn handle_lessons(client: &ApiClient, action: LessonsAction) -> Result<()> {
    match action {
        LessonsAction::List {
            grade,
            unit,
            search,
            page,
            limit,
        } => {
            let lessons = client
                .list_lessons(&LessonQuery {
                    grade,
                    unit,
                    search,
                    page,
                    limit,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&lessons)?);
        }
        LessonsAction::Get { id } => {
            let lesson = client.get_lesson(&id).await?;
            println!("{}", serde_json::to_string_pretty(&lesson)?);
        }
        LessonsAction::Delete { id } => {
            client.delete_lesson(&id).await?;
            println!("Deleted {id}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionKey;
    use anyhow::Result;

    #[test]
    fn store_persists_only_when_a_session_file_is_configured() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let on_disk = GlobalArgs::new(
            "http://localhost:3000/api".to_string(),
            Some(dir.path().join("session.json")),
        );
        session_store(&on_disk).apply(&[(SessionKey::Token, Some("tok-1".to_string()))])?;
        // A second store over the same file sees the write.
        assert_eq!(
            session_store(&on_disk).get(SessionKey::Token).as_deref(),
            Some("tok-1")
        );

        let in_memory = GlobalArgs::new("http://localhost:3000/api".to_string(), None);
        session_store(&in_memory).apply(&[(SessionKey::Token, Some("tok-1".to_string()))])?;
        // Nothing outlives the store instance without a file.
        assert_eq!(session_store(&in_memory).get(SessionKey::Token), None);
        Ok(())
    }
}
