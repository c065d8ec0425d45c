//! The session authority: single source of truth for the current actor and
//! the only code path allowed to mutate session storage. Pages check its
//! predicates, the API layer routes auth failures through it, and the sinks
//! decide how notifications and redirects reach the user.

use crate::session::error::AuthError;
use crate::session::role::Role;
use crate::session::sink::{Navigator, Notifier, Severity};
use crate::session::store::{SessionKey, SessionStore, StoreError};
use crate::session::user::User;
use secrecy::SecretString;
use tracing::{debug, error};

/// Asset served when a profile carries no avatar.
///
/// The web frontend stores the page-relative `../images/default_user.png`;
/// that prefix is meaningless outside a browser, so sessions normalized here
/// differ from web-written ones in this one value.
pub const DEFAULT_AVATAR: &str = "images/default_user.png";

/// Display-name fallback when the profile has no usable name at all.
const FALLBACK_NAME: &str = "مستخدم";

pub(crate) const MSG_LOGIN_REQUIRED: &str = "يجب تسجيل الدخول للوصول إلى هذه الصفحة";
pub(crate) const MSG_MISSING_TOKEN: &str = "لا يوجد رمز مصادقة";
pub(crate) const MSG_SESSION_EXPIRED: &str = "انتهت صلاحية الجلسة. يرجى تسجيل الدخول مرة أخرى";
pub(crate) const MSG_VERIFICATION_REQUIRED: &str = "يجب تفعيل حسابك أولاً";
pub(crate) const MSG_INSTRUCTOR_ONLY: &str = "هذه الصفحة مخصصة للمدرسين والمشرفين فقط";

pub struct SessionAuthority {
    store: Box<dyn SessionStore>,
    notifier: Box<dyn Notifier>,
    navigator: Box<dyn Navigator>,
    default_avatar: String,
}

impl SessionAuthority {
    #[must_use]
    pub fn new(
        store: Box<dyn SessionStore>,
        notifier: Box<dyn Notifier>,
        navigator: Box<dyn Navigator>,
        default_avatar: impl Into<String>,
    ) -> Self {
        Self {
            store,
            notifier,
            navigator,
            default_avatar: default_avatar.into(),
        }
    }

    /// Authority with logging sinks and the stock avatar, enough for hosts
    /// without a UI.
    #[must_use]
    pub fn with_defaults(store: Box<dyn SessionStore>) -> Self {
        Self::new(
            store,
            Box::new(crate::session::sink::LogNotifier),
            Box::new(crate::session::sink::NoopNavigator),
            DEFAULT_AVATAR,
        )
    }

    // ---- read operations ----

    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.slot(SessionKey::Token).map(SecretString::from)
    }

    #[must_use]
    pub fn temp_token(&self) -> Option<SecretString> {
        self.slot(SessionKey::TempToken).map(SecretString::from)
    }

    #[must_use]
    pub fn reset_token(&self) -> Option<SecretString> {
        self.slot(SessionKey::ResetToken).map(SecretString::from)
    }

    #[must_use]
    pub fn pending_email(&self) -> Option<String> {
        self.slot(SessionKey::PendingEmail)
    }

    /// Stored profile. A malformed record reads as absent rather than
    /// propagating a parse failure.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        let raw = self.slot(SessionKey::User)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(err) => {
                debug!("discarding unreadable stored user record: {err}");
                None
            }
        }
    }

    /// True iff both token and user are present.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.token().is_some() && self.user().is_some()
    }

    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.user().is_some_and(|user| user.role() == role)
    }

    #[must_use]
    pub fn has_instructor_privilege(&self) -> bool {
        self.user().is_some_and(|user| user.role().is_privileged())
    }

    /// Instructors and admins access every grade; a student only an exact
    /// match with their own.
    #[must_use]
    pub fn has_grade_access(&self, target_grade: &str) -> bool {
        let Some(user) = self.user() else {
            return false;
        };
        if user.role().is_privileged() {
            return true;
        }
        user.grade.as_deref() == Some(target_grade)
    }

    /// First two whitespace-separated tokens of the profile name, else the
    /// username, else the local part of the email. Never empty.
    #[must_use]
    pub fn display_name(&self) -> String {
        let Some(user) = self.user() else {
            return FALLBACK_NAME.to_string();
        };

        if let Some(name) = user.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            let mut parts = name.split_whitespace();
            return match (parts.next(), parts.next()) {
                (Some(first), Some(second)) => format!("{first} {second}"),
                (Some(first), None) => first.to_string(),
                _ => FALLBACK_NAME.to_string(),
            };
        }

        if let Some(username) = user.username.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            return username.to_string();
        }

        if let Some(local) = user
            .email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|local| !local.is_empty())
        {
            return local.to_string();
        }

        FALLBACK_NAME.to_string()
    }

    #[must_use]
    pub fn avatar_url(&self) -> String {
        self.user()
            .and_then(|user| user.avatar)
            .filter(|avatar| !avatar.is_empty())
            .unwrap_or_else(|| self.default_avatar.clone())
    }

    // ---- mutating operations ----

    /// Store token and user as one unit. A profile without an avatar gets
    /// the default injected before the write, so readers never need the
    /// fallback check.
    pub fn start_session(&self, token: &str, mut user: User) -> Result<(), AuthError> {
        if user.avatar.as_deref().map_or(true, |a| a.trim().is_empty()) {
            user.avatar = Some(self.default_avatar.clone());
        }
        let encoded = serde_json::to_string(&user).map_err(StoreError::Encode)?;
        self.store.apply(&[
            (SessionKey::Token, Some(token.to_string())),
            (SessionKey::User, Some(encoded)),
        ])?;
        Ok(())
    }

    /// Clear every session slot as one unit and refresh any authenticated UI.
    pub fn end_session(&self) -> Result<(), AuthError> {
        let changes: Vec<(SessionKey, Option<String>)> =
            SessionKey::ALL.iter().map(|key| (*key, None)).collect();
        self.store.apply(&changes)?;
        self.navigator.refresh();
        Ok(())
    }

    /// Store the registration-phase token and the email awaiting OTP.
    pub fn begin_verification(&self, temp_token: &str, email: &str) -> Result<(), AuthError> {
        self.store.apply(&[
            (SessionKey::TempToken, Some(temp_token.to_string())),
            (SessionKey::PendingEmail, Some(email.to_string())),
        ])?;
        Ok(())
    }

    /// Consume the temp token after a verified OTP. The pending email stays
    /// for display until overwritten.
    pub fn complete_verification(&self) -> Result<(), AuthError> {
        self.store.apply(&[(SessionKey::TempToken, None)])?;
        Ok(())
    }

    pub fn begin_password_reset(&self, reset_token: &str) -> Result<(), AuthError> {
        self.store
            .apply(&[(SessionKey::ResetToken, Some(reset_token.to_string()))])?;
        Ok(())
    }

    pub fn complete_password_reset(&self) -> Result<(), AuthError> {
        self.store.apply(&[(SessionKey::ResetToken, None)])?;
        Ok(())
    }

    /// Forward a message to the configured notification sink.
    pub fn notify(&self, message: &str, severity: Severity) {
        self.notifier.notify(message, severity);
    }

    // ---- auth-failure reactions ----

    /// Clear the session, tell the user why, and send them to the entry
    /// point. Storage failures during the clear are logged, not propagated:
    /// the user must end up at the login screen either way.
    pub fn handle_auth_failure(&self, message: &str) {
        if let Err(err) = self.end_session() {
            error!("failed to clear session: {err}");
        }
        self.notifier.notify(message, Severity::Error);
        self.navigator.redirect_to_entry_point();
    }

    /// 401 observed on a gated request.
    pub fn handle_session_expired(&self) {
        self.handle_auth_failure(MSG_SESSION_EXPIRED);
    }

    /// 403 + `requiresVerification` observed. The user is known, just
    /// unverified, so the session is kept and only flagged.
    pub fn handle_verification_required(&self, email: Option<&str>) {
        if let Some(email) = email {
            if let Err(err) = self
                .store
                .apply(&[(SessionKey::PendingEmail, Some(email.to_string()))])
            {
                error!("failed to record pending email: {err}");
            }
        }
        self.notifier.notify(MSG_VERIFICATION_REQUIRED, Severity::Warning);
    }

    // ---- page/feature gating ----

    /// True when a session is active; otherwise clears state, notifies, and
    /// redirects, exactly like an expired session.
    pub fn require_active_session(&self) -> bool {
        if self.is_active() {
            return true;
        }
        self.handle_auth_failure(MSG_LOGIN_REQUIRED);
        false
    }

    pub fn require_role(&self, role: Role) -> bool {
        if !self.require_active_session() {
            return false;
        }
        if self.has_role(role) {
            return true;
        }
        self.notifier.notify(
            &format!("ليس لديك صلاحية الوصول إلى هذه الصفحة (مطلوب: {role})"),
            Severity::Error,
        );
        self.navigator.redirect_to_entry_point();
        false
    }

    pub fn require_instructor_privilege(&self) -> bool {
        if !self.require_active_session() {
            return false;
        }
        if self.has_instructor_privilege() {
            return true;
        }
        self.notifier.notify(MSG_INSTRUCTOR_ONLY, Severity::Error);
        self.navigator.redirect_to_entry_point();
        false
    }

    pub fn require_grade_access(&self, target_grade: &str) -> bool {
        if !self.require_active_session() {
            return false;
        }
        if self.has_grade_access(target_grade) {
            return true;
        }
        self.notifier.notify(
            &format!("ليس لديك صلاحية للوصول إلى {target_grade}"),
            Severity::Error,
        );
        self.navigator.redirect_to_entry_point();
        false
    }

    fn slot(&self, key: SessionKey) -> Option<String> {
        self.store.get(key).filter(|value| !value.is_empty())
    }
}
