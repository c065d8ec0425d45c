//! Authentication flows: registration with OTP verification, login, and the
//! forgot/reset password pair. Each flow validates input locally first, so a
//! bad email or password never reaches the network, and each one keeps the
//! session record in step with the server's answer.

use crate::api::types::{
    ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse, RegisterRequest,
    RegisterResponse, ResendOtpRequest, ResetPasswordRequest, VerifyOtpRequest,
};
use crate::api::{decode, ApiClient};
use crate::session::AuthError;
use crate::validate;
use tracing::debug;

impl ApiClient {
    /// Register a new account. On success the server issues a short-lived
    /// temp token; it is stored with the pending email so the OTP step can
    /// run without re-entering anything.
    ///
    /// # Errors
    /// `Validation` for malformed input, `Rejected` with the server's
    /// message otherwise.
    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, AuthError> {
        if !validate::valid_full_name(&request.name) {
            return Err(AuthError::Validation(
                "الاسم الكامل يجب أن يتكون من ثلاثة أسماء على الأقل".to_string(),
            ));
        }
        if !validate::valid_email(&request.email) {
            return Err(AuthError::Validation(
                "البريد الإلكتروني غير صالح".to_string(),
            ));
        }
        if !validate::valid_password(&request.password) {
            return Err(AuthError::Validation(
                "كلمة المرور يجب أن تحتوي على 8 أحرف على الأقل مع حرف كبير وصغير ورقم".to_string(),
            ));
        }
        if let Some(phone) = request.phone.as_deref() {
            if !validate::valid_phone(phone) {
                return Err(AuthError::Validation("رقم الهاتف غير صالح".to_string()));
            }
        }

        let response = self.post_public("/users/", request).await?;
        let body: RegisterResponse = decode(response).await?;

        let email = body.user.email.as_deref().unwrap_or(&request.email);
        self.session().begin_verification(&body.temp_token, email)?;
        debug!("registration accepted, awaiting OTP for {email}");

        Ok(body)
    }

    /// Log in and start a session from the returned token and profile.
    ///
    /// # Errors
    /// `Validation` for malformed input, `Rejected` with the server's
    /// message otherwise.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, AuthError> {
        if !validate::valid_email(&request.email) {
            return Err(AuthError::Validation(
                "البريد الإلكتروني غير صالح".to_string(),
            ));
        }
        if request.password.is_empty() {
            return Err(AuthError::Validation("كلمة المرور مطلوبة".to_string()));
        }

        let response = self.post_public("/auth/login", request).await?;
        let body: LoginResponse = decode(response).await?;

        self.session().start_session(&body.token, body.user.clone())?;

        Ok(body)
    }

    /// Confirm the OTP for a pending registration. The temp token authorizes
    /// the call and is consumed on success; a rejected code leaves the
    /// pending state unchanged for a retry.
    ///
    /// # Errors
    /// `Unauthenticated` when no verification is pending.
    pub async fn verify_otp(&self, otp: &str) -> Result<MessageResponse, AuthError> {
        if otp.trim().is_empty() {
            return Err(AuthError::Validation("رمز التحقق مطلوب".to_string()));
        }
        let Some(temp_token) = self.session().temp_token() else {
            return Err(AuthError::Unauthenticated);
        };

        let request = VerifyOtpRequest {
            otp: otp.trim().to_string(),
        };
        let response = self
            .post_with_bearer("/auth/verify-otp", &request, &temp_token)
            .await?;
        let body: MessageResponse = decode(response).await?;

        self.session().complete_verification()?;

        Ok(body)
    }

    /// Ask for a fresh OTP for the pending registration.
    ///
    /// # Errors
    /// `Unauthenticated` when no verification is pending.
    pub async fn resend_otp(&self, email: &str) -> Result<MessageResponse, AuthError> {
        if !validate::valid_email(email) {
            return Err(AuthError::Validation(
                "البريد الإلكتروني غير صالح".to_string(),
            ));
        }
        let Some(temp_token) = self.session().temp_token() else {
            return Err(AuthError::Unauthenticated);
        };

        let request = ResendOtpRequest {
            email: email.to_string(),
        };
        let response = self
            .post_with_bearer("/auth/resend-otp", &request, &temp_token)
            .await?;
        decode(response).await
    }

    /// Request a password-reset email.
    ///
    /// # Errors
    /// `Validation` for a malformed email, `Rejected` otherwise.
    pub async fn forgot_password(&self, email: &str) -> Result<MessageResponse, AuthError> {
        if !validate::valid_email(email) {
            return Err(AuthError::Validation(
                "البريد الإلكتروني غير صالح".to_string(),
            ));
        }

        let request = ForgotPasswordRequest {
            email: email.to_string(),
        };
        let response = self.post_public("/auth/forgot-password", &request).await?;
        decode(response).await
    }

    /// Complete a password reset. Any stored reset token is consumed on
    /// success; a failure leaves it in place.
    ///
    /// # Errors
    /// `Validation` for a weak password, `Rejected` otherwise.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<MessageResponse, AuthError> {
        if !validate::valid_password(new_password) {
            return Err(AuthError::Validation(
                "كلمة المرور يجب أن تحتوي على 8 أحرف على الأقل مع حرف كبير وصغير ورقم".to_string(),
            ));
        }

        let request = ResetPasswordRequest {
            token: token.to_string(),
            password: new_password.to_string(),
        };
        let response = self.post_public("/auth/reset-password", &request).await?;
        let body: MessageResponse = decode(response).await?;

        self.session().complete_password_reset()?;

        Ok(body)
    }

    /// Local logout: clears every session slot.
    ///
    /// # Errors
    /// Only storage failures.
    pub fn logout(&self) -> Result<(), AuthError> {
        self.session().end_session()
    }
}
