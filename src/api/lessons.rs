//! Lessons resource client. Every call goes through the strict gated
//! request, so expired sessions and unverified accounts are handled before
//! any lesson handling runs.

use crate::api::types::{Lesson, LessonPage, NewLesson};
use crate::api::{decode, server_message, ApiClient};
use crate::session::AuthError;
use reqwest::Method;
use serde_json::Value;
use url::form_urlencoded;

/// Filters for listing lessons.
#[derive(Debug, Clone)]
pub struct LessonQuery {
    pub grade: Option<String>,
    pub unit: Option<String>,
    pub search: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl Default for LessonQuery {
    fn default() -> Self {
        Self {
            grade: None,
            unit: None,
            search: None,
            page: 1,
            limit: 20,
        }
    }
}

impl LessonQuery {
    fn to_query_string(&self) -> String {
        let mut params = form_urlencoded::Serializer::new(String::new());
        if let Some(grade) = self.grade.as_deref() {
            params.append_pair("grade", grade);
        }
        if let Some(unit) = self.unit.as_deref() {
            params.append_pair("unit", unit);
        }
        if let Some(search) = self.search.as_deref() {
            params.append_pair("search", search);
        }
        params.append_pair("page", &self.page.to_string());
        params.append_pair("limit", &self.limit.to_string());
        params.finish()
    }
}

impl ApiClient {
    /// # Errors
    /// See the taxonomy on [`AuthError`].
    pub async fn list_lessons(&self, query: &LessonQuery) -> Result<LessonPage, AuthError> {
        let path = format!("/lessons?{}", query.to_query_string());
        let response = self
            .authorized_request(Method::GET, &path, None, &[])
            .await?;
        decode(response).await
    }

    /// # Errors
    /// See the taxonomy on [`AuthError`].
    pub async fn get_lesson(&self, id: &str) -> Result<Lesson, AuthError> {
        let response = self
            .authorized_request(Method::GET, &format!("/lessons/{id}"), None, &[])
            .await?;
        decode(response).await
    }

    /// Create a lesson. When the caller does not set `created_by`, the
    /// current user's id is filled in.
    ///
    /// # Errors
    /// See the taxonomy on [`AuthError`].
    pub async fn create_lesson(&self, lesson: &NewLesson) -> Result<Lesson, AuthError> {
        let mut payload = lesson.clone();
        if payload.created_by.is_none() {
            payload.created_by = self.session().user().and_then(|user| user.id);
        }

        let body = serde_json::to_value(&payload)
            .map_err(|err| AuthError::Validation(format!("unencodable lesson: {err}")))?;
        let response = self
            .authorized_request(Method::POST, "/lessons", Some(&body), &[])
            .await?;
        decode(response).await
    }

    /// # Errors
    /// See the taxonomy on [`AuthError`].
    pub async fn update_lesson(&self, id: &str, changes: &Value) -> Result<Lesson, AuthError> {
        let response = self
            .authorized_request(Method::PUT, &format!("/lessons/{id}"), Some(changes), &[])
            .await?;
        decode(response).await
    }

    /// # Errors
    /// See the taxonomy on [`AuthError`].
    pub async fn delete_lesson(&self, id: &str) -> Result<(), AuthError> {
        let response = self
            .authorized_request(Method::DELETE, &format!("/lessons/{id}"), None, &[])
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body: Value = response.json().await.unwrap_or(Value::Null);
        Err(AuthError::Rejected {
            status: status.as_u16(),
            message: server_message(&body),
        })
    }

    /// Whether the current user may manage lesson content.
    #[must_use]
    pub fn can_manage_lessons(&self) -> bool {
        self.session().has_instructor_privilege()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemoryStore, SessionAuthority, User};
    use anyhow::Result;
    use serde_json::json;
    use std::net::TcpListener;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn client(base_url: &str) -> Result<ApiClient> {
        let session = SessionAuthority::with_defaults(Box::new(MemoryStore::new()));
        Ok(ApiClient::new(base_url, session)?)
    }

    fn instructor() -> User {
        User {
            id: Some("u-9".to_string()),
            name: Some("Mona Said".to_string()),
            email: Some("mona@example.com".to_string()),
            role: Some("معلم".to_string()),
            ..User::default()
        }
    }

    #[test]
    fn query_string_includes_paging_and_set_filters_only() {
        let query = LessonQuery {
            grade: Some("g2".to_string()),
            search: Some("كيمياء عضوية".to_string()),
            ..LessonQuery::default()
        };
        let encoded = query.to_query_string();
        assert!(encoded.contains("grade=g2"));
        assert!(encoded.contains("page=1"));
        assert!(encoded.contains("limit=20"));
        assert!(!encoded.contains("unit="));
    }

    #[tokio::test]
    async fn list_sends_filters_and_decodes_page() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/lessons"))
            .and(query_param("grade", "g2"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "lessons": [{ "_id": "l-1", "title": "الدرس الأول", "grade": "g2" }],
                "total": 1
            })))
            .mount(&server)
            .await;

        let client = client(&server.uri())?;
        client.session().start_session("tok-1", instructor())?;

        let page = client
            .list_lessons(&LessonQuery {
                grade: Some("g2".to_string()),
                limit: 5,
                ..LessonQuery::default()
            })
            .await?;
        assert_eq!(page.lessons.len(), 1);
        assert_eq!(page.lessons[0].id.as_deref(), Some("l-1"));
        assert_eq!(page.total, Some(1));
        Ok(())
    }

    #[tokio::test]
    async fn create_injects_current_user_as_author() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/lessons"))
            .and(body_partial_json(json!({
                "title": "درس جديد",
                "createdBy": "u-9"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "_id": "l-2",
                "title": "درس جديد",
                "createdBy": "u-9"
            })))
            .mount(&server)
            .await;

        let client = client(&server.uri())?;
        client.session().start_session("tok-1", instructor())?;

        let created = client
            .create_lesson(&NewLesson {
                title: "درس جديد".to_string(),
                grade: "g2".to_string(),
                unit: "u1".to_string(),
                description: None,
                video_url: None,
                created_by: None,
            })
            .await?;
        assert_eq!(created.id.as_deref(), Some("l-2"));
        Ok(())
    }

    #[tokio::test]
    async fn delete_maps_failure_to_rejection() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/lessons/l-1"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "message": "lesson not found"
            })))
            .mount(&server)
            .await;

        let client = client(&server.uri())?;
        client.session().start_session("tok-1", instructor())?;

        let err = client.delete_lesson("l-1").await.expect_err("should fail");
        match err {
            AuthError::Rejected { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "lesson not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn can_manage_follows_role_normalization() -> Result<()> {
        let client = client("http://127.0.0.1:9/api")?;
        assert!(!client.can_manage_lessons());

        client.session().start_session("tok-1", instructor())?;
        assert!(client.can_manage_lessons());

        let mut student = instructor();
        student.role = Some("student".to_string());
        client.session().start_session("tok-1", student)?;
        assert!(!client.can_manage_lessons());
        Ok(())
    }
}
