//! REST/JSON implementation of [`ElectionApi`] over `reqwest`.

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use voto_types::{
    AuthPayload, Candidate, CandidateId, Credentials, ElectionResults, RegisterData,
    SessionToken, User, UserId, Vote,
};

use crate::{ApiEnvelope, ApiError, ElectionApi};

/// Request and connect timeouts for the HTTP client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request: Duration,
    pub connect: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(30),
            connect: Duration::from_secs(10),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CastVoteBody {
    candidate_id: CandidateId,
    user_id: UserId,
}

/// HTTP client for the election service.
///
/// Wraps `reqwest::Client` with the service's base URL (e.g.
/// `http://127.0.0.1:3000/api`) and provides one typed method per endpoint.
#[derive(Clone)]
pub struct HttpElectionApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpElectionApi {
    /// Create a client targeting `base_url` with default timeouts.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_timeouts(base_url, HttpTimeouts::default())
    }

    pub fn with_timeouts(base_url: impl Into<String>, timeouts: HttpTimeouts) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeouts.request)
            .connect_timeout(timeouts.connect)
            .build()
            .map_err(|e| ApiError::Network(format!("failed to create HTTP client: {e}")))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    /// The configured base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Send a request and return the raw status and body.
    async fn execute(&self, request: RequestBuilder) -> Result<(StatusCode, Vec<u8>), ApiError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;
        debug!(status = %status, bytes = body.len(), "election service responded");
        Ok((status, body.to_vec()))
    }

    async fn call<T>(&self, request: RequestBuilder, on_failure: fn(String) -> ApiError) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let (status, body) = self.execute(request).await?;
        decode_envelope(status, &body, on_failure)
    }
}

#[async_trait]
impl ElectionApi for HttpElectionApi {
    async fn login(&self, credentials: &Credentials) -> Result<AuthPayload, ApiError> {
        debug!(email = %credentials.email, "login");
        let request = self.http.post(self.url("auth/login")).json(credentials);
        self.call(request, ApiError::Auth).await
    }

    async fn register(&self, data: &RegisterData) -> Result<AuthPayload, ApiError> {
        debug!(email = %data.email, "register");
        let request = self.http.post(self.url("auth/register")).json(data);
        self.call(request, ApiError::Auth).await
    }

    async fn logout(&self, token: &SessionToken) -> Result<(), ApiError> {
        let request = self
            .http
            .post(self.url("auth/logout"))
            .bearer_auth(token.expose());
        self.call(request, ApiError::Rejected).await
    }

    async fn current_user(&self, token: &SessionToken) -> Result<User, ApiError> {
        let request = self
            .http
            .get(self.url("auth/me"))
            .bearer_auth(token.expose());
        self.call(request, ApiError::Auth).await
    }

    async fn candidates(&self) -> Result<Vec<Candidate>, ApiError> {
        let request = self.http.get(self.url("candidates"));
        self.call(request, ApiError::Rejected).await
    }

    async fn cast_vote(
        &self,
        token: &SessionToken,
        candidate_id: CandidateId,
        user_id: UserId,
    ) -> Result<Option<Vote>, ApiError> {
        debug!(candidate_id = %candidate_id, user_id = %user_id, "cast vote");
        let request = self
            .http
            .post(self.url("votes/cast"))
            .bearer_auth(token.expose())
            .json(&CastVoteBody {
                candidate_id,
                user_id,
            });
        self.call(request, ApiError::Conflict).await
    }

    async fn results(&self) -> Result<ElectionResults, ApiError> {
        let request = self.http.get(self.url("votes/results"));
        self.call(request, ApiError::Rejected).await
    }

    async fn has_voted(&self, token: &SessionToken, user_id: UserId) -> Result<bool, ApiError> {
        let request = self
            .http
            .get(self.url(&format!("votes/has-voted/{user_id}")))
            .bearer_auth(token.expose());
        let (status, body) = self.execute(request).await?;
        decode_has_voted(status, &body)
    }
}

fn transport_error(e: reqwest::Error) -> ApiError {
    if e.is_decode() {
        ApiError::Protocol(e.to_string())
    } else {
        ApiError::Network(e.to_string())
    }
}

/// Map a non-2xx status onto the error taxonomy.
///
/// Statuses without a fixed meaning fall through to the endpoint's own
/// failure classification for 4xx and to `Rejected` for 5xx.
fn classify_status(status: StatusCode, message: String, on_failure: fn(String) -> ApiError) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Auth(message),
        StatusCode::CONFLICT => ApiError::Conflict(message),
        StatusCode::REQUEST_TIMEOUT
        | StatusCode::TOO_MANY_REQUESTS
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => ApiError::Network(message),
        s if s.is_client_error() => on_failure(message),
        _ => ApiError::Rejected(message),
    }
}

fn decode_envelope<T>(status: StatusCode, body: &[u8], on_failure: fn(String) -> ApiError) -> Result<T, ApiError>
where
    T: DeserializeOwned,
{
    let envelope = serde_json::from_slice::<ApiEnvelope<serde_json::Value>>(body);

    if !status.is_success() {
        let message = match &envelope {
            Ok(env) => env.failure_message(),
            Err(_) => format!("HTTP {status}"),
        };
        return Err(classify_status(status, message, on_failure));
    }

    envelope
        .map_err(|e| ApiError::Protocol(format!("malformed envelope: {e}")))?
        .into_result(on_failure)
}

/// `has-voted` answers with a bare boolean; an envelope around one is
/// accepted too.
fn decode_has_voted(status: StatusCode, body: &[u8]) -> Result<bool, ApiError> {
    if status.is_success() {
        if let Ok(flag) = serde_json::from_slice::<bool>(body) {
            return Ok(flag);
        }
    }
    decode_envelope(status, body, ApiError::Rejected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let api = HttpElectionApi::new("http://127.0.0.1:3000/api/").unwrap();
        assert_eq!(api.base_url(), "http://127.0.0.1:3000/api");
        assert_eq!(api.url("votes/results"), "http://127.0.0.1:3000/api/votes/results");
    }

    #[test]
    fn unauthorized_maps_to_auth_regardless_of_endpoint() {
        let body = br#"{"success":false,"error":"token expired"}"#;
        let err = decode_envelope::<()>(StatusCode::UNAUTHORIZED, body, ApiError::Conflict).unwrap_err();
        assert_eq!(err, ApiError::Auth("token expired".into()));
    }

    #[test]
    fn gateway_errors_are_transient() {
        let err = decode_envelope::<()>(StatusCode::BAD_GATEWAY, b"<html>", ApiError::Rejected).unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn bad_request_uses_endpoint_classification() {
        let body = br#"{"success":false,"error":"ya votaste"}"#;
        let err = decode_envelope::<Vote>(StatusCode::BAD_REQUEST, body, ApiError::Conflict).unwrap_err();
        assert_eq!(err, ApiError::Conflict("ya votaste".into()));
    }

    #[test]
    fn vote_accepted_without_data_has_no_receipt() {
        let body = br#"{"success":true,"message":"Voto registrado"}"#;
        let vote = decode_envelope::<Option<Vote>>(StatusCode::OK, body, ApiError::Conflict).unwrap();
        assert_eq!(vote, None);
    }

    #[test]
    fn internal_errors_are_rejections() {
        let body = br#"{"success":false,"error":"boom"}"#;
        let err = decode_envelope::<()>(StatusCode::INTERNAL_SERVER_ERROR, body, ApiError::Conflict).unwrap_err();
        assert_eq!(err, ApiError::Rejected("boom".into()));
    }

    #[test]
    fn garbage_success_body_is_protocol_error() {
        let err = decode_envelope::<()>(StatusCode::OK, b"not json", ApiError::Rejected).unwrap_err();
        assert!(matches!(err, ApiError::Protocol(_)));
    }

    #[test]
    fn has_voted_accepts_bare_and_wrapped_booleans() {
        assert_eq!(decode_has_voted(StatusCode::OK, b"true"), Ok(true));
        assert_eq!(
            decode_has_voted(StatusCode::OK, br#"{"success":true,"data":false}"#),
            Ok(false)
        );
        assert!(matches!(
            decode_has_voted(StatusCode::FORBIDDEN, b""),
            Err(ApiError::Auth(_))
        ));
    }
}
