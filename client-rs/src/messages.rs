//! Request and response bodies for the authority's HTTP surface

use serde::{Deserialize, Serialize};

/// Body of `POST /login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body of `POST /register`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub role: String,
}

/// Successful response of `POST /login` and `POST /register`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_serializes() {
        let req = LoginRequest {
            email: "a@test.com".to_string(),
            password: "pw1".to_string(),
        };

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["email"], "a@test.com");
        assert_eq!(json["password"], "pw1");
    }

    #[test]
    fn test_token_response_round_trip() {
        let body = r#"{"token":"aaa.bbb.ccc"}"#;
        let resp: TokenResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.token, "aaa.bbb.ccc");
    }
}
