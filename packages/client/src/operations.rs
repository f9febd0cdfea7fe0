//! Graph operations on top of [`GraphClient::request`].

use serde_json::Value;

use crate::client::GraphClient;
use crate::error::Error;
use crate::request::ApiRequest;
use crate::types::{FilePart, Params, Payload};

impl GraphClient {
    pub fn get_object(&self, id: &str) -> Result<Payload, Error> {
        self.request(ApiRequest::object(id))
    }

    /// Fetch several objects; the result maps each ID to its object.
    pub fn get_objects<S: AsRef<str>>(&self, ids: &[S]) -> Result<Payload, Error> {
        self.request(ApiRequest::objects(ids))
    }

    pub fn get_connections(&self, id: &str, connection: &str) -> Result<Payload, Error> {
        self.request(ApiRequest::connections(id, connection))
    }

    pub fn post_object(&self, id: &str) -> Result<Payload, Error> {
        self.request(ApiRequest::post_object(id))
    }

    pub fn post_objects<S: AsRef<str>>(&self, ids: &[S]) -> Result<Payload, Error> {
        self.request(ApiRequest::post_objects(ids))
    }

    pub fn post_connections(&self, id: &str, connection: &str) -> Result<Payload, Error> {
        self.request(ApiRequest::post_connections(id, connection))
    }

    /// Write `data` to the `connection` edge of `parent`.
    ///
    /// Writes need an access token; without one the call fails before
    /// anything is sent.
    pub fn put_object(
        &self,
        parent: &str,
        connection: &str,
        data: Params,
    ) -> Result<Payload, Error> {
        if self.access_token().is_none() {
            return Err(Error::InvalidRequest {
                message: "write operations require an access token".to_string(),
            });
        }
        self.request(ApiRequest::put_object(parent, connection, data))
    }

    pub fn delete_object(&self, id: &str) -> Result<(), Error> {
        self.request(ApiRequest::delete_object(id)).map(|_| ())
    }

    pub fn delete_request(&self, user_id: &str, request_id: &str) -> Result<(), Error> {
        self.request(ApiRequest::delete_request(user_id, request_id))
            .map(|_| ())
    }

    pub fn put_photo(
        &self,
        image: FilePart,
        message: Option<&str>,
        album_id: Option<&str>,
    ) -> Result<Payload, Error> {
        self.request(ApiRequest::put_photo(image, message, album_id))
    }

    pub fn fql(&self, query: &str) -> Result<Payload, Error> {
        self.request(ApiRequest::fql(query))
    }

    /// The application's own access token.
    pub fn app_access_token(&self, app_id: &str, app_secret: &str) -> Result<String, Error> {
        let payload = self.request(ApiRequest::app_access_token(app_id, app_secret))?;
        match payload.get("access_token") {
            Some(Value::String(token)) => Ok(token.clone()),
            _ => Err(Error::UnexpectedResponse {
                message: "no access_token in reply".to_string(),
            }),
        }
    }

    /// Exchange an OAuth dialog `code` for a user access token; the result
    /// holds `access_token` and, when the token expires, `expires`.
    pub fn access_token_from_code(
        &self,
        code: &str,
        redirect_uri: &str,
        app_id: &str,
        app_secret: &str,
    ) -> Result<Payload, Error> {
        self.request(ApiRequest::access_token_from_code(
            code,
            redirect_uri,
            app_id,
            app_secret,
        ))
    }

    /// Trade the session's short-lived token for a long-lived one.
    pub fn extend_access_token(&self, app_id: &str, app_secret: &str) -> Result<Payload, Error> {
        let access_token = self.access_token().ok_or_else(|| Error::InvalidRequest {
            message: "extending a token requires an access token".to_string(),
        })?;
        self.request(ApiRequest::extend_access_token(
            app_id,
            app_secret,
            access_token,
        ))
    }

    /// Inspect a token, by default the session's own.
    pub fn access_token_info(&self, input_token: Option<&str>) -> Result<Payload, Error> {
        let input_token = input_token
            .or(self.access_token())
            .ok_or_else(|| Error::InvalidRequest {
                message: "no token to inspect".to_string(),
            })?;
        self.request(ApiRequest::access_token_info(input_token))
    }
}

#[cfg(test)]
mod tests {
    use crate::client::{ClientConfig, GraphClient};
    use crate::error::Error;
    use crate::executor::mock::MockExecutor;
    use crate::types::{HttpResponse, Method, Params};
    use serde_json::json;

    const BASE: &str = "https://graph.test";

    fn client(mock: &MockExecutor, token: Option<&str>) -> GraphClient {
        let mut config = ClientConfig::default()
            .with_base_url(BASE)
            .with_follow_paging(false);
        if let Some(token) = token {
            config = config.with_access_token(token);
        }
        GraphClient::with_executor(config, mock.clone())
    }

    #[test]
    fn get_objects_joins_ids() {
        let mock = MockExecutor::new()
            .with_default_response(MockExecutor::success_response(json!({"1": {}, "2": {}})));
        client(&mock, None).get_objects(&["1", "2"]).unwrap();

        let recorded = mock.recorded_requests();
        assert_eq!(recorded[0].url, "https://graph.test/");
        assert_eq!(recorded[0].query.get("ids").map(String::as_str), Some("1,2"));
    }

    #[test]
    fn post_connections_sends_get_override() {
        let mock = MockExecutor::new()
            .with_default_response(MockExecutor::success_response(json!({"data": []})));
        client(&mock, Some("tok")).post_connections("me", "likes").unwrap();

        let recorded = mock.recorded_requests();
        assert_eq!(recorded[0].method, Method::POST);
        assert_eq!(recorded[0].url, "https://graph.test/me/likes");
        assert_eq!(recorded[0].query.get("method").map(String::as_str), Some("GET"));
        assert_eq!(recorded[0].query.get("access_token").map(String::as_str), Some("tok"));
    }

    #[test]
    fn put_object_requires_token() {
        let mock = MockExecutor::new();
        let err = client(&mock, None)
            .put_object("me", "feed", Params::new())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest { .. }));
        assert!(mock.recorded_requests().is_empty());
    }

    #[test]
    fn delete_request_combines_ids() {
        let mock = MockExecutor::new()
            .with_default_response(MockExecutor::success_response(json!(true)));
        client(&mock, Some("tok")).delete_request("42", "1001").unwrap();

        let recorded = mock.recorded_requests();
        assert_eq!(recorded[0].method, Method::DELETE);
        assert_eq!(recorded[0].url, "https://graph.test/1001_42");
    }

    #[test]
    fn app_access_token_reads_querystring_reply() {
        let mock = MockExecutor::new().with_response(
            "https://graph.test/oauth/access_token",
            HttpResponse::new(200, "access_token=123%7Cabc"),
        );
        let token = client(&mock, None).app_access_token("123", "s3cret").unwrap();
        assert_eq!(token, "123|abc");

        let recorded = mock.recorded_requests();
        let query = &recorded[0].query;
        assert_eq!(query.get("grant_type").map(String::as_str), Some("client_credentials"));
        assert_eq!(query.get("client_id").map(String::as_str), Some("123"));
        assert_eq!(query.get("client_secret").map(String::as_str), Some("s3cret"));
    }

    #[test]
    fn app_access_token_without_token_in_reply() {
        let mock = MockExecutor::new()
            .with_default_response(MockExecutor::success_response(json!({"id": "x"})));
        let err = client(&mock, None).app_access_token("1", "2").unwrap_err();
        assert!(matches!(err, Error::UnexpectedResponse { .. }));
    }

    #[test]
    fn access_token_from_code_returns_expiry() {
        let mock = MockExecutor::new().with_default_response(HttpResponse::new(
            200,
            "access_token=user-token&expires=5108",
        ));
        let payload = client(&mock, None)
            .access_token_from_code("the-code", "https://app.example.com/", "1", "2")
            .unwrap();
        assert_eq!(payload.get("expires"), Some(&json!("5108")));

        let recorded = mock.recorded_requests();
        assert_eq!(recorded[0].query.get("code").map(String::as_str), Some("the-code"));
        assert_eq!(
            recorded[0].query.get("redirect_uri").map(String::as_str),
            Some("https://app.example.com/")
        );
    }

    #[test]
    fn extend_access_token_uses_session_token() {
        let mock = MockExecutor::new()
            .with_default_response(HttpResponse::new(200, "access_token=long-lived"));
        client(&mock, Some("short")).extend_access_token("1", "2").unwrap();

        let recorded = mock.recorded_requests();
        assert_eq!(
            recorded[0].query.get("fb_exchange_token").map(String::as_str),
            Some("short")
        );
        assert_eq!(
            recorded[0].query.get("grant_type").map(String::as_str),
            Some("fb_exchange_token")
        );

        let err = client(&MockExecutor::new(), None)
            .extend_access_token("1", "2")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest { .. }));
    }

    #[test]
    fn access_token_info_defaults_to_session_token() {
        let mock = MockExecutor::new().with_default_response(MockExecutor::success_response(
            json!({"data": {"app_id": "1", "is_valid": true}}),
        ));
        client(&mock, Some("tok")).access_token_info(None).unwrap();
        client(&mock, Some("tok")).access_token_info(Some("other")).unwrap();

        let recorded = mock.recorded_requests();
        assert_eq!(recorded[0].url, "https://graph.test/debug_token");
        assert_eq!(recorded[0].query.get("input_token").map(String::as_str), Some("tok"));
        assert_eq!(recorded[1].query.get("input_token").map(String::as_str), Some("other"));
    }

    #[test]
    fn fql_sends_query() {
        let mock = MockExecutor::new()
            .with_default_response(MockExecutor::success_response(json!({"data": []})));
        client(&mock, None)
            .fql("SELECT uid FROM user WHERE uid = me()")
            .unwrap();
        let recorded = mock.recorded_requests();
        assert_eq!(recorded[0].url, "https://graph.test/fql");
        assert_eq!(
            recorded[0].query.get("q").map(String::as_str),
            Some("SELECT uid FROM user WHERE uid = me()")
        );
    }
}
