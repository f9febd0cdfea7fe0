use url::form_urlencoded;

use crate::types::{FilePart, HttpRequest, Method, Params};

/// A call against the Graph API, relative to the client's base URL.
///
/// Build one with the constructors below and hand it to
/// [`GraphClient::request`](crate::GraphClient::request) or add it to a
/// [`Batch`](crate::Batch).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApiRequest {
    pub method: Method,

    /// Path below the base URL, e.g. `me/friends`
    pub path: String,

    /// Query string arguments
    pub args: Params,

    /// Form body arguments. `Some` (even when empty) makes the request carry
    /// a body and the access token goes there instead of the query string.
    pub post_args: Option<Params>,

    /// Multipart attachments
    pub files: Vec<FilePart>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }

    pub fn with_args<I, K, V>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.args
            .extend(args.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_post_arg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.post_args
            .get_or_insert_with(Params::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_post_args(mut self, post_args: Params) -> Self {
        self.post_args
            .get_or_insert_with(Params::new)
            .extend(post_args);
        self
    }

    pub fn with_file(mut self, file: FilePart) -> Self {
        self.files.push(file);
        self
    }

    /// Fetch one object by ID.
    pub fn object(id: &str) -> Self {
        Self::get(id)
    }

    /// Fetch several objects at once; the reply maps each ID to its object.
    pub fn objects<S: AsRef<str>>(ids: &[S]) -> Self {
        Self::get("").with_arg("ids", join_ids(ids))
    }

    /// Fetch the `connection` edge of an object, e.g. `me` / `friends`.
    pub fn connections(id: &str, connection: &str) -> Self {
        Self::get(format!("{}/{}", id, connection))
    }

    /// [`ApiRequest::object`] sent as a POST, for argument lists too long for
    /// a URL.
    pub fn post_object(id: &str) -> Self {
        Self::post(id).with_arg("method", "GET")
    }

    pub fn post_objects<S: AsRef<str>>(ids: &[S]) -> Self {
        Self::post("")
            .with_arg("method", "GET")
            .with_arg("ids", join_ids(ids))
    }

    pub fn post_connections(id: &str, connection: &str) -> Self {
        Self::post(format!("{}/{}", id, connection)).with_arg("method", "GET")
    }

    /// Write `data` to the `connection` edge of `parent`, e.g. a message to
    /// `me` / `feed`.
    pub fn put_object(parent: &str, connection: &str, data: Params) -> Self {
        Self::post(format!("{}/{}", parent, connection)).with_post_args(data)
    }

    pub fn delete_object(id: &str) -> Self {
        Self::delete(id)
    }

    /// Delete an app request addressed to a user.
    pub fn delete_request(user_id: &str, request_id: &str) -> Self {
        Self::delete(format!("{}_{}", request_id, user_id))
    }

    /// Upload an image to an album, or to the app's default album when
    /// `album_id` is `None`.
    pub fn put_photo(image: FilePart, message: Option<&str>, album_id: Option<&str>) -> Self {
        let mut request = Self::post(format!("{}/photos", album_id.unwrap_or("me")))
            .with_post_args(Params::new())
            .with_file(image);
        if let Some(message) = message {
            request = request.with_post_arg("message", message);
        }
        request
    }

    pub fn fql(query: &str) -> Self {
        Self::get("fql").with_arg("q", query)
    }

    pub fn app_access_token(app_id: &str, app_secret: &str) -> Self {
        Self::get("oauth/access_token")
            .with_arg("grant_type", "client_credentials")
            .with_arg("client_id", app_id)
            .with_arg("client_secret", app_secret)
    }

    /// Exchange the `code` from an OAuth dialog for an access token.
    pub fn access_token_from_code(
        code: &str,
        redirect_uri: &str,
        app_id: &str,
        app_secret: &str,
    ) -> Self {
        Self::get("oauth/access_token")
            .with_arg("code", code)
            .with_arg("redirect_uri", redirect_uri)
            .with_arg("client_id", app_id)
            .with_arg("client_secret", app_secret)
    }

    pub fn extend_access_token(app_id: &str, app_secret: &str, access_token: &str) -> Self {
        Self::get("oauth/access_token")
            .with_arg("client_id", app_id)
            .with_arg("client_secret", app_secret)
            .with_arg("grant_type", "fb_exchange_token")
            .with_arg("fb_exchange_token", access_token)
    }

    pub fn access_token_info(input_token: &str) -> Self {
        Self::get("debug_token").with_arg("input_token", input_token)
    }

    /// Attach the session credential: to the form body when there is one,
    /// otherwise to the query string.
    pub(crate) fn with_credential(mut self, access_token: Option<&str>) -> Self {
        if let Some(token) = access_token {
            let target = match self.post_args.as_mut() {
                Some(post_args) => post_args,
                None => &mut self.args,
            };
            target.insert("access_token".to_string(), token.to_string());
        }
        self
    }

    pub(crate) fn to_http(&self, url: String) -> HttpRequest {
        HttpRequest {
            method: self.method,
            url,
            query: self.args.clone(),
            form: self.post_args.clone(),
            files: self.files.clone(),
        }
    }

    /// The path with the encoded query string appended.
    pub(crate) fn relative_url(&self) -> String {
        if self.args.is_empty() {
            return self.path.clone();
        }
        let separator = if self.path.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.path, separator, encode_params(&self.args))
    }
}

pub(crate) fn encode_params(params: &Params) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish()
}

fn join_ids<S: AsRef<str>>(ids: &[S]) -> String {
    ids.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(",")
}
