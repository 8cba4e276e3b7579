//! Google OAuth 2 authorization-code flow with PKCE.

use std::time::Duration;

use branchout_core::student::ExternalIdentity;
use oauth2::{
  AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet,
  EndpointSet, PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope,
  TokenResponse as _, TokenUrl, basic::BasicClient,
};
use serde::Deserialize;

use crate::{
  ServerConfig,
  error::{Error, Result},
};

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

type GoogleClient =
  BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Profile claims returned by Google's userinfo endpoint.
#[derive(Debug, Deserialize)]
struct UserInfo {
  sub:     String,
  email:   Option<String>,
  name:    Option<String>,
  picture: Option<String>,
}

impl From<UserInfo> for ExternalIdentity {
  fn from(u: UserInfo) -> Self {
    ExternalIdentity {
      subject: u.sub,
      email:   u.email,
      name:    u.name,
      picture: u.picture,
    }
  }
}

/// A redirect to Google plus the secrets the callback must check.
pub struct AuthorizeRequest {
  pub url:           String,
  pub csrf_state:    String,
  pub pkce_verifier: String,
}

#[derive(Clone)]
pub struct GoogleOAuth {
  client: GoogleClient,
  http:   reqwest::Client,
}

impl GoogleOAuth {
  /// Build the client from configuration. Returns `None` when no client id
  /// or secret is configured.
  pub fn from_config(config: &ServerConfig) -> Result<Option<Self>> {
    let (Some(id), Some(secret)) = (
      config.google_client_id.as_deref().filter(|s| !s.trim().is_empty()),
      config.google_client_secret.as_deref().filter(|s| !s.trim().is_empty()),
    ) else {
      return Ok(None);
    };

    let redirect = format!("{}/authorize", config.base_url.trim_end_matches('/'));
    let invalid = |e: oauth2::url::ParseError| Error::Config(e.to_string());

    let client = BasicClient::new(ClientId::new(id.to_owned()))
      .set_client_secret(ClientSecret::new(secret.to_owned()))
      .set_auth_uri(AuthUrl::new(AUTH_URL.to_owned()).map_err(invalid)?)
      .set_token_uri(TokenUrl::new(TOKEN_URL.to_owned()).map_err(invalid)?)
      .set_redirect_uri(RedirectUrl::new(redirect).map_err(invalid)?);

    // Token endpoints must not be followed through redirects.
    let http = reqwest::Client::builder()
      .redirect(reqwest::redirect::Policy::none())
      .timeout(Duration::from_secs(config.oauth_timeout_secs))
      .build()?;

    Ok(Some(Self { client, http }))
  }

  pub fn authorize(&self) -> AuthorizeRequest {
    let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
    let (url, csrf) = self
      .client
      .authorize_url(CsrfToken::new_random)
      .add_scope(Scope::new("openid".to_owned()))
      .add_scope(Scope::new("email".to_owned()))
      .add_scope(Scope::new("profile".to_owned()))
      .set_pkce_challenge(challenge)
      .url();

    AuthorizeRequest {
      url:           url.to_string(),
      csrf_state:    csrf.secret().clone(),
      pkce_verifier: verifier.secret().clone(),
    }
  }

  /// Trade an authorization code for a token and fetch the user's claims.
  pub async fn exchange(&self, code: String, verifier: String) -> Result<ExternalIdentity> {
    let token = self
      .client
      .exchange_code(AuthorizationCode::new(code))
      .set_pkce_verifier(PkceCodeVerifier::new(verifier))
      .request_async(&self.http)
      .await
      .map_err(|e| Error::OAuth(e.to_string()))?;

    let info: UserInfo = self
      .http
      .get(USERINFO_URL)
      .bearer_auth(token.access_token().secret())
      .send()
      .await?
      .error_for_status()?
      .json()
      .await?;

    Ok(info.into())
  }
}
