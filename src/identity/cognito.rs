//! Client for the Cognito user-pool JSON API (`x-amz-json-1.1`). It covers the
//! public app-client operations: `SignUp`, `ConfirmSignUp`, `InitiateAuth`
//! (`USER_PASSWORD_AUTH`), `GetUser` and `GlobalSignOut`. Tokens returned by
//! sign-in live only in memory and are never logged.

use crate::{
    config::AppConfig,
    errors::AppError,
    http::{sanitize_body, HttpClient},
    identity::{
        IdentityProvider, Principal, SignInOutcome, SignUpOutcome, SignUpStep, UserAttributes,
    },
};
use reqwest::Response;
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, de::IgnoredAny, Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

const AMZ_JSON: &str = "application/x-amz-json-1.1";
const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";
const USER_PASSWORD_AUTH: &str = "USER_PASSWORD_AUTH";

/// Tokens of the signed-in user.
struct Tokens {
    access_token: SecretString,
    login_id: String,
}

pub struct CognitoClient {
    http: HttpClient,
    client_id: String,
    tokens: Mutex<Option<Tokens>>,
}

impl std::fmt::Debug for CognitoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CognitoClient")
            .field("endpoint", &self.http.base_url())
            .field("client_id", &self.client_id)
            .field("tokens", &"***")
            .finish()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AttributeType<'a> {
    name: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SignUpRequest<'a> {
    client_id: &'a str,
    username: &'a str,
    password: &'a str,
    user_attributes: Vec<AttributeType<'a>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SignUpResponse {
    user_confirmed: bool,
    user_sub: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ConfirmSignUpRequest<'a> {
    client_id: &'a str,
    username: &'a str,
    confirmation_code: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct AuthParameters<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthRequest<'a> {
    auth_flow: &'a str,
    client_id: &'a str,
    auth_parameters: AuthParameters<'a>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthResponse {
    authentication_result: Option<AuthenticationResult>,
    challenge_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResult {
    access_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AccessTokenRequest<'a> {
    access_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetUserResponse {
    username: String,
    #[serde(default)]
    user_attributes: Vec<UserAttribute>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UserAttribute {
    name: String,
    value: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(rename = "__type")]
    error_type: Option<String>,
    #[serde(alias = "Message")]
    message: Option<String>,
}

impl CognitoClient {
    /// Builds a client for the configured user-pool endpoint and app client.
    ///
    /// # Errors
    /// Returns `AppError::Config` if the HTTP client cannot be built.
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        Ok(Self {
            http: HttpClient::new(&config.cognito_endpoint, config.timeout)?,
            client_id: config.cognito_client_id.clone(),
            tokens: Mutex::new(None),
        })
    }

    /// Whether sign-in tokens are currently held.
    pub async fn has_tokens(&self) -> bool {
        self.tokens.lock().await.is_some()
    }

    async fn call<B: Serialize, T: DeserializeOwned>(
        &self,
        operation: &str,
        body: &B,
    ) -> Result<T, AppError> {
        let target = format!("{TARGET_PREFIX}.{operation}");
        let response = self
            .http
            .post_with_headers("/", AMZ_JSON, body, &[("X-Amz-Target", target.as_str())])
            .await?;

        if response.status().is_success() {
            response
                .json::<T>()
                .await
                .map_err(|err| AppError::Parse(format!("Failed to decode {operation}: {err}")))
        } else {
            let err = identity_error(response).await;
            warn!("{} failed: {}", operation, err);
            Err(err)
        }
    }
}

impl IdentityProvider for CognitoClient {
    #[instrument(skip(self))]
    async fn current_user(&self) -> Result<Principal, AppError> {
        let guard = self.tokens.lock().await;
        let Some(tokens) = guard.as_ref() else {
            return Err(AppError::NotSignedIn);
        };
        let access_token = tokens.access_token.expose_secret().to_string();
        let login_id = tokens.login_id.clone();
        drop(guard);

        let response: GetUserResponse = self
            .call(
                "GetUser",
                &AccessTokenRequest {
                    access_token: &access_token,
                },
            )
            .await?;

        Ok(principal_from_user(response, login_id))
    }

    #[instrument(skip(self, password))]
    async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SignInOutcome, AppError> {
        let request = InitiateAuthRequest {
            auth_flow: USER_PASSWORD_AUTH,
            client_id: &self.client_id,
            auth_parameters: AuthParameters {
                username: email,
                password: password.expose_secret(),
            },
        };
        let response: InitiateAuthResponse = self.call("InitiateAuth", &request).await?;

        match response.authentication_result {
            Some(result) => {
                *self.tokens.lock().await = Some(Tokens {
                    access_token: SecretString::from(result.access_token),
                    login_id: email.to_string(),
                });
                debug!("sign-in complete");
                Ok(SignInOutcome {
                    is_signed_in: true,
                    challenge: None,
                })
            }
            None => {
                debug!("sign-in requires challenge {:?}", response.challenge_name);
                Ok(SignInOutcome {
                    is_signed_in: false,
                    challenge: response.challenge_name,
                })
            }
        }
    }

    #[instrument(skip(self, password, attributes))]
    async fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
        attributes: &UserAttributes,
    ) -> Result<SignUpOutcome, AppError> {
        let request = SignUpRequest {
            client_id: &self.client_id,
            username: email,
            password: password.expose_secret(),
            user_attributes: vec![
                AttributeType {
                    name: "email",
                    value: &attributes.email,
                },
                AttributeType {
                    name: "name",
                    value: &attributes.name,
                },
            ],
        };
        let response: SignUpResponse = self.call("SignUp", &request).await?;

        Ok(SignUpOutcome {
            user_id: response.user_sub,
            next_step: if response.user_confirmed {
                SignUpStep::Done
            } else {
                SignUpStep::ConfirmSignUp
            },
        })
    }

    #[instrument(skip(self, code))]
    async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<(), AppError> {
        let request = ConfirmSignUpRequest {
            client_id: &self.client_id,
            username: email,
            confirmation_code: code,
        };
        let _: IgnoredAny = self.call("ConfirmSignUp", &request).await?;
        Ok(())
    }

    /// Revokes the tokens server-side, then forgets them. Without tokens there is
    /// nothing to revoke and the call succeeds.
    #[instrument(skip(self))]
    async fn sign_out(&self) -> Result<(), AppError> {
        let mut guard = self.tokens.lock().await;
        let Some(tokens) = guard.as_ref() else {
            return Ok(());
        };
        let request = AccessTokenRequest {
            access_token: tokens.access_token.expose_secret(),
        };
        let _: IgnoredAny = self.call("GlobalSignOut", &request).await?;
        *guard = None;
        Ok(())
    }
}

fn principal_from_user(response: GetUserResponse, login_id: String) -> Principal {
    let sub = response
        .user_attributes
        .iter()
        .find(|attribute| attribute.name == "sub")
        .map(|attribute| attribute.value.clone());

    Principal {
        user_id: sub.unwrap_or_else(|| response.username.clone()),
        username: response.username,
        login_id: Some(login_id).filter(|id| !id.is_empty()),
    }
}

/// Maps the `{"__type": ..., "message": ...}` envelope to `AppError::Identity`.
async fn identity_error(response: Response) -> AppError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    parse_identity_error(status, &body)
}

fn parse_identity_error(status: u16, body: &str) -> AppError {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse {
            error_type: Some(error_type),
            message,
        }) => AppError::Identity {
            code: error_code(&error_type).to_string(),
            message: message.unwrap_or_default(),
        },
        _ => AppError::Http {
            status,
            message: sanitize_body(body),
        },
    }
}

/// Drops the namespace some endpoints prepend, e.g. `com.amazonaws...#CodeMismatchException`.
fn error_code(error_type: &str) -> &str {
    error_type
        .rsplit_once('#')
        .map_or(error_type, |(_, code)| code)
}
