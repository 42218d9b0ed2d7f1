use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::{config::ServiceAccount, constants::*, utils::get_epoch_ts};

#[derive(Debug, Serialize, Deserialize)]
struct GoogleTokenClaims {
    iss: String,
    iat: u64,
    exp: u64,
    aud: String,
    scope: String,
}

impl GoogleTokenClaims {
    fn new(account: &ServiceAccount, ts: u64) -> Self {
        Self {
            iss: account.client_email.to_owned(),
            iat: ts,
            exp: ts + ACCESS_TOKEN_LIFETIME_SECS,
            aud: account.token_uri.to_owned(),
            scope: FIREBASE_MESSAGE_SCOPE.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
    expires_in: u64,
}

/// OAuth2 access token for the FCM API, obtained with a signed
/// service-account assertion and cached until shortly before it expires
pub struct GoogleAuthToken {
    account: ServiceAccount,
    client: reqwest::Client,
    access_token: Option<String>,
    valid_till: Option<u64>,
    signing_key: Option<EncodingKey>,
}

impl GoogleAuthToken {
    pub fn new(account: ServiceAccount, client: reqwest::Client) -> Self {
        Self {
            account,
            client,
            access_token: None,
            valid_till: None,
            signing_key: None,
        }
    }

    pub async fn get_access_token(&mut self) -> anyhow::Result<&str> {
        if self.is_new_token_required(get_epoch_ts()) {
            self.new_access_token().await?;
        }
        let token = self
            .access_token
            .as_deref()
            .ok_or(anyhow::anyhow!("access_token not found"))?;
        Ok(token)
    }

    fn get_signing_key(&mut self) -> anyhow::Result<&EncodingKey> {
        if self.signing_key.is_none() {
            let key = EncodingKey::from_rsa_pem(self.account.private_key.as_bytes())?;
            self.signing_key = Some(key);
        }
        let signing_key = self
            .signing_key
            .as_ref()
            .ok_or(anyhow::anyhow!("signing_key not found"))?;
        Ok(signing_key)
    }

    fn is_new_token_required(&self, ts: u64) -> bool {
        match (&self.access_token, self.valid_till) {
            (Some(_), Some(valid_till)) => ts >= valid_till,
            _ => true,
        }
    }

    async fn new_access_token(&mut self) -> anyhow::Result<()> {
        tracing::debug!("requesting new FCM access token");
        let signed_jwt = self.new_jwt()?;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "application/x-www-form-urlencoded".parse()?);
        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", signed_jwt.as_str()),
        ];
        let response = self
            .client
            .post(&self.account.token_uri)
            .headers(headers)
            .form(&params)
            .send()
            .await?
            .error_for_status()?
            .json::<GoogleTokenResponse>()
            .await?;
        let ts = get_epoch_ts();
        let valid_till = ts + response.expires_in;
        let valid_till = valid_till.saturating_sub(ACCESS_TOKEN_REFRESH_MARGIN_SECS);
        self.access_token = Some(response.access_token);
        self.valid_till = Some(valid_till);

        Ok(())
    }

    fn new_jwt(&mut self) -> anyhow::Result<String> {
        let claims = GoogleTokenClaims::new(&self.account, get_epoch_ts());
        let key = self.get_signing_key()?;
        let header = Header::new(Algorithm::RS256);
        let jwt = encode(&header, &claims, key)?;
        Ok(jwt)
    }
}
