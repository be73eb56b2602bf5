use crate::errors::ProviderError;
use crate::models::LeadLookupInput;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

/// Sentinel used when no company information exists at all.
pub const FALLBACK_WEBSITE: &str = "unknown.com";

/// Default API root shared by the three providers.
pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://api.genesy.ai/api/tmp";

/// The three phone data providers, in their canonical quality/priority roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Best data in the market, but slow and fails sometimes.
    OrionConnect,
    /// Worst data in the market, but the fastest one.
    AstraDialer,
    /// New provider in the market.
    NimbusLookup,
}

impl ProviderKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::OrionConnect => "orion_connect",
            ProviderKind::AstraDialer => "astra_dialer",
            ProviderKind::NimbusLookup => "nimbus_lookup",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "orion_connect" => Some(ProviderKind::OrionConnect),
            "astra_dialer" => Some(ProviderKind::AstraDialer),
            "nimbus_lookup" => Some(ProviderKind::NimbusLookup),
            _ => None,
        }
    }
}

/// A lead mapped into one provider's request shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderRequest {
    OrionConnect {
        full_name: String,
        company_website: String,
    },
    AstraDialer {
        email: String,
    },
    NimbusLookup {
        email: String,
        job_title: String,
    },
}

/// Derives a website from a company name: lower-case, strip everything that
/// is not a-z or 0-9, append the default domain suffix. Returns `None` when
/// nothing survives the stripping.
pub fn derive_company_website(company_name: &str) -> Option<String> {
    let pattern = Regex::new("[^a-z0-9]").unwrap();
    let domain = pattern
        .replace_all(&company_name.to_lowercase(), "")
        .to_string();
    if domain.is_empty() {
        None
    } else {
        Some(format!("{}.com", domain))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// HTTP adapter for one provider.
///
/// Failure classification follows the provider contract: network errors and
/// HTTP >= 500 are transient, HTTP 4xx and undecodable bodies are permanent.
/// An empty or whitespace-only phone string is reported as no-data, never as
/// a value.
pub struct ProviderAdapter {
    kind: ProviderKind,
    client: Client,
    base_url: String,
    api_key: String,
}

impl ProviderAdapter {
    pub fn new(kind: ProviderKind, base_url: String, api_key: String) -> Self {
        Self {
            kind,
            client: Client::new(),
            base_url,
            api_key,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Maps the canonical input into this provider's request shape, applying
    /// the deterministic fallback derivations. `None` means the required
    /// fields cannot be derived and the provider is skipped for this lead.
    pub fn request_for(&self, input: &LeadLookupInput) -> Option<ProviderRequest> {
        match self.kind {
            ProviderKind::OrionConnect => {
                let full_name = input.full_name();
                if full_name.is_empty() {
                    return None;
                }
                let company_website = non_empty(input.company_website.clone())
                    .or_else(|| {
                        input
                            .company_name
                            .as_deref()
                            .and_then(derive_company_website)
                    })
                    .unwrap_or_else(|| FALLBACK_WEBSITE.to_string());
                Some(ProviderRequest::OrionConnect {
                    full_name,
                    company_website,
                })
            }
            ProviderKind::AstraDialer => {
                let email = non_empty(Some(input.email.clone()))?;
                Some(ProviderRequest::AstraDialer { email })
            }
            ProviderKind::NimbusLookup => {
                let email = non_empty(Some(input.email.clone()))?;
                let job_title =
                    non_empty(input.job_title.clone()).unwrap_or_else(|| "Unknown".to_string());
                Some(ProviderRequest::NimbusLookup { email, job_title })
            }
        }
    }

    /// Performs one lookup call. Returns the phone string, `None` for a valid
    /// "no phone for this lead" answer, or a classified error.
    pub async fn lookup(&self, request: ProviderRequest) -> Result<Option<String>, ProviderError> {
        match request {
            ProviderRequest::OrionConnect {
                full_name,
                company_website,
            } => self.lookup_orion(&full_name, &company_website).await,
            ProviderRequest::AstraDialer { email } => self.lookup_astra(&email).await,
            ProviderRequest::NimbusLookup { email, job_title } => {
                self.lookup_nimbus(&email, &job_title).await
            }
        }
    }

    async fn lookup_orion(
        &self,
        full_name: &str,
        company_website: &str,
    ) -> Result<Option<String>, ProviderError> {
        #[derive(Deserialize)]
        struct OrionResponse {
            phone: Option<String>,
        }

        let url = format!("{}/orionConnect", self.base_url);
        tracing::debug!("Looking up phone via Orion Connect for {}", full_name);

        let response = self
            .client
            .post(&url)
            .header("x-auth-me", &self.api_key)
            .json(&json!({
                "fullName": full_name,
                "companyWebsite": company_website,
            }))
            .send()
            .await?;

        let response = Self::check_status("orion_connect", response).await?;
        let body: OrionResponse = response.json().await?;
        Ok(non_empty(body.phone))
    }

    async fn lookup_astra(&self, email: &str) -> Result<Option<String>, ProviderError> {
        #[derive(Deserialize)]
        struct AstraResponse {
            #[serde(rename = "phoneNmbr")]
            phone_nmbr: Option<String>,
        }

        let url = format!("{}/astraDialer", self.base_url);
        tracing::debug!("Looking up phone via Astra Dialer for {}", email);

        let response = self
            .client
            .post(&url)
            .header("apiKey", &self.api_key)
            .json(&json!({ "email": email }))
            .send()
            .await?;

        let response = Self::check_status("astra_dialer", response).await?;
        let body: AstraResponse = response.json().await?;
        Ok(non_empty(body.phone_nmbr))
    }

    async fn lookup_nimbus(
        &self,
        email: &str,
        job_title: &str,
    ) -> Result<Option<String>, ProviderError> {
        #[derive(Deserialize)]
        struct NimbusResponse {
            number: Option<i64>,
            #[serde(rename = "countryCode")]
            country_code: Option<String>,
        }

        // The API key travels as a query parameter for this provider.
        let url = reqwest::Url::parse_with_params(
            &format!("{}/numbusLookup", self.base_url),
            &[("api", self.api_key.as_str())],
        )
        .map_err(|e| ProviderError::Permanent(format!("failed to build URL: {}", e)))?;

        tracing::debug!("Looking up phone via Nimbus Lookup for {}", email);

        let response = self
            .client
            .post(url)
            .json(&json!({
                "email": email,
                "jobTitle": job_title,
            }))
            .send()
            .await?;

        let response = Self::check_status("nimbus_lookup", response).await?;
        let body: NimbusResponse = response.json().await?;

        match body.number {
            Some(number) => {
                let country_code = body.country_code.unwrap_or_default();
                Ok(non_empty(Some(format!("{}{}", country_code, number))))
            }
            None => Ok(None),
        }
    }

    async fn check_status(
        provider: &str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(ProviderError::from_status(
            status,
            format!("{} returned {}: {}", provider, status, error_text),
        ))
    }
}
