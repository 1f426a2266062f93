use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

const COUNTRY_CALLING_CODE: &str = "+233";
const NATIONAL_TRUNK_PREFIX: char = '0';

#[derive(Clone, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub username: Option<String>,
    pub api_key: Option<String>,
    pub api_url: String,
    pub sender_id: Option<String>,
    pub invite_link: String,
    #[serde(with = "humantime_serde")]
    pub send_timeout: Duration,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("SMS provider request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("SMS provider rejected the message: {0}")]
    Rejected(String),
}

/// What became of one dispatched welcome message.
#[derive(Debug)]
pub struct DeliveryReport {
    pub delivered: bool,
    pub detail: String,
}

#[async_trait::async_trait]
pub trait SmsGateway: Send + Sync {
    /// Attempts delivery to an already-normalized number and returns the
    /// provider's acknowledgement text.
    async fn send(&self, phone: &str, message: &str) -> Result<String, Error>;
}

/// The production gateway: one form POST per message to the provider's
/// messaging endpoint.
pub struct HttpSmsGateway {
    client: reqwest::Client,
    api_url: String,
    username: String,
    api_key: String,
    sender_id: Option<String>,
}

impl HttpSmsGateway {
    fn new(config: &Config, username: String, api_key: String) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(config.send_timeout)
            .build()?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            username,
            api_key,
            sender_id: config.sender_id.clone(),
        })
    }
}

#[async_trait::async_trait]
impl SmsGateway for HttpSmsGateway {
    async fn send(&self, phone: &str, message: &str) -> Result<String, Error> {
        let mut form = vec![
            ("username", self.username.as_str()),
            ("to", phone),
            ("message", message),
        ];
        if let Some(sender_id) = &self.sender_id {
            form.push(("from", sender_id.as_str()));
        }
        let response = self
            .client
            .post(&self.api_url)
            .header("apiKey", &self.api_key)
            .header("Accept", "application/json")
            .form(&form)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(Error::Rejected(format!("{status}: {body}")))
        }
    }
}

/// Sends the welcome SMS after a successful registration. Dispatch is
/// fire-and-forget: the HTTP exchange runs on its own task so a slow or
/// failing provider never holds up the request that committed the record.
#[derive(Clone)]
pub struct Notifier {
    gateway: Option<Arc<dyn SmsGateway>>,
    invite_link: String,
}

impl Notifier {
    /// Builds the notifier from explicit configuration. Missing credentials
    /// disable delivery rather than failing startup.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let gateway: Option<Arc<dyn SmsGateway>> = match (&config.username, &config.api_key) {
            (Some(username), Some(api_key)) => Some(Arc::new(HttpSmsGateway::new(
                config,
                username.clone(),
                api_key.clone(),
            )?)),
            _ => {
                tracing::warn!("SMS credentials missing, welcome messages disabled");
                None
            }
        };
        Ok(Self {
            gateway,
            invite_link: config.invite_link.clone(),
        })
    }

    pub fn with_gateway(gateway: Arc<dyn SmsGateway>, invite_link: impl Into<String>) -> Self {
        Self {
            gateway: Some(gateway),
            invite_link: invite_link.into(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.gateway.is_some()
    }

    /// Queues the welcome message for `phone` and returns a channel carrying
    /// the eventual outcome. The caller is free to drop the receiver; the
    /// outcome is logged either way.
    pub fn dispatch(&self, phone: &str, name: &str) -> oneshot::Receiver<DeliveryReport> {
        let (report_tx, report_rx) = oneshot::channel();
        let Some(gateway) = self.gateway.clone() else {
            let _ = report_tx.send(DeliveryReport {
                delivered: false,
                detail: "SMS not configured".to_owned(),
            });
            return report_rx;
        };
        let recipient = normalize_phone(phone);
        let message = welcome_message(name, &self.invite_link);
        tokio::spawn(async move {
            let report = match gateway.send(&recipient, &message).await {
                Ok(detail) => {
                    tracing::info!(%recipient, "welcome SMS delivered");
                    DeliveryReport {
                        delivered: true,
                        detail,
                    }
                }
                Err(err) => {
                    tracing::warn!(%recipient, error = %err, "welcome SMS failed");
                    DeliveryReport {
                        delivered: false,
                        detail: err.to_string(),
                    }
                }
            };
            let _ = report_tx.send(report);
        });
        report_rx
    }
}

/// Collapses a locally-written number to one regional `+233...` form:
/// spaces and hyphens go, a national trunk `0` becomes the country calling
/// code, and a number with no prefix at all gets the code prepended.
pub fn normalize_phone(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|c| *c != ' ' && *c != '-').collect();
    if let Some(rest) = cleaned.strip_prefix(NATIONAL_TRUNK_PREFIX) {
        format!("{COUNTRY_CALLING_CODE}{rest}")
    } else if cleaned.starts_with('+') {
        cleaned
    } else {
        format!("{COUNTRY_CALLING_CODE}{cleaned}")
    }
}

fn welcome_message(name: &str, invite_link: &str) -> String {
    format!(
        "Hello {name}!\n\n\
         Welcome to the Footprints Disabled Impact family!\n\n\
         You have been successfully registered.\n\n\
         Please join our official WhatsApp group:\n{invite_link}\n\n\
         We look forward to supporting you!\n\n\
         - FDI Team"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn normalize_rewrites_the_trunk_prefix_to_the_country_code() {
        assert_eq!(normalize_phone("0244123456"), "+233244123456");
    }

    #[test]
    fn normalize_strips_spaces_and_hyphens() {
        assert_eq!(normalize_phone("024 412-34 56"), "+233244123456");
    }

    #[test]
    fn normalize_keeps_an_existing_international_prefix() {
        assert_eq!(normalize_phone("+233244123456"), "+233244123456");
        assert_eq!(normalize_phone("+44 7700 900123"), "+447700900123");
    }

    #[test]
    fn normalize_prepends_the_country_code_when_no_prefix_is_recognized() {
        assert_eq!(normalize_phone("244123456"), "+233244123456");
    }

    struct RecordingGateway {
        sent: Mutex<Vec<(String, String)>>,
        outcome: Result<String, ()>,
    }

    #[async_trait::async_trait]
    impl SmsGateway for RecordingGateway {
        async fn send(&self, phone: &str, message: &str) -> Result<String, Error> {
            self.sent
                .lock()
                .expect("lock")
                .push((phone.to_owned(), message.to_owned()));
            match &self.outcome {
                Ok(detail) => Ok(detail.clone()),
                Err(()) => Err(Error::Rejected("provider unavailable".to_owned())),
            }
        }
    }

    #[tokio::test]
    async fn dispatch_normalizes_the_recipient_and_reports_delivery() {
        let gateway = Arc::new(RecordingGateway {
            sent: Mutex::new(Vec::new()),
            outcome: Ok("queued".to_owned()),
        });
        let notifier = Notifier::with_gateway(gateway.clone(), "https://chat.example/fdi");

        let report = notifier
            .dispatch("0244123456", "Ama Serwaa")
            .await
            .expect("the task should report back");
        assert!(report.delivered);
        assert_eq!(report.detail, "queued");

        let sent = gateway.sent.lock().expect("lock");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "+233244123456");
        assert!(sent[0].1.contains("Ama Serwaa"));
        assert!(sent[0].1.contains("https://chat.example/fdi"));
    }

    #[tokio::test]
    async fn dispatch_reports_failure_without_panicking_the_task() {
        let gateway = Arc::new(RecordingGateway {
            sent: Mutex::new(Vec::new()),
            outcome: Err(()),
        });
        let notifier = Notifier::with_gateway(gateway, "https://chat.example/fdi");

        let report = notifier
            .dispatch("0244123456", "Ama")
            .await
            .expect("the task should report back");
        assert!(!report.delivered);
        assert!(report.detail.contains("provider unavailable"));
    }

    #[tokio::test]
    async fn dispatch_resolves_immediately_when_sms_is_not_configured() {
        let config = Config {
            username: None,
            api_key: None,
            api_url: "https://api.example/messaging".to_owned(),
            sender_id: None,
            invite_link: "https://chat.example/fdi".to_owned(),
            send_timeout: Duration::from_secs(5),
        };
        let notifier = Notifier::from_config(&config).expect("should build");
        assert!(!notifier.enabled());

        let report = notifier
            .dispatch("0244123456", "Ama")
            .await
            .expect("a disabled notifier still reports");
        assert!(!report.delivered);
        assert_eq!(report.detail, "SMS not configured");
    }
}
