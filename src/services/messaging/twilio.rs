use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;

use super::MessagingProvider;

const SEND_TIMEOUT: Duration = Duration::from_secs(15);

/// Sends WhatsApp messages through Twilio's Messages API.
pub struct TwilioWhatsAppProvider {
    account_sid: String,
    auth_token: String,
    from_number: String,
    client: reqwest::Client,
}

impl TwilioWhatsAppProvider {
    pub fn new(account_sid: String, auth_token: String, from_number: String) -> Self {
        Self {
            account_sid,
            auth_token,
            from_number,
            client: reqwest::Client::builder()
                .timeout(SEND_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }
}

/// Twilio routes to WhatsApp when both ends use the `whatsapp:` scheme.
pub fn whatsapp_address(number: &str) -> String {
    let number = number.trim();
    if number.starts_with("whatsapp:") {
        number.to_string()
    } else {
        format!("whatsapp:{number}")
    }
}

#[async_trait]
impl MessagingProvider for TwilioWhatsAppProvider {
    async fn send_message(&self, to: &str, body: &str) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.account_sid.is_empty(),
            "TWILIO_ACCOUNT_SID is not configured"
        );

        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.account_sid
        );
        let to = whatsapp_address(to);
        let from = whatsapp_address(&self.from_number);

        self.client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to.as_str()), ("From", from.as_str()), ("Body", body)])
            .send()
            .await
            .context("failed to send WhatsApp message via Twilio")?
            .error_for_status()
            .context("Twilio API returned error")?;

        Ok(())
    }
}
