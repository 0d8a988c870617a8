use crate::config::Settings;
use crate::models::Signal;
use anyhow::{Context, Result, bail};
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

const COLUMNS: [&str; 11] = [
    "Ticker",
    "Trend",
    "Underlying",
    "Option",
    "Type",
    "Strike",
    "Expiry",
    "Delta",
    "Open Interest",
    "Mark",
    "Projected Return",
];

// -----------------------------------------------
// MESSAGE BODY
// -----------------------------------------------

/// One report row, already formatted for display
pub fn format_row(signal: &Signal) -> [String; 11] {
    [
        signal.ticker.clone(),
        signal.trend.to_string(),
        signal
            .underlying_price
            .map(|p| format!("{:.2}", p))
            .unwrap_or_else(|| "n/a".to_string()),
        signal.option_symbol.clone().unwrap_or_else(|| "n/a".to_string()),
        signal.contract_type.to_string(),
        format!("{:.2}", signal.strike_price),
        signal.expiration_date.clone(),
        format!("{:.2}", signal.delta),
        signal.open_interest.to_string(),
        format!("{:.2}", signal.mark),
        signal
            .projected_return_pct
            .map(|r| format!("{:.1}%", r))
            .unwrap_or_else(|| "n/a".to_string()),
    ]
}

pub fn build_email_html(signals: &[Signal]) -> String {
    let mut html = String::new();
    html.push_str("<html>\n  <body>\n");
    html.push_str("    <h2>Options Signal Bot</h2>\n");
    html.push_str("    <p>Here are the latest candidates from the Massive.com data scan.</p>\n");
    html.push_str("    <table border=\"1\" cellpadding=\"4\" cellspacing=\"0\">\n");

    html.push_str("      <thead>\n        <tr>\n");
    for col in COLUMNS {
        html.push_str(&format!("          <th>{}</th>\n", col));
    }
    html.push_str("        </tr>\n      </thead>\n");

    html.push_str("      <tbody>\n");
    for signal in signals {
        html.push_str("        <tr>\n");
        for cell in format_row(signal) {
            html.push_str(&format!("          <td>{}</td>\n", escape_html(&cell)));
        }
        html.push_str("        </tr>\n");
    }
    html.push_str("      </tbody>\n");

    html.push_str("    </table>\n  </body>\n</html>\n");
    html
}

/// Plain-text alternative for clients that don't render HTML
pub fn build_email_text(signals: &[Signal]) -> String {
    let mut text = String::from("Options Signal Bot\n\n");
    for signal in signals {
        let row = format_row(signal);
        text.push_str(&format!(
            "{} {} | {} {} strike {} exp {} | delta {} OI {} mark {} | underlying {} | projected {}\n",
            row[0], row[1], row[3], row[4], row[5], row[6], row[7], row[8], row[9], row[2], row[10]
        ));
    }
    text
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// -----------------------------------------------
// SMTP SENDER
// -----------------------------------------------
pub struct SmtpMailer {
    host: String,
    port: u16,
    username: String,
    password: String,
    from: Mailbox,
    recipients: Vec<Mailbox>,
}

impl SmtpMailer {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let username = settings.smtp_username.clone().context("SMTP_USERNAME is not set")?;
        let password = settings.smtp_password.clone().context("SMTP_PASSWORD is not set")?;
        let from = settings
            .email_from
            .as_deref()
            .context("EMAIL_FROM is not set")?
            .parse::<Mailbox>()
            .context("Invalid EMAIL_FROM address")?;

        let recipients = settings
            .email_to
            .iter()
            .map(|addr| {
                addr.parse::<Mailbox>()
                    .with_context(|| format!("Invalid recipient address '{}'", addr))
            })
            .collect::<Result<Vec<_>>>()?;

        if recipients.is_empty() {
            bail!("No email recipients configured");
        }

        Ok(Self {
            host: settings.smtp_host.clone(),
            port: settings.smtp_port,
            username,
            password,
            from,
            recipients,
        })
    }

    pub fn build_message(&self, subject: &str, html: String, text: String) -> Result<Message> {
        let mut builder = Message::builder().from(self.from.clone()).subject(subject);
        for to in &self.recipients {
            builder = builder.to(to.clone());
        }

        builder
            .multipart(MultiPart::alternative_plain_html(text, html))
            .context("Failed to build email message")
    }

    /// Send one multipart message over STARTTLS
    pub async fn send(&self, subject: &str, html: String, text: String) -> Result<()> {
        let message = self.build_message(subject, html, text)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)
            .with_context(|| format!("Failed to configure SMTP relay {}", self.host))?
            .port(self.port)
            .credentials(Credentials::new(self.username.clone(), self.password.clone()))
            .build();

        transport
            .send(message)
            .await
            .with_context(|| format!("Failed to send email via {}:{}", self.host, self.port))?;

        info!(recipients = self.recipients.len(), subject, "email sent");
        Ok(())
    }
}
