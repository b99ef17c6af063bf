//! Outgoing mail: contexts, recipients, bodies and the SMTP transport.
//!
//! Every run mails in exactly one context. The three test contexts redirect
//! supplier mail to internal addresses so the full pipeline can run without
//! reaching a single supplier; `live` uses the addresses from the dispatch
//! table and keeps the partner desk in copy.

use std::str::FromStr;

use lettre::message::header::ContentType;
use lettre::message::{Attachment as MessagePart, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::config::{Secrets, Settings};
use crate::error::{AppError, Result};
use crate::models::Discrepancies;
use crate::utils;

/// Internal operator addresses.
pub const INTERNAL_TO: [&str; 2] = ["sorin@robotlab.ro", "cosmin@robotlab.ro"];
pub const INTERNAL_CC: [&str; 1] = ["office@robotlab.ro"];
/// The partner's supply-chain desk.
pub const PARTNER_TO: [&str; 1] = ["rosupplychain@bolt.eu"];

/// This supplier's mail system rejects multi-attachment messages; it gets
/// one message per order file.
pub const PER_ATTACHMENT_SUPPLIER: &str = "STOCKDAY SRL";

/// Where a run's mail actually goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailContext {
    TestIntern,
    TestBolt,
    TestSorin,
    Live,
}

impl FromStr for MailContext {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "test-intern" => Ok(Self::TestIntern),
            "test-bolt" => Ok(Self::TestBolt),
            "test-sorin" => Ok(Self::TestSorin),
            "live" => Ok(Self::Live),
            other => Err(AppError::business_rule(format!(
                "unknown mailing context: {other}"
            ))),
        }
    }
}

/// Resolved to/cc lists for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipients {
    pub to: Vec<String>,
    pub cc: Vec<String>,
}

fn owned(addresses: &[&str]) -> Vec<String> {
    addresses.iter().map(|s| s.to_string()).collect()
}

impl MailContext {
    /// Recipients for a supplier order mail. Only `live` uses the supplier's
    /// own addresses.
    pub fn supplier_recipients(&self, supplier_addresses: &[String]) -> Recipients {
        match self {
            Self::TestIntern => Recipients {
                to: owned(&INTERNAL_TO),
                cc: owned(&INTERNAL_CC),
            },
            Self::TestBolt => Recipients {
                to: owned(&PARTNER_TO),
                cc: owned(&INTERNAL_CC),
            },
            Self::TestSorin => Recipients {
                to: vec![INTERNAL_TO[0].to_string()],
                cc: Vec::new(),
            },
            Self::Live => Recipients {
                to: supplier_addresses.to_vec(),
                cc: owned(&PARTNER_TO),
            },
        }
    }

    /// Recipients for the run summary. In `live` the summary goes to the
    /// partner desk with the operators in copy.
    pub fn summary_recipients(&self) -> Recipients {
        match self {
            Self::Live => Recipients {
                to: owned(&PARTNER_TO),
                cc: owned(&INTERNAL_CC),
            },
            other => other.supplier_recipients(&[]),
        }
    }
}

/// A file going out with a message.
#[derive(Debug, Clone)]
pub struct MailAttachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// SMTP mailer bound to the robot's sender account.
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl Mailer {
    pub fn new(settings: &Settings, secrets: &Secrets) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.smtp_host)
            .map_err(|e| AppError::dependency("smtp", e))?
            .credentials(Credentials::new(
                secrets.mail_sender.clone(),
                secrets.mail_password.clone(),
            ))
            .build();

        // messages present the partner desk as the visible sender
        let sender = Mailbox::new(
            Some(PARTNER_TO[0].to_string()),
            secrets
                .mail_sender
                .parse()
                .map_err(|e| AppError::structural("mailer", format!("bad sender address: {e}")))?,
        );

        Ok(Self { transport, sender })
    }

    /// Send one HTML message with zero or more attachments.
    pub async fn send(
        &self,
        recipients: &Recipients,
        subject: &str,
        body: &str,
        attachments: &[MailAttachment],
    ) -> Result<()> {
        let mut builder = Message::builder()
            .from(self.sender.clone())
            .subject(subject);

        for to in &recipients.to {
            builder = builder.to(parse_address(to)?);
        }
        for cc in &recipients.cc {
            builder = builder.cc(parse_address(cc)?);
        }

        let mut parts = MultiPart::mixed().singlepart(SinglePart::html(body.to_string()));
        for attachment in attachments {
            let content_type = ContentType::parse("text/csv")
                .map_err(|e| AppError::structural("mailer", e))?;
            parts = parts.singlepart(
                MessagePart::new(attachment.file_name.clone())
                    .body(attachment.bytes.clone(), content_type),
            );
        }

        let message = builder
            .multipart(parts)
            .map_err(|e| AppError::structural("mailer", e))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::dependency("smtp", e))?;

        info!("mail sent to {:?}", recipients.to);
        Ok(())
    }
}

fn parse_address(address: &str) -> Result<Mailbox> {
    address
        .parse()
        .map_err(|e| AppError::structural("mailer", format!("bad address {address:?}: {e}")))
}

/// Subject line carries the business date.
pub fn subject_today() -> String {
    format!("PO - {}", utils::business_now().format("%d.%m.%Y"))
}

/// The order mail sent to every supplier.
pub fn supplier_body() -> &'static str {
    "Buna ziua,<br><br>\
     Va rugam sa gasiti atasat o noua comanda.<br>\
     Avem rugamintea sa <b>atasati codurile de #PO, de pe a doua coloana, \
     pe fiecare factura aferenta livrarilor pentru fiecare locatie.</b><br><br>\
     Pentru orice intrebare, va rugam sa ne contactati.<br><br>\
     Multumim,<br>\
     Echipa Bolt Romania"
}

/// The run summary: what was sent, what was skipped and why.
pub fn summary_body(
    report: &Discrepancies,
    no_addresses: &[String],
    failed: &[String],
) -> String {
    format!(
        "Buna ziua,<br><br>\
         Procesul de trimitere POs a rulat cu succes. Regasiti aici rezumatul rularii.<br><br>\
         1. O lista cu mesajele trimise catre furnizori a fost atasata la prezentul mesaj.<br>\
         2. Urmatorii furnizori prezinta o serie de discrepante, dupa cum se mentioneaza mai jos:<br>\
         - Furnizori fara adresa de email: {no_addresses:?}<br>\
         - Furnizori pentru care s-a gasit PO, dar care nu apar in Cadentar: {:?}<br>\
         - Furnizori care apar in Cadentar, dar pentru care nu s-a gasit PO: {:?}<br>\
         - Furnizori a caror comenzi nu indeplinesc cerintele minime de cantitate: {:?}<br>\
         - Furnizori care au unele comenzi care indeplinesc si altele care nu indeplinesc \
         cerintele minime de cantitate: {:?}<br>\
         - Furnizori pentru care nu s-a gasit nicio informatie legata de cerintele minime \
         de cantitate: {:?}<br><br>\
         3. Nu s-a reusit trimiterea mailurilor catre urmatorii furnizori: {failed:?}<br><br>\
         Mentionam ca nu s-au trimis email-uri catre furnizorii prezenti in <b>oricare</b> \
         din cele 3 liste legate de cerintele minime de cantitate.<br><br>\
         Multumim,<br>\
         Echipa RobotLab",
        report.not_in_cad, report.not_in_wms, report.not_in_mov, report.both_mov, report.no_mov,
    )
}

/// CSV listing of `(supplier, store)` pairs attached to the summary.
pub fn summary_csv(sent: &[(String, String)]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["furnizori", "store"])?;
    for (supplier, store) in sent {
        writer.write_record([supplier.as_str(), store.as_str()])?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::structural("mailer", e))
}

/// Store particle of an order file name, with the supplier prefix removed:
/// `ACME SRL-Store1-PO-01.csv` with supplier `ACME SRL` gives `Store1`.
pub fn store_from_file(file_name: &str, supplier: &str) -> String {
    let stripped = file_name.replace(supplier, "");
    let trimmed = stripped.trim();
    let rest = trimmed.strip_prefix('-').unwrap_or(trimmed);
    rest.split('-').next().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_parses_known_values_only() {
        assert_eq!(MailContext::from_str("live").unwrap(), MailContext::Live);
        assert_eq!(
            MailContext::from_str("test-bolt").unwrap(),
            MailContext::TestBolt
        );
        assert!(MailContext::from_str("production").is_err());
    }

    #[test]
    fn live_context_uses_supplier_addresses() {
        let addresses = vec!["orders@acme.ro".to_string()];
        let recipients = MailContext::Live.supplier_recipients(&addresses);
        assert_eq!(recipients.to, addresses);
        assert_eq!(recipients.cc, PARTNER_TO);
    }

    #[test]
    fn test_contexts_never_reach_suppliers() {
        let addresses = vec!["orders@acme.ro".to_string()];
        for context in [
            MailContext::TestIntern,
            MailContext::TestBolt,
            MailContext::TestSorin,
        ] {
            let recipients = context.supplier_recipients(&addresses);
            assert!(!recipients.to.contains(&addresses[0]));
        }
    }

    #[test]
    fn summary_swaps_to_partner_in_live() {
        let recipients = MailContext::Live.summary_recipients();
        assert_eq!(recipients.to, PARTNER_TO);
        assert_eq!(recipients.cc, INTERNAL_CC);
    }

    #[test]
    fn store_extraction_drops_supplier_and_order_tail() {
        assert_eq!(
            store_from_file("ACME SRL-Store1-PO-01-2024.csv", "ACME SRL"),
            "Store1"
        );
    }

    #[test]
    fn summary_body_lists_discrepancies() {
        let report = Discrepancies {
            not_in_cad: vec!["ACME".to_string()],
            ..Discrepancies::default()
        };
        let body = summary_body(&report, &[], &["BETA".to_string()]);
        assert!(body.contains("ACME"));
        assert!(body.contains("BETA"));
    }

    #[test]
    fn summary_csv_has_headers() {
        let sent = vec![("ACME".to_string(), "Store1".to_string())];
        let bytes = summary_csv(&sent).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("furnizori,store\n"));
        assert!(text.contains("ACME,Store1"));
    }
}
