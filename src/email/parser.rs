/// Email parser using mail-parser crate
use crate::error::MailgateError;
use crate::models::{Attachment, Email, EmailAddress, EmailBody};
use async_trait::async_trait;
use chrono::Utc;
use mail_parser::{Addr, Address, MessageParser, MimeHeaders, PartType};
use std::collections::HashMap;

#[async_trait]
pub trait EmailParser: Send + Sync {
    async fn parse(&self, raw_email: &[u8]) -> Result<Email, MailgateError>;
}

pub struct MailParserEmailParser;

impl MailParserEmailParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_addr(addr: &Addr) -> EmailAddress {
        EmailAddress {
            address: addr
                .address
                .as_ref()
                .map(|a| a.to_string())
                .unwrap_or_default(),
            name: addr.name.as_ref().map(|n| n.to_string()),
        }
    }

    fn extract_addresses(address: Option<&Address>) -> Vec<EmailAddress> {
        match address {
            Some(Address::List(list)) => list.iter().map(Self::parse_addr).collect(),
            Some(Address::Group(groups)) => groups
                .iter()
                .flat_map(|g| g.addresses.iter())
                .map(Self::parse_addr)
                .collect(),
            None => vec![],
        }
    }

    fn extract_attachments(message: &mail_parser::Message) -> Vec<Attachment> {
        let mut attachments = Vec::new();

        for part in message.parts.iter() {
            let Some(filename) = part.attachment_name() else {
                continue;
            };

            let content_type = part
                .content_type()
                .map(|ct| match ct.subtype() {
                    Some(subtype) => format!("{}/{}", ct.ctype(), subtype),
                    None => ct.ctype().to_string(),
                })
                .unwrap_or_else(|| "application/octet-stream".to_string());

            if let Some(content) = Self::get_part_body(part) {
                let size = content.len();
                attachments.push(Attachment {
                    filename: Some(filename.to_string()),
                    content_type,
                    content,
                    size,
                });
            }
        }

        attachments
    }

    fn get_part_body(part: &mail_parser::MessagePart) -> Option<Vec<u8>> {
        match &part.body {
            PartType::Text(text) => Some(text.as_bytes().to_vec()),
            PartType::Html(html) => Some(html.as_bytes().to_vec()),
            PartType::Binary(data) => Some(data.to_vec()),
            PartType::InlineBinary(data) => Some(data.to_vec()),
            _ => None,
        }
    }

    fn extract_headers(message: &mail_parser::Message) -> HashMap<String, String> {
        message
            .headers()
            .iter()
            .filter_map(|header| {
                header
                    .value()
                    .as_text()
                    .map(|text| (header.name().to_string(), text.to_string()))
            })
            .collect()
    }
}

impl Default for MailParserEmailParser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmailParser for MailParserEmailParser {
    async fn parse(&self, raw_email: &[u8]) -> Result<Email, MailgateError> {
        let message = MessageParser::default()
            .parse(raw_email)
            .ok_or_else(|| MailgateError::EmailParsing("Failed to parse email".to_string()))?;

        let from = message
            .from()
            .and_then(|f| f.as_list())
            .and_then(|list| list.first())
            .map(Self::parse_addr);

        let to = Self::extract_addresses(message.to());

        let subject = message.subject().unwrap_or_default().to_string();

        let message_id = message.message_id().map(|id| id.to_string());

        let body = EmailBody {
            text: message.body_text(0).map(|t| t.to_string()),
            html: message.body_html(0).map(|h| h.to_string()),
        };

        let headers = Self::extract_headers(&message);
        let attachments = Self::extract_attachments(&message);

        Ok(Email {
            message_id,
            from,
            to,
            subject,
            body,
            attachments,
            headers,
            received_at: Utc::now(),
            tags: vec![], // attached by the pipeline from the recipient address
        })
    }
}
