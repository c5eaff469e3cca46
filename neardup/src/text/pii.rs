use regex::Regex;

use crate::error::Result;

pub const EMAIL_TOKEN: &str = "|||EMAIL_ADDRESS|||";
pub const PHONE_TOKEN: &str = "|||PHONE_NUMBER|||";
pub const IP_TOKEN: &str = "|||IP_ADDRESS|||";

const EMAIL_PATTERN: &str = r"(?i)\b[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}\b";
const PHONE_PATTERN: &str = r"(\+\d{1,2}\s?)?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}";
const IPV4_PATTERN: &str = r"(?:(?:25[0-5]|2[0-4][0-9]|1[0-9][0-9]|[1-9][0-9]|[0-9])\.){3}(?:25[0-5]|2[0-4][0-9]|1[0-9][0-9]|[1-9][0-9]|[0-9])";

/// Replaces personal identifiers in text with fixed placeholder tokens.
///
/// Every `mask_*` method returns the masked text together with the number of
/// replacements made.
#[derive(Clone, Debug)]
pub struct PiiMasker {
    email: Regex,
    phone: Regex,
    ipv4: Regex,
}

impl PiiMasker {
    pub fn new() -> Result<Self> {
        Ok(PiiMasker {
            email: Regex::new(EMAIL_PATTERN)?,
            phone: Regex::new(PHONE_PATTERN)?,
            ipv4: Regex::new(IPV4_PATTERN)?,
        })
    }

    pub fn mask_emails(&self, text: &str) -> (String, usize) {
        mask(&self.email, text, EMAIL_TOKEN)
    }

    pub fn mask_phone_numbers(&self, text: &str) -> (String, usize) {
        mask(&self.phone, text, PHONE_TOKEN)
    }

    pub fn mask_ips(&self, text: &str) -> (String, usize) {
        mask(&self.ipv4, text, IP_TOKEN)
    }

    /// Applies email, phone and IP masking in that order.
    pub fn mask_all(&self, text: &str) -> (String, usize) {
        let (text, emails) = self.mask_emails(text);
        let (text, phones) = self.mask_phone_numbers(&text);
        let (text, ips) = self.mask_ips(&text);
        (text, emails + phones + ips)
    }
}

fn mask(pattern: &Regex, text: &str, token: &str) -> (String, usize) {
    let count = pattern.find_iter(text).count();
    if count == 0 {
        return (text.to_string(), 0);
    }
    (pattern.replace_all(text, token).into_owned(), count)
}
