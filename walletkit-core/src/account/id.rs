use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const ID_TYPE: &str = "js";
const ID_VERSION: &str = "2";
const SUB_ACCOUNT_SEPARATOR: char = '+';

/// Stable account identifier, a pure function of currency, address and
/// derivation mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId {
    pub currency: String,
    pub xpub_or_address: String,
    pub derivation_mode: String,
}

impl AccountId {
    pub fn new(
        currency: impl Into<String>,
        xpub_or_address: impl Into<String>,
        derivation_mode: impl Into<String>,
    ) -> Self {
        Self {
            currency: currency.into(),
            xpub_or_address: xpub_or_address.into(),
            derivation_mode: derivation_mode.into(),
        }
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}",
            ID_TYPE, ID_VERSION, self.currency, self.xpub_or_address, self.derivation_mode
        )
    }
}

impl FromStr for AccountId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.splitn(5, ':').collect();
        match parts.as_slice() {
            [ID_TYPE, ID_VERSION, currency, address, mode]
                if !currency.is_empty() && !address.is_empty() =>
            {
                Ok(AccountId::new(*currency, *address, *mode))
            }
            _ => Err(Error::InvalidAccountId(s.to_string())),
        }
    }
}

/// Encode the id of a token sub-account nested under `parent_id`.
pub fn encode_sub_account_id(parent_id: &str, token_id: &str) -> String {
    format!(
        "{}{}{}",
        parent_id,
        SUB_ACCOUNT_SEPARATOR,
        escape_component(token_id)
    )
}

/// Split a sub-account id into its parent account id and token id.
pub fn decode_sub_account_id(id: &str) -> Result<(AccountId, String)> {
    let (parent, token) = id
        .split_once(SUB_ACCOUNT_SEPARATOR)
        .ok_or_else(|| Error::InvalidAccountId(id.to_string()))?;
    let token = unescape_component(token).ok_or_else(|| Error::InvalidAccountId(id.to_string()))?;
    Ok((parent.parse()?, token))
}

fn escape_component(s: &str) -> String {
    s.replace('%', "%25").replace('+', "%2B")
}

fn unescape_component(s: &str) -> Option<String> {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let code = rest.get(pos + 1..pos + 3)?;
        match code {
            "25" => out.push('%'),
            "2B" | "2b" => out.push('+'),
            _ => return None,
        }
        rest = &rest[pos + 3..];
    }
    out.push_str(rest);
    Some(out)
}
