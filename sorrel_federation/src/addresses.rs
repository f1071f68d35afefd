use std::{fmt, str::FromStr};

use regex::Regex;
use thiserror::Error;

const ACTOR_ADDRESS_RE: &str = r"^(?P<username>[\w\.-]+)@(?P<hostname>[\w\.-]+)$";

#[derive(Debug, Error)]
#[error("invalid actor address")]
pub struct AddressError;

#[derive(Eq, Ord, PartialEq, PartialOrd)]
pub struct ActorAddress {
    username: String,
    hostname: String, // does not include port number
}

impl ActorAddress {
    pub fn new_unchecked(username: &str, hostname: &str) -> Self {
        Self {
            username: username.to_string(),
            hostname: hostname.to_string(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    // https://datatracker.ietf.org/doc/html/rfc7565#section-7
    pub fn from_acct_uri(uri: &str) -> Result<Self, AddressError> {
        let actor_address = uri.strip_prefix("acct:")
            .ok_or(AddressError)?
            .parse()?;
        Ok(actor_address)
    }

    pub fn to_acct_uri(&self) -> String {
        format!("acct:{}", self)
    }
}

impl FromStr for ActorAddress {
    type Err = AddressError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let actor_address_re = Regex::new(ACTOR_ADDRESS_RE)
            .expect("regexp should be valid");
        let caps = actor_address_re.captures(value)
            .ok_or(AddressError)?;
        let actor_address = Self {
            username: caps["username"].to_string(),
            hostname: caps["hostname"].to_string(),
        };
        Ok(actor_address)
    }
}

impl fmt::Display for ActorAddress {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}@{}", self.username, self.hostname)
    }
}
