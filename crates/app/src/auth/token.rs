//! Bearer tokens of the form `bz_v1_<uuid>.<hex secret>`.
//!
//! Only a SHA-256 verifier of the token is stored. The verifier binds the
//! token uuid, its version and the owning principal.

use std::{fmt, str::FromStr};

use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;
use zeroize::{Zeroize, Zeroizing};

const PREFIX: &str = "bz";

const SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiTokenVersion {
    V1,
}

impl ApiTokenVersion {
    #[must_use]
    pub const fn as_i16(self) -> i16 {
        match self {
            Self::V1 => 1,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::V1 => "v1",
        }
    }

    fn from_label(label: &str) -> Result<Self, ApiTokenError> {
        match label {
            "v1" => Ok(Self::V1),
            _ => Err(ApiTokenError::UnsupportedVersion),
        }
    }
}

impl TryFrom<i16> for ApiTokenVersion {
    type Error = ApiTokenError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::V1),
            _ => Err(ApiTokenError::UnsupportedVersion),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiTokenError {
    #[error("api token format is invalid")]
    InvalidFormat,

    #[error("api token uses an unsupported version")]
    UnsupportedVersion,

    #[error("api token secret encoding is invalid")]
    InvalidSecretEncoding,
}

/// A raw bearer token, as issued once to an operator or presented by a client.
pub struct BearerToken {
    uuid: Uuid,
    version: ApiTokenVersion,
    secret: Zeroizing<[u8; SECRET_LEN]>,
}

impl BearerToken {
    /// Mint a fresh current-version token with a random secret.
    #[must_use]
    pub fn generate(uuid: Uuid) -> Self {
        let mut secret = Zeroizing::new([0_u8; SECRET_LEN]);

        OsRng.fill_bytes(secret.as_mut_slice());

        Self {
            uuid,
            version: ApiTokenVersion::V1,
            secret,
        }
    }

    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.uuid
    }

    #[must_use]
    pub const fn version(&self) -> ApiTokenVersion {
        self.version
    }

    /// Hex SHA-256 over `uuid:version:principal:secret`.
    #[must_use]
    pub fn verifier(&self, principal_uuid: Uuid) -> String {
        let mut input = format!(
            "{}:{}:{}:{}",
            self.uuid.simple(),
            self.version.as_i16(),
            principal_uuid.simple(),
            hex(self.secret.as_slice()),
        );

        let digest = Sha256::digest(input.as_bytes());

        input.zeroize();

        format!("{digest:x}")
    }

    /// Compare against a stored verifier without short-circuiting on the first mismatch.
    #[must_use]
    pub fn matches(&self, principal_uuid: Uuid, stored: &str) -> bool {
        let expected = self.verifier(principal_uuid);

        expected.len() == stored.len()
            && expected
                .bytes()
                .zip(stored.bytes())
                .fold(0_u8, |diff, (a, b)| diff | (a ^ b))
                == 0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken")
            .field("uuid", &self.uuid)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{PREFIX}_{}_{}.{}",
            self.version.label(),
            self.uuid.simple(),
            hex(self.secret.as_slice())
        )
    }
}

impl FromStr for BearerToken {
    type Err = ApiTokenError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (head, secret_hex) = raw.split_once('.').ok_or(ApiTokenError::InvalidFormat)?;

        let mut parts = head.splitn(3, '_');

        let (Some(PREFIX), Some(version), Some(uuid)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(ApiTokenError::InvalidFormat);
        };

        let version = ApiTokenVersion::from_label(version)?;
        let uuid = Uuid::try_parse(uuid)
            .ok()
            .ok_or(ApiTokenError::InvalidFormat)?;
        let secret = unhex(secret_hex).ok_or(ApiTokenError::InvalidSecretEncoding)?;

        Ok(Self {
            uuid,
            version,
            secret,
        })
    }
}

fn hex(bytes: &[u8]) -> String {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";

    let mut encoded = String::with_capacity(bytes.len() * 2);

    for nibble in bytes.iter().flat_map(|byte| [byte >> 4, byte & 0x0f]) {
        if let Some(digit) = DIGITS.get(usize::from(nibble)) {
            encoded.push(char::from(*digit));
        }
    }

    encoded
}

fn unhex(encoded: &str) -> Option<Zeroizing<[u8; SECRET_LEN]>> {
    if encoded.len() != SECRET_LEN * 2 {
        return None;
    }

    let mut secret = Zeroizing::new([0_u8; SECRET_LEN]);

    for (byte, pair) in secret.iter_mut().zip(encoded.as_bytes().chunks_exact(2)) {
        let [hi, lo] = pair else {
            return None;
        };

        *byte = (nibble(*hi)? << 4) | nibble(*lo)?;
    }

    Some(secret)
}

fn nibble(value: u8) -> Option<u8> {
    char::from(value)
        .to_digit(16)
        .and_then(|digit| u8::try_from(digit).ok())
}
