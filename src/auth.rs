//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

//! Authorization of mutating operations
//!
//! Every operation which changes the store takes an [`Authorized`] token. The only ways to get
//! one are an [`Authorizer`] accepting the credentials of a request, or [`Authorized::local`] for
//! the administrator operating on the database directly.

use std::sync::Arc;

use base64::prelude::*;
use sha2::Digest;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::db::Store;
use crate::error::Error;
use crate::error::Result;

/// Hex encoded sha256 of the salt followed by the password
pub fn hash_password(salt: &str, password: &str) -> String {
    format!("{:x}", Sha256::digest(format!("{}{}", salt, password).as_bytes()))
}

/// Compare `password` against a stored hash in constant time
pub fn verify_password(salt: &str, password: &str, hashed_password: &str) -> bool {
    hash_password(salt, password)
        .as_bytes()
        .ct_eq(hashed_password.as_bytes())
        .into()
}

/// Username and password of a request
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credentials({}:PASSWORD)", self.username)
    }
}

impl Credentials {
    /// Parse the value of an `Authorization: Basic ...` header
    pub fn from_basic_header(value: &str) -> Result<Credentials> {
        let encoded = value
            .strip_prefix("Basic ")
            .ok_or_else(|| Error::AuthorizationDenied(String::from("expected Basic credentials")))?;

        let decoded = BASE64_STANDARD
            .decode(encoded.trim().as_bytes())
            .map_err(|e| Error::AuthorizationDenied(format!("invalid base64 encoding: {}", e)))?;

        let decoded = String::from_utf8(decoded)
            .map_err(|e| Error::AuthorizationDenied(format!("invalid UTF-8 in credentials: {}", e)))?;

        let (username, password) = decoded
            .split_once(':')
            .ok_or_else(|| Error::AuthorizationDenied(String::from("credentials must be 'username:password'")))?;

        Ok(Credentials {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

/// Proof that the caller may change the store
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Authorized {
    username: String,
}

impl Authorized {
    /// The local administrator, who has direct access to the database anyways
    pub fn local() -> Authorized {
        Authorized {
            username: String::from("local"),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

pub trait Authorizer: Send + Sync {
    /// Check the `Authorization` header of a request, if there is one
    fn authorize(&self, header: Option<&str>) -> Result<Authorized>;
}

/// Checks Basic credentials against the users table
pub struct UserAuthorizer {
    store: Arc<dyn Store>,
}

impl UserAuthorizer {
    pub fn new(store: Arc<dyn Store>) -> Self {
        UserAuthorizer { store }
    }
}

impl Authorizer for UserAuthorizer {
    fn authorize(&self, header: Option<&str>) -> Result<Authorized> {
        let credentials = header
            .ok_or_else(|| Error::AuthorizationDenied(String::from("no credentials given")))
            .and_then(Credentials::from_basic_header)?;

        let user = match self.store.user_by_name(&credentials.username) {
            Ok(user) => user,
            Err(Error::NotFound { .. }) => {
                debug!("Unknown user {}", credentials.username);
                return Err(Error::AuthorizationDenied(String::from("invalid username or password")));
            }
            Err(e) => return Err(e),
        };

        if !user.is_active {
            debug!("User {} is not active", user.username);
            return Err(Error::AuthorizationDenied(String::from("user is not active")));
        }

        if !verify_password(&user.salt, &credentials.password, &user.hashed_password) {
            debug!("Wrong password for user {}", user.username);
            return Err(Error::AuthorizationDenied(String::from("invalid username or password")));
        }

        Ok(Authorized {
            username: user.username,
        })
    }
}
