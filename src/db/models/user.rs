//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::PgConnection;
use tracing::trace;

use crate::error::EntityKind;
use crate::error::Error;
use crate::error::Result;
use crate::error::ValidationErrors;
use crate::schema::users;

#[derive(Clone, Debug, Eq, PartialEq, Identifiable, Queryable, Selectable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub hashed_password: String,
    pub salt: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub hashed_password: String,
    pub salt: String,
    pub is_active: bool,
    pub is_admin: bool,
}

impl NewUser {
    /// Build an active user, salting and hashing the plain text password
    pub fn with_password(login: &str, first: &str, last: &str, password: &str, admin: bool) -> Result<NewUser> {
        let mut errors = ValidationErrors::default();
        for (field, value) in [("username", login), ("first_name", first), ("last_name", last)] {
            if value.trim().is_empty() {
                errors.add(field, "can't be blank");
            }
        }
        if password.is_empty() {
            errors.add("password", "can't be blank");
        }
        errors.into_result()?;

        let new_salt = uuid::Uuid::new_v4().simple().to_string();
        Ok(NewUser {
            username: login.trim().to_string(),
            first_name: first.trim().to_string(),
            last_name: last.trim().to_string(),
            hashed_password: crate::auth::hash_password(&new_salt, password),
            salt: new_salt,
            is_active: true,
            is_admin: admin,
        })
    }
}

impl User {
    pub fn create(database_connection: &mut PgConnection, new_user: &NewUser) -> Result<User> {
        let now = crate::db::now();
        trace!("Creating user in database: {}", new_user.username);

        diesel::insert_into(users::table)
            .values((new_user, users::created_at.eq(now), users::updated_at.eq(now)))
            .returning(User::as_returning())
            .get_result(database_connection)
            .map_err(Error::from)
    }

    pub fn with_name(database_connection: &mut PgConnection, login: &str) -> Result<User> {
        users::table
            .filter(users::username.eq(login))
            .select(User::as_select())
            .first(database_connection)
            .optional()?
            .ok_or_else(|| Error::not_found(EntityKind::User, login))
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
