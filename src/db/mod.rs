//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

mod connection;
pub use connection::*;

#[cfg(test)]
mod memory;
#[cfg(test)]
pub use memory::MemoryStore;

pub mod models;
mod sql;

mod store;
pub use store::*;

use chrono::NaiveDateTime;
use tracing::trace;

use crate::error::EntityKind;
use crate::error::Error;
use crate::error::Result;
use crate::status::Status;
use crate::status::Tracked;

/// Current time, as stored in the timestamp columns
pub fn now() -> NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

/// Move a freshly loaded (and locked) row to `next`, then hand it to `save` for writing back
///
/// A missing row or a rejected transition never reaches `save`, so the stored row stays as it was.
pub fn transition<T, S>(row: Option<T>, id: i32, next: Status, save: S) -> Result<Status>
where
    T: Tracked,
    S: FnOnce(&T) -> Result<()>,
{
    let mut row = row.ok_or_else(|| Error::not_found(EntityKind::from(T::KIND), id))?;
    let current = row.status();
    let next = row.advance(next, now())?;
    trace!("{} {}: {} -> {}", T::KIND, id, current, next);

    save(&row)?;
    Ok(next)
}
