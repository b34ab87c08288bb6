//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

use std::net::SocketAddr;
use std::ops::Deref;

use getset::CopyGetters;

use crate::config::NotValidatedConfiguration;

#[derive(Debug, CopyGetters)]
pub struct Configuration {
    pub(in crate::config) inner: NotValidatedConfiguration,

    #[getset(get_copy = "pub")]
    pub(in crate::config) listen_address: SocketAddr,
}

impl Deref for Configuration {
    type Target = NotValidatedConfiguration;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
