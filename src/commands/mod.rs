//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

mod config_templates;
pub use config_templates::config_templates;

mod job_groups;
pub use job_groups::job_groups;

mod jobs;
pub use jobs::jobs;

mod package_builders;
pub use package_builders::package_builders;

mod serve;
pub use serve::serve;

pub use smoke_tests::smoke_tests;

mod users;
pub use users::users;

mod util;
