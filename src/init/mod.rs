// SPDX-License-Identifier: Apache-2.0

#[cfg(target_os = "linux")]
pub mod fetch_args;
pub mod logging;
