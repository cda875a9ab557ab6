// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Test reporting.
//!
//! Tests speak through lines of the form `name: message`; the harness on
//! the other side matches on whole lines, so every report goes out in one
//! write. With a shared secret configured, each line is wrapped in an
//! envelope carrying an HMAC-SHA256 over the exact line bytes, keyed by the
//! secret together with a fresh random salt, so the receiving side can
//! check that a line came from a holder of the secret; see [`verify`].

mod secure;

pub use secure::verify;

use std::io::Write as _;

/// Outcome a test reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Fail,
}

impl Outcome {
    fn message(self) -> &'static str {
        match self {
            Outcome::Success => "SUCCESS",
            Outcome::Fail => "FAIL",
        }
    }
}

/// Formats and emits report lines, plain or inside the secure envelope.
pub struct Reporter {
    secret: Option<String>,
}

impl Reporter {
    /// A reporter emitting plain `name: message` lines.
    pub const fn new() -> Self {
        Self { secret: None }
    }

    /// A reporter wrapping every line in the HMAC envelope under `secret`.
    pub fn secure(secret: &str) -> Self {
        Self {
            secret: Some(secret.to_owned()),
        }
    }

    /// The line [`report`](Reporter::report) would emit, trailing newline
    /// included.
    pub fn line(&self, name: &str, message: &str) -> String {
        let full = format!("{name}: {message}");
        match &self.secret {
            None => format!("{full}\n"),
            Some(secret) => {
                let (hash, salt) = secure::hmac_salted(secret, &full);
                format!("({name}, {hash}, {salt}, {full})\n")
            }
        }
    }

    /// Emits one report line on stdout, in a single write.
    pub fn report(&self, name: &str, message: &str) {
        let line = self.line(name, message);
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(line.as_bytes());
    }

    /// Emits the standard outcome line for `name`.
    pub fn success(&self, outcome: Outcome, name: &str) {
        self.report(name, outcome.message());
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}
