// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Hook invoked by an HTTP client once a TLS handshake completes.
//!
//! Probes that need certificate data create a [`CertificateCapture`] per
//! request, hand it to the client, and read the certificate back when the
//! request returns.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

/// Peer certificate metadata observed during a handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateInfo {
    pub host: String,
    pub subject: String,
    pub issuer: String,
    pub not_before: String,
    pub not_after: String,
    #[serde(default)]
    pub subject_alt_names: Vec<String>,
    pub sha256_fingerprint: String,
}

pub trait HandshakeObserver: Send + Sync {
    fn on_handshake(&self, host: &str, certificate: CertificateInfo);
}

/// Keeps the first certificate seen for one request.
///
/// Redirects may trigger further handshakes; only the first is kept, so the
/// capture reports the certificate of the host that was asked for.
#[derive(Debug, Default)]
pub struct CertificateCapture {
    captured: Mutex<Option<CertificateInfo>>,
}

impl CertificateCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Option<CertificateInfo> {
        self.captured.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

impl HandshakeObserver for CertificateCapture {
    fn on_handshake(&self, host: &str, mut certificate: CertificateInfo) {
        let mut captured = self.captured.lock().unwrap_or_else(PoisonError::into_inner);
        if captured.is_none() {
            if certificate.host.is_empty() {
                certificate.host = host.to_string();
            }
            *captured = Some(certificate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_keeps_first_handshake() {
        let capture = CertificateCapture::new();
        capture.on_handshake(
            "a.example",
            CertificateInfo {
                issuer: "R3".into(),
                ..CertificateInfo::default()
            },
        );
        capture.on_handshake(
            "b.example",
            CertificateInfo {
                host: "b.example".into(),
                issuer: "E1".into(),
                ..CertificateInfo::default()
            },
        );

        let certificate = capture.take().unwrap();
        assert_eq!(certificate.host, "a.example");
        assert_eq!(certificate.issuer, "R3");
        assert!(capture.take().is_none());
    }
}
