// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod fetcher;
pub mod probe;
pub mod source;
pub mod transport;

pub use fetcher::{Fetcher, FetcherDescriptor};
pub use probe::{Probe, ProbeReport};
pub use source::InstanceSource;
pub use transport::{CertificateCapture, CertificateInfo, HandshakeObserver};
