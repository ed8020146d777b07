// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - sync logic layer.

pub mod device_id;
pub mod dump;
pub mod inbound;
pub mod net_proxy;
pub mod outbound;
pub mod synchronizer;
pub mod url_encoded;

pub use dump::{Dump, DumpBuilder, DumpStatement, Table};
pub use inbound::InboundParser;
pub use net_proxy::{HttpNetProxy, InboundStream, NetProxy, OutboundStream, ProxyState};
pub use outbound::OutboundStreamBuilder;
pub use synchronizer::Synchronizer;
pub use url_encoded::UrlEncodedWriter;
