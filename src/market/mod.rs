//! Market protocol: wire messages, codec, session and client.

pub mod client;
pub mod codec;
pub mod proto;
pub mod session;

pub use client::{DownloadStream, MarketClient};
pub use codec::{DecodeError, ResponsePayload};
pub use session::{Credentials, DeviceProfile, Endpoints, LoginError, RequestError, Session};
