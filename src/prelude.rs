pub use anyhow::{anyhow, bail, Result};
pub use log::{debug, error, info, trace, warn};

pub use std::io::Write;
pub use std::str::FromStr;
pub use std::sync::Arc;

pub use crate::api::{ApiError, HttpApi, StorageApi};
pub use crate::config::{self, Config, ConfigWrapper};
pub use crate::coordinator::{self, Coordinator, Outcome};
pub use crate::error::ParseError;
pub use crate::message::{DecodedMessage, MessageHeader};
pub use crate::options::Options;
