//! Response definitions
//!
//! Represents responses to clients.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
#[repr(u32)]
pub enum ErrCode {
    Success = 0,
    NoKey = 1,
    NoSpace = 2,
    Overload = 3,
    GeneralFail = 4,
    NoCmd = 5,
    InvalKey = 6,
    InvalVal = 7,
}

impl From<ErrCode> for u32 {
    fn from(code: ErrCode) -> Self {
        code as u32
    }
}

impl TryFrom<u32> for ErrCode {
    type Error = String;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ErrCode::Success),
            1 => Ok(ErrCode::NoKey),
            2 => Ok(ErrCode::NoSpace),
            3 => Ok(ErrCode::Overload),
            4 => Ok(ErrCode::GeneralFail),
            5 => Ok(ErrCode::NoCmd),
            6 => Ok(ErrCode::InvalKey),
            7 => Ok(ErrCode::InvalVal),
            _ => Err(format!("unknown error code {}", code)),
        }
    }
}

impl fmt::Display for ErrCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrCode::Success => "Success",
            ErrCode::NoKey => "NoKey",
            ErrCode::NoSpace => "NoSpace",
            ErrCode::Overload => "Overload",
            ErrCode::GeneralFail => "GeneralFail",
            ErrCode::NoCmd => "NoCmd",
            ErrCode::InvalKey => "InvalKey",
            ErrCode::InvalVal => "InvalVal",
        };
        f.write_str(name)
    }
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub err_code: ErrCode,

    /// Stored value (GET)
    pub value: Option<Vec<u8>>,

    /// Stored version (GET)
    pub version: Option<i32>,

    /// Server process ID (GetPid)
    pub pid: Option<i32>,

    /// Cluster size (GetMembershipCount)
    pub membership_count: Option<i32>,
}

impl Response {
    /// A response carrying only a status code
    pub fn status(err_code: ErrCode) -> Self {
        Self {
            err_code,
            value: None,
            version: None,
            pid: None,
            membership_count: None,
        }
    }

    pub fn success() -> Self {
        Self::status(ErrCode::Success)
    }

    /// Successful GET
    pub fn value(value: Vec<u8>, version: i32) -> Self {
        Self {
            value: Some(value),
            version: Some(version),
            ..Self::success()
        }
    }

    pub fn pid(pid: i32) -> Self {
        Self {
            pid: Some(pid),
            ..Self::success()
        }
    }

    pub fn membership_count(count: i32) -> Self {
        Self {
            membership_count: Some(count),
            ..Self::success()
        }
    }

    pub fn is_success(&self) -> bool {
        self.err_code == ErrCode::Success
    }
}
