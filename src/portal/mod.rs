// src/portal/mod.rs

//! 教务系统选课相关页面与接口的封装。

pub mod channel;
pub mod round;

pub use channel::{
    ChannelSpec, EnrollmentChannel, PortalChannel, STANDARD_CHANNELS, classify_submit_response,
    standard_channels,
};
pub use round::{enter_round, navigate, resolve_round, select_round};
