// src/constants.rs

pub const UI_WIDTH: usize = 88;
pub const DEFAULT_CONFIG_FILE: &str = "config.json";
pub const LOG_DIR_NAME: &str = "logs";
pub const DEFAULT_BASE_URL: &str = "http://zhjw.qfnu.edu.cn/";
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36 Edg/132.0.0.0";
pub const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
pub const ACCEPT_LANGUAGE: &str = "zh-CN,zh;q=0.9,en;q=0.8";

/// 登录最多尝试的次数（验证码识别错误时会重新获取验证码）
pub const MAX_LOGIN_ATTEMPTS: u32 = 3;
/// 单个选课通道遇到 404 时的最大尝试次数
pub const MAX_CHANNEL_QUERY_ATTEMPTS: u32 = 3;
/// 课程检索的分页大小
pub const QUERY_PAGE_SIZE: &str = "15";

pub const DISCLAIMER: &str = r#"
1. 本工具仅供学习和研究目的，用于了解网络编程和自动化技术的实现原理。
2. 使用本工具可能违反学校相关规定，使用者应自行承担由此产生的一切后果，
   包括但不限于账号被封禁、选课资格被取消、受到学校纪律处分。
3. 严禁将本工具用于商业用途、干扰教务系统正常运行或影响其他同学正常选课。
4. 开发者对使用本工具造成的任何直接或间接损失不承担任何责任。"#;

pub mod portal {
    pub const HANDSHAKE: &str = "Logon.do?method=logon&flag=sess";
    pub const CAPTCHA: &str = "verifycode.servlet";
    pub const LOGIN: &str = "Logon.do?method=logonLdap";
    pub const MAIN_FRAME: &str = "jsxsd/framework/xsMain.jsp";
    pub const ROUND_LIST: &str = "jsxsd/xsxk/xklc_list";
    pub const ROUND_ENTRY: &str = "jsxsd/xsxk/xsxk_index";
    pub const CHANNEL_PREFIX: &str = "jsxsd/xsxkkc/";

    pub mod markers {
        pub const CAPTCHA_REJECTED: &str = "验证码错误!!";
        pub const BAD_CREDENTIALS: &str = "密码错误";
    }

    pub mod flag1 {
        pub const ACCEPTED: i64 = 1;
        pub const SESSION_EXPIRED: i64 = 3;
    }
}

pub mod notify {
    pub const SUCCESS_TITLE: &str = "选课成功 🎉 ✨ 🌟 🎊";
    pub const FAILURE_TITLE: &str = "选课失败 😭 😢 😔";
}

pub mod timings {
    pub const BACKOFF_MS: u64 = 1_000;
    pub const PACE_INTERVAL_MS: u64 = 5_000;
    pub const ROUND_INTERVAL_MS: u64 = 2_000;
}
