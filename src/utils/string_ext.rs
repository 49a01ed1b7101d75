//! 字符串扩展工具模块
//!
//! 提供常用的字符串处理辅助函数

/// 字符串清理扩展 trait
pub trait StringExt {
    /// 清理字符串并返回 Option，空字符串返回 None
    fn clean(&self) -> Option<String>;
}

impl StringExt for str {
    #[inline]
    fn clean(&self) -> Option<String> {
        let trimmed = self.trim();
        if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
    }
}

impl StringExt for String {
    #[inline]
    fn clean(&self) -> Option<String> {
        self.as_str().clean()
    }
}

/// 判断是否为合法的 SQL 标识符（字母或下划线开头，仅包含字母、数字、下划线、$）
#[inline]
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {},
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// 去掉包裹在两端的括号和双引号
#[inline]
pub fn strip_wrapping(s: &str) -> &str {
    s.trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .trim_matches('"')
        .trim()
}
