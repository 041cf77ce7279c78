//! 编号生成：`HO001`、`FR001`、`FR0001` 形式
//!
//! 下一个编号由已有编号的最大数字后缀加一得出。调用方在事务内读取并插入，
//! 并发插入同一编号时由唯一索引拒绝。

/// 从已有编号中计算下一个序号
pub fn next_sequence<'a, I>(existing: I, prefix: &str) -> u64
where
    I: IntoIterator<Item = &'a str>,
{
    existing
        .into_iter()
        .filter_map(|code| code.strip_prefix(prefix))
        .filter(|suffix| !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|suffix| suffix.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
        + 1
}

/// 拼接编号，数字部分至少 `width` 位
#[must_use]
pub fn format_code(prefix: &str, number: u64, width: usize) -> String {
    format!("{prefix}{number:0width$}")
}

/// 员工编号数字位数
pub const EMP_ID_WIDTH: usize = 3;
/// 加盟店编号前缀
pub const FRANCHISE_CODE_PREFIX: &str = "FR";
/// 加盟店编号数字位数
pub const FRANCHISE_CODE_WIDTH: usize = 4;
