//! 全局常量定义

/// LLM 相关常量
pub mod llm {
    /// 默认 max_tokens
    pub const DEFAULT_MAX_TOKENS: u32 = 2000;

    /// 默认 temperature
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;
}

/// 生成相关常量
pub mod generation {
    /// 单个 commit 在 prompt 中最多列出的文件数
    pub const MAX_FILES_PER_COMMIT: usize = 10;

    /// 一次生成建议的最大 commit 数（超出仅警告，不拒绝）
    pub const MAX_COMMITS_SOFT_LIMIT: usize = 50;
}

/// 存储相关常量
pub mod storage {
    /// 索引文件名（存储根目录下）
    pub const INDEX_FILE_NAME: &str = ".blog_index.json";

    /// 合并导出时文档之间的分隔符
    pub const EXPORT_SEPARATOR: &str = "\n\n---\n\n";
}

/// UI 相关常量
pub mod ui {
    /// 错误预览最大长度
    pub const ERROR_PREVIEW_LENGTH: usize = 500;
}
