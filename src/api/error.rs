// ==========================================
// 工厂运营追溯核心 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，把事件源错误统一归为上游错误
// 约束: 所有错误信息必须包含显式原因
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    /// 输入不合法（在任何取数之前返回）
    #[error("无效输入: {0}")]
    Validation(String),

    /// 标识在任何标识空间都未命中
    #[error("单件未找到: {0}")]
    NotFound(String),

    /// 事件源失败，不返回部分结果
    #[error("上游数据源失败: {0}")]
    Upstream(#[source] RepositoryError),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        tracing::error!(error = %err, "事件源调用失败");
        ApiError::Upstream(err)
    }
}

impl ApiError {
    /// 错误码（供调用方区分失败类别）
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Upstream(_) => "UPSTREAM",
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_errors_become_upstream() {
        let err: ApiError = RepositoryError::LockError("poisoned".to_string()).into();
        assert_eq!(err.code(), "UPSTREAM");
        assert!(err.to_string().contains("poisoned"));

        let err: ApiError = RepositoryError::DatabaseQueryError("no such table".to_string()).into();
        assert!(matches!(err, ApiError::Upstream(RepositoryError::DatabaseQueryError(_))));
    }
}
